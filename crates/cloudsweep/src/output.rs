//! Text rendering of resources

use cloudsweep_core::{Metadata, Resource, ResourceType, StatusCategory};
use colored::{ColoredString, Colorize};
use std::collections::{BTreeMap, HashMap};

const NAME_WIDTH: usize = 28;

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width - 1).collect();
        format!("{}…", kept)
    }
}

fn status_cell(meta: &Metadata) -> ColoredString {
    let Some(status) = &meta.status else {
        return "-".dimmed();
    };
    let text = format!("{} {}", status.category().symbol(), status.as_str());
    match status.category() {
        StatusCategory::Healthy => text.green(),
        StatusCategory::InProgress => text.yellow(),
        StatusCategory::Failed => text.red(),
        StatusCategory::Gone | StatusCategory::Unknown => text.dimmed(),
    }
}

/// One line per resource, sorted by project, type and name.
pub fn print_table<R: Resource>(resources: &[R], project_names: &HashMap<String, String>) {
    if resources.is_empty() {
        println!("{}", "No resources".dimmed());
        return;
    }

    let mut rows: Vec<Metadata> = resources.iter().map(Resource::metadata).collect();
    rows.sort_by(|a, b| {
        (&a.project_id, a.resource_type, &a.name).cmp(&(&b.project_id, b.resource_type, &b.name))
    });

    println!(
        "{}",
        format!(
            "{:<28} {:<20} {:<16} {:<10} {:<18} {}",
            "NAME", "TYPE", "PROJECT", "LOCALITY", "STATUS", "ID"
        )
        .bold()
    );
    println!("{}", "─".repeat(120).dimmed());

    for meta in &rows {
        let project = project_names
            .get(&meta.project_id)
            .map(String::as_str)
            .unwrap_or(meta.project_id.as_str());
        // escape codes would throw the width off, pad the status by hand
        let status = status_cell(meta);
        let padding = 18usize.saturating_sub(status.chars().count());
        println!(
            "{:<28} {:<20} {:<16} {:<10} {}{} {}",
            truncate(&meta.name, NAME_WIDTH).cyan(),
            meta.resource_type.to_string(),
            truncate(project, 16),
            meta.locality.to_string(),
            status,
            " ".repeat(padding),
            meta.id.dimmed()
        );
    }
    println!();
    println!("{} resource(s)", rows.len());
}

/// Per-kind counts, in kind order.
pub fn print_summary(by_type: &BTreeMap<ResourceType, usize>) {
    for (resource_type, count) in by_type {
        println!("  {:<22} {}", resource_type.to_string(), count.to_string().bold());
    }
}

pub fn print_details<R: Resource>(resource: &R) -> anyhow::Result<()> {
    let meta = resource.metadata();
    println!("{} {}", meta.resource_type.to_string().bold(), meta.name.cyan());
    println!("  id:       {}", meta.id);
    if !meta.project_id.is_empty() {
        println!("  project:  {}", meta.project_id);
    }
    println!("  locality: {}", meta.locality);
    println!("  status:   {}", status_cell(&meta));
    if let Some(created_at) = meta.created_at {
        println!("  created:  {}", created_at.to_rfc3339());
    }
    if let Some(description) = &meta.description {
        println!("  {}", description.dimmed());
    }
    if !meta.tags.is_empty() {
        println!("  tags:     {}", meta.tags.join(", "));
    }
    println!();
    println!("{}", serde_json::to_string_pretty(resource)?);
    Ok(())
}
