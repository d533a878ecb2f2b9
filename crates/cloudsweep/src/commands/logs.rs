use crate::app::App;
use cloudsweep_core::{Monitorer, Resource};
use colored::Colorize;

pub async fn handle(app: &App, id: &str, lines: usize) -> anyhow::Result<()> {
    let resource = app.get(id).await?;
    let meta = resource.metadata();
    if !resource.observability().can_view_logs {
        println!("{}", format!("{} resources have no logs", meta.resource_type).dimmed());
        return Ok(());
    }

    let monitor = app.monitor()?;
    let entries = monitor.logs(&resource).await?;
    if entries.is_empty() {
        println!("{}", "No logs in the last 24 hours".dimmed());
        return Ok(());
    }

    let skip = entries.len().saturating_sub(lines);
    for entry in &entries[skip..] {
        println!(
            "{} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            entry.line
        );
    }
    Ok(())
}
