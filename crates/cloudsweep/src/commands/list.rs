use crate::app::App;
use crate::output;
use cloudsweep_core::{Resource, ResourceType, Storer};

fn parse_type(value: &str) -> anyhow::Result<ResourceType> {
    value.parse().map_err(|_| {
        let known: Vec<&str> = ResourceType::ALL.iter().map(|t| t.as_str()).collect();
        anyhow::anyhow!("unknown resource type '{}', expected one of: {}", value, known.join(", "))
    })
}

/// Cached resources, optionally narrowed to one type and one project (id or name).
pub async fn handle(
    app: &App,
    resource_type: Option<String>,
    project: Option<String>,
) -> anyhow::Result<()> {
    let resource_type = resource_type.as_deref().map(parse_type).transpose()?;
    let names = app.project_names().await?;

    let project_id = project.map(|project| {
        names
            .iter()
            .find(|(_, name)| **name == project)
            .map(|(id, _)| id.clone())
            .unwrap_or(project)
    });

    let resources: Vec<_> = app
        .store()
        .list_all_resources()
        .await?
        .into_iter()
        .filter(|r| {
            let meta = r.metadata();
            resource_type.is_none_or(|t| meta.resource_type == t)
                && project_id.as_ref().is_none_or(|p| meta.project_id == *p)
        })
        .collect();

    output::print_table(&resources, &names);
    Ok(())
}

pub async fn handle_show(app: &App, id: &str) -> anyhow::Result<()> {
    let resource = app.get(id).await?;
    output::print_details(&resource)
}
