use crate::app::App;
use crate::output;
use cloudsweep_core::Storer;
use colored::Colorize;

pub async fn handle(app: &App, query: &str) -> anyhow::Result<()> {
    let ids: Vec<String> = app.search().query(query)?.into_iter().collect();
    if ids.is_empty() {
        println!("{}", format!("Nothing matches '{}'", query).dimmed());
        return Ok(());
    }

    let resources = app.store().list_resources_by_ids(&ids).await?;
    let names = app.project_names().await?;
    output::print_table(&resources, &names);
    Ok(())
}
