use crate::app::App;
use cloudsweep_core::Resource;
use cloudsweep_scaleway::ScalewayResource;
use colored::Colorize;

pub async fn handle(app: &App, id: &str, yes: bool) -> anyhow::Result<()> {
    let resource = app.get(id).await?;
    let meta = resource.metadata();

    if matches!(resource, ScalewayResource::JobRun(_)) {
        println!(
            "{}",
            "Job runs go away with their job definition, nothing to delete".dimmed()
        );
        return Ok(());
    }

    if !yes {
        println!(
            "{}",
            format!(
                "This deletes {} '{}' ({}) from the account.",
                meta.resource_type, meta.name, meta.id
            )
            .yellow()
        );
        println!("Run again with --yes to proceed");
        return Ok(());
    }

    app.delete(&resource).await?;
    println!("{} Deleted {} '{}'", "✓".green(), meta.resource_type, meta.name.cyan());
    Ok(())
}
