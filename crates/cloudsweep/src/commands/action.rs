use crate::app::App;
use cloudsweep_core::{Resource, RunOutcome, Status, find_action};
use colored::Colorize;

/// Runs the named action on a cached resource, or lists the available ones
/// when `name` is omitted. Job runs started by the action are followed until
/// they finish unless `detach` is set.
pub async fn handle(app: &App, id: &str, name: Option<String>, detach: bool) -> anyhow::Result<()> {
    let resource = app.get(id).await?;
    let meta = resource.metadata();
    let actions = resource.actions();
    let available: Vec<&str> = actions.iter().map(|a| a.name()).collect();

    let Some(name) = name else {
        if available.is_empty() {
            println!("{}", format!("No actions for {} '{}'", meta.resource_type, meta.name).dimmed());
        } else {
            println!("Actions for {} '{}':", meta.resource_type, meta.name.cyan());
            for action in &available {
                println!("  • {}", action);
            }
        }
        return Ok(());
    };

    let action = find_action(&actions, &name).ok_or_else(|| {
        anyhow::anyhow!(
            "{} '{}' has no action '{}' (available: {})",
            meta.resource_type,
            meta.name,
            name,
            if available.is_empty() { "none".to_string() } else { available.join(", ") }
        )
    })?;
    if app.is_demo() {
        anyhow::bail!("actions need a Scaleway account, they are not available with --demo");
    }

    action.run(app.action_context()?).await?;
    println!("{} {} on '{}'", "✓".green(), action.name(), meta.name.cyan());

    let runs = app.supervisors().active();
    if runs.is_empty() {
        return Ok(());
    }

    if detach {
        println!(
            "{}",
            "Not following the job run, the next scan picks up its state".dimmed()
        );
        app.supervisors().shutdown().await;
        return Ok(());
    }

    println!("{}", "Following the job run, Ctrl-C to stop...".blue());
    tokio::select! {
        _ = follow(app, &runs) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "Stopped following, the job run keeps going remotely".yellow());
            app.supervisors().shutdown().await;
        }
    }
    Ok(())
}

async fn follow(app: &App, runs: &[String]) {
    for run_id in runs {
        let outcome = app.supervisors().wait(run_id).await;
        // a supervisor that finished before we got here left its last snapshot in the cache
        let cached = match outcome {
            None => app.last_status(run_id).await,
            Some(_) => None,
        };
        if let Some(line) = outcome_line(outcome, cached) {
            println!("  {} {}", run_id, line);
        }
    }
}

fn outcome_line(outcome: Option<RunOutcome>, cached: Option<Status>) -> Option<String> {
    match outcome {
        Some(RunOutcome::Terminal(status)) => Some(status_line(&status)),
        Some(RunOutcome::Aborted(reason)) => {
            Some(format!("lost track: {}", reason).red().to_string())
        }
        Some(RunOutcome::Cancelled) => None,
        None => cached.as_ref().map(status_line),
    }
}

fn status_line(status: &Status) -> String {
    format!("{} {}", status.category().symbol(), status.as_str())
        .bold()
        .to_string()
}
