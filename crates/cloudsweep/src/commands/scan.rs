use crate::app::App;
use crate::output;
use colored::Colorize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub async fn handle(app: &App) -> anyhow::Result<()> {
    if app.is_demo() {
        println!("{}", "Scanning the demo account...".blue());
    } else {
        println!("{}", "Scanning Scaleway...".blue());
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let started = Instant::now();
    let result = app.scan(cancel).await;
    watcher.abort();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            let cancelled = e
                .downcast_ref::<cloudsweep_core::Error>()
                .is_some_and(|e| e.is_cancelled());
            if cancelled {
                println!("{}", "Scan interrupted, the cache keeps what was indexed so far".yellow());
                return Ok(());
            }
            return Err(e);
        }
    };

    println!(
        "{} {} resources indexed in {:.1}s",
        "✓".green(),
        summary.indexed,
        started.elapsed().as_secs_f64()
    );
    output::print_summary(&summary.by_type);

    if summary.inconsistent > 0 {
        println!(
            "{}",
            format!(
                "⚠ {} resource(s) are cached but not searchable, see the log file",
                summary.inconsistent
            )
            .yellow()
        );
    }
    Ok(())
}
