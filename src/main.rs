use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use row_packer::solver::{CancelToken, Solver};
use row_packer::types::Rect;
use row_packer::{input, render};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "row_packer",
    about = "Row-based rectangle packing into fixed-size containers"
)]
struct Cli {
    /// File with `widths` and `heights` lists (JSON or `name = [..]` lines)
    #[arg(long, short)]
    input: PathBuf,

    /// Container dimensions (WxH, e.g. 1490x5000)
    #[arg(long, default_value = "1490x5000", value_parser = parse_dimensions)]
    container: Rect,

    /// Stop searching after this many seconds and keep the best layout so far
    #[arg(long)]
    time_limit: Option<u64>,

    /// Show ASCII layout of each container
    #[arg(long)]
    layout: bool,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Log level for diagnostics on stderr
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn parse_dimensions(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let w = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let h = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    if w == 0 || h == 0 {
        return Err(format!("dimensions must be non-zero in '{}'", s));
    }
    Ok(Rect::new(w, h))
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

/// Resolves on Ctrl-C or once `limit` has elapsed. If the Ctrl-C handler
/// cannot be installed, only the time limit applies.
async fn stop_requested(limit: Option<Duration>) {
    let deadline = async {
        match limit {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                tracing::warn!(?limit, "time limit reached");
            }
            None => std::future::pending().await,
        }
    };
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::warn!("interrupted by user"),
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await
            }
        }
    };

    tokio::select! {
        _ = deadline => {}
        _ = interrupt => {}
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(cli.log_level)
        .init();

    let dims = input::load(&cli.input).unwrap_or_else(|e| fail(e));
    let solver =
        Solver::from_lists(cli.container, &dims.widths, &dims.heights).unwrap_or_else(|e| fail(e));
    tracing::info!(pieces = solver.pieces().len(), container = %cli.container, "starting search");

    // Ctrl-C (or the time limit) stops the search between trials
    let cancel = CancelToken::new();
    let watcher = {
        let cancel = cancel.clone();
        let limit = cli.time_limit.map(Duration::from_secs);
        tokio::spawn(async move {
            stop_requested(limit).await;
            cancel.cancel();
        })
    };

    let quiet = cli.json;
    let search = tokio::task::spawn_blocking(move || {
        solver.solve_with_progress(&cancel, |p| {
            if !quiet {
                eprint!(
                    "\rBest waste to date: {} mm², with {} rows.",
                    p.total_waste, p.total_rows
                );
            }
        })
    });
    let outcome = search.await;
    watcher.abort();
    if !quiet {
        eprintln!();
    }

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => fail(e),
        Err(e) => fail(format!("search task failed: {e}")),
    };

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
        return;
    }

    if result.cancelled {
        println!("Search stopped early; best layout found so far:");
    }
    print!("{}", render::render_table(&result));

    if cli.layout {
        for c in 0..result.container_count() {
            println!();
            println!("Container {}:", c + 1);
            print!("{}", render::render_container(&result, c));
        }
    }

    println!();
    println!(
        "Summary: {} container{} used, {} rows, {:.1}% waste",
        result.container_count(),
        if result.container_count() == 1 { "" } else { "s" },
        result.total_rows,
        result.waste_percent(),
    );
}
