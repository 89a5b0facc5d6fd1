use std::path::PathBuf;

use clap::{Parser, Subcommand};
use navigation::Speed;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tour", about = "Checks and simulations for campus tour datasets")]
struct Cli {
    /// Viewer configuration JSON; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report dangling edges, unresolved hotspots and empty areas.
    Validate { dataset: PathBuf },
    /// Print the fewest-hop route between two nodes.
    Route {
        dataset: PathBuf,
        from: String,
        to: String,
    },
    /// Report edges that do not lead back with the reciprocal direction.
    Reciprocity { dataset: PathBuf },
    /// Autoplay a path on a virtual clock and print the hop timeline.
    Simulate {
        dataset: PathBuf,
        #[arg(required = true)]
        path: Vec<String>,
        #[arg(long, default_value = "normal")]
        speed: Speed,
        /// Print the timeline as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let cli = Cli::parse();
    let config = tools::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Validate { dataset } => {
            let graph = tools::load_graph(&dataset)?;
            let report = tools::validate(&graph);
            for issue in &report.issues {
                println!("{issue}");
            }
            if !report.issues.is_empty() {
                return Err(format!("{} integrity issue(s)", report.issues.len()));
            }
            info!(nodes = report.nodes, "dataset is consistent");
            println!("ok: {} nodes", report.nodes);
        }
        Command::Route { dataset, from, to } => {
            let graph = tools::load_graph(&dataset)?;
            let path = tools::route(&graph, &from, &to)?;
            println!("{}", path.join(" -> "));
        }
        Command::Reciprocity { dataset } => {
            let graph = tools::load_graph(&dataset)?;
            let issues = tools::reciprocity(&graph);
            for issue in &issues {
                println!("{issue}");
            }
            if issues.is_empty() {
                println!("ok: every edge leads back");
            }
        }
        Command::Simulate {
            dataset,
            path,
            speed,
            json,
        } => {
            let graph = tools::load_graph(&dataset)?;
            let timeline = tools::simulate(graph, &config, path, speed)?;
            if json {
                let payload =
                    serde_json::to_string_pretty(&timeline).map_err(|e| format!("json: {e}"))?;
                println!("{payload}");
            } else {
                for entry in &timeline {
                    println!(
                        "{:>8.0} ms  {}  {}",
                        entry.at_ms,
                        entry.node_id,
                        entry.area.as_deref().unwrap_or("-")
                    );
                }
            }
        }
    }
    Ok(())
}
