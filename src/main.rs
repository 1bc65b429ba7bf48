use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "procwatch",
    about = "Process monitoring, anomaly scoring, and short-horizon resource forecasting",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, default_value = "procwatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (background sampler + API server)
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },

    /// Take one scored process snapshot and print it
    Snapshot {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Sample a process for a while, then forecast a metric
    Forecast {
        /// Process id to forecast
        #[arg(long)]
        pid: u32,

        /// Metric to forecast: cpu or mem
        #[arg(long, default_value = "cpu")]
        metric: String,

        /// Seconds between samples while accumulating history
        #[arg(long, default_value = "1")]
        interval_secs: u64,
    },

    /// Classify and score current processes
    Classify {
        /// Maximum entries to print
        #[arg(long, default_value = "30")]
        limit: usize,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = procwatch::config::Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(%bind, "Starting procwatch daemon");
            procwatch::serve(&bind, config).await?;
        }
        Commands::Snapshot { json } => {
            // One-shot collect: CPU usage needs a second refresh after the
            // minimum measurement interval, or every row reads 0.0.
            let collector = Arc::new(procwatch::collector::SystemCollector::new());
            let primed = Arc::clone(&collector);
            tokio::task::spawn_blocking(move || primed.prime()).await?;

            let state = procwatch::api::AppState::new(
                collector,
                procwatch::monitor::HistoryStore::new(config.sampler.retention),
                config,
            );
            let mut processes = state.scored_snapshot().await;
            processes.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.pid.cmp(&b.pid))
            });

            if json {
                println!("{}", serde_json::to_string_pretty(&processes)?);
            } else {
                println!("\nprocwatch Process Snapshot");
                println!(
                    "{:<8} | {:<25} | {:>7} | {:>7} | {:>5} | Reasons",
                    "PID", "Name", "CPU%", "Mem%", "Score"
                );
                println!(
                    "{:-<8}-|-{:-<25}-|-{:-<7}-|-{:-<7}-|-{:-<5}-|-{:-<30}",
                    "", "", "", "", "", ""
                );
                for p in &processes {
                    println!(
                        "{:<8} | {:<25} | {:>7.1} | {:>7.1} | {:>5.1} | {}",
                        p.pid,
                        truncate(&p.name, 25),
                        p.cpu_percent,
                        p.mem_percent,
                        p.score,
                        p.reasons.join("; ")
                    );
                }
                println!();
            }
        }
        Commands::Forecast {
            pid,
            metric,
            interval_secs,
        } => {
            let metric: procwatch::forecast::Metric = metric
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;

            let collector = Arc::new(procwatch::collector::SystemCollector::new());
            let store = procwatch::monitor::HistoryStore::new(config.sampler.retention);
            let needed = config.forecast.min_points;

            tracing::info!(pid, %metric, needed, "Accumulating history before forecasting");
            let sampler = procwatch::monitor::Sampler::new(
                collector,
                store.clone(),
                Duration::from_secs(interval_secs.max(1)),
            );
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            let handle = tokio::spawn(sampler.run(shutdown_rx));

            // A vanished pid never accumulates history; give up after a
            // bounded wait and let the Waiting outcome report the count.
            let deadline =
                tokio::time::Instant::now() + Duration::from_secs((needed as u64 + 5) * interval_secs.max(1));
            while store.len(pid) < needed && tokio::time::Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            let _ = shutdown_tx.send(true);
            let _ = handle.await;

            let outcome =
                procwatch::forecast::run(&store, pid, metric, &config.forecast).await;

            match &outcome {
                procwatch::forecast::ForecastOutcome::Success {
                    current_value,
                    predictions,
                    ..
                } => {
                    println!("\nForecast for pid {} ({})", pid, metric);
                    println!("Current value: {:.2}", current_value);
                    println!(
                        "{:<25} | {:>9} | {:>9} | {:>9}",
                        "Timestamp", "Estimate", "Lower", "Upper"
                    );
                    println!("{:-<25}-|-{:-<9}-|-{:-<9}-|-{:-<9}", "", "", "", "");
                    for p in predictions {
                        println!(
                            "{:<25} | {:>9.2} | {:>9.2} | {:>9.2}",
                            p.ts.to_rfc3339(),
                            p.estimate,
                            p.lower,
                            p.upper
                        );
                    }
                    println!();
                }
                other => {
                    println!("{}", serde_json::to_string_pretty(other)?);
                }
            }
        }
        Commands::Classify { limit, json } => {
            let collector = Arc::new(procwatch::collector::SystemCollector::new());
            let primed = Arc::clone(&collector);
            tokio::task::spawn_blocking(move || primed.prime()).await?;

            let state = procwatch::api::AppState::new(
                collector,
                procwatch::monitor::HistoryStore::new(config.sampler.retention),
                config,
            );
            let processes = state.classified_snapshot(limit).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&processes)?);
            } else {
                println!(
                    "{:<8} | {:<25} | {:<10} | {:>5} | Labels",
                    "PID", "Name", "Category", "Score"
                );
                println!(
                    "{:-<8}-|-{:-<25}-|-{:-<10}-|-{:-<5}-|-{:-<20}",
                    "", "", "", "", ""
                );
                for p in &processes {
                    println!(
                        "{:<8} | {:<25} | {:<10} | {:>5.1} | {}",
                        p.pid,
                        truncate(&p.name, 25),
                        p.category,
                        p.score,
                        p.manual_labels.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
