//! `fetchtv` command-line client.

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use fetchtv::progress::format_size;
use fetchtv::session::cancel_on_signal;
use fetchtv::{Command, Config, Error, Event, ExitStatus, Result, Session};

/// Download recordings from a Fetch set-top box
#[derive(Parser, Debug)]
#[command(name = "fetchtv", version, about)]
struct Cli {
    /// download, list, help
    command: Option<String>,

    /// ID, date (YYYY-MM-DD) or series name (quote names with spaces). Multiple may be given.
    selectors: Vec<String>,

    /// Download into <DIRECTORY>
    #[arg(short = 'd', long = "directory", value_name = "DIRECTORY")]
    directory: Option<PathBuf>,

    /// Only use the set-top box at this address
    #[arg(long = "ip", value_name = "ADDRESS")]
    ip: Option<String>,

    /// Resume partially downloaded files
    #[arg(long)]
    resume: bool,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Offline content directory dump to use instead of the network
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let status = match run(cli).await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitStatus::Failure
        }
    };
    status.into()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fetchtv=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitStatus> {
    match Command::from_args(cli.command.as_deref(), &cli.selectors) {
        Command::Help => {
            print_help();
            Ok(ExitStatus::Success)
        }
        Command::Download { selectors } if selectors.is_empty() => {
            print_help();
            Ok(ExitStatus::Failure)
        }
        Command::Download { selectors } => {
            let session = Session::from_config(load_config(&cli)?).await?;
            download(&session, &selectors).await
        }
        Command::List => {
            let session = Session::from_config(load_config(&cli)?).await?;
            for line in session.list().await? {
                println!("{}", line);
            }
            Ok(ExitStatus::Success)
        }
    }
}

fn print_help() {
    // nothing useful to do if stdout is gone
    Cli::command().print_help().ok();
    println!();
}

/// Build the config from the optional file, then apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(dir) = &cli.directory {
        config.download.download_dir = Some(dir.clone());
    }
    if let Some(ip) = &cli.ip {
        config.discovery.target_host = Some(ip.clone());
    }
    if cli.resume {
        config.download.resume = true;
    }
    if let Some(snapshot) = &cli.snapshot {
        config.discovery.snapshot = Some(snapshot.clone());
    }

    config.validate()?;
    Ok(config)
}

async fn download(session: &Session, selectors: &[String]) -> Result<ExitStatus> {
    let devices = session.discover().await?;
    for device in &devices {
        println!("Fetch STB found at {}", device.host);
    }
    let device = devices.into_iter().next().ok_or(Error::NoDevice)?;

    let queue = session.prepare_queue(&device, selectors).await?;
    let engine = session.engine(device)?;

    let renderer = tokio::spawn(render_events(engine.subscribe()));
    let cancel = CancellationToken::new();
    let signals = tokio::spawn(cancel_on_signal(cancel.clone()));

    let outcomes = engine.run(queue, cancel.clone()).await;
    let interrupted = cancel.is_cancelled();

    cancel.cancel();
    signals.await.ok();
    drop(engine);
    renderer.await.ok();

    if interrupted {
        return Ok(ExitStatus::Failure);
    }
    Ok(ExitStatus::from_outcomes(&outcomes))
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print operator lines for engine events until the queue finishes
async fn render_events(mut events: broadcast::Receiver<Event>) {
    let mut bar: Option<ProgressBar> = None;

    loop {
        match events.recv().await {
            Ok(Event::Started {
                series,
                title,
                size,
                ..
            }) => {
                println!("Downloading {}:{}  Size: {}", series, title, format_size(size));
            }
            Ok(Event::Transferring {
                uri, resume_from, ..
            }) => {
                println!("Url: {}", uri);
                if let Some(existing) = resume_from {
                    println!("Resuming from {}", format_size(existing));
                }
                bar = Some(progress_bar());
            }
            Ok(Event::Progress { report, .. }) => {
                if let Some(pb) = &bar {
                    pb.set_message(report.to_string());
                }
            }
            Ok(Event::Completed { path, .. }) => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
                println!("Saved to {}", path.display());
            }
            Ok(Event::Failed { id, stage, error }) => {
                if let Some(pb) = bar.take() {
                    pb.abandon();
                }
                eprintln!("Item {} failed while {}: {}", id, stage, error);
            }
            Ok(Event::QueueFinished { completed, failed }) => {
                if let Some(pb) = bar.take() {
                    pb.abandon_with_message("Interrupted, run again with --resume to continue");
                }
                println!("{} saved, {} failed", completed, failed);
                break;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event renderer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
