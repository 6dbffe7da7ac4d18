use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use format_advisor::session::{
    simulate_download, DEFAULT_FORMAT, DEFAULT_RESOLUTION, DEFAULT_TICK, MOCK_AVAILABLE_FORMATS,
};
use format_advisor::{
    Advisor, AdvisorConfig, DownloadPlan, DownloadSession, FormatDecision, Strategy,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate a YouTube download with format fallback suggestions.")]
struct Cli {
    #[arg(long = "url", value_name = "URL", help = "YouTube video URL")]
    url: String,
    #[arg(
        short = 'f',
        long = "format",
        default_value = DEFAULT_FORMAT,
        help = "Requested format (mp4, webm, mp3, ...)"
    )]
    format: String,
    #[arg(
        short = 'r',
        long = "resolution",
        default_value = DEFAULT_RESOLUTION,
        help = "Requested resolution (1080p, 720p, 480p, 360p)"
    )]
    resolution: String,
    #[arg(
        long = "available",
        value_name = "LIST",
        value_delimiter = ',',
        help = "Formats the video offers (default: webm,mp3)"
    )]
    available: Vec<String>,
    #[arg(
        long = "strategy",
        value_name = "NAME",
        help = "generative, ranked or auto (overrides config)"
    )]
    strategy: Option<String>,
    #[arg(long = "config", value_name = "PATH", help = "Read settings from this JSON file")]
    config: Option<PathBuf>,
    #[arg(short = 'y', long = "yes", help = "Accept the suggested format without asking")]
    yes: bool,
    #[arg(
        long = "tick-ms",
        value_name = "MS",
        default_value_t = DEFAULT_TICK.as_millis() as u64,
        help = "Delay between simulated progress steps"
    )]
    tick_ms: u64,
}

fn load_config(cli: &Cli) -> Result<AdvisorConfig> {
    let mut config = match &cli.config {
        Some(path) => AdvisorConfig::load_file(path)?.apply_env()?,
        None => AdvisorConfig::load()?,
    };

    if let Some(name) = &cli.strategy {
        let strategy: Strategy = name.parse()?;
        config = config.with_strategy(strategy);
    }
    Ok(config)
}

fn confirm(decision: &FormatDecision) -> Result<bool> {
    print!(
        "Download in {} instead? [y/N] ",
        decision.selected_format.to_uppercase()
    );
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read answer")?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    tracing::debug!(?config, "configuration loaded");

    let advisor = Advisor::from_config(&config)?;
    let mut session = if cli.available.is_empty() {
        DownloadSession::with_available(advisor, MOCK_AVAILABLE_FORMATS)
    } else {
        DownloadSession::with_available(advisor, cli.available.iter().map(|s| s.trim().to_string()))
    };

    let details = session.load(&cli.url).await?;
    println!("{}", details.title);
    println!("by {}", details.author);
    println!("thumbnail: {}", details.thumbnail);
    println!();

    session.select_format(&cli.format);
    session.select_resolution(&cli.resolution)?;

    let format = match session.plan().await? {
        DownloadPlan::Direct(format) => format,
        DownloadPlan::Fallback {
            requested,
            decision,
        } => {
            println!(
                "{} is not available for this video. Suggested format: {}",
                requested.to_uppercase(),
                decision.selected_format.to_uppercase()
            );
            println!("Reason: {}", decision.reason);

            if !cli.yes && !confirm(&decision)? {
                println!("Download cancelled.");
                return Ok(());
            }
            println!(
                "Downloading in {} format as suggested.",
                decision.selected_format.to_uppercase()
            );
            decision.selected_format
        }
    };

    let (tx, mut rx) = mpsc::channel(16);
    let tick = Duration::from_millis(cli.tick_ms);
    let worker_format = format.clone();
    let worker =
        tokio::spawn(async move { simulate_download(&worker_format, tick, tx).await });

    while let Some(progress) = rx.recv().await {
        print!("\r{:>3.0}% {}", progress.percent, progress.status);
        io::stdout().flush()?;
    }
    println!();

    let finished = worker.await.context("progress task panicked")?;
    if finished < 100 {
        bail!("download stopped at {}%", finished);
    }
    println!(
        "Saved as {} ({}).",
        format.to_uppercase(),
        session.resolution()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    format_advisor::init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
