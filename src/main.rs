use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use course_scraper::config::Settings;
use course_scraper::{fetch, local, store};

#[derive(Parser)]
#[command(name = "course_scraper", about = "Course catalog scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every URL in the link list and append one record per URL
    Live(LiveArgs),
    /// Extract records from saved HTML pages into one JSON document
    Local {
        /// Files or glob patterns (e.g. "pages/*.html")
        #[arg(short, long = "input", required = true, num_args = 1..)]
        inputs: Vec<String>,
        #[arg(short, long, default_value = "courses.extracted.json")]
        output: PathBuf,
    },
    /// Rebuild the combined JSON snapshot from an existing record log
    Snapshot {
        #[arg(long, default_value = "live_courses.jsonl")]
        log: PathBuf,
        #[arg(long, default_value = "live_courses.json")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct LiveArgs {
    /// TOML settings file (COURSES_* env vars override it)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    links: Option<PathBuf>,
    /// Record log (JSON lines)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Combined snapshot path
    #[arg(long)]
    json: Option<PathBuf>,
    #[arg(long, conflicts_with = "json")]
    no_snapshot: bool,
    #[arg(short = 'n', long)]
    concurrency: Option<usize>,
    /// Seconds between task launches
    #[arg(long)]
    delay: Option<f64>,
    /// Navigation timeout in milliseconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Saved browser session (cookies) to reuse
    #[arg(long)]
    storage_state: Option<PathBuf>,
    /// Rebuild the snapshot every N records
    #[arg(long)]
    flush_every: Option<usize>,
}

impl LiveArgs {
    fn settings(self) -> anyhow::Result<Settings> {
        let mut s = Settings::load(self.config.as_deref())?;
        if let Some(v) = self.links {
            s.links_path = v;
        }
        if let Some(v) = self.output {
            s.log_path = v;
        }
        if let Some(v) = self.json {
            s.snapshot_path = Some(v);
        }
        if self.no_snapshot {
            s.snapshot_path = None;
        }
        if let Some(v) = self.concurrency {
            s.concurrency = v.max(1);
        }
        if let Some(v) = self.delay {
            s.delay_ms = (v.max(0.0) * 1000.0).round() as u64;
        }
        if let Some(v) = self.timeout {
            s.timeout_ms = v;
        }
        if let Some(v) = self.storage_state {
            s.storage_state = Some(v);
        }
        if let Some(v) = self.flush_every {
            s.flush_every = v;
        }
        Ok(s)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Live(args) => {
            let settings = args.settings()?;
            let stats = fetch::run_live(&settings).await?;
            println!(
                "Done: {} scraped ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            println!("Log: {}", settings.log_path.display());
            if let Some(snapshot) = &settings.snapshot_path {
                println!("Snapshot: {}", snapshot.display());
            }
            Ok(())
        }
        Commands::Local { inputs, output } => {
            let count = local::run_local(&inputs, &output)?;
            if count == 0 {
                println!("No files matched; wrote an empty list.");
            }
            println!("Extracted {} courses -> {}", count, output.display());
            Ok(())
        }
        Commands::Snapshot { log, out } => {
            let count = store::rebuild_snapshot(&log, &out)
                .with_context(|| format!("Failed to rebuild {}", out.display()))?;
            println!("Snapshot has {} records: {}", count, out.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
