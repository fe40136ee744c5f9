use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use readlog_core::{DEFAULT_USER_AGENT, PreviewConfig, Previewer};
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Fetch a web page and show its link preview
#[derive(Parser, Debug)]
#[command(name = "readlog")]
#[command(author = "Readlog Contributors")]
#[command(version)]
#[command(about = "Preview a link: title, description, image and site name", long_about = None)]
struct Args {
    /// URL to preview (scheme optional, https is assumed)
    #[arg(value_name = "URL")]
    url: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "10", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Allow loopback and private-network targets
    #[arg(long)]
    allow_private: bool,

    /// Reject URLs without a scheme instead of assuming https
    #[arg(long)]
    no_scheme_upgrade: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "readlog_core=debug" } else { "readlog_core=off" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_step(1, 2, &format!("Previewing {}", args.url));
    }

    let config = PreviewConfig::builder()
        .timeout(args.timeout)
        .user_agent(args.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()))
        .allow_private_hosts(args.allow_private)
        .upgrade_missing_scheme(!args.no_scheme_upgrade)
        .build();

    let previewer = Previewer::new(config).context("Failed to initialize HTTP client")?;

    let started = Instant::now();
    let preview = previewer.get_preview(&args.url).await;

    if args.verbose {
        echo::print_timing("Fetch + extract", started.elapsed());
        echo::print_step(2, 2, "Writing output");
        eprintln!();
    }

    let rendered = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&preview.to_json()).context("Failed to serialize preview")? + "\n"
        }
        OutputFormat::Text => echo::render_card(&preview),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &rendered).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display()));
        }
        None if args.format == OutputFormat::Text && preview.is_success() => echo::print_card(&preview),
        None if args.format == OutputFormat::Text => {}
        None => print!("{}", rendered),
    }

    if !preview.is_success() {
        let detail = preview.error().unwrap_or("unknown error");
        echo::print_error(detail);
        anyhow::bail!("Preview unavailable for {}", args.url);
    }

    Ok(())
}
