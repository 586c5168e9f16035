use clap::Parser;
use std::path::PathBuf;

/// URL content poller
///
/// Polls the given URLs and prints one JSON event per URL per poll cycle.
/// Standalone mode for smoke-testing the event source outside its host.
#[derive(Parser, Debug)]
#[command(name = "url-content-poller")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source arguments file (YAML args map, rulebook sources section, or TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// URL to poll (repeatable, appended to the ones from --config)
    #[arg(short, long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Seconds to wait between poll cycles [default: 60]
    #[arg(short, long)]
    pub delay: Option<f64>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Per-request timeout in seconds [default: 30]
    #[arg(short, long)]
    pub timeout: Option<f64>,

    /// Poll every URL once and exit
    #[arg(long)]
    pub once: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
