use anyhow::{Context, Result};
use clap::Parser;
use std::ops::ControlFlow;
use tokio_util::sync::CancellationToken;

use url_content_poller::{
    HttpFetcher, PollConfiguration, Poller, PrintSink, SourceArgs, load_args,
};

mod cli;

use cli::Args;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = build_config(&args)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(poll(config, args.once))
}

/// Initialize logging on stderr, stdout carries the events
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

/// Merge the config file (if any) with command line overrides
fn build_config(args: &Args) -> Result<PollConfiguration> {
    let base = match &args.config {
        Some(path) => load_args(path)?,
        None => SourceArgs::default(),
    };

    let overrides = SourceArgs {
        urls: Some(args.urls.clone()),
        delay: args.delay,
        verify_ssl: args.insecure.then_some(false),
        timeout: args.timeout,
    };

    PollConfiguration::from_args(base.merge(overrides)).context("Invalid poller configuration")
}

async fn poll(config: PollConfiguration, once: bool) -> Result<()> {
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping poller");
            ctrl_c.cancel();
        }
    });

    let span = tracing::info_span!("url_poller", urls = config.urls.len(), once);
    let poller = Poller::new(HttpFetcher::new(&config)?, &config).with_span(span);

    let exit = if once {
        match poller.poll_once(&PrintSink, &cancel).await {
            ControlFlow::Break(exit) => Some(exit),
            ControlFlow::Continue(()) => None,
        }
    } else {
        Some(poller.run(&PrintSink, &cancel).await)
    };

    if let Some(exit) = exit {
        tracing::debug!("Poller exited: {:?}", exit);
    }
    Ok(())
}
