use anyhow::{Context, Result};
use std::io::Write;
use tokio::sync::mpsc::UnboundedSender;

use super::event::PollEvent;

/// Output channel the poller publishes to. The poller only ever enqueues.
pub trait EventSink {
    /// Hand a fully built event over to the host. Must not block.
    ///
    /// An error means the receiving side is gone for good.
    fn put(&self, event: PollEvent) -> Result<()>;
}

impl EventSink for UnboundedSender<PollEvent> {
    fn put(&self, event: PollEvent) -> Result<()> {
        self.send(event)
            .map_err(|_| anyhow::anyhow!("Event receiver has been dropped"))
    }
}

/// Stand-in sink for running outside a host: one JSON envelope per line
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintSink;

impl EventSink for PrintSink {
    fn put(&self, event: PollEvent) -> Result<()> {
        let line = event.to_json_line().context("Failed to serialize event")?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line).context("Failed to write event to stdout")?;
        stdout.flush().context("Failed to flush stdout")
    }
}
