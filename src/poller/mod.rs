// URL polling loop
//
// Each cycle fetches every configured URL in order, turns the outcome into a
// PollEvent, hands it to the sink, then sleeps for the configured delay.
// Transport failures are isolated per URL: one unreachable target never stops
// the rest of the cycle from being polled.

mod event;
mod fetcher;
mod scheduler;
mod sink;

pub use event::{EVENT_KEY, NO_RESPONSE, PollEvent, Status};
pub use fetcher::{Fetch, FetchResponse, HttpFetcher};
pub use scheduler::PollingScheduler;
pub use sink::{EventSink, PrintSink};

use anyhow::Result;
use std::ops::ControlFlow;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::config::PollConfiguration;

/// Why the poller stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    /// No URLs were configured, nothing was polled
    NoTargets,
    /// The cancellation token fired
    Cancelled,
    /// The receiving side of the output channel went away
    SinkClosed,
}

/// Poll every configured URL until cancelled.
///
/// Only fails when the HTTP client cannot be built. Request failures are
/// reported as `down` events, never as errors.
pub async fn run<S: EventSink>(
    sink: &S,
    config: &PollConfiguration,
    cancel: &CancellationToken,
) -> Result<PollerExit> {
    let fetcher = HttpFetcher::new(config)?;
    Ok(Poller::new(fetcher, config).run(sink, cancel).await)
}

/// Sequential URL poller over a pluggable transport
pub struct Poller<F> {
    fetcher: F,
    urls: Vec<String>,
    scheduler: PollingScheduler,
    span: Span,
}

impl<F: Fetch> Poller<F> {
    pub fn new(fetcher: F, config: &PollConfiguration) -> Self {
        Self {
            fetcher,
            urls: config.urls.clone(),
            scheduler: PollingScheduler::new(config.delay),
            span: tracing::info_span!("url_poller"),
        }
    }

    /// Emit all diagnostics inside the given span instead of the default one
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Run poll cycles until cancelled or until events can no longer be delivered
    pub async fn run<S: EventSink>(&self, sink: &S, cancel: &CancellationToken) -> PollerExit {
        self.run_loop(sink, cancel).instrument(self.span.clone()).await
    }

    async fn run_loop<S: EventSink>(&self, sink: &S, cancel: &CancellationToken) -> PollerExit {
        if !self.has_targets() {
            return PollerExit::NoTargets;
        }

        tracing::info!(
            "Starting URL poller: {} URL(s), delay {:.3} seconds",
            self.urls.len(),
            self.scheduler.delay().as_secs_f64()
        );

        let mut cycle: u64 = 0;
        let exit = loop {
            cycle += 1;
            tracing::debug!("Poll cycle {} started", cycle);

            if let ControlFlow::Break(exit) = self.poll_cycle(sink, cancel).await {
                break exit;
            }

            tracing::debug!("Poll cycle {} finished", cycle);
            let next_poll = self.scheduler.next_poll_time();
            tracing::debug!("Next poll at: {}", next_poll.format("%Y-%m-%d %H:%M:%S %Z"));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break PollerExit::Cancelled,
                _ = self.scheduler.sleep_until_next_poll() => {}
            }
        };

        tracing::info!("URL poller stopped after {} cycle(s): {:?}", cycle, exit);
        exit
    }

    /// Poll every URL once, in configured order, publishing one event each
    pub async fn poll_once<S: EventSink>(
        &self,
        sink: &S,
        cancel: &CancellationToken,
    ) -> ControlFlow<PollerExit> {
        if !self.span.in_scope(|| self.has_targets()) {
            return ControlFlow::Break(PollerExit::NoTargets);
        }

        self.poll_cycle(sink, cancel).instrument(self.span.clone()).await
    }

    fn has_targets(&self) -> bool {
        if self.urls.is_empty() {
            tracing::info!("No URLs configured, nothing to poll");
            return false;
        }
        true
    }

    async fn poll_cycle<S: EventSink>(
        &self,
        sink: &S,
        cancel: &CancellationToken,
    ) -> ControlFlow<PollerExit> {
        for url in &self.urls {
            // A cancelled fetch publishes nothing for its URL
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ControlFlow::Break(PollerExit::Cancelled),
                event = self.poll_url(url) => event,
            };

            if let Err(e) = sink.put(event) {
                tracing::warn!("Stopping: {:#}", e);
                return ControlFlow::Break(PollerExit::SinkClosed);
            }
        }

        ControlFlow::Continue(())
    }

    async fn poll_url(&self, url: &str) -> PollEvent {
        match self.fetcher.fetch(url).await {
            Ok(response) => {
                let event = PollEvent::from_response(url, response.status_code, response.body);
                if event.is_up() {
                    tracing::info!("{} is up ({})", url, event.status_code);
                } else {
                    tracing::warn!("{} is down ({})", url, event.status_code);
                }
                event
            }
            Err(e) => {
                let mut description = format!("{:#}", e);
                if description.is_empty() {
                    description = "request failed without a response".to_string();
                }
                tracing::warn!("{} is down: {}", url, description);
                PollEvent::from_failure(url, description)
            }
        }
    }
}
