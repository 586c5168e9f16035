//! URL content event source
//!
//! Polls a list of URLs on a fixed delay and publishes one [`PollEvent`] per
//! URL per cycle into an output channel owned by the host. A URL is `up` only
//! when it answers with exactly HTTP 200; any other status is `down` with the
//! real code kept, and a request that gets no response at all is `down` with
//! status code 0.

pub mod config;
pub mod poller;

pub use config::{PollConfiguration, SourceArgs, load_args};
pub use poller::{
    EVENT_KEY, EventSink, Fetch, FetchResponse, HttpFetcher, PollEvent, Poller, PollerExit,
    PrintSink, Status, run,
};
pub use tokio_util::sync::CancellationToken;
