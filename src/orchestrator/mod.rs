//! Client-side synchronization with the agent backend.
//!
//! This module owns the timing and ordering rules: the background status poller, the
//! last-request-wins holders behind the Logs and Files tabs, and the single-flight run
//! controller. The app and UI layers call into it and never reach the network directly.

mod fetcher;
mod poller;
mod run;

pub(crate) use fetcher::{FetchTicket, Landing, TabFetcher};
pub(crate) use poller::spawn_status_poller;
pub(crate) use run::{RunController, RunState, SubmitRejected};
