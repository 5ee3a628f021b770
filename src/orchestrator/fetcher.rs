//! Last-request-wins snapshot holder for tab-scoped fetches.

use crate::remote::RemoteError;

/// Identifies one issued fetch. Only the most recently issued ticket may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchTicket(u64);

impl FetchTicket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Landing {
    Applied,
    /// A newer fetch was issued after this one; its result was dropped.
    Stale,
    /// Latest fetch failed; the previous snapshot is kept.
    Failed,
}

pub(crate) struct TabFetcher<T> {
    issued: u64,
    pending: bool,
    snapshot: Option<T>,
}

impl<T> Default for TabFetcher<T> {
    fn default() -> Self {
        Self {
            issued: 0,
            pending: false,
            snapshot: None,
        }
    }
}

impl<T> TabFetcher<T> {
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        self.pending = true;
        FetchTicket(self.issued)
    }

    pub fn land(&mut self, ticket: FetchTicket, result: Result<T, RemoteError>) -> Landing {
        if ticket.0 != self.issued {
            return Landing::Stale;
        }
        self.pending = false;
        match result {
            Ok(v) => {
                self.snapshot = Some(v);
                Landing::Applied
            }
            Err(_) => Landing::Failed,
        }
    }

    pub fn snapshot(&self) -> Option<&T> {
        self.snapshot.as_ref()
    }

    /// True while the latest issued fetch has not landed.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
