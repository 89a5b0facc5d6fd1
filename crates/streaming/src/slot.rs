use runtime::{Generation, GenerationCounter};
use tracing::{debug, warn};

use crate::error::AssetError;

/// Tri-state of the latest photo load of a mounted viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading { url: String },
    Ready { url: String },
    Error { url: String, error: AssetError },
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            LoadStatus::Idle => None,
            LoadStatus::Loading { url }
            | LoadStatus::Ready { url, .. }
            | LoadStatus::Error { url, .. } => Some(url),
        }
    }
}

/// Handed out by [`PhotoSlot::begin`]; the completion must bring it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: Generation,
    pub url: String,
}

/// What happened to a completed load.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    /// Became the current photo. Carries the value it replaced, for disposal.
    Applied { replaced: Option<T> },
    /// A newer load started meanwhile. The value is returned for disposal.
    Superseded { value: Option<T> },
}

/// One photo load in flight per viewer: starting a new load supersedes the
/// pending one. The superseded fetch still runs to completion, its result is
/// just dropped.
///
/// The bound photo is tracked apart from the status: it stays displayed while
/// its replacement reports `Loading`.
#[derive(Debug)]
pub struct PhotoSlot<T> {
    generation: GenerationCounter,
    status: LoadStatus,
    bound: Option<(String, T)>,
    pending: Option<String>,
    superseded: u64,
}

impl<T> Default for PhotoSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PhotoSlot<T> {
    pub fn new() -> Self {
        Self {
            generation: GenerationCounter::new(),
            status: LoadStatus::Idle,
            bound: None,
            pending: None,
            superseded: 0,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    /// The photo currently displayed, which may be older than a load in flight.
    pub fn ready(&self) -> Option<&T> {
        self.bound.as_ref().map(|(_, value)| value)
    }

    pub fn bound_url(&self) -> Option<&str> {
        self.bound.as_ref().map(|(url, _)| url.as_str())
    }

    pub fn begin(&mut self, url: impl Into<String>) -> LoadTicket {
        let url = url.into();
        if self.pending.replace(url.clone()).is_some() {
            self.superseded += 1;
        }
        let generation = self.generation.bump();
        debug!(%url, generation = generation.0, "photo load started");
        self.status = LoadStatus::Loading { url: url.clone() };
        LoadTicket { generation, url }
    }

    /// Whether a ticket's result would still be applied.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.generation.is_current(ticket.generation)
    }

    /// Url of the latest started load that has not completed yet.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn complete(&mut self, ticket: LoadTicket, result: Result<T, AssetError>) -> Completion<T> {
        if !self.is_current(&ticket) {
            debug!(url = %ticket.url, "discarding superseded photo load");
            return Completion::Superseded { value: result.ok() };
        }
        self.pending = None;
        let replaced = match result {
            Ok(value) => {
                self.status = LoadStatus::Ready {
                    url: ticket.url.clone(),
                };
                self.bound.replace((ticket.url, value))
            }
            Err(error) => {
                warn!(url = %ticket.url, %error, "photo failed to load");
                self.status = LoadStatus::Error {
                    url: ticket.url,
                    error,
                };
                self.bound.take()
            }
        }
        .map(|(_, value)| value);
        // Invalidate the ticket so a duplicate completion cannot apply twice.
        self.generation.bump();
        Completion::Applied { replaced }
    }

    /// Teardown: forgets the current photo and invalidates loads in flight.
    /// Returns the bound value so the caller can dispose it.
    pub fn reset(&mut self) -> Option<T> {
        self.generation.bump();
        self.pending = None;
        self.status = LoadStatus::Idle;
        self.bound.take().map(|(_, value)| value)
    }
}
