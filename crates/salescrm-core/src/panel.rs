//! Read/write contract shared by every dashboard panel.
//!
//! A panel owns one list fetched from the server. Reads that fail are logged
//! and leave the list as it was. Writes are never patched in locally: a
//! successful write is followed by a fresh read, a failed one changes nothing.

use std::future::Future;

use anyhow::Result;
use tracing::{debug, error, warn};

use crate::api::user_message;
use crate::models::ActionResponse;

/// Result of a write plus, when it succeeded, the follow-up read.
#[derive(Debug)]
pub enum MutationOutcome<T> {
    Succeeded {
        message: String,
        refreshed: Result<T>,
    },
    Failed {
        message: String,
    },
}

impl<T> MutationOutcome<T> {
    pub fn message(&self) -> &str {
        match self {
            MutationOutcome::Succeeded { message, .. } | MutationOutcome::Failed { message } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MutationOutcome::Succeeded { .. })
    }
}

/// Issue `write`; only if it succeeds, issue `read`.
///
/// Runs without touching any panel so it can be driven from a spawned task;
/// the caller hands the outcome to [`ResourceList::apply_mutation`].
pub async fn run_mutation<T, W, WFut, R, RFut>(
    name: &str,
    write: W,
    read: R,
    fallback: &str,
) -> MutationOutcome<T>
where
    W: FnOnce() -> WFut,
    WFut: Future<Output = Result<ActionResponse>>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = Result<T>>,
{
    match write().await {
        Ok(response) => {
            debug!(panel = name, message = %response.message, "Write succeeded");
            MutationOutcome::Succeeded {
                message: response.message,
                refreshed: read().await,
            }
        }
        Err(e) => {
            error!(panel = name, error = %e, "Write failed");
            MutationOutcome::Failed {
                message: user_message(&e, fallback),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceList<T> {
    name: &'static str,
    items: Vec<T>,
    loaded: bool,
    selected: usize,
}

impl<T> ResourceList<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: Vec::new(),
            loaded: false,
            selected: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether at least one read has succeeded since mount.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Forget everything, as when the owning view unmounts.
    pub fn reset(&mut self) {
        self.items.clear();
        self.loaded = false;
        self.selected = 0;
    }

    /// Apply the result of a read: replace on success, keep on failure.
    pub fn apply_read(&mut self, result: Result<Vec<T>>) {
        match result {
            Ok(items) => {
                debug!(panel = self.name, count = items.len(), "Fetched");
                self.items = items;
                self.loaded = true;
                if self.selected >= self.items.len() {
                    self.selected = self.items.len().saturating_sub(1);
                }
            }
            Err(e) => {
                warn!(panel = self.name, error = %e, "Fetch failed, keeping previous list");
            }
        }
    }

    /// Apply a mutation outcome and return the message to show the user.
    pub fn apply_mutation(&mut self, outcome: MutationOutcome<Vec<T>>) -> Result<String, String> {
        match outcome {
            MutationOutcome::Succeeded { message, refreshed } => {
                self.apply_read(refreshed);
                Ok(message)
            }
            MutationOutcome::Failed { message } => Err(message),
        }
    }

    pub async fn load<F, Fut>(&mut self, read: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let result = read().await;
        self.apply_read(result);
    }

    /// Write, then re-read on success. `Ok` carries the server's message,
    /// `Err` the message to show in place of a success notice.
    pub async fn mutate<W, WFut, R, RFut>(
        &mut self,
        write: W,
        read: R,
        fallback: &str,
    ) -> Result<String, String>
    where
        W: FnOnce() -> WFut,
        WFut: Future<Output = Result<ActionResponse>>,
        R: FnOnce() -> RFut,
        RFut: Future<Output = Result<Vec<T>>>,
    {
        let outcome = run_mutation(self.name, write, read, fallback).await;
        self.apply_mutation(outcome)
    }
}
