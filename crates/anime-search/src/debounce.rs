//! Debounced fetch controller.
//!
//! Bursts of parameter changes (keystrokes, facet toggles, page clicks)
//! collapse into one request: every [`DebouncedFetchController::schedule`]
//! call re-arms the timer, and only the request carried by the last call
//! is sent once the window passes quietly.
//!
//! Results travel back to the owner as [`FetchEvent`]s over an mpsc
//! channel, so the owner stays the only writer of search state.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::api::CatalogTransport;
use crate::error::FetchError;
use crate::params::SearchRequest;
use crate::sequence::{FetchSequence, FetchToken};

/// Progress of an issued fetch
#[derive(Debug)]
pub enum FetchEvent {
    /// The debounce window settled and the request went out
    Issued {
        token: FetchToken,
        request: SearchRequest,
    },
    /// The transport answered (or failed)
    Settled {
        token: FetchToken,
        request: SearchRequest,
        outcome: Result<Value, FetchError>,
    },
}

impl FetchEvent {
    pub fn token(&self) -> FetchToken {
        match self {
            FetchEvent::Issued { token, .. } | FetchEvent::Settled { token, .. } => *token,
        }
    }
}

struct PendingTimer {
    cancel: CancellationToken,
    fired: Arc<AtomicBool>,
}

/// Coalesces scheduled requests and issues at most one fetch per settled
/// burst.
pub struct DebouncedFetchController {
    window: Duration,
    transport: Arc<dyn CatalogTransport>,
    sequence: Arc<FetchSequence>,
    events: mpsc::UnboundedSender<FetchEvent>,
    /// Cancelled on shutdown; aborts timers and in-flight fetches alike
    root: CancellationToken,
    pending: Option<PendingTimer>,
}

impl DebouncedFetchController {
    pub fn new(
        window: Duration,
        transport: Arc<dyn CatalogTransport>,
        sequence: Arc<FetchSequence>,
        events: mpsc::UnboundedSender<FetchEvent>,
    ) -> Self {
        Self {
            window,
            transport,
            sequence,
            events,
            root: CancellationToken::new(),
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Re-arm the timer with `request`.
    ///
    /// A timer that already fired is left alone: its fetch completes and
    /// the reconciler decides whether the answer still counts.
    pub fn schedule(&mut self, request: SearchRequest) {
        if self.root.is_cancelled() {
            debug!("Ignoring schedule after shutdown");
            return;
        }

        self.cancel();

        let cancel = self.root.child_token();
        let fired = Arc::new(AtomicBool::new(false));
        self.pending = Some(PendingTimer {
            cancel: cancel.clone(),
            fired: fired.clone(),
        });

        trace!(
            window_ms = self.window.as_millis() as u64,
            query = %request.query,
            page = request.page,
            "Debounce timer armed"
        );

        let window = self.window;
        let transport = self.transport.clone();
        let sequence = self.sequence.clone();
        let events = self.events.clone();
        let root = self.root.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    trace!("Debounce timer cancelled");
                    return;
                }
                _ = sleep(window) => {}
            }
            fired.store(true, Ordering::SeqCst);

            let descriptor = request.descriptor();
            let token = sequence.issue();
            debug!(
                token = %token,
                endpoint = descriptor.endpoint.as_str(),
                path = %descriptor.to_path_and_query(),
                "Issuing fetch"
            );

            let issued = FetchEvent::Issued {
                token,
                request: request.clone(),
            };
            if events.send(issued).is_err() {
                return;
            }

            let outcome = tokio::select! {
                biased;
                _ = root.cancelled() => {
                    debug!(token = %token, "Fetch abandoned on shutdown");
                    return;
                }
                outcome = transport.perform(&descriptor) => outcome,
            };

            // Receiver may be gone after teardown
            let _ = events.send(FetchEvent::Settled {
                token,
                request,
                outcome,
            });
        });
    }

    /// Drop the pending timer without firing it
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
        }
    }

    /// True while a timer is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|p| !p.cancel.is_cancelled() && !p.fired.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Cancel the pending timer and abandon in-flight fetches.
    ///
    /// Further `schedule` calls are ignored.
    pub fn shutdown(&mut self) {
        self.cancel();
        self.root.cancel();
    }
}

impl Drop for DebouncedFetchController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
