//! Result reconciliation.
//!
//! Turns a settled fetch into the next [`SearchState`]. Only the most
//! recently issued fetch may do so; anything older is dropped. Every
//! failure degrades to an empty, single-page result set.

use serde_json::Value;
use shared::MAX_RESULTS;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::CatalogPage;
use crate::error::FetchError;
use crate::params::SearchRequest;
use crate::sequence::{FetchSequence, FetchToken};
use crate::state::SearchState;

/// Outcome of reconciling one settled fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The fetch was authoritative; this is the next state
    Applied(SearchState),
    /// A newer fetch has been issued since; state stays as it is
    Stale,
}

/// Counters for reconciled fetches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerStats {
    pub applied: usize,
    pub stale: usize,
    pub failures: usize,
    pub rate_limited: usize,
}

pub struct ResultReconciler {
    sequence: Arc<FetchSequence>,
    max_results: usize,
    stats: ReconcilerStats,
    last_failure: Option<FetchError>,
}

impl ResultReconciler {
    pub fn new(sequence: Arc<FetchSequence>, max_results: usize) -> Self {
        Self {
            sequence,
            max_results: max_results.min(MAX_RESULTS),
            stats: ReconcilerStats::default(),
            last_failure: None,
        }
    }

    /// Fold the outcome of the fetch for `request` into `current`.
    ///
    /// The page of the next state is the page `request` asked for, not the
    /// live one, so the label always matches the results shown.
    pub fn reconcile(
        &mut self,
        current: &SearchState,
        token: FetchToken,
        request: &SearchRequest,
        outcome: Result<Value, FetchError>,
    ) -> Reconciliation {
        if !self.sequence.is_latest(token) {
            self.stats.stale += 1;
            debug!(
                token = %token,
                latest = ?self.sequence.latest().map(|t| t.value()),
                "Discarding stale response"
            );
            return Reconciliation::Stale;
        }

        let mut next = current.clone();
        next.loading = false;

        match outcome {
            Ok(body) => {
                let mut page = CatalogPage::from_value(&body);
                page.data.truncate(self.max_results);

                next.results = page.data;
                next.page_count = page.last_visible_page;
                next.page = request.page.clamp(1, next.page_count);
                self.last_failure = None;
                self.stats.applied += 1;

                info!(
                    token = %token,
                    results = next.results.len(),
                    page = next.page,
                    page_count = next.page_count,
                    "Applied search results"
                );
            }
            Err(error) => {
                if error.is_rate_limit() {
                    self.stats.rate_limited += 1;
                    warn!(token = %token, "Rate limit hit, slow down requests");
                } else {
                    warn!(token = %token, kind = error.kind(), error = %error, "Fetch failed");
                }
                self.stats.failures += 1;
                self.last_failure = Some(error);

                next.results.clear();
                next.page_count = 1;
                next.page = 1;
            }
        }

        Reconciliation::Applied(next)
    }

    pub fn stats(&self) -> ReconcilerStats {
        self.stats
    }

    /// Error of the latest applied fetch, cleared by the next success
    pub fn last_failure(&self) -> Option<&FetchError> {
        self.last_failure.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::testing::page_body;
    use serde_json::json;

    fn setup() -> (ResultReconciler, Arc<FetchSequence>) {
        let sequence = Arc::new(FetchSequence::new());
        (ResultReconciler::new(sequence.clone(), 21), sequence)
    }

    fn loading_state(page: u32) -> SearchState {
        SearchState {
            page,
            loading: true,
            ..SearchState::default()
        }
    }

    fn request(page: u32) -> SearchRequest {
        SearchRequest::new("", page, Default::default())
    }

    fn applied(reconciliation: Reconciliation) -> SearchState {
        match reconciliation {
            Reconciliation::Applied(state) => state,
            Reconciliation::Stale => panic!("expected applied state"),
        }
    }

    #[test]
    fn test_success_truncates_to_max_results() {
        let (mut reconciler, sequence) = setup();
        for count in [0u32, 5, 21, 25] {
            let token = sequence.issue();
            let state = applied(reconciler.reconcile(
                &loading_state(1),
                token,
                &request(1),
                Ok(page_body(1, count, 9)),
            ));
            assert_eq!(state.results.len(), (count as usize).min(21));
            assert_eq!(state.page_count, 9);
            assert!(!state.loading);
        }
        assert_eq!(reconciler.stats().applied, 4);
    }

    #[test]
    fn test_missing_pagination_defaults_to_one_page() {
        let (mut reconciler, sequence) = setup();
        let token = sequence.issue();
        let state = applied(reconciler.reconcile(
            &loading_state(1),
            token,
            &request(1),
            Ok(json!({"data": [{"mal_id": 1, "title": "A"}]})),
        ));
        assert_eq!(state.page_count, 1);
        assert_eq!(state.results.len(), 1);
    }

    #[test]
    fn test_page_is_clamped_to_page_count() {
        let (mut reconciler, sequence) = setup();
        let token = sequence.issue();
        let state = applied(reconciler.reconcile(
            &loading_state(12),
            token,
            &request(12),
            Ok(page_body(1, 0, 4)),
        ));
        assert_eq!(state.page, 4);
        assert_eq!(state.page_count, 4);
    }

    #[test]
    fn test_failures_degrade_to_empty_state() {
        let (mut reconciler, sequence) = setup();
        let failures = [
            FetchError::Transport("connection refused".to_string()),
            FetchError::Status(500),
            FetchError::Status(404),
            FetchError::Decode("expected value".to_string()),
        ];

        let mut previous = loading_state(3);
        previous.results = CatalogPage::from_value(&page_body(1, 5, 8)).data;
        previous.page_count = 8;

        for error in failures {
            let token = sequence.issue();
            let state = applied(reconciler.reconcile(&previous, token, &request(3), Err(error.clone())));
            assert!(state.results.is_empty());
            assert_eq!(state.page_count, 1);
            assert_eq!(state.page, 1);
            assert!(!state.loading);
            assert_eq!(reconciler.last_failure(), Some(&error));
        }

        let stats = reconciler.stats();
        assert_eq!(stats.failures, 4);
        assert_eq!(stats.rate_limited, 0);
    }

    #[test]
    fn test_rate_limit_is_recorded_separately() {
        let (mut reconciler, sequence) = setup();
        let token = sequence.issue();
        let state = applied(reconciler.reconcile(
            &loading_state(2),
            token,
            &request(2),
            Err(FetchError::from_status(429)),
        ));

        assert!(state.results.is_empty());
        assert_eq!(state.page_count, 1);
        assert!(!state.loading);

        let stats = reconciler.stats();
        assert_eq!(stats.rate_limited, 1);
        assert_eq!(stats.failures, 1);
        assert!(reconciler.last_failure().unwrap().is_rate_limit());
    }

    #[test]
    fn test_late_response_from_older_fetch_is_discarded() {
        let (mut reconciler, sequence) = setup();
        let a = sequence.issue();
        let b = sequence.issue();

        let after_b = applied(reconciler.reconcile(
            &loading_state(1),
            b,
            &request(1),
            Ok(page_body(100, 3, 2)),
        ));
        let late_a = reconciler.reconcile(&after_b, a, &request(1), Ok(page_body(1, 10, 5)));

        assert_eq!(late_a, Reconciliation::Stale);
        assert_eq!(after_b.results[0].mal_id, 100);
        assert_eq!(after_b.page_count, 2);
        assert_eq!(reconciler.stats().stale, 1);
    }

    #[test]
    fn test_success_clears_last_failure() {
        let (mut reconciler, sequence) = setup();
        reconciler.reconcile(
            &loading_state(1),
            sequence.issue(),
            &request(1),
            Err(FetchError::Status(503)),
        );
        assert!(reconciler.last_failure().is_some());

        reconciler.reconcile(
            &loading_state(1),
            sequence.issue(),
            &request(1),
            Ok(page_body(1, 1, 1)),
        );
        assert!(reconciler.last_failure().is_none());
    }

    #[test]
    fn test_page_follows_the_settled_request() {
        let (mut reconciler, sequence) = setup();

        // The live page was moved on while this fetch was in flight
        let token = sequence.issue();
        let state = applied(reconciler.reconcile(
            &loading_state(5),
            token,
            &request(1),
            Ok(page_body(1, 3, 3)),
        ));
        assert_eq!(state.page, 1);

        let token = sequence.issue();
        let state = applied(reconciler.reconcile(
            &state,
            token,
            &request(5),
            Ok(page_body(500, 3, 10)),
        ));
        assert_eq!(state.page, 5);
        assert_eq!(state.page_count, 10);
    }
}
