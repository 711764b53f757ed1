//! Search session orchestrator.
//!
//! Owns the one [`SearchState`] of a session and is its only writer. User
//! input goes through the debounced controller; settled fetches and banner
//! ticks come back over channels and are applied in [`SearchSession::next_event`].
//! Consumers read snapshots through [`SearchSession::subscribe`].

use shared::{AnimeDetails, BannerSource, FilterSet, RecommendationEntry, SearchConfig};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::api::{parse_details, parse_recommendations, CatalogTransport};
use crate::banner::{BannerRotator, BannerTick};
use crate::debounce::{DebouncedFetchController, FetchEvent};
use crate::error::FetchError;
use crate::params::{detail_request, recommendations_request};
use crate::reconciler::{Reconciliation, ReconcilerStats, ResultReconciler};
use crate::recommendations::dedupe_recommendations;
use crate::sequence::{FetchSequence, FetchToken};
use crate::state::SearchState;

/// What [`SearchSession::next_event`] applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A debounced fetch went out; state is loading
    FetchStarted { token: FetchToken },
    /// The authoritative fetch settled and replaced the results
    ResultsApplied {
        token: FetchToken,
        results: usize,
        failed: bool,
    },
    /// A superseded fetch settled and was ignored
    StaleResponseDiscarded { token: FetchToken },
    /// The banner moved to a new slot
    BannerAdvanced { index: usize },
}

enum Incoming {
    Fetch(FetchEvent),
    Banner(BannerTick),
}

pub struct SearchSession {
    config: SearchConfig,
    transport: Arc<dyn CatalogTransport>,
    state: SearchState,
    state_tx: watch::Sender<SearchState>,
    controller: DebouncedFetchController,
    fetch_rx: mpsc::UnboundedReceiver<FetchEvent>,
    reconciler: ResultReconciler,
    banner: BannerRotator,
    banner_rx: mpsc::UnboundedReceiver<BannerTick>,
    recommendations: Option<Vec<RecommendationEntry>>,
}

impl SearchSession {
    pub fn new(config: &SearchConfig, transport: Arc<dyn CatalogTransport>) -> Self {
        let sequence = Arc::new(FetchSequence::new());
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (banner_tx, banner_rx) = mpsc::unbounded_channel();

        let controller = DebouncedFetchController::new(
            config.debounce_window(),
            transport.clone(),
            sequence.clone(),
            fetch_tx,
        );
        let reconciler = ResultReconciler::new(sequence, config.max_results);
        let banner = BannerRotator::new(config.banner_interval(), config.banner_slots, banner_tx);

        let state = SearchState::default();
        let (state_tx, _) = watch::channel(state.clone());

        Self {
            config: config.clone(),
            transport,
            state,
            state_tx,
            controller,
            fetch_rx,
            reconciler,
            banner,
            banner_rx,
            recommendations: None,
        }
    }

    /// Schedule the initial browse request for the default state
    pub fn start(&mut self) {
        info!(
            debounce_ms = self.config.debounce_ms,
            banner_source = ?self.config.banner_source,
            "Search session started"
        );
        self.refresh();
    }

    /// Current state snapshot
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Receiver that always holds the latest published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state_tx.subscribe()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query == self.state.query {
            return;
        }
        self.state.query = query;
        self.state.page = 1;
        self.input_changed();
    }

    pub fn clear_query(&mut self) {
        self.set_query(String::new());
    }

    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        if page == self.state.page {
            return;
        }
        self.state.page = page;
        self.input_changed();
    }

    pub fn next_page(&mut self) {
        if self.state.has_next_page() {
            self.set_page(self.state.page + 1);
        }
    }

    pub fn previous_page(&mut self) {
        if self.state.has_previous_page() {
            self.set_page(self.state.page - 1);
        }
    }

    pub fn set_filters(&mut self, filters: FilterSet) {
        if filters == self.state.filters {
            return;
        }
        self.state.filters = filters;
        self.state.page = 1;
        self.input_changed();
    }

    /// Apply an in-place edit to the current filters
    pub fn update_filters(&mut self, edit: impl FnOnce(&mut FilterSet)) {
        let mut filters = self.state.filters.clone();
        edit(&mut filters);
        self.set_filters(filters);
    }

    /// Re-schedule the current parameters
    pub fn refresh(&mut self) {
        self.controller.schedule(self.state.request());
    }

    fn input_changed(&mut self) {
        debug!(
            query = %self.state.query,
            page = self.state.page,
            filters = ?self.state.filters,
            "Search input changed"
        );
        self.publish();
        self.controller.schedule(self.state.request());
    }

    /// Wait for the next fetch progress or banner tick and apply it.
    ///
    /// Returns `None` once both event sources are closed.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            let incoming = tokio::select! {
                Some(event) = self.fetch_rx.recv() => Incoming::Fetch(event),
                Some(tick) = self.banner_rx.recv() => Incoming::Banner(tick),
                else => return None,
            };

            let applied = match incoming {
                Incoming::Fetch(event) => self.apply_fetch_event(event),
                Incoming::Banner(tick) => self.apply_banner_tick(tick),
            };

            if let Some(event) = applied {
                return Some(event);
            }
        }
    }

    fn apply_fetch_event(&mut self, event: FetchEvent) -> Option<SessionEvent> {
        match event {
            FetchEvent::Issued { token, .. } => {
                self.state.loading = true;
                self.publish();
                Some(SessionEvent::FetchStarted { token })
            }
            FetchEvent::Settled {
                token,
                request,
                outcome,
            } => {
                let failed = outcome.is_err();
                match self
                    .reconciler
                    .reconcile(&self.state, token, &request, outcome)
                {
                    Reconciliation::Applied(next) => {
                        self.state = next;
                        if self.config.banner_source == BannerSource::Results {
                            self.sync_banner();
                        }
                        self.publish();
                        Some(SessionEvent::ResultsApplied {
                            token,
                            results: self.state.results.len(),
                            failed,
                        })
                    }
                    Reconciliation::Stale => Some(SessionEvent::StaleResponseDiscarded { token }),
                }
            }
        }
    }

    fn apply_banner_tick(&mut self, tick: BannerTick) -> Option<SessionEvent> {
        let index = self.banner.on_tick(tick)?;
        self.state.banner_index = Some(index);
        self.publish();
        Some(SessionEvent::BannerAdvanced { index })
    }

    fn sync_banner(&mut self) {
        let ids: Vec<u32> = match self.config.banner_source {
            BannerSource::Results => self.state.results.iter().map(|a| a.mal_id).collect(),
            BannerSource::Recommendations => self
                .recommendations()
                .iter()
                .filter_map(|r| r.primary_entry().map(|e| e.mal_id))
                .collect(),
        };

        self.banner.set_eligible(ids);
        self.state.banner_index = self.banner.index();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    /// Fetch and de-duplicate the recommendations feed.
    ///
    /// Runs at most once per session; a failed load leaves the feed empty.
    pub async fn load_recommendations(&mut self) -> &[RecommendationEntry] {
        if self.recommendations.is_none() {
            let feed = match self.transport.perform(&recommendations_request()).await {
                Ok(body) => {
                    let unique = dedupe_recommendations(
                        parse_recommendations(&body),
                        self.config.recommendation_limit,
                    );
                    info!(count = unique.len(), "Loaded recommendations");
                    unique
                }
                Err(e) => {
                    warn!(kind = e.kind(), error = %e, "Failed to load recommendations");
                    Vec::new()
                }
            };
            self.recommendations = Some(feed);

            if self.config.banner_source == BannerSource::Recommendations {
                self.sync_banner();
                self.publish();
            }
        }

        self.recommendations()
    }

    /// De-duplicated recommendations, empty until loaded
    pub fn recommendations(&self) -> &[RecommendationEntry] {
        self.recommendations.as_deref().unwrap_or(&[])
    }

    /// Entries currently eligible for the banner, in slot order
    pub fn banner_ids(&self) -> &[u32] {
        self.banner.eligible()
    }

    /// Fetch the full record for one title
    pub async fn fetch_detail(&self, mal_id: u32) -> Result<AnimeDetails, FetchError> {
        let body = self.transport.perform(&detail_request(mal_id)).await?;
        parse_details(&body)
    }

    pub fn reconciler_stats(&self) -> ReconcilerStats {
        self.reconciler.stats()
    }

    pub fn last_failure(&self) -> Option<&FetchError> {
        self.reconciler.last_failure()
    }

    /// Stop both timers and abandon in-flight fetches
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
        self.banner.stop();
        self.state.banner_index = None;
        self.state.loading = false;
        self.publish();
        info!(stats = ?self.reconciler.stats(), "Search session shut down");
    }
}
