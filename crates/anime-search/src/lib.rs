//! Search client for the Jikan anime catalog.
//!
//! This library turns noisy user input (keystrokes, facet toggles, page
//! changes) into a minimal stream of throttled catalog requests and folds
//! the answers into one consistent [`SearchState`]. A banner rotator runs
//! alongside on its own timer.

pub mod api;
pub mod banner;
pub mod debounce;
pub mod error;
pub mod params;
pub mod reconciler;
pub mod recommendations;
pub mod sequence;
pub mod session;
pub mod state;

pub use api::{CatalogTransport, Endpoint, JikanClient, RateLimiter, RequestDescriptor};
pub use banner::{BannerPhase, BannerRotator, BannerTick};
pub use debounce::{DebouncedFetchController, FetchEvent};
pub use error::FetchError;
pub use params::{build_search_request, SearchRequest};
pub use reconciler::{Reconciliation, ReconcilerStats, ResultReconciler};
pub use recommendations::dedupe_recommendations;
pub use sequence::{FetchSequence, FetchToken};
pub use session::{SearchSession, SessionEvent};
pub use state::SearchState;
