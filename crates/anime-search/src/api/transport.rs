//! HTTP capability injected into the orchestration layer.

use async_trait::async_trait;
use serde_json::Value;

use super::types::RequestDescriptor;
use crate::error::FetchError;

/// Performs one catalog GET request.
///
/// Implementations return the parsed JSON body for a 2xx response and a
/// classified [`FetchError`] for everything else. They must not retry.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn perform(&self, request: &RequestDescriptor) -> Result<Value, FetchError>;
}

#[cfg(test)]
pub mod testing {
    //! Scripted transport for deterministic tests.

    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Scripted {
        delay: Duration,
        outcome: Result<Value, FetchError>,
    }

    /// Replies to requests in call order from a queue of scripted outcomes.
    ///
    /// With an empty queue it answers with an empty page.
    #[derive(Default)]
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        calls: Mutex<Vec<RequestDescriptor>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, outcome: Result<Value, FetchError>) -> &Self {
            self.push_delayed(Duration::ZERO, outcome)
        }

        pub fn push_delayed(&self, delay: Duration, outcome: Result<Value, FetchError>) -> &Self {
            self.script
                .lock()
                .unwrap()
                .push_back(Scripted { delay, outcome });
            self
        }

        pub fn calls(&self) -> Vec<RequestDescriptor> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogTransport for ScriptedTransport {
        async fn perform(&self, request: &RequestDescriptor) -> Result<Value, FetchError> {
            self.calls.lock().unwrap().push(request.clone());
            let next = self.script.lock().unwrap().pop_front();

            match next {
                Some(scripted) => {
                    if !scripted.delay.is_zero() {
                        tokio::time::sleep(scripted.delay).await;
                    }
                    scripted.outcome
                }
                None => Ok(json!({"data": [], "pagination": {"last_visible_page": 1}})),
            }
        }
    }

    /// Page body with `count` items numbered from `first_id`
    pub fn page_body(first_id: u32, count: u32, last_visible_page: u32) -> Value {
        let data: Vec<Value> = (first_id..first_id + count)
            .map(|id| json!({"mal_id": id, "title": format!("Anime {}", id)}))
            .collect();
        json!({
            "data": data,
            "pagination": {"last_visible_page": last_visible_page}
        })
    }
}
