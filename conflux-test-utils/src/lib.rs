//! CONFLUX Test Utilities
//!
//! Centralized test infrastructure for the CONFLUX workspace:
//! - A programmable mock transport with per-target FIFO responses, call
//!   counting, a request log, and a hold gate for keeping requests in
//!   flight while a test inspects intermediate state
//! - Fixture builders for common payloads

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use conflux_core::{Payload, Target, Transport, TransportError, TransportRequest};
use tokio::sync::watch;

/// Programmable in-memory transport.
///
/// Responses are registered per target and consumed FIFO within a target.
/// Every performed request is counted and logged, so tests can assert call
/// totals, parameters, and options. [`hold`](MockTransport::hold) keeps all
/// requests suspended at the network boundary until
/// [`release`](MockTransport::release) - the way tests observe in-flight
/// state, exercise deduplication, and race resets against live fetches.
pub struct MockTransport {
    state: Mutex<MockState>,
    gate: watch::Sender<bool>,
}

#[derive(Default)]
struct MockState {
    responses: HashMap<String, VecDeque<Result<Payload, TransportError>>>,
    calls: HashMap<String, usize>,
    log: Vec<TransportRequest>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (gate, _rx) = watch::channel(false);
        Self {
            state: Mutex::new(MockState::default()),
            gate,
        }
    }

    fn target_key(target: &Target) -> String {
        match target {
            Target::Datapoint {
                namespace,
                module,
                datapoint,
            } => format!("{namespace}/{module}/data/{datapoint}"),
            Target::Absolute { url } => url.clone(),
        }
    }

    fn push_response(&self, key: String, response: Result<Payload, TransportError>) {
        let mut state = self.state.lock().expect("mock state lock");
        state.responses.entry(key).or_default().push_back(response);
    }

    /// Queue a response for a REST datapoint target.
    pub fn respond_datapoint(
        &self,
        namespace: &str,
        module: &str,
        datapoint: &str,
        response: Result<Payload, TransportError>,
    ) {
        self.push_response(
            format!("{namespace}/{module}/data/{datapoint}"),
            response,
        );
    }

    /// Queue a response for an absolute URL target.
    pub fn respond_absolute(&self, url: &str, response: Result<Payload, TransportError>) {
        self.push_response(url.to_string(), response);
    }

    /// Suspend all subsequent `perform` calls at the network boundary.
    pub fn hold(&self) {
        // send_replace updates even when no receiver is subscribed yet.
        self.gate.send_replace(true);
    }

    /// Resume every held call.
    pub fn release(&self) {
        self.gate.send_replace(false);
    }

    /// How many calls hit a datapoint target.
    pub fn calls_for_datapoint(&self, namespace: &str, module: &str, datapoint: &str) -> usize {
        let key = format!("{namespace}/{module}/data/{datapoint}");
        self.state
            .lock()
            .expect("mock state lock")
            .calls
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    /// How many calls hit an absolute URL target.
    pub fn calls_for_absolute(&self, url: &str) -> usize {
        self.state
            .lock()
            .expect("mock state lock")
            .calls
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Total calls across all targets.
    pub fn total_calls(&self) -> usize {
        self.state
            .lock()
            .expect("mock state lock")
            .calls
            .values()
            .sum()
    }

    /// Every request performed so far, in order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state.lock().expect("mock state lock").log.clone()
    }

    /// The most recent request, if any was performed.
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.state.lock().expect("mock state lock").log.last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform(&self, request: &TransportRequest) -> Result<Payload, TransportError> {
        let key = Self::target_key(&request.target);

        // Record before the gate so tests can count a held call as started.
        {
            let mut state = self.state.lock().expect("mock state lock");
            *state.calls.entry(key.clone()).or_insert(0) += 1;
            state.log.push(request.clone());
        }

        let mut gate = self.gate.subscribe();
        while *gate.borrow_and_update() {
            if gate.changed().await.is_err() {
                break;
            }
        }

        let mut state = self.state.lock().expect("mock state lock");
        state
            .responses
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(TransportError::internal(format!(
                    "no mock response registered for {key}"
                )))
            })
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("total_calls", &self.total_calls())
            .finish()
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Canned payload builders for module tests.
pub mod fixtures {
    use serde_json::{json, Value};

    /// A UA property payload as the analytics datapoint returns it.
    pub fn property_json(account_id: &str, index: u32, default_profile_id: &str) -> Value {
        json!({
            "id": format!("UA-{account_id}-{index}"),
            "accountId": account_id,
            "name": format!("Property {index}"),
            "internalWebPropertyId": format!("2000{index}"),
            "defaultProfileId": default_profile_id,
        })
    }

    /// A profile payload belonging to a property.
    pub fn profile_json(property_id: &str, id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "webPropertyId": property_id,
            "name": name,
        })
    }

    /// A properties-profiles response body.
    pub fn properties_profiles_json(
        properties: Vec<Value>,
        profiles: Vec<Value>,
        matched_property: Option<Value>,
    ) -> Value {
        let mut body = json!({
            "properties": properties,
            "profiles": profiles,
        });
        if let Some(matched) = matched_property {
            body["matchedProperty"] = matched;
        }
        body
    }

    /// A minimal HTML page for site inspection tests.
    pub fn html_page(head_extra: &str) -> String {
        format!(
            "<!DOCTYPE html><html><head><title>Test</title>{head_extra}</head><body></body></html>"
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
