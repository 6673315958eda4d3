//! Programmable in-memory enhancement provider.

use async_trait::async_trait;
use bytes::Bytes;
use skyframe_enhance::{EnhanceError, EnhanceModel, EnhanceProvider, PollOutcome};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Fake provider with programmable responses and call counters.
///
/// Defaults: configured, submit returns `pred-1`, poll reports running,
/// fetch returns a small fixed payload.
pub struct MockProvider {
    configured: AtomicBool,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    submit_response: Mutex<Result<String, String>>,
    poll_response: Mutex<Result<PollOutcome, String>>,
    fetch_response: Mutex<Result<Vec<u8>, String>>,
    submit_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            configured: AtomicBool::new(true),
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            submit_response: Mutex::new(Ok("pred-1".to_string())),
            poll_response: Mutex::new(Ok(PollOutcome::Running { progress: None })),
            fetch_response: Mutex::new(Ok(b"enhanced video bytes".to_vec())),
            submit_gate: Mutex::new(None),
        }
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    pub fn set_submit_error(&self, message: &str) {
        *self.submit_response.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_poll_outcome(&self, outcome: PollOutcome) {
        *self.poll_response.lock().unwrap() = Ok(outcome);
    }

    pub fn set_poll_error(&self, message: &str) {
        *self.poll_response.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_fetch_data(&self, data: &[u8]) {
        *self.fetch_response.lock().unwrap() = Ok(data.to_vec());
    }

    pub fn set_fetch_error(&self, message: &str) {
        *self.fetch_response.lock().unwrap() = Err(message.to_string());
    }

    /// Hold every subsequent submit call until the returned handle is notified.
    pub fn gate_submit(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.submit_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

fn rejected(message: &str) -> EnhanceError {
    EnhanceError::Rejected {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl EnhanceProvider for MockProvider {
    async fn submit(
        &self,
        _source_url: &str,
        _model: &EnhanceModel,
    ) -> Result<String, EnhanceError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.submit_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.submit_response
            .lock()
            .unwrap()
            .clone()
            .map_err(|message| rejected(&message))
    }

    async fn poll(&self, _provider_id: &str) -> Result<PollOutcome, EnhanceError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.poll_response
            .lock()
            .unwrap()
            .clone()
            .map_err(|message| rejected(&message))
    }

    async fn fetch_result(&self, _result_url: &str) -> Result<Bytes, EnhanceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_response
            .lock()
            .unwrap()
            .clone()
            .map(Bytes::from)
            .map_err(|message| rejected(&message))
    }

    fn configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }
}
