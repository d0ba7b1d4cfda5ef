//! Shared fixtures for screening integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use zkpayroll_screening::{
    DEFAULT_SCREENING_API_URL, ScreeningConfig, ScreeningError, ScreeningService,
    ScreeningTransport, TransportReply, TransportRequest,
};

/// Address used across screening tests.
#[allow(dead_code)]
pub const ADDRESS: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

/// Transport that replays scripted replies and records every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<TransportReply, String>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    /// Creates a transport answering with `replies` in order.
    #[allow(dead_code)]
    pub fn new(replies: Vec<Result<(u16, &str), &str>>) -> Arc<Self> {
        let replies = replies
            .into_iter()
            .map(|reply| {
                reply
                    .map(|(status, body)| TransportReply {
                        status,
                        body: body.to_string(),
                    })
                    .map_err(str::to_string)
            })
            .collect();
        Arc::new(Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Returns recorded requests.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("request lock should work").clone()
    }
}

impl ScreeningTransport for ScriptedTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportReply, ScreeningError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request.clone());
        self.replies
            .lock()
            .expect("reply lock should work")
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply".to_string()))
            .map_err(ScreeningError::Transport)
    }
}

/// Builds a keyed service over `transport` with a fixed seed.
#[allow(dead_code)]
pub fn keyed_service(transport: Arc<ScriptedTransport>, seed: u64) -> ScreeningService {
    let config = ScreeningConfig::new(DEFAULT_SCREENING_API_URL, Some("test-key".to_string()))
        .expect("config should build");
    ScreeningService::new(config, transport).with_rng_seed(seed)
}
