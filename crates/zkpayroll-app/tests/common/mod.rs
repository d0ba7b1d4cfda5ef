//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use zkpayroll_accounts::Address;
use zkpayroll_core::Employee;
use zkpayroll_screening::{
    DEFAULT_SCREENING_API_URL, ScreeningConfig, ScreeningError, ScreeningService,
    ScreeningTransport, TransportReply, TransportRequest,
};
use zkpayroll_settlement::{
    MessageSigner, SettlementClient, SettlementError, TokenSymbol, TransactionId,
    TransferRequest,
};

/// Employer wallet fixture.
#[allow(dead_code)]
pub const EMPLOYER: Address = Address([1; 32]);
/// Tax authority wallet fixture.
#[allow(dead_code)]
pub const TAX_AUTHORITY: Address = Address([3; 32]);

/// Transport answering every request with the same reply, recording URLs.
#[derive(Debug)]
pub struct FixedTransport {
    reply: Result<TransportReply, String>,
    urls: Mutex<Vec<String>>,
}

impl FixedTransport {
    /// Replies with `status` and `body`.
    #[allow(dead_code)]
    pub fn reply(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(TransportReply {
                status,
                body: body.to_string(),
            }),
            urls: Mutex::new(Vec::new()),
        })
    }

    /// Fails every request at the transport level.
    #[allow(dead_code)]
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: Err("connection refused".to_string()),
            urls: Mutex::new(Vec::new()),
        })
    }

    /// Number of requests sent.
    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.urls().len()
    }

    /// URLs of the requests sent, in order.
    #[allow(dead_code)]
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("url lock should work").clone()
    }
}

impl ScreeningTransport for FixedTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportReply, ScreeningError> {
        self.urls
            .lock()
            .expect("url lock should work")
            .push(request.url.clone());
        self.reply.clone().map_err(ScreeningError::Transport)
    }
}

/// Keyed screening service over `transport`.
#[allow(dead_code)]
pub fn keyed_service(transport: Arc<FixedTransport>) -> ScreeningService {
    let config = ScreeningConfig::new(DEFAULT_SCREENING_API_URL, Some("secret-key".to_string()))
        .expect("config should build");
    ScreeningService::new(config, transport).with_rng_seed(17)
}

/// Screening service without an API key.
#[allow(dead_code)]
pub fn mock_service(transport: Arc<FixedTransport>) -> ScreeningService {
    let config =
        ScreeningConfig::new(DEFAULT_SCREENING_API_URL, None).expect("config should build");
    ScreeningService::new(config, transport).with_rng_seed(17)
}

/// Active employee with a valid wallet and `salary`.
#[allow(dead_code)]
pub fn fixture_employee(salary: u64) -> Employee {
    Employee::new("EMP001", "Ada", Address([2; 32]).to_string(), salary)
        .expect("employee fixture should be valid")
}

/// Signer returning an empty signature.
#[derive(Debug, Default)]
pub struct NullSigner;

impl MessageSigner for NullSigner {
    fn sign_message(&self, _message: &[u8]) -> Result<Vec<u8>, SettlementError> {
        Ok(Vec::new())
    }
}

/// Settlement client recording transfers; optionally rejects the tax leg.
#[derive(Debug, Default)]
pub struct LedgerClient {
    /// Reject the second transfer.
    pub reject_tax: bool,
    pub transfers: Mutex<Vec<TransferRequest>>,
}

impl LedgerClient {
    /// Number of transfers submitted.
    #[allow(dead_code)]
    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().expect("transfer lock should work").len()
    }
}

impl SettlementClient for LedgerClient {
    fn transfer(
        &self,
        request: &TransferRequest,
        _signer: &dyn MessageSigner,
    ) -> Result<TransactionId, SettlementError> {
        let mut transfers = self.transfers.lock().expect("transfer lock should work");
        transfers.push(request.clone());
        if self.reject_tax && transfers.len() == 2 {
            return Err(SettlementError::Rejected("tax leg rejected".to_string()));
        }
        TransactionId::new(format!("sig-{}", transfers.len()))
    }

    fn balance(&self, _wallet: &Address, _token: &TokenSymbol) -> Result<u64, SettlementError> {
        Ok(u64::MAX)
    }
}
