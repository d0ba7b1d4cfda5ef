//! Shared fixtures for settlement integration tests.

use std::collections::HashMap;
use std::sync::Mutex;

use zkpayroll_accounts::Address;
use zkpayroll_core::split_salary;
use zkpayroll_settlement::{
    MessageSigner, SalaryPayment, SettlementClient, SettlementError, TokenSymbol,
    TransactionId, TransferRequest,
};

/// Employer wallet fixture.
pub const EMPLOYER: Address = Address([1; 32]);
/// Employee wallet fixture.
pub const EMPLOYEE: Address = Address([2; 32]);
/// Tax authority wallet fixture.
pub const TAX_AUTHORITY: Address = Address([3; 32]);

/// Signer that returns a fixed signature.
#[derive(Debug, Default)]
pub struct StaticSigner;

impl MessageSigner for StaticSigner {
    fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, SettlementError> {
        Ok(message.iter().rev().copied().collect())
    }
}

/// Client that records transfers and fails the call numbers listed in `fail_on`.
#[derive(Debug, Default)]
pub struct RecordingClient {
    fail_on: Vec<usize>,
    transfers: Mutex<Vec<TransferRequest>>,
    balances: HashMap<Address, u64>,
}

impl RecordingClient {
    /// Client whose 1-based `fail_on` transfer calls are rejected.
    #[allow(dead_code)]
    pub fn failing_on(fail_on: &[usize]) -> Self {
        Self {
            fail_on: fail_on.to_vec(),
            ..Self::default()
        }
    }

    /// Client reporting `balance` for `wallet`.
    #[allow(dead_code)]
    pub fn with_balance(wallet: Address, balance: u64) -> Self {
        Self {
            balances: HashMap::from([(wallet, balance)]),
            ..Self::default()
        }
    }

    /// Returns recorded transfers in submission order.
    #[allow(dead_code)]
    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers.lock().expect("transfer lock should work").clone()
    }
}

impl SettlementClient for RecordingClient {
    fn transfer(
        &self,
        request: &TransferRequest,
        signer: &dyn MessageSigner,
    ) -> Result<TransactionId, SettlementError> {
        signer.sign_message(request.recipient.as_bytes())?;
        let mut transfers = self.transfers.lock().expect("transfer lock should work");
        transfers.push(request.clone());
        let call = transfers.len();
        if self.fail_on.contains(&call) {
            return Err(SettlementError::Rejected(format!("call {call} rejected")));
        }
        TransactionId::new(format!("tx-{call}"))
    }

    fn balance(&self, wallet: &Address, _token: &TokenSymbol) -> Result<u64, SettlementError> {
        self.balances
            .get(wallet)
            .copied()
            .ok_or_else(|| SettlementError::Transport("unknown wallet".to_string()))
    }
}

/// Builds a payment of `gross` at `tax_rate_bps`.
#[allow(dead_code)]
pub fn fixture_payment(gross: u64, tax_rate_bps: u16) -> SalaryPayment {
    SalaryPayment {
        employer: EMPLOYER,
        employee: EMPLOYEE,
        tax_authority: TAX_AUTHORITY,
        split: split_salary(gross, tax_rate_bps).expect("split should succeed"),
        token: "USDC".parse().expect("token should parse"),
    }
}
