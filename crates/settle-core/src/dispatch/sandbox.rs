use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use super::gateway::{
    check_charge_amount, ChargeReceipt, CustomerDetails, GatewayError, MerchantName,
    PaymentGateway, PaymentMethod, ProfileId,
};
use crate::types::Money;

/// Deterministic in-process gateway for simulations and tests.
///
/// Profiles are refused for tokens listed in `decline_tokens`; charges above
/// `charge_limit` fail as insufficient funds. Successful charges are appended
/// to a shared ledger so callers can inspect them after handing the gateway
/// to a registry.
#[derive(Debug)]
pub struct SandboxGateway {
    merchant: MerchantName,
    decline_tokens: HashSet<String>,
    charge_limit: Option<Money>,
    next_id: Cell<u32>,
    ledger: Rc<RefCell<Vec<ChargeReceipt>>>,
}

impl SandboxGateway {
    pub fn new(merchant: MerchantName) -> Self {
        SandboxGateway {
            merchant,
            decline_tokens: HashSet::new(),
            charge_limit: None,
            next_id: Cell::new(1),
            ledger: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn decline_token(mut self, token: impl Into<String>) -> Self {
        self.decline_tokens.insert(token.into());
        self
    }

    pub fn with_charge_limit(mut self, limit: Money) -> Self {
        self.charge_limit = Some(limit);
        self
    }

    /// Handle to the receipts of every successful charge.
    pub fn ledger(&self) -> Rc<RefCell<Vec<ChargeReceipt>>> {
        Rc::clone(&self.ledger)
    }

    fn next_reference(&self, kind: &str) -> String {
        let n = self.next_id.get();
        self.next_id.set(n + 1);
        format!("{}-{kind}-{n:06}", self.merchant)
    }
}

impl PaymentGateway for SandboxGateway {
    fn merchant(&self) -> MerchantName {
        self.merchant
    }

    fn create_profile(
        &self,
        customer: &CustomerDetails,
        method: &PaymentMethod,
    ) -> Result<ProfileId, GatewayError> {
        if self.decline_tokens.contains(method.token()) {
            return Err(GatewayError::new("Your payment method was declined")
                .with_status(402)
                .with_raw(format!(
                    r#"{{"error":"card_declined","customer":"{}"}}"#,
                    customer.consumer_id
                )));
        }
        Ok(ProfileId(self.next_reference("prof")))
    }

    fn charge(&self, profile: &ProfileId, amount: Money) -> Result<ChargeReceipt, GatewayError> {
        check_charge_amount(amount)?;
        if let Some(limit) = self.charge_limit {
            if amount > limit {
                return Err(GatewayError::new("Insufficient funds")
                    .with_status(402)
                    .with_raw(format!(
                        r#"{{"error":"insufficient_funds","profile":"{profile}","amount":"{amount}"}}"#
                    )));
            }
        }
        let receipt = ChargeReceipt {
            reference_id: self.next_reference("txn"),
            profile_id: profile.clone(),
            amount,
        };
        self.ledger.borrow_mut().push(receipt.clone());
        Ok(receipt)
    }
}
