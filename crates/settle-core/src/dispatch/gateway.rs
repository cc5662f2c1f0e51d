use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::error::SettleError;
use crate::types::Money;
use crate::SettleResult;

/// Payment processor assigned to a consumer's creditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantName {
    AuthorizeNet,
    UsaEpay,
    Stripe,
    Tilled,
}

impl fmt::Display for MerchantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MerchantName::AuthorizeNet => "authorize_net",
            MerchantName::UsaEpay => "usa_epay",
            MerchantName::Stripe => "stripe",
            MerchantName::Tilled => "tilled",
        })
    }
}

impl std::str::FromStr for MerchantName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', '.'], "").as_str() {
            "authorizenet" => Ok(MerchantName::AuthorizeNet),
            "usaepay" => Ok(MerchantName::UsaEpay),
            "stripe" => Ok(MerchantName::Stripe),
            "tilled" => Ok(MerchantName::Tilled),
            other => Err(format!("unknown merchant '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub consumer_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Tokenised payment method captured from the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Card {
        token: String,
        last_four: String,
        expiry: String,
    },
    Ach {
        token: String,
        account_last_four: String,
        routing_number: String,
    },
}

impl PaymentMethod {
    pub fn token(&self) -> &str {
        match self {
            PaymentMethod::Card { token, .. } | PaymentMethod::Ach { token, .. } => token,
        }
    }

    /// Masked description safe to persist and display.
    pub fn summary(&self) -> String {
        match self {
            PaymentMethod::Card { last_four, expiry, .. } => format!("card ****{last_four} exp {expiry}"),
            PaymentMethod::Ach {
                account_last_four,
                routing_number,
                ..
            } => format!("ach ****{account_last_four} routing {routing_number}"),
        }
    }

    pub fn validate(&self) -> SettleResult<()> {
        if self.token().trim().is_empty() {
            return Err(SettleError::invalid("payment_method.token", "Token is required"));
        }
        match self {
            PaymentMethod::Card { last_four, .. } => check_digits("payment_method.last_four", last_four, 4),
            PaymentMethod::Ach {
                account_last_four,
                routing_number,
                ..
            } => {
                check_digits("payment_method.account_last_four", account_last_four, 4)?;
                check_digits("payment_method.routing_number", routing_number, 9)
            }
        }
    }
}

fn check_digits(field: &str, value: &str, len: usize) -> SettleResult<()> {
    if value.len() != len || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(SettleError::invalid(field, format!("Expected {len} digits")));
    }
    Ok(())
}

/// Customer profile identifier issued by a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeReceipt {
    pub reference_id: String,
    pub profile_id: ProfileId,
    pub amount: Money,
}

/// A failed gateway call. `message` is shown to the consumer; the rest is for operators.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,
    pub status_code: Option<u16>,
    pub raw_response: Option<String>,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        GatewayError {
            message: message.into(),
            status_code: None,
            raw_response: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }
}

/// One payment processor integration.
pub trait PaymentGateway {
    fn merchant(&self) -> MerchantName;

    /// Store the payment method with the processor and return its profile handle.
    fn create_profile(
        &self,
        customer: &CustomerDetails,
        method: &PaymentMethod,
    ) -> Result<ProfileId, GatewayError>;

    fn charge(&self, profile: &ProfileId, amount: Money) -> Result<ChargeReceipt, GatewayError>;
}

/// Gateways keyed by the merchant they serve.
#[derive(Default)]
pub struct GatewayRegistry {
    gateways: HashMap<MerchantName, Box<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway under its own merchant, replacing any previous one.
    pub fn register(&mut self, gateway: Box<dyn PaymentGateway>) -> &mut Self {
        self.gateways.insert(gateway.merchant(), gateway);
        self
    }

    pub fn get(&self, merchant: MerchantName) -> SettleResult<&dyn PaymentGateway> {
        self.gateways
            .get(&merchant)
            .map(|g| g.as_ref())
            .ok_or_else(|| SettleError::UnsupportedMerchant(merchant.to_string()))
    }

    pub fn merchants(&self) -> Vec<MerchantName> {
        let mut merchants: Vec<MerchantName> = self.gateways.keys().copied().collect();
        merchants.sort_by_key(|m| m.to_string());
        merchants
    }
}

/// Charges must be positive and in whole cents.
pub(crate) fn check_charge_amount(amount: Money) -> Result<(), GatewayError> {
    if amount <= Decimal::ZERO || amount.round_dp(2) != amount {
        return Err(GatewayError::new("Invalid charge amount").with_status(400));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::sandbox::SandboxGateway;

    fn card() -> PaymentMethod {
        PaymentMethod::Card {
            token: "tok_visa".into(),
            last_four: "4242".into(),
            expiry: "12/30".into(),
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = GatewayRegistry::new();
        registry
            .register(Box::new(SandboxGateway::new(MerchantName::Stripe)))
            .register(Box::new(SandboxGateway::new(MerchantName::UsaEpay)));

        assert_eq!(registry.get(MerchantName::Stripe).unwrap().merchant(), MerchantName::Stripe);
        assert!(matches!(
            registry.get(MerchantName::Tilled),
            Err(SettleError::UnsupportedMerchant(ref m)) if m == "tilled"
        ));
        assert_eq!(registry.merchants(), vec![MerchantName::Stripe, MerchantName::UsaEpay]);
    }

    #[test]
    fn test_payment_method_validation_and_summary() {
        assert!(card().validate().is_ok());
        assert_eq!(card().summary(), "card ****4242 exp 12/30");

        let ach = PaymentMethod::Ach {
            token: "tok_ach".into(),
            account_last_four: "6789".into(),
            routing_number: "12345".into(),
        };
        assert!(matches!(
            ach.validate(),
            Err(SettleError::InvalidInput { ref field, .. }) if field == "payment_method.routing_number"
        ));
    }

    #[test]
    fn test_merchant_parse() {
        assert_eq!("Authorize.Net".parse::<MerchantName>(), Ok(MerchantName::AuthorizeNet));
        assert_eq!("usa-epay".parse::<MerchantName>(), Ok(MerchantName::UsaEpay));
        assert!("paypal".parse::<MerchantName>().is_err());
    }

    #[test]
    fn test_charge_amount_check() {
        assert!(check_charge_amount(Decimal::new(1445, 2)).is_ok());
        assert!(check_charge_amount(Decimal::new(14451, 3)).is_err());
        assert!(check_charge_amount(Decimal::ZERO).is_err());
    }
}
