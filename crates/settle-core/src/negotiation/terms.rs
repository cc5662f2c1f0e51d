use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SettleError;
use crate::types::Percent;
use crate::SettleResult;

/// Creditor-configured negotiation rules. Percentages are whole numbers (15 = 15%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationTerms {
    /// Discount granted on the balance when the consumer sets up an installment plan
    #[serde(default)]
    pub pay_setup_discount_percent: Percent,
    /// Discount granted on the balance for a one-time payoff
    #[serde(default)]
    pub pif_discount_percent: Percent,
    /// Smallest installment, as a share of the negotiated amount
    pub min_monthly_pay_percent: Percent,
    /// Latest allowed first payment, in days from today
    pub max_first_pay_days: u32,
    /// Platform revenue share for this company
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_percent: Option<Percent>,
}

impl Default for NegotiationTerms {
    fn default() -> Self {
        NegotiationTerms {
            pay_setup_discount_percent: Decimal::ZERO,
            pif_discount_percent: Decimal::ZERO,
            min_monthly_pay_percent: Decimal::TEN,
            max_first_pay_days: 30,
            fee_percent: None,
        }
    }
}

impl NegotiationTerms {
    pub fn validate(&self) -> SettleResult<()> {
        check_percent("pay_setup_discount_percent", self.pay_setup_discount_percent)?;
        check_percent("pif_discount_percent", self.pif_discount_percent)?;
        check_percent("min_monthly_pay_percent", self.min_monthly_pay_percent)?;
        if self.min_monthly_pay_percent.is_zero() {
            return Err(SettleError::invalid(
                "min_monthly_pay_percent",
                "Minimum monthly payment must be greater than 0%",
            ));
        }
        if let Some(fee) = self.fee_percent {
            check_percent("fee_percent", fee)?;
        }
        Ok(())
    }
}

fn check_percent(field: &str, value: Percent) -> SettleResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(SettleError::invalid(field, "Must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_terms_validation() {
        assert!(NegotiationTerms::default().validate().is_ok());

        let mut terms = NegotiationTerms::default();
        terms.pay_setup_discount_percent = dec!(101);
        assert!(terms.validate().is_err());

        let mut terms = NegotiationTerms::default();
        terms.min_monthly_pay_percent = Decimal::ZERO;
        assert!(terms.validate().is_err());

        let mut terms = NegotiationTerms::default();
        terms.fee_percent = Some(dec!(-1));
        assert!(terms.validate().is_err());
    }

    #[test]
    fn test_terms_deserialize_with_defaults() {
        let terms: NegotiationTerms = serde_json::from_str(
            r#"{"min_monthly_pay_percent": "17", "max_first_pay_days": 20}"#,
        )
        .unwrap();
        assert_eq!(terms.min_monthly_pay_percent, dec!(17));
        assert_eq!(terms.pay_setup_discount_percent, Decimal::ZERO);
        assert_eq!(terms.fee_percent, None);
    }
}
