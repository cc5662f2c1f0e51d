use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SettleError;
use crate::types::*;
use crate::SettleResult;

/// How a collected amount is divided between the platform and the creditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueShare {
    pub amount: Money,
    pub fee_percent: Percent,
    pub platform_share: Money,
    pub company_share: Money,
}

/// Split `amount` by the platform fee.
///
/// The platform share is rounded to the cent and the company receives the
/// rest, so the two shares always add back to `amount` exactly.
pub fn split_revenue(amount: Money, fee_percent: Percent) -> SettleResult<RevenueShare> {
    if amount < Decimal::ZERO {
        return Err(SettleError::invalid("amount", "Amount cannot be negative"));
    }
    check_fee("fee_percent", fee_percent)?;

    let platform_share = round_money(percent_of(amount, fee_percent));
    Ok(RevenueShare {
        amount,
        fee_percent,
        platform_share,
        company_share: amount - platform_share,
    })
}

/// Revenue-share percentage configured for each company.
pub trait FeeLookup {
    fn fee_percent(&self, company_id: &str) -> Option<Percent>;
}

/// Fixed fee table with an optional fallback for unlisted companies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticFeeTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_percent: Option<Percent>,
    #[serde(default)]
    pub companies: HashMap<String, Percent>,
}

impl StaticFeeTable {
    pub fn new(default_percent: Option<Percent>) -> Self {
        StaticFeeTable {
            default_percent,
            companies: HashMap::new(),
        }
    }

    pub fn with_company(mut self, company_id: impl Into<String>, percent: Percent) -> Self {
        self.companies.insert(company_id.into(), percent);
        self
    }

    /// Every configured percent must lie in `[0, 100]`.
    pub fn validate(&self) -> SettleResult<()> {
        if let Some(pct) = self.default_percent {
            check_fee("default_percent", pct)?;
        }
        for (company, pct) in &self.companies {
            check_fee(&format!("companies.{company}"), *pct)?;
        }
        Ok(())
    }
}

fn check_fee(field: &str, fee_percent: Percent) -> SettleResult<()> {
    if fee_percent < Decimal::ZERO || fee_percent > Decimal::ONE_HUNDRED {
        return Err(SettleError::invalid(field, "Must be between 0 and 100"));
    }
    Ok(())
}

impl FeeLookup for StaticFeeTable {
    fn fee_percent(&self, company_id: &str) -> Option<Percent> {
        self.companies
            .get(company_id)
            .copied()
            .or(self.default_percent)
    }
}
