use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::gateway::{MerchantName, ProfileId};
use super::revenue::RevenueShare;
use crate::error::SettleError;
use crate::negotiation::ConsumerStatus;
use crate::types::{Money, ScheduledPayment};
use crate::SettleResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProfileRecord {
    pub consumer_id: String,
    pub merchant: MerchantName,
    pub profile_id: ProfileId,
    /// Masked payment method description
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub reference_id: String,
    pub consumer_id: String,
    pub negotiation_id: String,
    pub amount: Money,
    pub revenue: RevenueShare,
    pub processed_on: NaiveDate,
}

/// Everything written after a successful gateway interaction, committed as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub idempotency_key: String,
    pub negotiation_id: String,
    pub consumer_id: String,
    pub profile: PaymentProfileRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionRecord>,
    pub schedule: Vec<ScheduledPayment>,
    pub status: ConsumerStatus,
}

/// Persistence for settlement outcomes.
pub trait SettlementStore {
    fn find_by_idempotency_key(&self, key: &str) -> SettleResult<Option<SettlementRecord>>;

    /// Persist the whole record or nothing. Fails if the key is already taken.
    fn commit(&mut self, record: SettlementRecord) -> SettleResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemorySettlementStore {
    records: Vec<SettlementRecord>,
    by_key: HashMap<String, usize>,
}

impl InMemorySettlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[SettlementRecord] {
        &self.records
    }

    pub fn transactions(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter().filter_map(|r| r.transaction.as_ref())
    }

    /// Latest status recorded for a consumer.
    pub fn consumer_status(&self, consumer_id: &str) -> Option<ConsumerStatus> {
        self.records
            .iter()
            .rev()
            .find(|r| r.consumer_id == consumer_id)
            .map(|r| r.status)
    }
}

impl SettlementStore for InMemorySettlementStore {
    fn find_by_idempotency_key(&self, key: &str) -> SettleResult<Option<SettlementRecord>> {
        Ok(self.by_key.get(key).map(|&i| self.records[i].clone()))
    }

    fn commit(&mut self, record: SettlementRecord) -> SettleResult<()> {
        if self.by_key.contains_key(&record.idempotency_key) {
            return Err(SettleError::Persistence(format!(
                "settlement {} already recorded",
                record.idempotency_key
            )));
        }
        self.by_key
            .insert(record.idempotency_key.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }
}
