use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::gateway::{CustomerDetails, GatewayError, GatewayRegistry, MerchantName, PaymentMethod};
use super::revenue::{split_revenue, FeeLookup};
use super::store::{PaymentProfileRecord, SettlementRecord, SettlementStore, TransactionRecord};
use crate::clock::Clock;
use crate::error::SettleError;
use crate::negotiation::{
    evaluate_offer_checked, ConsumerEvent, ConsumerStatus, OfferEvaluation, OfferInput, SettlementTiming,
};
use crate::schedule::generate_schedule;
use crate::types::{Money, ScheduledPayment};
use crate::SettleResult;

/// A consumer's payment-method submission for a negotiated offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub negotiation_id: String,
    pub company_id: String,
    pub merchant: MerchantName,
    pub customer: CustomerDetails,
    pub payment_method: PaymentMethod,
    pub offer: OfferInput,
    #[serde(default)]
    pub current_status: ConsumerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// One-time settlement charged; consumer settled
    Settled,
    /// Future-dated one-time settlement recorded without a charge
    OfferRecorded,
    /// Installment plan stored with its payment method
    PaymentPlanActivated,
    /// The same submission was already processed; nothing was charged
    Duplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub kind: OutcomeKind,
    pub record: SettlementRecord,
}

/// Routes payment submissions to the consumer's gateway and records the result.
pub struct PaymentDispatcher<S: SettlementStore> {
    gateways: GatewayRegistry,
    store: S,
    fees: Box<dyn FeeLookup>,
    clock: Box<dyn Clock>,
}

impl<S: SettlementStore> PaymentDispatcher<S> {
    pub fn new(
        gateways: GatewayRegistry,
        store: S,
        fees: Box<dyn FeeLookup>,
        clock: Box<dyn Clock>,
    ) -> Self {
        PaymentDispatcher {
            gateways,
            store,
            fees,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one submission.
    ///
    /// At most one gateway is called. A gateway failure persists nothing and
    /// surfaces the processor's consumer-facing message. A submission whose
    /// idempotency key was already committed returns the stored record as
    /// `Duplicate` without contacting the gateway.
    pub fn submit(&mut self, submission: &PaymentSubmission) -> SettleResult<DispatchOutcome> {
        submission.payment_method.validate()?;
        if submission.negotiation_id.trim().is_empty() {
            return Err(SettleError::invalid("negotiation_id", "Negotiation id is required"));
        }

        let today = self.clock.today();
        let evaluation = evaluate_offer_checked(&submission.offer, today)?;
        let gateway = self.gateways.get(submission.merchant)?;

        let key = idempotency_key(&submission.negotiation_id, committed_amount(&evaluation), today);
        if let Some(record) = self.store.find_by_idempotency_key(&key)? {
            warn!(
                negotiation = %submission.negotiation_id,
                key = %key,
                "Duplicate payment submission ignored"
            );
            return Ok(DispatchOutcome {
                kind: OutcomeKind::Duplicate,
                record,
            });
        }

        let status = target_status(submission.current_status, &evaluation)?;
        let merchant = submission.merchant;

        // The split is settled before the gateway sees the payment method, so a
        // bad fee configuration fails without moving money.
        let revenue = match evaluation.amount_due_now() {
            Some(amount) => Some(split_revenue(amount, self.fee_percent(submission))?),
            None => None,
        };

        let profile_id = gateway
            .create_profile(&submission.customer, &submission.payment_method)
            .map_err(|e| gateway_failure(merchant, "create_profile", e))?;

        let (kind, transaction, schedule) = match (&evaluation, revenue) {
            (
                OfferEvaluation::Settlement {
                    settlement_amount, ..
                },
                Some(revenue),
            ) => {
                let receipt = gateway
                    .charge(&profile_id, *settlement_amount)
                    .map_err(|e| gateway_failure(merchant, "charge", e))?;
                let paid = vec![ScheduledPayment {
                    due_date: today,
                    amount: receipt.amount,
                }];
                let transaction = TransactionRecord {
                    reference_id: receipt.reference_id,
                    consumer_id: submission.customer.consumer_id.clone(),
                    negotiation_id: submission.negotiation_id.clone(),
                    amount: receipt.amount,
                    revenue,
                    processed_on: today,
                };
                (OutcomeKind::Settled, Some(transaction), paid)
            }
            (
                OfferEvaluation::Settlement {
                    settlement_amount,
                    first_payment_date,
                    ..
                },
                None,
            ) => {
                let scheduled = vec![ScheduledPayment {
                    due_date: *first_payment_date,
                    amount: *settlement_amount,
                }];
                (OutcomeKind::OfferRecorded, None, scheduled)
            }
            (OfferEvaluation::Installment { plan, .. }, _) => (
                OutcomeKind::PaymentPlanActivated,
                None,
                generate_schedule(plan, today, false),
            ),
        };

        let record = SettlementRecord {
            idempotency_key: key,
            negotiation_id: submission.negotiation_id.clone(),
            consumer_id: submission.customer.consumer_id.clone(),
            profile: PaymentProfileRecord {
                consumer_id: submission.customer.consumer_id.clone(),
                merchant,
                profile_id,
                method: submission.payment_method.summary(),
            },
            transaction,
            schedule,
            status,
        };

        if let Err(e) = self.store.commit(record.clone()) {
            error!(
                negotiation = %submission.negotiation_id,
                merchant = %merchant,
                reference = ?record.transaction.as_ref().map(|t| t.reference_id.as_str()),
                error = %e,
                "Gateway call succeeded but settlement could not be recorded"
            );
            return Err(e);
        }

        info!(
            negotiation = %submission.negotiation_id,
            merchant = %merchant,
            outcome = ?kind,
            status = ?status,
            "Payment submission processed"
        );
        Ok(DispatchOutcome { kind, record })
    }

    fn fee_percent(&self, submission: &PaymentSubmission) -> Decimal {
        self.fees
            .fee_percent(&submission.company_id)
            .or(submission.offer.terms.fee_percent)
            .unwrap_or_else(|| {
                warn!(company = %submission.company_id, "No revenue share configured; using 0%");
                Decimal::ZERO
            })
    }
}

/// Key identifying one logical submission: negotiation, amount and calendar day.
pub fn idempotency_key(negotiation_id: &str, amount: Money, day: NaiveDate) -> String {
    format!("{negotiation_id}:{}:{day}", amount.normalize())
}

fn committed_amount(evaluation: &OfferEvaluation) -> Money {
    match evaluation {
        OfferEvaluation::Settlement {
            settlement_amount, ..
        } => *settlement_amount,
        OfferEvaluation::Installment { plan, .. } => plan.total_amount(),
    }
}

/// Status the consumer ends in once this submission succeeds.
fn target_status(current: ConsumerStatus, evaluation: &OfferEvaluation) -> SettleResult<ConsumerStatus> {
    let offer_only = matches!(
        evaluation,
        OfferEvaluation::Settlement {
            timing: SettlementTiming::OfferOnly,
            ..
        }
    );
    let submitted = match (current, evaluation) {
        (ConsumerStatus::Joined | ConsumerStatus::Renegotiate, _) => {
            current.apply(ConsumerEvent::OfferSubmitted {
                auto_approved: !offer_only,
            })?
        }
        // A plan arriving while the consumer awaits approval is the accepted one
        (ConsumerStatus::PaymentSetup, OfferEvaluation::Installment { .. }) => {
            current.apply(ConsumerEvent::CounterOfferAccepted)?
        }
        (ConsumerStatus::PaymentSetup | ConsumerStatus::PaymentAccepted, _) => current,
        (ConsumerStatus::Settled | ConsumerStatus::Deactivated, _) => {
            return Err(SettleError::InvalidTransition {
                from: format!("{current:?}"),
                event: "PaymentSubmitted".into(),
            })
        }
    };
    if evaluation.is_pay_now() {
        submitted.apply(ConsumerEvent::PaymentCompleted { paid_in_full: true })
    } else {
        Ok(submitted)
    }
}

fn gateway_failure(merchant: MerchantName, operation: &str, e: GatewayError) -> SettleError {
    error!(
        merchant = %merchant,
        operation,
        status_code = ?e.status_code,
        raw_response = e.raw_response.as_deref().unwrap_or(""),
        "Payment gateway call failed"
    );
    SettleError::Gateway {
        merchant: merchant.to_string(),
        message: e.message,
    }
}
