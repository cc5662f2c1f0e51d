use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::plan::{derive_pif_amount, NegotiationPlan};
use super::terms::NegotiationTerms;
use crate::error::SettleError;
use crate::schedule::calculator::InstallmentTerms;
use crate::types::Money;
use crate::SettleResult;

/// Revised terms proposed by the creditor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterOffer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub accepted: bool,
}

/// A consumer's submitted offer, with any counter-offer on record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferInput {
    pub balance: Money,
    pub terms: NegotiationTerms,
    pub plan: NegotiationPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_offer: Option<CounterOffer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementTiming {
    /// Charge the settlement amount now
    PayNow,
    /// Record the offer and charge on the scheduled date
    OfferOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OfferEvaluation {
    Settlement {
        timing: SettlementTiming,
        settlement_amount: Money,
        /// Balance less the creditor's PIF discount, for display and validation
        minimum_discount_amount: Money,
        first_payment_date: NaiveDate,
        counter_offer_applied: bool,
    },
    Installment {
        plan: InstallmentTerms,
        counter_offer_applied: bool,
    },
}

impl OfferEvaluation {
    pub fn is_pay_now(&self) -> bool {
        matches!(
            self,
            OfferEvaluation::Settlement {
                timing: SettlementTiming::PayNow,
                ..
            }
        )
    }

    /// Check the terms that resulted from applying any counter-offer.
    pub fn validate(&self) -> SettleResult<()> {
        match self {
            OfferEvaluation::Settlement {
                settlement_amount, ..
            } => {
                if *settlement_amount <= Decimal::ZERO {
                    return Err(SettleError::invalid(
                        "settlement_amount",
                        "Settlement amount must be positive",
                    ));
                }
                Ok(())
            }
            OfferEvaluation::Installment { plan, .. } => plan.validate(),
        }
    }

    /// Amount charged on acceptance, if any.
    pub fn amount_due_now(&self) -> Option<Money> {
        match self {
            OfferEvaluation::Settlement {
                timing: SettlementTiming::PayNow,
                settlement_amount,
                ..
            } => Some(*settlement_amount),
            _ => None,
        }
    }
}

/// Classify an offer and resolve the amounts that apply to it.
///
/// A one-time settlement is payable now when its first payment date is today
/// or earlier, and recorded as an offer only when the date is in the future.
/// An accepted counter-offer replaces the consumer's amounts and date.
pub fn evaluate_offer(input: &OfferInput, today: NaiveDate) -> OfferEvaluation {
    let counter = input.counter_offer.as_ref().filter(|c| c.accepted);

    match &input.plan {
        NegotiationPlan::OneTimeSettlement {
            settlement_amount,
            first_payment_date,
        } => {
            let counter_amount = counter.and_then(|c| c.one_time_amount);
            let first_payment_date = counter
                .and_then(|c| c.first_payment_date)
                .unwrap_or(*first_payment_date);
            let timing = if first_payment_date > today {
                SettlementTiming::OfferOnly
            } else {
                SettlementTiming::PayNow
            };
            OfferEvaluation::Settlement {
                timing,
                settlement_amount: counter_amount.unwrap_or(*settlement_amount),
                minimum_discount_amount: derive_pif_amount(input.balance, &input.terms),
                first_payment_date,
                counter_offer_applied: counter_amount.is_some(),
            }
        }
        NegotiationPlan::Installment(terms) => {
            let mut plan = terms.clone();
            let mut applied = false;
            if let Some(c) = counter {
                if let Some(monthly) = c.monthly_amount.filter(|m| *m > Decimal::ZERO) {
                    plan = respread(terms, monthly);
                    applied = true;
                }
                if let Some(date) = c.first_payment_date {
                    plan.first_payment_date = date;
                    applied = true;
                }
            }
            OfferEvaluation::Installment {
                plan,
                counter_offer_applied: applied,
            }
        }
    }
}

/// Validate the submission, evaluate it and validate the resulting terms.
///
/// This is the entry point for untrusted input; `evaluate_offer` assumes the
/// plan and terms were already checked.
pub fn evaluate_offer_checked(input: &OfferInput, today: NaiveDate) -> SettleResult<OfferEvaluation> {
    input.plan.validate()?;
    input.terms.validate()?;
    let evaluation = evaluate_offer(input, today);
    evaluation.validate()?;
    Ok(evaluation)
}

/// Re-divide the plan's total into installments of `monthly` plus a remainder.
///
/// The count is not capped here; `OfferEvaluation::validate` rejects plans
/// longer than the installment limit.
fn respread(terms: &InstallmentTerms, monthly: Money) -> InstallmentTerms {
    let total = terms.total_amount();
    let count = (total / monthly).floor().to_u32().unwrap_or(u32::MAX).max(1);
    let remainder = total - monthly * Decimal::from(count);
    InstallmentTerms {
        number_of_installments: count,
        monthly_amount: monthly.min(total),
        last_installment_amount: (remainder > Decimal::ZERO).then_some(remainder),
        first_payment_date: terms.first_payment_date,
        cadence: terms.cadence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::InstallmentCadence;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn terms() -> NegotiationTerms {
        NegotiationTerms {
            pif_discount_percent: dec!(40),
            ..NegotiationTerms::default()
        }
    }

    fn pif(date: NaiveDate) -> OfferInput {
        OfferInput {
            balance: dec!(1000),
            terms: terms(),
            plan: NegotiationPlan::OneTimeSettlement {
                settlement_amount: dec!(650),
                first_payment_date: date,
            },
            counter_offer: None,
        }
    }

    #[test]
    fn test_pif_today_is_pay_now() {
        let eval = evaluate_offer(&pif(d(2025, 6, 2)), d(2025, 6, 2));
        assert!(eval.is_pay_now());
        assert_eq!(eval.amount_due_now(), Some(dec!(650)));
    }

    #[test]
    fn test_pif_past_is_pay_now() {
        assert!(evaluate_offer(&pif(d(2025, 5, 20)), d(2025, 6, 2)).is_pay_now());
    }

    #[test]
    fn test_pif_future_is_offer_only() {
        let eval = evaluate_offer(&pif(d(2025, 6, 3)), d(2025, 6, 2));
        assert!(!eval.is_pay_now());
        assert_eq!(eval.amount_due_now(), None);
        match eval {
            OfferEvaluation::Settlement {
                timing,
                minimum_discount_amount,
                ..
            } => {
                assert_eq!(timing, SettlementTiming::OfferOnly);
                assert_eq!(minimum_discount_amount, dec!(600));
            }
            other => panic!("unexpected evaluation {other:?}"),
        }
    }

    #[test]
    fn test_accepted_counter_offer_overrides_amount() {
        let mut input = pif(d(2025, 6, 2));
        input.counter_offer = Some(CounterOffer {
            one_time_amount: Some(dec!(700)),
            accepted: true,
            ..CounterOffer::default()
        });
        let eval = evaluate_offer(&input, d(2025, 6, 2));
        assert_eq!(eval.amount_due_now(), Some(dec!(700)));

        // Unaccepted counter-offers are ignored
        input.counter_offer.as_mut().unwrap().accepted = false;
        assert_eq!(evaluate_offer(&input, d(2025, 6, 2)).amount_due_now(), Some(dec!(650)));
    }

    #[test]
    fn test_counter_offer_respreads_installments() {
        let input = OfferInput {
            balance: dec!(100),
            terms: terms(),
            plan: NegotiationPlan::Installment(InstallmentTerms {
                number_of_installments: 10,
                monthly_amount: dec!(10),
                last_installment_amount: None,
                first_payment_date: d(2025, 6, 10),
                cadence: InstallmentCadence::Monthly,
            }),
            counter_offer: Some(CounterOffer {
                monthly_amount: Some(dec!(30)),
                first_payment_date: Some(d(2025, 6, 15)),
                accepted: true,
                ..CounterOffer::default()
            }),
        };
        match evaluate_offer(&input, d(2025, 6, 2)) {
            OfferEvaluation::Installment {
                plan,
                counter_offer_applied,
            } => {
                assert!(counter_offer_applied);
                assert_eq!(plan.number_of_installments, 3);
                assert_eq!(plan.monthly_amount, dec!(30));
                assert_eq!(plan.last_installment_amount, Some(dec!(10)));
                assert_eq!(plan.first_payment_date, d(2025, 6, 15));
                assert_eq!(plan.total_amount(), dec!(100));
            }
            other => panic!("unexpected evaluation {other:?}"),
        }
    }

    #[test]
    fn test_tiny_counter_monthly_fails_validation() {
        let input = OfferInput {
            balance: dec!(100),
            terms: terms(),
            plan: NegotiationPlan::Installment(InstallmentTerms {
                number_of_installments: 10,
                monthly_amount: dec!(10),
                last_installment_amount: None,
                first_payment_date: d(2025, 6, 10),
                cadence: InstallmentCadence::Semimonthly,
            }),
            counter_offer: Some(CounterOffer {
                monthly_amount: Some(dec!(0.005)),
                accepted: true,
                ..CounterOffer::default()
            }),
        };
        let eval = evaluate_offer(&input, d(2025, 6, 2));
        assert!(matches!(
            eval.validate(),
            Err(SettleError::InvalidInput { ref field, .. }) if field == "number_of_installments"
        ));
    }

    #[test]
    fn test_non_positive_counter_amount_fails_validation() {
        let mut input = pif(d(2025, 6, 2));
        input.counter_offer = Some(CounterOffer {
            one_time_amount: Some(Decimal::ZERO),
            accepted: true,
            ..CounterOffer::default()
        });
        assert!(evaluate_offer(&input, d(2025, 6, 2)).validate().is_err());
        assert!(evaluate_offer(&pif(d(2025, 6, 2)), d(2025, 6, 2)).validate().is_ok());
    }

    #[test]
    fn test_checked_evaluation_rejects_bad_terms() {
        let mut input = pif(d(2025, 6, 2));
        input.terms.pif_discount_percent = dec!(140);
        assert!(matches!(
            evaluate_offer_checked(&input, d(2025, 6, 2)),
            Err(SettleError::InvalidInput { ref field, .. }) if field == "pif_discount_percent"
        ));

        input.terms.pif_discount_percent = dec!(40);
        assert_eq!(
            evaluate_offer_checked(&input, d(2025, 6, 2)).unwrap(),
            evaluate_offer(&input, d(2025, 6, 2))
        );
    }
}
