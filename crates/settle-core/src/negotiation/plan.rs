use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::terms::NegotiationTerms;
use crate::clock::Clock;
use crate::error::SettleError;
use crate::schedule::calculator::{
    effective_start_date, generate_schedule, InstallmentTerms, MAX_INSTALLMENTS,
};
use crate::schedule::InstallmentCadence;
use crate::types::*;
use crate::SettleResult;

/// How the consumer intends to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationType {
    /// One-time payoff ("paid in full")
    OneTimeSettlement,
    Installment,
}

/// An accepted negotiation. Created once per negotiation event and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "negotiation_type", rename_all = "snake_case")]
pub enum NegotiationPlan {
    OneTimeSettlement {
        settlement_amount: Money,
        first_payment_date: NaiveDate,
    },
    Installment(InstallmentTerms),
}

impl NegotiationPlan {
    pub fn negotiation_type(&self) -> NegotiationType {
        match self {
            NegotiationPlan::OneTimeSettlement { .. } => NegotiationType::OneTimeSettlement,
            NegotiationPlan::Installment(_) => NegotiationType::Installment,
        }
    }

    pub fn first_payment_date(&self) -> NaiveDate {
        match self {
            NegotiationPlan::OneTimeSettlement {
                first_payment_date, ..
            } => *first_payment_date,
            NegotiationPlan::Installment(terms) => terms.first_payment_date,
        }
    }

    /// Everything the consumer pays over the life of the plan.
    pub fn total_amount(&self) -> Money {
        match self {
            NegotiationPlan::OneTimeSettlement {
                settlement_amount, ..
            } => *settlement_amount,
            NegotiationPlan::Installment(terms) => terms.total_amount(),
        }
    }

    pub fn validate(&self) -> SettleResult<()> {
        match self {
            NegotiationPlan::OneTimeSettlement {
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
            NegotiationPlan::Installment(terms) => terms.validate(),
        }
    }

    /// Payments owed under this plan; a one-time settlement is a single entry.
    pub fn schedule(&self, today: NaiveDate, payment_setup: bool) -> Vec<ScheduledPayment> {
        match self {
            NegotiationPlan::OneTimeSettlement {
                settlement_amount,
                first_payment_date,
            } => vec![ScheduledPayment {
                due_date: effective_start_date(*first_payment_date, today, payment_setup),
                amount: *settlement_amount,
            }],
            NegotiationPlan::Installment(terms) => generate_schedule(terms, today, payment_setup),
        }
    }
}

/// Input for deriving an installment plan from a balance and creditor terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInput {
    pub balance: Money,
    pub terms: NegotiationTerms,
    /// Defaults to today
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub cadence: InstallmentCadence,
}

/// Derived installment plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutput {
    /// Balance after the payment-setup discount
    pub negotiate_amount: Money,
    pub discount_amount: Money,
    /// One-time payoff alternative under the same terms
    pub pif_amount: Money,
    pub plan: InstallmentTerms,
    pub schedule: Vec<ScheduledPayment>,
}

/// One-time payoff amount: the balance less the PIF discount, to the cent.
pub fn derive_pif_amount(balance: Money, terms: &NegotiationTerms) -> Money {
    round_money(balance - percent_of(balance, terms.pif_discount_percent))
}

/// Split a discounted balance into equal installments plus a final odd payment.
///
/// The installment is `min_monthly_pay_percent` of the negotiated amount; as
/// many whole installments as fit are scheduled and the remainder becomes the
/// final payment.
pub fn derive_installment_plan(
    input: &PlanInput,
    clock: &dyn Clock,
) -> SettleResult<ComputationOutput<PlanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let terms = &input.terms;

    if input.balance <= Decimal::ZERO {
        return Err(SettleError::invalid("balance", "Balance must be positive"));
    }
    terms.validate()?;

    let today = clock.today();
    let first_payment_date = input.first_payment_date.unwrap_or(today);
    if first_payment_date < today {
        return Err(SettleError::invalid(
            "first_payment_date",
            "First payment date cannot be in the past",
        ));
    }
    let latest = today
        .checked_add_days(Days::new(u64::from(terms.max_first_pay_days)))
        .ok_or_else(|| SettleError::DateError("First payment window overflows the calendar".into()))?;
    if first_payment_date > latest {
        return Err(SettleError::invalid(
            "first_payment_date",
            format!(
                "First payment must be within {} days (on or before {latest})",
                terms.max_first_pay_days
            ),
        ));
    }

    let negotiate_amount =
        round_money(input.balance - percent_of(input.balance, terms.pay_setup_discount_percent));
    let monthly_amount = round_money(percent_of(negotiate_amount, terms.min_monthly_pay_percent));
    if monthly_amount <= Decimal::ZERO {
        return Err(SettleError::FinancialImpossibility(format!(
            "Balance {} is too small for a {}% minimum installment",
            input.balance, terms.min_monthly_pay_percent
        )));
    }

    let number_of_installments = (negotiate_amount / monthly_amount)
        .floor()
        .to_u32()
        .filter(|n| *n <= MAX_INSTALLMENTS)
        .ok_or_else(|| {
            SettleError::FinancialImpossibility(format!(
                "A {}% minimum installment needs more than {MAX_INSTALLMENTS} payments",
                terms.min_monthly_pay_percent
            ))
        })?;
    let remainder = negotiate_amount - monthly_amount * Decimal::from(number_of_installments);
    let last_installment_amount = if remainder > Decimal::ZERO {
        Some(remainder)
    } else {
        None
    };
    if input.cadence == InstallmentCadence::Monthly && first_payment_date.day() > 28 {
        warnings.push(format!(
            "First payment on day {} falls on the last day of shorter months",
            first_payment_date.day()
        ));
    }

    let plan = InstallmentTerms {
        number_of_installments,
        monthly_amount,
        last_installment_amount,
        first_payment_date,
        cadence: input.cadence,
    };
    plan.validate()?;
    let schedule = generate_schedule(&plan, today, false);

    let output = PlanOutput {
        discount_amount: input.balance - negotiate_amount,
        pif_amount: derive_pif_amount(input.balance, terms),
        negotiate_amount,
        plan,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Installment Plan Derivation (discounted balance / minimum monthly share)",
        &serde_json::json!({
            "balance": input.balance.to_string(),
            "pay_setup_discount_percent": terms.pay_setup_discount_percent.to_string(),
            "min_monthly_pay_percent": terms.min_monthly_pay_percent.to_string(),
            "max_first_pay_days": terms.max_first_pay_days,
            "cadence": input.cadence.label(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn input(discount: Decimal, min_monthly: Decimal) -> PlanInput {
        PlanInput {
            balance: dec!(100),
            terms: NegotiationTerms {
                pay_setup_discount_percent: discount,
                pif_discount_percent: dec!(30),
                min_monthly_pay_percent: min_monthly,
                max_first_pay_days: 20,
                fee_percent: None,
            },
            first_payment_date: None,
            cadence: InstallmentCadence::Monthly,
        }
    }

    #[test]
    fn test_discounted_plan_with_final_payment() {
        let out = derive_installment_plan(&input(dec!(15), dec!(17)), &FixedClock(today())).unwrap();
        let r = &out.result;
        assert_eq!(r.negotiate_amount, dec!(85.00));
        assert_eq!(r.plan.number_of_installments, 5);
        assert_eq!(r.plan.monthly_amount, dec!(14.45));
        assert_eq!(r.plan.last_installment_amount, Some(dec!(12.75)));
        assert_eq!(r.plan.total_amount(), dec!(85.00));
        assert_eq!(r.schedule.len(), 6);
        assert_eq!(r.pif_amount, dec!(70.00));
    }

    #[test]
    fn test_even_plan_has_no_final_payment() {
        let out = derive_installment_plan(&input(dec!(0), dec!(10)), &FixedClock(today())).unwrap();
        let r = &out.result;
        assert_eq!(r.negotiate_amount, dec!(100));
        assert_eq!(r.plan.number_of_installments, 10);
        assert_eq!(r.plan.monthly_amount, dec!(10.00));
        assert_eq!(r.plan.last_installment_amount, None);
        assert_eq!(r.schedule.len(), 10);
    }

    #[test]
    fn test_first_payment_window() {
        let clock = FixedClock(today());
        let mut inp = input(dec!(15), dec!(17));

        inp.first_payment_date = Some(NaiveDate::from_ymd_opt(2025, 6, 22).unwrap());
        assert!(derive_installment_plan(&inp, &clock).is_ok());

        inp.first_payment_date = Some(NaiveDate::from_ymd_opt(2025, 6, 23).unwrap());
        assert!(derive_installment_plan(&inp, &clock).is_err());

        inp.first_payment_date = Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert!(derive_installment_plan(&inp, &clock).is_err());
    }

    #[test]
    fn test_tiny_balance_is_impossible() {
        let mut inp = input(dec!(0), dec!(1));
        inp.balance = dec!(0.10);
        assert!(matches!(
            derive_installment_plan(&inp, &FixedClock(today())),
            Err(SettleError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_minute_minimum_exceeds_installment_limit() {
        // 0.005% of 100.00 rounds to a one-cent installment: 10000 payments
        let inp = input(dec!(0), dec!(0.005));
        assert!(matches!(
            derive_installment_plan(&inp, &FixedClock(today())),
            Err(SettleError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_pif_plan_schedule_is_single_entry() {
        let plan = NegotiationPlan::OneTimeSettlement {
            settlement_amount: dec!(70),
            first_payment_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        };
        let sched = plan.schedule(today(), false);
        assert_eq!(sched.len(), 1);
        assert_eq!(sched[0].due_date, today());
        assert_eq!(plan.negotiation_type(), NegotiationType::OneTimeSettlement);
    }

    #[test]
    fn test_plan_serde_tagging() {
        let plan: NegotiationPlan = serde_json::from_str(
            r#"{"negotiation_type":"installment","number_of_installments":3,
                "monthly_amount":"20","first_payment_date":"2025-07-01","cadence":"weekly"}"#,
        )
        .unwrap();
        assert_eq!(plan.negotiation_type(), NegotiationType::Installment);
        assert_eq!(plan.total_amount(), dec!(60));
    }
}
