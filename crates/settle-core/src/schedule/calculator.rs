use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::cadence::InstallmentCadence;
use crate::clock::Clock;
use crate::error::SettleError;
use crate::types::*;
use crate::SettleResult;

/// Longest plan accepted: fifty years of monthly payments.
pub const MAX_INSTALLMENTS: u32 = 600;

/// The installment side of a negotiated plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentTerms {
    pub number_of_installments: u32,
    pub monthly_amount: Money,
    /// Final odd payment absorbing the remainder of `total / N`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_installment_amount: Option<Money>,
    pub first_payment_date: NaiveDate,
    #[serde(default)]
    pub cadence: InstallmentCadence,
}

impl InstallmentTerms {
    /// The final odd payment, when there is one.
    pub fn final_payment(&self) -> Option<Money> {
        self.last_installment_amount.filter(|l| *l > Decimal::ZERO)
    }

    /// N × A plus the final payment.
    pub fn total_amount(&self) -> Money {
        self.installment_total() + self.final_payment().unwrap_or(Decimal::ZERO)
    }

    pub fn installment_total(&self) -> Money {
        self.monthly_amount * Decimal::from(self.number_of_installments)
    }

    pub fn validate(&self) -> SettleResult<()> {
        if self.number_of_installments == 0 {
            return Err(SettleError::invalid(
                "number_of_installments",
                "At least one installment is required",
            ));
        }
        if self.number_of_installments > MAX_INSTALLMENTS {
            return Err(SettleError::invalid(
                "number_of_installments",
                format!("At most {MAX_INSTALLMENTS} installments are allowed"),
            ));
        }
        if self.monthly_amount <= Decimal::ZERO {
            return Err(SettleError::invalid(
                "monthly_amount",
                "Installment amount must be positive",
            ));
        }
        if let Some(last) = self.last_installment_amount {
            if last < Decimal::ZERO {
                return Err(SettleError::invalid(
                    "last_installment_amount",
                    "Final payment cannot be negative",
                ));
            }
        }
        let last_step = self.number_of_installments + u32::from(self.final_payment().is_some());
        if self.cadence.advance(self.first_payment_date, last_step) == NaiveDate::MAX {
            return Err(SettleError::DateError(
                "Payment schedule runs past the end of the calendar".into(),
            ));
        }
        Ok(())
    }
}

/// Start date actually used for a schedule.
///
/// A past first payment date is pulled forward to `today` until a payment
/// method is on file; once one is, the original dates stand.
pub fn effective_start_date(
    first_payment_date: NaiveDate,
    today: NaiveDate,
    payment_setup: bool,
) -> NaiveDate {
    if first_payment_date < today && !payment_setup {
        today
    } else {
        first_payment_date
    }
}

/// Produce the ordered payments owed under `terms`.
///
/// Entry k (1..=N) is due `k - 1` cadence steps after the effective start and
/// carries the monthly amount. A positive final payment adds one entry N steps
/// after the start. Zero installments yield an empty schedule.
pub fn generate_schedule(
    terms: &InstallmentTerms,
    today: NaiveDate,
    payment_setup: bool,
) -> Vec<ScheduledPayment> {
    let start = effective_start_date(terms.first_payment_date, today, payment_setup);
    let n = terms.number_of_installments;
    let final_payment = terms.final_payment();

    let mut dates = terms.cadence.dates(start);
    let mut payments = Vec::with_capacity(n as usize + usize::from(final_payment.is_some()));
    payments.extend(dates.by_ref().take(n as usize).map(|due_date| ScheduledPayment {
        due_date,
        amount: terms.monthly_amount,
    }));
    if n > 0 {
        if let (Some(last), Some(due_date)) = (final_payment, dates.next()) {
            payments.push(ScheduledPayment {
                due_date,
                amount: last,
            });
        }
    }

    debug!(
        installments = n,
        cadence = %terms.cadence,
        start = %start,
        entries = payments.len(),
        "Generated installment schedule"
    );
    payments
}

/// Input for the schedule builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    #[serde(flatten)]
    pub terms: InstallmentTerms,
    /// Whether a payment method is already on file for the consumer
    #[serde(default)]
    pub payment_setup: bool,
}

/// Output of the schedule builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub payments: Vec<ScheduledPayment>,
    pub installment_count: u32,
    pub installment_total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_payment: Option<Money>,
    pub total_amount: Money,
    pub effective_start_date: NaiveDate,
    pub start_was_clamped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_due_date: Option<NaiveDate>,
}

/// Validate the terms and build the full payment schedule.
pub fn build_schedule(
    input: &ScheduleInput,
    clock: &dyn Clock,
) -> SettleResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let terms = &input.terms;

    terms.validate()?;

    let today = clock.today();
    let effective_start = effective_start_date(terms.first_payment_date, today, input.payment_setup);
    let start_was_clamped = effective_start != terms.first_payment_date;
    if start_was_clamped {
        warnings.push(format!(
            "First payment date {} is in the past; schedule starts today ({})",
            terms.first_payment_date, effective_start
        ));
    }
    if terms.last_installment_amount == Some(Decimal::ZERO) {
        warnings.push("Final payment of zero ignored".into());
    }
    if let Some(last) = terms.final_payment() {
        if last > terms.monthly_amount {
            warnings.push(format!(
                "Final payment {last} exceeds the regular installment {}",
                terms.monthly_amount
            ));
        }
    }

    let payments = generate_schedule(terms, today, input.payment_setup);
    let last_due_date = payments.last().map(|p| p.due_date);

    let output = ScheduleOutput {
        installment_count: terms.number_of_installments,
        installment_total: terms.installment_total(),
        final_payment: terms.final_payment(),
        total_amount: terms.total_amount(),
        effective_start_date: effective_start,
        start_was_clamped,
        last_due_date,
        payments,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Installment Schedule",
        &serde_json::json!({
            "cadence": terms.cadence.label(),
            "installments": terms.number_of_installments,
            "monthly_amount": terms.monthly_amount.to_string(),
            "first_payment_date": terms.first_payment_date.to_string(),
            "payment_setup": input.payment_setup,
            "today": today.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
