use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use settle_core::schedule::{self, InstallmentCadence, InstallmentTerms, ScheduleInput};
use settle_core::Clock;

use crate::input;

/// Arguments for building an installment schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Number of regular installments
    #[arg(long, short = 'n')]
    pub installments: Option<u32>,

    /// Amount of each regular installment
    #[arg(long)]
    pub monthly_amount: Option<Decimal>,

    /// Final odd payment absorbing the remainder
    #[arg(long)]
    pub last_amount: Option<Decimal>,

    /// First payment date (YYYY-MM-DD)
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,

    /// weekly, biweekly, semimonthly or monthly
    #[arg(long, default_value = "monthly")]
    pub cadence: InstallmentCadence,

    /// A payment method is already on file (past dates are kept)
    #[arg(long)]
    pub payment_setup: bool,
}

pub fn run_schedule(args: ScheduleArgs, clock: &dyn Clock) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = match input::stdin::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let installments = args
                .installments
                .ok_or("--installments is required (or provide --input)")?;
            let monthly_amount = args
                .monthly_amount
                .ok_or("--monthly-amount is required (or provide --input)")?;
            ScheduleInput {
                terms: InstallmentTerms {
                    number_of_installments: installments,
                    monthly_amount,
                    last_installment_amount: args.last_amount,
                    first_payment_date: args.first_payment_date.unwrap_or_else(|| clock.today()),
                    cadence: args.cadence,
                },
                payment_setup: args.payment_setup,
            }
        }
    };

    let result = schedule::build_schedule(&schedule_input, clock)?;
    Ok(serde_json::to_value(result)?)
}
