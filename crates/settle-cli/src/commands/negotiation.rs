use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use settle_core::negotiation::plan::{self, PlanInput};
use settle_core::negotiation::{self, NegotiationTerms, OfferInput};
use settle_core::schedule::InstallmentCadence;
use settle_core::{with_metadata, Clock};

use crate::input;

/// Arguments for deriving an installment plan from a balance
#[derive(Args)]
pub struct PlanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Negotiation terms file (JSON or YAML); flags below override it
    #[arg(long)]
    pub terms: Option<String>,

    /// Payment-setup discount, whole percent
    #[arg(long)]
    pub pay_setup_discount: Option<Decimal>,

    /// One-time payoff discount, whole percent
    #[arg(long)]
    pub pif_discount: Option<Decimal>,

    /// Minimum installment as a percent of the negotiated amount
    #[arg(long)]
    pub min_monthly_pay: Option<Decimal>,

    /// Latest first payment, in days from today
    #[arg(long)]
    pub max_first_pay_days: Option<u32>,

    /// First payment date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,

    /// weekly, biweekly, semimonthly or monthly
    #[arg(long, default_value = "monthly")]
    pub cadence: InstallmentCadence,
}

pub fn run_plan(args: PlanArgs, clock: &dyn Clock) -> Result<Value, Box<dyn std::error::Error>> {
    let plan_input: PlanInput = match input::stdin::read_input(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let balance = args
                .balance
                .ok_or("--balance is required (or provide --input)")?;
            let mut terms: NegotiationTerms = match args.terms {
                Some(ref path) => input::file::read_config(path)?,
                None => NegotiationTerms::default(),
            };
            if let Some(v) = args.pay_setup_discount {
                terms.pay_setup_discount_percent = v;
            }
            if let Some(v) = args.pif_discount {
                terms.pif_discount_percent = v;
            }
            if let Some(v) = args.min_monthly_pay {
                terms.min_monthly_pay_percent = v;
            }
            if let Some(v) = args.max_first_pay_days {
                terms.max_first_pay_days = v;
            }
            PlanInput {
                balance,
                terms,
                first_payment_date: args.first_payment_date,
                cadence: args.cadence,
            }
        }
    };

    let result = plan::derive_installment_plan(&plan_input, clock)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for evaluating a submitted offer
#[derive(Args)]
pub struct OfferArgs {
    /// Path to JSON offer file (balance, terms, plan, counter_offer)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_offer(args: OfferArgs, clock: &dyn Clock) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let offer: OfferInput = input::stdin::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for offer evaluation")?;

    let evaluation = negotiation::evaluate_offer_checked(&offer, clock.today())?;
    let mut warnings = Vec::new();
    if let negotiation::OfferEvaluation::Settlement {
        settlement_amount,
        minimum_discount_amount,
        ..
    } = &evaluation
    {
        if settlement_amount < minimum_discount_amount {
            warnings.push(format!(
                "Settlement {settlement_amount} is below the creditor minimum {minimum_discount_amount}"
            ));
        }
    }
    if offer.counter_offer.as_ref().is_some_and(|c| !c.accepted) {
        warnings.push("Counter-offer on record has not been accepted".to_string());
    }

    let output = with_metadata(
        "Offer Evaluation",
        &serde_json::json!({
            "balance": offer.balance.to_string(),
            "negotiation_type": offer.plan.negotiation_type(),
            "today": clock.today().to_string(),
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        evaluation,
    );
    Ok(serde_json::to_value(output)?)
}
