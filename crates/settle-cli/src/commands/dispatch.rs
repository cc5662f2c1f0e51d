use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use settle_core::dispatch::{
    split_revenue, DispatchOutcome, GatewayRegistry, InMemorySettlementStore, MerchantName,
    PaymentDispatcher, PaymentSubmission, SandboxGateway, StaticFeeTable,
};
use settle_core::{with_metadata, Clock, FixedClock};

use crate::input;

/// Arguments for the revenue-share split
#[derive(Args)]
pub struct RevenueArgs {
    /// Collected amount
    #[arg(long)]
    pub amount: Decimal,

    /// Platform fee, whole percent
    #[arg(long)]
    pub fee_percent: Decimal,
}

pub fn run_revenue_split(args: RevenueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let share = split_revenue(args.amount, args.fee_percent)?;
    let output = with_metadata(
        "Revenue Share (platform share rounded to cents, remainder to company)",
        &serde_json::json!({
            "amount": args.amount.to_string(),
            "fee_percent": args.fee_percent.to_string(),
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        share,
    );
    Ok(serde_json::to_value(output)?)
}

/// Arguments for simulating a payment submission against sandbox gateways
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON payment submission
    #[arg(long)]
    pub input: Option<String>,

    /// Fee table file (JSON or YAML: default_percent, companies)
    #[arg(long)]
    pub fees: Option<String>,

    /// Fallback platform fee when no fee table entry matches
    #[arg(long)]
    pub fee_percent: Option<Decimal>,

    /// Payment tokens the sandbox refuses (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub decline_tokens: Vec<String>,

    /// Sandbox declines charges above this amount
    #[arg(long)]
    pub charge_limit: Option<Decimal>,

    /// Submit the same payload this many times
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,
}

pub fn run_simulate(args: SimulateArgs, clock: &dyn Clock) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let submission: PaymentSubmission = input::stdin::read_input(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for payment simulation")?;

    let mut fees: StaticFeeTable = match args.fees {
        Some(ref path) => input::file::read_config(path)?,
        None => StaticFeeTable::default(),
    };
    if args.fee_percent.is_some() {
        fees.default_percent = args.fee_percent;
    }
    fees.validate()?;

    let mut registry = GatewayRegistry::new();
    for merchant in [
        MerchantName::AuthorizeNet,
        MerchantName::UsaEpay,
        MerchantName::Stripe,
        MerchantName::Tilled,
    ] {
        let mut gateway = SandboxGateway::new(merchant);
        for token in &args.decline_tokens {
            gateway = gateway.decline_token(token.clone());
        }
        if let Some(limit) = args.charge_limit {
            gateway = gateway.with_charge_limit(limit);
        }
        registry.register(Box::new(gateway));
    }

    let mut dispatcher = PaymentDispatcher::new(
        registry,
        InMemorySettlementStore::new(),
        Box::new(fees),
        Box::new(FixedClock(clock.today())),
    );

    let mut outcomes: Vec<DispatchOutcome> = Vec::with_capacity(args.repeat as usize);
    for attempt in 1..=args.repeat.max(1) {
        debug!(attempt, negotiation = %submission.negotiation_id, "Submitting to sandbox");
        outcomes.push(dispatcher.submit(&submission)?);
    }

    let output = with_metadata(
        "Payment Dispatch Simulation (sandbox gateways, in-memory store)",
        &serde_json::json!({
            "merchant": submission.merchant,
            "negotiation_id": submission.negotiation_id,
            "repeat": args.repeat,
            "today": clock.today().to_string(),
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        serde_json::json!({
            "outcomes": outcomes,
            "records_committed": dispatcher.store().records().len(),
        }),
    );
    Ok(serde_json::to_value(output)?)
}
