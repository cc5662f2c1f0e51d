use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use settle_core::{Clock, FixedClock, SystemClock};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// `today` arrives as an optional "YYYY-MM-DD"; absent means the system date.
fn clock_for(today: Option<String>) -> NapiResult<Box<dyn Clock>> {
    match today {
        Some(s) => {
            let date = s.parse::<chrono::NaiveDate>().map_err(to_napi_error)?;
            Ok(Box::new(FixedClock(date)))
        }
        None => Ok(Box::new(SystemClock)),
    }
}

// ---------------------------------------------------------------------------
// Schedules and plans
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String, today: Option<String>) -> NapiResult<String> {
    let input: settle_core::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let clock = clock_for(today)?;
    let output =
        settle_core::schedule::build_schedule(&input, clock.as_ref()).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn derive_plan(input_json: String, today: Option<String>) -> NapiResult<String> {
    let input: settle_core::negotiation::PlanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let clock = clock_for(today)?;
    let output = settle_core::negotiation::derive_installment_plan(&input, clock.as_ref())
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Offers and revenue
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_offer(input_json: String, today: Option<String>) -> NapiResult<String> {
    let input: settle_core::negotiation::OfferInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let clock = clock_for(today)?;
    let evaluation = settle_core::negotiation::evaluate_offer_checked(&input, clock.today())
        .map_err(to_napi_error)?;
    serde_json::to_string(&evaluation).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct RevenueSplitInput {
    amount: Decimal,
    fee_percent: Decimal,
}

#[napi]
pub fn split_revenue(input_json: String) -> NapiResult<String> {
    let input: RevenueSplitInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let share = settle_core::dispatch::split_revenue(input.amount, input.fee_percent)
        .map_err(to_napi_error)?;
    serde_json::to_string(&share).map_err(to_napi_error)
}
