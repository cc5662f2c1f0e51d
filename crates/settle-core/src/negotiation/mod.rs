pub mod offer;
pub mod plan;
pub mod status;
pub mod terms;

pub use offer::{
    evaluate_offer, evaluate_offer_checked, CounterOffer, OfferEvaluation, OfferInput, SettlementTiming,
};
pub use plan::{derive_installment_plan, derive_pif_amount, NegotiationPlan, NegotiationType, PlanInput};
pub use status::{ConsumerEvent, ConsumerStatus};
pub use terms::NegotiationTerms;
