pub mod dispatcher;
pub mod gateway;
pub mod revenue;
pub mod sandbox;
pub mod store;

pub use dispatcher::{DispatchOutcome, OutcomeKind, PaymentDispatcher, PaymentSubmission};
pub use gateway::{
    ChargeReceipt, CustomerDetails, GatewayError, GatewayRegistry, MerchantName, PaymentGateway,
    PaymentMethod, ProfileId,
};
pub use revenue::{split_revenue, FeeLookup, RevenueShare, StaticFeeTable};
pub use sandbox::SandboxGateway;
pub use store::{InMemorySettlementStore, SettlementRecord, SettlementStore};
