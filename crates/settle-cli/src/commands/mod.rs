pub mod dispatch;
pub mod negotiation;
pub mod schedule;
