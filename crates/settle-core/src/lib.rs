pub mod clock;
pub mod error;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "negotiation")]
pub mod negotiation;

#[cfg(feature = "dispatch")]
pub mod dispatch;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::SettleError;
pub use types::*;

/// Standard result type for all settlement operations
pub type SettleResult<T> = Result<T, SettleError>;
