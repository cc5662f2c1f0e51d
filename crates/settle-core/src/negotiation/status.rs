use serde::{Deserialize, Serialize};

use crate::error::SettleError;
use crate::SettleResult;

/// Where a consumer stands in the negotiation lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerStatus {
    #[default]
    Joined,
    /// Offer submitted, waiting on creditor review
    PaymentSetup,
    /// Terms agreed and a payment method is on file
    PaymentAccepted,
    Renegotiate,
    Settled,
    Deactivated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConsumerEvent {
    OfferSubmitted { auto_approved: bool },
    CounterOfferAccepted,
    OfferDeclined,
    PaymentCompleted { paid_in_full: bool },
    PaymentFailed,
    Deactivate,
}

impl ConsumerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConsumerStatus::Settled | ConsumerStatus::Deactivated)
    }

    /// The status after `event`, or `InvalidTransition` when the event does not apply.
    pub fn apply(self, event: ConsumerEvent) -> SettleResult<ConsumerStatus> {
        use ConsumerEvent as E;
        use ConsumerStatus as S;

        let next = match (self, event) {
            (s, _) if s.is_terminal() => None,
            (_, E::Deactivate) => Some(S::Deactivated),
            (S::Joined | S::Renegotiate, E::OfferSubmitted { auto_approved }) => Some(if auto_approved {
                S::PaymentAccepted
            } else {
                S::PaymentSetup
            }),
            (S::PaymentSetup, E::CounterOfferAccepted) => Some(S::PaymentAccepted),
            (S::PaymentSetup, E::OfferDeclined) => Some(S::Renegotiate),
            (S::PaymentSetup | S::PaymentAccepted, E::PaymentCompleted { paid_in_full }) => {
                Some(if paid_in_full {
                    S::Settled
                } else {
                    S::PaymentAccepted
                })
            }
            (S::PaymentSetup | S::PaymentAccepted, E::PaymentFailed) => Some(S::Renegotiate),
            _ => None,
        };

        next.ok_or_else(|| SettleError::InvalidTransition {
            from: format!("{self:?}"),
            event: format!("{event:?}"),
        })
    }
}
