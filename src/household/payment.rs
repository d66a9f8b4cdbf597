use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::EngineError, money::Money};

use super::participant::ParticipantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Rejected,
}

/// A settle-up payment between two participants.
///
/// Only confirmed payments enter balance computation. Status moves one way
/// out of `Pending`; `Confirmed` and `Rejected` are terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub from_participant: ParticipantId,
    pub to_participant: ParticipantId,
    pub amount: Money,
    pub date: NaiveDate,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn new(
        from_participant: ParticipantId,
        to_participant: ParticipantId,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_participant,
            to_participant,
            amount,
            date,
            status: PaymentStatus::Pending,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    pub fn confirm(&mut self) -> Result<(), EngineError> {
        self.transition(PaymentStatus::Confirmed)
    }

    pub fn reject(&mut self) -> Result<(), EngineError> {
        self.transition(PaymentStatus::Rejected)
    }

    fn transition(&mut self, target: PaymentStatus) -> Result<(), EngineError> {
        if self.status != PaymentStatus::Pending {
            return Err(EngineError::InvalidPaymentTransition(format!(
                "payment {} is already {:?}",
                self.id, self.status
            )));
        }
        self.status = target;
        Ok(())
    }
}
