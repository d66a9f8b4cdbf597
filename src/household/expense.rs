use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::EngineError, money::Money};

use super::participant::ParticipantId;

/// One participant's portion of an expense total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitShare {
    pub participant: ParticipantId,
    pub amount: Money,
}

/// A shared expense paid by one participant and split among several.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    pub total_amount: Money,
    /// The participant who paid and is owed by the others.
    pub payer: ParticipantId,
    pub date: NaiveDate,
    #[serde(default)]
    pub splits: Vec<SplitShare>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Builds an expense, rejecting split sets whose amounts do not sum
    /// exactly to the total.
    pub fn new(
        description: impl Into<String>,
        total_amount: Money,
        payer: ParticipantId,
        date: NaiveDate,
        splits: Vec<SplitShare>,
    ) -> Result<Self, EngineError> {
        if !splits.is_empty() {
            let sum: Money = splits.iter().map(|s| s.amount).sum();
            if sum != total_amount {
                return Err(EngineError::InvalidExpense(format!(
                    "split shares sum to {sum}, expected {total_amount}"
                )));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            description: description.into(),
            total_amount,
            payer,
            date,
            splits,
            created_at: Utc::now(),
        })
    }

    /// The share recorded for `participant`, if any.
    pub fn share_of(&self, participant: ParticipantId) -> Option<Money> {
        self.splits
            .iter()
            .find(|s| s.participant == participant)
            .map(|s| s.amount)
    }
}
