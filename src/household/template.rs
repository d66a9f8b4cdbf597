use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

use super::{frequency::Frequency, participant::ParticipantId};

/// How a recurring template's occurrences are split when materialized.
///
/// Each variant carries exactly what its mode needs; the fixed variants
/// are ordered so repeated materializations stay deterministic. The payer
/// is never listed here: they lead the participant order and absorb the
/// rounding remainder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "mode", content = "shares")]
pub enum SplitPolicy {
    EqualAmongActive,
    FixedPercentages(Vec<(ParticipantId, f64)>),
    FixedAmounts(Vec<(ParticipantId, Money)>),
}

/// A rule that periodically generates a new split expense until an end
/// condition is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub id: Uuid,
    pub description: String,
    pub amount: Money,
    pub payer: ParticipantId,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub next_due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<u32>,
    #[serde(default)]
    pub occurrences_created: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub split_policy: SplitPolicy,
    /// Optimistic-concurrency counter; bumped on every mutation and
    /// checked when a materialization commits.
    #[serde(default)]
    pub revision: u64,
}

fn default_active() -> bool {
    true
}

impl RecurringTemplate {
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        payer: ParticipantId,
        frequency: Frequency,
        start_date: NaiveDate,
        split_policy: SplitPolicy,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            payer,
            frequency,
            start_date,
            next_due_date: start_date,
            end_date: None,
            max_occurrences: None,
            occurrences_created: 0,
            is_active: true,
            split_policy,
            revision: 0,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_max_occurrences(mut self, max: u32) -> Self {
        self.max_occurrences = Some(max);
        self
    }

    /// Whether processing on `today` should materialize an occurrence.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_active
            && self.next_due_date <= today
            && self.end_date.map_or(true, |end| end >= today)
            && self.occurrences_remaining()
    }

    pub fn occurrences_remaining(&self) -> bool {
        self.max_occurrences
            .map_or(true, |max| self.occurrences_created < max)
    }
}
