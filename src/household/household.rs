use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::EngineError, money::Money};

use super::{
    expense::Expense,
    participant::{Participant, ParticipantId},
    payment::Payment,
    recurring,
    settlement::{self, Balance, Transfer},
    template::RecurringTemplate,
};

const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Guard against unbounded catch-up when a pass processes a template that
/// has been overdue for a very long time.
pub const DEFAULT_MAX_OCCURRENCES_PER_RUN: u32 = 120;

/// The shared-household aggregate: members plus the full expense, payment,
/// and recurring-template history the engine computes over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub templates: Vec<RecurringTemplate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Household::schema_version_default")]
    pub schema_version: u8,
}

impl Household {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            participants: Vec::new(),
            expenses: Vec::new(),
            payments: Vec::new(),
            templates: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_participant(&mut self, participant: Participant) -> ParticipantId {
        let id = participant.id;
        self.participants.push(participant);
        self.touch();
        id
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Ordered ids of every participant, active or not.
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.id).collect()
    }

    /// Records an expense; the split sum invariant was already enforced by
    /// [`Expense::new`].
    pub fn add_expense(&mut self, expense: Expense) -> Uuid {
        let id = expense.id;
        self.expenses.push(expense);
        self.touch();
        id
    }

    pub fn record_payment(&mut self, payment: Payment) -> Uuid {
        let id = payment.id;
        self.payments.push(payment);
        self.touch();
        id
    }

    pub fn confirm_payment(&mut self, id: Uuid) -> Result<(), EngineError> {
        self.payment_mut(id)?.confirm()?;
        self.touch();
        Ok(())
    }

    pub fn reject_payment(&mut self, id: Uuid) -> Result<(), EngineError> {
        self.payment_mut(id)?.reject()?;
        self.touch();
        Ok(())
    }

    pub fn add_template(&mut self, template: RecurringTemplate) -> Uuid {
        let id = template.id;
        self.templates.push(template);
        self.touch();
        id
    }

    pub fn template(&self, id: Uuid) -> Option<&RecurringTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn cancel_template(&mut self, id: Uuid) -> Result<(), EngineError> {
        let template = self.template_mut(id)?;
        recurring::cancel(template);
        self.touch();
        Ok(())
    }

    pub fn reactivate_template(&mut self, id: Uuid, today: NaiveDate) -> Result<(), EngineError> {
        let template = self.template_mut(id)?;
        recurring::reactivate(template, today);
        self.touch();
        Ok(())
    }

    /// Fair-share balance per participant (positive: the group owes them).
    pub fn balances(&self) -> Vec<Balance> {
        settlement::fair_share_balances(&self.participant_ids(), &self.expenses, &self.payments)
    }

    /// Minimal transfer set that settles the current balances.
    pub fn suggested_transfers(&self) -> Vec<Transfer> {
        settlement::settle(&self.participant_ids(), &self.expenses, &self.payments)
    }

    /// Pairwise net debt: what `a` owes `b` (positive) or is owed
    /// (negative). A different model than [`Household::balances`] by
    /// design; see the settlement module docs.
    pub fn net_between(&self, a: ParticipantId, b: ParticipantId) -> Money {
        settlement::pairwise_net(a, b, &self.expenses, &self.payments)
    }

    /// Materializes every due recurring occurrence and appends the new
    /// expenses, advancing each template in lockstep. In-memory the two
    /// writes are a single mutation; storage backends expose the same
    /// operation transactionally per template.
    pub fn process_due_templates(&mut self, today: NaiveDate) -> Result<Vec<Uuid>, EngineError> {
        let created = recurring::process_all_due(
            &mut self.templates,
            &self.participants,
            today,
            DEFAULT_MAX_OCCURRENCES_PER_RUN,
        )?;
        let ids = created.iter().map(|e| e.id).collect();
        if !created.is_empty() {
            self.expenses.extend(created);
            self.touch();
        }
        Ok(ids)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    fn payment_mut(&mut self, id: Uuid) -> Result<&mut Payment, EngineError> {
        self.payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))
    }

    fn template_mut(&mut self, id: Uuid) -> Result<&mut RecurringTemplate, EngineError> {
        self.templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))
    }
}
