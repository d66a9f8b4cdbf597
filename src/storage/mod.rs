pub mod json_backend;
pub mod memory;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    errors::EngineError,
    household::{Expense, Household, RecurringTemplate},
};

pub type Result<T> = std::result::Result<T, EngineError>;

/// Abstraction over persistence backends holding a household snapshot.
///
/// The one non-trivial contract is [`commit_materialization`]: inserting a
/// recurring occurrence's expense and advancing its template must happen
/// as one atomic write, guarded by the template revision the caller read.
/// A stale revision means another pass already materialized the same
/// occurrence; the commit fails without mutating anything and the caller
/// can re-read and retry or ignore.
///
/// [`commit_materialization`]: HouseholdStore::commit_materialization
pub trait HouseholdStore: Send + Sync {
    /// One logical snapshot of the whole household, so balance reads over
    /// expenses and payments are mutually consistent.
    fn snapshot(&self) -> Result<Household>;

    fn save(&self, household: &Household) -> Result<()>;

    /// Atomically appends `expense` and replaces the template whose
    /// revision still equals `expected_revision`.
    fn commit_materialization(
        &self,
        expense: Expense,
        template: RecurringTemplate,
        expected_revision: u64,
    ) -> Result<()>;
}

/// Runs the due-template pass against a store: per template, each due
/// occurrence is materialized from a snapshot and committed with the
/// snapshot's revision, so two racing passes cannot double-materialize.
pub fn process_due(
    store: &dyn HouseholdStore,
    today: NaiveDate,
    max_per_run: u32,
) -> Result<Vec<Uuid>> {
    use crate::household::{process_template, ProcessOutcome};

    let snapshot = store.snapshot()?;
    let mut created = Vec::new();
    for template_id in snapshot.templates.iter().map(|t| t.id) {
        let mut produced = 0u32;
        while produced < max_per_run {
            let current = store.snapshot()?;
            let Some(template) = current.template(template_id) else {
                break;
            };
            let mut template = template.clone();
            let expected_revision = template.revision;
            match process_template(&mut template, &current.participants, today)? {
                ProcessOutcome::Materialized(expense) => {
                    let expense_id = expense.id;
                    store.commit_materialization(expense, template, expected_revision)?;
                    created.push(expense_id);
                    produced += 1;
                }
                ProcessOutcome::NotDue => break,
            }
        }
    }
    Ok(created)
}
