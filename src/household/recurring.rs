use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{errors::EngineError, money::Money};

use super::{
    expense::Expense,
    participant::{Participant, ParticipantId},
    split::{allocate, SplitMode},
    template::{RecurringTemplate, SplitPolicy},
};

/// Result of processing one template at one due date.
///
/// A template that is not due is a no-op signal, not an error.
#[derive(Debug)]
pub enum ProcessOutcome {
    Materialized(Expense),
    NotDue,
}

/// Materializes the template's next occurrence if it is due on `today`.
///
/// On success the expense is dated at the previous `next_due_date`, the
/// occurrence counter and revision advance, and `next_due_date` moves to
/// the first occurrence date after it (derived from `start_date`, so a
/// clamped month does not shift the anchor day). Reaching the occurrence
/// cap deactivates the template, as does encountering a passed end date.
/// All validation happens before any field of the template is touched.
pub fn process_template(
    template: &mut RecurringTemplate,
    participants: &[Participant],
    today: NaiveDate,
) -> Result<ProcessOutcome, EngineError> {
    if template.is_active && template.end_date.map_or(false, |end| end < today) {
        template.is_active = false;
        template.revision += 1;
        info!(template = %template.id, "recurring template passed its end date");
        return Ok(ProcessOutcome::NotDue);
    }
    if !template.is_due(today) {
        return Ok(ProcessOutcome::NotDue);
    }

    let due_date = template.next_due_date;
    let expense = materialize_occurrence(template, participants, due_date)?;

    template.occurrences_created += 1;
    template.next_due_date = template.frequency.next_after(template.start_date, due_date);
    if !template.occurrences_remaining() {
        template.is_active = false;
        info!(template = %template.id, "recurring template reached its occurrence cap");
    }
    template.revision += 1;

    debug!(
        template = %template.id,
        %due_date,
        next_due = %template.next_due_date,
        occurrence = template.occurrences_created,
        "materialized recurring occurrence"
    );
    Ok(ProcessOutcome::Materialized(expense))
}

/// Drains every due occurrence of every template in one pass.
///
/// A template overdue by several periods is caught up occurrence by
/// occurrence, each read from the freshly advanced `next_due_date`, so no
/// date is skipped or materialized twice. `max_per_run` bounds runaway
/// catch-up on long-forgotten templates.
pub fn process_all_due(
    templates: &mut [RecurringTemplate],
    participants: &[Participant],
    today: NaiveDate,
    max_per_run: u32,
) -> Result<Vec<Expense>, EngineError> {
    let mut created = Vec::new();
    for template in templates.iter_mut() {
        let mut produced = 0u32;
        while produced < max_per_run {
            match process_template(template, participants, today)? {
                ProcessOutcome::Materialized(expense) => {
                    created.push(expense);
                    produced += 1;
                }
                ProcessOutcome::NotDue => break,
            }
        }
    }
    Ok(created)
}

/// Explicit cancellation; existing materialized expenses are untouched.
pub fn cancel(template: &mut RecurringTemplate) {
    template.is_active = false;
    template.revision += 1;
}

/// Reactivates a paused template, fast-forwarding `next_due_date` from
/// `start_date` to the first occurrence date on or after `today` so a
/// long-paused template resumes without a backlog of missed dates.
pub fn reactivate(template: &mut RecurringTemplate, today: NaiveDate) {
    let (_, next_due) = template.frequency.first_on_or_after(template.start_date, today);
    template.next_due_date = next_due;
    template.is_active = true;
    template.revision += 1;
}

fn materialize_occurrence(
    template: &RecurringTemplate,
    participants: &[Participant],
    due_date: NaiveDate,
) -> Result<Expense, EngineError> {
    let (order, mode) = split_inputs(template, participants)?;
    let splits = allocate(template.amount, &order, &mode)?;
    Expense::new(
        template.description.clone(),
        template.amount,
        template.payer,
        due_date,
        splits,
    )
}

/// Participant order (payer first) and allocator mode for the template's
/// split policy.
fn split_inputs(
    template: &RecurringTemplate,
    participants: &[Participant],
) -> Result<(Vec<ParticipantId>, SplitMode), EngineError> {
    let mut order = vec![template.payer];
    match &template.split_policy {
        SplitPolicy::EqualAmongActive => {
            order.extend(
                participants
                    .iter()
                    .filter(|p| p.is_active && p.id != template.payer)
                    .map(|p| p.id),
            );
            Ok((order, SplitMode::Equal))
        }
        SplitPolicy::FixedPercentages(shares) => {
            let mut map: HashMap<ParticipantId, f64> = HashMap::with_capacity(shares.len());
            for &(participant, pct) in shares {
                if participant != template.payer {
                    order.push(participant);
                    map.insert(participant, pct);
                }
            }
            Ok((order, SplitMode::Percentage(map)))
        }
        SplitPolicy::FixedAmounts(shares) => {
            let mut map: HashMap<ParticipantId, Money> = HashMap::with_capacity(shares.len());
            for &(participant, amount) in shares {
                if participant != template.payer {
                    order.push(participant);
                    map.insert(participant, amount);
                }
            }
            Ok((order, SplitMode::Amount(map)))
        }
    }
}
