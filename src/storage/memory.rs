use std::sync::{Mutex, MutexGuard};

use crate::{
    errors::EngineError,
    household::{Expense, Household, RecurringTemplate},
};

use super::{HouseholdStore, Result};

/// In-memory store; the mutex serializes each read-modify-write so the
/// revision check observes a consistent template.
pub struct MemoryStore {
    inner: Mutex<Household>,
}

impl MemoryStore {
    pub fn new(household: Household) -> Self {
        Self {
            inner: Mutex::new(household),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Household> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HouseholdStore for MemoryStore {
    fn snapshot(&self) -> Result<Household> {
        Ok(self.lock().clone())
    }

    fn save(&self, household: &Household) -> Result<()> {
        *self.lock() = household.clone();
        Ok(())
    }

    fn commit_materialization(
        &self,
        expense: Expense,
        template: RecurringTemplate,
        expected_revision: u64,
    ) -> Result<()> {
        let mut household = self.lock();
        let Some(stored) = household.templates.iter_mut().find(|t| t.id == template.id) else {
            return Err(EngineError::KeyNotFound(template.id.to_string()));
        };
        if stored.revision != expected_revision {
            return Err(EngineError::ConcurrentMaterialization(format!(
                "template {} moved from revision {expected_revision} to {}",
                template.id, stored.revision
            )));
        }
        *stored = template;
        household.expenses.push(expense);
        household.touch();
        Ok(())
    }
}
