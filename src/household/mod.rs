//! Household domain models and the split, settlement, and recurring
//! engines that operate over them.

pub mod expense;
pub mod frequency;
#[allow(clippy::module_inception)]
pub mod household;
pub mod itemized;
pub mod participant;
pub mod payment;
pub mod recurring;
pub mod settlement;
pub mod split;
pub mod template;

pub use expense::{Expense, SplitShare};
pub use frequency::Frequency;
pub use household::{Household, DEFAULT_MAX_OCCURRENCES_PER_RUN};
pub use itemized::{
    itemized_breakdown, BillBreakdown, ChargeSpec, LineItem, ParticipantBreakdown,
};
pub use participant::{Participant, ParticipantId};
pub use payment::{Payment, PaymentStatus};
pub use recurring::{cancel, process_all_due, process_template, reactivate, ProcessOutcome};
pub use settlement::{
    fair_share_balances, pairwise_net, settle, Balance, Transfer, SETTLEMENT_EPSILON_MINOR,
};
pub use split::{allocate, SplitMode};
pub use template::{RecurringTemplate, SplitPolicy};
