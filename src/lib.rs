#![doc(test(attr(deny(warnings))))]

//! Split Core implements the financial split and settlement engine for a
//! shared-household expense tracker: exact-sum splits, proportional charge
//! distribution, balance netting with minimal settling transfers, and
//! recurring expense scheduling.

pub mod config;
pub mod errors;
pub mod household;
pub mod money;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use errors::EngineError;
pub use money::Money;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Split Core tracing initialized.");
    });
}
