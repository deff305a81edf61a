#![doc(test(attr(deny(warnings))))]

//! Zenith keeps a local spending ledger, derives its aggregates, and answers
//! questions about it through a language model that is never trusted with the
//! arithmetic.

pub mod cli;
pub mod coach;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!(build = %utils::build_info::current().describe(), "Zenith tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
