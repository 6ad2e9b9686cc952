//! Evaluation counters, recorded through the `metrics` facade.
//!
//! Nothing is exported unless a recorder is installed by the application.

use ::metrics::counter;

/// Counts terminal operations, labelled by evaluation mode.
pub const EVALUATIONS: &str = "lazyweld_evaluations_total";
/// Counts elements pulled from sources.
pub const ELEMENTS_PULLED: &str = "lazyweld_elements_pulled_total";
/// Counts partitions created by parallel splits.
pub const PARTITIONS: &str = "lazyweld_partitions_total";
/// Counts evaluations that stopped pulling before the source was exhausted.
pub const SHORT_CIRCUITS: &str = "lazyweld_short_circuits_total";

pub(crate) fn record_evaluation(mode: &'static str) {
    counter!(EVALUATIONS, "mode" => mode).increment(1);
}

pub(crate) fn record_pulled(elements: u64) {
    counter!(ELEMENTS_PULLED).increment(elements);
}

pub(crate) fn record_partitions(partitions: usize) {
    counter!(PARTITIONS).increment(partitions as u64);
}

pub(crate) fn record_short_circuit() {
    counter!(SHORT_CIRCUITS).increment(1);
}
