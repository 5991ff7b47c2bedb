//! Mechanical layer around the engines: partitioning, per-file runs,
//! totals. No accounting happens here.

pub mod partition;
pub mod runner;

pub use partition::{partition, AssetGroup, Partition};
pub use runner::{
    process_file, process_transactions, run, run_method, FileOutcome, FileReport, GroupReport,
    MethodReport, MethodTotal, RunSummary,
};
