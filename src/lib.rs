pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod loader;
pub mod orchestration;
pub mod report;

pub use cli::Cli;
pub use config::{Config, MethodSelection, OutputFormat};
pub use domain::{Asset, Decimal, OrderId, RealizedGain, Side, Timestamp, Transaction};
pub use engine::{
    run_engine, Applied, AverageCost, CostBasisEngine, EngineRun, Fallback, FallbackEvent,
    FifoBook, Lot, Method,
};
pub use error::AppError;
pub use orchestration::{Partition, RunSummary};
