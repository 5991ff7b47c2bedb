//! Feeds ledger files through the selected engines and accumulates totals.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::domain::{Asset, Decimal, RealizedGain, Transaction};
use crate::engine::{
    run_engine, AverageCost, CostBasisEngine, EngineRun, FallbackEvent, FifoBook, Method,
};
use crate::error::AppError;
use crate::loader;

use super::partition::{partition, Partition};

/// One engine's output over one transaction stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodReport {
    pub method: Method,
    pub records: Vec<RealizedGain>,
    pub fallbacks: Vec<FallbackEvent>,
    pub total: MethodTotal,
}

impl MethodReport {
    fn from_run<E: CostBasisEngine>(run: EngineRun<E>) -> Result<Self, AppError> {
        let total = MethodTotal::from_run(E::METHOD, &run)
            .ok_or_else(|| AppError::Overflow(format!("{} totals", E::METHOD)))?;
        Ok(MethodReport {
            method: E::METHOD,
            records: run.records,
            fallbacks: run.fallbacks,
            total,
        })
    }
}

/// Engine outputs for one asset group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// `None` when the file was processed as one combined stream.
    pub asset: Option<Asset>,
    pub transactions: usize,
    pub methods: Vec<MethodReport>,
}

impl GroupReport {
    pub fn method(&self, method: Method) -> Option<&MethodReport> {
        self.methods.iter().find(|m| m.method == method)
    }
}

/// Aggregate figures for one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodTotal {
    pub method: Method,
    pub sales: usize,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub realized_gain: Decimal,
    pub fallbacks: usize,
}

impl MethodTotal {
    pub fn new(method: Method) -> Self {
        MethodTotal {
            method,
            sales: 0,
            proceeds: Decimal::zero(),
            cost_basis: Decimal::zero(),
            realized_gain: Decimal::zero(),
            fallbacks: 0,
        }
    }

    /// Totals of one engine run, `None` if any sum overflows.
    fn from_run<E>(method: Method, run: &EngineRun<E>) -> Option<Self> {
        Some(MethodTotal {
            method,
            sales: run.records.len(),
            proceeds: Decimal::checked_sum(run.records.iter().map(|r| r.proceeds))?,
            cost_basis: Decimal::checked_sum(run.records.iter().map(|r| r.cost_basis))?,
            realized_gain: run.total_realized()?,
            fallbacks: run.fallbacks.len(),
        })
    }

    fn checked_add(&self, other: &MethodTotal) -> Option<MethodTotal> {
        Some(MethodTotal {
            method: self.method,
            sales: self.sales + other.sales,
            proceeds: self.proceeds.checked_add(other.proceeds)?,
            cost_basis: self.cost_basis.checked_add(other.cost_basis)?,
            realized_gain: self.realized_gain.checked_add(other.realized_gain)?,
            fallbacks: self.fallbacks + other.fallbacks,
        })
    }

    /// Sum `totals` for `method`; an overflow is reported against `scope`.
    fn sum<'a, I>(method: Method, totals: I, scope: &str) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = &'a MethodTotal>,
    {
        totals
            .into_iter()
            .filter(|t| t.method == method)
            .try_fold(MethodTotal::new(method), |acc, t| acc.checked_add(t))
            .ok_or_else(|| AppError::Overflow(format!("{} {} totals", scope, method)))
    }
}

/// Everything computed for one successfully loaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub groups: Vec<GroupReport>,
    /// Per-method totals across all groups, in method order.
    pub totals: Vec<MethodTotal>,
}

impl FileReport {
    pub fn new(
        path: PathBuf,
        methods: &[Method],
        groups: Vec<GroupReport>,
    ) -> Result<Self, AppError> {
        let totals = methods
            .iter()
            .map(|&method| {
                let group_totals = groups.iter().flat_map(|g| g.methods.iter().map(|m| &m.total));
                MethodTotal::sum(method, group_totals, "file")
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FileReport {
            path,
            groups,
            totals,
        })
    }

    pub fn total(&self, method: Method) -> Option<&MethodTotal> {
        self.totals.iter().find(|t| t.method == method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Processed(FileReport),
    Failed { path: PathBuf, error: String },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Processed(report) => &report.path,
            FileOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

/// Result of a whole run across all discovered files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub partition: Partition,
    pub methods: Vec<Method>,
    pub files: Vec<FileOutcome>,
    /// Sums over successfully processed files only.
    pub grand_totals: Vec<MethodTotal>,
}

impl RunSummary {
    pub fn new(
        partition: Partition,
        methods: Vec<Method>,
        files: Vec<FileOutcome>,
    ) -> Result<Self, AppError> {
        let grand_totals = methods
            .iter()
            .map(|&method| {
                let file_totals = files.iter().flat_map(|outcome| match outcome {
                    FileOutcome::Processed(report) => report.totals.iter(),
                    FileOutcome::Failed { .. } => [].iter(),
                });
                MethodTotal::sum(method, file_totals, "grand")
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RunSummary {
            partition,
            methods,
            files,
            grand_totals,
        })
    }

    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_failed()).count()
    }

    pub fn grand_total(&self, method: Method) -> Option<&MethodTotal> {
        self.grand_totals.iter().find(|t| t.method == method)
    }
}

/// Run one method over one stream with a fresh engine.
pub fn run_method(method: Method, transactions: &[Transaction]) -> Result<MethodReport, AppError> {
    match method {
        Method::Fifo => MethodReport::from_run(run_engine::<FifoBook>(transactions)),
        Method::MovingAverage => MethodReport::from_run(run_engine::<AverageCost>(transactions)),
    }
}

/// Partition a file's transactions and run every method over each group.
///
/// Methods never share state: each group gets fresh engines per method.
pub fn process_transactions(
    transactions: Vec<Transaction>,
    methods: &[Method],
    mode: Partition,
) -> Result<Vec<GroupReport>, AppError> {
    partition(transactions, mode)
        .into_iter()
        .map(|group| {
            Ok(GroupReport {
                methods: methods
                    .iter()
                    .map(|&method| run_method(method, &group.transactions))
                    .collect::<Result<Vec<_>, _>>()?,
                transactions: group.transactions.len(),
                asset: group.asset,
            })
        })
        .collect()
}

/// Load and process a single file. Failures are captured, not raised.
pub fn process_file(
    path: PathBuf,
    skiprows: usize,
    methods: &[Method],
    mode: Partition,
) -> FileOutcome {
    let transactions = match loader::load_file(&path, skiprows) {
        Ok(transactions) => transactions,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load ledger, skipping file");
            return FileOutcome::Failed {
                path,
                error: e.to_string(),
            };
        }
    };

    let report = process_transactions(transactions, methods, mode)
        .and_then(|groups| FileReport::new(path.clone(), methods, groups));
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to total ledger, skipping file");
            return FileOutcome::Failed {
                path,
                error: e.to_string(),
            };
        }
    };

    for group in &report.groups {
        for method in &group.methods {
            for event in &method.fallbacks {
                tracing::debug!(
                    path = %report.path.display(),
                    method = %method.method,
                    order_id = %event.order_id,
                    fallback = event.fallback.label(),
                    "Fallback applied"
                );
            }
        }
    }
    for total in &report.totals {
        tracing::info!(
            path = %report.path.display(),
            method = %total.method,
            sales = total.sales,
            realized_gain = %total.realized_gain,
            "Processed ledger"
        );
    }
    FileOutcome::Processed(report)
}

/// [`process_file`] with a panic confined to the file that raised it.
fn process_file_isolated(
    path: PathBuf,
    skiprows: usize,
    methods: &[Method],
    mode: Partition,
) -> FileOutcome {
    let fallback_path = path.clone();
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        process_file(path, skiprows, methods, mode)
    }))
    .unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(path = %fallback_path.display(), error = %message, "Ledger processing panicked");
        FileOutcome::Failed {
            path: fallback_path,
            error: format!("processing panicked: {}", message),
        }
    })
}

/// Discover ledgers matching the configured pattern and process them in
/// parallel. Output order follows discovery order.
pub async fn run(config: &Config) -> Result<RunSummary, AppError> {
    let files = loader::discover(&config.pattern)?;
    if files.is_empty() {
        return Err(AppError::NoFiles(config.pattern.clone()));
    }

    let methods = config.methods.methods();
    let mut slots: Vec<Option<FileOutcome>> = vec![None; files.len()];
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let methods = methods.clone();
        let skiprows = config.skiprows;
        let mode = config.partition;
        tasks.spawn_blocking(move || {
            (index, process_file_isolated(path, skiprows, &methods, mode))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, outcome) = joined.map_err(|e| AppError::Internal(e.to_string()))?;
        slots[index] = Some(outcome);
    }

    let summary = RunSummary::new(config.partition, methods, slots.into_iter().flatten().collect())?;
    for total in &summary.grand_totals {
        tracing::info!(
            method = %total.method,
            files = summary.files.len(),
            failed = summary.failed_files(),
            realized_gain = %total.realized_gain,
            "Run finished"
        );
    }
    Ok(summary)
}
