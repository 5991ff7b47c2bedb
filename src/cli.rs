use clap::Parser;

/// Realized gains from buy/sell ledgers, by FIFO lots and moving-average cost.
///
/// Every flag falls back to its REALGAIN_* environment variable, then to a
/// built-in default.
#[derive(Debug, Clone, Default, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Glob pattern selecting ledger files (e.g. "exports/*.csv").
    #[arg(long)]
    pub pattern: Option<String>,

    /// Metadata lines to drop before the header row.
    #[arg(long)]
    pub skiprows: Option<usize>,

    /// Cost-basis method: fifo, average, or both.
    #[arg(long)]
    pub method: Option<String>,

    /// Asset handling: combined (one stream per file) or by-asset.
    #[arg(long)]
    pub partition: Option<String>,

    /// Output format: table or json.
    #[arg(long)]
    pub format: Option<String>,

    /// Decimal places used when printing amounts.
    #[arg(long)]
    pub decimals: Option<u32>,

    /// Print one row per sale in addition to the totals.
    #[arg(long)]
    pub details: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "realgain",
            "--pattern",
            "data/*.csv",
            "--skiprows",
            "2",
            "--method",
            "fifo",
            "--details",
        ])
        .unwrap();

        assert_eq!(cli.pattern.as_deref(), Some("data/*.csv"));
        assert_eq!(cli.skiprows, Some(2));
        assert_eq!(cli.method.as_deref(), Some("fifo"));
        assert!(cli.details);
        assert_eq!(cli.format, None);
    }

    #[test]
    fn test_rejects_non_numeric_skiprows() {
        assert!(Cli::try_parse_from(["realgain", "--skiprows", "many"]).is_err());
    }
}
