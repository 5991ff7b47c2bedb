use std::collections::HashMap;
use thiserror::Error;

use crate::cli::Cli;
use crate::engine::Method;
use crate::orchestration::Partition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub pattern: String,
    pub skiprows: usize,
    pub methods: MethodSelection,
    pub partition: Partition,
    pub format: OutputFormat,
    pub decimals: u32,
    pub details: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSelection {
    Fifo,
    MovingAverage,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

const DEFAULT_PATTERN: &str = "*.csv";
const MAX_DECIMALS: u32 = 12;

impl MethodSelection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fifo" => Some(MethodSelection::Fifo),
            "average" | "avg" | "moving-average" | "moving_average" | "ma" => {
                Some(MethodSelection::MovingAverage)
            }
            "both" | "all" => Some(MethodSelection::Both),
            _ => None,
        }
    }

    /// Engines to run, FIFO first.
    pub fn methods(&self) -> Vec<Method> {
        match self {
            MethodSelection::Fifo => vec![Method::Fifo],
            MethodSelection::MovingAverage => vec![Method::MovingAverage],
            MethodSelection::Both => vec![Method::Fifo, Method::MovingAverage],
        }
    }
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "table" | "text" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pattern: DEFAULT_PATTERN.to_string(),
            skiprows: 0,
            methods: MethodSelection::Both,
            partition: Partition::Combined,
            format: OutputFormat::Table,
            decimals: 2,
            details: false,
        }
    }
}

impl Config {
    /// Environment defaults with command-line flags layered on top.
    pub fn resolve(cli: &Cli, env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::from_env_map(env_map)?;
        config.apply_cli(cli)?;
        Ok(config)
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(pattern) = env_map.get("REALGAIN_PATTERN") {
            config.pattern = parse_pattern("REALGAIN_PATTERN", pattern)?;
        }

        if let Some(raw) = env_map.get("REALGAIN_SKIPROWS") {
            config.skiprows = raw.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue(
                    "REALGAIN_SKIPROWS".to_string(),
                    "must be a non-negative integer".to_string(),
                )
            })?;
        }

        if let Some(raw) = env_map.get("REALGAIN_METHOD") {
            config.methods = parse_method("REALGAIN_METHOD", raw)?;
        }

        if let Some(raw) = env_map.get("REALGAIN_PARTITION") {
            config.partition = parse_partition("REALGAIN_PARTITION", raw)?;
        }

        if let Some(raw) = env_map.get("REALGAIN_FORMAT") {
            config.format = parse_format("REALGAIN_FORMAT", raw)?;
        }

        if let Some(raw) = env_map.get("REALGAIN_DECIMALS") {
            let decimals = raw.trim().parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue(
                    "REALGAIN_DECIMALS".to_string(),
                    "must be a non-negative integer".to_string(),
                )
            })?;
            config.decimals = check_decimals("REALGAIN_DECIMALS", decimals)?;
        }

        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(pattern) = &cli.pattern {
            self.pattern = parse_pattern("--pattern", pattern)?;
        }
        if let Some(skiprows) = cli.skiprows {
            self.skiprows = skiprows;
        }
        if let Some(method) = &cli.method {
            self.methods = parse_method("--method", method)?;
        }
        if let Some(partition) = &cli.partition {
            self.partition = parse_partition("--partition", partition)?;
        }
        if let Some(format) = &cli.format {
            self.format = parse_format("--format", format)?;
        }
        if let Some(decimals) = cli.decimals {
            self.decimals = check_decimals("--decimals", decimals)?;
        }
        self.details |= cli.details;
        Ok(())
    }
}

fn parse_pattern(key: &str, raw: &str) -> Result<String, ConfigError> {
    let pattern = raw.trim();
    if pattern.is_empty() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must not be empty".to_string(),
        ));
    }
    Ok(pattern.to_string())
}

fn parse_method(key: &str, raw: &str) -> Result<MethodSelection, ConfigError> {
    MethodSelection::parse(raw).ok_or_else(|| {
        ConfigError::InvalidValue(
            key.to_string(),
            format!("must be fifo, average, or both, got {}", raw),
        )
    })
}

fn parse_partition(key: &str, raw: &str) -> Result<Partition, ConfigError> {
    Partition::parse(raw).ok_or_else(|| {
        ConfigError::InvalidValue(
            key.to_string(),
            format!("must be combined or by-asset, got {}", raw),
        )
    })
}

fn parse_format(key: &str, raw: &str) -> Result<OutputFormat, ConfigError> {
    OutputFormat::parse(raw).ok_or_else(|| {
        ConfigError::InvalidValue(
            key.to_string(),
            format!("must be table or json, got {}", raw),
        )
    })
}

fn check_decimals(key: &str, decimals: u32) -> Result<u32, ConfigError> {
    if decimals > MAX_DECIMALS {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("must be at most {}", MAX_DECIMALS),
        ));
    }
    Ok(decimals)
}
