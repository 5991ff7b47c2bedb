//! Asset partitioning of a file's transaction stream.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Asset, Transaction};

/// How transactions of different assets share engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Partition {
    /// One stream per file. Lots and averages of different assets
    /// interleave, exactly as the rows appear.
    Combined,
    /// One stream per asset, each in input row order.
    ByAsset,
}

impl Partition {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "combined" | "none" => Some(Partition::Combined),
            "by-asset" | "by_asset" | "asset" => Some(Partition::ByAsset),
            _ => None,
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Combined => write!(f, "combined"),
            Partition::ByAsset => write!(f, "by-asset"),
        }
    }
}

/// A slice of a file's transactions fed to fresh engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetGroup {
    /// `None` for the combined stream.
    pub asset: Option<Asset>,
    pub transactions: Vec<Transaction>,
}

/// Split `transactions` according to `mode`.
///
/// By-asset groups are emitted in order of each asset's first appearance.
pub fn partition(transactions: Vec<Transaction>, mode: Partition) -> Vec<AssetGroup> {
    match mode {
        Partition::Combined => vec![AssetGroup {
            asset: None,
            transactions,
        }],
        Partition::ByAsset => {
            let mut groups: Vec<AssetGroup> = Vec::new();
            let mut index: HashMap<Asset, usize> = HashMap::new();
            for tx in transactions {
                let slot = *index.entry(tx.asset.clone()).or_insert_with(|| {
                    groups.push(AssetGroup {
                        asset: Some(tx.asset.clone()),
                        transactions: Vec::new(),
                    });
                    groups.len() - 1
                });
                groups[slot].transactions.push(tx);
            }
            groups
        }
    }
}
