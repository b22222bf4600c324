use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

use crate::error::{AppError, Result};

// ============================================================================
// PAIR CONFIG
// ============================================================================

/// Chart legend for a combined pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLabels {
    /// Base leg, plotted as `value1`
    pub line1: String,
    /// Main leg, plotted as `value2`
    pub line2: String,
    pub spread: String,
}

/// An indicator defined as the difference of two underlying series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairConfig {
    pub pair_id: String,
    /// Base sources in priority order; the first with data wins.
    pub base_candidate_ids: Vec<String>,
    pub main_indicator_id: String,
    pub spread_indicator_id: String,
    pub labels: PairLabels,
    /// Backing indicators kept out of the heatmap.
    #[serde(default)]
    pub hidden_in_heatmap: Vec<String>,
}

// Helper macro to reduce boilerplate
macro_rules! pair {
    ($id:expr, [$($base:expr),* $(,)?], $main:expr, $spread:expr, ($l1:expr, $l2:expr, $ls:expr)) => {
        PairConfig {
            pair_id: $id.to_string(),
            base_candidate_ids: vec![$($base.to_string()),*],
            main_indicator_id: $main.to_string(),
            spread_indicator_id: $spread.to_string(),
            labels: PairLabels {
                line1: $l1.to_string(),
                line2: $l2.to_string(),
                spread: $ls.to_string(),
            },
            hidden_in_heatmap: vec![$main.to_string()],
        }
    };
}

// ============================================================================
// BUILT-IN PAIRS
// ============================================================================

static DEFAULT_PAIRS: Lazy<Vec<PairConfig>> = Lazy::new(|| {
    vec![
        // VIX term structure: front month vs 3 month
        pair!("vix_vix3m",
            ["bbg_VIX_Index", "Wind_G0003892", "FRED_VIXCLS"],
            "yhfinance_^VIX3M", "yhfinance_VIX-VIX3M",
            ("VIX", "VIX3M", "VIX-VIX3M")),
        // 9 day vs front month
        pair!("vix9d_vix",
            ["bbg_VIX_Index", "Wind_G0003892", "FRED_VIXCLS"],
            "yhfinance_^VIX9D", "yhfinance_VIX9D-VIX",
            ("VIX", "VIX9D", "VIX9D-VIX")),
    ]
});

// ============================================================================
// REGISTRY
// ============================================================================

/// Immutable lookup of combined pairs, keyed by both main and spread id.
#[derive(Debug, Clone)]
pub struct PairRegistry {
    pairs: Vec<PairConfig>,
    index: HashMap<String, usize>,
}

impl PairRegistry {
    /// Fails if one id would resolve to two different pairs.
    pub fn new(pairs: Vec<PairConfig>) -> Result<Self> {
        let mut index: HashMap<String, usize> = HashMap::with_capacity(pairs.len() * 2);

        for (idx, pair) in pairs.iter().enumerate() {
            for key in [&pair.main_indicator_id, &pair.spread_indicator_id] {
                match index.get(key) {
                    Some(&existing) if existing != idx => {
                        return Err(AppError::Config(format!(
                            "indicator '{}' is claimed by pairs '{}' and '{}'",
                            key, pairs[existing].pair_id, pair.pair_id
                        )));
                    }
                    _ => {
                        index.insert(key.clone(), idx);
                    }
                }
            }
        }

        Ok(Self { pairs, index })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(DEFAULT_PAIRS.clone())
    }

    /// Reads a JSON array of pair configs.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let pairs: Vec<PairConfig> = serde_json::from_str(&raw)?;
        info!("Loaded {} combined pairs from {}", pairs.len(), path.display());
        Self::new(pairs)
    }

    /// File registry if a path is configured, built-in pairs otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Self::builtin(),
        }
    }

    /// Pair for a main or spread indicator id.
    pub fn get(&self, indicator_id: &str) -> Option<&PairConfig> {
        self.index.get(indicator_id).and_then(|&idx| self.pairs.get(idx))
    }

    pub fn pairs(&self) -> &[PairConfig] {
        &self.pairs
    }

    pub fn hidden_ids(&self) -> HashSet<String> {
        self.pairs
            .iter()
            .flat_map(|p| p.hidden_in_heatmap.iter().cloned())
            .collect()
    }
}
