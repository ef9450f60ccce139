use serde_derive::Deserialize;

use crate::entities::{Config, DetectionConfig, LedgerConfig};

/// RON representation of `Config`. Every field is optional; missing fields
/// take the library defaults.
///
/// ```ron
/// (
///     detection: (overrun_threshold: 0.75, stop_at_first_duplicate: true),
///     ledger: (difficulty: 0),
/// )
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigModel {
    detection: DetectionConfigModel,
    ledger: LedgerConfigModel,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DetectionConfigModel {
    overrun_threshold: f64,
    overrun_high_ratio: f64,
    overrun_critical_ratio: f64,
    unusual_spending_multiplier: f64,
    unusual_spending_critical_multiplier: f64,
    unusual_spending_window: usize,
    unusual_spending_min_history: usize,
    duplicate_threshold: f64,
    duplicate_high_similarity: f64,
    duplicate_window: usize,
    stop_at_first_duplicate: bool,
    amount_weight: f64,
    description_weight: f64,
    vendor_weight: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LedgerConfigModel {
    difficulty: usize,
    mining_reward: f64,
    reward_address: String,
}

impl Default for DetectionConfigModel {
    fn default() -> Self {
        let d = DetectionConfig::default();
        Self {
            overrun_threshold: d.overrun_threshold,
            overrun_high_ratio: d.overrun_high_ratio,
            overrun_critical_ratio: d.overrun_critical_ratio,
            unusual_spending_multiplier: d.unusual_spending_multiplier,
            unusual_spending_critical_multiplier: d.unusual_spending_critical_multiplier,
            unusual_spending_window: d.unusual_spending_window,
            unusual_spending_min_history: d.unusual_spending_min_history,
            duplicate_threshold: d.duplicate_threshold,
            duplicate_high_similarity: d.duplicate_high_similarity,
            duplicate_window: d.duplicate_window,
            stop_at_first_duplicate: d.stop_at_first_duplicate,
            amount_weight: d.amount_weight,
            description_weight: d.description_weight,
            vendor_weight: d.vendor_weight,
        }
    }
}

impl Default for LedgerConfigModel {
    fn default() -> Self {
        let d = LedgerConfig::default();
        Self {
            difficulty: d.difficulty,
            mining_reward: d.mining_reward,
            reward_address: d.reward_address,
        }
    }
}

impl From<DetectionConfigModel> for DetectionConfig {
    fn from(m: DetectionConfigModel) -> Self {
        Self {
            overrun_threshold: m.overrun_threshold,
            overrun_high_ratio: m.overrun_high_ratio,
            overrun_critical_ratio: m.overrun_critical_ratio,
            unusual_spending_multiplier: m.unusual_spending_multiplier,
            unusual_spending_critical_multiplier: m.unusual_spending_critical_multiplier,
            unusual_spending_window: m.unusual_spending_window,
            unusual_spending_min_history: m.unusual_spending_min_history,
            duplicate_threshold: m.duplicate_threshold,
            duplicate_high_similarity: m.duplicate_high_similarity,
            duplicate_window: m.duplicate_window,
            stop_at_first_duplicate: m.stop_at_first_duplicate,
            amount_weight: m.amount_weight,
            description_weight: m.description_weight,
            vendor_weight: m.vendor_weight,
        }
    }
}

impl From<LedgerConfigModel> for LedgerConfig {
    fn from(m: LedgerConfigModel) -> Self {
        Self {
            difficulty: m.difficulty,
            mining_reward: m.mining_reward,
            reward_address: m.reward_address,
        }
    }
}

impl From<ConfigModel> for Config {
    fn from(m: ConfigModel) -> Self {
        Self {
            detection: m.detection.into(),
            ledger: m.ledger.into(),
        }
    }
}
