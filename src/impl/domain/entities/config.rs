/// Tuning for the anomaly detectors.
///
/// The defaults reproduce the thresholds the detectors have always used. None
/// of them are derived from a stated business rule, so deployments are
/// expected to override them via RON configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Minimum spent/total ratio that raises a budget overrun.
    pub overrun_threshold: f64,
    pub overrun_high_ratio: f64,
    pub overrun_critical_ratio: f64,

    /// Most recent amount must reach `average * unusual_spending_multiplier`.
    pub unusual_spending_multiplier: f64,
    pub unusual_spending_critical_multiplier: f64,
    pub unusual_spending_window: usize,
    pub unusual_spending_min_history: usize,

    pub duplicate_threshold: f64,
    pub duplicate_high_similarity: f64,
    pub duplicate_window: usize,
    /// Stop the pairwise scan at the first pair above the threshold instead of
    /// reporting every pair.
    pub stop_at_first_duplicate: bool,

    pub amount_weight: f64,
    pub description_weight: f64,
    pub vendor_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Number of leading zero hex digits a block hash must have. Zero disables
    /// the nonce search and the ledger degrades to a plain hash chain.
    pub difficulty: usize,
    pub mining_reward: f64,
    pub reward_address: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub ledger: LedgerConfig,
}

// --

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            overrun_threshold: 0.8,
            overrun_high_ratio: 0.9,
            overrun_critical_ratio: 0.95,
            unusual_spending_multiplier: 2.0,
            unusual_spending_critical_multiplier: 3.0,
            unusual_spending_window: 10,
            unusual_spending_min_history: 3,
            duplicate_threshold: 0.95,
            duplicate_high_similarity: 0.98,
            duplicate_window: 20,
            stop_at_first_duplicate: false,
            amount_weight: 0.4,
            description_weight: 0.4,
            vendor_weight: 0.2,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: 2,
            mining_reward: 100.0,
            reward_address: "system".to_string(),
        }
    }
}
