use crate::scoring::params::fits;
use crate::scoring::{BinArray, ParamError, RawParams, Rewards, ScoreRange, ScoringMatrix};

/// Bins and matrices for the wallet explorer, built once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct CovalentParams {
    pub fico_medians: Rewards,
    pub duration: BinArray,
    pub due_date: BinArray,
    pub volume_now: BinArray,
    pub volume_per_txn: BinArray,
    pub count_to_four: BinArray,
    pub count_operations: BinArray,
    pub frequency_txn: BinArray,
    pub dust_ratio: BinArray,
    pub activity_volume: ScoringMatrix,
    pub activity_consistency: ScoringMatrix,
    pub diversity_methods: ScoringMatrix,
}

impl CovalentParams {
    pub fn build(raw: &RawParams, range: &ScoreRange) -> Result<Self, ParamError> {
        let fico_medians = Rewards::from_score_range(range);
        let params = Self {
            dust_ratio: fico_medians.derived_edges(1.0),
            fico_medians,
            duration: raw.bins("duration")?,
            due_date: raw.bins("due_date")?,
            volume_now: raw.volume("volume_now")?,
            volume_per_txn: raw.volume("volume_per_txn")?,
            count_to_four: raw.bins("count_to_four")?,
            count_operations: raw.bins("count_operations")?,
            frequency_txn: raw.bins("frequency_txn")?,
            activity_volume: raw.matrix("activity_volume")?,
            activity_consistency: raw.matrix("activity_consistency")?,
            diversity_methods: raw.matrix("diversity_methods")?,
        };
        params.check_shapes()?;
        Ok(params)
    }

    fn check_shapes(&self) -> Result<(), ParamError> {
        let rewards = self.fico_medians.len();
        let (volume_rows, volume_cols) = self.activity_volume.shape();
        let (consistency_rows, consistency_cols) = self.activity_consistency.shape();
        let (methods_rows, methods_cols) = self.diversity_methods.shape();
        let checks: &[(&str, &BinArray, &str, usize)] = &[
            ("duration", &self.duration, "fico_medians", rewards),
            ("volume_now", &self.volume_now, "fico_medians", rewards),
            ("volume_per_txn", &self.volume_per_txn, "fico_medians", rewards),
            ("count_operations", &self.count_operations, "fico_medians", rewards),
            ("dust_ratio", &self.dust_ratio, "fico_medians", rewards),
            ("count_operations", &self.count_operations, "activity_volume", volume_rows),
            ("volume_now", &self.volume_now, "activity_volume", volume_cols),
            ("duration", &self.duration, "activity_consistency", consistency_rows),
            ("frequency_txn", &self.frequency_txn, "activity_consistency", consistency_cols),
            ("count_to_four", &self.count_to_four, "diversity_methods", methods_rows),
            ("count_operations", &self.count_operations, "diversity_methods", methods_cols),
            ("volume_now", &self.volume_now, "diversity_methods", methods_cols),
        ];
        checks
            .iter()
            .try_for_each(|&(key, bins, table, slots)| fits(key, bins, table, slots))
    }
}
