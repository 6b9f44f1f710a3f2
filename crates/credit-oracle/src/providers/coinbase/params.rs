use crate::scoring::params::fits;
use crate::scoring::{BinArray, ParamError, RawParams, Rewards, ScoreRange, ScoringMatrix};

/// Bins and matrices for the exchange account, built once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinbaseParams {
    pub fico_medians: Rewards,
    pub due_date: BinArray,
    pub duration: BinArray,
    pub count_txn: BinArray,
    pub volume_balance: BinArray,
    pub volume_profit: BinArray,
    pub volume_txn: BinArray,
    pub activity_volume: ScoringMatrix,
    pub activity_consistency: ScoringMatrix,
}

impl CoinbaseParams {
    pub fn build(raw: &RawParams, range: &ScoreRange) -> Result<Self, ParamError> {
        let params = Self {
            fico_medians: Rewards::from_score_range(range),
            due_date: raw.bins("due_date")?,
            duration: raw.bins("duration")?,
            count_txn: raw.bins("count_txn")?,
            volume_balance: raw.volume("volume_balance")?,
            volume_profit: raw.volume("volume_profit")?,
            volume_txn: raw.volume("volume_txn")?,
            activity_volume: raw.matrix("activity_volume")?,
            activity_consistency: raw.matrix("activity_consistency")?,
        };
        params.check_shapes()?;
        Ok(params)
    }

    fn check_shapes(&self) -> Result<(), ParamError> {
        let rewards = self.fico_medians.len();
        let (volume_rows, volume_cols) = self.activity_volume.shape();
        let (consistency_rows, consistency_cols) = self.activity_consistency.shape();
        let checks: &[(&str, &BinArray, &str, usize)] = &[
            ("duration", &self.duration, "fico_medians", rewards),
            ("volume_balance", &self.volume_balance, "fico_medians", rewards),
            ("volume_profit", &self.volume_profit, "fico_medians", rewards),
            ("count_txn", &self.count_txn, "activity_volume", volume_rows),
            ("volume_txn", &self.volume_txn, "activity_volume", volume_cols),
            ("duration", &self.duration, "activity_consistency", consistency_rows),
            ("volume_balance", &self.volume_balance, "activity_consistency", consistency_cols),
            ("volume_txn", &self.volume_txn, "activity_consistency", consistency_cols),
        ];
        checks
            .iter()
            .try_for_each(|&(key, bins, table, slots)| fits(key, bins, table, slots))
    }
}
