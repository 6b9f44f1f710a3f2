use crate::scoring::params::fits;
use crate::scoring::{BinArray, ParamError, RawParams, Rewards, ScoreRange, ScoringMatrix};

const LIVELY_SCALE: f64 = 25.0;
const FLOW_SCALE: f64 = 1500.0;
const RUNNING_BALANCE_SCALE: f64 = 7000.0;

/// Bins and matrices for the bank aggregator, built once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaidParams {
    pub fico_medians: Rewards,
    pub duration: BinArray,
    pub count_zero: BinArray,
    pub count_accounts: BinArray,
    pub credit_util_pct: BinArray,
    pub frequency_interest: BinArray,
    pub count_txn: BinArray,
    pub flow_ratio: BinArray,
    pub slope: BinArray,
    pub slope_lr: BinArray,
    pub due_date: BinArray,
    pub volume_credit: BinArray,
    pub volume_deposit: BinArray,
    pub volume_withdraw: BinArray,
    pub volume_balance: BinArray,
    pub volume_invest: BinArray,
    pub count_lively: BinArray,
    pub volume_flow: BinArray,
    pub volume_min: BinArray,
    pub credit_mix: ScoringMatrix,
    pub activity_volume: ScoringMatrix,
    pub activity_consistency: ScoringMatrix,
    pub diversity_velocity: ScoringMatrix,
}

impl PlaidParams {
    pub fn build(raw: &RawParams, range: &ScoreRange) -> Result<Self, ParamError> {
        let fico_medians = Rewards::from_score_range(range);
        let count_zero = raw.bins("count_zero")?;
        let params = Self {
            duration: raw.bins("duration")?,
            count_accounts: count_zero.shifted(1.0),
            count_zero,
            credit_util_pct: raw.bins("credit_util_pct")?,
            frequency_interest: raw.bins("frequency_interest")?,
            count_txn: raw.bins("count_txn")?,
            flow_ratio: raw.bins("flow_ratio")?,
            slope: raw.bins("slope")?,
            slope_lr: raw.bins("slope_lr")?,
            due_date: raw.bins("due_date")?,
            volume_credit: raw.volume("volume_credit")?,
            volume_deposit: raw.volume("volume_deposit")?,
            volume_withdraw: raw.volume("volume_withdraw")?,
            volume_balance: raw.volume("volume_balance")?,
            volume_invest: raw.volume("volume_invest")?,
            count_lively: fico_medians.derived_edges(LIVELY_SCALE),
            volume_flow: fico_medians.derived_edges(FLOW_SCALE),
            volume_min: fico_medians.derived_edges(RUNNING_BALANCE_SCALE),
            credit_mix: raw.matrix("credit_mix")?,
            activity_volume: raw.matrix("activity_volume")?,
            activity_consistency: raw.matrix("activity_consistency")?,
            diversity_velocity: raw.matrix("diversity_velocity")?,
            fico_medians,
        };
        params.check_shapes()?;
        Ok(params)
    }

    /// Every array must digitize onto a valid entry of each table it indexes.
    fn check_shapes(&self) -> Result<(), ParamError> {
        let rewards = self.fico_medians.len();
        let (mix_rows, mix_cols) = self.credit_mix.shape();
        let (volume_rows, volume_cols) = self.activity_volume.shape();
        let (consistency_rows, consistency_cols) = self.activity_consistency.shape();
        let (velocity_rows, velocity_cols) = self.diversity_velocity.shape();

        let checks: &[(&str, &BinArray, &str, usize)] = &[
            ("duration", &self.duration, "fico_medians", rewards),
            ("frequency_interest", &self.frequency_interest, "fico_medians", rewards),
            ("count_txn", &self.count_txn, "fico_medians", rewards),
            ("slope_lr", &self.slope_lr, "fico_medians", rewards),
            ("volume_balance", &self.volume_balance, "fico_medians", rewards),
            ("volume_invest", &self.volume_invest, "fico_medians", rewards),
            ("count_lively", &self.count_lively, "fico_medians", rewards),
            ("count_zero", &self.count_zero, "credit_mix", mix_rows),
            ("duration", &self.duration, "credit_mix", mix_cols),
            ("duration", &self.duration, "activity_volume", volume_rows),
            ("volume_credit", &self.volume_credit, "activity_volume", volume_cols),
            ("flow_ratio", &self.flow_ratio, "activity_volume", volume_rows),
            ("volume_flow", &self.volume_flow, "activity_volume", volume_cols),
            ("slope", &self.slope, "activity_volume", volume_rows),
            ("slope", &self.slope, "activity_volume", volume_cols),
            ("duration", &self.duration, "activity_consistency", consistency_rows),
            ("credit_util_pct", &self.credit_util_pct, "activity_consistency", consistency_cols),
            ("volume_min", &self.volume_min, "activity_consistency", consistency_cols),
            ("count_zero", &self.count_zero, "diversity_velocity", velocity_rows),
            ("count_accounts", &self.count_accounts, "diversity_velocity", velocity_rows),
            ("volume_deposit", &self.volume_deposit, "diversity_velocity", velocity_cols),
            ("volume_withdraw", &self.volume_withdraw, "diversity_velocity", velocity_cols),
            ("duration", &self.duration, "diversity_velocity", velocity_cols),
        ];
        checks
            .iter()
            .try_for_each(|&(key, bins, table, slots)| fits(key, bins, table, slots))
    }
}
