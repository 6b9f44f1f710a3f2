use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bins::{BinArray, BinError, MatrixError, MatrixSpec, ScoringMatrix};

/// Multiplier for `volume_*` arrays, which are configured in thousands.
pub const THOUSANDS: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("missing bin array `{0}`")]
    MissingMetric(String),
    #[error("missing matrix `{0}`")]
    MissingMatrix(String),
    #[error("bin array `{key}` is invalid: {source}")]
    Bins {
        key: String,
        #[source]
        source: BinError,
    },
    #[error("matrix `{key}` is invalid: {source}")]
    Matrix {
        key: String,
        #[source]
        source: MatrixError,
    },
    #[error("bin array `{key}` has {edges} edges but `{table}` only holds {slots} entries on that axis")]
    Shape {
        key: String,
        edges: usize,
        table: String,
        slots: usize,
    },
}

/// Check that every index `bins` can digitize to (`0..=len`) addresses one of
/// the `slots` entries of `table`.
pub fn fits(key: &str, bins: &BinArray, table: &str, slots: usize) -> Result<(), ParamError> {
    if bins.len() < slots {
        return Ok(());
    }
    Err(ParamError::Shape {
        key: key.to_string(),
        edges: bins.len(),
        table: table.to_string(),
        slots,
    })
}

/// Parameter section of a provider bundle before it is turned into bins and
/// matrices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawParams {
    #[serde(default)]
    pub metrics: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub matrices: BTreeMap<String, MatrixSpec>,
}

impl RawParams {
    pub fn bins(&self, key: &str) -> Result<BinArray, ParamError> {
        let edges = self
            .metrics
            .get(key)
            .ok_or_else(|| ParamError::MissingMetric(key.to_string()))?;
        BinArray::new(edges.clone()).map_err(|source| ParamError::Bins {
            key: key.to_string(),
            source,
        })
    }

    /// Bin array configured in thousands.
    pub fn volume(&self, key: &str) -> Result<BinArray, ParamError> {
        Ok(self.bins(key)?.scaled(THOUSANDS))
    }

    pub fn matrix(&self, key: &str) -> Result<ScoringMatrix, ParamError> {
        let spec = self
            .matrices
            .get(key)
            .ok_or_else(|| ParamError::MissingMatrix(key.to_string()))?;
        ScoringMatrix::build(spec).map_err(|source| ParamError::Matrix {
            key: key.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::bins::LogBase;

    fn raw() -> RawParams {
        let mut raw = RawParams::default();
        raw.metrics.insert("volume_balance".into(), vec![0.5, 1.0, 5.0]);
        raw.metrics.insert("broken".into(), vec![5.0, 1.0]);
        raw.matrices.insert(
            "activity_volume".into(),
            MatrixSpec {
                shape: [2, 2],
                scalars: [2.0, 2.0],
                log: LogBase::Log10,
                normalize: false,
            },
        );
        raw
    }

    #[test]
    fn volume_arrays_are_scaled_to_units() {
        let bins = raw().volume("volume_balance").expect("configured");
        assert_eq!(bins.edges(), &[500.0, 1000.0, 5000.0]);
    }

    #[test]
    fn reports_missing_and_invalid_keys() {
        let raw = raw();
        assert_eq!(
            raw.bins("duration"),
            Err(ParamError::MissingMetric("duration".into()))
        );
        assert!(matches!(raw.bins("broken"), Err(ParamError::Bins { .. })));
        assert!(matches!(
            raw.matrix("credit_mix"),
            Err(ParamError::MissingMatrix(_))
        ));
        assert_eq!(raw.matrix("activity_volume").expect("built").shape(), (2, 2));
    }

    #[test]
    fn arrays_must_leave_room_for_the_top_bin() {
        let bins = raw().bins("volume_balance").expect("configured");
        assert_eq!(fits("volume_balance", &bins, "fico_medians", 4), Ok(()));
        assert_eq!(
            fits("volume_balance", &bins, "fico_medians", 3),
            Err(ParamError::Shape {
                key: "volume_balance".into(),
                edges: 3,
                table: "fico_medians".into(),
                slots: 3,
            })
        );
    }
}
