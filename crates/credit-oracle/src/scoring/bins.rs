use serde::{Deserialize, Serialize};

use super::metric::MetricError;
use super::ranges::ScoreRange;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BinError {
    #[error("bin edges must be finite (edge {index})")]
    NotFinite { index: usize },
    #[error("bin edges must be non-decreasing (edge {index})")]
    Descending { index: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    #[error("matrix shape {rows}x{cols} has an empty dimension")]
    EmptyShape { rows: usize, cols: usize },
    #[error("matrix scalars must be finite and non-zero, found {0:?}")]
    InvalidScalars([f64; 2]),
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Immutable ascending thresholds used to quantize raw measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BinArray(Vec<f64>);

impl BinArray {
    pub fn new(edges: Vec<f64>) -> Result<Self, BinError> {
        if let Some(index) = edges.iter().position(|edge| !edge.is_finite()) {
            return Err(BinError::NotFinite { index });
        }
        if let Some(index) = edges.windows(2).position(|pair| pair[0] > pair[1]) {
            return Err(BinError::Descending { index: index + 1 });
        }
        Ok(Self(edges))
    }

    pub fn edges(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Right-closed bin lookup: returns `i` with `edges[i-1] < value <= edges[i]`.
    ///
    /// Values at or below the first edge map to 0, values above the last edge
    /// map to `len()`.
    pub fn digitize(&self, value: f64) -> usize {
        self.0.partition_point(|edge| *edge < value)
    }

    /// Copy with every edge multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|edge| edge * factor).collect())
    }

    /// Copy with every edge shifted by `offset`.
    pub fn shifted(&self, offset: f64) -> Self {
        Self(self.0.iter().map(|edge| edge + offset).collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogBase {
    #[default]
    Log10,
    Ln,
}

impl LogBase {
    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Log10 => value.log10(),
            Self::Ln => value.ln(),
        }
    }
}

/// Configuration for a logarithmic scoring matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSpec {
    pub shape: [usize; 2],
    pub scalars: [f64; 2],
    #[serde(default)]
    pub log: LogBase,
    #[serde(default)]
    pub normalize: bool,
}

/// Two-dimensional reward table that grows with both indices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl ScoringMatrix {
    pub fn build(spec: &MatrixSpec) -> Result<Self, MatrixError> {
        let [rows, cols] = spec.shape;
        if rows == 0 || cols == 0 {
            return Err(MatrixError::EmptyShape { rows, cols });
        }
        let [a, b] = spec.scalars;
        if !a.is_finite() || !b.is_finite() || a == 0.0 || b == 0.0 {
            return Err(MatrixError::InvalidScalars(spec.scalars));
        }

        let raw = |i: usize, j: usize| {
            spec.log.apply((i + 1) as f64) / a + spec.log.apply((j + 1) as f64) / b
        };
        let corner = raw(rows - 1, cols - 1);
        let divisor = if spec.normalize && corner != 0.0 {
            corner
        } else {
            1.0
        };

        let cells = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .map(|(i, j)| round2(raw(i, j) / divisor))
            .collect();

        Ok(Self { rows, cols, cells })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64, MetricError> {
        if row >= self.rows || col >= self.cols {
            return Err(MetricError::MatrixOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.cells[row * self.cols + col])
    }

    /// Lookup with the indices swapped.
    pub fn get_transposed(&self, row: usize, col: usize) -> Result<f64, MetricError> {
        self.get(col, row)
    }
}

/// Per-bin rewards derived from the score range.
///
/// Each entry is the midpoint of two normalized score breakpoints, the
/// final entry is the full reward.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Rewards(Vec<f64>);

impl Rewards {
    pub fn from_score_range(range: &ScoreRange) -> Self {
        let head = range.head();
        let span = range.tail() - head;
        let breakpoints = range.breakpoints();
        let normalized: Vec<f64> = breakpoints[..breakpoints.len() - 1]
            .iter()
            .map(|score| (score - head) / span)
            .collect();

        let mut rewards: Vec<f64> = normalized
            .windows(2)
            .map(|pair| round2(pair[0] + (pair[1] - pair[0]) / 2.0))
            .collect();
        rewards.push(1.0);
        Self(rewards)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn at(&self, index: usize) -> Result<f64, MetricError> {
        self.0
            .get(index)
            .copied()
            .ok_or(MetricError::RewardOutOfRange {
                index,
                len: self.0.len(),
            })
    }

    /// Reward counted from the top, so the lowest bin earns the most.
    pub fn at_mirrored(&self, index: usize) -> Result<f64, MetricError> {
        let len = self.0.len();
        match len.checked_sub(index + 1) {
            Some(mirrored) => self.at(mirrored),
            None => Err(MetricError::RewardOutOfRange { index, len }),
        }
    }

    /// Bin edges obtained by scaling every reward except the trailing one.
    pub fn derived_edges(&self, scale: f64) -> BinArray {
        let body = &self.0[..self.0.len().saturating_sub(1)];
        BinArray(body.iter().map(|reward| reward * scale).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digitize_is_right_closed() {
        let bins = BinArray::new(vec![100.0, 500.0, 1000.0]).expect("ascending");
        assert_eq!(bins.digitize(50.0), 0);
        assert_eq!(bins.digitize(100.0), 0);
        assert_eq!(bins.digitize(100.5), 1);
        assert_eq!(bins.digitize(1000.0), 2);
        assert_eq!(bins.digitize(1000.1), 3);
    }

    #[test]
    fn rejects_descending_edges() {
        assert_eq!(
            BinArray::new(vec![3.0, 2.0]),
            Err(BinError::Descending { index: 1 })
        );
        assert!(BinArray::new(vec![1.0, f64::NAN]).is_err());
        assert!(BinArray::new(vec![1.0, 1.0, 2.0]).is_ok());
    }

    #[test]
    fn matrix_grows_along_both_axes() {
        let spec = MatrixSpec {
            shape: [3, 3],
            scalars: [2.0, 2.0],
            log: LogBase::Log10,
            normalize: false,
        };
        let matrix = ScoringMatrix::build(&spec).expect("valid matrix");
        assert_eq!(matrix.get(0, 0).expect("in range"), 0.0);
        // log10(3)/2 + log10(2)/2
        assert_eq!(matrix.get(2, 1).expect("in range"), 0.39);
        assert!(matrix.get(1, 2).expect("in range") >= matrix.get(0, 2).expect("in range"));
        assert!(matches!(
            matrix.get(3, 0),
            Err(MetricError::MatrixOutOfRange { row: 3, .. })
        ));
    }

    #[test]
    fn normalized_matrix_tops_out_at_one() {
        let spec = MatrixSpec {
            shape: [4, 5],
            scalars: [4.5, 4.5],
            log: LogBase::Ln,
            normalize: true,
        };
        let matrix = ScoringMatrix::build(&spec).expect("valid matrix");
        assert_eq!(matrix.get(3, 4).expect("corner"), 1.0);
        assert_eq!(
            matrix.get_transposed(4, 3).expect("corner"),
            matrix.get(3, 4).expect("corner")
        );
    }

    #[test]
    fn matrix_rejects_zero_scalars() {
        let spec = MatrixSpec {
            shape: [2, 2],
            scalars: [0.0, 1.0],
            log: LogBase::Log10,
            normalize: false,
        };
        assert!(ScoringMatrix::build(&spec).is_err());
    }

    #[test]
    fn rewards_follow_score_range_midpoints() {
        let range = ScoreRange::new(vec![300.0, 500.0, 640.0, 740.0, 850.0]).expect("valid");
        let rewards = Rewards::from_score_range(&range);
        assert_eq!(rewards.values(), &[0.18, 0.49, 0.71, 1.0]);
        assert_eq!(rewards.len(), range.bins());
        assert_eq!(rewards.at_mirrored(0).expect("top"), 1.0);
        assert_eq!(rewards.at_mirrored(3).expect("bottom"), 0.18);
        assert!(rewards.at(4).is_err());
    }

    #[test]
    fn derived_edges_drop_the_full_reward() {
        let range = ScoreRange::new(vec![300.0, 500.0, 640.0, 740.0, 850.0]).expect("valid");
        let edges = Rewards::from_score_range(&range).derived_edges(25.0);
        let expected = [4.5, 12.25, 17.75];
        assert_eq!(edges.len(), expected.len());
        for (edge, want) in edges.edges().iter().zip(expected) {
            assert!((edge - want).abs() < 1e-9, "{edge} != {want}");
        }
    }
}
