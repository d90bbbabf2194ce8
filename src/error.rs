use thiserror::Error;

/// Fatal conditions raised by model construction.
///
/// A computed model is either fully valid or not returned at all; every
/// variant here aborts the build synchronously. Degenerate denominators
/// (zero production) are recovered inside the engine and never surface as
/// errors.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("structural consistency check failed: {}", .failures.join("; "))]
    Inconsistent { failures: Vec<String> },

    #[error("mass balance violated:\n{report}")]
    MassBalance { report: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    Shape {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("stock data violates its contract: {0}")]
    StockData(String),

    #[error("trade estimate violates its contract: {0}")]
    TradeData(String),

    #[error("model cache I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("model cache encoding: {0}")]
    Encoding(#[from] bincode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_lists_all_failures() {
        let err = ModelError::Inconsistent {
            failures: vec!["edge A".to_string(), "edge B".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("edge A"));
        assert!(msg.contains("edge B"));
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = ModelError::Shape {
            name: "inflow".to_string(),
            expected: vec![4, 2, 3, 1],
            actual: vec![4, 2, 3],
        };
        assert!(err.to_string().contains("inflow"));
    }
}
