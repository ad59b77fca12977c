use eyre::Report;

pub type AggregationResult<T> = Result<T, AggregationError>;

#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("no native orders supplied")]
    EmptyOrders,
    #[error("no optimal path found")]
    NoOptimalPath,
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Sampler and quote requestor failures pass through unchanged
    #[error(transparent)]
    Collaborator(#[from] Report),
}

impl AggregationError {
    /// The only signal the orchestrator recovers from at the on-chain stage.
    pub fn is_no_optimal_path(&self) -> bool {
        matches!(self, AggregationError::NoOptimalPath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_is_transparent() {
        let err: AggregationError = eyre::eyre!("sampler timed out").into();
        assert_eq!(err.to_string(), "sampler timed out");
        assert!(!err.is_no_optimal_path());
        assert!(AggregationError::NoOptimalPath.is_no_optimal_path());
    }
}
