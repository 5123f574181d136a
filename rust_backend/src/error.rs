//! Error types for analytics operations.

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Error type for analytics operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Mean requested on an empty group")]
    EmptyGroup,

    #[error("Undefined trend for partition '{0}': base-period value is zero")]
    UndefinedTrend(String),

    #[error("Percentage change for partition '{0}' is out of range")]
    TrendOverflow(String),

    #[error("Dimension {0} is not part of the grouping")]
    UnknownDimension(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transaction source error: {0}")]
    Source(String),
}
