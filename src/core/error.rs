use thiserror::Error;

/// Request-level failures of the claim path
///
/// Losing a race is not an error: see [`super::ClaimResult::AlreadyOwned`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// Row/col missing, non-integer or outside the grid
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// No valid identity was attached to the request
    #[error("not authenticated")]
    Unauthenticated,

    /// The storage engine could not complete the operation
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl ClaimError {
    /// Stable machine-readable code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::InvalidCoordinate(_) => "invalid_coordinate",
            ClaimError::Unauthenticated => "unauthenticated",
            ClaimError::Storage(_) => "storage_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ClaimError::InvalidCoordinate("x".to_string()).code(),
            "invalid_coordinate"
        );
        assert_eq!(ClaimError::Unauthenticated.code(), "unauthenticated");
        assert_eq!(
            ClaimError::Storage("down".to_string()).code(),
            "storage_unavailable"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ClaimError::InvalidCoordinate("row 7 is outside 0..5".to_string());
        assert_eq!(err.to_string(), "invalid coordinate: row 7 is outside 0..5");
        assert_eq!(ClaimError::Unauthenticated.to_string(), "not authenticated");
    }
}
