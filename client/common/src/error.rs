use thiserror::Error;

/// Failure taxonomy for client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no active wallet session")]
    Connection,

    #[error("transaction cancelled by user")]
    UserRejected,

    #[error("network error: {0}")]
    Network(String),

    #[error("transaction {tx_id} not confirmed after {rounds} rounds")]
    Timeout { tx_id: String, rounds: u64 },

    #[error("{0}")]
    Unknown(String),
}

impl ClientError {
    /// Whether this failure is a missing account or application on the node
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::Network(msg) => {
                msg.contains("404") || msg.contains("not found") || msg.contains("does not exist")
            }
            _ => false,
        }
    }
}

/// Short message for a failed wallet handshake
pub fn classify_connect_error(raw: &str) -> String {
    if raw.contains("User rejected") || raw.contains("cancelled") {
        "Connection cancelled by user".to_string()
    } else if raw.contains("fetch") || raw.contains("network") || raw.contains("connection") {
        "Network error - please check your connection and try again".to_string()
    } else if raw.contains("No accounts") {
        "No wallet accounts found".to_string()
    } else {
        "Failed to connect wallet. Please try again.".to_string()
    }
}

/// Short message for a failed balance lookup
pub fn classify_balance_error(raw: &str) -> String {
    if raw.contains("fetch") || raw.contains("network") || raw.contains("connection") {
        "Network error - please check your connection".to_string()
    } else if raw.contains("Invalid address") || raw.contains("invalid address") {
        "Invalid wallet address".to_string()
    } else if raw.contains("404") || raw.contains("not found") {
        "Account not found - please fund your wallet".to_string()
    } else {
        format!("Balance fetch error: {raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_errors_classify_by_substring() {
        assert_eq!(
            classify_connect_error("User rejected the request"),
            "Connection cancelled by user"
        );
        assert_eq!(
            classify_connect_error("failed to fetch"),
            "Network error - please check your connection and try again"
        );
        assert_eq!(
            classify_connect_error("No accounts selected"),
            "No wallet accounts found"
        );
        assert_eq!(
            classify_connect_error("something else entirely"),
            "Failed to connect wallet. Please try again."
        );
    }

    #[test]
    fn balance_errors_classify_by_substring() {
        assert_eq!(
            classify_balance_error("status 404: no accounts found for address"),
            "Account not found - please fund your wallet"
        );
        assert_eq!(
            classify_balance_error("Invalid address format"),
            "Invalid wallet address"
        );
        assert!(classify_balance_error("weird failure").starts_with("Balance fetch error:"));
    }

    #[test]
    fn user_rejection_message_mentions_cancellation() {
        assert!(ClientError::UserRejected.to_string().contains("cancelled"));
    }

    #[test]
    fn not_found_detection() {
        assert!(ClientError::Network("status 404: account missing".into()).is_not_found());
        assert!(ClientError::Network("application does not exist".into()).is_not_found());
        assert!(!ClientError::Network("connection refused".into()).is_not_found());
        assert!(!ClientError::Connection.is_not_found());
    }
}
