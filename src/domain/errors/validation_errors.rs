/// Validation errors for bucket configuration objects
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // Secret validation errors
    InvalidSecret {
        name: String,
    },
    MissingCaCertificate {
        name: String,
    },

    // Connection validation errors
    InvalidEndpoint {
        endpoint: String,
        reason: String,
    },
    InvalidProxyUrl {
        url: String,
        reason: String,
    },
    InvalidField {
        field: String,
        value: String,
        expected: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Secret errors
            ValidationError::InvalidSecret { name } => {
                write!(
                    f,
                    "invalid '{}' secret data: required fields 'accesskey' and 'secretkey'",
                    name
                )
            }
            ValidationError::MissingCaCertificate { name } => {
                write!(
                    f,
                    "invalid '{}' secret data: required field 'ca.crt'",
                    name
                )
            }

            // Connection errors
            ValidationError::InvalidEndpoint { endpoint, reason } => {
                write!(f, "invalid bucket endpoint '{}': {}", endpoint, reason)
            }
            ValidationError::InvalidProxyUrl { url, reason } => {
                write!(f, "invalid proxy URL '{}': {}", url, reason)
            }
            ValidationError::InvalidField {
                field,
                value,
                expected,
            } => {
                write!(
                    f,
                    "invalid value for field '{}': '{}' (expected: {})",
                    field, value, expected
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
