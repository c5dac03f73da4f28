// Infrastructure error types
pub mod error;

// Provider-specific implementations
pub mod s3;

// Re-export key types
pub use error::{BoxError, BucketError, ErrorResponse, NO_SUCH_KEY, is_not_found};
pub use s3::{
    AddressingRule, AddressingRules, BucketLookup, ClientOptions, CredentialSource, ListingProtocol, ListingRule, ListingRules, S3BucketClient,
    TlsConfig,
};
