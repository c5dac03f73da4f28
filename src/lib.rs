pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;

// Re-export key types for convenience

// Domain types - bucket configuration and listed objects
pub use domain::{
    // Models
    BucketProvider,
    BucketSpec,
    ObjectEntry,
    Secret,
    // Errors
    ValidationError,
    validate_secret,
};

// Port types - interfaces for callers
pub use ports::{BucketClient, VisitFn};

// Application configuration
pub use app::{AppError, ClientConfig};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{
    AddressingRule, AddressingRules, BucketError, BucketLookup, ClientOptions, CredentialSource, ErrorResponse, ListingProtocol, ListingRule,
    ListingRules, NO_SUCH_KEY, S3BucketClient, TlsConfig, is_not_found,
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        BucketClient, BucketError, BucketProvider, BucketSpec, ClientConfig, ClientOptions,
        S3BucketClient, Secret, TlsConfig, is_not_found, validate_secret,
    };
}
