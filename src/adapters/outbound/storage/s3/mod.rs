//! S3 compatible bucket client built on the AWS SDK
//!
//! This module turns a bucket descriptor plus optional secret, TLS and
//! proxy settings into a configured SDK client, and layers the fetch,
//! traversal and not-found helpers on top of it.

mod addressing;
mod client;
mod credentials;
mod listing;
mod options;
mod transport;

pub use addressing::{AddressingRule, AddressingRules, BucketLookup};
pub use client::S3BucketClient;
pub use credentials::CredentialSource;
pub use listing::{ListingProtocol, ListingRule, ListingRules};
pub use options::ClientOptions;
pub use transport::TlsConfig;
