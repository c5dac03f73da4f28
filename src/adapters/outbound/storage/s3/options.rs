use bon::Builder;

use super::addressing::AddressingRules;
use super::listing::ListingRules;
use super::transport::TlsConfig;
use crate::domain::Secret;

/// Optional settings applied when constructing an [`S3BucketClient`].
///
/// ```ignore
/// let options = ClientOptions::builder()
///     .secret(secret)
///     .proxy_url("http://proxy.internal:3128".parse()?)
///     .build();
/// ```
///
/// [`S3BucketClient`]: super::S3BucketClient
#[derive(Debug, Clone, Default, Builder)]
pub struct ClientOptions {
    /// Secret holding `accesskey` and `secretkey`
    pub secret: Option<Secret>,

    /// TLS settings, only used for secure connections
    pub tls_config: Option<TlsConfig>,

    pub proxy_url: Option<http::Uri>,

    /// Endpoint patterns that need a specific listing protocol
    #[builder(default)]
    pub listing_rules: ListingRules,

    /// Endpoint patterns addressed with virtual-host style requests
    #[builder(default)]
    pub addressing_rules: AddressingRules,
}
