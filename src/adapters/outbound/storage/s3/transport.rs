use aws_sdk_s3::config::SharedHttpClient;
use aws_smithy_http_client::proxy::ProxyConfig;
use aws_smithy_http_client::tls::{self, TlsContext, TrustStore};
use aws_smithy_http_client::{Builder, Connector};

use crate::adapters::outbound::storage::error::BucketError;
use crate::domain::{CA_CERT_FIELD, Secret, ValidationError};

// Older certificate secrets use this key for the CA bundle.
const LEGACY_CA_FIELD: &str = "caFile";

/// TLS settings for secure bucket connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    ca_pem: Vec<u8>,
    native_roots: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TlsConfig {
    /// Trust the platform's native roots and nothing else
    pub fn new() -> Self {
        Self {
            ca_pem: Vec::new(),
            native_roots: true,
        }
    }

    /// Also trust the certificates in a PEM bundle
    pub fn with_ca_pem(mut self, pem: impl AsRef<[u8]>) -> Self {
        if !self.ca_pem.is_empty() && !self.ca_pem.ends_with(b"\n") {
            self.ca_pem.push(b'\n');
        }
        self.ca_pem.extend_from_slice(pem.as_ref());
        self
    }

    pub fn with_native_roots(mut self, enabled: bool) -> Self {
        self.native_roots = enabled;
        self
    }

    /// Read the CA bundle from a certificate secret (`ca.crt`, or `caFile`)
    pub fn from_secret(secret: &Secret) -> Result<Self, ValidationError> {
        let pem = secret
            .get(CA_CERT_FIELD)
            .or_else(|| secret.get(LEGACY_CA_FIELD))
            .filter(|pem| !pem.is_empty())
            .ok_or_else(|| ValidationError::MissingCaCertificate {
                name: secret.name.clone(),
            })?;

        Ok(Self::new().with_ca_pem(pem))
    }

    pub fn ca_pem(&self) -> &[u8] {
        &self.ca_pem
    }

    pub fn native_roots(&self) -> bool {
        self.native_roots
    }

    fn to_tls_context(&self) -> Result<TlsContext, BucketError> {
        let mut trust_store = TrustStore::empty().with_native_roots(self.native_roots);
        if !self.ca_pem.is_empty() {
            trust_store = trust_store.with_pem_certificate(self.ca_pem.as_slice());
        }

        TlsContext::builder()
            .with_trust_store(trust_store)
            .build()
            .map_err(|err| BucketError::Transport { source: err.into() })
    }
}

/// What the HTTP transport needs to be customised with
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransportSettings {
    pub secure: bool,
    pub tls_config: Option<TlsConfig>,
    pub proxy_url: Option<http::Uri>,
}

impl TransportSettings {
    /// TLS settings are dropped for plain HTTP connections
    pub fn new(secure: bool, tls_config: Option<&TlsConfig>, proxy_url: Option<&http::Uri>) -> Self {
        Self {
            secure,
            tls_config: tls_config.filter(|_| secure).cloned(),
            proxy_url: proxy_url.cloned(),
        }
    }

    /// Nothing to customise; the SDK's own transport is used
    pub fn is_default(&self) -> bool {
        self.tls_config.is_none() && self.proxy_url.is_none()
    }

    /// Build the HTTP client, or `None` when the default one will do
    pub fn build(&self) -> Result<Option<SharedHttpClient>, BucketError> {
        if self.is_default() {
            return Ok(None);
        }

        let proxy = self
            .proxy_url
            .as_ref()
            .map(|url| ProxyConfig::all(url.to_string()))
            .transpose()
            .map_err(|err| BucketError::Transport { source: err.into() })?;
        let tls_context = self
            .tls_config
            .as_ref()
            .map(TlsConfig::to_tls_context)
            .transpose()?;
        let secure = self.secure;

        let client = Builder::new().build_with_connector_fn(move |settings, components| {
            let mut builder = Connector::builder();
            if let Some(settings) = settings {
                builder = builder.connector_settings(settings.clone());
            }
            if let Some(sleep) = components.and_then(|c| c.sleep_impl()) {
                builder = builder.sleep_impl(sleep);
            }
            if let Some(proxy) = &proxy {
                builder = builder.proxy_config(proxy.clone());
            }

            if !secure {
                return builder.build_http();
            }

            let builder = builder.tls_provider(tls::Provider::Rustls(
                tls::rustls_provider::CryptoMode::AwsLc,
            ));
            match &tls_context {
                Some(tls_context) => builder.tls_context(tls_context.clone()).build(),
                None => builder.build(),
            }
        });

        Ok(Some(client))
    }
}
