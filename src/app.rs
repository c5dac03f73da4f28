use std::path::Path;

use crate::{
    adapters::outbound::storage::{BucketError, ClientOptions, S3BucketClient, TlsConfig},
    domain::{
        ACCESS_KEY_FIELD, BucketProvider, BucketSpec, SECRET_KEY_FIELD, Secret, ValidationError,
        validate_secret,
    },
};

pub const ENV_ENDPOINT: &str = "BUCKET_ENDPOINT";
pub const ENV_REGION: &str = "BUCKET_REGION";
pub const ENV_INSECURE: &str = "BUCKET_INSECURE";
pub const ENV_PROVIDER: &str = "BUCKET_PROVIDER";
pub const ENV_ACCESS_KEY: &str = "BUCKET_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "BUCKET_SECRET_KEY";
pub const ENV_CA_FILE: &str = "BUCKET_CA_FILE";
pub const ENV_PROXY_URL: &str = "BUCKET_PROXY_URL";

/// Name given to secrets assembled from plain key values
const INLINE_SECRET_NAME: &str = "inline";

/// Everything needed to construct a bucket client
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub spec: BucketSpec,
    pub secret: Option<Secret>,
    pub tls_config: Option<TlsConfig>,
    pub proxy_url: Option<http::Uri>,
}

impl ClientConfig {
    pub fn new(spec: BucketSpec) -> Self {
        Self {
            spec,
            ..Default::default()
        }
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Use a secret built from the given keys; absent keys are left out
    pub fn with_credentials(self, access_key: Option<String>, secret_key: Option<String>) -> Self {
        if access_key.is_none() && secret_key.is_none() {
            return self;
        }

        let mut secret = Secret::new(INLINE_SECRET_NAME);
        if let Some(access_key) = access_key {
            secret = secret.with_data(ACCESS_KEY_FIELD, access_key);
        }
        if let Some(secret_key) = secret_key {
            secret = secret.with_data(SECRET_KEY_FIELD, secret_key);
        }
        self.with_secret(secret)
    }

    pub fn with_tls_config(mut self, tls_config: TlsConfig) -> Self {
        self.tls_config = Some(tls_config);
        self
    }

    /// Trust the PEM bundle stored at `path`
    pub fn with_ca_file(self, path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| AppError::Configuration {
            message: format!("failed to read CA file '{}': {}", path.display(), e),
        })?;
        let tls_config = self.tls_config.clone().unwrap_or_default().with_ca_pem(pem);
        Ok(self.with_tls_config(tls_config))
    }

    pub fn with_proxy_url(mut self, proxy_url: &str) -> Result<Self, AppError> {
        let uri = proxy_url
            .parse::<http::Uri>()
            .map_err(|e| ValidationError::InvalidProxyUrl {
                url: proxy_url.to_string(),
                reason: e.to_string(),
            })?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(ValidationError::InvalidProxyUrl {
                url: proxy_url.to_string(),
                reason: "proxy URL needs a scheme and a host".to_string(),
            }
            .into());
        }
        self.proxy_url = Some(uri);
        Ok(self)
    }

    /// Load the configuration from `BUCKET_*` environment variables
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let endpoint = var(ENV_ENDPOINT).ok_or_else(|| AppError::Configuration {
            message: format!("{} environment variable required", ENV_ENDPOINT),
        })?;
        let provider = var(ENV_PROVIDER)
            .map(|p| p.parse::<BucketProvider>())
            .transpose()?
            .unwrap_or_default();
        let insecure = var(ENV_INSECURE)
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let spec = BucketSpec::new(endpoint)
            .with_region(var(ENV_REGION).unwrap_or_default())
            .with_insecure(insecure)
            .with_provider(provider);

        let mut config =
            Self::new(spec).with_credentials(var(ENV_ACCESS_KEY), var(ENV_SECRET_KEY));
        if let Some(ca_file) = var(ENV_CA_FILE) {
            config = config.with_ca_file(ca_file)?;
        }
        if let Some(proxy_url) = var(ENV_PROXY_URL) {
            config = config.with_proxy_url(&proxy_url)?;
        }

        Ok(config)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::builder()
            .maybe_secret(self.secret.clone())
            .maybe_tls_config(self.tls_config.clone())
            .maybe_proxy_url(self.proxy_url.clone())
            .build()
    }

    /// Validate the secret and construct the client
    pub async fn build_client(&self) -> Result<S3BucketClient, AppError> {
        validate_secret(self.secret.as_ref())?;
        let client = S3BucketClient::new(&self.spec, self.client_options()).await?;
        Ok(client)
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Client initialization error: {0}")]
    ClientInit(#[from] BucketError),
}
