use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

/// Region used when the bucket descriptor leaves it empty
pub const DEFAULT_REGION: &str = "us-east-1";

/// Object storage provider a bucket is hosted on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketProvider {
    /// Any S3 compatible service (MinIO, Ceph, OSS, ...)
    #[default]
    Generic,
    /// Amazon S3
    Aws,
    /// Google Cloud Storage
    Gcp,
    /// Azure Blob Storage
    Azure,
}

impl BucketProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketProvider::Generic => "generic",
            BucketProvider::Aws => "aws",
            BucketProvider::Gcp => "gcp",
            BucketProvider::Azure => "azure",
        }
    }
}

impl std::fmt::Display for BucketProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BucketProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "" => Ok(BucketProvider::Generic),
            "aws" | "amazon" => Ok(BucketProvider::Aws),
            "gcp" => Ok(BucketProvider::Gcp),
            "azure" => Ok(BucketProvider::Azure),
            other => Err(ValidationError::InvalidField {
                field: "provider".to_string(),
                value: other.to_string(),
                expected: "one of generic, aws, gcp, azure".to_string(),
            }),
        }
    }
}

/// Connection settings of a bucket, as declared on the bucket object.
///
/// The client never mutates a spec; everything that varies per call
/// (bucket name, key, prefix) is passed to the operations instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSpec {
    /// Endpoint as `host[:port]`, without scheme
    pub endpoint: String,

    #[serde(default)]
    pub region: String,

    /// Connect over plain HTTP
    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub provider: BucketProvider,
}

impl BucketSpec {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_provider(mut self, provider: BucketProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Secure unless the bucket is explicitly marked insecure
    pub fn is_secure(&self) -> bool {
        !self.insecure
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_secure() { "https" } else { "http" }
    }

    pub fn region_or_default(&self) -> &str {
        if self.region.is_empty() {
            DEFAULT_REGION
        } else {
            &self.region
        }
    }

    /// Build the endpoint URL the SDK talks to
    pub fn endpoint_url(&self) -> Result<http::Uri, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: reason.to_string(),
        };

        if self.endpoint.is_empty() {
            return Err(invalid("endpoint cannot be empty"));
        }

        if self.endpoint.contains("://") {
            return Err(invalid("endpoint must not contain a scheme"));
        }

        let uri: http::Uri = format!("{}://{}", self.scheme(), self.endpoint)
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;

        if uri.host().map_or(true, str::is_empty) {
            return Err(invalid("endpoint has no host"));
        }

        if !matches!(uri.path(), "" | "/") || uri.query().is_some() {
            return Err(invalid("endpoint cannot have fully qualified paths"));
        }

        Ok(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_bucket_spec() {
        let spec: BucketSpec = serde_json::from_str(
            r#"{"endpoint":"minio.example.com:9000","region":"eu-west-1","insecure":true,"provider":"generic"}"#,
        )
        .unwrap();

        assert_eq!(spec.endpoint, "minio.example.com:9000");
        assert_eq!(spec.region, "eu-west-1");
        assert!(spec.insecure);
        assert_eq!(spec.provider, BucketProvider::Generic);
    }

    #[test]
    fn test_deserialize_defaults() {
        let spec: BucketSpec = serde_json::from_str(r#"{"endpoint":"s3.amazonaws.com"}"#).unwrap();

        assert!(spec.is_secure());
        assert_eq!(spec.provider, BucketProvider::Generic);
        assert_eq!(spec.region_or_default(), DEFAULT_REGION);
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("aws".parse::<BucketProvider>().unwrap(), BucketProvider::Aws);
        assert_eq!("GCP".parse::<BucketProvider>().unwrap(), BucketProvider::Gcp);
        assert!("ftp".parse::<BucketProvider>().is_err());
    }

    #[test]
    fn test_endpoint_url_scheme_follows_insecure_flag() {
        let secure = BucketSpec::new("s3.amazonaws.com");
        assert_eq!(secure.endpoint_url().unwrap().scheme_str(), Some("https"));

        let insecure = BucketSpec::new("127.0.0.1:9000").with_insecure(true);
        let uri = insecure.endpoint_url().unwrap();
        assert_eq!(uri.scheme_str(), Some("http"));
        assert_eq!(uri.port_u16(), Some(9000));
    }

    #[test]
    fn test_invalid_endpoints() {
        assert!(BucketSpec::new("").endpoint_url().is_err());
        assert!(BucketSpec::new("https://s3.amazonaws.com").endpoint_url().is_err());
        assert!(BucketSpec::new("s3.amazonaws.com/bucket").endpoint_url().is_err());
    }
}
