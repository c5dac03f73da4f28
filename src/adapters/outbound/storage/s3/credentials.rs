use aws_config::ConfigLoader;
use aws_config::ecs::EcsCredentialsProvider;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::meta::credentials::CredentialsProviderChain;
use aws_config::web_identity_token::WebIdentityTokenCredentialsProvider;
use aws_sdk_s3::config::Credentials;

use crate::domain::{ACCESS_KEY_FIELD, BucketProvider, BucketSpec, SECRET_KEY_FIELD, Secret};

const STATIC_PROVIDER_NAME: &str = "bucket-secret";

/// How requests to the bucket are authenticated
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Keys taken from the credential secret
    Static {
        access_key: String,
        secret_key: String,
    },
    /// Ambient role credentials (web identity, container or instance metadata)
    Iam,
    /// Unsigned requests
    Anonymous,
}

impl CredentialSource {
    /// Pick the credential source for a bucket.
    ///
    /// A secret with non-empty `accesskey` and `secretkey` always wins. Otherwise
    /// Amazon buckets fall back to role credentials and every other provider
    /// is accessed anonymously.
    pub fn resolve(spec: &BucketSpec, secret: Option<&Secret>) -> Self {
        if let Some(secret) = secret {
            let access_key = secret.get_string(ACCESS_KEY_FIELD);
            let secret_key = secret.get_string(SECRET_KEY_FIELD);
            if !access_key.is_empty() && !secret_key.is_empty() {
                return CredentialSource::Static {
                    access_key,
                    secret_key,
                };
            }
        }

        if spec.provider == BucketProvider::Aws {
            CredentialSource::Iam
        } else {
            CredentialSource::Anonymous
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CredentialSource::Static { .. } => "static",
            CredentialSource::Iam => "iam",
            CredentialSource::Anonymous => "anonymous",
        }
    }

    pub(crate) fn apply(self, loader: ConfigLoader) -> ConfigLoader {
        match self {
            CredentialSource::Static {
                access_key,
                secret_key,
            } => loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                STATIC_PROVIDER_NAME,
            )),
            CredentialSource::Iam => loader.credentials_provider(iam_provider()),
            CredentialSource::Anonymous => loader.no_credentials(),
        }
    }
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Static { access_key, .. } => f
                .debug_struct("Static")
                .field("access_key", access_key)
                .field("secret_key", &"** redacted **")
                .finish(),
            CredentialSource::Iam => f.write_str("Iam"),
            CredentialSource::Anonymous => f.write_str("Anonymous"),
        }
    }
}

// Role credentials only; environment and profile keys are not consulted.
fn iam_provider() -> CredentialsProviderChain {
    CredentialsProviderChain::first_try(
        "WebIdentityToken",
        WebIdentityTokenCredentialsProvider::builder().build(),
    )
    .or_else("EcsContainer", EcsCredentialsProvider::builder().build())
    .or_else(
        "Ec2InstanceMetadata",
        ImdsCredentialsProvider::builder().build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(access_key: &str, secret_key: &str) -> Secret {
        Secret::new("bucket-creds")
            .with_data(ACCESS_KEY_FIELD, access_key)
            .with_data(SECRET_KEY_FIELD, secret_key)
    }

    #[test]
    fn test_secret_takes_precedence_over_iam() {
        let spec = BucketSpec::new("s3.amazonaws.com").with_provider(BucketProvider::Aws);
        let source = CredentialSource::resolve(&spec, Some(&secret("AKIA", "s3cr3t")));

        assert_eq!(
            source,
            CredentialSource::Static {
                access_key: "AKIA".to_string(),
                secret_key: "s3cr3t".to_string(),
            }
        );
    }

    #[test]
    fn test_amazon_without_secret_uses_iam() {
        let spec = BucketSpec::new("s3.amazonaws.com").with_provider(BucketProvider::Aws);

        assert_eq!(CredentialSource::resolve(&spec, None), CredentialSource::Iam);
    }

    #[test]
    fn test_empty_keys_fall_through() {
        let aws = BucketSpec::new("s3.amazonaws.com").with_provider(BucketProvider::Aws);
        let generic = BucketSpec::new("minio:9000");

        assert_eq!(
            CredentialSource::resolve(&aws, Some(&secret("", "s3cr3t"))),
            CredentialSource::Iam
        );
        assert_eq!(
            CredentialSource::resolve(&generic, Some(&secret("AKIA", ""))),
            CredentialSource::Anonymous
        );
    }

    #[test]
    fn test_generic_without_secret_is_anonymous() {
        let spec = BucketSpec::new("minio:9000").with_provider(BucketProvider::Generic);

        assert_eq!(CredentialSource::resolve(&spec, None), CredentialSource::Anonymous);
    }

    #[test]
    fn test_debug_redacts_secret_key() {
        let source = CredentialSource::Static {
            access_key: "AKIA".to_string(),
            secret_key: "s3cr3t".to_string(),
        };
        let debug = format!("{:?}", source);

        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("s3cr3t"));
    }
}
