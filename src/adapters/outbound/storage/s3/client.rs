use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use futures::{Stream, StreamExt};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::addressing::BucketLookup;
use super::credentials::CredentialSource;
use super::listing::{self, ListingProtocol};
use super::options::ClientOptions;
use super::transport::TransportSettings;
use crate::adapters::outbound::storage::error::{BucketError, is_not_found};
use crate::domain::{BucketSpec, ObjectEntry, quote_etag, trim_etag};
use crate::ports::storage::{BucketClient, VisitFn};

/// Client for fetching from S3 compatible object storage.
///
/// The connection settings are fixed at construction; bucket names, keys
/// and prefixes are passed per call. Cloning is cheap and clones share the
/// SDK connection pool.
#[derive(Debug, Clone)]
pub struct S3BucketClient {
    client: Client,
    endpoint: http::Uri,
    listing: ListingProtocol,
    lookup: BucketLookup,
}

impl S3BucketClient {
    /// Create a client for the bucket described by `spec`.
    ///
    /// Buckets are addressed virtual-host style only on endpoints matching
    /// the addressing rules and path style everywhere else.
    pub async fn new(spec: &BucketSpec, options: ClientOptions) -> Result<Self, BucketError> {
        let endpoint = spec.endpoint_url()?;
        let host = endpoint.host().unwrap_or_default();
        let listing = options.listing_rules.protocol_for(host);
        let lookup = options.addressing_rules.lookup_for(host);

        let credentials = CredentialSource::resolve(spec, options.secret.as_ref());
        let transport = TransportSettings::new(
            spec.is_secure(),
            options.tls_config.as_ref(),
            options.proxy_url.as_ref(),
        );
        let http_client = transport.build()?;

        debug!(
            endpoint = %endpoint,
            region = spec.region_or_default(),
            provider = %spec.provider,
            credentials = credentials.kind(),
            custom_transport = http_client.is_some(),
            listing = ?listing,
            lookup = ?lookup,
            "creating bucket client"
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(spec.region_or_default().to_string()))
            .endpoint_url(format!("{}://{}", spec.scheme(), spec.endpoint));
        loader = credentials.apply(loader);
        if let Some(http_client) = http_client {
            loader = loader.http_client(http_client);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(lookup == BucketLookup::Path)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            endpoint,
            listing,
            lookup,
        })
    }

    /// The underlying SDK client
    pub fn sdk(&self) -> &Client {
        &self.client
    }

    pub fn endpoint(&self) -> &http::Uri {
        &self.endpoint
    }

    pub fn is_secure(&self) -> bool {
        self.endpoint.scheme_str() == Some("https")
    }

    pub fn listing_protocol(&self) -> ListingProtocol {
        self.listing
    }

    pub fn bucket_lookup(&self) -> BucketLookup {
        self.lookup
    }

    /// Fetch an object into `local_path` and return its etag.
    ///
    /// The object is stat'ed first and then downloaded with an If-Match on
    /// that etag, so an object replaced in between fails the download
    /// instead of producing content that belongs to neither version.
    #[instrument(skip(self, local_path), fields(path = %local_path.display()))]
    pub async fn fget_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        local_path: &Path,
    ) -> Result<String, BucketError> {
        let stat = self
            .client
            .head_object()
            .bucket(bucket_name)
            .key(object_name)
            .send()
            .await
            .map_err(|err| BucketError::from_sdk(err, "HeadObject", bucket_name, Some(object_name)))?;

        let etag = stat
            .e_tag()
            .map(trim_etag)
            .filter(|etag| !etag.is_empty())
            .ok_or_else(|| BucketError::MissingEtag {
                bucket_name: bucket_name.to_string(),
                key: object_name.to_string(),
            })?
            .to_string();

        if tokio::fs::metadata(local_path)
            .await
            .is_ok_and(|meta| meta.is_dir())
        {
            return Err(BucketError::InvalidDestination {
                path: local_path.to_path_buf(),
            });
        }

        let object = self
            .client
            .get_object()
            .bucket(bucket_name)
            .key(object_name)
            .if_match(quote_etag(&etag))
            .send()
            .await
            .map_err(|err| BucketError::from_sdk(err, "GetObject", bucket_name, Some(object_name)))?;

        write_object(object.body, local_path, &etag).await?;
        debug!(%etag, "fetched object");

        Ok(etag)
    }

    /// Lazily list all objects under `prefix`, recursively.
    ///
    /// Errors are the raw listing errors; [`visit_objects`](Self::visit_objects)
    /// adds the bucket context.
    pub fn list_objects(
        &self,
        bucket_name: &str,
        prefix: &str,
    ) -> impl Stream<Item = Result<ObjectEntry, BucketError>> + Send + 'static {
        listing::list_objects(
            self.client.clone(),
            self.listing,
            bucket_name.to_string(),
            prefix.to_string(),
        )
    }

    /// Call `visit` with the key and etag of every object under `prefix`.
    ///
    /// A listing error stops the traversal and is returned wrapped with the
    /// bucket name. An error from `visit` stops it too and is returned as is,
    /// so callers can use their own sentinel to end a traversal early.
    #[instrument(skip(self, visit))]
    pub async fn visit_objects<F, E>(
        &self,
        bucket_name: &str,
        prefix: &str,
        mut visit: F,
    ) -> Result<(), E>
    where
        F: FnMut(&str, &str) -> Result<(), E>,
        E: From<BucketError>,
    {
        let mut objects = Box::pin(self.list_objects(bucket_name, prefix));

        while let Some(object) = objects.next().await {
            let object = object.map_err(|source| BucketError::Listing {
                bucket_name: bucket_name.to_string(),
                source: Box::new(source),
            })?;
            visit(&object.key, &object.etag)?;
        }

        Ok(())
    }

    /// Whether `err` reports a missing object
    pub fn object_is_not_found(&self, err: &BucketError) -> bool {
        is_not_found(err)
    }

    /// The SDK keeps no resources that need releasing
    pub async fn close(&self) {}
}

#[async_trait]
impl BucketClient for S3BucketClient {
    async fn fget_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        local_path: &Path,
    ) -> Result<String, BucketError> {
        S3BucketClient::fget_object(self, bucket_name, object_name, local_path).await
    }

    async fn visit_objects(
        &self,
        bucket_name: &str,
        prefix: &str,
        visit: &mut VisitFn<'_>,
    ) -> Result<(), BucketError> {
        S3BucketClient::visit_objects(self, bucket_name, prefix, visit).await
    }

    fn object_is_not_found(&self, err: &BucketError) -> bool {
        S3BucketClient::object_is_not_found(self, err)
    }

    async fn close(&self) {
        S3BucketClient::close(self).await
    }
}

/// Stream the body into a part file next to `local_path`, then move it into
/// place. A failed transfer leaves the part file and an untouched destination.
async fn write_object(body: ByteStream, local_path: &Path, etag: &str) -> Result<(), BucketError> {
    if let Some(dir) = local_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let part_path = part_file_path(local_path, etag);
    let mut file = tokio::fs::File::create(&part_path).await?;
    let mut reader = body.into_async_read();
    tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&part_path, local_path).await?;
    Ok(())
}

fn part_file_path(local_path: &Path, etag: &str) -> PathBuf {
    let tag: String = etag
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let mut name = OsString::from(local_path.as_os_str());
    name.push(format!(".{}.part", tag));
    PathBuf::from(name)
}
