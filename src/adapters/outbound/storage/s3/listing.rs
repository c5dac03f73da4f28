use async_stream::try_stream;
use aws_sdk_s3::types::Object;
use aws_sdk_s3::Client;
use futures::Stream;

use crate::adapters::outbound::storage::error::BucketError;
use crate::domain::{ObjectEntry, trim_etag};

/// ListObjects protocol version used to enumerate a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ListingProtocol {
    /// Marker based `ListObjects`
    V1,
    /// Continuation token based `ListObjectsV2`
    #[default]
    V2,
}

/// Endpoint pattern that requires a particular listing protocol.
///
/// A pattern starting with `.` matches any subdomain of it, anything else
/// must equal the endpoint host. Matching ignores case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRule {
    pub pattern: String,
    pub protocol: ListingProtocol,
}

impl ListingRule {
    pub fn new(pattern: impl Into<String>, protocol: ListingProtocol) -> Self {
        Self {
            pattern: pattern.into(),
            protocol,
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        host_matches(&self.pattern, host)
    }
}

/// Match `host` against an exact host or a `.suffix` domain pattern, ignoring case
pub(super) fn host_matches(pattern: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();
    if pattern.starts_with('.') {
        host.ends_with(&pattern)
    } else {
        host == pattern
    }
}

/// Ordered listing rules; the first match wins, V2 otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRules(Vec<ListingRule>);

impl Default for ListingRules {
    /// Google Cloud Storage's S3 interoperability API only speaks V1
    fn default() -> Self {
        Self(vec![ListingRule::new(
            "storage.googleapis.com",
            ListingProtocol::V1,
        )])
    }
}

impl ListingRules {
    /// No quirks at all; every endpoint gets V2
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn with_rule(mut self, rule: ListingRule) -> Self {
        self.0.push(rule);
        self
    }

    pub fn rules(&self) -> &[ListingRule] {
        &self.0
    }

    pub fn protocol_for(&self, host: &str) -> ListingProtocol {
        self.0
            .iter()
            .find(|rule| rule.matches(host))
            .map(|rule| rule.protocol)
            .unwrap_or_default()
    }
}

fn to_entry(object: &Object) -> ObjectEntry {
    ObjectEntry {
        key: object.key().unwrap_or_default().to_string(),
        etag: object.e_tag().map(trim_etag).unwrap_or_default().to_string(),
        size: object.size(),
    }
}

/// Lazily list every object under `prefix`, without a delimiter
pub(crate) fn list_objects(
    client: Client,
    protocol: ListingProtocol,
    bucket_name: String,
    prefix: String,
) -> impl Stream<Item = Result<ObjectEntry, BucketError>> + Send + 'static {
    let prefix = (!prefix.is_empty()).then_some(prefix);

    try_stream! {
        match protocol {
            ListingProtocol::V2 => {
                let mut pages = client
                    .list_objects_v2()
                    .bucket(&bucket_name)
                    .set_prefix(prefix)
                    .into_paginator()
                    .send();

                while let Some(page) = pages.next().await {
                    let page = page.map_err(|err| {
                        BucketError::from_sdk(err, "ListObjectsV2", &bucket_name, None)
                    })?;
                    for object in page.contents() {
                        yield to_entry(object);
                    }
                }
            }
            ListingProtocol::V1 => {
                let mut marker: Option<String> = None;
                loop {
                    let page = client
                        .list_objects()
                        .bucket(&bucket_name)
                        .set_prefix(prefix.clone())
                        .set_marker(marker.take())
                        .send()
                        .await
                        .map_err(|err| {
                            BucketError::from_sdk(err, "ListObjects", &bucket_name, None)
                        })?;

                    for object in page.contents() {
                        yield to_entry(object);
                    }

                    if !page.is_truncated().unwrap_or(false) {
                        break;
                    }
                    // NextMarker is only sent when a delimiter is used.
                    marker = page
                        .next_marker()
                        .or_else(|| page.contents().last().and_then(Object::key))
                        .map(str::to_owned);
                    if marker.is_none() {
                        break;
                    }
                }
            }
        }
    }
}
