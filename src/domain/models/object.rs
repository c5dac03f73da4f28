/// An object reported by a bucket listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    /// Entity tag without surrounding quotes
    pub etag: String,
    pub size: Option<i64>,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            etag: etag.into(),
            size: None,
        }
    }
}

/// Strip the quotes S3 puts around entity tags
pub fn trim_etag(etag: &str) -> &str {
    let etag = etag.strip_prefix('"').unwrap_or(etag);
    etag.strip_suffix('"').unwrap_or(etag)
}

/// Quote an entity tag for use in a conditional request header
pub fn quote_etag(etag: &str) -> String {
    format!("\"{}\"", trim_etag(etag))
}
