pub mod bucket;
pub mod object;
pub mod secret;

pub use bucket::{BucketProvider, BucketSpec, DEFAULT_REGION};
pub use object::{ObjectEntry, quote_etag, trim_etag};
pub use secret::{ACCESS_KEY_FIELD, CA_CERT_FIELD, SECRET_KEY_FIELD, Secret, validate_secret};
