use async_trait::async_trait;
use std::path::Path;

use crate::adapters::outbound::storage::BucketError;

/// Callback invoked for every listed object with its key and etag.
///
/// Returning an error stops the traversal; the error is handed back to
/// the caller of [`BucketClient::visit_objects`] untouched.
pub type VisitFn<'a> = dyn FnMut(&str, &str) -> Result<(), BucketError> + Send + 'a;

/// Port implemented by every bucket provider client.
/// Callers fetch through this interface regardless of the backing service.
#[async_trait]
pub trait BucketClient: Send + Sync {
    /// Download `object_name` to `local_path`, returning the etag that was fetched
    async fn fget_object(
        &self,
        bucket_name: &str,
        object_name: &str,
        local_path: &Path,
    ) -> Result<String, BucketError>;

    /// Call `visit` for every object under `prefix`, recursively
    async fn visit_objects(
        &self,
        bucket_name: &str,
        prefix: &str,
        visit: &mut VisitFn<'_>,
    ) -> Result<(), BucketError>;

    /// Whether `err` reports a missing object
    fn object_is_not_found(&self, err: &BucketError) -> bool;

    /// Release the client
    async fn close(&self);
}
