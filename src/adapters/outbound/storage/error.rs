use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

use crate::domain::errors::ValidationError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error code S3 compatible services report for a missing object
pub const NO_SUCH_KEY: &str = "NoSuchKey";

/// Structured error returned by the storage service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: Option<String>,
    pub status_code: Option<u16>,
    pub request_id: Option<String>,
    pub bucket_name: String,
    pub key: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, bucket_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: None,
            status_code: None,
            request_id: None,
            bucket_name: bucket_name.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for ErrorResponse {}

#[derive(ThisError, Debug)]
pub enum BucketError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to create default transport: {source}")]
    Transport {
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    Response(ErrorResponse),

    #[error("{operation} request failed: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("object '{key}' in bucket '{bucket_name}' has no etag")]
    MissingEtag { bucket_name: String, key: String },

    #[error("listing objects from bucket '{bucket_name}' failed: {source}")]
    Listing {
        bucket_name: String,
        #[source]
        source: Box<BucketError>,
    },

    #[error("destination '{}' is a directory", path.display())]
    InvalidDestination { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error raised by a visit callback; passed through as-is
    #[error("{0}")]
    Callback(#[source] BoxError),
}

impl BucketError {
    /// Wrap any error so a visit callback can return it
    pub fn callback<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        BucketError::Callback(err.into())
    }

    /// The service error response carried by this error, if any
    pub fn error_response(&self) -> Option<&ErrorResponse> {
        match self {
            BucketError::Response(resp) => Some(resp),
            BucketError::Listing { source, .. } => source.error_response(),
            BucketError::Callback(inner) => inner
                .downcast_ref::<BucketError>()
                .and_then(BucketError::error_response)
                .or_else(|| inner.downcast_ref::<ErrorResponse>()),
            _ => None,
        }
    }

    /// Convert an SDK failure into a bucket error.
    ///
    /// Service errors keep their code; HEAD responses have no body, so a
    /// bare 404 on an object is reported as `NoSuchKey`.
    pub(crate) fn from_sdk<E>(
        err: SdkError<E, HttpResponse>,
        operation: &'static str,
        bucket_name: &str,
        key: Option<&str>,
    ) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let SdkError::ServiceError(context) = err else {
            return BucketError::Request {
                operation,
                source: Box::new(err),
            };
        };

        let status = context.raw().status().as_u16();
        let request_id = context
            .raw()
            .headers()
            .get("x-amz-request-id")
            .map(str::to_owned);
        let service_err = context.err();

        let code = match (service_err.code(), status, key) {
            (None | Some("NotFound"), 404, Some(_)) => NO_SUCH_KEY.to_string(),
            (None | Some("NotFound"), 404, None) => "NoSuchBucket".to_string(),
            (Some(code), _, _) => code.to_string(),
            (None, status, _) => status_code_text(status),
        };

        BucketError::Response(ErrorResponse {
            code,
            message: service_err.message().map(str::to_owned),
            status_code: Some(status),
            request_id,
            bucket_name: bucket_name.to_string(),
            key: key.map(str::to_owned),
        })
    }
}

fn status_code_text(status: u16) -> String {
    match status {
        304 => "NotModified".to_string(),
        403 => "AccessDenied".to_string(),
        412 => "PreconditionFailed".to_string(),
        _ => http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(|reason| reason.replace(' ', ""))
            .unwrap_or_else(|| status.to_string()),
    }
}

/// Whether `err` is, or wraps, a service response with code `NoSuchKey`.
///
/// The first error response found in the source chain decides.
pub fn is_not_found(err: &(dyn std::error::Error + 'static)) -> bool {
    std::iter::successors(Some(err), |e| e.source())
        .find_map(|e| {
            e.downcast_ref::<ErrorResponse>().or_else(|| {
                e.downcast_ref::<BucketError>()
                    .and_then(BucketError::error_response)
            })
        })
        .is_some_and(|resp| resp.code == NO_SUCH_KEY)
}
