mod bucket_client;

pub use bucket_client::{BucketClient, VisitFn};
