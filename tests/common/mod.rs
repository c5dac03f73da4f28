//! In-process S3 stand-in for exercising the client over real HTTP.
#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::Response,
    routing::get,
};
use bucket_client::{BucketSpec, ClientOptions, S3BucketClient};
use bytes::Bytes;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Objects returned per listing page
pub const PAGE_SIZE: usize = 2;

pub fn etag_of(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

#[derive(Default)]
struct MockState {
    buckets: BTreeMap<String, BTreeMap<String, Bytes>>,
    replace_after_head: HashMap<(String, String), Bytes>,
    denied: HashSet<String>,
    requests: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockS3 {
    state: Arc<Mutex<MockState>>,
}

impl MockS3 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_bucket(&self, bucket: &str) {
        let mut state = self.state.lock().unwrap();
        state.buckets.entry(bucket.to_string()).or_default();
    }

    pub fn put(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let mut state = self.state.lock().unwrap();
        state
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
    }

    /// Swap the object's content as soon as a HEAD for it has been answered
    pub fn replace_after_head(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let mut state = self.state.lock().unwrap();
        state
            .replace_after_head
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    /// Answer every listing of `bucket` with AccessDenied
    pub fn deny(&self, bucket: &str) {
        self.state.lock().unwrap().denied.insert(bucket.to_string());
    }

    /// Method and path-and-query of every request received so far
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub async fn start(&self) -> SocketAddr {
        let router = Router::new()
            .route("/{bucket}", get(list_objects))
            .route("/{bucket}/", get(list_objects))
            .route("/{bucket}/{*key}", get(object))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn record(&self, method: &Method, uri: &Uri) {
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        self.state
            .lock()
            .unwrap()
            .requests
            .push(format!("{} {}", method, target));
    }
}

/// Anonymous plain-HTTP client for a mock listening on `addr`
pub async fn client(addr: SocketAddr) -> S3BucketClient {
    client_with(addr, ClientOptions::default()).await
}

pub async fn client_with(addr: SocketAddr, options: ClientOptions) -> S3BucketClient {
    let spec = BucketSpec::new(addr.to_string()).with_insecure(true);
    S3BucketClient::new(&spec, options).await.unwrap()
}

async fn list_objects(
    State(mock): State<MockS3>,
    method: Method,
    uri: Uri,
    Path(bucket): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.record(&method, &uri);

    let state = mock.state.lock().unwrap();
    if state.denied.contains(&bucket) {
        return error_response(StatusCode::FORBIDDEN, "AccessDenied", "Access Denied");
    }
    let Some(objects) = state.buckets.get(&bucket) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "NoSuchBucket",
            "The specified bucket does not exist",
        );
    };

    let prefix = params.get("prefix").cloned().unwrap_or_default();
    let v2 = params.get("list-type").is_some_and(|v| v == "2");
    let after = if v2 {
        params
            .get("continuation-token")
            .or_else(|| params.get("start-after"))
    } else {
        params.get("marker")
    };

    let matching: Vec<(&String, &Bytes)> = objects
        .iter()
        .filter(|(key, _)| key.starts_with(&prefix))
        .filter(|(key, _)| after.map_or(true, |after| key.as_str() > after.as_str()))
        .collect();
    let truncated = matching.len() > PAGE_SIZE;
    let page = &matching[..matching.len().min(PAGE_SIZE)];

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .unwrap();
    writer
        .create_element("ListBucketResult")
        .with_attribute(("xmlns", "http://s3.amazonaws.com/doc/2006-03-01/"))
        .write_inner_content(|w| {
            text_element(w, "Name", &bucket)?;
            text_element(w, "Prefix", &prefix)?;
            text_element(w, "MaxKeys", "1000")?;
            if v2 {
                text_element(w, "KeyCount", &page.len().to_string())?;
            }
            text_element(w, "IsTruncated", if truncated { "true" } else { "false" })?;
            for (key, data) in page {
                w.create_element("Contents").write_inner_content(|w| {
                    text_element(w, "Key", key)?;
                    text_element(w, "ETag", &format!("\"{}\"", etag_of(data)))?;
                    text_element(w, "Size", &data.len().to_string())?;
                    text_element(w, "StorageClass", "STANDARD")?;
                    Ok::<(), quick_xml::Error>(())
                })?;
            }
            // V1 only sends NextMarker alongside a delimiter
            if v2 && truncated {
                if let Some((last, _)) = page.last() {
                    text_element(w, "NextContinuationToken", last)?;
                }
            }
            Ok::<(), quick_xml::Error>(())
        })
        .unwrap();

    xml_response(StatusCode::OK, writer.into_inner().into_inner())
}

async fn object(
    State(mock): State<MockS3>,
    method: Method,
    uri: Uri,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    mock.record(&method, &uri);

    let mut state = mock.state.lock().unwrap();
    let Some(data) = state
        .buckets
        .get(&bucket)
        .and_then(|objects| objects.get(&key))
        .cloned()
    else {
        if method == Method::HEAD {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Body::empty())
                .unwrap();
        }
        return error_response(
            StatusCode::NOT_FOUND,
            "NoSuchKey",
            "The specified key does not exist.",
        );
    };
    let etag = etag_of(&data);

    if method == Method::HEAD {
        if let Some(replacement) = state
            .replace_after_head
            .remove(&(bucket.clone(), key.clone()))
        {
            state
                .buckets
                .entry(bucket)
                .or_default()
                .insert(key, replacement);
        }
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::ETAG, format!("\"{}\"", etag))
            .header(header::CONTENT_LENGTH, data.len())
            .body(Body::empty())
            .unwrap();
    }

    let if_match = headers
        .get(header::IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_matches('"').to_string());
    if if_match.is_some_and(|expected| expected != etag) {
        return error_response(
            StatusCode::PRECONDITION_FAILED,
            "PreconditionFailed",
            "At least one of the pre-conditions you specified did not hold",
        );
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::ETAG, format!("\"{}\"", etag))
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(data))
        .unwrap()
}

fn text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .unwrap();
    writer
        .create_element("Error")
        .write_inner_content(|w| {
            text_element(w, "Code", code)?;
            text_element(w, "Message", message)?;
            text_element(w, "RequestId", "mock-request")?;
            Ok::<(), quick_xml::Error>(())
        })
        .unwrap();

    let mut response = xml_response(status, writer.into_inner().into_inner());
    response
        .headers_mut()
        .insert("x-amz-request-id", "mock-request".parse().unwrap());
    response
}

fn xml_response(status: StatusCode, body: Vec<u8>) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/xml")
        .body(Body::from(body))
        .unwrap()
}
