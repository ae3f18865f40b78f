use crate::domain::error::PipelineError::{
    DecodeError, EncodeError, FetchError, InvalidKeyError, NotificationError,
    PayloadTooLargeError, ResizeError, StagingError, StoreError,
};
use crate::router::full;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum PipelineError {
    StagingError { path: String, reason: String },
    FetchError { bucket: String, key: String, reason: String },
    DecodeError { key: String, reason: String },
    InvalidKeyError { key: String },
    ResizeError { key: String, size: u32, reason: String },
    EncodeError { key: String, size: u32, reason: String },
    StoreError { bucket: String, key: String, reason: String },
    NotificationError { reason: String },
    PayloadTooLargeError { limit: usize },
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingError { path, reason } => write!(f, "Could not stage {path}: {reason}"),
            FetchError {
                bucket,
                key,
                reason,
            } => write!(f, "Could not fetch {bucket}/{key}: {reason}"),
            DecodeError { key, reason } => write!(f, "Image {key} could not be decoded: {reason}"),
            InvalidKeyError { key } => write!(
                f,
                "Key {key} needs at least 3 path segments to derive a thumbnail key"
            ),
            ResizeError { key, size, reason } => {
                write!(f, "Image {key} could not be resized to {size}: {reason}")
            }
            EncodeError { key, size, reason } => {
                write!(f, "Thumbnail {size} of {key} could not be encoded: {reason}")
            }
            StoreError {
                bucket,
                key,
                reason,
            } => write!(f, "Could not store {bucket}/{key}: {reason}"),
            NotificationError { reason } => write!(f, "Malformed notification: {reason}"),
            PayloadTooLargeError { limit } => {
                write!(f, "Notification exceeds the {limit} byte limit")
            }
        }
    }
}

impl PipelineError {
    pub fn handle(&self) -> hyper::http::Result<Response<BoxBody<Bytes, hyper::Error>>> {
        match self {
            NotificationError { .. } => error_response(StatusCode::BAD_REQUEST, self.to_string()),
            PayloadTooLargeError { .. } => {
                error_response(StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        }
    }
}

impl error::Error for PipelineError {}

fn error_response(
    status_code: StatusCode,
    message: String,
) -> hyper::http::Result<Response<BoxBody<Bytes, hyper::Error>>> {
    Response::builder().status(status_code).body(full(message))
}
