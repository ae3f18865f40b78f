use crate::router::full;
use crate::service::InternalResponse;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::error;
use tracing::instrument;

const CONTENT_TYPE_HEADER_NAME: &str = "content-type";
const CONTENT_TYPE_HEADER_VALUE: &str = "text/plain; charset=utf-8";
const SERVER_TIMING_HEADER_NAME: &str = "Server-Timing";

pub type ResultResponse =
    Result<Response<BoxBody<Bytes, hyper::Error>>, Box<dyn error::Error + Send + Sync>>;

#[instrument(skip(response))]
pub fn transform(response: InternalResponse) -> ResultResponse {
    match response {
        Ok(summary) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE_HEADER_NAME, CONTENT_TYPE_HEADER_VALUE)
            .header(
                SERVER_TIMING_HEADER_NAME,
                summary.server_timing.to_string(),
            )
            .body(full(summary.to_string()))?),
        Err(e) => Ok(e.handle()?),
    }
}
