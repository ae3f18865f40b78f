use std::sync::Arc;

use crate::domain::error::PipelineError;
use crate::domain::error::PipelineError::{NotificationError, PayloadTooLargeError};
use crate::observability::propagators::HyperHeaderExtractor;
use crate::repository::ObjectRepository;
use crate::response_handler::{transform, ResultResponse};
use crate::service::{process_notification, ThumbnailPipeline};
use http_body_util::{combinators::BoxBody, BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use opentelemetry::Context;
use std::error;
use tracing::{instrument, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt;

const MAX_NOTIFICATION_BYTES: usize = 1024 * 1024;

#[instrument(skip(req, pipeline), fields(method = %req.method(), path = %req.uri().path()))]
pub async fn router<R>(
    req: Request<hyper::body::Incoming>,
    pipeline: Arc<ThumbnailPipeline<R>>,
) -> ResultResponse
where
    R: ObjectRepository + Send + Sync,
{
    let context: Context = opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(&HyperHeaderExtractor(req.headers()))
    });
    tracing::Span::current().set_parent(context);

    let (method, path) = (req.method().clone(), req.uri().path().to_owned());
    match (method, path.as_str()) {
        (Method::GET, "/private/status") => Ok(Response::new(full("OK"))),
        (Method::POST, "/") => match read_body(req.into_body(), MAX_NOTIFICATION_BYTES).await {
            Ok(body) => transform(process_notification(&body, &pipeline).await),
            Err(e) => transform(Err(e)),
        },
        _ => {
            let mut not_found = Response::new(full("Endpoint not found"));
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Ok(not_found)
        }
    }
}

/// Collects a request body, refusing it once more than `limit` bytes have arrived.
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, PipelineError>
where
    B: Body,
    B::Error: Into<Box<dyn error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!(limit, "Notification payload too large");
            Err(PayloadTooLargeError { limit })
        }
        Err(e) => Err(NotificationError {
            reason: e.to_string(),
        }),
    }
}

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}
