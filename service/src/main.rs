use crate::client::bucket_client::bucket_client;
use crate::config::Config;
use crate::logging::logger_setup;
use crate::repository::bucket_repository::BucketRepository;
use crate::repository::scratch_repository::ScratchRepository;
use crate::router::router;
use crate::service::ThumbnailPipeline;
use anyhow::Context;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

mod client;
mod config;
mod domain;
mod image_service;
mod logging;
mod observability;
mod repository;
mod response_handler;
mod router;
mod service;

#[derive(Clone)]
pub struct TokioExecutor;

impl<F> hyper::rt::Executor<F> for TokioExecutor
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    fn execute(&self, fut: F) {
        tokio::task::spawn(fut);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _tracer_provider = logger_setup(&config)?;
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("A rustls crypto provider was already installed");
    }

    let client = bucket_client(Duration::from_secs(config.store_timeout_secs))
        .context("Could not build the bucket client")?;
    let repository = Arc::new(BucketRepository::new(client, &config.store_endpoint));
    let pipeline = Arc::new(ThumbnailPipeline::new(
        repository,
        ScratchRepository::new(&config.scratch_dir),
        config.sizes.clone(),
        config.on_decode_error,
    ));
    info!(
        sizes = ?config.sizes,
        on_decode_error = ?config.on_decode_error,
        scratch_dir = %config.scratch_dir.display(),
        "Pipeline configured"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Attempting to start server at {addr}");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Could not bind {addr}"))?;
    info!("Server started at {addr}");

    loop {
        let (stream, _) = listener.accept().await?;

        let io = TokioIo::new(stream);
        let pipeline = pipeline.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| router(req, pipeline.clone()));
            if let Err(err) = auto::Builder::new(TokioExecutor)
                .serve_connection(io, service)
                .await
            {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}
