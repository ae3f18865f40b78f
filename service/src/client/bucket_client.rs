use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::Duration;
use tracing::info;

/// Characters left as-is in object paths; `/` keeps the key's hierarchy.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn bucket_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    info!("Initializing bucket client.");
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .build()
}

pub fn object_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        endpoint.trim_end_matches('/'),
        utf8_percent_encode(bucket, PATH_SET),
        utf8_percent_encode(key, PATH_SET)
    )
}
