//! HTTP access to the two upstream endpoints behind a small client trait,
//! so tests and offline runs can substitute canned bytes.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, ensure};

/// Fetches the full body at `url` as raw bytes.
///
/// Both upstreams serve opaque payloads (a zip archive and a protobuf
/// message), so decoding is left to the caller.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid url: {url}"))?,
    );

    let resp = client.execute(req).await?;
    ensure!(
        resp.status().is_success(),
        "request to {url} failed with status {}",
        resp.status()
    );
    Ok(resp.bytes().await?.to_vec())
}
