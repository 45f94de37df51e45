use std::time::Duration;

use async_trait::async_trait;

use super::client::HttpClient;

/// Both upstreams normally answer in well under a second; anything past
/// this is a hung connection, not a slow one.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        // Same contract as `reqwest::Client::new`: constructing the client
        // only fails when the TLS backend cannot initialize.
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build http client");
        Self(client)
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
