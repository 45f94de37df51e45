use async_trait::async_trait;
use reqwest::{Request, Response};

/// Minimal HTTP execution seam. Production code uses [`super::BasicClient`];
/// tests implement this with canned responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
