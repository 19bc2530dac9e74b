use std::time::Duration;

use reqwest::{IntoUrl, Method, RequestBuilder};

const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);
static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct ShieldApiClient {
    base_uri: reqwest::Url,
}

impl ShieldApiClient {
    pub fn new(base_uri: impl IntoUrl) -> Self {
        ShieldApiClient { base_uri: base_uri.into_url().expect("invalid control server address") }
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.base_uri.join(path).expect("invalid request path");

        let client = reqwest::ClientBuilder::new()
            .user_agent(APP_USER_AGENT)
            .timeout(HTTP_CLIENT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        tracing::debug!("sending HTTP {method} request to '{url}'");
        client.request(method, url)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }
}

pub fn format_http_error(err: reqwest::Error) -> String {
    if err.is_decode() {
        format!("request to control server failed to decode: {err:?}")
    } else {
        format!("request to control server failed: {err}")
    }
}
