use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::common::BodyPreview;
use super::error::ApiError;

/// Polaris API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

/// Authorization scheme sent with a request.
///
/// Reads and creates authenticate with HTTP Basic (the key as username, empty
/// password); updates and deletes send the raw key as a Bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Bearer,
}

impl AuthScheme {
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::PUT || *method == Method::DELETE {
            AuthScheme::Bearer
        } else {
            AuthScheme::Basic
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new API client. `base_url` is used verbatim apart from a
    /// trailing slash; validation happens in provider configuration.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("terraform-provider-polaris/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("{} request to: {}", method, url);

        let scheme = AuthScheme::for_method(&method);
        let builder = self
            .inner
            .http_client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");

        let key = self.inner.api_key.expose_secret();
        match scheme {
            AuthScheme::Basic => builder.basic_auth(key, Some("")),
            AuthScheme::Bearer => builder.bearer_auth(key),
        }
    }

    /// Execute a GET request; the caller inspects the status
    pub async fn get(&self, path: &str) -> Result<Response, ApiError> {
        Ok(self.request(Method::GET, path).send().await?)
    }

    /// Execute a POST request with a JSON body
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        Ok(self.request(Method::POST, path).json(body).send().await?)
    }

    /// Execute a PUT request with a JSON body
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        Ok(self.request(Method::PUT, path).json(body).send().await?)
    }

    /// Execute a DELETE request without a body
    pub async fn delete(&self, path: &str) -> Result<Response, ApiError> {
        Ok(self.request(Method::DELETE, path).send().await?)
    }
}

/// Reads the body and fails unless the status is exactly `expected`
pub(crate) async fn expect_status(
    response: Response,
    expected: StatusCode,
) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    tracing::debug!("Response status: {}", status);

    if status != expected {
        tracing::debug!("Unexpected response body: {}", BodyPreview(&body));
        return Err(ApiError::unexpected_status(status.as_u16(), body));
    }
    Ok(body)
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}", e);
        ApiError::ParseError(e.to_string())
    })
}
