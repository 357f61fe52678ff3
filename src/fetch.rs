//! HTTP client for the courseware REST API
//!
//! Every request goes through [`FetchBuilder`], which attaches the session's
//! bearer token and turns a 401 answer into a logout plus a trip to the
//! login page before handing the error back to the caller.

use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::router::{Navigator, LOGIN_PATH};
use crate::session::Session;

/// Shared HTTP client. Cloning is cheap and clones share the session.
#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    session: Session,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a new ApiClient
    pub fn new(
        base_url: &str,
        session: Session,
        navigator: Arc<dyn Navigator>,
        options: &ClientOptions,
    ) -> Result<Self> {
        Ok(Self {
            http_client: options.http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    /// The session this client reads its token from
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start a request against a path below the base URL
    pub fn request(&self, method: Method, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, method, path)
    }

    /// GET and decode JSON
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path).execute().await
    }

    /// GET with query parameters and decode JSON
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.request(Method::GET, path).query(query).execute().await
    }

    /// POST a JSON body and decode JSON
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path).json(body)?.execute().await
    }

    /// POST without a body, parameters in the query string
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.request(Method::POST, path).query(query).execute().await
    }

    /// POST a multipart form and decode JSON
    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        self.request(Method::POST, path).multipart(form).execute().await
    }

    /// PATCH a JSON body and decode JSON
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path).json(body)?.execute().await
    }

    /// DELETE, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path).execute_unit().await
    }

    fn handle_unauthorized(&self) {
        log::warn!("Session rejected by the server, signing out");
        self.session.clear();
        self.navigator.navigate(LOGIN_PATH);
    }
}

enum Body {
    Empty,
    Json(Vec<u8>),
    Multipart(Form),
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    api: &'a ApiClient,
    method: Method,
    path: String,
    query_params: Vec<(String, String)>,
    body: Body,
}

impl<'a> FetchBuilder<'a> {
    fn new(api: &'a ApiClient, method: Method, path: &str) -> Self {
        Self {
            api,
            method,
            path: path.to_string(),
            query_params: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Append query parameters, in order
    pub fn query(mut self, params: &[(&str, String)]) -> Self {
        self.query_params
            .extend(params.iter().map(|(key, value)| (key.to_string(), value.clone())));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Body::Json(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Add a multipart body to the request
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Body::Multipart(form);
        self
    }

    fn build(self) -> Result<RequestBuilder> {
        let mut url = Url::parse(&format!("{}{}", self.api.base_url, self.path))?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.api.http_client.request(self.method, url);

        if let Some(token) = self.api.session.token() {
            req = req.bearer_auth(token);
        }

        req = match self.body {
            Body::Empty => req,
            Body::Json(bytes) => req.header("Content-Type", "application/json").body(bytes),
            Body::Multipart(form) => req.multipart(form),
        };

        Ok(req)
    }

    /// Execute the request and return the raw response.
    ///
    /// Non-success statuses become [`Error::Api`]. A 401 additionally ends the
    /// session and navigates to the login page, once per response.
    pub async fn send(self) -> Result<Response> {
        let api = self.api;
        let label = format!("{} {}", self.method, self.path);
        let req = self.build()?;

        log::debug!("{}", label);
        let response = req.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        log::debug!("{} failed with status {}", label, status);

        if status == StatusCode::UNAUTHORIZED {
            api.handle_unauthorized();
        }

        Err(Error::api(status, error_message(status, &text)))
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.send().await?;
        let result = response.json::<T>().await?;
        Ok(result)
    }

    /// Execute the request and discard the response body
    pub async fn execute_unit(self) -> Result<()> {
        self.send().await?;
        Ok(())
    }
}

/// Pull a readable message out of an error body.
///
/// The backend reports errors as `{"detail": ...}`; anything else is passed
/// through as text.
fn error_message(status: StatusCode, text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        match value.get("detail") {
            Some(Value::String(detail)) => return detail.clone(),
            Some(detail) => return detail.to_string(),
            None => {}
        }
    }

    if text.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        text.to_string()
    }
}
