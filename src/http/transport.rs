//! The HTTP boundary.
//!
//! The executor only needs to send a GET or a form POST with a cookie bag and
//! read back status, headers and body. [`Transport`] is that seam;
//! [`ReqwestTransport`] is the production implementation.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::redirect::Policy;
use tracing::trace;

use crate::config::Config;
use crate::error::Result;
use crate::http::session::CookieJar;
use crate::parsing::decode_body;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Description of one request. The executor adds the cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// URL-encoded form fields, only sent with POST.
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            form: Vec::new(),
        }
    }

    #[must_use]
    pub fn post_form<K, V>(url: impl Into<String>, form: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: Method::Post,
            url: url.into(),
            form: form
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A response with every header kept, since login needs `Location` and
/// `Set-Cookie`.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Lowercase header names, in the order received.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First header with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers with the given name (case-insensitive).
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded to UTF-8 according to its charset tag.
    #[must_use]
    pub fn text(&self) -> String {
        decode_body(&self.body, self.header(CONTENT_TYPE.as_str()))
    }
}

/// Sends requests on behalf of the executor.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request with the given cookies. Redirects must not be followed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed.
    async fn send(&self, request: &HttpRequest, cookies: Option<&CookieJar>) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the configured timeout and user agent.
    ///
    /// Redirects are disabled so the login redirect can be inspected.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest, cookies: Option<&CookieJar>) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url).form(&request.form),
        };

        if let Some(header) = cookies.and_then(CookieJar::header_value) {
            builder = builder.header(COOKIE, header);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        trace!(url = %request.url, status, "Received response");

        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
