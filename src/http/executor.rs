//! Authenticated request execution.
//!
//! The executor owns the session. Before every request it makes sure the
//! client is logged in, and after every request it checks whether the forum
//! quietly served the logged-out version of the page. When that happens the
//! saved session is discarded and a fresh login is performed right away.
//!
//! The request that hit the expired session is *not* replayed: its caller gets
//! the logged-out body, and only later calls see the new session.

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{Result, ScrapeError};
use crate::http::endpoints::Endpoints;
use crate::http::session::{CookieJar, SessionStore};
use crate::http::transport::{HttpRequest, Transport};

/// Text that only appears on pages served to logged-out visitors.
pub const LOGGED_OUT_TRIGGER_TEXT: &str = "CLICK HERE TO REGISTER YOUR ACCOUNT";

/// Present in the login redirect target when the forum rejects credentials.
const LOGIN_ERROR_MARKER: &str = "loginerror";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

/// Username and password used to log in.
#[derive(Clone, Default)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// Both values, unless either is missing or whitespace-only.
    fn usable(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|u| !u.trim().is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.trim().is_empty())?;
        Some((username, password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Sends requests with the current session, logging in as needed.
pub struct AuthenticatedExecutor {
    transport: Box<dyn Transport>,
    store: SessionStore,
    cookies: Option<CookieJar>,
    credentials: Credentials,
    endpoints: Endpoints,
}

impl AuthenticatedExecutor {
    /// Create an executor, picking up any session saved in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing cookie file cannot be read.
    pub async fn open(
        transport: Box<dyn Transport>,
        store: SessionStore,
        credentials: Credentials,
        endpoints: Endpoints,
    ) -> Result<Self> {
        let cookies = store.load().await?;
        debug!(
            path = %store.path().display(),
            logged_in = cookies.is_some(),
            "Opened session"
        );

        Ok(Self {
            transport,
            store,
            cookies,
            credentials,
            endpoints,
        })
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.cookies.is_some() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state() == SessionState::LoggedIn
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a request with the session cookies and return the decoded body.
    ///
    /// # Errors
    ///
    /// Returns an error if logging in fails or the transport fails.
    pub async fn execute(&mut self, request: HttpRequest) -> Result<String> {
        self.ensure_logged_in().await?;

        let response = self.transport.send(&request, self.cookies.as_ref()).await?;
        let body = response.text();

        if body.contains(LOGGED_OUT_TRIGGER_TEXT) {
            warn!(url = %request.url, "Session expired, logging in again");
            self.expire_session().await?;
            self.log_in().await?;
        }

        Ok(body)
    }

    /// Like [`execute`](Self::execute), parsing the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not valid JSON
    /// for `T`.
    pub async fn execute_json<T: DeserializeOwned>(&mut self, request: HttpRequest) -> Result<T> {
        let body = self.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn ensure_logged_in(&mut self) -> Result<()> {
        if self.cookies.is_none() {
            self.log_in().await?;
        }
        Ok(())
    }

    /// Log in with the configured credentials and save the new session.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Configuration`] if username or password is blank
    /// - [`ScrapeError::Authentication`] if the forum rejects the login
    /// - [`ScrapeError::Protocol`] on an unexpected response status
    pub async fn log_in(&mut self) -> Result<()> {
        let Some((username, password)) = self.credentials.usable() else {
            return Err(ScrapeError::Configuration(
                "credentials missing: set SA_USERNAME and SA_PASSWORD".to_string(),
            ));
        };

        info!(username = %username, "Logging in");
        let request = HttpRequest::post_form(
            self.endpoints.login(),
            [
                ("action", "login"),
                ("username", username),
                ("password", password),
            ],
        );
        let response = self.transport.send(&request, None).await?;

        match response.status {
            302 => {
                let Some(location) = response.header("location") else {
                    return Err(ScrapeError::Protocol(
                        "login redirect without a Location header".to_string(),
                    ));
                };
                if location.contains(LOGIN_ERROR_MARKER) {
                    return Err(ScrapeError::Authentication(format!(
                        "redirected to {location}"
                    )));
                }

                let jar = CookieJar::from_set_cookie_headers(response.headers_named("set-cookie"));
                if jar.is_empty() {
                    warn!("Login succeeded but the forum set no cookies");
                }
                self.store.save(&jar).await?;
                self.cookies = Some(jar);
                info!("Logged in");
                Ok(())
            }
            status => Err(ScrapeError::Protocol(format!(
                "unhandled response code {status}"
            ))),
        }
    }

    async fn expire_session(&mut self) -> Result<()> {
        self.cookies = None;
        self.store.truncate().await
    }
}
