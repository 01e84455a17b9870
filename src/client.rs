//! High-level client for one forum account and, optionally, one thread.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::actions::{self, PostEdit};
use crate::config::Config;
use crate::crawler::{PostStream, ThreadContext, ThreadCrawler};
use crate::error::{Result, ScrapeError};
use crate::http::{
    AuthenticatedExecutor, Credentials, Endpoints, HttpRequest, ReqwestTransport, SessionStore,
    Transport,
};
use crate::models::ActingAccount;
use crate::parsing::ThreadPage;

/// Forum client bound to the configured account.
///
/// Every operation takes `&mut self`, so a client never has more than one
/// request in flight.
pub struct ForumClient {
    executor: AuthenticatedExecutor,
    context: ThreadContext,
    account: ActingAccount,
    page_backup_dir: Option<PathBuf>,
}

impl ForumClient {
    /// Create a client that talks to the forum over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, the base URL is
    /// invalid, or a saved session cannot be read.
    pub async fn new(config: &Config, thread_id: Option<String>) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Self::with_transport(config, thread_id, Box::new(transport)).await
    }

    /// Create a client over a custom transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or a saved session cannot
    /// be read.
    pub async fn with_transport(
        config: &Config,
        thread_id: Option<String>,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        let executor = AuthenticatedExecutor::open(
            transport,
            SessionStore::new(&config.cookies_file_path),
            Credentials::new(config.username.clone(), config.password.clone()),
            Endpoints::new(&config.base_url)?,
        )
        .await?;

        Ok(Self {
            executor,
            context: ThreadContext {
                thread_id,
                user_id_filter: None,
            },
            account: ActingAccount::new(config.username.clone()),
            page_backup_dir: config.page_backup_dir.clone(),
        })
    }

    #[must_use]
    pub fn thread_id(&self) -> Option<&str> {
        self.context.thread_id.as_deref()
    }

    #[must_use]
    pub fn account(&self) -> &ActingAccount {
        &self.account
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.executor.is_logged_in()
    }

    /// Crawler over this client's thread.
    pub fn crawler(&mut self) -> ThreadCrawler<'_> {
        ThreadCrawler::new(&mut self.executor, self.context.clone())
            .with_account(self.account.clone())
            .with_page_backup_dir(self.page_backup_dir.clone())
    }

    pub fn posts(&mut self) -> PostStream<'_> {
        self.crawler().posts()
    }

    /// Posts by people, excluding Adbot and the acting account.
    pub fn user_posts(&mut self) -> PostStream<'_> {
        self.crawler().user_posts()
    }

    pub fn bot_posts(&mut self) -> PostStream<'_> {
        self.crawler().bot_posts()
    }

    pub fn my_posts(&mut self, after: NaiveDateTime) -> PostStream<'_> {
        self.crawler().my_posts(after)
    }

    pub fn posts_by_user(&mut self, user_id: impl Into<String>) -> PostStream<'_> {
        self.crawler().posts_by_user(user_id)
    }

    /// One page of the thread with the discovered page count.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no thread id or the request fails.
    pub async fn page(&mut self, page_number: u32) -> Result<ThreadPage> {
        self.crawler().page(page_number).await
    }

    /// # Errors
    ///
    /// Returns an error if there is no thread id or a request fails.
    pub async fn reply(&mut self, text: &str) -> Result<String> {
        actions::reply(&mut self.executor, self.context.thread_id.as_deref(), text).await
    }

    /// # Errors
    ///
    /// Returns an error if the edit is ambiguous or a request fails.
    pub async fn edit(&mut self, edit: PostEdit) -> Result<String> {
        actions::edit(&mut self.executor, edit).await
    }

    /// Raw HTML of a member's profile page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn fetch_profile(&mut self, user_id: &str) -> Result<String> {
        let url = self.executor.endpoints().member_profile(user_id);
        self.executor.execute(HttpRequest::get(url)).await
    }

    /// The `forums` array of the forum index JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the JSON has no `forums`
    /// array.
    pub async fn fetch_mods_and_forums(&mut self) -> Result<Vec<Value>> {
        let url = self.executor.endpoints().forums_json();
        let mut index: Value = self.executor.execute_json(HttpRequest::get(url)).await?;

        match index.get_mut("forums").map(Value::take) {
            Some(Value::Array(forums)) => Ok(forums),
            _ => Err(ScrapeError::InvalidResponse(
                "forum index has no forums array".to_string(),
            )),
        }
    }
}
