//! Thread crawling.
//!
//! A crawl reads page 1 to learn the thread's page count, then walks the
//! remaining pages in order. Posts come out as a stream that only fetches the
//! next page once the consumer has taken every post of the current one, so a
//! consumer that stops early never triggers more requests.

use std::path::{Path, PathBuf};

use async_stream::try_stream;
use chrono::NaiveDateTime;
use futures_util::future::ready;
use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::error::{Result, ScrapeError};
use crate::http::{AuthenticatedExecutor, HttpRequest};
use crate::models::{ActingAccount, Post};
use crate::parsing::{extract, posts_for_page, ThreadPage};

/// Lazily fetched posts of a thread.
pub type PostStream<'a> = BoxStream<'a, Result<Post>>;

/// Which thread to read, and optionally whose posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadContext {
    pub thread_id: Option<String>,
    /// Narrows the thread view to one poster on the server side.
    pub user_id_filter: Option<String>,
}

impl ThreadContext {
    #[must_use]
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            user_id_filter: None,
        }
    }

    #[must_use]
    pub fn with_user_filter(mut self, user_id: impl Into<String>) -> Self {
        self.user_id_filter = Some(user_id.into());
        self
    }

    /// # Errors
    ///
    /// Returns [`ScrapeError::Precondition`] when no thread id was given.
    pub fn require_thread_id(&self) -> Result<&str> {
        self.thread_id
            .as_deref()
            .ok_or_else(|| ScrapeError::Precondition("thread id required".to_string()))
    }
}

/// Reads the pages of one thread through an authenticated executor.
pub struct ThreadCrawler<'a> {
    executor: &'a mut AuthenticatedExecutor,
    context: ThreadContext,
    account: ActingAccount,
    page_backup_dir: Option<PathBuf>,
}

impl<'a> ThreadCrawler<'a> {
    #[must_use]
    pub fn new(executor: &'a mut AuthenticatedExecutor, context: ThreadContext) -> Self {
        Self {
            executor,
            context,
            account: ActingAccount::default(),
            page_backup_dir: None,
        }
    }

    /// Account used to tell bot, user and own posts apart.
    #[must_use]
    pub fn with_account(mut self, account: ActingAccount) -> Self {
        self.account = account;
        self
    }

    /// Write every fetched page into `dir`.
    #[must_use]
    pub fn with_page_backup_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.page_backup_dir = dir;
        self
    }

    #[must_use]
    pub fn context(&self) -> &ThreadContext {
        &self.context
    }

    /// Fetch the raw HTML of one page.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Precondition`] without any request when there
    /// is no thread id, or any executor error.
    pub async fn fetch_page(&mut self, page_number: u32) -> Result<String> {
        let thread_id = self.context.require_thread_id()?;
        let url = self.executor.endpoints().thread_page(
            thread_id,
            page_number,
            self.context.user_id_filter.as_deref(),
        );

        debug!(thread_id = %thread_id, page_number, "Fetching thread page");
        let html = self.executor.execute(HttpRequest::get(url)).await?;

        if let Some(dir) = &self.page_backup_dir {
            let name = backup_file_name(&self.context, page_number);
            if let Err(e) = write_backup(dir, &name, &html).await {
                warn!(dir = %dir.display(), file = %name, "Failed to back up page: {e}");
            }
        }

        Ok(html)
    }

    /// Fetch and parse one page, including the thread's page count.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_page`](Self::fetch_page).
    pub async fn page(&mut self, page_number: u32) -> Result<ThreadPage> {
        let html = self.fetch_page(page_number).await?;
        Ok(extract(&html))
    }

    /// Every post of the thread, page by page.
    #[must_use]
    pub fn posts(mut self) -> PostStream<'a> {
        try_stream! {
            let first = self.page(1).await?;
            let page_count = first.page_count;
            debug!(page_count, "Discovered thread page count");

            for post in first.posts {
                yield post;
            }

            for page_number in 2..=page_count {
                let html = self.fetch_page(page_number).await?;
                for post in posts_for_page(&html) {
                    yield post;
                }
            }
        }
        .boxed()
    }

    /// Posts not written by a bot or by the acting account.
    #[must_use]
    pub fn user_posts(self) -> PostStream<'a> {
        let account = self.account.clone();
        self.posts()
            .try_filter(move |post| ready(post.is_user(&account)))
            .boxed()
    }

    /// Posts written by Adbot or by the acting account.
    #[must_use]
    pub fn bot_posts(self) -> PostStream<'a> {
        let account = self.account.clone();
        self.posts()
            .try_filter(move |post| ready(post.is_bot(&account)))
            .boxed()
    }

    /// The acting account's posts made strictly after `after`.
    #[must_use]
    pub fn my_posts(self, after: NaiveDateTime) -> PostStream<'a> {
        let account = self.account.clone();
        self.posts()
            .try_filter(move |post| ready(post.timestamp > after && post.is_mine(&account)))
            .boxed()
    }

    /// Posts by one member, filtered by the forum itself so only that
    /// member's pages are fetched.
    #[must_use]
    pub fn posts_by_user(mut self, user_id: impl Into<String>) -> PostStream<'a> {
        self.context.user_id_filter = Some(user_id.into());
        self.posts()
    }
}

fn backup_file_name(context: &ThreadContext, page_number: u32) -> String {
    let thread = sanitize(context.thread_id.as_deref().unwrap_or("none"));
    match context.user_id_filter.as_deref() {
        Some(user) => format!("thread-{thread}-user-{}-page-{page_number}.html", sanitize(user)),
        None => format!("thread-{thread}-page-{page_number}.html"),
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

async fn write_backup(dir: &Path, name: &str, html: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(name), html).await
}
