//! Something Awful thread scraper library.
//!
//! Logs in with a forum account, keeps the session cookies between runs,
//! walks the pages of a thread as a lazy stream of posts, and can reply to
//! threads or edit posts.

pub mod actions;
pub mod client;
pub mod config;
pub mod crawler;
pub mod error;
pub mod http;
pub mod models;
pub mod parsing;

pub use actions::PostEdit;
pub use client::ForumClient;
pub use config::Config;
pub use crawler::{PostStream, ThreadContext, ThreadCrawler};
pub use error::{Result, ScrapeError};
pub use models::{ActingAccount, Post, ADBOT};
pub use parsing::ThreadPage;
