//! Replying to threads and editing posts.
//!
//! Both are form submissions replayed through the authenticated executor, so
//! they get the same login and session-expiry handling as page fetches.

use tracing::info;

use crate::error::{Result, ScrapeError};
use crate::http::{AuthenticatedExecutor, HttpRequest};
use crate::parsing::{textarea_value, FormTokens};

const REPLY_SUBMIT: &str = "Submit Reply";
const EDIT_SUBMIT: &str = "Save Changes";
const MESSAGE_FIELD: &str = "message";

type Transform = Box<dyn FnOnce(&str) -> String + Send>;

/// An edit to an existing post.
///
/// Exactly one of [`text`](Self::text) and [`transform`](Self::transform)
/// must be set.
pub struct PostEdit {
    post_id: String,
    text: Option<String>,
    transform: Option<Transform>,
}

impl PostEdit {
    #[must_use]
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            text: None,
            transform: None,
        }
    }

    /// Replace the post body with `text`.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Compute the new body from the current one.
    #[must_use]
    pub fn transform(mut self, transform: impl FnOnce(&str) -> String + Send + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    #[must_use]
    pub fn post_id(&self) -> &str {
        &self.post_id
    }
}

impl std::fmt::Debug for PostEdit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostEdit")
            .field("post_id", &self.post_id)
            .field("text", &self.text)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Post a reply to a thread and return the forum's response body.
///
/// Missing form tokens are sent as empty strings; the forum decides whether
/// to accept the reply.
///
/// # Errors
///
/// Returns [`ScrapeError::Precondition`] without any request when
/// `thread_id` is `None`, or any executor error.
pub async fn reply(
    executor: &mut AuthenticatedExecutor,
    thread_id: Option<&str>,
    text: &str,
) -> Result<String> {
    let Some(thread_id) = thread_id else {
        return Err(ScrapeError::Precondition("thread id required".to_string()));
    };

    let form_url = executor.endpoints().reply_form(thread_id);
    let form_page = executor.execute(HttpRequest::get(form_url)).await?;
    let tokens = FormTokens::from_html(&form_page);

    info!(thread_id = %thread_id, "Posting reply");
    let request = HttpRequest::post_form(
        executor.endpoints().reply(),
        [
            ("action", "postreply"),
            ("threadid", thread_id),
            ("formkey", tokens.form_key.as_str()),
            ("form_cookie", tokens.form_cookie.as_str()),
            (MESSAGE_FIELD, text),
            ("submit", REPLY_SUBMIT),
        ],
    );
    executor.execute(request).await
}

/// Apply an edit to a post and return the forum's response body.
///
/// With a transform, the current body is read from the edit form first.
///
/// # Errors
///
/// Returns [`ScrapeError::Argument`] without any request unless exactly one
/// of text and transform is set, or any executor error.
pub async fn edit(executor: &mut AuthenticatedExecutor, edit: PostEdit) -> Result<String> {
    let PostEdit {
        post_id,
        text,
        transform,
    } = edit;

    let text = match (text, transform) {
        (Some(text), None) => text,
        (None, Some(transform)) => {
            let form_url = executor.endpoints().edit_form(&post_id);
            let form_page = executor.execute(HttpRequest::get(form_url)).await?;
            let original = textarea_value(&form_page, MESSAGE_FIELD);
            transform(&original)
        }
        (Some(_), Some(_)) => {
            return Err(ScrapeError::Argument(
                "pass either replacement text or a transform, not both".to_string(),
            ));
        }
        (None, None) => {
            return Err(ScrapeError::Argument(
                "pass replacement text or a transform".to_string(),
            ));
        }
    };

    info!(post_id = %post_id, "Editing post");
    let request = HttpRequest::post_form(
        executor.endpoints().edit(),
        [
            ("action", "updatepost"),
            ("postid", post_id.as_str()),
            (MESSAGE_FIELD, text.as_str()),
            ("submit", EDIT_SUBMIT),
        ],
    );
    executor.execute(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_edit_builder() {
        let edit = PostEdit::new("42").text("new body");

        assert_eq!(edit.post_id(), "42");
        assert_eq!(edit.text.as_deref(), Some("new body"));
        assert!(edit.transform.is_none());
    }

    #[test]
    fn test_post_edit_debug_hides_closure() {
        let edit = PostEdit::new("42").transform(|s| s.to_uppercase());
        let debug = format!("{edit:?}");

        assert!(debug.contains("transform: true"), "{debug}");
    }
}
