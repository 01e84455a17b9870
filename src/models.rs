//! Post records and the acting-account context used to classify them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Name of the forum's automated advertising poster.
pub const ADBOT: &str = "Adbot";

/// One post scraped from a thread page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Numeric post id, without the `post` prefix.
    pub id: String,
    /// Display name of the poster.
    pub author: String,
    /// Text content of the post body.
    pub text: String,
    /// Post time as shown by the forum (no timezone).
    pub timestamp: NaiveDateTime,
}

/// The account the client acts as.
///
/// Post classification depends on who is asking, so it lives here rather
/// than on [`Post`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActingAccount {
    username: Option<String>,
}

impl ActingAccount {
    /// Blank usernames are treated as no account.
    #[must_use]
    pub fn new(username: Option<String>) -> Self {
        Self {
            username: username.filter(|name| !name.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

impl Post {
    /// Posted by Adbot or by the acting account itself.
    #[must_use]
    pub fn is_bot(&self, account: &ActingAccount) -> bool {
        self.author == ADBOT || account.username() == Some(self.author.as_str())
    }

    #[must_use]
    pub fn is_user(&self, account: &ActingAccount) -> bool {
        !self.is_bot(account)
    }

    #[must_use]
    pub fn is_mine(&self, account: &ActingAccount) -> bool {
        account.username() == Some(self.author.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn post_by(author: &str) -> Post {
        Post {
            id: "1".to_string(),
            author: author.to_string(),
            text: "Post".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2025, 10, 22)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_adbot_is_bot_for_any_account() {
        let post = post_by("Adbot");

        assert!(post.is_bot(&ActingAccount::default()));
        assert!(post.is_bot(&ActingAccount::new(Some("BotAccount".to_string()))));
        assert!(!post.is_user(&ActingAccount::default()));
    }

    #[test]
    fn test_own_posts_are_bot_and_mine() {
        let account = ActingAccount::new(Some("BotAccount".to_string()));
        let post = post_by("BotAccount");

        assert!(post.is_bot(&account));
        assert!(post.is_mine(&account));
    }

    #[test]
    fn test_regular_user() {
        let account = ActingAccount::new(Some("BotAccount".to_string()));
        let post = post_by("RegularUser");

        assert!(!post.is_bot(&account));
        assert!(post.is_user(&account));
        assert!(!post.is_mine(&account));
    }

    #[test]
    fn test_without_account_only_adbot_is_bot() {
        let account = ActingAccount::new(None);

        assert!(post_by("Adbot").is_bot(&account));
        assert!(!post_by("SomeUser").is_bot(&account));
        assert!(!post_by("SomeUser").is_mine(&account));
    }

    #[test]
    fn test_blank_username_matches_nobody() {
        let account = ActingAccount::new(Some("  ".to_string()));

        assert_eq!(account.username(), None);
        assert!(!post_by("  ").is_mine(&account));
        assert!(!post_by("  ").is_bot(&account));
    }
}
