//! Forum URLs, built from the configured base URL.

use url::Url;

use crate::error::Result;

/// Posts per page requested for pages after the first.
pub const POSTS_PER_PAGE: u32 = 40;

/// URLs of the forum pages the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Thread view, optionally narrowed to one poster. Pages past the first
    /// carry explicit paging parameters.
    #[must_use]
    pub fn thread_page(&self, thread_id: &str, page_number: u32, user_id: Option<&str>) -> String {
        let mut url = self.page("showthread.php");
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("threadid", thread_id);
            if let Some(user_id) = user_id {
                query.append_pair("userid", user_id);
            }
            if page_number > 1 {
                query.append_pair("perpage", &POSTS_PER_PAGE.to_string());
                query.append_pair("pagenumber", &page_number.to_string());
            }
        }
        url.into()
    }

    #[must_use]
    pub fn member_profile(&self, user_id: &str) -> String {
        self.with_query("member.php", &[("action", "getinfo"), ("userid", user_id)])
    }

    #[must_use]
    pub fn forums_json(&self) -> String {
        self.with_query("index.php", &[("json", "1")])
    }

    #[must_use]
    pub fn login(&self) -> String {
        self.page("account.php").into()
    }

    #[must_use]
    pub fn reply_form(&self, thread_id: &str) -> String {
        self.with_query("newreply.php", &[("action", "newreply"), ("threadid", thread_id)])
    }

    #[must_use]
    pub fn reply(&self) -> String {
        self.page("newreply.php").into()
    }

    #[must_use]
    pub fn edit_form(&self, post_id: &str) -> String {
        self.with_query("editpost.php", &[("action", "editpost"), ("postid", post_id)])
    }

    #[must_use]
    pub fn edit(&self) -> String {
        self.page("editpost.php").into()
    }

    fn page(&self, script: &str) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}{script}", self.base.path());
        url.set_path(&path);
        url.set_query(None);
        url
    }

    fn with_query(&self, script: &str, pairs: &[(&str, &str)]) -> String {
        let mut url = self.page(script);
        url.query_pairs_mut().extend_pairs(pairs);
        url.into()
    }
}
