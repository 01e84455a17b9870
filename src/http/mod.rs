//! Talking to the forum: transport, session cookies, URLs, and the
//! authenticated executor that ties them together.

pub mod endpoints;
pub mod executor;
pub mod session;
pub mod transport;

pub use endpoints::Endpoints;
pub use executor::{AuthenticatedExecutor, Credentials, SessionState, LOGGED_OUT_TRIGGER_TEXT};
pub use session::{CookieJar, SessionStore};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
