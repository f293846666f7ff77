use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use quiz_core::model::SessionId;

pub const SESSION_COOKIE: &str = "quiz_session";

/// Session of the requesting client, issuing a new cookie when the request
/// carries none or an unreadable one.
pub fn current_session(cookies: &Cookies) -> SessionId {
    if let Some(id) = cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<SessionId>().ok())
    {
        return id;
    }

    let id = SessionId::generate();
    tracing::debug!(session = %id, "issued new session");
    cookies.add(session_cookie(id));
    id
}

fn session_cookie(id: SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
