//! Cookies carrying the session and login-state tokens.
//!
//! Both cookies are scoped to the protected base path, HTTP-only and
//! `SameSite=Lax` so the provider's top-level redirect back still carries
//! them.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration as TimeDuration;

use crate::config::AuthConfig;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Login-state cookie name (anti-forgery value for the provider round trip).
pub const STATE_COOKIE: &str = "auth_state";

fn base(name: &'static str, value: String, config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(config.base_path().to_string())
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .build()
}

/// Builds the session cookie. Without a session lifetime it is a browser
/// session cookie.
pub(crate) fn session_cookie(token: String, config: &AuthConfig) -> Cookie<'static> {
    let mut cookie = base(SESSION_COOKIE, token, config);
    if let Some(ttl) = config.session_ttl() {
        cookie.set_max_age(TimeDuration::seconds(ttl.num_seconds()));
    }
    cookie
}

/// Builds the login-state cookie.
pub(crate) fn state_cookie(
    token: String,
    ttl: chrono::Duration,
    config: &AuthConfig,
) -> Cookie<'static> {
    let mut cookie = base(STATE_COOKIE, token, config);
    cookie.set_max_age(TimeDuration::seconds(ttl.num_seconds()));
    cookie
}

/// Builds a cookie that removes the session cookie.
pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Cookie<'static> {
    removal(SESSION_COOKIE, config)
}

/// Builds a cookie that removes the login-state cookie.
pub(crate) fn clear_state_cookie(config: &AuthConfig) -> Cookie<'static> {
    removal(STATE_COOKIE, config)
}

fn removal(name: &'static str, config: &AuthConfig) -> Cookie<'static> {
    let mut cookie = base(name, String::new(), config);
    cookie.set_max_age(TimeDuration::ZERO);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    fn config(base_path: &str, ttl_minutes: i64) -> AuthConfig {
        AuthConfig::builder(ProviderConfig::new(
            "id",
            "secret",
            "https://app.example.com/app/auth",
        ))
        .base_path(base_path)
        .session_ttl_minutes(ttl_minutes)
        .build()
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("token".to_string(), &config("/app", 60));

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "token");
        assert_eq!(cookie.path(), Some("/app"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(TimeDuration::hours(1)));
    }

    #[test]
    fn session_cookie_without_ttl_has_no_max_age() {
        let cookie = session_cookie("token".to_string(), &config("/", 0));
        assert_eq!(cookie.max_age(), None);
    }

    #[test]
    fn state_cookie_lives_for_state_ttl() {
        let cookie = state_cookie(
            "state".to_string(),
            chrono::Duration::minutes(10),
            &config("/", 60),
        );
        assert_eq!(cookie.name(), STATE_COOKIE);
        assert_eq!(cookie.max_age(), Some(TimeDuration::minutes(10)));
    }

    #[test]
    fn removal_cookies_expire_immediately_on_same_path() {
        let config = config("/app", 60);
        for cookie in [clear_session_cookie(&config), clear_state_cookie(&config)] {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.path(), Some("/app"));
            assert_eq!(cookie.max_age(), Some(TimeDuration::ZERO));
        }
    }
}
