//! Cookie builders for session tokens, the pending two-factor challenge, and
//! the interface locale.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the access token.
pub const SCRIBE_ACCESS_TOKEN: &str = "scribe_access_token";

/// Cookie name for the "remember me" refresh token.
pub const SCRIBE_REFRESH_TOKEN: &str = "scribe_refresh_token";

/// Cookie name carrying the id of a pending two-factor challenge.
pub const SCRIBE_TFA_CHALLENGE: &str = "scribe_tfa_challenge";

/// Cookie name for the preferred interface locale.
pub const LOCALE: &str = "locale";

/// Access-token JWT lifetime in seconds (4 hours).
pub const ACCESS_TOKEN_EXP: u64 = 14400;

/// Refresh-token JWT lifetime in seconds (30 days).
pub const REFRESH_TOKEN_EXP: u64 = 2_592_000;

/// Locale cookie lifetime in seconds (10 years).
pub const LOCALE_EXP: u64 = 315_360_000;

const REFRESH_TOKEN_PATH: &str = "/auth/session";
const TFA_CHALLENGE_PATH: &str = "/auth/login";

fn http_only_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    domain: String,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .domain(domain)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

/// Set the access-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use scribe_auth_types::cookie::{set_access_token_cookie, SCRIBE_ACCESS_TOKEN};
///
/// let jar = CookieJar::new();
/// let jar = set_access_token_cookie(jar, "token_value".to_string(), "example.com".to_string());
/// let cookie = jar.get(SCRIBE_ACCESS_TOKEN).unwrap();
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(14400)));
/// assert!(cookie.http_only().unwrap_or(false));
/// ```
pub fn set_access_token_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    jar.add(http_only_cookie(
        SCRIBE_ACCESS_TOKEN,
        value,
        "/",
        domain,
        seconds(ACCESS_TOKEN_EXP),
    ))
}

/// Set the refresh-token cookie on the jar. Only sent back to the session
/// endpoint.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use scribe_auth_types::cookie::{set_refresh_token_cookie, SCRIBE_REFRESH_TOKEN};
///
/// let jar = CookieJar::new();
/// let jar = set_refresh_token_cookie(jar, "refresh_value".to_string(), "example.com".to_string());
/// let cookie = jar.get(SCRIBE_REFRESH_TOKEN).unwrap();
/// assert_eq!(cookie.path(), Some("/auth/session"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(2_592_000)));
/// ```
pub fn set_refresh_token_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    jar.add(http_only_cookie(
        SCRIBE_REFRESH_TOKEN,
        value,
        REFRESH_TOKEN_PATH,
        domain,
        seconds(REFRESH_TOKEN_EXP),
    ))
}

/// Clear both session cookies by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use scribe_auth_types::cookie::{
///     clear_session_cookies, set_access_token_cookie, SCRIBE_ACCESS_TOKEN, SCRIBE_REFRESH_TOKEN,
/// };
///
/// let jar = set_access_token_cookie(CookieJar::new(), "a".to_string(), "example.com".to_string());
/// let jar = clear_session_cookies(jar, "example.com".to_string());
/// assert_eq!(jar.get(SCRIBE_ACCESS_TOKEN).unwrap().max_age(), Some(time::Duration::ZERO));
/// assert_eq!(jar.get(SCRIBE_REFRESH_TOKEN).unwrap().max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_session_cookies(jar: CookieJar, domain: String) -> CookieJar {
    let access = http_only_cookie(
        SCRIBE_ACCESS_TOKEN,
        String::new(),
        "/",
        domain.clone(),
        Duration::ZERO,
    );
    let refresh = http_only_cookie(
        SCRIBE_REFRESH_TOKEN,
        String::new(),
        REFRESH_TOKEN_PATH,
        domain,
        Duration::ZERO,
    );
    jar.add(access).add(refresh)
}

/// Set the pending two-factor challenge cookie. Lives as long as the pending
/// challenge record, which outlives the code it was created with.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use scribe_auth_types::cookie::{set_tfa_challenge_cookie, SCRIBE_TFA_CHALLENGE};
///
/// let jar = set_tfa_challenge_cookie(CookieJar::new(), "abc".to_string(), "example.com".to_string(), 1800);
/// let cookie = jar.get(SCRIBE_TFA_CHALLENGE).unwrap();
/// assert_eq!(cookie.value(), "abc");
/// assert_eq!(cookie.path(), Some("/auth/login"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(1800)));
/// ```
pub fn set_tfa_challenge_cookie(
    jar: CookieJar,
    challenge_id: String,
    domain: String,
    ttl_secs: u64,
) -> CookieJar {
    jar.add(http_only_cookie(
        SCRIBE_TFA_CHALLENGE,
        challenge_id,
        TFA_CHALLENGE_PATH,
        domain,
        seconds(ttl_secs),
    ))
}

/// Expire the pending two-factor challenge cookie.
pub fn clear_tfa_challenge_cookie(jar: CookieJar, domain: String) -> CookieJar {
    jar.add(http_only_cookie(
        SCRIBE_TFA_CHALLENGE,
        String::new(),
        TFA_CHALLENGE_PATH,
        domain,
        Duration::ZERO,
    ))
}

/// Set the interface locale cookie. Readable by the frontend.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use scribe_auth_types::cookie::{set_locale_cookie, LOCALE};
///
/// let jar = set_locale_cookie(CookieJar::new(), "fr".to_string(), "example.com".to_string());
/// let cookie = jar.get(LOCALE).unwrap();
/// assert_eq!(cookie.value(), "fr");
/// assert!(!cookie.http_only().unwrap_or(false));
/// ```
pub fn set_locale_cookie(jar: CookieJar, locale: String, domain: String) -> CookieJar {
    let cookie = Cookie::build((LOCALE, locale))
        .path("/")
        .domain(domain)
        .max_age(seconds(LOCALE_EXP))
        .secure(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}
