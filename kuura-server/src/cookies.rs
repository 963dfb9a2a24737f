//! The three cookies the main listener sets and clears (§6.2). Built by
//! hand as raw `Set-Cookie` header values: the workspace's HTTP stack is
//! `axum`/`tower-http` without a cookie-jar extension, so a response simply
//! carries one `Set-Cookie` header per cookie.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

pub const REFRESH_COOKIE: &str = "kuura_refresh";
pub const SESSION_COOKIE: &str = "kuura_session";
pub const ACCESS_COOKIE: &str = "kuura_access";

pub enum SameSite {
    Strict,
    Lax,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
        }
    }
}

pub struct CookieSpec<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub path: &'a str,
    pub http_only: bool,
    pub same_site: SameSite,
    pub max_age_secs: i64,
    pub domain: Option<&'a str>,
}

impl<'a> CookieSpec<'a> {
    pub fn to_header_value(&self) -> HeaderValue {
        let mut s = format!(
            "{}={}; Path={}; Max-Age={}; Secure; SameSite={}",
            self.name,
            self.value,
            self.path,
            self.max_age_secs,
            self.same_site.as_str(),
        );
        if self.http_only {
            s.push_str("; HttpOnly");
        }
        if let Some(domain) = self.domain {
            s.push_str(&format!("; Domain={domain}"));
        }
        HeaderValue::from_str(&s).expect("cookie values never contain header-invalid characters")
    }
}

pub fn set_cookie_name() -> HeaderName {
    axum::http::header::SET_COOKIE
}

/// Reads one cookie by name out of the request's `Cookie` header. Built by
/// hand for the same reason [`CookieSpec`] is: no cookie-jar extractor is
/// in the dependency graph.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// `kuura_refresh`: user refresh token, scoped to the internal-token-refresh
/// path, 7-day max-age, domain-scoped to the public Kuura domain.
pub fn refresh_cookie<'a>(token: &'a str, domain: &'a str) -> CookieSpec<'a> {
    CookieSpec {
        name: REFRESH_COOKIE,
        value: token,
        path: "/v1/user/tokens/internal",
        http_only: true,
        same_site: SameSite::Strict,
        max_age_secs: 7 * 24 * 3600,
        domain: Some(domain),
    }
}

/// `kuura_session`: not `HttpOnly` so frontend JS can detect its presence.
pub fn session_cookie(session_id: &str) -> CookieSpec<'_> {
    CookieSpec {
        name: SESSION_COOKIE,
        value: session_id,
        path: "/",
        http_only: false,
        same_site: SameSite::Lax,
        max_age_secs: 30 * 24 * 3600,
        domain: None,
    }
}

/// `kuura_access`: internal access JWT, max-age matched to the service's
/// own access-token duration.
pub fn access_cookie(jwt: &str, duration_secs: i64) -> CookieSpec<'_> {
    CookieSpec {
        name: ACCESS_COOKIE,
        value: jwt,
        path: "/",
        http_only: true,
        same_site: SameSite::Lax,
        max_age_secs: duration_secs,
        domain: None,
    }
}

/// Logout (§6.2): clears all three cookies by re-setting them empty with a
/// negative max-age.
pub fn clear_cookies(domain: &str) -> [HeaderValue; 3] {
    [
        CookieSpec { value: "", max_age_secs: -1, ..refresh_cookie("", domain) }.to_header_value(),
        CookieSpec { value: "", max_age_secs: -1, ..session_cookie("") }.to_header_value(),
        CookieSpec { value: "", max_age_secs: -1, ..access_cookie("", 0) }.to_header_value(),
    ]
}
