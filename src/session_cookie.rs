/// Refresh-token cookie handling
///
/// Sets, clears and reads the refresh-token cookie with the configured
/// attributes. Holds no business rules.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;

use crate::configuration::{CookieSettings, SameSitePolicy};

#[derive(Clone, Debug)]
pub struct RefreshCookie {
    settings: CookieSettings,
}

impl RefreshCookie {
    pub fn new(settings: CookieSettings) -> Self {
        Self { settings }
    }

    /// Whether login/refresh bodies should also carry the refresh token
    pub fn expose_in_body(&self) -> bool {
        self.settings.expose_refresh_token
    }

    /// Cookie carrying `token`, living for `max_age_seconds`
    pub fn issue(&self, token: &str, max_age_seconds: i64) -> Cookie<'static> {
        let mut cookie = self.base(token.to_string());
        cookie.set_max_age(CookieDuration::seconds(max_age_seconds.max(0)));
        cookie
    }

    /// Removal cookie; path and domain match the issued one so the browser drops it
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new());
        cookie.make_removal();
        cookie
    }

    /// Refresh token from the cookie, falling back to a body field
    pub fn extract(&self, req: &HttpRequest, body_field: Option<&str>) -> Option<String> {
        req.cookie(&self.settings.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                body_field
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
    }

    fn base(&self, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build(self.settings.name.clone(), value)
            .path(self.settings.path.clone())
            .secure(self.settings.secure)
            .http_only(self.settings.http_only)
            .same_site(match self.settings.same_site {
                SameSitePolicy::Lax => SameSite::Lax,
                SameSitePolicy::Strict => SameSite::Strict,
                SameSitePolicy::None => SameSite::None,
            });

        if let Some(domain) = &self.settings.domain {
            builder = builder.domain(domain.clone());
        }

        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn cookie_manager() -> RefreshCookie {
        RefreshCookie::new(CookieSettings::default())
    }

    #[test]
    fn test_issue_sets_attributes() {
        let cookie = cookie_manager().issue("tok", 3600);

        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(3600)));
    }

    #[test]
    fn test_clear_is_removal() {
        let cookie = cookie_manager().clear();

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }

    #[test]
    fn test_domain_is_applied() {
        let manager = RefreshCookie::new(CookieSettings {
            domain: Some("example.com".to_string()),
            ..CookieSettings::default()
        });
        assert_eq!(manager.issue("tok", 60).domain(), Some("example.com"));
    }

    #[test]
    fn test_extract_prefers_cookie() {
        let manager = cookie_manager();
        let req = TestRequest::default()
            .cookie(Cookie::new("refresh_token", "from-cookie"))
            .to_http_request();

        assert_eq!(
            manager.extract(&req, Some("from-body")),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn test_extract_falls_back_to_body() {
        let manager = cookie_manager();
        let req = TestRequest::default().to_http_request();

        assert_eq!(
            manager.extract(&req, Some(" from-body ")),
            Some("from-body".to_string())
        );
        assert_eq!(manager.extract(&req, Some("")), None);
        assert_eq!(manager.extract(&req, None), None);
    }
}
