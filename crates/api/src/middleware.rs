use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use fieldops_auth::user::UserStore;

use crate::app::services::AppServices;
use crate::context::{PrincipalContext, RequestMeta};
use crate::session::SESSION_COOKIE;

/// Resolve the session cookie into a [`PrincipalContext`] request extension.
///
/// This middleware never rejects: a missing cookie, an unknown session id, a
/// deleted backing user, an inactive account, or a store failure all resolve
/// to the anonymous context. The guard in each handler produces the 401, so
/// every route answers identically however authentication failed.
pub async fn session_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let meta = RequestMeta::from_headers(req.headers());

    let context = match session_cookie(req.headers()) {
        Some(sid) => resolve_session(&services, &sid),
        None => PrincipalContext::anonymous(),
    };

    req.extensions_mut().insert(context);
    req.extensions_mut().insert(meta);

    next.run(req).await
}

fn resolve_session(services: &AppServices, sid: &str) -> PrincipalContext {
    let Some(user_id) = services.sessions.get(sid) else {
        return PrincipalContext::anonymous();
    };

    match services.store.find(user_id) {
        Ok(Some(user)) if user.active => PrincipalContext::authenticated(user.principal()),
        Ok(_) => PrincipalContext::anonymous(),
        Err(e) => {
            tracing::warn!(error = %e, "user lookup failed during session resolution");
            PrincipalContext::anonymous()
        }
    }
}

/// Extract the session id from the `Cookie` header, if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn finds_the_session_cookie_among_others() {
        let headers = headers_with_cookie("theme=dark; fieldops_session=abc123; lang=en");
        assert_eq!(session_cookie(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn missing_or_empty_cookie_is_none() {
        assert_eq!(session_cookie(&HeaderMap::new()), None);
        let headers = headers_with_cookie("fieldops_session=");
        assert_eq!(session_cookie(&headers), None);
    }
}
