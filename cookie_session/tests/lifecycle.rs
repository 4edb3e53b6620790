//! Request pipeline driven through the public API, without a web framework.

use http::{HeaderMap, Request, header, request::Parts};
use serde_json::json;

use cookie_session::{
    AuthDecision, AuthMode, DEFAULT_DECORATION_NAME, RedirectTo, RequestTarget, RoutePolicy,
    SessionAuth, SessionCookieOptions, UnauthenticatedReason,
};

fn request(uri: &str, cookie: Option<&str>) -> (Parts, RequestTarget) {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let (parts, _) = builder.body(()).unwrap().into_parts();
    let target = RequestTarget::from_uri(&parts.uri);
    (parts, target)
}

fn first_cookie(headers: &HeaderMap) -> String {
    let value = headers[header::SET_COOKIE].to_str().unwrap();
    value.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_start_then_authenticate_on_next_request() {
    let auth = SessionAuth::single(
        SessionCookieOptions::new()
            .redirect_to(RedirectTo::literal("/login"))
            .append_next(true),
    )
    .unwrap();
    let required = RoutePolicy::new(AuthMode::Required);

    // Given an anonymous request to a protected route
    let (parts, target) = request("/orgs?page=2", None);
    let mut sessions = auth.begin_request();
    let decision = auth
        .authorize(&required, &parts, &target, &mut sessions)
        .await
        .unwrap();

    // Then it is redirected with the requested path
    assert_eq!(
        decision,
        AuthDecision::Redirect("/login?next=%2Forgs%3Fpage%3D2".to_string())
    );

    // When a session is started on the login request
    let mut sessions = auth.begin_request();
    let sid = sessions
        .start(DEFAULT_DECORATION_NAME, json!({"user": "u_1"}))
        .await
        .unwrap();
    let mut headers = HeaderMap::new();
    auth.finish_request(&mut sessions, &mut headers).await.unwrap();
    let cookie = first_cookie(&headers);
    assert_eq!(cookie, format!("sid={sid}"));

    // Then the next request with the cookie is authenticated
    let (parts, target) = request("/orgs", Some(&cookie));
    let mut sessions = auth.begin_request();
    let decision = auth
        .authorize(&required, &parts, &target, &mut sessions)
        .await
        .unwrap();
    match decision {
        AuthDecision::Proceed(outcome) => assert!(outcome.is_authenticated()),
        other => panic!("expected to proceed, got {other:?}"),
    }
    assert_eq!(
        sessions.session(DEFAULT_DECORATION_NAME).unwrap().data(),
        Some(&json!({"user": "u_1"}))
    );
}

#[tokio::test]
async fn test_try_route_proceeds_with_reason() {
    let auth = SessionAuth::single(SessionCookieOptions::new()).unwrap();
    let (parts, target) = request("/", Some("sid=sid_unknown"));
    let mut sessions = auth.begin_request();

    let decision = auth
        .authorize(&RoutePolicy::new(AuthMode::Try), &parts, &target, &mut sessions)
        .await
        .unwrap();

    match decision {
        AuthDecision::Proceed(cookie_session::AuthOutcome::Unauthenticated { reason, error }) => {
            assert_eq!(reason, UnauthenticatedReason::InvalidSession);
            assert_eq!(error.message(), Some("Invalid session cookie"));
        }
        other => panic!("expected unauthenticated proceed, got {other:?}"),
    }

    // The stale cookie is cleared on the response
    let mut headers = HeaderMap::new();
    auth.finish_request(&mut sessions, &mut headers).await.unwrap();
    assert!(
        headers[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .starts_with("sid=; Max-Age=0")
    );
}
