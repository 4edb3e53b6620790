use axum::{
    Json,
    extract::Query,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use cookie_session_axum::{AuthInfo, Session, SessionRejection};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NextQuery {
    next: Option<String>,
}

impl NextQuery {
    /// Where to send the client after login. Only local paths are followed.
    fn target(&self) -> &str {
        match self.next.as_deref() {
            Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
            _ => "/",
        }
    }
}

pub(crate) async fn index(auth: AuthInfo) -> Json<Value> {
    Json(json!({
        "hello": "world",
        "account": auth.credentials().map(|c| c["account"].clone()),
    }))
}

pub(crate) async fn data(session: Session) -> Json<Value> {
    Json(session.data().await.unwrap_or(Value::Null))
}

pub(crate) async fn modify(session: Session) -> Result<Redirect, SessionRejection> {
    let things = cookie_session::gen_base62_string(12).map_err(|e| {
        tracing::error!("Unable to generate a value: {}", e);
        SessionRejection::Fault
    })?;
    session
        .update(|data| data["things"] = json!(things))
        .await?;
    Ok(Redirect::to("/data"))
}

pub(crate) async fn login(auth: AuthInfo, Query(query): Query<NextQuery>) -> Response {
    if auth.is_authenticated() {
        return Redirect::to(query.target()).into_response();
    }

    let start = match query.next.as_deref() {
        Some(next) => format!("/login/start?next={}", urlencoding::encode(next)),
        None => "/login/start".to_string(),
    };
    Html(format!(
        "Not logged in. Go <a href=\"/\">home</a> or <a href=\"{start}\">log in</a>."
    ))
    .into_response()
}

pub(crate) async fn login_start(
    auth: AuthInfo,
    session: Session,
    Query(query): Query<NextQuery>,
) -> Result<Redirect, SessionRejection> {
    // Keep an existing session
    if auth.is_authenticated() {
        return Ok(Redirect::to(query.target()));
    }

    let sid = session
        .start(json!({
            "account": { "id": "ac_1", "name": "demo" },
            "things": "original",
        }))
        .await?;
    tracing::info!("Started session {}", sid);
    Ok(Redirect::to(query.target()))
}

pub(crate) async fn logout(session: Session) -> Result<Redirect, SessionRejection> {
    session.destroy().await?;
    Ok(Redirect::to("/login"))
}
