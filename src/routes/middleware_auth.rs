use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppResult;
use crate::routes::accounts::{model::User, queries as users};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "todo_session";
pub const LOGIN_PATH: &str = "/";

/// The signed-in user, placed in request extensions by `require_login`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "missing user"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    username: String,
    exp: usize,
    iat: usize,
}

pub fn session_token(state: &AppState, user: &User) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + state.session_ttl;
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

/// Adds the session cookie for `user` to the jar.
pub fn start_session(jar: CookieJar, state: &AppState, user: &User) -> AppResult<CookieJar> {
    let token = session_token(state, user)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok(jar.add(cookie))
}

pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Resolves the cookie to a user that still exists. A missing, forged or
/// expired token means "not signed in"; a failed lookup is an error.
pub async fn current_user(state: &AppState, jar: &CookieJar) -> AppResult<Option<SessionUser>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let claims = match decode::<Claims>(
        cookie.value(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data.claims,
        Err(e) => {
            debug!("rejecting session cookie: {}", e);
            return Ok(None);
        }
    };

    let user = users::find_by_id(&state.db, claims.sub).await?;
    if user.is_none() {
        debug!(user_id = %claims.sub, "session refers to a deleted user");
    }

    Ok(user.map(|user| SessionUser {
        id: user.id,
        username: user.username,
    }))
}

/// `/?next=<path>` for an anonymous visitor of `path`.
pub fn login_redirect_target(path_and_query: &str) -> String {
    let next = urlencoding::encode(path_and_query).replace("%2F", "/");
    format!("{}?next={}", LOGIN_PATH, next)
}

pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match current_user(&state, &jar).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => e.into_response(),
        Ok(None) => {
            let requested = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(LOGIN_PATH);
            Redirect::to(&login_redirect_target(requested)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::error::AppError;
    use chrono::Duration;

    async fn state_with_user() -> (AppState, User) {
        let db = connect_in_memory().await;
        let user = users::create_user(&db, "alice", "!").await.unwrap();
        (AppState::new(db, "test-secret", 1), user)
    }

    fn jar_with(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.to_string()))
    }

    #[tokio::test]
    async fn issued_token_resolves_to_user() {
        let (state, user) = state_with_user().await;
        let token = session_token(&state, &user).unwrap();

        let current = current_user(&state, &jar_with(&token)).await.unwrap().unwrap();

        assert_eq!(current.id, user.id);
        assert_eq!(current.username, "alice");
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_ignored() {
        let (state, user) = state_with_user().await;
        let forged_state = AppState::new(state.db.clone(), "other-secret", 1);
        let token = session_token(&forged_state, &user).unwrap();

        assert_eq!(current_user(&state, &jar_with(&token)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_token_is_ignored() {
        let (mut state, user) = state_with_user().await;
        state.session_ttl = Duration::hours(-2);
        let token = session_token(&state, &user).unwrap();

        assert_eq!(current_user(&state, &jar_with(&token)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_cookie_is_anonymous() {
        let (state, _) = state_with_user().await;
        assert_eq!(current_user(&state, &CookieJar::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn lookup_failure_is_an_error() {
        let (state, user) = state_with_user().await;
        let token = session_token(&state, &user).unwrap();
        state.db.close().await;

        let result = current_user(&state, &jar_with(&token)).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn login_redirect_keeps_slashes_and_encodes_query() {
        assert_eq!(login_redirect_target("/my-tasks/"), "/?next=/my-tasks/");
        assert_eq!(
            login_redirect_target("/my-tasks/?search-area=a b"),
            "/?next=/my-tasks/%3Fsearch-area%3Da%20b"
        );
    }
}
