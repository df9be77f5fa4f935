use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use rand::rngs::OsRng;
use tracing::{info, warn};

use super::dto::{
    safe_next, LoginForm, NextQuery, RegisterForm, INVALID_LOGIN, USERNAME_TAKEN,
};
use super::queries;
use crate::error::AppResult;
use crate::forms::FormErrors;
use crate::pages;
use crate::routes::middleware_auth::{current_user, end_session, start_session, LOGIN_PATH};
use crate::routes::tasks::routes::LIST_PATH;
use crate::state::AppState;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

/// False for a wrong password and for a stored hash that cannot be parsed
/// (such accounts simply cannot log in).
fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
) -> AppResult<Response> {
    if current_user(&state, &jar).await?.is_some() {
        let target = safe_next(query.next.as_deref()).unwrap_or(LIST_PATH);
        return Ok(Redirect::to(target).into_response());
    }

    Ok(pages::login("", query.next.as_deref(), None).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim();
    let user = queries::find_by_username(&state.db, username).await?;

    let user = match user {
        Some(user) if verify_password(&form.password, &user.password_hash) => user,
        _ => {
            warn!(username = %username, "failed login attempt");
            let page = pages::login(&form.username, form.next.as_deref(), Some(INVALID_LOGIN));
            return Ok(page.into_response());
        }
    };

    let jar = start_session(jar, &state, &user)?;
    info!(user_id = %user.id, "user logged in");

    let target = safe_next(form.next.as_deref()).unwrap_or(LIST_PATH);
    Ok((jar, Redirect::to(target)).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (end_session(jar), Redirect::to(LOGIN_PATH))
}

pub async fn register_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    if current_user(&state, &jar).await?.is_some() {
        return Ok(Redirect::to(LIST_PATH).into_response());
    }

    Ok(pages::register("", &FormErrors::new()).into_response())
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let mut errors = form.validate();
    let username = form.username();

    if !errors.has("username") && queries::username_taken(&state.db, username).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        return Ok(pages::register(&form.username, &errors).into_response());
    }

    let password_hash = hash_password(&form.password1)?;

    let user = match queries::create_user(&state.db, username, &password_hash).await {
        Ok(user) => user,
        Err(e)
            if e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation()) =>
        {
            // Lost a race with another registration for the same name.
            errors.add("username", USERNAME_TAKEN);
            return Ok(pages::register(&form.username, &errors).into_response());
        }
        Err(e) => return Err(e.into()),
    };
    info!(user_id = %user.id, username = %user.username, "user registered");

    let jar = start_session(jar, &state, &user)?;
    Ok((jar, Redirect::to(LIST_PATH)).into_response())
}
