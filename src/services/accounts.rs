use std::sync::LazyLock;

use anyhow::Context;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::{hash_password, verify_password};
use crate::error::AppError;
use crate::forms::{FieldErrors, LoginForm, NON_FIELD_ERRORS, RegisterForm};
use crate::models::User;
use crate::store::{SessionToken, Store, StoreError};

const BAD_CREDENTIALS: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Verified against when the username is unknown, so both failures cost one
/// argon2 run.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("campus-rater-unknown-user").ok());

async fn check_password(password: String, hash: Option<String>) -> Result<bool, AppError> {
    let verified = tokio::task::spawn_blocking(move || {
        hash.is_some_and(|hash| verify_password(&password, &hash))
    })
    .await
    .context("Password verification task failed")?;
    Ok(verified)
}

/// Creates an account and opens a session for it.
#[instrument(skip(store, form), fields(username = %form.username))]
pub async fn register(
    store: &dyn Store,
    form: RegisterForm,
) -> Result<(User, SessionToken), AppError> {
    let form_context = json!({ "form": { "username": form.username } });
    let account = form
        .validate()
        .map_err(|errors| AppError::validation(errors, form_context.clone()))?;

    let password = account.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")??;

    let user = match store.create_user(&account.username, hash).await {
        Ok(user) => user,
        Err(StoreError::UsernameTaken(_)) => {
            return Err(AppError::validation(
                FieldErrors::single("username", "A user with that username already exists."),
                form_context,
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let token = store.create_session(user.id).await?;
    info!(user_id = user.id, "Account registered");
    Ok((user, token))
}

/// Checks credentials and opens a session.
#[instrument(skip(store, form), fields(username = %form.username))]
pub async fn login(
    store: &dyn Store,
    form: LoginForm,
) -> Result<(User, SessionToken), AppError> {
    let form_context = json!({ "form": { "username": form.username } });
    form.validate()
        .map_err(|errors| AppError::validation(errors, form_context.clone()))?;

    let rejected = || {
        AppError::validation(
            FieldErrors::single(NON_FIELD_ERRORS, BAD_CREDENTIALS),
            form_context.clone(),
        )
    };

    let Some(user) = store.user_by_username(form.username.trim()).await? else {
        check_password(form.password, Option::clone(&DUMMY_HASH)).await?;
        warn!("Login for unknown username");
        return Err(rejected());
    };

    let verified = check_password(form.password, Some(user.password_hash.clone())).await?;
    if !verified {
        warn!(user_id = user.id, "Login with wrong password");
        return Err(rejected());
    }

    let token = store.create_session(user.id).await?;
    info!(user_id = user.id, "Logged in");
    Ok((user, token))
}

#[instrument(skip(store, user), fields(username = %user.username))]
pub async fn logout(store: &dyn Store, user: &User, token: SessionToken) -> Result<(), AppError> {
    store.end_session(token).await?;
    info!(user_id = user.id, "Logged out");
    Ok(())
}
