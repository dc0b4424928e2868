use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{
        StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::{CurrentUser, expired_session_cookie, session_cookie};
use crate::error::AppError;
use crate::forms::{LoginForm, ProfileForm, RegisterForm, ReviewForm};
use crate::models::User;
use crate::services::types::{
    CourseDetail, ProfilePage, ReviewFormPage, SessionPayload, UniversityDetail, UniversityList,
};
use crate::services::{accounts, catalog, profile, reviews};
use crate::store::SessionToken;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NextParams {
    next: Option<String>,
}

/// Accepts `next` only when it is a path on this site.
///
/// Browsers read `/\host` as `//host` and drop tabs and newlines, so
/// backslashes and control characters are refused anywhere in the path.
fn local_redirect(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => fallback.to_string(),
    }
}

fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(|c| c == '\\' || c.is_ascii_control())
}

fn session_response(user: User, token: SessionToken, redirect: String) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(LOCATION, redirect.clone()), (SET_COOKIE, session_cookie(token))],
        Json(SessionPayload {
            username: user.username,
            token,
            redirect,
        }),
    )
        .into_response()
}

pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "name": "campus_rater",
        "links": {
            "universities": "/universities/",
            "register": "/register/",
            "login": "/login/",
            "profile": "/profile/",
        }
    }))
}

pub async fn university_list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<UniversityList>, AppError> {
    let list = catalog::university_list(state.store.as_ref(), params.search.as_deref()).await?;
    Ok(Json(list))
}

pub async fn university_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<UniversityDetail>, AppError> {
    Ok(Json(
        catalog::university_detail(state.store.as_ref(), &slug).await?,
    ))
}

pub async fn course_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CourseDetail>, AppError> {
    Ok(Json(catalog::course_detail(state.store.as_ref(), &slug).await?))
}

pub async fn review_form_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<ReviewFormPage>, AppError> {
    let page = reviews::review_form(state.store.as_ref(), &current.user, &slug).await?;
    Ok(Json(page))
}

pub async fn submit_review_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect, AppError> {
    reviews::submit_review(state.store.as_ref(), &current.user, &slug, form).await?;
    Ok(Redirect::to(&format!("/courses/{slug}/")))
}

pub async fn register_form_handler() -> Json<Value> {
    Json(json!({ "form": { "username": "" } }))
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let (user, token) = accounts::register(state.store.as_ref(), form).await?;
    Ok(session_response(user, token, "/".to_string()))
}

pub async fn login_form_handler(Query(params): Query<NextParams>) -> Json<Value> {
    Json(json!({
        "form": { "username": "" },
        "next": local_redirect(params.next.as_deref(), "/universities/"),
    }))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NextParams>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let (user, token) = accounts::login(state.store.as_ref(), form).await?;
    let redirect = local_redirect(params.next.as_deref(), "/universities/");
    Ok(session_response(user, token, redirect))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    accounts::logout(state.store.as_ref(), &current.user, current.token).await?;
    Ok((
        StatusCode::SEE_OTHER,
        [(LOCATION, "/".to_string()), (SET_COOKIE, expired_session_cookie())],
    )
        .into_response())
}

pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<ProfilePage>, AppError> {
    Ok(Json(
        profile::profile_page(state.store.as_ref(), &current.user).await?,
    ))
}

pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, AppError> {
    profile::update_profile(state.store.as_ref(), &current.user, form).await?;
    Ok(Redirect::to("/profile/"))
}
