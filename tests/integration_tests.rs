use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, LOCATION, SET_COOKIE},
    },
    response::Response,
};
use campus_rater::{
    config::Config,
    store::{Catalog, MemoryStore, Store},
    web::{AppState, router},
};
use serde_json::Value;
use tower::ServiceExt;

fn app() -> (Router, Arc<MemoryStore>) {
    let catalog = Catalog::from_json(include_str!("fixtures/catalog.json")).expect("fixture parses");
    let store = Arc::new(MemoryStore::from_catalog(catalog).expect("fixture loads"));
    let state = AppState::new(Config::default(), store.clone());
    (router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn post_form(app: &Router, uri: &str, form: &str, token: Option<&str>) -> Response {
    let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::from(form.to_string())).unwrap()).await
}

async fn json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = post_form(
        app,
        "/login/",
        &format!("username={username}&password={password}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    json(response).await["token"].as_str().unwrap().to_string()
}

fn university<'a>(list: &'a Value, slug: &str) -> &'a Value {
    list["universities"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["university"]["slug"] == slug)
        .unwrap()
}

fn slugs(list: &Value) -> Vec<String> {
    let mut slugs: Vec<String> = list["universities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["university"]["slug"].as_str().unwrap().to_string())
        .collect();
    slugs.sort();
    slugs
}

const VALID_REVIEW: &str =
    "value_for_money=5&teaching_quality=4&course_content=3&job_prospects=2&review_text=Solid+course";

#[tokio::test]
async fn test_landing_page() {
    let (app, _) = app();
    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["links"]["universities"], "/universities/");
}

#[tokio::test]
async fn test_university_list_includes_unrated_universities() {
    let (app, _) = app();
    let list = json(get(&app, "/universities/", None).await).await;

    assert_eq!(list["universities"].as_array().unwrap().len(), 5);

    let glasgow = university(&list, "university-of-glasgow");
    assert_eq!(glasgow["rating"], 3.0);
    assert_eq!(glasgow["grade"], "C");
    assert_eq!(glasgow["location"], "Glasgow");
    assert_eq!(glasgow["course_count"], 3);

    let stirling = university(&list, "university-of-stirling");
    assert!(stirling["rating"].is_null());
}

#[tokio::test]
async fn test_search_matches_name_location_degree_and_course() {
    let (app, _) = app();

    for term in ["Engineering", "engineering", "ENGINEERING"] {
        let list = json(get(&app, &format!("/universities/?search={term}"), None).await).await;
        assert_eq!(
            slugs(&list),
            [
                "clyde-engineering-college",
                "dundee-institute",
                "heriot-watt-university",
                "university-of-glasgow",
            ]
        );
        assert_eq!(list["search"], term);
    }

    let list = json(get(&app, "/universities/?search=marketing", None).await).await;
    assert_eq!(slugs(&list), ["university-of-stirling"]);

    let list = json(get(&app, "/universities/?search=", None).await).await;
    assert_eq!(list["universities"].as_array().unwrap().len(), 5);
    assert!(list["search"].is_null());
}

#[tokio::test]
async fn test_university_detail_ignores_unrated_courses() {
    let (app, _) = app();
    let response = get(&app, "/university_detail/university-of-glasgow/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let detail = json(response).await;
    // Mechanical Design 4.0, Accounting 2.0, Philosophy unrated.
    assert_eq!(detail["university_rating"], 3.0);
    assert_eq!(detail["location"]["name"], "Glasgow");

    let courses = detail["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 3);
    let philosophy = courses
        .iter()
        .find(|c| c["course"]["slug"] == "philosophy")
        .unwrap();
    assert!(philosophy["summary"]["rating"].is_null());
    assert_eq!(philosophy["summary"]["review_count"], 0);
    assert_eq!(philosophy["degree"], "Arts");
}

#[tokio::test]
async fn test_unrated_university_detail_has_no_rating() {
    let (app, _) = app();
    let detail = json(get(&app, "/university_detail/university-of-stirling/", None).await).await;
    assert!(detail["university_rating"].is_null());
    assert!(detail["grade"].is_null());
}

#[tokio::test]
async fn test_unknown_slugs_are_not_found() {
    let (app, _) = app();
    assert_eq!(
        get(&app, "/university_detail/nowhere/", None).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        get(&app, "/courses/nothing/", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_course_detail() {
    let (app, _) = app();
    let detail = json(get(&app, "/courses/accounting/", None).await).await;

    assert_eq!(detail["summary"]["rating"], 2.0);
    assert_eq!(detail["summary"]["review_count"], 2);
    assert_eq!(detail["summary"]["value_for_money"]["avg"], 2.0);
    assert_eq!(detail["university"]["slug"], "university-of-glasgow");
    assert_eq!(detail["degree"]["name"], "Business");

    let reviews = detail["reviews"].as_array().unwrap();
    assert_eq!(reviews[0]["author"], "bob");
    assert_eq!(reviews[0]["composite"], 1.0);
    assert_eq!(reviews[1]["author"], "alice");
    assert_eq!(reviews[1]["review_text"], "Useful");
}

#[tokio::test]
async fn test_course_without_reviews_has_no_rating() {
    let (app, _) = app();
    let detail = json(get(&app, "/courses/welding/", None).await).await;
    assert!(detail["summary"]["rating"].is_null());
    assert!(detail["reviews"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_review_requires_login() {
    let (app, store) = app();
    let before = store.review_count().await;

    let response = post_form(&app, "/courses/mechanical-design/submit_review/", VALID_REVIEW, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/login/?next=/courses/mechanical-design/submit_review/"
    );
    assert_eq!(store.review_count().await, before);

    let response = get(&app, "/courses/mechanical-design/submit_review/", Some("not-a-token")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_submit_review_persists_exactly_one_review() {
    let (app, store) = app();
    let token = login(&app, "bob", "bob-password-1").await;
    let before = store.review_count().await;

    let response = post_form(
        &app,
        "/courses/mechanical-design/submit_review/",
        VALID_REVIEW,
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/courses/mechanical-design/");
    assert_eq!(store.review_count().await, before + 1);

    let course = store.course_by_slug("mechanical-design").await.unwrap().unwrap();
    let bob = store.user_by_username("bob").await.unwrap().unwrap();
    let reviews = store.reviews_for_course(course.id).await.unwrap();
    let review = reviews.last().unwrap();
    assert_eq!(review.user_id, bob.id);
    assert_eq!(review.course_id, course.id);
    assert_eq!(review.university_id, course.university_id);
    assert_eq!(review.review_text, "Solid course");

    // (4*4 + 5+4+3+2) / 8
    let detail = json(get(&app, "/courses/mechanical-design/", None).await).await;
    assert_eq!(detail["summary"]["rating"], 30.0 / 8.0);
}

#[tokio::test]
async fn test_duplicate_reviews_are_accepted() {
    let (app, store) = app();
    let token = login(&app, "alice", "alice-password-1").await;
    let before = store.review_count().await;

    for _ in 0..2 {
        let response = post_form(
            &app,
            "/courses/mechanical-design/submit_review/",
            VALID_REVIEW,
            Some(&token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
    assert_eq!(store.review_count().await, before + 2);
}

#[tokio::test]
async fn test_invalid_review_reports_field_errors_and_writes_nothing() {
    let (app, store) = app();
    let token = login(&app, "bob", "bob-password-1").await;
    let before = store.review_count().await;

    let response = post_form(
        &app,
        "/courses/accounting/submit_review/",
        "value_for_money=9&teaching_quality=abc&course_content=3&job_prospects=3&review_text=",
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json(response).await;
    assert!(body["errors"]["value_for_money"].is_array());
    assert!(body["errors"]["teaching_quality"].is_array());
    assert!(body["errors"]["review_text"].is_array());
    assert!(body["errors"]["course_content"].is_null());
    assert_eq!(body["course"]["slug"], "accounting");
    assert_eq!(body["form"]["value_for_money"], "9");
    assert_eq!(store.review_count().await, before);
}

#[tokio::test]
async fn test_review_for_unknown_course_is_not_found() {
    let (app, store) = app();
    let token = login(&app, "bob", "bob-password-1").await;
    let before = store.review_count().await;

    let response = post_form(&app, "/courses/nothing/submit_review/", VALID_REVIEW, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(store.review_count().await, before);
}

#[tokio::test]
async fn test_review_form_shows_enrollment_for_context() {
    let (app, _) = app();

    let alice = login(&app, "alice", "alice-password-1").await;
    let page = json(get(&app, "/courses/mechanical-design/submit_review/", Some(&alice)).await).await;
    assert!(page["enrollment"].is_object());
    assert_eq!(page["rating_range"], serde_json::json!([1, 5]));

    let bob = login(&app, "bob", "bob-password-1").await;
    let page = json(get(&app, "/courses/mechanical-design/submit_review/", Some(&bob)).await).await;
    assert!(page["enrollment"].is_null());
}

#[tokio::test]
async fn test_register_opens_session_cookie() {
    let (app, _) = app();
    let response = post_form(
        &app,
        "/register/",
        "username=carol&password1=carol-password-1&password2=carol-password-1",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("campus_session="));
    let pair = cookie.split(';').next().unwrap().to_string();

    let request = Request::get("/profile/")
        .header("cookie", pair)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["username"], "carol");
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let (app, _) = app();
    let response = post_form(
        &app,
        "/register/",
        "username=ALICE&password1=another-pass-1&password2=another-pass-1",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(response).await;
    assert_eq!(
        body["errors"]["username"][0],
        "A user with that username already exists."
    );
    assert_eq!(body["form"]["username"], "ALICE");
}

#[tokio::test]
async fn test_login_failures() {
    let (app, _) = app();

    let response = post_form(&app, "/login/", "username=alice&password=wrong-password", None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(response).await["errors"]["__all__"].is_array());

    let response = post_form(&app, "/login/", "username=nobody&password=whatever", None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_redirects_to_next() {
    let (app, _) = app();
    let response = post_form(
        &app,
        "/login/?next=/profile/",
        "username=alice&password=alice-password-1",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/");

    let response = post_form(&app, "/login/", "username=alice&password=alice-password-1", None).await;
    assert_eq!(location(&response), "/universities/");
}

#[tokio::test]
async fn test_profile_rollup_and_update() {
    let (app, _) = app();
    let token = login(&app, "alice", "alice-password-1").await;

    let page = json(get(&app, "/profile/", Some(&token)).await).await;
    assert_eq!(page["profile"]["bio"], "");

    let courses = page["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0]["course"]["slug"], "mechanical-design");
    assert_eq!(courses[0]["rating"], 4.0);
    assert_eq!(courses[0]["review_text"], "Great workshops");
    assert_eq!(courses[1]["course"]["slug"], "accounting");
    assert_eq!(courses[1]["rating"], 3.0);

    let response = post_form(&app, "/profile/", "bio=Hi&website=not-a-url", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(response).await;
    assert!(body["errors"]["website"].is_array());
    assert_eq!(body["profile"]["bio"], "");

    let response = post_form(
        &app,
        "/profile/",
        "bio=Mechanical+engineer&website=https%3A%2F%2Fexample.org",
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/");

    let page = json(get(&app, "/profile/", Some(&token)).await).await;
    assert_eq!(page["profile"]["bio"], "Mechanical engineer");
    assert_eq!(page["profile"]["website"], "https://example.org");
}

#[tokio::test]
async fn test_profile_requires_login() {
    let (app, _) = app();
    let response = get(&app, "/profile/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/profile/");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (app, _) = app();
    let token = login(&app, "bob", "bob-password-1").await;

    let response = post_form(&app, "/logout/", "", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(
        response.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );

    let response = get(&app, "/profile/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_ignores_off_site_next() {
    let (app, _) = app();
    for next in ["/%5Cevil.example", "//evil.example", "/%09/evil.example"] {
        let response = post_form(
            &app,
            &format!("/login/?next={next}"),
            "username=alice&password=alice-password-1",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/universities/");
    }
}

#[tokio::test]
async fn test_logout_is_post_only() {
    let (app, _) = app();
    let token = login(&app, "bob", "bob-password-1").await;

    let response = get(&app, "/logout/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = get(&app, "/profile/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}
