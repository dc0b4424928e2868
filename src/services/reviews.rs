use tracing::{info, instrument};

use crate::error::AppError;
use crate::forms::ReviewForm;
use crate::models::{NewReview, Review, User};
use crate::ratings::types::{MAX_RATING, MIN_RATING};
use crate::services::context;
use crate::services::types::ReviewFormPage;
use crate::store::Store;

async fn form_page(
    store: &dyn Store,
    user: &User,
    slug: &str,
    form: ReviewForm,
) -> Result<ReviewFormPage, AppError> {
    let course = store
        .course_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound("Course"))?;
    let university = store
        .university(course.university_id)
        .await?
        .ok_or(AppError::NotFound("University"))?;
    let enrollment = store.enrollment(user.id, course.id).await?;

    Ok(ReviewFormPage {
        course,
        university,
        enrollment,
        rating_range: [MIN_RATING, MAX_RATING],
        form,
    })
}

/// Context for an empty review form.
#[instrument(skip(store, user), fields(user = %user.username))]
pub async fn review_form(
    store: &dyn Store,
    user: &User,
    slug: &str,
) -> Result<ReviewFormPage, AppError> {
    form_page(store, user, slug, ReviewForm::default()).await
}

/// Validates and stores one review by `user` for the course at `slug`.
///
/// The review is stamped with the course's university. Enrollment is looked
/// up for the form context only and never blocks a submission, and repeat
/// reviews of the same course are accepted.
#[instrument(skip(store, user, form), fields(user = %user.username))]
pub async fn submit_review(
    store: &dyn Store,
    user: &User,
    slug: &str,
    form: ReviewForm,
) -> Result<Review, AppError> {
    let page = form_page(store, user, slug, form).await?;
    let valid = match page.form.validate() {
        Ok(valid) => valid,
        Err(errors) => return Err(AppError::validation(errors, context(&page)?)),
    };

    let review = store
        .insert_review(NewReview {
            user_id: user.id,
            course_id: page.course.id,
            university_id: page.course.university_id,
            ratings: valid.ratings,
            review_text: valid.review_text,
        })
        .await?;

    info!(
        review_id = review.id,
        course = %page.course.slug,
        enrolled = page.enrollment.is_some(),
        "Review submitted"
    );
    Ok(review)
}
