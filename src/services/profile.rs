use chrono::Utc;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::forms::ProfileForm;
use crate::models::{CourseId, Review, StudentProfile, User};
use crate::ratings::{SubRatings, course_rating, grade};
use crate::services::context;
use crate::services::types::{CourseRollup, ProfilePage};
use crate::store::Store;

/// A user's reviews of one course, before the course record is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupRow {
    pub course_id: CourseId,
    pub review_count: usize,
    pub rating: Option<f64>,
    /// Text of the user's first review of the course.
    pub review_text: String,
}

/// Groups one user's reviews by course, in order of each course's first
/// review, and rates each course from those reviews alone.
pub fn rollup(reviews: &[Review]) -> Vec<RollupRow> {
    let mut groups: Vec<(CourseId, Vec<&Review>)> = Vec::new();

    for review in reviews {
        match groups.iter_mut().find(|(id, _)| *id == review.course_id) {
            Some((_, group)) => group.push(review),
            None => groups.push((review.course_id, vec![review])),
        }
    }

    groups
        .into_iter()
        .map(|(course_id, group)| {
            let ratings: Vec<SubRatings> = group.iter().map(|r| r.ratings).collect();
            RollupRow {
                course_id,
                review_count: group.len(),
                rating: course_rating(&ratings),
                review_text: group[0].review_text.clone(),
            }
        })
        .collect()
}

async fn page(
    store: &dyn Store,
    user: &User,
    profile: StudentProfile,
) -> Result<ProfilePage, AppError> {
    let reviews = store.reviews_by_user(user.id).await?;

    let mut courses = Vec::new();
    for row in rollup(&reviews) {
        let Some(course) = store.course(row.course_id).await? else {
            continue;
        };
        courses.push(CourseRollup {
            course,
            review_count: row.review_count,
            grade: row.rating.map(grade),
            rating: row.rating,
            review_text: row.review_text,
        });
    }

    Ok(ProfilePage {
        username: user.username.clone(),
        profile,
        courses,
    })
}

/// The user's profile, created empty on first visit, with their review rollup.
#[instrument(skip(store, user), fields(user = %user.username))]
pub async fn profile_page(store: &dyn Store, user: &User) -> Result<ProfilePage, AppError> {
    let profile = store.get_or_create_profile(user.id).await?;
    page(store, user, profile).await
}

/// Applies a profile form. Invalid input leaves the stored profile untouched.
#[instrument(skip(store, user, form), fields(user = %user.username))]
pub async fn update_profile(
    store: &dyn Store,
    user: &User,
    form: ProfileForm,
) -> Result<StudentProfile, AppError> {
    let mut profile = store.get_or_create_profile(user.id).await?;

    let changes = match form.validate() {
        Ok(changes) => changes,
        Err(errors) => {
            let page = page(store, user, profile).await?;
            let mut ctx = context(&page)?;
            ctx["form"] = context(&form)?;
            return Err(AppError::validation(errors, ctx));
        }
    };

    profile.bio = changes.bio;
    profile.website = changes.website;
    profile.picture = changes.picture;
    profile.updated_at = Utc::now();

    let saved = store.save_profile(profile).await?;
    info!("Profile updated");
    Ok(saved)
}
