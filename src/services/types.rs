//! Payloads returned by the page endpoints.

use serde::Serialize;

use crate::forms::ReviewForm;
use crate::models::{Course, Degree, Enrollment, Location, Review, StudentProfile, University};
use crate::ratings::CourseSummary;
use crate::store::SessionToken;

/// One row of the university list.
#[derive(Debug, Serialize)]
pub struct UniversityListing {
    pub university: University,
    pub location: Option<String>,
    pub course_count: usize,
    /// `None` when none of the university's courses has a review.
    pub rating: Option<f64>,
    pub grade: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UniversityList {
    pub search: Option<String>,
    pub universities: Vec<UniversityListing>,
}

/// A course with its rating summary, as listed on the university page.
#[derive(Debug, Serialize)]
pub struct CourseEntry {
    pub course: Course,
    pub degree: Option<String>,
    pub summary: CourseSummary,
}

#[derive(Debug, Serialize)]
pub struct UniversityDetail {
    pub university: University,
    pub location: Option<Location>,
    pub courses: Vec<CourseEntry>,
    pub university_rating: Option<f64>,
    pub grade: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewEntry {
    #[serde(flatten)]
    pub review: Review,
    pub author: String,
    pub composite: f64,
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    pub course: Course,
    pub university: University,
    pub degree: Option<Degree>,
    pub summary: CourseSummary,
    pub reviews: Vec<ReviewEntry>,
}

/// Context for the review submission form.
#[derive(Debug, Serialize)]
pub struct ReviewFormPage {
    pub course: Course,
    pub university: University,
    /// The user's enrollment in this course, shown for context only.
    pub enrollment: Option<Enrollment>,
    pub rating_range: [u8; 2],
    pub form: ReviewForm,
}

/// One course in the profile rollup, rated from the user's own reviews.
#[derive(Debug, Serialize)]
pub struct CourseRollup {
    pub course: Course,
    pub review_count: usize,
    pub rating: Option<f64>,
    pub grade: Option<String>,
    pub review_text: String,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub username: String,
    pub profile: StudentProfile,
    pub courses: Vec<CourseRollup>,
}

/// Body sent with a successful login or registration.
#[derive(Debug, Serialize)]
pub struct SessionPayload {
    pub username: String,
    pub token: SessionToken,
    pub redirect: String,
}
