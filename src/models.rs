//! Persisted entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ratings::SubRatings;

pub type LocationId = u64;
pub type DegreeId = u64;
pub type UniversityId = u64;
pub type CourseId = u64;
pub type ReviewId = u64;
pub type UserId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degree {
    pub id: DegreeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub id: UniversityId,
    pub name: String,
    pub slug: String,
    pub location_id: Option<LocationId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub slug: String,
    pub university_id: UniversityId,
    pub degree_id: Option<DegreeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub university_id: UniversityId,
    #[serde(flatten)]
    pub ratings: SubRatings,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

/// A review that has passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub university_id: UniversityId,
    pub ratings: SubRatings,
    pub review_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub user_id: UserId,
    pub course_ids: Vec<CourseId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub user_id: UserId,
    pub bio: String,
    pub website: String,
    /// URL of the uploaded profile picture, empty when none.
    pub picture: String,
    pub updated_at: DateTime<Utc>,
}

impl StudentProfile {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            bio: String::new(),
            website: String::new(),
            picture: String::new(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

/// Derives a URL slug from a display name.
///
/// ASCII letters and digits are lowercased and kept; every other run of
/// characters becomes a single `-`, trimmed from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
