//! Persistence for catalog entities, reviews, accounts and sessions.
//!
//! [`Store`] is the async trait handlers and services talk to.
//! [`MemoryStore`] implements it in process behind a single `RwLock`.
//! [`Catalog`] is the JSON seed file a store is loaded from.

mod memory;
mod seed;

pub use memory::MemoryStore;
pub use seed::{
    Catalog, CatalogCourse, CatalogEnrollment, CatalogReview, CatalogUniversity, CatalogUser,
};

use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Course, CourseId, Degree, DegreeId, Enrollment, Location, LocationId, NewReview, Review,
    StudentProfile, University, UniversityId, User, UserId,
};

/// Opaque session identifier handed to clients after login.
pub type SessionToken = Uuid;

/// Sessions stop authenticating this long after they were created.
pub const SESSION_TTL_SECS: i64 = 14 * 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Unknown user {0}")]
    UnknownUser(UserId),

    #[error("Unknown course {0}")]
    UnknownCourse(CourseId),
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Returns universities ordered by name, filtered by `search` when it
    /// is a non-blank term. Each university appears at most once.
    async fn list_universities(&self, search: Option<&str>)
    -> Result<Vec<University>, StoreError>;

    async fn university(&self, id: UniversityId) -> Result<Option<University>, StoreError>;

    async fn university_by_slug(&self, slug: &str) -> Result<Option<University>, StoreError>;

    /// Courses of one university, ordered by name.
    async fn courses_of(&self, university_id: UniversityId) -> Result<Vec<Course>, StoreError>;

    async fn course(&self, id: CourseId) -> Result<Option<Course>, StoreError>;

    async fn course_by_slug(&self, slug: &str) -> Result<Option<Course>, StoreError>;

    async fn location(&self, id: LocationId) -> Result<Option<Location>, StoreError>;

    async fn degree(&self, id: DegreeId) -> Result<Option<Degree>, StoreError>;

    /// Reviews of one course in submission order.
    async fn reviews_for_course(&self, course_id: CourseId) -> Result<Vec<Review>, StoreError>;

    /// Reviews written by one user in submission order.
    async fn reviews_by_user(&self, user_id: UserId) -> Result<Vec<Review>, StoreError>;

    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError>;

    /// The user's enrollment if it includes `course_id`.
    async fn enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StoreError>;

    /// Creates a user. Usernames are unique ignoring case.
    async fn create_user(&self, username: &str, password_hash: String)
    -> Result<User, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Returns the user's profile, creating an empty one first if needed.
    /// Calling it repeatedly yields the same profile.
    async fn get_or_create_profile(&self, user_id: UserId) -> Result<StudentProfile, StoreError>;

    async fn save_profile(&self, profile: StudentProfile) -> Result<StudentProfile, StoreError>;

    async fn create_session(&self, user_id: UserId) -> Result<SessionToken, StoreError>;

    /// The user behind a live session. Unknown and expired tokens give `None`.
    async fn session_user(&self, token: SessionToken) -> Result<Option<User>, StoreError>;

    async fn end_session(&self, token: SessionToken) -> Result<(), StoreError>;
}
