use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{SESSION_TTL_SECS, SessionToken, Store, StoreError};
use crate::models::{
    Course, CourseId, Degree, DegreeId, Enrollment, Location, LocationId, NewReview, Review,
    ReviewId, StudentProfile, University, UniversityId, User, UserId,
};
use crate::search::{SearchFields, matches, normalize_term};

/// Store contents. Built directly by the catalog loader.
#[derive(Debug, Default)]
pub(super) struct Inner {
    pub(super) locations: BTreeMap<LocationId, Location>,
    pub(super) degrees: BTreeMap<DegreeId, Degree>,
    pub(super) universities: BTreeMap<UniversityId, University>,
    pub(super) courses: BTreeMap<CourseId, Course>,
    pub(super) reviews: Vec<Review>,
    pub(super) enrollments: HashMap<UserId, Enrollment>,
    pub(super) users: BTreeMap<UserId, User>,
    profiles: HashMap<UserId, StudentProfile>,
    sessions: HashMap<SessionToken, Session>,
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: UserId,
    issued_at: DateTime<Utc>,
}

impl Session {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at < Duration::seconds(SESSION_TTL_SECS)
    }
}

/// Usernames compare equal under full Unicode lowercasing.
fn same_username(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl Inner {
    fn next_review_id(&self) -> ReviewId {
        self.reviews.last().map_or(1, |r| r.id + 1)
    }

    fn next_user_id(&self) -> UserId {
        self.users.keys().next_back().map_or(1, |id| id + 1)
    }

    pub(super) fn add_user(
        &mut self,
        username: &str,
        password_hash: String,
    ) -> Result<User, StoreError> {
        let taken = self
            .users
            .values()
            .any(|u| same_username(&u.username, username));
        if taken {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }

        let user = User {
            id: self.next_user_id(),
            username: username.to_string(),
            password_hash,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub(super) fn add_review(&mut self, review: NewReview) -> Result<Review, StoreError> {
        if !self.users.contains_key(&review.user_id) {
            return Err(StoreError::UnknownUser(review.user_id));
        }
        if !self.courses.contains_key(&review.course_id) {
            return Err(StoreError::UnknownCourse(review.course_id));
        }

        let stored = Review {
            id: self.next_review_id(),
            user_id: review.user_id,
            course_id: review.course_id,
            university_id: review.university_id,
            ratings: review.ratings,
            review_text: review.review_text,
            created_at: Utc::now(),
        };
        self.reviews.push(stored.clone());
        Ok(stored)
    }

    fn search_fields<'a>(&'a self, university: &'a University) -> SearchFields<'a> {
        let courses: Vec<&Course> = self
            .courses
            .values()
            .filter(|c| c.university_id == university.id)
            .collect();

        SearchFields {
            name: &university.name,
            location: university
                .location_id
                .and_then(|id| self.locations.get(&id))
                .map(|l| l.name.as_str()),
            degrees: courses
                .iter()
                .filter_map(|c| c.degree_id)
                .filter_map(|id| self.degrees.get(&id))
                .map(|d| d.name.as_str())
                .collect(),
            courses: courses.iter().map(|c| c.name.as_str()).collect(),
        }
    }
}

/// In-process [`Store`]. Every write takes the same lock, so username
/// uniqueness and profile get-or-create are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Number of stored reviews.
    pub async fn review_count(&self) -> usize {
        self.inner.read().await.reviews.len()
    }
}

fn sorted_by_name<T, F>(mut items: Vec<T>, name: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| name(a).cmp(name(b)));
    items
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn list_universities(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<University>, StoreError> {
        let inner = self.inner.read().await;
        let term = normalize_term(search);

        let found: Vec<University> = inner
            .universities
            .values()
            .filter(|u| match &term {
                Some(term) => matches(&inner.search_fields(u), term),
                None => true,
            })
            .cloned()
            .collect();

        debug!(search = ?term, found = found.len(), "Listed universities");
        Ok(sorted_by_name(found, |u| u.name.as_str()))
    }

    async fn university(&self, id: UniversityId) -> Result<Option<University>, StoreError> {
        Ok(self.inner.read().await.universities.get(&id).cloned())
    }

    async fn university_by_slug(&self, slug: &str) -> Result<Option<University>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .universities
            .values()
            .find(|u| u.slug == slug)
            .cloned())
    }

    async fn courses_of(&self, university_id: UniversityId) -> Result<Vec<Course>, StoreError> {
        let inner = self.inner.read().await;
        let courses = inner
            .courses
            .values()
            .filter(|c| c.university_id == university_id)
            .cloned()
            .collect();
        Ok(sorted_by_name(courses, |c| c.name.as_str()))
    }

    async fn course(&self, id: CourseId) -> Result<Option<Course>, StoreError> {
        Ok(self.inner.read().await.courses.get(&id).cloned())
    }

    async fn course_by_slug(&self, slug: &str) -> Result<Option<Course>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.courses.values().find(|c| c.slug == slug).cloned())
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.inner.read().await.locations.get(&id).cloned())
    }

    async fn degree(&self, id: DegreeId) -> Result<Option<Degree>, StoreError> {
        Ok(self.inner.read().await.degrees.get(&id).cloned())
    }

    async fn reviews_for_course(&self, course_id: CourseId) -> Result<Vec<Review>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|r| r.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn reviews_by_user(&self, user_id: UserId) -> Result<Vec<Review>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let stored = self.inner.write().await.add_review(review)?;
        debug!(review_id = stored.id, course_id = stored.course_id, "Review stored");
        Ok(stored)
    }

    async fn enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .enrollments
            .get(&user_id)
            .filter(|e| e.course_ids.contains(&course_id))
            .cloned())
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: String,
    ) -> Result<User, StoreError> {
        self.inner.write().await.add_user(username, password_hash)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| same_username(&u.username, username))
            .cloned())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_or_create_profile(&self, user_id: UserId) -> Result<StudentProfile, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user_id) {
            return Err(StoreError::UnknownUser(user_id));
        }

        let profile = inner.profiles.entry(user_id).or_insert_with(|| {
            debug!(user_id, "Creating empty profile");
            StudentProfile::empty(user_id)
        });
        Ok(profile.clone())
    }

    async fn save_profile(&self, profile: StudentProfile) -> Result<StudentProfile, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&profile.user_id) {
            return Err(StoreError::UnknownUser(profile.user_id));
        }

        inner.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn create_session(&self, user_id: UserId) -> Result<SessionToken, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user_id) {
            return Err(StoreError::UnknownUser(user_id));
        }

        let now = Utc::now();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, session| session.is_live(now));
        let pruned = before - inner.sessions.len();
        if pruned > 0 {
            debug!(pruned, "Pruned expired sessions");
        }

        let token = Uuid::new_v4();
        inner.sessions.insert(
            token,
            Session {
                user_id,
                issued_at: now,
            },
        );
        Ok(token)
    }

    async fn session_user(&self, token: SessionToken) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .get(&token)
            .filter(|session| session.is_live(Utc::now()))
            .and_then(|session| inner.users.get(&session.user_id))
            .cloned())
    }

    async fn end_session(&self, token: SessionToken) -> Result<(), StoreError> {
        self.inner.write().await.sessions.remove(&token);
        Ok(())
    }
}
