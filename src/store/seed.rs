use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::info;

use super::MemoryStore;
use super::memory::Inner;
use crate::auth::hash_password;
use crate::forms::{FieldErrors, check_username};
use crate::models::{Course, Degree, Enrollment, Location, NewReview, University, slugify};
use crate::ratings::SubRatings;
use crate::ratings::types::{MAX_RATING, MIN_RATING};

/// Seed data for a [`MemoryStore`], stored as JSON on disk:
///
/// ```json
/// {
///   "locations": ["Glasgow"],
///   "degrees": ["Computing Science"],
///   "universities": [{ "name": "University of Glasgow", "location": "Glasgow" }],
///   "courses": [{ "name": "Algorithms", "university": "university-of-glasgow",
///                 "degree": "Computing Science" }],
///   "users": [{ "username": "alice", "password": "s3cret-pass" }],
///   "enrollments": [{ "username": "alice", "courses": ["algorithms"] }],
///   "reviews": [{ "username": "alice", "course": "algorithms",
///                 "value_for_money": 4, "teaching_quality": 5,
///                 "course_content": 4, "job_prospects": 3,
///                 "review_text": "Great lecturers" }]
/// }
/// ```
///
/// Universities and courses are referenced by slug, locations and degrees
/// by name. Omitted slugs are derived from the name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub locations: Vec<String>,
    pub degrees: Vec<String>,
    pub universities: Vec<CatalogUniversity>,
    pub courses: Vec<CatalogCourse>,
    pub users: Vec<CatalogUser>,
    pub enrollments: Vec<CatalogEnrollment>,
    pub reviews: Vec<CatalogReview>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogUniversity {
    pub name: String,
    pub slug: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogCourse {
    pub name: String,
    pub slug: Option<String>,
    pub university: String,
    pub degree: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEnrollment {
    pub username: String,
    pub courses: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogReview {
    pub username: String,
    pub course: String,
    pub value_for_money: u8,
    pub teaching_quality: u8,
    pub course_content: u8,
    pub job_prospects: u8,
    #[serde(default)]
    pub review_text: String,
}

impl Catalog {
    /// Loads the catalog from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("Invalid catalog '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

fn index_by_name<T>(items: &BTreeMap<u64, T>, name: impl Fn(&T) -> &str) -> HashMap<String, u64> {
    items
        .iter()
        .map(|(id, item)| (name(item).to_string(), *id))
        .collect()
}

fn lookup(index: &HashMap<String, u64>, kind: &str, key: &str) -> Result<u64> {
    index
        .get(key)
        .copied()
        .ok_or_else(|| anyhow!("Unknown {kind} '{key}'"))
}

fn check_rating(field: &str, value: u8) -> Result<u8> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(value)
    } else {
        bail!("{field} must be between {MIN_RATING} and {MAX_RATING}, got {value}")
    }
}

impl MemoryStore {
    /// Builds a store from a [`Catalog`], hashing seed passwords on the way.
    ///
    /// # Errors
    ///
    /// Fails on duplicate slugs or names, references that do not resolve, and
    /// ratings outside the accepted range.
    pub fn from_catalog(catalog: Catalog) -> Result<Self> {
        let mut inner = Inner::default();

        for (id, name) in (1..).zip(catalog.locations) {
            inner.locations.insert(id, Location { id, name });
        }
        for (id, name) in (1..).zip(catalog.degrees) {
            inner.degrees.insert(id, Degree { id, name });
        }
        let locations = index_by_name(&inner.locations, |l| l.name.as_str());
        let degrees = index_by_name(&inner.degrees, |d| d.name.as_str());
        if locations.len() != inner.locations.len() || degrees.len() != inner.degrees.len() {
            bail!("Location and degree names must be unique");
        }

        let mut university_slugs = HashMap::new();
        for (id, entry) in (1..).zip(catalog.universities) {
            let slug = entry.slug.unwrap_or_else(|| slugify(&entry.name));
            let location_id = entry
                .location
                .as_deref()
                .map(|name| lookup(&locations, "location", name))
                .transpose()?;
            if university_slugs.insert(slug.clone(), id).is_some() {
                bail!("Duplicate university slug '{slug}'");
            }
            inner.universities.insert(
                id,
                University {
                    id,
                    name: entry.name,
                    slug,
                    location_id,
                },
            );
        }

        let mut course_slugs = HashMap::new();
        for (id, entry) in (1..).zip(catalog.courses) {
            let slug = entry.slug.unwrap_or_else(|| slugify(&entry.name));
            let university_id = lookup(&university_slugs, "university", &entry.university)?;
            let degree_id = entry
                .degree
                .as_deref()
                .map(|name| lookup(&degrees, "degree", name))
                .transpose()?;
            if course_slugs.insert(slug.clone(), id).is_some() {
                bail!("Duplicate course slug '{slug}'");
            }
            inner.courses.insert(
                id,
                Course {
                    id,
                    name: entry.name,
                    slug,
                    university_id,
                    degree_id,
                },
            );
        }

        let mut usernames = HashMap::new();
        for entry in catalog.users {
            let mut errors = FieldErrors::default();
            check_username("username", &entry.username, &mut errors);
            if let Some(message) = errors.get("username").first() {
                bail!("Invalid catalog username '{}': {message}", entry.username);
            }

            let hash = hash_password(&entry.password)?;
            let user = inner.add_user(&entry.username, hash)?;
            usernames.insert(user.username, user.id);
        }

        for entry in catalog.enrollments {
            let user_id = lookup(&usernames, "user", &entry.username)?;
            let course_ids = entry
                .courses
                .iter()
                .map(|slug| lookup(&course_slugs, "course", slug))
                .collect::<Result<Vec<_>>>()?;
            inner.enrollments.insert(
                user_id,
                Enrollment {
                    user_id,
                    course_ids,
                },
            );
        }

        for entry in catalog.reviews {
            let user_id = lookup(&usernames, "user", &entry.username)?;
            let course_id = lookup(&course_slugs, "course", &entry.course)?;
            let university_id = inner.courses[&course_id].university_id;
            let ratings = SubRatings::new(
                check_rating("value_for_money", entry.value_for_money)?,
                check_rating("teaching_quality", entry.teaching_quality)?,
                check_rating("course_content", entry.course_content)?,
                check_rating("job_prospects", entry.job_prospects)?,
            );
            inner.add_review(NewReview {
                user_id,
                course_id,
                university_id,
                ratings,
                review_text: entry.review_text,
            })?;
        }

        info!(
            universities = inner.universities.len(),
            courses = inner.courses.len(),
            users = inner.users.len(),
            reviews = inner.reviews.len(),
            "Catalog loaded"
        );

        Ok(MemoryStore::from_inner(inner))
    }
}
