use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::error::AppError;
use crate::models::{CourseId, Review, UserId};
use crate::ratings::{CourseSummary, SubRatings, grade, summarize_course, university_rating};
use crate::services::types::{
    CourseDetail, CourseEntry, ReviewEntry, UniversityDetail, UniversityList, UniversityListing,
};
use crate::store::{Store, StoreError};

fn summarize(reviews: &[Review]) -> CourseSummary {
    let ratings: Vec<SubRatings> = reviews.iter().map(|r| r.ratings).collect();
    summarize_course(&ratings)
}

async fn course_summary(
    store: &dyn Store,
    course_id: CourseId,
) -> Result<CourseSummary, StoreError> {
    let reviews = store.reviews_for_course(course_id).await?;
    Ok(summarize(&reviews))
}

/// Lists universities with their ratings, optionally filtered by `search`.
#[instrument(skip(store))]
pub async fn university_list(
    store: &dyn Store,
    search: Option<&str>,
) -> Result<UniversityList, AppError> {
    let universities = store.list_universities(search).await?;
    let mut listings = Vec::with_capacity(universities.len());

    for university in universities {
        let courses = store.courses_of(university.id).await?;

        let mut course_ratings = Vec::with_capacity(courses.len());
        for course in &courses {
            course_ratings.push(course_summary(store, course.id).await?.rating);
        }
        let rating = university_rating(course_ratings);

        let location = match university.location_id {
            Some(id) => store.location(id).await?.map(|l| l.name),
            None => None,
        };

        listings.push(UniversityListing {
            course_count: courses.len(),
            location,
            rating,
            grade: rating.map(grade),
            university,
        });
    }

    debug!(count = listings.len(), "University list assembled");
    Ok(UniversityList {
        search: search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        universities: listings,
    })
}

/// A university with each of its courses' summaries and its overall rating.
#[instrument(skip(store))]
pub async fn university_detail(
    store: &dyn Store,
    slug: &str,
) -> Result<UniversityDetail, AppError> {
    let university = store
        .university_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound("University"))?;

    let location = match university.location_id {
        Some(id) => store.location(id).await?,
        None => None,
    };

    let mut courses = Vec::new();
    for course in store.courses_of(university.id).await? {
        let degree = match course.degree_id {
            Some(id) => store.degree(id).await?.map(|d| d.name),
            None => None,
        };
        let summary = course_summary(store, course.id).await?;
        courses.push(CourseEntry {
            course,
            degree,
            summary,
        });
    }

    let rating = university_rating(courses.iter().map(|c| c.summary.rating));

    Ok(UniversityDetail {
        university,
        location,
        courses,
        university_rating: rating,
        grade: rating.map(grade),
    })
}

/// A course with its summary and every review in submission order.
#[instrument(skip(store))]
pub async fn course_detail(store: &dyn Store, slug: &str) -> Result<CourseDetail, AppError> {
    let course = store
        .course_by_slug(slug)
        .await?
        .ok_or(AppError::NotFound("Course"))?;

    let university = store
        .university(course.university_id)
        .await?
        .ok_or(AppError::NotFound("University"))?;

    let degree = match course.degree_id {
        Some(id) => store.degree(id).await?,
        None => None,
    };

    let reviews = store.reviews_for_course(course.id).await?;
    let summary = summarize(&reviews);

    let mut authors: HashMap<UserId, String> = HashMap::new();
    let mut entries = Vec::with_capacity(reviews.len());
    for review in reviews {
        if !authors.contains_key(&review.user_id) {
            let name = store
                .user(review.user_id)
                .await?
                .map(|u| u.username)
                .unwrap_or_default();
            authors.insert(review.user_id, name);
        }
        entries.push(ReviewEntry {
            author: authors[&review.user_id].clone(),
            composite: review.ratings.composite(),
            review,
        });
    }

    Ok(CourseDetail {
        course,
        university,
        degree,
        summary,
        reviews: entries,
    })
}
