//! Rating exports.
//!
//! Rates every course in a store and writes one CSV row per course,
//! optionally gzip-compressed.

use std::io::Write;

use anyhow::{Result, anyhow};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::ratings::{SubRatings, course_rating, grade};
use crate::store::Store;

/// One exported row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRatingRecord {
    pub university: String,
    pub course: String,
    pub review_count: usize,
    pub rating: Option<f64>,
    pub grade: Option<String>,
}

/// Rates every course, ordered by university name then course name.
pub async fn collect_course_ratings(store: &dyn Store) -> Result<Vec<CourseRatingRecord>> {
    let mut records = Vec::new();

    for university in store.list_universities(None).await? {
        for course in store.courses_of(university.id).await? {
            let ratings: Vec<SubRatings> = store
                .reviews_for_course(course.id)
                .await?
                .iter()
                .map(|r| r.ratings)
                .collect();
            let rating = course_rating(&ratings);

            records.push(CourseRatingRecord {
                university: university.slug.clone(),
                course: course.slug,
                review_count: ratings.len(),
                rating,
                grade: rating.map(grade),
            });
        }
    }

    debug!(records = records.len(), "Collected course ratings");
    Ok(records)
}

/// Serializes records to CSV bytes with a header row.
pub fn to_csv(records: &[CourseRatingRecord]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish CSV output: {e}"))
}

/// Writes records to `path` as CSV, gzip-compressed when `gzip` is set.
pub fn write_records(path: &str, records: &[CourseRatingRecord], gzip: bool) -> Result<()> {
    let csv = to_csv(records)?;

    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&csv)?;
        encoder.finish()?
    } else {
        csv
    };

    std::fs::write(path, &body)?;
    info!(path, rows = records.len(), gzip, bytes = body.len(), "Ratings exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Catalog, MemoryStore};
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn record(course: &str, rating: Option<f64>) -> CourseRatingRecord {
        CourseRatingRecord {
            university: "uni".to_string(),
            course: course.to_string(),
            review_count: usize::from(rating.is_some()),
            rating,
            grade: rating.map(grade),
        }
    }

    #[test]
    fn test_to_csv_writes_header_and_rows() {
        let csv = to_csv(&[record("a", Some(4.5)), record("b", None)]).unwrap();
        let text = String::from_utf8(csv).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "university,course,review_count,rating,grade");
        assert_eq!(lines[1], "uni,a,1,4.5,A");
        assert_eq!(lines[2], "uni,b,0,,");
    }

    #[test]
    fn test_write_records_gzip() {
        let path = temp_path("campus_rater_test_export.csv.gz");
        let _ = fs::remove_file(&path);

        write_records(&path, &[record("a", Some(3.0))], true).unwrap();

        let mut decoded = String::new();
        GzDecoder::new(fs::File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.contains("uni,a,1,3.0,C"));

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_collect_course_ratings() {
        let catalog = Catalog::from_json(
            r#"{
                "universities": [{ "name": "Alpha" }, { "name": "Beta" }],
                "courses": [
                    { "name": "Rated", "university": "beta" },
                    { "name": "Unrated", "university": "alpha" }
                ],
                "users": [{ "username": "u", "password": "password-1" }],
                "reviews": [
                    { "username": "u", "course": "rated", "value_for_money": 5,
                      "teaching_quality": 5, "course_content": 5, "job_prospects": 5 },
                    { "username": "u", "course": "rated", "value_for_money": 1,
                      "teaching_quality": 1, "course_content": 1, "job_prospects": 1 }
                ]
            }"#,
        )
        .unwrap();
        let store = MemoryStore::from_catalog(catalog).unwrap();

        let records = collect_course_ratings(&store).await.unwrap();
        assert_eq!(
            records,
            [
                CourseRatingRecord {
                    university: "alpha".to_string(),
                    course: "unrated".to_string(),
                    review_count: 0,
                    rating: None,
                    grade: None,
                },
                CourseRatingRecord {
                    university: "beta".to_string(),
                    course: "rated".to_string(),
                    review_count: 2,
                    rating: Some(3.0),
                    grade: Some("C".to_string()),
                },
            ]
        );
    }
}
