use crate::ratings::grade::grade;
use crate::ratings::types::{CourseSummary, DimensionSummary, SubRatings};
use crate::ratings::utility::{mean, stddev};

/// Rates a course from its reviews' sub-ratings.
///
/// Returns `None` when there are no reviews. Otherwise the result is the
/// sum of every dimension across every review divided by `4 * n`, which is
/// the mean of the per-review composites.
pub fn course_rating<'a, I>(reviews: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a SubRatings>,
{
    let (total, count) = reviews
        .into_iter()
        .fold((0u64, 0u64), |(total, count), r| {
            (total + u64::from(r.total()), count + 1)
        });

    if count == 0 {
        None
    } else {
        Some(total as f64 / (4 * count) as f64)
    }
}

/// Rates a university from its courses' ratings.
///
/// Unrated courses are skipped rather than counted as zero, and every rated
/// course weighs the same regardless of how many reviews it has.
pub fn university_rating<I>(course_ratings: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let rated: Vec<f64> = course_ratings.into_iter().flatten().collect();
    mean(&rated)
}

/// Builds the full [`CourseSummary`] for a course: composite rating, grade,
/// and per-dimension average and standard deviation.
pub fn summarize_course(reviews: &[SubRatings]) -> CourseSummary {
    let rating = course_rating(reviews);

    let dimension = |pick: fn(&SubRatings) -> u8| -> Option<DimensionSummary> {
        let series: Vec<f64> = reviews.iter().map(|r| f64::from(pick(r))).collect();
        let avg = mean(&series)?;
        Some(DimensionSummary {
            avg,
            stddev: stddev(&series, avg),
        })
    };

    CourseSummary {
        review_count: reviews.len(),
        rating,
        grade: rating.map(grade),
        value_for_money: dimension(|r| r.value_for_money),
        teaching_quality: dimension(|r| r.teaching_quality),
        course_content: dimension(|r| r.course_content),
        job_prospects: dimension(|r| r.job_prospects),
    }
}
