//! Data types used by the rating aggregator.

use serde::{Deserialize, Serialize};

/// Lowest accepted sub-rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted sub-rating.
pub const MAX_RATING: u8 = 5;

/// The four dimensions every review is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRatings {
    pub value_for_money: u8,
    pub teaching_quality: u8,
    pub course_content: u8,
    pub job_prospects: u8,
}

impl SubRatings {
    pub fn new(
        value_for_money: u8,
        teaching_quality: u8,
        course_content: u8,
        job_prospects: u8,
    ) -> Self {
        Self {
            value_for_money,
            teaching_quality,
            course_content,
            job_prospects,
        }
    }

    /// Sum of all four dimensions.
    pub fn total(&self) -> u32 {
        u32::from(self.value_for_money)
            + u32::from(self.teaching_quality)
            + u32::from(self.course_content)
            + u32::from(self.job_prospects)
    }

    /// Mean of the four dimensions for this single review.
    pub fn composite(&self) -> f64 {
        self.total() as f64 / 4.0
    }
}

/// Average and spread of one dimension across a course's reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DimensionSummary {
    pub avg: f64,
    pub stddev: f64,
}

/// Per-course aggregate shown on list and detail pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub review_count: usize,
    /// `None` when the course has no reviews.
    pub rating: Option<f64>,
    pub grade: Option<String>,
    pub value_for_money: Option<DimensionSummary>,
    pub teaching_quality: Option<DimensionSummary>,
    pub course_content: Option<DimensionSummary>,
    pub job_prospects: Option<DimensionSummary>,
}
