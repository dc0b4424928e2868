//! Review rating aggregation.
//!
//! Each review carries four sub-ratings. A review's composite is their
//! mean, a course's rating is the mean composite over its reviews, and a
//! university's rating is the unweighted mean over its rated courses.

pub mod aggregate;
pub mod grade;
pub mod types;
pub mod utility;

pub use aggregate::{course_rating, summarize_course, university_rating};
pub use grade::grade;
pub use types::{CourseSummary, DimensionSummary, SubRatings};
