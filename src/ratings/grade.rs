/// Converts a composite rating (1.0–5.0) into a letter grade.
///
/// | Range       | Grade |
/// |-------------|-------|
/// | >= 4.5      | A     |
/// | >= 3.5      | B     |
/// | >= 2.5      | C     |
/// | >= 1.5      | D     |
/// | < 1.5       | F     |
pub fn grade(rating: f64) -> String {
    match rating {
        r if r >= 4.5 => "A".into(),
        r if r >= 3.5 => "B".into(),
        r if r >= 2.5 => "C".into(),
        r if r >= 1.5 => "D".into(),
        _ => "F".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade(5.0), "A");
        assert_eq!(grade(4.5), "A");
        assert_eq!(grade(4.49), "B");
        assert_eq!(grade(3.5), "B");
        assert_eq!(grade(3.49), "C");
        assert_eq!(grade(2.5), "C");
        assert_eq!(grade(2.49), "D");
        assert_eq!(grade(1.5), "D");
        assert_eq!(grade(1.49), "F");
        assert_eq!(grade(1.0), "F");
    }
}
