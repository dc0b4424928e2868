//! Form parsing and field-level validation.
//!
//! Forms arrive URL-encoded with every field as a string, so a malformed
//! number becomes a field error instead of a rejected request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ratings::SubRatings;
use crate::ratings::types::{MAX_RATING, MIN_RATING};

/// Key under which errors not tied to one field are reported.
pub const NON_FIELD_ERRORS: &str = "__all__";

pub const MAX_REVIEW_TEXT: usize = 2000;
pub const MAX_USERNAME: usize = 150;
pub const MIN_PASSWORD: usize = 8;
pub const MAX_BIO: usize = 500;
pub const MAX_URL: usize = 200;

const REQUIRED: &str = "This field is required.";

/// Field name to error messages.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Errors for a single field, empty when the field is valid.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

fn parse_rating(field: &str, raw: &str, errors: &mut FieldErrors) -> u8 {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, REQUIRED);
        return 0;
    }

    match raw.parse::<i64>() {
        Ok(value) if (i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&value) => {
            value as u8
        }
        Ok(_) => {
            errors.add(
                field,
                format!("Ensure this value is between {MIN_RATING} and {MAX_RATING}."),
            );
            0
        }
        Err(_) => {
            errors.add(field, "Enter a whole number.");
            0
        }
    }
}

fn check_url(field: &str, raw: &str, errors: &mut FieldErrors) {
    if raw.is_empty() {
        return;
    }
    if raw.chars().count() > MAX_URL {
        errors.add(
            field,
            format!("Ensure this value has at most {MAX_URL} characters."),
        );
    }
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        errors.add(field, "Enter a valid URL.");
    }
}

/// Review submission form.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewForm {
    pub value_for_money: String,
    pub teaching_quality: String,
    pub course_content: String,
    pub job_prospects: String,
    pub review_text: String,
}

/// A review form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReview {
    pub ratings: SubRatings,
    pub review_text: String,
}

impl ReviewForm {
    pub fn validate(&self) -> Result<ValidReview, FieldErrors> {
        let mut errors = FieldErrors::default();

        let ratings = SubRatings::new(
            parse_rating("value_for_money", &self.value_for_money, &mut errors),
            parse_rating("teaching_quality", &self.teaching_quality, &mut errors),
            parse_rating("course_content", &self.course_content, &mut errors),
            parse_rating("job_prospects", &self.job_prospects, &mut errors),
        );

        let review_text = self.review_text.trim();
        if review_text.is_empty() {
            errors.add("review_text", REQUIRED);
        } else if review_text.chars().count() > MAX_REVIEW_TEXT {
            errors.add(
                "review_text",
                format!("Ensure this value has at most {MAX_REVIEW_TEXT} characters."),
            );
        }

        errors.finish(|| ValidReview {
            ratings,
            review_text: review_text.to_string(),
        })
    }
}

/// Account creation form.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

/// Cleaned registration data.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
}

fn valid_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

/// Checks the shape of an already-trimmed username.
pub fn check_username(field: &str, username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add(field, REQUIRED);
    } else if username.chars().count() > MAX_USERNAME {
        errors.add(
            field,
            format!("Ensure this value has at most {MAX_USERNAME} characters."),
        );
    } else if !username.chars().all(valid_username_char) {
        errors.add(
            field,
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

impl RegisterForm {
    /// Validates field shapes. Username uniqueness is checked by the store.
    pub fn validate(&self) -> Result<NewAccount, FieldErrors> {
        let mut errors = FieldErrors::default();

        let username = self.username.trim();
        check_username("username", username, &mut errors);

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                if self.password1.chars().count() < MIN_PASSWORD {
                    errors.add(
                        "password2",
                        format!(
                            "This password is too short. It must contain at least {MIN_PASSWORD} characters."
                        ),
                    );
                }
                if self.password1.chars().all(|c| c.is_ascii_digit()) {
                    errors.add("password2", "This password is entirely numeric.");
                }
            }
        }

        errors.finish(|| NewAccount {
            username: username.to_string(),
            password: self.password1.clone(),
        })
    }
}

/// Login form.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.finish(|| ())
    }
}

/// Student profile edit form.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileForm {
    pub bio: String,
    pub website: String,
    pub picture: String,
}

/// Cleaned profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub bio: String,
    pub website: String,
    pub picture: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileChanges, FieldErrors> {
        let mut errors = FieldErrors::default();

        let bio = self.bio.trim();
        if bio.chars().count() > MAX_BIO {
            errors.add(
                "bio",
                format!("Ensure this value has at most {MAX_BIO} characters."),
            );
        }
        let website = self.website.trim();
        check_url("website", website, &mut errors);
        let picture = self.picture.trim();
        check_url("picture", picture, &mut errors);

        errors.finish(|| ProfileChanges {
            bio: bio.to_string(),
            website: website.to_string(),
            picture: picture.to_string(),
        })
    }
}
