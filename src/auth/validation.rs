use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::auth::dto::SignupForm;
use crate::auth::repo_types::{Sex, User};

pub const SPECIAL_CHARS: &str = "!@#$%^&*";

/// Form fields that can carry an error, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Username,
    Email,
    PhoneNumber,
    Sex,
    Password,
    ConfirmPassword,
}

/// One message per field; a later check on the same field replaces the earlier one.
pub type FieldErrors = BTreeMap<Field, String>;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// First failing password rule, if any. Length is counted in UTF-16 code
/// units, as the signup form measures it.
pub fn password_error(password: &str) -> Option<&'static str> {
    if password.encode_utf16().count() < 8 {
        Some("Password must be at least 8 characters")
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some("Password must contain a number")
    } else if !password.chars().any(|c| c.is_ascii_lowercase()) {
        Some("Password must contain a lowercase letter")
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        Some("Password must contain an uppercase letter")
    } else if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        Some("Password must contain a special character")
    } else {
        None
    }
}

pub fn validate_signup(form: &SignupForm, existing: &[User]) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.username.trim().is_empty() {
        errors.insert(Field::Username, "Username is required".into());
    }

    if !is_valid_email(&form.email) {
        errors.insert(Field::Email, "Please enter a valid email address".into());
    }
    if existing.iter().any(|u| u.email == form.email) {
        errors.insert(Field::Email, "Email already registered".into());
    }

    if form.phone_number.trim().is_empty() {
        errors.insert(Field::PhoneNumber, "Phone number is required".into());
    }

    if form.sex.parse::<Sex>().is_err() {
        errors.insert(Field::Sex, "Please select your sex".into());
    }

    if let Some(msg) = password_error(&form.password) {
        errors.insert(Field::Password, msg.into());
    }

    if form.password != form.confirm_password {
        errors.insert(Field::ConfirmPassword, "Passwords do not match".into());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn form() -> SignupForm {
        SignupForm {
            username: "budi".into(),
            email: "budi@example.com".into(),
            phone_number: "0812345678".into(),
            sex: "male".into(),
            password: "Abc123!@".into(),
            confirm_password: "Abc123!@".into(),
        }
    }

    fn stored(email: &str) -> User {
        User {
            id: 1,
            username: "someone".into(),
            email: email.into(),
            phone_number: "1".into(),
            sex: Sex::Female,
            password: "x".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn valid_form_has_no_errors() {
        assert!(validate_signup(&form(), &[]).is_empty());
    }

    #[test]
    fn password_rules_short_circuit_in_order() {
        assert_eq!(
            password_error("Ab1!"),
            Some("Password must be at least 8 characters")
        );
        assert_eq!(
            password_error("Abcdefg!"),
            Some("Password must contain a number")
        );
        assert_eq!(
            password_error("ABC12345!"),
            Some("Password must contain a lowercase letter")
        );
        assert_eq!(
            password_error("abc12345"),
            Some("Password must contain an uppercase letter")
        );
        assert_eq!(
            password_error("Abc12345"),
            Some("Password must contain a special character")
        );
        assert_eq!(password_error("Abc123!@"), None);
    }

    #[test]
    fn astral_characters_count_twice_toward_length() {
        assert_eq!(password_error("Ab1!\u{1F600}\u{1F600}"), None);
        assert_eq!(
            password_error("Ab1!\u{1F600}"),
            Some("Password must be at least 8 characters")
        );
    }

    #[test]
    fn blank_fields_after_trim_are_required() {
        let mut f = form();
        f.username = "   ".into();
        f.phone_number = "\t".into();
        f.sex = String::new();
        let errors = validate_signup(&f, &[]);
        assert_eq!(errors[&Field::Username], "Username is required");
        assert_eq!(errors[&Field::PhoneNumber], "Phone number is required");
        assert_eq!(errors[&Field::Sex], "Please select your sex");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn unknown_sex_is_rejected() {
        let mut f = form();
        f.sex = "other".into();
        assert!(validate_signup(&f, &[]).contains_key(&Field::Sex));
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@c.d"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn duplicate_email_errors_regardless_of_other_fields() {
        let mut f = form();
        f.password = "short".into();
        let errors = validate_signup(&f, &[stored("budi@example.com")]);
        assert_eq!(errors[&Field::Email], "Email already registered");
        assert!(validate_signup(&form(), &[stored("budi@example.com")])
            .contains_key(&Field::Email));
    }

    #[test]
    fn duplicate_overrides_invalid_pattern_message() {
        let mut f = form();
        f.email = "broken".into();
        let errors = validate_signup(&f, &[stored("broken")]);
        assert_eq!(errors[&Field::Email], "Email already registered");
    }

    #[test]
    fn mismatched_confirmation() {
        let mut f = form();
        f.confirm_password = "Abc123!#".into();
        let errors = validate_signup(&f, &[]);
        assert_eq!(errors[&Field::ConfirmPassword], "Passwords do not match");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn errors_serialize_with_form_field_names() {
        let mut f = form();
        f.phone_number.clear();
        f.confirm_password.clear();
        let json = serde_json::to_value(validate_signup(&f, &[])).unwrap();
        assert_eq!(json["phoneNumber"], "Phone number is required");
        assert_eq!(json["confirmPassword"], "Passwords do not match");
    }
}
