use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo_types::{Sex, User};

/// Request body for signup. Every field is free text; validation decides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub sex: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for login.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub sex: Sex,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            phone_number: u.phone_number.clone(),
            sex: u.sex,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_form_reads_camel_case_and_tolerates_missing_fields() {
        let form: SignupForm =
            serde_json::from_str(r#"{"username":"x","phoneNumber":"1","confirmPassword":"p"}"#)
                .unwrap();
        assert_eq!(form.phone_number, "1");
        assert_eq!(form.confirm_password, "p");
        assert!(form.sex.is_empty());
    }

    #[test]
    fn public_user_hides_password() {
        let user = User {
            id: 5,
            username: "x".into(),
            email: "x@y.z".into(),
            phone_number: "1".into(),
            sex: Sex::Male,
            password: "Secret1!".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("x@y.z"));
        assert!(!json.contains("Secret1!"));
        assert!(!json.contains("password"));
    }
}
