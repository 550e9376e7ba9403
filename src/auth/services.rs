use tracing::{info, warn};

use crate::auth::dto::{LoginForm, SignupForm};
use crate::auth::repo::{CreateUserError, SessionStore, UserRepo};
use crate::auth::repo_types::{NewUser, Sex, User};
use crate::auth::validation::{validate_signup, Field, FieldErrors};
use crate::error::AppError;
use crate::router::{Navigator, Page};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn single_error(field: Field, msg: &str) -> AppError {
    let mut errors = FieldErrors::new();
    errors.insert(field, msg.to_string());
    AppError::Validation(errors)
}

/// Validate, append the user, make it the session pointer and land on home.
pub async fn signup(
    users: &UserRepo,
    sessions: &SessionStore,
    nav: &mut Navigator,
    form: SignupForm,
) -> Result<User, AppError> {
    let existing = users.list().await?;
    let errors = validate_signup(&form, &existing);
    if !errors.is_empty() {
        warn!(fields = ?errors.keys().collect::<Vec<_>>(), "signup rejected");
        return Err(AppError::Validation(errors));
    }
    let Ok(sex) = form.sex.parse::<Sex>() else {
        return Err(single_error(Field::Sex, "Please select your sex"));
    };

    let new = NewUser {
        username: form.username,
        email: form.email,
        phone_number: form.phone_number,
        sex,
        password: form.password,
    };
    let user = match users.create(new).await {
        Ok(u) => u,
        Err(CreateUserError::EmailTaken) => {
            warn!("signup lost email race");
            return Err(single_error(Field::Email, "Email already registered"));
        }
        Err(CreateUserError::Store(e)) => return Err(AppError::Internal(e)),
    };

    sessions.save(&user).await?;
    nav.establish(user.clone());
    nav.navigate(Page::Home);
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

pub async fn login(
    users: &UserRepo,
    sessions: &SessionStore,
    nav: &mut Navigator,
    form: LoginForm,
) -> Result<User, AppError> {
    let user = match users.find_by_email(&form.email).await? {
        Some(u) if u.password == form.password => u,
        Some(u) => {
            warn!(user_id = u.id, "login invalid password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        None => {
            warn!(email = %form.email, "login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    sessions.save(&user).await?;
    nav.establish(user.clone());
    nav.navigate(Page::Home);
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{CURRENT_USER_KEY, USERS_KEY};
    use crate::router::View;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    struct Fixture {
        store: Arc<dyn KeyValueStore>,
        users: UserRepo,
        sessions: SessionStore,
        nav: Navigator,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        Fixture {
            users: UserRepo::new(store.clone()),
            sessions: SessionStore::new(store.clone()),
            store,
            nav: Navigator::new(),
        }
    }

    fn form(email: &str) -> SignupForm {
        SignupForm {
            username: "dewi".into(),
            email: email.into(),
            phone_number: "0813".into(),
            sex: "female".into(),
            password: "Abc123!@".into(),
            confirm_password: "Abc123!@".into(),
        }
    }

    #[tokio::test]
    async fn signup_appends_one_record_and_establishes_session() {
        let mut f = fixture();
        f.nav.navigate(Page::Signup);

        let user = signup(&f.users, &f.sessions, &mut f.nav, form("dewi@example.com"))
            .await
            .unwrap();

        assert_eq!(f.users.list().await.unwrap(), vec![user.clone()]);
        assert_eq!(f.sessions.load().await.unwrap(), Some(user));
        assert_eq!(f.nav.page(), Page::Home);
        assert_eq!(f.nav.render(), View::Home { authenticated: true });
    }

    #[tokio::test]
    async fn invalid_signup_changes_nothing() {
        let mut f = fixture();
        f.nav.navigate(Page::Signup);
        let mut bad = form("dewi@example.com");
        bad.password = "abc12345".into();
        bad.confirm_password = "abc12345".into();

        let err = signup(&f.users, &f.sessions, &mut f.nav, bad).await.unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(
                    errors[&Field::Password],
                    "Password must contain an uppercase letter"
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(f.store.get(USERS_KEY).await.unwrap().is_none());
        assert!(f.store.get(CURRENT_USER_KEY).await.unwrap().is_none());
        assert_eq!(f.nav.page(), Page::Signup);
        assert!(!f.nav.is_authenticated());
    }

    #[tokio::test]
    async fn signup_with_registered_email_is_rejected() {
        let mut f = fixture();
        signup(&f.users, &f.sessions, &mut f.nav, form("dewi@example.com"))
            .await
            .unwrap();
        let err = signup(&f.users, &f.sessions, &mut f.nav, form("dewi@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e[&Field::Email] == "Email already registered"));
        assert_eq!(f.users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_checks_plaintext_password() {
        let mut f = fixture();
        let created = signup(&f.users, &f.sessions, &mut f.nav, form("dewi@example.com"))
            .await
            .unwrap();
        f.nav.logout(&f.sessions).await.unwrap();

        let bad = LoginForm {
            email: "dewi@example.com".into(),
            password: "wrong".into(),
        };
        assert!(matches!(
            login(&f.users, &f.sessions, &mut f.nav, bad).await,
            Err(AppError::Unauthorized(_))
        ));
        let unknown = LoginForm {
            email: "nobody@example.com".into(),
            password: "Abc123!@".into(),
        };
        assert!(login(&f.users, &f.sessions, &mut f.nav, unknown).await.is_err());
        assert!(!f.nav.is_authenticated());

        f.nav.navigate(Page::Login);
        let good = LoginForm {
            email: "dewi@example.com".into(),
            password: "Abc123!@".into(),
        };
        let user = login(&f.users, &f.sessions, &mut f.nav, good).await.unwrap();
        assert_eq!(user, created);
        assert_eq!(f.sessions.load().await.unwrap(), Some(created));
        assert_eq!(f.nav.page(), Page::Home);
        assert!(f.nav.is_authenticated());
    }
}
