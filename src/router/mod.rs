//! Page routing.
//!
//! The client-visible state is `Session × Page`. [`Navigator`] owns both,
//! plus the food-analysis screen, which only lives while that page is shown.

pub mod handlers;
mod view;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::screen::AnalysisScreen;
use crate::auth::dto::PublicUser;
use crate::auth::repo::SessionStore;
use crate::auth::repo_types::User;

pub use view::View;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    Home,
    About,
    Login,
    Signup,
    Profile,
    FoodAnalysis,
    Recipes,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Home,
        Page::About,
        Page::Login,
        Page::Signup,
        Page::Profile,
        Page::FoodAnalysis,
        Page::Recipes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::About => "about",
            Page::Login => "login",
            Page::Signup => "signup",
            Page::Profile => "profile",
            Page::FoodAnalysis => "food-analysis",
            Page::Recipes => "recipes",
        }
    }

    /// Fallback text shown instead of a gated page, `None` for public pages.
    pub fn login_prompt(self) -> Option<&'static str> {
        match self {
            Page::Profile => Some("Please log in to view your profile"),
            Page::FoodAnalysis => Some("Please log in to analyze food"),
            Page::Recipes => Some("Please log in to see recipe recommendations"),
            _ => None,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown page {0:?}")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPage(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(User),
}

#[derive(Default)]
pub struct Navigator {
    page: Page,
    session: Session,
    analysis: AnalysisScreen,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the stored session pointer. A missing or unreadable pointer
    /// yields an anonymous session.
    pub async fn restore(sessions: &SessionStore) -> Self {
        let session = match sessions.load().await {
            Ok(Some(user)) => {
                info!(user_id = user.id, "session restored");
                Session::Authenticated(user)
            }
            Ok(None) => Session::Anonymous,
            Err(e) => {
                warn!(error = %e, "stored session unreadable; starting anonymous");
                Session::Anonymous
            }
        };
        Self {
            session,
            ..Self::default()
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.session {
            Session::Authenticated(user) => Some(user),
            Session::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.session(), Session::Authenticated(_))
    }

    pub fn navigate(&mut self, page: Page) {
        if self.page == Page::FoodAnalysis && page != Page::FoodAnalysis {
            self.analysis.reset();
        }
        self.page = page;
    }

    pub fn establish(&mut self, user: User) {
        self.session = Session::Authenticated(user);
    }

    /// Clears the stored pointer and returns to an anonymous home page. The
    /// in-memory reset happens even when the store fails.
    pub async fn logout(&mut self, sessions: &SessionStore) -> anyhow::Result<()> {
        let cleared = sessions.clear().await;
        self.session = Session::Anonymous;
        self.analysis.reset();
        self.page = Page::Home;
        cleared
    }

    pub fn analysis(&self) -> &AnalysisScreen {
        &self.analysis
    }

    pub fn analysis_mut(&mut self) -> &mut AnalysisScreen {
        &mut self.analysis
    }

    pub fn render(&self) -> View {
        let user = self.current_user();
        match (self.page, user) {
            (Page::Home, _) => View::Home {
                authenticated: user.is_some(),
            },
            (Page::About, _) => View::About,
            (Page::Login, _) => View::Login,
            (Page::Signup, _) => View::Signup,
            (Page::Profile, Some(u)) => View::Profile {
                user: PublicUser::from(u),
            },
            (Page::FoodAnalysis, Some(_)) => View::FoodAnalysis(self.analysis.view()),
            (Page::Recipes, Some(u)) => View::Recipes {
                user: PublicUser::from(u),
            },
            (page, None) => View::LoginRequired {
                page,
                message: page.login_prompt().unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::CURRENT_USER_KEY;
    use crate::auth::repo_types::Sex;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;
    use time::OffsetDateTime;

    fn user() -> User {
        User {
            id: 1_700_000_000_000,
            username: "sari".into(),
            email: "sari@example.com".into(),
            phone_number: "0812".into(),
            sex: Sex::Female,
            password: "Abc123!@".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn sessions() -> (SessionStore, Arc<dyn KeyValueStore>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        (SessionStore::new(store.clone()), store)
    }

    #[test]
    fn page_identifiers_roundtrip() {
        for page in Page::ALL {
            assert_eq!(page.as_str().parse::<Page>().unwrap(), page);
        }
        assert_eq!(
            "dashboard".parse::<Page>().unwrap_err(),
            UnknownPage("dashboard".into())
        );
        assert_eq!(Page::FoodAnalysis.to_string(), "food-analysis");
    }

    #[test]
    fn gated_pages_render_login_prompt_when_anonymous() {
        let mut nav = Navigator::new();
        for page in [Page::Profile, Page::FoodAnalysis, Page::Recipes] {
            nav.navigate(page);
            match nav.render() {
                View::LoginRequired { page: p, message } => {
                    assert_eq!(p, page);
                    assert!(message.starts_with("Please log in"));
                }
                other => panic!("expected login prompt, got {other:?}"),
            }
        }
    }

    #[test]
    fn gated_pages_render_when_authenticated() {
        let mut nav = Navigator::new();
        nav.establish(user());
        nav.navigate(Page::Profile);
        assert!(matches!(nav.render(), View::Profile { user } if user.username == "sari"));
        nav.navigate(Page::Recipes);
        assert!(matches!(nav.render(), View::Recipes { .. }));
        nav.navigate(Page::FoodAnalysis);
        assert!(matches!(nav.render(), View::FoodAnalysis(_)));
    }

    #[test]
    fn public_pages_render_regardless_of_session() {
        let mut nav = Navigator::new();
        assert_eq!(nav.render(), View::Home { authenticated: false });
        nav.navigate(Page::About);
        assert_eq!(nav.render(), View::About);
        nav.navigate(Page::Signup);
        assert_eq!(nav.render(), View::Signup);
        nav.navigate(Page::Login);
        assert_eq!(nav.render(), View::Login);
    }

    #[tokio::test]
    async fn restore_reads_session_pointer() {
        let (sessions, _) = sessions();
        sessions.save(&user()).await.unwrap();
        let nav = Navigator::restore(&sessions).await;
        assert_eq!(nav.current_user(), Some(&user()));
        assert_eq!(nav.page(), Page::Home);
    }

    #[tokio::test]
    async fn restore_degrades_to_anonymous_on_corrupt_pointer() {
        let (sessions, store) = sessions();
        store
            .put(CURRENT_USER_KEY, "{definitely not a user".into())
            .await
            .unwrap();
        let nav = Navigator::restore(&sessions).await;
        assert_eq!(nav.session(), &Session::Anonymous);
    }

    #[tokio::test]
    async fn logout_from_any_page_clears_pointer_and_goes_home() {
        for page in Page::ALL {
            let (sessions, store) = sessions();
            sessions.save(&user()).await.unwrap();
            let mut nav = Navigator::restore(&sessions).await;
            nav.navigate(page);

            nav.logout(&sessions).await.unwrap();

            assert!(store.get(CURRENT_USER_KEY).await.unwrap().is_none());
            assert_eq!(nav.page(), Page::Home);
            assert!(!nav.is_authenticated());
            assert_eq!(nav.render(), View::Home { authenticated: false });
        }
    }
}
