use serde::Serialize;

use crate::analysis::screen::AnalysisView;
use crate::auth::dto::PublicUser;
use crate::router::Page;

/// What the client should display for the current page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum View {
    Home { authenticated: bool },
    About,
    Login,
    Signup,
    Profile { user: PublicUser },
    FoodAnalysis(AnalysisView),
    Recipes { user: PublicUser },
    LoginRequired { page: Page, message: &'static str },
}
