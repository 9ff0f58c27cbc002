//! Dashboard routes and the session guard.

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    ResetPassword { token: String },
    Analytics,
    Categories,
    Albums,
    AlbumDetail { slug: String },
    Podcasts,
}

impl Route {
    /// Where a successful sign-in or password reset lands.
    pub const HOME: Route = Route::Analytics;

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::ResetPassword { token } => format!("/reset-password/{token}"),
            Route::Analytics => "/analytics".to_string(),
            Route::Categories => "/categories".to_string(),
            Route::Albums => "/albums".to_string(),
            Route::AlbumDetail { slug } => format!("/albums/{slug}"),
            Route::Podcasts => "/podcasts".to_string(),
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Login | Route::ResetPassword { .. })
    }

    /// The route actually shown: protected routes fall back to login when
    /// there is no session.
    pub fn guard(self, session: Option<&Session>) -> Route {
        if self.requires_session() && session.is_none() {
            Route::Login
        } else {
            self
        }
    }
}
