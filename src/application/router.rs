/// Client-facing view routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Upload,
    File(String),
    Login,
    Dashboard,
    NotFound(String),
}

/// What to do with a requested route once authorization is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.trim_start_matches('/').split('/').collect();

        match segments.as_slice() {
            [""] => Route::Upload,
            ["login"] => Route::Login,
            ["dashboard"] => Route::Dashboard,
            ["file", id] if !id.is_empty() => Route::File(id.to_string()),
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Upload => "/".to_string(),
            Route::File(id) => format!("/file/{}", id),
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    /// Apply the access policy: the dashboard needs an admin session, the
    /// login form is only for anonymous visitors, everything else is open.
    pub fn resolve(self, authenticated: bool) -> Navigation {
        match self {
            Route::Dashboard if !authenticated => Navigation::Redirect(Route::Login),
            Route::Login if authenticated => Navigation::Redirect(Route::Dashboard),
            route => Navigation::Render(route),
        }
    }
}

/// Parse and resolve in one step
pub fn navigate(path: &str, authenticated: bool) -> Navigation {
    Route::parse(path).resolve(authenticated)
}
