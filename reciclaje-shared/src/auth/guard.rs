//! Route guard rules
//!
//! Decides which request paths need a session and where to send visitors who
//! have none. The HTTP middleware lives in the API crate; this module is the
//! pure decision so it can be tested without a server.

/// Prefixes that require a session unless overridden by configuration
pub const DEFAULT_PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/perfil",
    "/mensajes",
    "/publicar",
    "/notificaciones",
    "/contactar",
    "/configuracion",
];

/// Path of the login page visitors are redirected to
pub const LOGIN_PATH: &str = "/login";

const STATIC_DIRS: &[&str] = &["/static/", "/_next/static/", "/_next/image", "/assets/"];

const STATIC_EXTENSIONS: &[&str] = &[
    "svg", "png", "jpg", "jpeg", "gif", "webp", "ico", "css", "js", "map", "woff", "woff2",
];

/// Outcome of checking a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the request through
    Allow,

    /// Redirect to the given location
    Redirect(String),
}

/// Fixed list of protected prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    prefixes: Vec<String>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PROTECTED_PREFIXES.iter().map(|p| p.to_string()))
    }
}

impl RouteGuard {
    /// Builds a guard from prefixes; trailing slashes are dropped and
    /// a missing leading slash is added.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .map(|p| if p.starts_with('/') { p } else { format!("/{}", p) })
            .collect();

        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether `path` is one of the prefixes or below one of them
    ///
    /// `/perfil` protects `/perfil` and `/perfil/editar` but not `/perfiles`.
    pub fn is_protected(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Decides what to do with a request for `path`
    ///
    /// Static assets always pass. Protected paths without a session are sent
    /// to the login page with the original path in `redirect`.
    pub fn check(&self, path: &str, has_session: bool) -> GuardDecision {
        if is_static_asset(path) || has_session || !self.is_protected(path) {
            return GuardDecision::Allow;
        }

        GuardDecision::Redirect(login_redirect(path))
    }
}

/// Requests for static files are never intercepted
pub fn is_static_asset(path: &str) -> bool {
    if path == "/favicon.ico" || STATIC_DIRS.iter().any(|dir| path.starts_with(dir)) {
        return true;
    }

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            STATIC_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Login URL that brings the visitor back to `path` afterwards
///
/// The path is encoded as a single query value. `/` is legal inside a query
/// value and stays readable.
pub fn login_redirect(path: &str) -> String {
    let encoded = urlencoding::encode(path).replace("%2F", "/");
    format!("{}?redirect={}", LOGIN_PATH, encoded)
}
