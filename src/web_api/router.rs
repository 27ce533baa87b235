//! Declarative (method, path pattern) → handler table.
//!
//! Patterns are made of `/`-separated segments. A segment is either a literal
//! that must match exactly, or a `{name}` placeholder that captures one or more
//! non-slash characters. Routes are tried in declaration order and the first
//! one whose method and pattern both match wins. A miss is `None`, not an
//! error; the dispatcher turns it into a 404.

use axum::http::Method;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route pattern {pattern:?} must start with '/'")]
    MissingLeadingSlash { pattern: String },
    #[error("route pattern {pattern:?} has an invalid segment {segment:?}")]
    InvalidSegment { pattern: String, segment: String },
    #[error("route pattern {pattern:?} binds parameter {name:?} twice")]
    DuplicateParam { pattern: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(RouteError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        };

        let mut segments = Vec::new();
        let rest = rest.trim_end_matches('/');
        if !rest.is_empty() {
            for segment in rest.split('/') {
                let parsed = parse_segment(segment).ok_or_else(|| RouteError::InvalidSegment {
                    pattern: pattern.to_string(),
                    segment: segment.to_string(),
                })?;
                if let Segment::Param(name) = &parsed {
                    if segments.contains(&parsed) {
                        return Err(RouteError::DuplicateParam {
                            pattern: pattern.to_string(),
                            name: name.clone(),
                        });
                    }
                }
                segments.push(parsed);
            }
        }

        Ok(PathPattern { segments })
    }

    /// `path` must already be normalized (see [`normalize_path`]).
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.0.push((name.clone(), part.to_string()));
                }
                _ => return None,
            }
        }
        Some(params)
    }
}

fn parse_segment(segment: &str) -> Option<Segment> {
    if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        return is_param_name(name).then(|| Segment::Param(name.to_string()));
    }
    if segment.is_empty() || segment.contains(['{', '}']) {
        return None;
    }
    Some(Segment::Literal(segment.to_string()))
}

/// `[A-Za-z_][A-Za-z0-9_-]*`
fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Captured path parameters, looked up by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
struct Route<H> {
    method: Method,
    pattern: PathPattern,
    handler: H,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<H> {
    pub handler: H,
    pub params: PathParams,
}

#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        RouteTable { routes: Vec::new() }
    }
}

impl<H: Copy> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, pattern: &str, handler: H) -> Result<Self, RouteError> {
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(pattern)?,
            handler,
        });
        Ok(self)
    }

    /// Appends `other`'s routes after this table's, keeping their order.
    pub fn merge(mut self, other: RouteTable<H>) -> Self {
        self.routes.extend(other.routes);
        self
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<H>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.pattern.matches(path).map(|params| RouteMatch {
                    handler: route.handler,
                    params,
                })
            })
    }
}

/// Strips the mount prefix (on a segment boundary only), then collapses to a
/// single leading slash with no trailing slash. `mount_path` is either empty
/// or of the form `/a/b`.
pub fn normalize_path(raw: &str, mount_path: &str) -> String {
    let mut path = raw;
    if !mount_path.is_empty() {
        if let Some(rest) = raw.strip_prefix(mount_path) {
            if rest.is_empty() || rest.starts_with('/') {
                path = rest;
            }
        }
    }
    format!("/{}", path.trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum H {
        Index,
        Show,
        Store,
        Update,
        ChangeStatus,
        Destroy,
    }

    fn table() -> RouteTable<H> {
        RouteTable::new()
            .route(Method::GET, "/tasks", H::Index)
            .and_then(|t| t.route(Method::GET, "/tasks/{id}", H::Show))
            .and_then(|t| t.route(Method::POST, "/tasks", H::Store))
            .and_then(|t| t.route(Method::PUT, "/tasks/{id}", H::Update))
            .and_then(|t| t.route(Method::PUT, "/tasks-change-status/{id}", H::ChangeStatus))
            .and_then(|t| t.route(Method::DELETE, "/tasks/{id}", H::Destroy))
            .unwrap()
    }

    #[rstest]
    #[case(Method::GET, "/tasks", H::Index, None)]
    #[case(Method::GET, "/tasks/7", H::Show, Some("7"))]
    #[case(Method::POST, "/tasks", H::Store, None)]
    #[case(Method::PUT, "/tasks/0042", H::Update, Some("0042"))]
    #[case(Method::PUT, "/tasks-change-status/9", H::ChangeStatus, Some("9"))]
    #[case(Method::DELETE, "/tasks/abc", H::Destroy, Some("abc"))]
    fn resolves_declared_routes(
        #[case] method: Method,
        #[case] path: &str,
        #[case] expected: H,
        #[case] id: Option<&str>,
    ) {
        let found = table().resolve(&method, path).expect("route should match");
        assert_eq!(found.handler, expected);
        assert_eq!(found.params.get("id"), id);
    }

    #[rstest]
    #[case(Method::PATCH, "/tasks/1")]
    #[case(Method::POST, "/tasks/1")]
    #[case(Method::DELETE, "/tasks")]
    #[case(Method::GET, "/tasks/1/extra")]
    #[case(Method::GET, "/task")]
    #[case(Method::GET, "/tasksx")]
    #[case(Method::PUT, "/tasks-change-status")]
    #[case(Method::GET, "/")]
    fn misses_are_none(#[case] method: Method, #[case] path: &str) {
        assert_eq!(table().resolve(&method, path), None);
    }

    #[test]
    fn literal_siblings_do_not_cross_match() {
        let table = table();
        let found = table.resolve(&Method::PUT, "/tasks-change-status/3").unwrap();
        assert_eq!(found.handler, H::ChangeStatus);
        let found = table.resolve(&Method::PUT, "/tasks/3").unwrap();
        assert_eq!(found.handler, H::Update);
    }

    #[test]
    fn first_declaration_wins() {
        let table = RouteTable::new()
            .route(Method::GET, "/tasks/{id}", 1)
            .and_then(|t| t.route(Method::GET, "/tasks/latest", 2))
            .unwrap();
        assert_eq!(table.resolve(&Method::GET, "/tasks/latest").unwrap().handler, 1);
    }

    #[test]
    fn params_are_captured_by_name() {
        let pattern = PathPattern::parse("/boards/{board}/tasks/{task_id}").unwrap();
        let params = pattern.matches("/boards/b-1/tasks/12").unwrap();
        assert_eq!(params.get("board"), Some("b-1"));
        assert_eq!(params.get("task_id"), Some("12"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn placeholders_never_span_a_slash_or_match_empty() {
        let pattern = PathPattern::parse("/tasks/{id}").unwrap();
        assert_eq!(pattern.matches("/tasks/1/2"), None);
        assert_eq!(pattern.matches("/tasks/"), None);
        assert_eq!(pattern.matches("/tasks"), None);
    }

    #[rstest]
    #[case("tasks")]
    #[case("/tasks/{}")]
    #[case("/tasks/{1id}")]
    #[case("/tasks/x{id}")]
    #[case("/tasks//{id}")]
    #[case("/tasks/{id}/{id}")]
    fn malformed_patterns_are_rejected(#[case] pattern: &str) {
        assert!(PathPattern::parse(pattern).is_err(), "{pattern}");
    }

    #[test]
    fn trailing_slash_in_pattern_is_ignored() {
        let pattern = PathPattern::parse("/tasks/").unwrap();
        assert!(pattern.matches("/tasks").is_some());
    }

    #[rstest]
    #[case("/tasks", "", "/tasks")]
    #[case("/tasks/", "", "/tasks")]
    #[case("tasks//", "", "/tasks")]
    #[case("", "", "/")]
    #[case("/api/tasks/5/", "/api", "/tasks/5")]
    #[case("/api", "/api", "/")]
    #[case("/apix/tasks", "/api", "/apix/tasks")]
    #[case("/tasks", "/api", "/tasks")]
    fn normalizes_paths(#[case] raw: &str, #[case] mount: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(raw, mount), expected);
    }
}
