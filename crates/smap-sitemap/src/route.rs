//! Router capability used to register routes and build concrete URLs.
//!
//! The sitemap only needs two things from a router: a handle for each
//! registered pattern, and the ability to turn a handle plus variable
//! bindings into a path. [`PatternRouter`] implements this for patterns in
//! the `{name}` / `{name:regex}` style:
//!
//! ```text
//! /documents/{category}/{id:[A-Z]+}
//! ```

use std::collections::HashSet;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;

use crate::error::{PatternError, SubstitutionError};

/// Regex matched by placeholders without an explicit one.
const DEFAULT_VARIABLE_REGEX: &str = "[^/]+";

/// Characters escaped when a value is substituted into a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Opaque identifier of a route registered with a [`Router`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RouteHandle(usize);

impl RouteHandle {
    /// Create a handle from a router-specific index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }
}

/// Narrow router capability consumed by the sitemap registry.
pub trait Router: Send + Sync {
    /// Register a path pattern and return its handle.
    fn register_route(&mut self, pattern: &str) -> Result<RouteHandle, PatternError>;

    /// Pattern registered under `route`.
    fn pattern(&self, route: RouteHandle) -> Option<&str>;

    /// Variable names declared by the pattern, in order of appearance.
    fn variables(&self, route: RouteHandle) -> Vec<&str>;

    /// Substitute `bindings` into the pattern of `route`.
    fn build_url(
        &self,
        route: RouteHandle,
        bindings: &[(String, String)],
    ) -> Result<String, SubstitutionError>;
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Variable { name: String, regex: Regex },
}

/// A parsed route pattern.
#[derive(Debug)]
pub struct RoutePattern {
    pattern: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern such as `/doc/{id}` or `/doc/{id:[0-9]+}`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute(pattern.to_owned()));
        }

        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices();

        while let Some((start, ch)) = chars.next() {
            match ch {
                '{' => {
                    // Braces may nest inside the regex, e.g. `{id:[0-9]{4}}`
                    let mut depth = 1;
                    let mut end = None;
                    for (i, c) in chars.by_ref() {
                        match c {
                            '{' => depth += 1,
                            '}' => {
                                depth -= 1;
                                if depth == 0 {
                                    end = Some(i);
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                    let end = end.ok_or_else(|| PatternError::UnbalancedBraces(pattern.to_owned()))?;
                    let variable = parse_variable(pattern, &pattern[start + 1..end])?;
                    if let Segment::Variable { name, .. } = &variable
                        && !seen.insert(name.clone())
                    {
                        return Err(PatternError::DuplicateName {
                            pattern: pattern.to_owned(),
                            name: name.clone(),
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(variable);
                }
                '}' => return Err(PatternError::UnbalancedBraces(pattern.to_owned())),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_owned(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern contains no variables.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Variable names in order of appearance.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable { name, .. } => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Build a path from variable bindings.
    ///
    /// Every declared variable must be bound exactly once, each value must
    /// match the variable's regex, and no undeclared names may be passed.
    pub fn build(&self, bindings: &[(String, String)]) -> Result<String, SubstitutionError> {
        let declared = self.variables();
        let mut bound = HashSet::new();
        for (name, _) in bindings {
            if !declared.contains(&name.as_str()) {
                return Err(SubstitutionError::UnknownVariable {
                    pattern: self.pattern.clone(),
                    name: name.clone(),
                });
            }
            if !bound.insert(name.as_str()) {
                return Err(SubstitutionError::DuplicateVariable {
                    pattern: self.pattern.clone(),
                    name: name.clone(),
                });
            }
        }

        let mut url = String::with_capacity(self.pattern.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Variable { name, regex } => {
                    let value = bindings
                        .iter()
                        .find_map(|(n, v)| (n == name).then_some(v.as_str()))
                        .ok_or_else(|| SubstitutionError::MissingVariable {
                            pattern: self.pattern.clone(),
                            name: name.clone(),
                        })?;
                    if !regex.is_match(value) {
                        return Err(SubstitutionError::InvalidValue {
                            pattern: self.pattern.clone(),
                            name: name.clone(),
                            value: value.to_owned(),
                        });
                    }
                    url.extend(utf8_percent_encode(value, PATH_SEGMENT));
                }
            }
        }
        Ok(url)
    }
}

fn parse_variable(pattern: &str, body: &str) -> Result<Segment, PatternError> {
    let (name, regex) = match body.split_once(':') {
        Some((name, regex)) => (name.trim(), regex),
        None => (body.trim(), DEFAULT_VARIABLE_REGEX),
    };
    if name.is_empty() {
        return Err(PatternError::EmptyName(pattern.to_owned()));
    }
    let regex = Regex::new(&format!("^(?:{regex})$")).map_err(|source| {
        PatternError::InvalidRegex {
            pattern: pattern.to_owned(),
            name: name.to_owned(),
            source,
        }
    })?;
    Ok(Segment::Variable {
        name: name.to_owned(),
        regex,
    })
}

/// In-memory [`Router`] over [`RoutePattern`]s.
#[derive(Debug, Default)]
pub struct PatternRouter {
    routes: Vec<RoutePattern>,
}

impl PatternRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Router for PatternRouter {
    fn register_route(&mut self, pattern: &str) -> Result<RouteHandle, PatternError> {
        let parsed = RoutePattern::parse(pattern)?;
        self.routes.push(parsed);
        Ok(RouteHandle(self.routes.len() - 1))
    }

    fn pattern(&self, route: RouteHandle) -> Option<&str> {
        self.routes.get(route.0).map(RoutePattern::as_str)
    }

    fn variables(&self, route: RouteHandle) -> Vec<&str> {
        self.routes
            .get(route.0)
            .map(RoutePattern::variables)
            .unwrap_or_default()
    }

    fn build_url(
        &self,
        route: RouteHandle,
        bindings: &[(String, String)],
    ) -> Result<String, SubstitutionError> {
        self.routes
            .get(route.0)
            .ok_or(SubstitutionError::UnknownRoute(route.0))?
            .build(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_parse_static_pattern() {
        let pattern = RoutePattern::parse("/my/static/route").unwrap();

        assert!(pattern.is_static());
        assert_eq!(pattern.build(&[]).unwrap(), "/my/static/route");
    }

    #[test]
    fn test_build_with_default_and_custom_regex() {
        let pattern = RoutePattern::parse("/documents/{category}/{id:[A-Z]+}").unwrap();

        assert_eq!(pattern.variables(), ["category", "id"]);
        let url = pattern
            .build(&bindings(&[("category", "book"), ("id", "AAA")]))
            .unwrap();
        assert_eq!(url, "/documents/book/AAA");
    }

    #[test]
    fn test_nested_braces_in_regex() {
        let pattern = RoutePattern::parse("/year/{y:[0-9]{4}}").unwrap();

        assert_eq!(pattern.build(&bindings(&[("y", "2024")])).unwrap(), "/year/2024");
        assert!(pattern.build(&bindings(&[("y", "24")])).is_err());
    }

    #[test]
    fn test_build_rejects_value_not_matching_regex() {
        let pattern = RoutePattern::parse("/doc/{id:[A-Z]+}").unwrap();
        let err = pattern.build(&bindings(&[("id", "abc")])).unwrap_err();

        assert_eq!(
            err,
            SubstitutionError::InvalidValue {
                pattern: "/doc/{id:[A-Z]+}".to_owned(),
                name: "id".to_owned(),
                value: "abc".to_owned(),
            }
        );
    }

    #[test]
    fn test_default_regex_rejects_slash_and_empty() {
        let pattern = RoutePattern::parse("/doc/{id}").unwrap();

        assert!(pattern.build(&bindings(&[("id", "a/b")])).is_err());
        assert!(pattern.build(&bindings(&[("id", "")])).is_err());
    }

    #[test]
    fn test_build_rejects_missing_unknown_and_duplicate() {
        let pattern = RoutePattern::parse("/doc/{id}").unwrap();

        assert!(matches!(
            pattern.build(&[]),
            Err(SubstitutionError::MissingVariable { .. })
        ));
        assert!(matches!(
            pattern.build(&bindings(&[("id", "A"), ("lang", "en")])),
            Err(SubstitutionError::UnknownVariable { .. })
        ));
        assert!(matches!(
            pattern.build(&bindings(&[("id", "A"), ("id", "B")])),
            Err(SubstitutionError::DuplicateVariable { .. })
        ));
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let pattern = RoutePattern::parse("/search/{q:.+}").unwrap();
        let url = pattern.build(&bindings(&[("q", "a b/c?")])).unwrap();

        assert_eq!(url, "/search/a%20b%2Fc%3F");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            RoutePattern::parse("doc/{id}"),
            Err(PatternError::NotAbsolute(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/doc/{id"),
            Err(PatternError::UnbalancedBraces(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/doc/id}"),
            Err(PatternError::UnbalancedBraces(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/doc/{:[a-z]+}"),
            Err(PatternError::EmptyName(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/doc/{id}/{id}"),
            Err(PatternError::DuplicateName { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/doc/{id:[a-z}"),
            Err(PatternError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_pattern_router_handles() {
        let mut router = PatternRouter::new();
        let a = router.register_route("/a").unwrap();
        let b = router.register_route("/b/{id}").unwrap();

        assert_ne!(a, b);
        assert_eq!(router.pattern(b), Some("/b/{id}"));
        assert_eq!(router.variables(b), ["id"]);
        assert_eq!(
            router.build_url(b, &bindings(&[("id", "7")])).unwrap(),
            "/b/7"
        );
        assert_eq!(
            router.build_url(RouteHandle::new(9), &[]),
            Err(SubstitutionError::UnknownRoute(9))
        );
    }
}
