//! # Route Patterns
//!
//! Compiles path templates into anchored matchers.
//!
//! ## Pattern Syntax
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Token        Matches                          Example                  │
//! │  ─────        ───────                          ───────                  │
//! │  literal      itself, exactly                  /products                │
//! │  :name        one segment, no '/'              /products/:id            │
//! │  *            rest of the path, '/' included   /files/*                 │
//! │                                                                         │
//! │  /products/:id  ──► ^/products/([^/]+)$   params = ["id"]               │
//! │  /files/*       ──► ^/files/(.*)$         params = ["*"]                │
//! │                                                                         │
//! │  Matching is anchored: the WHOLE path must match.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashSet};

use regex::Regex;

use crate::error::PatternError;

/// Parameter name under which a `*` wildcard capture is exposed.
pub const WILDCARD_PARAM: &str = "*";

/// Named parameters extracted from a matched path.
///
/// Sorted by name, not by position in the pattern. Use
/// [`RoutePattern::param_names`] for declaration order.
pub type RouteParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled route pattern.
///
/// ## Example
/// ```rust
/// use till_core::pattern::RoutePattern;
///
/// let pattern = RoutePattern::compile("/users/:user_id/sales/:sale_id").unwrap();
/// assert_eq!(pattern.param_names(), ["user_id", "sale_id"]);
///
/// let params = pattern.match_path("/users/7/sales/99").unwrap();
/// assert_eq!(params["sale_id"], "99");
/// ```
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    tokens: Vec<Token>,
    matcher: Regex,
    param_names: Vec<String>,
}

impl RoutePattern {
    /// Compiles a pattern, failing fast on malformed input.
    ///
    /// A trailing `/` (other than the root) is dropped so the pattern lines
    /// up with normalized paths.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(pattern.to_string()));
        }

        let source = if pattern.len() > 1 {
            pattern.trim_end_matches('/')
        } else {
            pattern
        };
        let source = if source.is_empty() { "/" } else { source };

        let tokens = tokenize(source)?;

        let mut expr = String::from("^");
        let mut param_names = Vec::new();
        for token in &tokens {
            match token {
                Token::Literal(text) => expr.push_str(&regex::escape(text)),
                Token::Param(name) => {
                    expr.push_str("([^/]+)");
                    param_names.push(name.clone());
                }
                Token::Wildcard => {
                    expr.push_str("(.*)");
                    param_names.push(WILDCARD_PARAM.to_string());
                }
            }
        }
        expr.push('$');

        let matcher = Regex::new(&expr).map_err(|e| PatternError::Regex {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;

        Ok(RoutePattern {
            source: source.to_string(),
            tokens,
            matcher,
            param_names,
        })
    }

    /// The pattern as registered (after trailing-slash trimming).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Matches a path (without query string).
    ///
    /// Returns the extracted parameters, or `None` when the path does not
    /// match the whole pattern.
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let captures = self.matcher.captures(path)?;
        let params = self
            .param_names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                captures
                    .get(i + 1)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();
        Some(params)
    }

    /// Builds a concrete path from parameters (reverse routing).
    ///
    /// Returns `None` if a `:name` parameter is missing. A missing wildcard
    /// expands to the empty string.
    pub fn build(&self, params: &RouteParams) -> Option<String> {
        let mut path = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(text) => path.push_str(text),
                Token::Param(name) => path.push_str(params.get(name)?),
                Token::Wildcard => {
                    if let Some(rest) = params.get(WILDCARD_PARAM) {
                        path.push_str(rest);
                    }
                }
            }
        }
        Some(path)
    }

    /// A CSS-safe slug of the pattern, used for body marker classes.
    ///
    /// `/products/:id` → `products-id`, `/` → `root`.
    pub fn slug(&self) -> String {
        let slug: Vec<String> = self
            .source
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                    .collect::<String>()
                    .to_ascii_lowercase()
            })
            .map(|s| if s.is_empty() { "any".to_string() } else { s })
            .collect();

        if slug.is_empty() {
            "root".to_string()
        } else {
            slug.join("-")
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut seen = HashSet::new();
    let mut wildcard = false;

    let mut chars = source.char_indices().peekable();
    while let Some((position, c)) = chars.next() {
        match c {
            ':' => {
                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                let starts_ok = name
                    .chars()
                    .next()
                    .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
                if !starts_ok {
                    return Err(PatternError::InvalidParamName {
                        pattern: source.to_string(),
                        position,
                    });
                }
                if !seen.insert(name.clone()) {
                    return Err(PatternError::DuplicateParam {
                        pattern: source.to_string(),
                        name,
                    });
                }

                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Param(name));
            }
            '*' => {
                if wildcard {
                    return Err(PatternError::MultipleWildcards(source.to_string()));
                }
                wildcard = true;
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Wildcard);
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_iterate_by_name_and_names_keep_declaration_order() {
        let pattern = RoutePattern::compile("/u/:user_id/s/:sale_id").unwrap();
        let params = pattern.match_path("/u/7/s/99").unwrap();

        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, ["sale_id", "user_id"]);
        assert_eq!(pattern.param_names(), ["user_id", "sale_id"]);
    }

    #[test]
    fn test_param_segment_matches_single_segment() {
        let pattern = RoutePattern::compile("/products/:id").unwrap();

        let params = pattern.match_path("/products/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        assert!(pattern.match_path("/products/42/edit").is_none());
        assert!(pattern.match_path("/products").is_none());
        assert!(pattern.match_path("/x/products/42").is_none());
    }

    #[test]
    fn test_wildcard_matches_remainder() {
        let pattern = RoutePattern::compile("/reports/*").unwrap();
        let params = pattern.match_path("/reports/2024/q1/summary").unwrap();
        assert_eq!(params[WILDCARD_PARAM], "2024/q1/summary");
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let pattern = RoutePattern::compile("/sales.csv").unwrap();
        assert!(pattern.match_path("/sales.csv").is_some());
        assert!(pattern.match_path("/salesXcsv").is_none());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let pattern = RoutePattern::compile("/dashboard/").unwrap();
        assert_eq!(pattern.as_str(), "/dashboard");
        assert!(pattern.match_path("/dashboard").is_some());

        let root = RoutePattern::compile("/").unwrap();
        assert!(root.match_path("/").is_some());
        assert!(root.match_path("/x").is_none());
    }

    #[test]
    fn test_malformed_patterns_fail_fast() {
        assert_eq!(RoutePattern::compile("").unwrap_err(), PatternError::Empty);
        assert!(matches!(
            RoutePattern::compile("products"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            RoutePattern::compile("/products/:"),
            Err(PatternError::InvalidParamName { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/products/:9id"),
            Err(PatternError::InvalidParamName { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/a/:id/b/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/a/*/b/*"),
            Err(PatternError::MultipleWildcards(_))
        ));
    }

    #[test]
    fn test_build_reverses_match() {
        let pattern = RoutePattern::compile("/users/:id/sales/:sale").unwrap();
        let mut params = RouteParams::new();
        params.insert("id".into(), "7".into());
        params.insert("sale".into(), "99".into());
        assert_eq!(pattern.build(&params).as_deref(), Some("/users/7/sales/99"));

        params.remove("sale");
        assert!(pattern.build(&params).is_none());
    }

    #[test]
    fn test_slug() {
        assert_eq!(RoutePattern::compile("/").unwrap().slug(), "root");
        assert_eq!(
            RoutePattern::compile("/products/:id").unwrap().slug(),
            "products-id"
        );
        assert_eq!(RoutePattern::compile("/files/*").unwrap().slug(), "files-any");
    }
}
