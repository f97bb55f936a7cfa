//! Matching functions for role and domain names
//!
//! A matching function decides whether a literal name matches a pattern
//! name. Role managers call it once per existing role on every link
//! mutation, so it must be cheap and total. Built-in matchers:
//!
//! - **key_match**: `"/data/*"` matches `"/data/reports/q3"`
//! - **key_match2**: `"/org/:id/docs"` matches `"/org/acme/docs"`
//! - **glob_match**: shell globs, `"book_?"` matches `"book_1"`
//! - **regex_match**: full regular expressions, anchored by the caller
//!
//! All matchers take `(key, pattern)` in that order.

use dashmap::DashMap;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::warn;
use wildmatch::WildMatch;

/// Caller-supplied predicate over `(key, pattern)`
pub type MatchingFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Compiled patterns kept before the regex cache is flushed
const MAX_REGEX_CACHE_SIZE: usize = 10_000;

/// Which argument of a match call is the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrder {
    /// `fn(str1, str2)`: the first name is the literal, the second the pattern
    StrPattern,
    /// `fn(str2, str1)`: the first name is the pattern
    PatternStr,
    /// Either direction matches
    PatternPattern,
}

/// Calls a matching function, treating a panic as "no match"
///
/// One misbehaving pattern must never abort a bulk operation such as the
/// propagation loop of `add_link`.
pub fn guarded_match(func: &MatchingFn, key: &str, pattern: &str) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| func(key, pattern))) {
        Ok(matched) => matched,
        Err(_) => {
            warn!(key, pattern, "matching function panicked, treating as no match");
            false
        }
    }
}

/// Applies `func` to two names in the given order
pub fn match_in_order(func: &MatchingFn, str1: &str, str2: &str, order: MatchOrder) -> bool {
    match order {
        MatchOrder::StrPattern => guarded_match(func, str1, str2),
        MatchOrder::PatternStr => guarded_match(func, str2, str1),
        MatchOrder::PatternPattern => {
            guarded_match(func, str1, str2) || guarded_match(func, str2, str1)
        }
    }
}

/// Built-in matcher selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    KeyMatch,
    KeyMatch2,
    Glob,
    Regex,
}

impl Matcher {
    /// Returns the matcher as a shareable matching function
    pub fn func(self) -> MatchingFn {
        match self {
            Matcher::KeyMatch => Arc::new(key_match),
            Matcher::KeyMatch2 => Arc::new(key_match2),
            Matcher::Glob => Arc::new(glob_match),
            Matcher::Regex => Arc::new(regex_match),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Matcher::KeyMatch => "key_match",
            Matcher::KeyMatch2 => "key_match2",
            Matcher::Glob => "glob",
            Matcher::Regex => "regex",
        };
        f.write_str(name)
    }
}

/// Matches `key` against a pattern where the first `*` swallows the rest
///
/// # Examples
///
/// ```rust
/// use rolegraph_core::matching::key_match;
///
/// assert!(key_match("/data/reports/q3", "/data/*"));
/// assert!(key_match("/data", "/data"));
/// assert!(!key_match("/admin/users", "/data/*"));
/// ```
pub fn key_match(key: &str, pattern: &str) -> bool {
    let Some(i) = pattern.find('*') else {
        return key == pattern;
    };

    let prefix = &pattern[..i];
    if key.len() > i {
        key.get(..i) == Some(prefix)
    } else {
        key == prefix
    }
}

/// Matches a path against a pattern with `:param` segments and `*` wildcards
///
/// # Examples
///
/// ```rust
/// use rolegraph_core::matching::key_match2;
///
/// assert!(key_match2("/org/acme/docs", "/org/:id/docs"));
/// assert!(!key_match2("/org/acme/team/docs", "/org/:id/docs"));
/// assert!(key_match2("/org/acme/team/docs", "/org/*"));
/// ```
pub fn key_match2(key: &str, pattern: &str) -> bool {
    let pattern = pattern.replace("/*", "/.*");
    let mut expr = String::with_capacity(pattern.len() + 2);
    expr.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' {
            // A parameter runs until the next '/'
            while chars.peek().is_some_and(|&next| next != '/') {
                chars.next();
            }
            expr.push_str("[^/]+");
        } else {
            expr.push(c);
        }
    }
    expr.push('$');

    cached_regex_is_match(&expr, key)
}

/// Matches `key` against a shell glob (`*` and `?`)
///
/// # Examples
///
/// ```rust
/// use rolegraph_core::matching::glob_match;
///
/// assert!(glob_match("gfoo", "g*"));
/// assert!(glob_match("book_1", "book_?"));
/// assert!(!glob_match("fgoo", "g*"));
/// ```
pub fn glob_match(key: &str, pattern: &str) -> bool {
    WildMatch::new(pattern).matches(key)
}

/// Matches `key` against a regular expression; invalid patterns never match
///
/// # Examples
///
/// ```rust
/// use rolegraph_core::matching::regex_match;
///
/// assert!(regex_match("tenant-42", "^tenant-[0-9]+$"));
/// assert!(!regex_match("tenant-x", "^tenant-[0-9]+$"));
/// assert!(!regex_match("anything", "(unclosed"));
/// ```
pub fn regex_match(key: &str, pattern: &str) -> bool {
    cached_regex_is_match(pattern, key)
}

fn regex_cache() -> &'static DashMap<String, Option<Regex>> {
    static CACHE: OnceLock<DashMap<String, Option<Regex>>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

fn cached_regex_is_match(expr: &str, key: &str) -> bool {
    let cache = regex_cache();
    if let Some(compiled) = cache.get(expr) {
        return compiled.as_ref().is_some_and(|re| re.is_match(key));
    }

    let compiled = Regex::new(expr).ok();
    let matched = compiled.as_ref().is_some_and(|re| re.is_match(key));

    if cache.len() >= MAX_REGEX_CACHE_SIZE {
        cache.clear();
    }
    cache.insert(expr.to_string(), compiled);
    matched
}
