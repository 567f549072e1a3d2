//! Route remapping: rewrite the raw request path before controller resolution.

use crate::config::RouteRule;
use crate::error::AppError;
use regex::RegexBuilder;
use std::borrow::Cow;

/// Compiled route table. Rules keep declaration order; matching is anchored
/// to the full path and case-insensitive.
pub struct RouteTable {
    rules: Vec<(regex::Regex, String)>,
}

impl RouteTable {
    /// Compile rules, translating the `:any` and `:num` wildcard tokens into
    /// regex groups. An invalid pattern is a startup error.
    pub fn compile(rules: &[RouteRule]) -> Result<Self, AppError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let pattern = rule
                .pattern
                .replace(":any", "(.+)")
                .replace(":num", r"(\d+)");
            let re = RegexBuilder::new(&format!("^{}$", pattern))
                .case_insensitive(true)
                .build()
                .map_err(|e| AppError::RoutePattern {
                    pattern: rule.pattern.clone(),
                    message: e.to_string(),
                })?;
            compiled.push((re, rule.replacement.clone()));
        }
        Ok(RouteTable { rules: compiled })
    }

    pub fn empty() -> Self {
        RouteTable { rules: Vec::new() }
    }

    /// Rewrite `path` using the first rule whose substitution changes it.
    /// Unmatched paths pass through unchanged.
    pub fn remap<'a>(&self, path: &'a str) -> Cow<'a, str> {
        for (re, replacement) in &self.rules {
            let rewritten = re.replace(path, replacement.as_str());
            if rewritten != path {
                return Cow::Owned(rewritten.into_owned());
            }
        }
        Cow::Borrowed(path)
    }
}
