//! Version parsing and constraint matching.
//!
//! Catalog versions are parsed leniently (`v1.2` is `1.2.0`). Constraints use
//! the usual comparator set and are checked with the `semver` crate.

use semver::VersionReq;
use std::fmt;

/// A parsed semantic version.
pub type Version = semver::Version;

/// Characters that may start a comparator.
const OPERATOR_CHARS: &[char] = &['=', '!', '<', '>', '~', '^'];

/// Errors raised while parsing a version constraint.
#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
    #[error("empty alternative in version constraint {0:?}")]
    EmptyAlternative(String),
    #[error("invalid version constraint {text:?}: {source}")]
    Invalid {
        text: String,
        #[source]
        source: semver::Error,
    },
}

/// Version constraint attached to a requested package.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VersionConstraint {
    /// No constraint: every parseable version matches, pre-releases included
    #[default]
    Any,
    /// Matches when any alternative (`||`) matches
    Range(Vec<VersionReq>),
}

impl VersionConstraint {
    /// Parse a constraint expression.
    ///
    /// An empty (or blank) string means [`VersionConstraint::Any`]. Comparators
    /// may be separated by commas or whitespace and alternatives by `||`. A
    /// bare version is an exact match, so `1.2.3` means `=1.2.3`. `!=1.2.3`
    /// excludes one version and `1.0 - 2.0` is an inclusive range.
    pub fn parse(text: &str) -> Result<Self, ConstraintError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(VersionConstraint::Any);
        }

        match parse_alternatives(text) {
            Ok(alternatives) => Ok(VersionConstraint::Range(alternatives)),
            Err(err) if !text.starts_with(OPERATOR_CHARS) => {
                parse_alternatives(&format!("={}", text))
                    .map(VersionConstraint::Range)
                    .map_err(|_| err)
            }
            Err(err) => Err(err),
        }
    }

    /// Check whether `version` satisfies this constraint.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionConstraint::Any => true,
            VersionConstraint::Range(alternatives) => {
                alternatives.iter().any(|req| req.matches(version))
            }
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any => write!(f, "*"),
            VersionConstraint::Range(alternatives) => {
                for (i, req) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " || ")?;
                    }
                    write!(f, "{}", req)?;
                }
                Ok(())
            }
        }
    }
}

/// Parse a version string leniently.
///
/// A leading `v` is ignored and a missing minor or patch number is
/// zero-filled, so `v2` parses as `2.0.0` and `1.4-rc.1` as `1.4.0-rc.1`.
pub fn parse_version(text: &str) -> Result<Version, semver::Error> {
    let text = strip_v_prefix(text.trim());
    let err = match Version::parse(text) {
        Ok(version) => return Ok(version),
        Err(err) => err,
    };

    let split = text.find(['-', '+']).unwrap_or(text.len());
    let (core, suffix) = text.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    let numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    if parts.len() > 2 || !numeric {
        return Err(err);
    }

    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    Version::parse(&format!("{}{}", padded, suffix)).map_err(|_| err)
}

fn strip_v_prefix(text: &str) -> &str {
    match text.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => text,
    }
}

fn is_wildcard(version: &str) -> bool {
    version
        .split('.')
        .any(|part| matches!(part, "*" | "x" | "X"))
}

fn parse_alternatives(text: &str) -> Result<Vec<VersionReq>, ConstraintError> {
    let mut requirements = Vec::new();
    for alternative in text.split("||") {
        let expanded = expand_comparators(alternative);
        if expanded.is_empty() {
            return Err(ConstraintError::EmptyAlternative(text.to_string()));
        }
        for normalized in expanded {
            let req = VersionReq::parse(&normalized).map_err(|source| ConstraintError::Invalid {
                text: text.to_string(),
                source,
            })?;
            requirements.push(req);
        }
    }
    Ok(requirements)
}

/// Split one alternative into `(operator, version)` pairs.
///
/// Comparators may be separated by commas or whitespace, and an operator may
/// be followed by spaces (`>= 1.0`).
fn split_comparators(alternative: &str) -> Vec<(&str, &str)> {
    let is_separator = |c: char| c == ',' || c.is_whitespace();
    let mut comparators = Vec::new();
    let mut rest = alternative.trim_start_matches(is_separator);

    while !rest.is_empty() {
        let op_len = rest
            .find(|c: char| !OPERATOR_CHARS.contains(&c))
            .unwrap_or(rest.len());
        let (op, after) = rest.split_at(op_len);
        let after = after.trim_start();
        let version_len = after.find(is_separator).unwrap_or(after.len());
        let (version, remaining) = after.split_at(version_len);

        comparators.push((op, strip_v_prefix(version)));
        rest = remaining.trim_start_matches(is_separator);
    }

    comparators
}

/// Rewrite one alternative into the comma-separated form `semver` accepts.
///
/// `>= 1.0 <2` becomes `>=1.0, <2`, a bare `1.2.3` becomes `=1.2.3` and
/// `1.0 - 2.0` becomes `>=1.0, <=2.0`. `semver` has no `!=`, so each `!=X`
/// forks the alternative into one copy with `<X` and one with `>X`.
fn expand_comparators(alternative: &str) -> Vec<String> {
    let mut comparators = split_comparators(alternative);

    // Hyphen range: a lone `-` between two bare versions
    let mut i = 1;
    while i + 1 < comparators.len() {
        let is_range = comparators[i] == ("", "-")
            && comparators[i - 1].0.is_empty()
            && comparators[i + 1].0.is_empty();
        if is_range {
            comparators[i - 1].0 = ">=";
            comparators[i + 1].0 = "<=";
            comparators.remove(i);
        } else {
            i += 1;
        }
    }

    let mut expanded = vec![Vec::new()];
    for (op, version) in comparators {
        let choices: Vec<String> = match op {
            "!=" => vec![format!("<{}", version), format!(">{}", version)],
            "" if !is_wildcard(version) => vec![format!("={}", version)],
            _ => vec![format!("{}{}", op, version)],
        };
        expanded = expanded
            .into_iter()
            .flat_map(|prefix: Vec<String>| {
                choices.iter().map(move |choice| {
                    let mut next = prefix.clone();
                    next.push(choice.clone());
                    next
                })
            })
            .collect();
    }

    expanded
        .into_iter()
        .filter(|parts| !parts.is_empty())
        .map(|parts| parts.join(", "))
        .collect()
}
