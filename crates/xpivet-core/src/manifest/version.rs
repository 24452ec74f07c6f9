//! Toolkit-style version strings.
//!
//! Target applications declare compatibility ranges with the toolkit
//! version format: dot-separated parts, each made of up to four pieces
//! (number, string, number, string). `1.0pre` sorts before `1.0`, a
//! trailing `+` bumps the part (`1.0+` equals `1.1pre`), and `*` is the
//! largest possible part.

use std::cmp::Ordering;

use thiserror::Error;

/// Error returned when a version string does not follow the format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not a valid version string: {0:?}")]
pub struct ParseVersionError(String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Part {
    num_a: i64,
    str_b: String,
    num_c: i64,
    str_d: String,
}

impl Part {
    fn wildcard() -> Self {
        Self {
            num_a: i64::MAX,
            ..Self::default()
        }
    }
}

/// A parsed toolkit version string.
///
/// Ordering follows the toolkit rules, so `Version` can decide whether a
/// declared maximum sits at or above the declared minimum.
///
/// # Examples
///
/// ```
/// use xpivet_core::manifest::Version;
///
/// let pre: Version = "3.6pre".parse()?;
/// let release: Version = "3.6".parse()?;
/// assert!(pre < release);
///
/// let padded: Version = "3.6.0".parse()?;
/// assert_eq!(release, padded);
/// # Ok::<(), xpivet_core::manifest::ParseVersionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<Part>,
    raw: String,
}

impl Version {
    /// The string this version was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn part_at(&self, index: usize) -> Part {
        self.parts.get(index).cloned().unwrap_or_default()
    }
}

impl std::str::FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseVersionError(s.to_string()));
        }
        let parts = s
            .split('.')
            .map(parse_part)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ParseVersionError(s.to_string()))?;
        Ok(Self {
            parts,
            raw: s.to_string(),
        })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for index in 0..len {
            let ordering = cmp_part(&self.part_at(index), &other.part_at(index));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn cmp_part(a: &Part, b: &Part) -> Ordering {
    a.num_a
        .cmp(&b.num_a)
        .then_with(|| cmp_version_str(&a.str_b, &b.str_b))
        .then_with(|| a.num_c.cmp(&b.num_c))
        .then_with(|| cmp_version_str(&a.str_d, &b.str_d))
}

// An absent string piece outranks any present one: 1.0 > 1.0pre.
fn cmp_version_str(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

fn parse_part(part: &str) -> Option<Part> {
    if part.is_empty() {
        return None;
    }
    if part == "*" {
        return Some(Part::wildcard());
    }

    let rest = part;
    let (num_a, rest) = take_number(rest)?;
    let (str_b, rest) = take_string(rest);
    let (num_c, rest) = take_number(rest)?;
    let (str_d, rest) = take_string(rest);
    if !rest.is_empty() {
        return None;
    }

    let mut part = Part {
        num_a,
        str_b: str_b.to_string(),
        num_c,
        str_d: str_d.to_string(),
    };
    // A bare plus bumps the number: 1.0+ reads as 1.1pre.
    if part.str_b == "+" {
        part.num_a = part.num_a.checked_add(1)?;
        part.str_b = "pre".to_string();
    }
    Some(part)
}

fn take_number(s: &str) -> Option<(i64, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return Some((0, s));
    }
    let value = s[..end].parse::<i64>().ok()?;
    Some((value, &s[end..]))
}

fn take_string(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_alphabetic() && c != '+')
        .unwrap_or(s.len());
    (&s[..end], &s[end..])
}
