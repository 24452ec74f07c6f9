//! Locale entity files.
//!
//! Two formats carry translations: DTD entity declarations and
//! `.properties` key-value lines. Both are mined tolerantly. Values are
//! kept exactly as written so the translation checks can compare them
//! byte for byte.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Text encoding detected from a locale file's leading bytes.
///
/// Locale files are expected to be plain UTF-8 without a byte order
/// mark; anything else is reported by the localization checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleEncoding {
    /// Plain UTF-8, the expected encoding.
    Utf8,
    /// UTF-8 with a byte order mark.
    Utf8Bom,
    /// UTF-16 big-endian byte order mark.
    Utf16Be,
    /// UTF-16 little-endian byte order mark.
    Utf16Le,
    /// UTF-32 big-endian byte order mark.
    Utf32Be,
    /// UTF-32 little-endian byte order mark.
    Utf32Le,
    /// No byte order mark and not valid UTF-8.
    Unknown,
}

impl LocaleEncoding {
    /// Detects the encoding from the file's bytes.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        // UTF-32 marks start with UTF-16 marks; check the longer ones first.
        if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
            Self::Utf32Be
        } else if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
            Self::Utf32Le
        } else if bytes.starts_with(&[0xFE, 0xFF]) {
            Self::Utf16Be
        } else if bytes.starts_with(&[0xFF, 0xFE]) {
            Self::Utf16Le
        } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            Self::Utf8Bom
        } else if std::str::from_utf8(bytes).is_ok() {
            Self::Utf8
        } else {
            Self::Unknown
        }
    }

    /// Returns `true` for the encoding locale files are expected to use.
    #[must_use]
    pub const fn is_expected(self) -> bool {
        matches!(self, Self::Utf8)
    }

    /// Human-readable name of the encoding.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf8Bom => "UTF-8 with byte order mark",
            Self::Utf16Be => "UTF-16 big-endian",
            Self::Utf16Le => "UTF-16 little-endian",
            Self::Utf32Be => "UTF-32 big-endian",
            Self::Utf32Le => "UTF-32 little-endian",
            Self::Unknown => "unknown",
        }
    }
}

/// Parsed entities of one locale file.
#[derive(Debug, Clone)]
pub struct LocaleEntitySet {
    path: String,
    encoding: LocaleEncoding,
    entities: BTreeMap<String, String>,
}

impl LocaleEntitySet {
    /// Parses a locale file, picking the format from its extension.
    #[must_use]
    pub fn parse(path: &str, bytes: &[u8]) -> Self {
        let encoding = LocaleEncoding::detect(bytes);
        let text = decode(bytes, encoding);
        let entities = if path.to_ascii_lowercase().ends_with(".dtd") {
            parse_dtd(&text)
        } else {
            parse_properties(&text)
        };
        Self {
            path: path.to_string(),
            encoding,
            entities,
        }
    }

    /// Archive path the set was parsed from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Detected encoding of the file.
    #[must_use]
    pub const fn encoding(&self) -> LocaleEncoding {
        self.encoding
    }

    /// All entities, ordered by key.
    #[must_use]
    pub const fn entities(&self) -> &BTreeMap<String, String> {
        &self.entities
    }

    /// Value of one entity, when present.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entities.get(key).map(String::as_str)
    }

    /// Number of entities in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` when the file declared no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn decode(bytes: &[u8], encoding: LocaleEncoding) -> Cow<'_, str> {
    match encoding {
        LocaleEncoding::Utf8Bom => String::from_utf8_lossy(&bytes[3..]),
        _ => String::from_utf8_lossy(bytes),
    }
}

#[allow(clippy::expect_used)]
fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<!ENTITY\s+([A-Za-z0-9_.\-]+)\s+(?:"([^"]*)"|'([^']*)')"#)
            .expect("valid pattern")
    })
}

/// Mines `<!ENTITY name "value">` declarations. Parameter entities
/// (`<!ENTITY % ...>`) belong to the DTD itself and are skipped.
fn parse_dtd(text: &str) -> BTreeMap<String, String> {
    let mut entities = BTreeMap::new();
    for capture in entity_regex().captures_iter(text) {
        let Some(key) = capture.get(1) else {
            continue;
        };
        let value = capture
            .get(2)
            .or_else(|| capture.get(3))
            .map_or("", |m| m.as_str());
        entities.insert(key.as_str().to_string(), value.to_string());
    }
    entities
}

fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut entities = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                entities.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    entities
}
