//! Localization validation.
//!
//! Locales are discovered from `chrome.manifest` registrations when the
//! package has any, falling back to the conventional `locale/<code>/`
//! path shape otherwise. One locale serves as the reference; every
//! other locale is diffed against it file by file.

pub mod check;
pub mod entities;

use std::collections::BTreeMap;

use crate::package::Package;

// Re-export public types and functions
pub use check::check;
pub use entities::LocaleEncoding;
pub use entities::LocaleEntitySet;

/// File formats that carry translations.
const ENTITY_EXTENSIONS: &[&str] = &["dtd", "properties"];

/// One discovered translation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleFile {
    /// Full archive path of the file.
    pub entry_path: String,
    /// Container position of the entry, for diagnostic ordering.
    pub ordinal: u64,
}

/// One discovered locale and its translation files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// Locale code, e.g. `en-US`.
    pub code: String,
    /// Translation files keyed by their locale-relative name.
    pub files: BTreeMap<String, LocaleFile>,
}

/// Discovers the package's locales.
///
/// Locales registered in `chrome.manifest` win over the path-shape
/// fallback; the fallback only applies when no registration exists.
/// The returned list is ordered by locale code.
#[must_use]
pub fn discover(package: &Package) -> Vec<Locale> {
    let mut locales: BTreeMap<String, BTreeMap<String, LocaleFile>> = BTreeMap::new();
    let roots = registered_roots(package);

    for entry in &package.entries {
        if !is_entity_file(&entry.path) {
            continue;
        }
        let located = if roots.is_empty() {
            conventional_locale(&entry.path)
        } else {
            roots.iter().find_map(|(code, root)| {
                entry
                    .path
                    .strip_prefix(root.as_str())
                    .map(|relative| (code.clone(), relative.to_string()))
            })
        };
        if let Some((code, relative)) = located
            && !relative.is_empty()
        {
            locales.entry(code).or_default().insert(
                relative,
                LocaleFile {
                    entry_path: entry.path.clone(),
                    ordinal: entry.ordinal,
                },
            );
        }
    }

    locales
        .into_iter()
        .map(|(code, files)| Locale { code, files })
        .collect()
}

/// Picks the reference locale: the preferred code when present,
/// otherwise the first discovered locale.
#[must_use]
pub fn choose_reference<'a>(locales: &'a [Locale], preferred: &str) -> Option<&'a Locale> {
    locales
        .iter()
        .find(|l| l.code == preferred)
        .or_else(|| locales.first())
}

/// Locale registrations from `chrome.manifest`, as `(code, root)` pairs.
fn registered_roots(package: &Package) -> Vec<(String, String)> {
    let Some(manifest) = package.entry("chrome.manifest") else {
        return Vec::new();
    };
    let text = String::from_utf8_lossy(&manifest.bytes);

    let mut roots = Vec::new();
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        if parts.next() != Some("locale") {
            continue;
        }
        let Some(_provider) = parts.next() else {
            continue;
        };
        let (Some(code), Some(path)) = (parts.next(), parts.next()) else {
            continue;
        };
        // Registrations into nested JARs are not reachable here.
        if path.starts_with("jar:") {
            continue;
        }
        let mut root = path.trim_start_matches("./").to_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        roots.push((code.to_string(), root));
    }
    roots
}

/// Matches the conventional `.../locale/<code>/<rest>` path shape.
fn conventional_locale(path: &str) -> Option<(String, String)> {
    let components: Vec<&str> = path.split('/').collect();
    let marker = components.iter().position(|c| *c == "locale")?;
    let code = components.get(marker + 1)?;
    let rest = &components[marker + 2..];
    if code.is_empty() || rest.is_empty() {
        return None;
    }
    Some(((*code).to_string(), rest.join("/")))
}

fn is_entity_file(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    ENTITY_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::package::Entry;
    use crate::package::PackageKind;

    fn package_with(paths_and_bytes: &[(&str, &[u8])]) -> Package {
        Package {
            kind: PackageKind::Xpi,
            entries: paths_and_bytes
                .iter()
                .enumerate()
                .map(|(i, (path, bytes))| Entry {
                    ordinal: i as u64,
                    path: (*path).to_string(),
                    size: bytes.len() as u64,
                    bytes: bytes.to_vec(),
                })
                .collect(),
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_discover_from_path_shape() {
        let package = package_with(&[
            ("chrome/locale/en-US/main.dtd", b"<!ENTITY a \"x\">"),
            ("chrome/locale/en-US/app.properties", b"k=v"),
            ("chrome/locale/de/main.dtd", b"<!ENTITY a \"x\">"),
            ("chrome/content/main.js", b"var x;"),
        ]);

        let locales = discover(&package);
        assert_eq!(locales.len(), 2);
        assert_eq!(locales[0].code, "de");
        assert_eq!(locales[1].code, "en-US");
        assert_eq!(locales[1].files.len(), 2);
        assert!(locales[1].files.contains_key("main.dtd"));
        assert_eq!(
            locales[1].files["main.dtd"].entry_path,
            "chrome/locale/en-US/main.dtd"
        );
    }

    #[test]
    fn test_discover_prefers_manifest_registrations() {
        let manifest = b"content ext content/\nlocale ext en-US translations/english/\nlocale ext fr translations/french/\n";
        let package = package_with(&[
            ("chrome.manifest", manifest),
            ("translations/english/main.dtd", b"<!ENTITY a \"x\">"),
            ("translations/french/main.dtd", b"<!ENTITY a \"y\">"),
            ("locale/zz/ignored.dtd", b"<!ENTITY a \"z\">"),
        ]);

        let locales = discover(&package);
        assert_eq!(locales.len(), 2);
        assert_eq!(locales[0].code, "en-US");
        assert_eq!(locales[1].code, "fr");
        assert!(
            locales[0].files["main.dtd"]
                .entry_path
                .starts_with("translations/english/")
        );
    }

    #[test]
    fn test_discover_skips_jar_registrations() {
        let manifest = b"locale ext en-US jar:chrome/ext.jar!/locale/en-US/\n";
        let package = package_with(&[("chrome.manifest", manifest)]);

        assert!(discover(&package).is_empty());
    }

    #[test]
    fn test_discover_nested_relative_names() {
        let package = package_with(&[
            ("locale/en-US/browser/menu.dtd", b"<!ENTITY a \"x\">"),
            ("locale/en-US/toolbar.dtd", b"<!ENTITY b \"y\">"),
        ]);

        let locales = discover(&package);
        assert_eq!(locales.len(), 1);
        assert!(locales[0].files.contains_key("browser/menu.dtd"));
        assert!(locales[0].files.contains_key("toolbar.dtd"));
    }

    #[test]
    fn test_choose_reference_prefers_configured_code() {
        let package = package_with(&[
            ("locale/de/main.dtd", b"<!ENTITY a \"x\">"),
            ("locale/en-US/main.dtd", b"<!ENTITY a \"x\">"),
        ]);
        let locales = discover(&package);

        assert_eq!(
            choose_reference(&locales, "en-US").map(|l| l.code.as_str()),
            Some("en-US")
        );
        assert_eq!(
            choose_reference(&locales, "pt-BR").map(|l| l.code.as_str()),
            Some("de")
        );
        assert!(choose_reference(&[], "en-US").is_none());
    }
}
