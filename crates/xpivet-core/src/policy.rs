//! File policy checks.
//!
//! Classifies every entry by extension and content signature against the
//! policy blacklists, detects nested archives without an unpack
//! declaration, and partitions entries into the roles that decide which
//! downstream validators run.

use crate::diagnostics::EntryReporter;
use crate::diagnostics::Rule;
use crate::diagnostics::Severity;
use crate::manifest::ManifestDocument;
use crate::package::Entry;
use crate::package::Package;

/// An entry's file extension is on the blacklist.
pub const FLAGGED_EXTENSION: Rule = Rule {
    id: "policy.flagged_extension",
    severity: Severity::Warning,
    message: "Flagged file extension found",
    description: "Files of this type are not allowed in add-on packages.",
};

/// An entry's leading bytes match a blacklisted file type.
pub const FLAGGED_TYPE: Rule = Rule {
    id: "policy.flagged_type",
    severity: Severity::Warning,
    message: "Flagged file type found",
    description: "The entry's content signature identifies a file type that \
                  is not allowed in add-on packages.",
};

/// Nested archives present without an unpack declaration.
pub const NESTED_ARCHIVES: Rule = Rule {
    id: "policy.nested_archives",
    severity: Severity::Warning,
    message: "Add-on contains JAR files, no <em:unpack>",
    description: "Nested archives are only readable at run time when the \
                  manifest declares <em:unpack>true</em:unpack>.",
};

/// Extensions rejected by name.
pub const FLAGGED_EXTENSIONS: &[&str] = &[
    "bat", "class", "cmd", "dll", "dylib", "exe", "sh", "so", "swf",
];

/// Content signatures rejected regardless of the entry's name.
const FLAGGED_SIGNATURES: &[(&[u8], &str)] = &[
    // PE executable: "MZ"
    (b"MZ", "Windows executable"),
    // ELF: 0x7f "ELF"
    (&[0x7f, b'E', b'L', b'F'], "ELF binary"),
    // Java class: 0xCAFEBABE
    (&[0xca, 0xfe, 0xba, 0xbe], "Java class"),
    // Mach-O, both endiannesses, 32 and 64 bit
    (&[0xfe, 0xed, 0xfa, 0xce], "Mach-O binary"),
    (&[0xfe, 0xed, 0xfa, 0xcf], "Mach-O binary"),
    (&[0xce, 0xfa, 0xed, 0xfe], "Mach-O binary"),
    (&[0xcf, 0xfa, 0xed, 0xfe], "Mach-O binary"),
    // Flash movie: "FWS" / "CWS"
    (b"FWS", "Flash movie"),
    (b"CWS", "Flash movie"),
];

/// What part of the pipeline handles an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    /// install.rdf or chrome.manifest.
    Manifest,
    /// JavaScript source.
    Script,
    /// XUL/XBL/HTML markup.
    Markup,
    /// DTD or properties locale resource.
    Locale,
    /// OpenSearch descriptor under a searchplugins directory.
    Descriptor,
    /// A zip container inside the package.
    NestedArchive,
    /// Anything else; only policy checks apply.
    Opaque,
}

/// Decides which validators handle an entry.
#[must_use]
pub fn role(path: &str) -> EntryRole {
    let lower = path.to_ascii_lowercase();
    if lower == "install.rdf" || lower == "chrome.manifest" {
        return EntryRole::Manifest;
    }
    match extension(&lower) {
        Some("js" | "jsm") => EntryRole::Script,
        Some("dtd" | "properties") => EntryRole::Locale,
        Some("jar" | "zip" | "xpi") => EntryRole::NestedArchive,
        Some("xul" | "xbl" | "xhtml" | "html" | "htm") => EntryRole::Markup,
        Some("xml") => {
            if lower.contains("searchplugins/") {
                EntryRole::Descriptor
            } else {
                EntryRole::Markup
            }
        }
        _ => EntryRole::Opaque,
    }
}

/// Runs the per-entry policy checks.
pub fn check_entry(entry: &Entry, reporter: &mut EntryReporter<'_>) {
    if let Some(ext) = extension(&entry.path.to_ascii_lowercase())
        && FLAGGED_EXTENSIONS.contains(&ext)
    {
        reporter.emit_detail(
            &FLAGGED_EXTENSION,
            format!("'{}' has the flagged extension '{ext}'", entry.path),
        );
    }
    if let Some(kind) = sniff(&entry.bytes) {
        reporter.emit_detail(
            &FLAGGED_TYPE,
            format!("'{}' looks like a {kind}", entry.path),
        );
    }
}

/// Flags nested archives when the manifest does not declare unpack.
///
/// Emits a single finding listing every nested archive, since the fix is
/// one manifest property rather than per-file surgery.
pub fn check_nested_archives(
    package: &Package,
    manifest: Option<&ManifestDocument>,
    reporter: &mut EntryReporter<'_>,
) {
    let nested: Vec<&str> = package
        .entries
        .iter()
        .filter(|e| role(&e.path) == EntryRole::NestedArchive)
        .map(|e| e.path.as_str())
        .collect();
    if nested.is_empty() {
        return;
    }
    if manifest.is_some_and(ManifestDocument::declares_unpack) {
        return;
    }
    reporter.emit_detail(
        &NESTED_ARCHIVES,
        format!("nested archives: {}", nested.join(", ")),
    );
}

fn extension(lower_path: &str) -> Option<&str> {
    let name = lower_path.rsplit('/').next().unwrap_or(lower_path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext)
}

fn sniff(bytes: &[u8]) -> Option<&'static str> {
    FLAGGED_SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticSink;
    use crate::diagnostics::ValidationResult;

    fn entry(path: &str, bytes: &[u8]) -> Entry {
        Entry {
            ordinal: 0,
            path: path.to_string(),
            size: bytes.len() as u64,
            bytes: bytes.to_vec(),
        }
    }

    fn run_entry(e: &Entry) -> ValidationResult {
        let sink = DiagnosticSink::new(&[]);
        let mut reporter = sink.entry_reporter(e.ordinal, e.path.clone());
        check_entry(e, &mut reporter);
        sink.finish()
    }

    #[test]
    fn test_flagged_extension() {
        let result = run_entry(&entry("components/helper.exe", b"harmless text"));
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].message, "Flagged file extension found");
        assert_eq!(result.messages[0].severity, Severity::Warning);
    }

    #[test]
    fn test_flagged_type_by_signature() {
        let result = run_entry(&entry("resources/helper.bin", b"MZ\x90\x00rest"));
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].message, "Flagged file type found");
    }

    #[test]
    fn test_extension_and_signature_fire_together() {
        let result = run_entry(&entry("helper.exe", b"MZ\x90\x00rest"));
        let messages: Vec<&str> =
            result.messages.iter().map(|m| m.message.as_str()).collect();
        assert!(messages.contains(&"Flagged file extension found"));
        assert!(messages.contains(&"Flagged file type found"));
    }

    #[test]
    fn test_clean_entry_is_quiet() {
        let result = run_entry(&entry("chrome/content/main.js", b"var x = 1;"));
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_flash_signature() {
        let result = run_entry(&entry("media/widget.dat", b"CWS\x0a1234"));
        assert_eq!(result.messages[0].message, "Flagged file type found");
        assert!(result.messages[0].description.contains("Flash"));
    }

    #[test]
    fn test_role_partition() {
        assert_eq!(role("install.rdf"), EntryRole::Manifest);
        assert_eq!(role("chrome.manifest"), EntryRole::Manifest);
        assert_eq!(role("chrome/content/main.js"), EntryRole::Script);
        assert_eq!(role("modules/helper.jsm"), EntryRole::Script);
        assert_eq!(role("chrome/content/window.xul"), EntryRole::Markup);
        assert_eq!(role("chrome/locale/en-US/main.dtd"), EntryRole::Locale);
        assert_eq!(
            role("chrome/locale/en-US/app.properties"),
            EntryRole::Locale
        );
        assert_eq!(role("searchplugins/engine.xml"), EntryRole::Descriptor);
        assert_eq!(
            role("chrome/content/data.xml"),
            EntryRole::Markup
        );
        assert_eq!(role("chrome/theme.jar"), EntryRole::NestedArchive);
        assert_eq!(role("skin/logo.png"), EntryRole::Opaque);
        assert_eq!(role(".hidden"), EntryRole::Opaque);
    }

    #[test]
    fn test_nested_archives_without_unpack() {
        let package = Package {
            kind: crate::package::PackageKind::Xpi,
            entries: vec![
                entry("install.rdf", b"<RDF/>"),
                entry("chrome/theme.jar", b"PK\x03\x04"),
            ],
            skipped: Vec::new(),
        };
        let sink = DiagnosticSink::new(&[]);
        let mut reporter = sink.package_reporter();
        check_nested_archives(&package, None, &mut reporter);
        let result = sink.finish();

        assert_eq!(result.messages.len(), 1);
        assert_eq!(
            result.messages[0].message,
            "Add-on contains JAR files, no <em:unpack>"
        );
        assert!(result.messages[0].description.contains("chrome/theme.jar"));
        assert_eq!(result.errors(), 0);
    }

    #[test]
    fn test_nested_archives_with_unpack_declared() {
        let source = r#"<?xml version="1.0"?>
<RDF xmlns="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
     xmlns:em="http://www.mozilla.org/2004/em-rdf#">
  <Description about="urn:mozilla:install-manifest">
    <em:type>2</em:type>
    <em:unpack>true</em:unpack>
  </Description>
</RDF>"#;
        let manifest = ManifestDocument::parse(source).unwrap();
        let package = Package {
            kind: crate::package::PackageKind::Xpi,
            entries: vec![entry("chrome/theme.jar", b"PK\x03\x04")],
            skipped: Vec::new(),
        };
        let sink = DiagnosticSink::new(&[]);
        let mut reporter = sink.package_reporter();
        check_nested_archives(&package, Some(&manifest), &mut reporter);
        assert!(sink.finish().messages.is_empty());
    }

    #[test]
    fn test_no_nested_archives_is_quiet() {
        let package = Package {
            kind: crate::package::PackageKind::Xpi,
            entries: vec![entry("install.rdf", b"<RDF/>")],
            skipped: Vec::new(),
        };
        let sink = DiagnosticSink::new(&[]);
        let mut reporter = sink.package_reporter();
        check_nested_archives(&package, None, &mut reporter);
        assert!(sink.finish().messages.is_empty());
    }
}
