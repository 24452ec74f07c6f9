//! Validation entry points.
//!
//! A run walks four tiers: manifest, layout and policy, content, and
//! localization. In tiered mode the run stops after the first tier that
//! produced an error; determined mode always runs every tier so one
//! pass surfaces every applicable finding. Whatever happens inside a
//! tier degrades to diagnostics; only an unreadable approved
//! applications document fails the run itself.

use std::path::Path;
use std::thread;

use crate::config::ValidatorConfig;
use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::EntryReporter;
use crate::diagnostics::ValidationResult;
use crate::error::Result;
use crate::locales;
use crate::manifest::ApprovedApps;
use crate::manifest::ManifestDocument;
use crate::manifest::rules;
use crate::package;
use crate::package::Entry;
use crate::package::Package;
use crate::package::PackageKind;
use crate::policy;
use crate::policy::EntryRole;
use crate::scripts;
use crate::scripts::ScriptParser;
use crate::scripts::ScriptUnit;
use crate::scripts::SpiderMonkeyOracle;
use crate::scripts::markup;
use crate::search;

/// Archive path of the install manifest.
const MANIFEST_PATH: &str = "install.rdf";

/// Validates a package using the configured SpiderMonkey shell.
///
/// # Errors
///
/// Returns an error when the approved applications document cannot be
/// loaded. Everything about the package itself, including an archive
/// that cannot be opened, is reported inside the returned
/// [`ValidationResult`].
pub fn validate(path: &Path, config: &ValidatorConfig) -> Result<ValidationResult> {
    let oracle = SpiderMonkeyOracle::from_config(config);
    validate_with_parser(path, config, &oracle)
}

/// Validates a package using the given script parser.
///
/// # Errors
///
/// Returns an error when the approved applications document cannot be
/// loaded.
pub fn validate_with_parser(
    path: &Path,
    config: &ValidatorConfig,
    parser: &dyn ScriptParser,
) -> Result<ValidationResult> {
    let sink = DiagnosticSink::new(&config.severity_overrides);

    if PackageKind::from_path(path) == PackageKind::SearchProvider {
        validate_descriptor_file(path, &sink);
        return Ok(sink.finish());
    }

    let apps = match &config.approved_apps {
        Some(apps_path) => ApprovedApps::load(apps_path)?,
        None => ApprovedApps::default(),
    };

    let package = match Package::open(path, config) {
        Ok(package) => package,
        Err(error) => {
            let rule = if error.is_structural() {
                &package::CANNOT_OPEN
            } else {
                &package::EMPTY_PACKAGE
            };
            sink.package_reporter().emit_detail(rule, error.to_string());
            return Ok(sink.finish());
        }
    };

    for skipped in &package.skipped {
        sink.entry_reporter(skipped.ordinal, skipped.path.clone())
            .emit_detail(&package::UNREADABLE_ENTRY, skipped.reason.clone());
    }

    let manifest = run_manifest_tier(&package, &apps, &sink);
    if tier_failed(config, &sink) {
        return Ok(sink.finish());
    }

    run_policy_tier(&package, manifest.as_ref(), &sink);
    if tier_failed(config, &sink) {
        return Ok(sink.finish());
    }

    run_content_tier(&package, parser, &sink);
    if tier_failed(config, &sink) {
        return Ok(sink.finish());
    }

    run_locale_tier(&package, config, &sink);
    Ok(sink.finish())
}

fn tier_failed(config: &ValidatorConfig, sink: &DiagnosticSink) -> bool {
    !config.is_determined() && sink.error_count() > 0
}

/// A bare descriptor file gets the search checks and nothing else.
fn validate_descriptor_file(path: &Path, sink: &DiagnosticSink) {
    let mut reporter = sink.package_reporter();
    match std::fs::read(path) {
        Ok(bytes) => search::check(&bytes, &mut reporter),
        Err(e) => reporter.emit_detail(
            &search::CANNOT_PARSE,
            format!("descriptor could not be read: {e}"),
        ),
    }
}

fn run_manifest_tier(
    package: &Package,
    apps: &ApprovedApps,
    sink: &DiagnosticSink,
) -> Option<ManifestDocument> {
    let Some(entry) = package.entry(MANIFEST_PATH) else {
        sink.package_reporter().emit(&rules::MISSING_MANIFEST);
        return None;
    };

    let mut reporter = sink.entry_reporter(entry.ordinal, entry.path.clone());
    let source = String::from_utf8_lossy(&entry.bytes);
    match ManifestDocument::parse(&source) {
        Ok(document) => {
            rules::check(&document, apps, &mut reporter);
            Some(document)
        }
        Err(e) => {
            reporter.emit_detail(&rules::MALFORMED_MANIFEST, e.to_string());
            None
        }
    }
}

fn run_policy_tier(package: &Package, manifest: Option<&ManifestDocument>, sink: &DiagnosticSink) {
    for entry in &package.entries {
        let mut reporter = sink.entry_reporter(entry.ordinal, entry.path.clone());
        policy::check_entry(entry, &mut reporter);
    }
    policy::check_nested_archives(package, manifest, &mut sink.package_reporter());
}

/// Scripts and markup fan out across worker threads; the oracle call
/// dominates, and no lock is held across it. Descriptor entries are
/// cheap and run on the caller.
fn run_content_tier(package: &Package, parser: &dyn ScriptParser, sink: &DiagnosticSink) {
    let jobs: Vec<&Entry> = package
        .entries
        .iter()
        .filter(|e| {
            matches!(
                policy::role(&e.path),
                EntryRole::Script | EntryRole::Markup
            )
        })
        .collect();

    if !jobs.is_empty() {
        let workers = thread::available_parallelism()
            .map_or(1, std::num::NonZeroUsize::get)
            .min(jobs.len());
        let chunk_size = jobs.len().div_ceil(workers);
        thread::scope(|scope| {
            for chunk in jobs.chunks(chunk_size) {
                scope.spawn(move || {
                    for entry in chunk {
                        process_content_entry(entry, parser, sink);
                    }
                });
            }
        });
    }

    for entry in &package.entries {
        if policy::role(&entry.path) == EntryRole::Descriptor {
            let mut reporter = sink.entry_reporter(entry.ordinal, entry.path.clone());
            search::check(&entry.bytes, &mut reporter);
        }
    }
}

fn process_content_entry(entry: &Entry, parser: &dyn ScriptParser, sink: &DiagnosticSink) {
    let mut reporter = sink.entry_reporter(entry.ordinal, entry.path.clone());
    match policy::role(&entry.path) {
        EntryRole::Script => {
            let unit = ScriptUnit::new(
                entry.path.clone(),
                String::from_utf8_lossy(&entry.bytes).into_owned(),
            );
            analyze_unit(&unit, parser, &mut reporter);
        }
        EntryRole::Markup => {
            let units = markup::check(&entry.path, &entry.bytes, &mut reporter);
            for unit in &units {
                analyze_unit(unit, parser, &mut reporter);
            }
        }
        _ => {}
    }
}

fn analyze_unit(unit: &ScriptUnit, parser: &dyn ScriptParser, reporter: &mut EntryReporter<'_>) {
    match parser.parse(&unit.source) {
        Ok(tree) => scripts::analyze(unit, &tree, reporter),
        Err(failure) => {
            reporter.emit_detail(&scripts::UNPARSEABLE_SCRIPT, failure.to_string());
        }
    }
}

fn run_locale_tier(package: &Package, config: &ValidatorConfig, sink: &DiagnosticSink) {
    let discovered = locales::discover(package);
    if let Some(reference) = locales::choose_reference(&discovered, &config.reference_locale) {
        locales::check(package, &discovered, reference, sink);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use serde_json::Value;
    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::scripts::ParseFailure;

    /// Parser that always returns an empty program.
    struct StubParser;

    impl ScriptParser for StubParser {
        fn parse(&self, _source: &str) -> std::result::Result<Value, ParseFailure> {
            Ok(json!({"type": "Program", "body": []}))
        }
    }

    fn build_zip(suffix: &str, files: &[(&str, &[u8])]) -> NamedTempFile {
        let temp_file = NamedTempFile::with_suffix(suffix).unwrap();
        let file = std::fs::File::create(temp_file.path()).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        temp_file
    }

    fn manifest(body: &str) -> Vec<u8> {
        format!(
            concat!(
                "<?xml version=\"1.0\"?>\n",
                "<RDF xmlns=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"\n",
                "     xmlns:em=\"http://www.mozilla.org/2004/em-rdf#\">\n",
                "  <Description about=\"urn:mozilla:install-manifest\">\n",
                "{}",
                "  </Description>\n",
                "</RDF>\n",
            ),
            body
        )
        .into_bytes()
    }

    fn valid_manifest() -> Vec<u8> {
        manifest(concat!(
            "    <em:id>helper@example.com</em:id>\n",
            "    <em:type>2</em:type>\n",
            "    <em:name>Quiet Helper</em:name>\n",
            "    <em:version>1.0</em:version>\n",
        ))
    }

    fn determined() -> ValidatorConfig {
        ValidatorConfig::determined()
    }

    fn messages(result: &ValidationResult) -> Vec<&str> {
        result.messages.iter().map(|m| m.message.as_str()).collect()
    }

    #[test]
    fn test_unopenable_package_single_error() {
        let mut temp_file = NamedTempFile::with_suffix(".xpi").unwrap();
        temp_file.write_all(b"not a zip archive").unwrap();
        temp_file.flush().unwrap();

        let result =
            validate_with_parser(temp_file.path(), &determined(), &StubParser).unwrap();
        assert_eq!(messages(&result), vec!["The XPI could not be opened."]);
        assert_eq!(result.errors(), 1);
    }

    #[test]
    fn test_empty_package_reported() {
        let file = build_zip(".xpi", &[]);

        let result = validate_with_parser(file.path(), &determined(), &StubParser).unwrap();
        assert_eq!(messages(&result), vec!["The package is empty."]);
    }

    #[test]
    fn test_missing_manifest_reported() {
        let file = build_zip(".xpi", &[("chrome/content/main.js", b"var x;")]);

        let result = validate_with_parser(file.path(), &determined(), &StubParser).unwrap();
        assert!(messages(&result).contains(&"Addon missing install.rdf."));
    }

    #[test]
    fn test_clean_addon_succeeds() {
        let file = build_zip(
            ".xpi",
            &[
                ("install.rdf", valid_manifest().as_slice()),
                ("chrome/content/main.js", b"var greeting = 'hi';"),
                ("chrome/locale/en-US/main.dtd", b"<!ENTITY a \"x\">"),
            ],
        );

        let result = validate_with_parser(file.path(), &determined(), &StubParser).unwrap();
        assert!(result.succeeded(), "unexpected: {:?}", result.messages);
        assert_eq!(result.errors(), 0);
    }

    #[test]
    fn test_tiered_mode_stops_after_failing_tier() {
        let files = [
            ("payload.exe", b"MZ\x90\x00" as &[u8]),
            ("chrome/content/main.js", b"var x;"),
        ];
        let file = build_zip(".xpi", &files);

        let tiered = ValidatorConfig::default();
        let result = validate_with_parser(file.path(), &tiered, &StubParser).unwrap();
        assert!(messages(&result).contains(&"Addon missing install.rdf."));
        assert!(!messages(&result).contains(&"Flagged file extension found"));

        let result = validate_with_parser(file.path(), &determined(), &StubParser).unwrap();
        assert!(messages(&result).contains(&"Addon missing install.rdf."));
        assert!(messages(&result).contains(&"Flagged file extension found"));
    }

    #[test]
    fn test_jar_input_validated_like_package() {
        let file = build_zip(".jar", &[("install.rdf", valid_manifest().as_slice())]);

        let result = validate_with_parser(file.path(), &determined(), &StubParser).unwrap();
        assert!(result.succeeded());
    }

    #[test]
    fn test_bare_descriptor_gets_search_checks_only() {
        let mut temp_file = NamedTempFile::with_suffix(".xml").unwrap();
        temp_file
            .write_all(
                b"<OpenSearchDescription><ShortName>a name longer than sixteen</ShortName>\
                  <Url template=\"https://example.com/\"/></OpenSearchDescription>",
            )
            .unwrap();
        temp_file.flush().unwrap();

        let result =
            validate_with_parser(temp_file.path(), &determined(), &StubParser).unwrap();
        assert_eq!(
            messages(&result),
            vec!["OpenSearch: <ShortName> element too long"]
        );
    }

    #[test]
    fn test_oversized_entry_becomes_notice() {
        let file = build_zip(
            ".xpi",
            &[
                ("install.rdf", valid_manifest().as_slice()),
                ("bulky.dat", &[0u8; 512]),
            ],
        );

        let mut config = determined();
        config.max_entry_size = 64;
        let result = validate_with_parser(file.path(), &config, &StubParser).unwrap();
        assert!(
            messages(&result).contains(&"File could not be read from the package.")
        );
        assert_eq!(result.notices(), 1);
        assert_eq!(result.errors(), 0);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let file = build_zip(
            ".xpi",
            &[
                ("install.rdf", valid_manifest().as_slice()),
                ("chrome/content/main.js", b"eval('x');"),
                ("archive.jar", b"PK\x03\x04junk"),
            ],
        );

        let first = validate_with_parser(file.path(), &determined(), &StubParser).unwrap();
        let second = validate_with_parser(file.path(), &determined(), &StubParser).unwrap();
        assert_eq!(first, second);
    }
}
