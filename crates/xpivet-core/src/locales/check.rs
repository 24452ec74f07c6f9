//! Translation coverage checks.
//!
//! Every non-reference locale is compared against the reference locale
//! file by file: missing files, missing entity keys, values left
//! byte-identical to the reference, and unexpected file encodings.

use std::collections::HashMap;

use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::Rule;
use crate::diagnostics::Severity;
use crate::locales::Locale;
use crate::locales::LocaleFile;
use crate::locales::entities::LocaleEntitySet;
use crate::package::Package;

/// A reference-locale file has no counterpart in a translated locale.
pub const MISSING_FILE: Rule = Rule {
    id: "locales.missing_file",
    severity: Severity::Warning,
    message: "Missing translation file",
    description: "A file present in the reference locale is absent from a \
                  translated locale.",
};

/// A reference entity has no counterpart in a translated file.
pub const MISSING_ENTITY: Rule = Rule {
    id: "locales.missing_entity",
    severity: Severity::Warning,
    message: "Missing translation entity",
    description: "An entity present in the reference locale has no \
                  counterpart in a translated file.",
};

/// Translated values are byte-identical to the reference.
pub const UNCHANGED_ENTITIES: Rule = Rule {
    id: "locales.unchanged_entities",
    severity: Severity::Notice,
    message: "Unchanged translation entities",
    description: "Entities carry the exact reference-locale text, suggesting \
                  the file was copied without translation.",
};

/// A locale file is not plain UTF-8.
pub const UNEXPECTED_ENCODING: Rule = Rule {
    id: "locales.unexpected_encoding",
    severity: Severity::Warning,
    message: "Unexpected encodings in locale files",
    description: "Locale files must be plain UTF-8 without a byte order mark.",
};

/// Runs all localization checks over the discovered locales.
///
/// `reference` must be one of `locales`; it is exempt from the diff but
/// its files still get encoding checks.
pub fn check(package: &Package, locales: &[Locale], reference: &Locale, sink: &DiagnosticSink) {
    let sets = parse_all(package, locales, sink);

    let mut package_reporter = sink.package_reporter();
    for locale in locales {
        if locale.code == reference.code {
            continue;
        }
        for (name, reference_file) in &reference.files {
            let Some(reference_set) = sets.get(&reference_file.entry_path) else {
                continue;
            };
            match locale.files.get(name) {
                None => package_reporter.emit_detail(
                    &MISSING_FILE,
                    format!("locale '{}' has no file '{name}'", locale.code),
                ),
                Some(file) => {
                    let Some(translated) = sets.get(&file.entry_path) else {
                        continue;
                    };
                    diff_file(locale, reference, reference_set, translated, file, sink);
                }
            }
        }
    }
}

fn diff_file(
    locale: &Locale,
    reference: &Locale,
    reference_set: &LocaleEntitySet,
    translated: &LocaleEntitySet,
    file: &LocaleFile,
    sink: &DiagnosticSink,
) {
    let mut reporter = sink.entry_reporter(file.ordinal, file.entry_path.clone());

    let mut untranslated = Vec::new();
    for (key, reference_value) in reference_set.entities() {
        match translated.value(key) {
            None => reporter.emit_detail(
                &MISSING_ENTITY,
                format!(
                    "entity '{key}' has no translation in locale '{}'",
                    locale.code
                ),
            ),
            Some(value) => {
                // Empty values carry no text to translate.
                if value == reference_value && !value.is_empty() {
                    untranslated.push(key.as_str());
                }
            }
        }
    }

    if !untranslated.is_empty() {
        reporter.emit_detail(
            &UNCHANGED_ENTITIES,
            format!(
                "entities identical to locale '{}': {}",
                reference.code,
                untranslated.join(", ")
            ),
        );
    }
}

/// Parses every discovered locale file once, reporting files that are
/// not plain UTF-8 along the way.
fn parse_all(
    package: &Package,
    locales: &[Locale],
    sink: &DiagnosticSink,
) -> HashMap<String, LocaleEntitySet> {
    let mut sets = HashMap::new();
    for locale in locales {
        for file in locale.files.values() {
            if sets.contains_key(&file.entry_path) {
                continue;
            }
            let Some(entry) = package.entry(&file.entry_path) else {
                continue;
            };
            let set = LocaleEntitySet::parse(&file.entry_path, &entry.bytes);
            if !set.encoding().is_expected() {
                let mut reporter = sink.entry_reporter(file.ordinal, file.entry_path.clone());
                reporter.emit_detail(
                    &UNEXPECTED_ENCODING,
                    format!("file is encoded as {}", set.encoding().label()),
                );
            }
            sets.insert(file.entry_path.clone(), set);
        }
    }
    sets
}
