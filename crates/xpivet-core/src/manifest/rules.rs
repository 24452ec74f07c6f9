//! Semantic rules for install.rdf.
//!
//! Every rule runs against the parsed tree regardless of what the
//! others found, so one pass surfaces every applicable defect.

use std::sync::OnceLock;

use regex::Regex;

use crate::diagnostics::EntryReporter;
use crate::diagnostics::Rule;
use crate::diagnostics::Severity;
use crate::manifest::apps::ApprovedApps;
use crate::manifest::document::ManifestDocument;
use crate::manifest::document::ManifestElement;
use crate::manifest::version::Version;

/// No install.rdf entry in the package.
pub const MISSING_MANIFEST: Rule = Rule {
    id: "manifest.missing",
    severity: Severity::Error,
    message: "Addon missing install.rdf.",
    description: "Every add-on package must carry an install.rdf manifest \
                  describing what is being installed.",
};

/// install.rdf present but unreadable.
pub const MALFORMED_MANIFEST: Rule = Rule {
    id: "manifest.malformed",
    severity: Severity::Error,
    message: "Cannot parse install.rdf.",
    description: "The install.rdf manifest is not well-formed RDF/XML, so \
                  none of its metadata can be trusted.",
};

/// The type declarator is required.
pub const MISSING_TYPE: Rule = Rule {
    id: "manifest.missing_type",
    severity: Severity::Error,
    message: "No <em:type> element found in install.rdf",
    description: "The <em:type> property declares what kind of add-on the \
                  package installs. Without it the package cannot be \
                  classified.",
};

/// The type declarator carries an unknown value.
pub const INVALID_TYPE: Rule = Rule {
    id: "manifest.invalid_type",
    severity: Severity::Warning,
    message: "Invalid <em:type> value.",
    description: "The <em:type> value is not one of the recognized add-on \
                  type codes.",
};

/// A banned property is present.
pub const BANNED_ELEMENT: Rule = Rule {
    id: "manifest.banned_element",
    severity: Severity::Error,
    message: "Banned element in install.rdf",
    description: "This property may not appear in add-ons submitted for \
                  review.",
};

/// An obsolete property is present.
pub const OBSOLETE_ELEMENT: Rule = Rule {
    id: "manifest.obsolete_element",
    severity: Severity::Notice,
    message: "Obsolete element in install.rdf",
    description: "This property is ignored by every supported application \
                  version and should be removed.",
};

/// A property outside the known schema is present.
pub const UNRECOGNIZED_ELEMENT: Rule = Rule {
    id: "manifest.unrecognized_element",
    severity: Severity::Warning,
    message: "Unrecognized element in install.rdf",
    description: "This property is not part of the install manifest schema.",
};

/// The add-on id does not follow the identifier grammar.
pub const INVALID_ID: Rule = Rule {
    id: "manifest.invalid_id",
    severity: Severity::Error,
    message: "The value of <em:id> is invalid.",
    description: "Add-on ids must be either a GUID or a string in the form \
                  name@domain.",
};

/// A declared maximum target version is unusable.
pub const INVALID_MAX_VERSION: Rule = Rule {
    id: "manifest.invalid_max_version",
    severity: Severity::Error,
    message: "Invalid maximum version number",
    description: "The maxVersion of a targetApplication must be a valid \
                  version string supported by the target application.",
};

/// A declared minimum target version is unusable.
pub const INVALID_MIN_VERSION: Rule = Rule {
    id: "manifest.invalid_min_version",
    severity: Severity::Error,
    message: "Invalid minimum version number",
    description: "The minVersion of a targetApplication must be a valid \
                  version string supported by the target application.",
};

/// The add-on name trips the naming policy.
pub const ILLEGAL_NAME: Rule = Rule {
    id: "manifest.illegal_name",
    severity: Severity::Warning,
    message: "Add-on has potentially illegal name.",
    description: "Add-on names may not contain trademarked application or \
                  vendor names.",
};

/// Properties accepted without comment.
const KNOWN_PROPERTIES: &[&str] = &[
    "aboutURL",
    "bootstrap",
    "contributor",
    "creator",
    "description",
    "developer",
    "homepageURL",
    "icon64URL",
    "iconURL",
    "id",
    "localized",
    "name",
    "optionsType",
    "optionsURL",
    "strictCompatibility",
    "targetApplication",
    "targetPlatform",
    "translator",
    "type",
    "unpack",
    "updateInfoURL",
    "version",
];

/// Properties that fail review outright.
const BANNED_PROPERTIES: &[&str] = &["hidden", "updateKey", "updateURL"];

/// Properties no supported application still reads.
const OBSOLETE_PROPERTIES: &[&str] = &["file", "requires", "skin"];

/// Recognized add-on type codes.
const VALID_TYPES: &[&str] = &["2", "4", "8", "16", "32", "64"];

#[allow(clippy::expect_used)]
fn id_grammar() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(\{[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\}|[a-z0-9-._+]*@[a-z0-9-._]+)$",
        )
        .expect("valid pattern")
    })
}

#[allow(clippy::expect_used)]
fn name_denylist() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(mozilla|firefox|thunderbird|seamonkey|sunbird)\b")
            .expect("valid pattern")
    })
}

/// Runs every manifest rule against the parsed tree.
pub fn check(
    document: &ManifestDocument,
    apps: &ApprovedApps,
    reporter: &mut EntryReporter<'_>,
) {
    check_type(document, reporter);
    check_schema(document, reporter);
    check_id(document, reporter);
    check_name(document, reporter);
    check_target_versions(document, apps, reporter);
}

fn check_type(document: &ManifestDocument, reporter: &mut EntryReporter<'_>) {
    match document.property_text("type") {
        None => reporter.emit(&MISSING_TYPE),
        Some(value) if !VALID_TYPES.contains(&value) => {
            reporter.emit_detail(&INVALID_TYPE, format!("<em:type> is '{value}'"));
        }
        Some(_) => {}
    }
}

fn check_schema(document: &ManifestDocument, reporter: &mut EntryReporter<'_>) {
    for property in document.properties() {
        let name = property.name.as_str();
        let detail = format!("<em:{name}>");
        if BANNED_PROPERTIES.contains(&name) {
            reporter.emit_detail(&BANNED_ELEMENT, detail);
        } else if OBSOLETE_PROPERTIES.contains(&name) {
            reporter.emit_detail(&OBSOLETE_ELEMENT, detail);
        } else if !KNOWN_PROPERTIES.contains(&name) {
            reporter.emit_detail(&UNRECOGNIZED_ELEMENT, detail);
        }
    }
}

fn check_id(document: &ManifestDocument, reporter: &mut EntryReporter<'_>) {
    if let Some(id) = document.property_text("id")
        && !id_grammar().is_match(id)
    {
        reporter.emit_detail(&INVALID_ID, format!("<em:id> is '{id}'"));
    }
}

fn check_name(document: &ManifestDocument, reporter: &mut EntryReporter<'_>) {
    if let Some(name) = document.property_text("name")
        && name_denylist().is_match(name)
    {
        reporter.emit_detail(&ILLEGAL_NAME, format!("add-on is named '{name}'"));
    }
}

fn check_target_versions(
    document: &ManifestDocument,
    apps: &ApprovedApps,
    reporter: &mut EntryReporter<'_>,
) {
    for target in target_descriptions(document) {
        let guid = target.property_text("id").unwrap_or("");
        let min = target
            .property_text("minVersion")
            .map(|text| (text, text.parse::<Version>()));
        let max = target
            .property_text("maxVersion")
            .map(|text| (text, text.parse::<Version>()));

        if let Some((text, Err(_))) = &min {
            reporter.emit_detail(
                &INVALID_MIN_VERSION,
                format!("minVersion '{text}' of {guid} is not a valid version"),
            );
        }
        if let Some((text, Err(_))) = &max {
            reporter.emit_detail(
                &INVALID_MAX_VERSION,
                format!("maxVersion '{text}' of {guid} is not a valid version"),
            );
        }
        if let (Some((min_text, Ok(min_version))), Some((max_text, Ok(max_version)))) =
            (&min, &max)
            && max_version < min_version
        {
            reporter.emit_detail(
                &INVALID_MAX_VERSION,
                format!("maxVersion '{max_text}' is below minVersion '{min_text}'"),
            );
        }

        if !apps.is_known(guid) {
            continue;
        }
        if let Some((text, Ok(_))) = &min
            && !apps.supports(guid, text)
        {
            reporter.emit_detail(
                &INVALID_MIN_VERSION,
                format!("minVersion '{text}' is not supported for {guid}"),
            );
        }
        if let Some((text, Ok(_))) = &max
            && !apps.supports(guid, text)
        {
            reporter.emit_detail(
                &INVALID_MAX_VERSION,
                format!("maxVersion '{text}' is not supported for {guid}"),
            );
        }
    }
}

// targetApplication wraps its properties in a nested Description node,
// but some hand-written manifests put them directly on the property.
fn target_descriptions(document: &ManifestDocument) -> Vec<&ManifestElement> {
    document
        .properties_named("targetApplication")
        .map(|target| target.child("Description").unwrap_or(target))
        .collect()
}
