//! Search provider descriptor validation.
//!
//! OpenSearch descriptors are small XML documents naming a provider and
//! its query URL templates. The structural rules are independent of
//! each other; a descriptor that fails to parse gets exactly one
//! finding and no further checks.

use roxmltree::Document;
use roxmltree::Node;
use thiserror::Error;

use crate::diagnostics::EntryReporter;
use crate::diagnostics::Rule;
use crate::diagnostics::Severity;

/// Longest provider name a descriptor may declare.
pub const SHORT_NAME_LIMIT: usize = 16;

/// The descriptor is not well-formed XML.
pub const CANNOT_PARSE: Rule = Rule {
    id: "search.cannot_parse",
    severity: Severity::Error,
    message: "OpenSearch: Provider could not be parsed.",
    description: "The search provider descriptor is not well-formed XML.",
};

/// The descriptor declares no query URLs.
pub const MISSING_URLS: Rule = Rule {
    id: "search.missing_urls",
    severity: Severity::Error,
    message: "OpenSearch: Missing <Url> elements.",
    description: "A search provider must declare at least one <Url> element.",
};

/// The provider name exceeds the length cap.
pub const SHORT_NAME_TOO_LONG: Rule = Rule {
    id: "search.short_name_too_long",
    severity: Severity::Error,
    message: "OpenSearch: <ShortName> element too long",
    description: "The provider name exceeds the 16 character limit.",
};

/// More than one provider name is declared.
pub const TOO_MANY_SHORT_NAMES: Rule = Rule {
    id: "search.too_many_short_names",
    severity: Severity::Error,
    message: "OpenSearch: Too many <ShortName> elements",
    description: "A search provider must declare exactly one <ShortName> \
                  element.",
};

/// A query URL points the provider at itself.
pub const SELF_REL_URL: Rule = Rule {
    id: "search.self_rel_url",
    severity: Severity::Error,
    message: "OpenSearch: <Url> elements may not be rel=self",
    description: "Self-referencing <Url> elements let a provider update \
                  itself outside of review.",
};

/// The descriptor could not be parsed as XML.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("descriptor malformed: {0}")]
pub struct SearchParseError(String);

/// One `<Url>` declaration of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchUrl {
    /// Value of the `type` attribute.
    pub kind: Option<String>,
    /// Value of the `rel` attribute.
    pub rel: Option<String>,
    /// Value of the `template` attribute.
    pub template: Option<String>,
}

/// Parsed search provider descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchDescriptor {
    /// Text of every `<ShortName>` element, in document order.
    pub short_names: Vec<String>,
    /// Every `<Url>` element, in document order.
    pub urls: Vec<SearchUrl>,
}

impl SearchDescriptor {
    /// Parses descriptor bytes.
    ///
    /// Documents not rooted at `<OpenSearchDescription>` yield an empty
    /// descriptor, which the structural checks report as declaring no
    /// query URLs.
    ///
    /// # Errors
    ///
    /// Returns [`SearchParseError`] when the bytes are not well-formed
    /// XML.
    pub fn parse(bytes: &[u8]) -> Result<Self, SearchParseError> {
        let text = String::from_utf8_lossy(bytes);
        let document =
            Document::parse(&text).map_err(|e| SearchParseError(e.to_string()))?;

        let root = document.root_element();
        if root.tag_name().name() != "OpenSearchDescription" {
            return Ok(Self::default());
        }

        let mut descriptor = Self::default();
        for node in root.descendants().filter(Node::is_element) {
            match node.tag_name().name() {
                "ShortName" => descriptor
                    .short_names
                    .push(node.text().unwrap_or("").trim().to_string()),
                "Url" => descriptor.urls.push(SearchUrl {
                    kind: node.attribute("type").map(str::to_string),
                    rel: node.attribute("rel").map(str::to_string),
                    template: node.attribute("template").map(str::to_string),
                }),
                _ => {}
            }
        }
        Ok(descriptor)
    }
}

/// Checks one descriptor and reports every structural violation.
pub fn check(bytes: &[u8], reporter: &mut EntryReporter<'_>) {
    let descriptor = match SearchDescriptor::parse(bytes) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            reporter.emit_detail(&CANNOT_PARSE, e.to_string());
            return;
        }
    };

    if descriptor.short_names.len() > 1 {
        reporter.emit_detail(
            &TOO_MANY_SHORT_NAMES,
            format!("found {} <ShortName> elements", descriptor.short_names.len()),
        );
    }
    for name in &descriptor.short_names {
        let length = name.chars().count();
        if length > SHORT_NAME_LIMIT {
            reporter.emit_detail(
                &SHORT_NAME_TOO_LONG,
                format!("'{name}' is {length} characters, the limit is {SHORT_NAME_LIMIT}"),
            );
        }
    }

    if descriptor.urls.is_empty() {
        reporter.emit(&MISSING_URLS);
    }
    for url in &descriptor.urls {
        if url
            .rel
            .as_deref()
            .is_some_and(|rel| rel.eq_ignore_ascii_case("self"))
        {
            let target = url.template.as_deref().unwrap_or("without template");
            reporter.emit_detail(&SELF_REL_URL, format!("rel=self <Url> {target}"));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticSink;
    use crate::diagnostics::ValidationResult;

    const VALID: &str = concat!(
        "<OpenSearchDescription xmlns=\"http://a9.com/-/spec/opensearch/1.1/\">",
        "<ShortName>Web Search</ShortName>",
        "<Url type=\"text/html\" template=\"https://example.com/?q={searchTerms}\"/>",
        "</OpenSearchDescription>",
    );

    fn run(descriptor: &str) -> ValidationResult {
        let sink = DiagnosticSink::new(&[]);
        let mut reporter = sink.package_reporter();
        check(descriptor.as_bytes(), &mut reporter);
        sink.finish()
    }

    fn messages(result: &ValidationResult) -> Vec<&str> {
        result.messages.iter().map(|m| m.message.as_str()).collect()
    }

    #[test]
    fn test_valid_descriptor_clean() {
        assert!(run(VALID).messages.is_empty());
    }

    #[test]
    fn test_parse_extracts_fields() {
        let descriptor = SearchDescriptor::parse(VALID.as_bytes()).unwrap();

        assert_eq!(descriptor.short_names, vec!["Web Search"]);
        assert_eq!(descriptor.urls.len(), 1);
        assert_eq!(descriptor.urls[0].kind.as_deref(), Some("text/html"));
        assert_eq!(descriptor.urls[0].rel, None);
    }

    #[test]
    fn test_malformed_descriptor_single_finding() {
        let result = run("<OpenSearchDescription><ShortName>Broken");

        assert_eq!(
            messages(&result),
            vec!["OpenSearch: Provider could not be parsed."]
        );
        assert_eq!(result.errors(), 1);
    }

    #[test]
    fn test_wrong_root_reads_as_empty_descriptor() {
        let source = "<SearchPlugin><ShortName>X</ShortName>\
                      <Url template=\"https://example.com/\"/></SearchPlugin>";

        let descriptor = SearchDescriptor::parse(source.as_bytes()).unwrap();
        assert_eq!(descriptor, SearchDescriptor::default());

        let result = run(source);
        assert_eq!(messages(&result), vec!["OpenSearch: Missing <Url> elements."]);
    }

    #[test]
    fn test_short_name_at_limit_accepted() {
        let result = run(
            "<OpenSearchDescription><ShortName>exactly16chars!!</ShortName>\
             <Url template=\"https://example.com/\"/></OpenSearchDescription>",
        );

        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_short_name_over_limit_flagged() {
        let result = run(
            "<OpenSearchDescription><ShortName>seventeen chars!!</ShortName>\
             <Url template=\"https://example.com/\"/></OpenSearchDescription>",
        );

        assert_eq!(
            messages(&result),
            vec!["OpenSearch: <ShortName> element too long"]
        );
    }

    #[test]
    fn test_multiple_short_names_flagged() {
        let result = run(
            "<OpenSearchDescription><ShortName>One</ShortName>\
             <ShortName>Two</ShortName>\
             <Url template=\"https://example.com/\"/></OpenSearchDescription>",
        );

        assert_eq!(
            messages(&result),
            vec!["OpenSearch: Too many <ShortName> elements"]
        );
    }

    #[test]
    fn test_missing_urls_flagged() {
        let result =
            run("<OpenSearchDescription><ShortName>Search</ShortName></OpenSearchDescription>");

        assert_eq!(messages(&result), vec!["OpenSearch: Missing <Url> elements."]);
    }

    #[test]
    fn test_self_rel_urls_flagged_per_element() {
        let result = run(
            "<OpenSearchDescription><ShortName>Search</ShortName>\
             <Url rel=\"self\" template=\"https://example.com/a.xml\"/>\
             <Url rel=\"SELF\" template=\"https://example.com/b.xml\"/>\
             <Url template=\"https://example.com/?q={searchTerms}\"/>\
             </OpenSearchDescription>",
        );

        let found = messages(&result);
        assert_eq!(found.len(), 2);
        assert!(
            found
                .iter()
                .all(|m| *m == "OpenSearch: <Url> elements may not be rel=self")
        );
        assert_eq!(result.errors(), 2);
    }

    #[test]
    fn test_rules_fire_independently() {
        let result = run(
            "<OpenSearchDescription>\
             <ShortName>a very long provider name</ShortName>\
             <ShortName>second</ShortName>\
             </OpenSearchDescription>",
        );

        let found = messages(&result);
        assert!(found.contains(&"OpenSearch: <ShortName> element too long"));
        assert!(found.contains(&"OpenSearch: Too many <ShortName> elements"));
        assert!(found.contains(&"OpenSearch: Missing <Url> elements."));
    }
}
