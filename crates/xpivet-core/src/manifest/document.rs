//! install.rdf parsing.
//!
//! The install manifest is RDF/XML. Add-on metadata lives on the
//! `Description` node whose `about` attribute is
//! `urn:mozilla:install-manifest`, and a property can appear either as a
//! child element or as an attribute of that node. Parsing is tolerant:
//! unknown properties are preserved so the rule checker can flag them
//! instead of silently losing them.

use thiserror::Error;

/// The RDF subject carrying the add-on metadata.
const INSTALL_MANIFEST: &str = "urn:mozilla:install-manifest";

/// Error returned when install.rdf cannot be understood.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("manifest malformed: {0}")]
pub struct ManifestParseError(String);

/// Node in the parsed manifest tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestElement {
    /// Local tag name, without its namespace prefix.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<ManifestElement>,
    /// Concatenated text content, trimmed.
    pub text: String,
}

impl ManifestElement {
    fn from_text(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: text.trim().to_string(),
        }
    }

    /// First child element with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first matching child, also looking at attributes.
    ///
    /// Nested `Description` nodes carry their properties the same two
    /// ways the top-level one does.
    #[must_use]
    pub fn property_text(&self, name: &str) -> Option<&str> {
        if let Some(child) = self.child(name) {
            return Some(child.text.as_str());
        }
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
    }
}

/// Parsed install manifest.
///
/// Holds the add-on's properties in document order, with
/// attribute-declared properties first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDocument {
    properties: Vec<ManifestElement>,
}

impl ManifestDocument {
    /// Parses install.rdf source text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestParseError`] when the XML is malformed or no
    /// install-manifest `Description` is present.
    pub fn parse(source: &str) -> Result<Self, ManifestParseError> {
        let doc = roxmltree::Document::parse(source)
            .map_err(|e| ManifestParseError(e.to_string()))?;
        let description = doc
            .descendants()
            .find(|n| {
                n.is_element()
                    && n.tag_name().name() == "Description"
                    && n.attributes()
                        .any(|a| a.name() == "about" && a.value() == INSTALL_MANIFEST)
            })
            .ok_or_else(|| {
                ManifestParseError("no install-manifest Description".to_string())
            })?;

        let mut properties = Vec::new();
        for attr in description.attributes() {
            if attr.name() == "about" {
                continue;
            }
            properties.push(ManifestElement::from_text(attr.name(), attr.value()));
        }
        for child in description.children().filter(roxmltree::Node::is_element) {
            properties.push(convert(child));
        }
        Ok(Self { properties })
    }

    /// All add-on properties in document order.
    #[must_use]
    pub fn properties(&self) -> &[ManifestElement] {
        &self.properties
    }

    /// First property with the given local name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ManifestElement> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Trimmed text of the first property with the given local name.
    #[must_use]
    pub fn property_text(&self, name: &str) -> Option<&str> {
        self.property(name).map(|p| p.text.as_str())
    }

    /// All properties with the given local name.
    pub fn properties_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ManifestElement> {
        self.properties.iter().filter(move |p| p.name == name)
    }

    /// Returns `true` when the manifest asks for nested archives to be
    /// unpacked at install time.
    #[must_use]
    pub fn declares_unpack(&self) -> bool {
        self.property_text("unpack")
            .is_some_and(|text| text.eq_ignore_ascii_case("true"))
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> ManifestElement {
    ManifestElement {
        name: node.tag_name().name().to_string(),
        attributes: node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        children: node
            .children()
            .filter(roxmltree::Node::is_element)
            .map(convert)
            .collect(),
        text: node
            .children()
            .filter_map(|n| n.text())
            .collect::<String>()
            .trim()
            .to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASIC: &str = r#"<?xml version="1.0"?>
<RDF xmlns="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
     xmlns:em="http://www.mozilla.org/2004/em-rdf#">
  <Description about="urn:mozilla:install-manifest">
    <em:id>sample@example.com</em:id>
    <em:version>1.0</em:version>
    <em:type>2</em:type>
    <em:name>Sample</em:name>
    <em:targetApplication>
      <Description>
        <em:id>{ec8030f7-c20a-464f-9b0e-13a3a9e97384}</em:id>
        <em:minVersion>3.0</em:minVersion>
        <em:maxVersion>3.6.*</em:maxVersion>
      </Description>
    </em:targetApplication>
  </Description>
</RDF>"#;

    #[test]
    fn test_parse_child_element_properties() {
        let doc = ManifestDocument::parse(BASIC).unwrap();
        assert_eq!(doc.property_text("id"), Some("sample@example.com"));
        assert_eq!(doc.property_text("type"), Some("2"));
        assert_eq!(doc.property_text("name"), Some("Sample"));
        assert!(!doc.declares_unpack());
    }

    #[test]
    fn test_parse_attribute_properties() {
        let source = r#"<?xml version="1.0"?>
<RDF xmlns="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
     xmlns:em="http://www.mozilla.org/2004/em-rdf#">
  <Description about="urn:mozilla:install-manifest"
               em:id="attr@example.com" em:type="2" em:unpack="true"/>
</RDF>"#;
        let doc = ManifestDocument::parse(source).unwrap();
        assert_eq!(doc.property_text("id"), Some("attr@example.com"));
        assert_eq!(doc.property_text("type"), Some("2"));
        assert!(doc.declares_unpack());
    }

    #[test]
    fn test_target_application_tree() {
        let doc = ManifestDocument::parse(BASIC).unwrap();
        let target = doc.property("targetApplication").unwrap();
        let inner = target.child("Description").unwrap();
        assert_eq!(
            inner.property_text("id"),
            Some("{ec8030f7-c20a-464f-9b0e-13a3a9e97384}")
        );
        assert_eq!(inner.property_text("minVersion"), Some("3.0"));
        assert_eq!(inner.property_text("maxVersion"), Some("3.6.*"));
    }

    #[test]
    fn test_unknown_properties_preserved() {
        let source = r#"<?xml version="1.0"?>
<RDF xmlns="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
     xmlns:em="http://www.mozilla.org/2004/em-rdf#">
  <Description about="urn:mozilla:install-manifest">
    <em:type>2</em:type>
    <em:mysteryKnob>42</em:mysteryKnob>
  </Description>
</RDF>"#;
        let doc = ManifestDocument::parse(source).unwrap();
        assert!(doc.property("mysteryKnob").is_some());
        assert_eq!(doc.property_text("mysteryKnob"), Some("42"));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(ManifestDocument::parse("<RDF><unclosed").is_err());
    }

    #[test]
    fn test_missing_subject_is_an_error() {
        let source = r#"<?xml version="1.0"?>
<RDF xmlns="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <Description about="urn:mozilla:something-else"/>
</RDF>"#;
        assert!(ManifestDocument::parse(source).is_err());
    }

    #[test]
    fn test_repeated_properties_all_visible() {
        let source = r#"<?xml version="1.0"?>
<RDF xmlns="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
     xmlns:em="http://www.mozilla.org/2004/em-rdf#">
  <Description about="urn:mozilla:install-manifest">
    <em:type>2</em:type>
    <em:updateURL>http://one.example</em:updateURL>
    <em:updateURL>http://two.example</em:updateURL>
  </Description>
</RDF>"#;
        let doc = ManifestDocument::parse(source).unwrap();
        assert_eq!(doc.properties_named("updateURL").count(), 2);
    }
}
