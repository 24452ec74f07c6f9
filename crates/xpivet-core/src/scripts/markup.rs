//! Markup checks for XUL and HTML entries.
//!
//! Markup is parsed opportunistically: real-world HTML is often not
//! well-formed XML, so documents that fail to parse are skipped without
//! a finding. Parseable documents yield element checks plus the inline
//! script bodies, which the caller feeds to the risk analyzer with
//! their file positions intact.

use roxmltree::Document;
use roxmltree::Node;

use crate::diagnostics::EntryReporter;
use crate::diagnostics::Rule;
use crate::diagnostics::Severity;
use crate::scripts::ScriptUnit;

/// An inline script body is not wrapped in a comment annotation.
pub const MISSING_SCRIPT_COMMENTS: Rule = Rule {
    id: "markup.script_comments",
    severity: Severity::Notice,
    message: "Missing comments in <script> tag",
    description: "The inline script body is not wrapped in a comment \
                  annotation.",
};

/// A frame element may load remote content.
pub const TYPELESS_FRAME: Rule = Rule {
    id: "markup.typeless_frame",
    severity: Severity::Warning,
    message: "Typeless iframes/browsers must be local.",
    description: "An iframe or browser element without an explicit type \
                  attribute must load chrome-local content.",
};

/// Elements that embed a separate browsing context.
const FRAME_ELEMENTS: &[&str] = &["iframe", "browser"];

/// Checks one markup entry and collects its inline scripts.
///
/// Returned units carry the markup entry's path and the line offset of
/// their body, so analyzer findings point into the markup file.
pub fn check(path: &str, bytes: &[u8], reporter: &mut EntryReporter<'_>) -> Vec<ScriptUnit> {
    let text = String::from_utf8_lossy(bytes);
    let Ok(document) = Document::parse(&text) else {
        return Vec::new();
    };

    let mut units = Vec::new();
    for node in document.descendants().filter(Node::is_element) {
        let tag = node.tag_name().name();
        if tag.eq_ignore_ascii_case("script") {
            check_script(&document, node, path, reporter, &mut units);
        } else if FRAME_ELEMENTS.iter().any(|f| tag.eq_ignore_ascii_case(f)) {
            check_frame(&document, node, reporter);
        }
    }
    units
}

fn check_script(
    document: &Document<'_>,
    node: Node<'_, '_>,
    path: &str,
    reporter: &mut EntryReporter<'_>,
    units: &mut Vec<ScriptUnit>,
) {
    // External scripts are validated as their own entries.
    if node.attribute("src").is_some() {
        return;
    }

    let mut has_plain_body = false;
    for child in node.children() {
        let Some(body) = child.text() else {
            continue;
        };
        if body.trim().is_empty() {
            continue;
        }
        if child.is_text() {
            has_plain_body = true;
        } else if !child.is_comment() {
            continue;
        }
        units.push(ScriptUnit {
            path: path.to_string(),
            source: body.to_string(),
            line_offset: line_offset_at(document, child.range().start),
        });
    }

    if has_plain_body {
        reporter.report(&MISSING_SCRIPT_COMMENTS, None, Some(position(document, node)));
    }
}

fn check_frame(document: &Document<'_>, node: Node<'_, '_>, reporter: &mut EntryReporter<'_>) {
    if node.attribute("type").is_some() {
        return;
    }
    let local = node
        .attribute("src")
        .is_some_and(|src| src.to_ascii_lowercase().starts_with("chrome://"));
    if !local {
        let tag = node.tag_name().name().to_string();
        reporter.report(
            &TYPELESS_FRAME,
            Some(format!("<{tag}> has no type attribute and no chrome src")),
            Some(position(document, node)),
        );
    }
}

/// Number of lines preceding the byte offset, so an inline body's first
/// line maps back onto its file line.
fn line_offset_at(document: &Document<'_>, offset: usize) -> u32 {
    document.text_pos_at(offset).row.saturating_sub(1)
}

fn position(document: &Document<'_>, node: Node<'_, '_>) -> (u32, u32) {
    let pos = document.text_pos_at(node.range().start);
    (pos.row, pos.col.saturating_sub(1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticSink;
    use crate::diagnostics::ValidationResult;

    fn run(markup: &str) -> (ValidationResult, Vec<ScriptUnit>) {
        let sink = DiagnosticSink::new(&[]);
        let mut reporter = sink.entry_reporter(0, "content/browser.xul");
        let units = check("content/browser.xul", markup.as_bytes(), &mut reporter);
        (sink.finish(), units)
    }

    #[test]
    fn test_uncommented_inline_script_noticed() {
        let (result, units) = run("<window><script>var x = 1;</script></window>");

        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].message, "Missing comments in <script> tag");
        assert_eq!(result.notices(), 1);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source, "var x = 1;");
    }

    #[test]
    fn test_commented_inline_script_clean() {
        let (result, units) = run("<window><script><!--\nvar x = 1;\n--></script></window>");

        assert!(result.messages.is_empty());
        assert_eq!(units.len(), 1);
        assert!(units[0].source.contains("var x = 1;"));
    }

    #[test]
    fn test_external_script_ignored() {
        let (result, units) =
            run(r#"<window><script src="chrome://ext/content/main.js"/></window>"#);

        assert!(result.messages.is_empty());
        assert!(units.is_empty());
    }

    #[test]
    fn test_whitespace_script_body_ignored() {
        let (result, units) = run("<window><script>\n   \n</script></window>");

        assert!(result.messages.is_empty());
        assert!(units.is_empty());
    }

    #[test]
    fn test_inline_script_carries_line_offset() {
        let (_, units) = run("<window>\n<box/>\n<script>var x = 1;</script>\n</window>");

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].line_offset, 2);
        assert_eq!(units[0].path, "content/browser.xul");
    }

    #[test]
    fn test_typeless_remote_iframe_flagged() {
        let (result, _) = run(r#"<window><iframe src="http://example.com/"/></window>"#);

        assert_eq!(result.messages.len(), 1);
        assert_eq!(
            result.messages[0].message,
            "Typeless iframes/browsers must be local."
        );
        assert_eq!(result.warnings(), 1);
    }

    #[test]
    fn test_typeless_srcless_browser_flagged() {
        let (result, _) = run("<window><browser/></window>");

        assert_eq!(result.messages.len(), 1);
        assert_eq!(
            result.messages[0].message,
            "Typeless iframes/browsers must be local."
        );
    }

    #[test]
    fn test_chrome_src_iframe_clean() {
        let (result, _) = run(r#"<window><iframe src="CHROME://ext/content/panel.xul"/></window>"#);

        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_typed_iframe_clean() {
        let (result, _) =
            run(r#"<window><iframe type="content" src="http://example.com/"/></window>"#);

        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_unparseable_markup_skipped() {
        let (result, units) = run("<html><body><p>unclosed");

        assert!(result.messages.is_empty());
        assert!(units.is_empty());
    }

    #[test]
    fn test_frame_position_reported() {
        let (result, _) = run("<window>\n  <browser/>\n</window>");

        assert_eq!(result.messages[0].line, Some(2));
    }
}
