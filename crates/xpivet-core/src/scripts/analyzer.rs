//! Risk pattern detection over Parser API trees.
//!
//! The walker never evaluates anything. It resolves call targets and
//! string arguments structurally, then matches them against small data
//! catalogs of element factories and dangerous globals. Extending
//! coverage means adding a catalog row, not another walk.

use serde_json::Value;

use crate::diagnostics::EntryReporter;
use crate::diagnostics::Rule;
use crate::diagnostics::Severity;
use crate::scripts::ScriptUnit;

/// A DOM element is created from a non-literal tag name.
pub const VARIABLE_ELEMENT: Rule = Rule {
    id: "scripts.variable_element",
    severity: Severity::Warning,
    message: "Variable element type being created",
    description: "The tag name passed to an element factory is not a string \
                  literal, so the created element type cannot be determined \
                  statically.",
};

/// A script element is created dynamically.
pub const CREATE_SCRIPT_TAG: Rule = Rule {
    id: "scripts.create_script_tag",
    severity: Severity::Warning,
    message: "createElement() used to create script tag",
    description: "Dynamically created script elements load code that is not \
                  part of the reviewed package.",
};

/// A dangerous global is referenced without being called.
pub const DANGEROUS_GLOBAL: Rule = Rule {
    id: "scripts.dangerous_global",
    severity: Severity::Warning,
    message: "Dangerous Global Object",
    description: "A global able to turn text into executable code is \
                  referenced.",
};

/// A dangerous global is invoked.
pub const DANGEROUS_CALL: Rule = Rule {
    id: "scripts.dangerous_call",
    severity: Severity::Error,
    message: "Global called in dangerous manner",
    description: "A global able to turn text into executable code is invoked.",
};

/// A dangerous global is reached through an obfuscated access shape.
pub const OBFUSCATED_CALL: Rule = Rule {
    id: "scripts.obfuscated_call",
    severity: Severity::Error,
    message: "Potentially malicious JS",
    description: "A dangerous global is reached through an access shape that \
                  serves to hide the call.",
};

/// A creation method whose tag argument decides what gets injected.
struct ElementFactory {
    name: &'static str,
    /// Position of the tag-name argument.
    tag_arg: usize,
}

const ELEMENT_FACTORIES: &[ElementFactory] = &[
    ElementFactory {
        name: "createElement",
        tag_arg: 0,
    },
    ElementFactory {
        name: "createElementNS",
        tag_arg: 1,
    },
];

/// A global that can turn text into executable code.
struct DangerousGlobal {
    name: &'static str,
    /// When set, the call is risky only if this argument position holds
    /// a statically resolvable string. Bare references to such globals
    /// are not reported; they are everyday timer usage.
    string_payload_arg: Option<usize>,
}

const DANGEROUS_GLOBALS: &[DangerousGlobal] = &[
    DangerousGlobal {
        name: "eval",
        string_payload_arg: None,
    },
    DangerousGlobal {
        name: "Function",
        string_payload_arg: None,
    },
    DangerousGlobal {
        name: "execScript",
        string_payload_arg: None,
    },
    DangerousGlobal {
        name: "uneval",
        string_payload_arg: None,
    },
    DangerousGlobal {
        name: "setTimeout",
        string_payload_arg: Some(0),
    },
    DangerousGlobal {
        name: "setInterval",
        string_payload_arg: Some(0),
    },
];

/// Walks a parsed script and reports every risk pattern hit.
///
/// `tree` must be the Parser API `Program` produced for `unit`.
pub fn analyze(unit: &ScriptUnit, tree: &Value, reporter: &mut EntryReporter<'_>) {
    let mut walker = Walker {
        reporter,
        line_offset: unit.line_offset,
    };
    walker.walk(tree, false);
}

/// How the call target was spelled at the call site.
enum CalleeShape {
    /// Direct identifier or dotted member access.
    Plain,
    /// Computed member access or sequence indirection.
    Obfuscated,
}

struct Walker<'a, 'b> {
    reporter: &'a mut EntryReporter<'b>,
    line_offset: u32,
}

impl Walker<'_, '_> {
    /// `suppress_reference` is set for the immediate callee of a call so
    /// a direct dangerous call is not also reported as a reference.
    fn walk(&mut self, node: &Value, suppress_reference: bool) {
        match node {
            Value::Array(items) => {
                for item in items {
                    self.walk(item, false);
                }
            }
            Value::Object(map) => {
                let node_type = map.get("type").and_then(Value::as_str).unwrap_or("");
                match node_type {
                    "CallExpression" | "NewExpression" => {
                        self.check_call(node);
                        if let Some(callee) = map.get("callee") {
                            self.walk(callee, true);
                        }
                        if let Some(arguments) = map.get("arguments") {
                            self.walk(arguments, false);
                        }
                    }
                    "MemberExpression" => {
                        if let Some(object) = map.get("object") {
                            self.walk(object, false);
                        }
                        // A non-computed property is a name, not a reference.
                        if is_computed(node)
                            && let Some(property) = map.get("property")
                        {
                            self.walk(property, false);
                        }
                    }
                    "Property" => {
                        if is_computed(node)
                            && let Some(key) = map.get("key")
                        {
                            self.walk(key, false);
                        }
                        if let Some(value) = map.get("value") {
                            self.walk(value, false);
                        }
                    }
                    "Identifier" => {
                        if !suppress_reference {
                            self.check_reference(node);
                        }
                    }
                    _ => {
                        let skip = binding_keys(node_type);
                        for (key, value) in map {
                            if key == "loc" || skip.contains(&key.as_str()) {
                                continue;
                            }
                            self.walk(value, false);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn check_call(&mut self, node: &Value) {
        let Some(callee) = node.get("callee") else {
            return;
        };
        let Some((name, shape)) = resolve_callee(callee) else {
            return;
        };
        let at = self.location(node);
        let arguments = node.get("arguments").and_then(Value::as_array);

        if let Some(factory) = ELEMENT_FACTORIES.iter().find(|f| f.name == name)
            && let Some(tag) = arguments.and_then(|args| args.get(factory.tag_arg))
        {
            if !is_literal(tag) {
                self.reporter.report(
                    &VARIABLE_ELEMENT,
                    Some(format!("{name}() tag argument is not a string literal")),
                    at,
                );
            }
            if static_string(tag).is_some_and(|t| t.eq_ignore_ascii_case("script")) {
                self.reporter.report(
                    &CREATE_SCRIPT_TAG,
                    Some(format!("{name}() creates a script element")),
                    at,
                );
            }
        }

        if let Some(global) = DANGEROUS_GLOBALS.iter().find(|g| g.name == name) {
            let fires = match global.string_payload_arg {
                None => true,
                Some(index) => arguments
                    .and_then(|args| args.get(index))
                    .and_then(static_string)
                    .is_some(),
            };
            if fires {
                match shape {
                    CalleeShape::Plain => self.reporter.report(
                        &DANGEROUS_CALL,
                        Some(format!("call to {name}()")),
                        at,
                    ),
                    CalleeShape::Obfuscated => self.reporter.report(
                        &OBFUSCATED_CALL,
                        Some(format!("indirect call resolves to {name}")),
                        at,
                    ),
                }
            }
        }
    }

    fn check_reference(&mut self, node: &Value) {
        let Some(name) = node.get("name").and_then(Value::as_str) else {
            return;
        };
        let dangerous = DANGEROUS_GLOBALS
            .iter()
            .any(|g| g.name == name && g.string_payload_arg.is_none());
        if dangerous {
            let at = self.location(node);
            self.reporter
                .report(&DANGEROUS_GLOBAL, Some(format!("reference to {name}")), at);
        }
    }

    fn location(&self, node: &Value) -> Option<(u32, u32)> {
        let start = node.get("loc")?.get("start")?;
        let line = u32::try_from(start.get("line")?.as_u64()?).ok()?;
        let column = u32::try_from(start.get("column")?.as_u64()?).ok()?;
        Some((line.saturating_add(self.line_offset), column))
    }
}

/// Child keys that bind names rather than reference them.
fn binding_keys(node_type: &str) -> &'static [&'static str] {
    match node_type {
        "FunctionDeclaration" | "FunctionExpression" | "ArrowFunctionExpression" => {
            &["id", "params"]
        }
        "VariableDeclarator" => &["id"],
        "LabeledStatement" | "BreakStatement" | "ContinueStatement" => &["label"],
        "CatchClause" => &["param"],
        _ => &[],
    }
}

fn is_computed(node: &Value) -> bool {
    node.get("computed").and_then(Value::as_bool) == Some(true)
}

fn is_literal(node: &Value) -> bool {
    node.get("type").and_then(Value::as_str) == Some("Literal")
}

/// Resolves the name a callee expression would invoke, if it can be
/// determined without evaluation.
fn resolve_callee(callee: &Value) -> Option<(String, CalleeShape)> {
    let callee_type = callee.get("type")?.as_str()?;
    match callee_type {
        "Identifier" => Some((
            callee.get("name")?.as_str()?.to_string(),
            CalleeShape::Plain,
        )),
        "MemberExpression" => {
            let property = callee.get("property")?;
            if is_computed(callee) {
                Some((static_string(property)?, CalleeShape::Obfuscated))
            } else if property.get("type")?.as_str()? == "Identifier" {
                Some((
                    property.get("name")?.as_str()?.to_string(),
                    CalleeShape::Plain,
                ))
            } else {
                None
            }
        }
        "SequenceExpression" => {
            let last = callee.get("expressions")?.as_array()?.last()?;
            let (name, _) = resolve_callee(last)?;
            Some((name, CalleeShape::Obfuscated))
        }
        _ => None,
    }
}

/// Resolves an expression to a string without evaluating it: literals
/// and concatenations of resolvable operands.
fn static_string(node: &Value) -> Option<String> {
    let node_type = node.get("type")?.as_str()?;
    match node_type {
        "Literal" => node.get("value")?.as_str().map(str::to_string),
        "BinaryExpression" if node.get("operator")?.as_str()? == "+" => {
            let left = static_string(node.get("left")?)?;
            let right = static_string(node.get("right")?)?;
            Some(left + &right)
        }
        _ => None,
    }
}
