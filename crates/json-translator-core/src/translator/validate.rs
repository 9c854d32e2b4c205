//! Lightweight checks of TypeScript-style schema declarations.
//!
//! This is not a TypeScript compiler. It understands enough of the
//! declaration syntax to find the exported target type and, when that type
//! is an object shape, to check the top-level properties of a JSON value:
//! presence of required members, primitive types, string literal unions
//! and arrays. Anything it cannot classify is accepted.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static EXPORT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*export\b").unwrap());

#[allow(clippy::unwrap_used)]
static MEMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:readonly\s+)?["']?([A-Za-z_$][\w$]*)["']?\s*(\?)?\s*:\s*(.+)$"#).unwrap());

/// Type of a single property, as far as we can tell from its annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Array,
    /// Union of string literals, e.g. `"small" | "large"`
    Literals(Vec<String>),
    /// Anything we don't check (nested objects, references, generics)
    Any,
}

impl PropertyType {
    fn parse(annotation: &str) -> Self {
        let annotation = annotation.trim();
        match annotation {
            "string" => return Self::String,
            "number" => return Self::Number,
            "boolean" => return Self::Boolean,
            _ => {}
        }

        if annotation.ends_with("[]") || annotation.starts_with("Array<") {
            return Self::Array;
        }

        let literals: Option<Vec<String>> = annotation
            .split('|')
            .map(|part| {
                let part = part.trim();
                let quoted = (part.starts_with('"') && part.ends_with('"'))
                    || (part.starts_with('\'') && part.ends_with('\''));
                (quoted && part.len() >= 2).then(|| part[1..part.len() - 1].to_string())
            })
            .collect();

        literals.map_or(Self::Any, Self::Literals)
    }

    fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Number => "number".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Array => "array".to_string(),
            Self::Literals(values) => values
                .iter()
                .map(|v| format!("\"{v}\""))
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Any => "any".to_string(),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Literals(values) => value
                .as_str()
                .is_some_and(|s| values.iter().any(|v| v == s)),
            Self::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub optional: bool,
    pub ty: PropertyType,
}

/// Shape of the exported target type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetShape {
    Object(Vec<Property>),
    /// Aliases to primitives, unions and references are not checked
    Opaque,
}

/// The exported target type of a schema, ready to check values against.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    type_name: String,
    shape: TargetShape,
}

impl SchemaValidator {
    /// Locate `type_name` among the schema's exports.
    ///
    /// The error strings mirror the TypeScript compiler diagnostics for the
    /// same situations, so callers can pattern-match on them.
    pub fn new(schema: &str, type_name: &str) -> Result<Self, String> {
        let schema = strip_comments(schema);

        if !EXPORT_PATTERN.is_match(&schema) {
            return Err("File '/schema.ts' is not a module.".to_string());
        }

        let declaration = Regex::new(&format!(
            r"(?m)^\s*export\s+(?:declare\s+)?(interface|type)\s+{}\b",
            regex::escape(type_name)
        ))
        .map_err(|e| e.to_string())?;

        let Some(found) = declaration.captures(&schema) else {
            return Err(format!(
                "Module '\"./schema\"' has no exported member '{type_name}'."
            ));
        };

        let kind = found.get(1).map_or("", |m| m.as_str());
        let rest = found.get(0).map_or("", |m| &schema[m.end()..]);
        let body = match kind {
            "interface" => rest.find('{').and_then(|start| braced_body(&rest[start..])),
            _ => rest
                .trim_start()
                .strip_prefix('=')
                .map(str::trim_start)
                .filter(|rhs| rhs.starts_with('{'))
                .and_then(braced_body),
        };

        let shape = body.map_or(TargetShape::Opaque, |body| {
            TargetShape::Object(parse_members(body))
        });

        Ok(Self {
            type_name: type_name.to_string(),
            shape,
        })
    }

    pub const fn shape(&self) -> &TargetShape {
        &self.shape
    }

    /// Check a JSON value against the target type.
    ///
    /// All problems are reported, one per line.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        let TargetShape::Object(properties) = &self.shape else {
            return Ok(());
        };

        let Some(object) = value.as_object() else {
            return Err(format!(
                "Type '{}' is not assignable to type '{}'.",
                json_kind(value),
                self.type_name
            ));
        };

        let mut errors = Vec::new();
        for property in properties {
            match object.get(&property.name) {
                None if !property.optional => errors.push(format!(
                    "Property '{}' is missing but required in type '{}'.",
                    property.name, self.type_name
                )),
                Some(Value::Null) if property.optional => {}
                Some(found) if !property.ty.accepts(found) => errors.push(format!(
                    "Type '{}' is not assignable to type '{}' at property '{}'.",
                    json_kind(found),
                    property.ty.describe(),
                    property.name
                )),
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

/// Remove `//` and `/* */` comments, leaving string literals intact.
fn strip_comments(schema: &str) -> String {
    let mut out = String::with_capacity(schema.len());
    let mut chars = schema.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match (c, chars.peek().copied()) {
            ('"' | '\'' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            ('/', Some('/')) => {
                while chars.next_if(|&next| next != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Contents between the opening brace at the start of `text` and its match.
fn braced_body(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an object body into members at top-level `;`, `,` and newlines.
fn parse_members(body: &str) -> Vec<Property> {
    let mut members = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut prev = '\0';

    for (i, c) in body.char_indices() {
        match c {
            '{' | '[' | '(' | '<' => depth += 1,
            // `=>` of a function type
            '>' if prev == '=' => {}
            '}' | ']' | ')' | '>' => depth = (depth - 1).max(0),
            ';' | ',' | '\n' if depth == 0 => {
                members.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        prev = c;
    }
    members.push(&body[start..]);

    members
        .into_iter()
        .filter_map(|member| {
            let caps = MEMBER_PATTERN.captures(member.trim())?;
            Some(Property {
                name: caps.get(1)?.as_str().to_string(),
                optional: caps.get(2).is_some(),
                ty: PropertyType::parse(caps.get(3)?.as_str()),
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
