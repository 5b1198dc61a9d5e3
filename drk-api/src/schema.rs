//! Canonical data model for commands, arguments, options, and plugin
//! manifests (spec §3). Pure data plus constructors and validators — no
//! dispatch behavior lives here.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DrkError, SchemaLocator};

/// Width of an integer-typed value. The source language's reflection would
/// pick this up from the field type; our manifest format spells it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl Default for IntWidth {
    fn default() -> Self {
        Self::I64
    }
}

/// Declared type of an argument or option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Integer(IntWidth),
    Float,
    String,
    /// Closed set of string labels.
    Enumeration(Vec<String>),
    /// Repeatable string option, or a trailing variadic positional.
    ArrayOfString,
}

impl ValueType {
    pub fn is_array(&self) -> bool {
        matches!(self, Self::ArrayOfString)
    }
}

/// A bound, typed value produced by the schema binder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    Array(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Unsigned(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    /// True-ish / false-ish parsing of the literal set spec §4.F names:
    /// `{true,false,1,0,yes,no,on,off}`, case-insensitively.
    pub fn parse_bool_literal(text: &str) -> Option<bool> {
        match text.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

/// A positional-argument descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgDescriptor {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    pub variadic: bool,
    pub description: Option<String>,
}

impl ArgDescriptor {
    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: true,
            variadic: false,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: false,
            variadic: false,
            description: None,
        }
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::ArrayOfString,
            required: false,
            variadic: true,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An option (`--long` / `-s`) descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDescriptor {
    pub long_name: String,
    pub short: Option<char>,
    pub value_type: ValueType,
    pub default: Option<Value>,
    pub takes_value: bool,
    pub description: String,
}

impl OptionDescriptor {
    pub fn boolean(long_name: impl Into<String>, short: Option<char>) -> Self {
        Self {
            long_name: long_name.into(),
            short,
            value_type: ValueType::Boolean,
            default: Some(Value::Boolean(false)),
            takes_value: false,
            description: String::new(),
        }
    }

    pub fn value(long_name: impl Into<String>, short: Option<char>, value_type: ValueType) -> Self {
        let takes_value = !matches!(value_type, ValueType::Boolean);
        Self {
            long_name: long_name.into(),
            short,
            value_type,
            default: None,
            takes_value,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Metadata carried by a command node: description, usage override,
/// examples, and per-argument descriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandMetadata {
    pub description: String,
    pub usage: Option<String>,
    pub examples: Vec<String>,
    pub arg_descriptions: BTreeMap<String, String>,
    pub synonyms: Vec<String>,
}

/// A node in the command tree, keyed by path (spec §3).
#[derive(Debug, Clone)]
pub struct CommandNode {
    pub name: String,
    pub metadata: CommandMetadata,
    pub args_schema: Vec<ArgDescriptor>,
    pub options_schema: IndexMap<String, OptionDescriptor>,
    pub has_handler: bool,
    /// Non-`None` only when `has_handler` is true; name of the registered
    /// handler function this node dispatches to.
    pub handler_name: Option<String>,
    pub children: BTreeMap<String, CommandNode>,
}

impl CommandNode {
    pub fn group(name: impl Into<String>, metadata: CommandMetadata) -> Self {
        Self {
            name: name.into(),
            metadata,
            args_schema: Vec::new(),
            options_schema: IndexMap::new(),
            has_handler: false,
            handler_name: None,
            children: BTreeMap::new(),
        }
    }

    pub fn leaf(
        name: impl Into<String>,
        metadata: CommandMetadata,
        args_schema: Vec<ArgDescriptor>,
        options_schema: IndexMap<String, OptionDescriptor>,
        handler_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            metadata,
            args_schema,
            options_schema,
            has_handler: true,
            handler_name: Some(handler_name.into()),
            children: BTreeMap::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        !self.has_handler
    }

    /// Finds the short-option owner for a single character, searching this
    /// node's local options only (global options are layered in by the
    /// registry's reverse index).
    pub fn short_owner(&self, ch: char) -> Option<&OptionDescriptor> {
        self.options_schema.values().find(|o| o.short == Some(ch))
    }

    pub fn insert_child(&mut self, child: CommandNode) -> Result<(), DrkError> {
        if self.children.contains_key(&child.name) {
            return Err(DrkError::NameCollision {
                path: vec![self.name.clone(), child.name.clone()],
                detail: "duplicate sibling name".to_string(),
            });
        }
        self.children.insert(child.name.clone(), child);
        Ok(())
    }

    /// Validates this node's own schema (spec §4.A). Does not recurse —
    /// callers walk the tree and call this once per node.
    pub fn validate(&self, locator_path: &[String], file: Option<&std::path::Path>) -> Result<(), DrkError> {
        if !self.has_handler && self.children.is_empty() {
            return Err(DrkError::SchemaInvalid {
                locator: SchemaLocator {
                    file: file.map(|p| p.to_path_buf()),
                    node_path: locator_path.to_vec(),
                    field: None,
                },
                message: "node has no handler and no subcommands".to_string(),
            });
        }
        validate_args_order(&self.args_schema, locator_path, file)?;
        validate_options(&self.options_schema, locator_path, file)?;
        Ok(())
    }
}

/// At most one variadic descriptor, and it must be last. Once an optional
/// descriptor appears, every descriptor after it must also be optional (no
/// "hole" of required after optional).
fn validate_args_order(
    args: &[ArgDescriptor],
    locator_path: &[String],
    file: Option<&std::path::Path>,
) -> Result<(), DrkError> {
    let locator = |field: &str| SchemaLocator {
        file: file.map(|p| p.to_path_buf()),
        node_path: locator_path.to_vec(),
        field: Some(field.to_string()),
    };

    let mut seen_optional = false;
    for (idx, arg) in args.iter().enumerate() {
        let is_last = idx + 1 == args.len();
        if arg.variadic && !is_last {
            return Err(DrkError::SchemaInvalid {
                locator: locator(&arg.name),
                message: "variadic argument must be the last descriptor".to_string(),
            });
        }
        if !arg.required {
            seen_optional = true;
        } else if seen_optional {
            return Err(DrkError::SchemaInvalid {
                locator: locator(&arg.name),
                message: "required argument follows an optional one".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_options(
    options: &IndexMap<String, OptionDescriptor>,
    locator_path: &[String],
    file: Option<&std::path::Path>,
) -> Result<(), DrkError> {
    let mut seen_shorts = std::collections::HashSet::new();
    for (long_name, opt) in options {
        if long_name != &opt.long_name {
            return Err(DrkError::SchemaInvalid {
                locator: SchemaLocator {
                    file: file.map(|p| p.to_path_buf()),
                    node_path: locator_path.to_vec(),
                    field: Some(long_name.clone()),
                },
                message: "option map key does not match its long_name".to_string(),
            });
        }
        if let Some(short) = opt.short {
            if !seen_shorts.insert(short) {
                return Err(DrkError::SchemaInvalid {
                    locator: SchemaLocator {
                        file: file.map(|p| p.to_path_buf()),
                        node_path: locator_path.to_vec(),
                        field: Some(long_name.clone()),
                    },
                    message: format!("duplicate short option '-{short}'"),
                });
            }
        }
        if let ValueType::Enumeration(labels) = &opt.value_type {
            validate_enum_labels(labels, long_name, locator_path, file)?;
        }
    }
    Ok(())
}

fn validate_enum_labels(
    labels: &[String],
    field: &str,
    locator_path: &[String],
    file: Option<&std::path::Path>,
) -> Result<(), DrkError> {
    if labels.is_empty() {
        return Err(DrkError::SchemaInvalid {
            locator: SchemaLocator {
                file: file.map(|p| p.to_path_buf()),
                node_path: locator_path.to_vec(),
                field: Some(field.to_string()),
            },
            message: "enumeration must declare at least one label".to_string(),
        });
    }
    let mut seen = std::collections::HashSet::new();
    for label in labels {
        if label.is_empty() {
            return Err(DrkError::SchemaInvalid {
                locator: SchemaLocator {
                    file: file.map(|p| p.to_path_buf()),
                    node_path: locator_path.to_vec(),
                    field: Some(field.to_string()),
                },
                message: "enumeration label must be non-empty".to_string(),
            });
        }
        if !seen.insert(label.as_str()) {
            return Err(DrkError::SchemaInvalid {
                locator: SchemaLocator {
                    file: file.map(|p| p.to_path_buf()),
                    node_path: locator_path.to_vec(),
                    field: Some(field.to_string()),
                },
                message: format!("duplicate enumeration label '{label}'"),
            });
        }
    }
    Ok(())
}

/// A short summary of a reachable command path, as exposed by the
/// registry's flat enumeration (consumed by help and completion).
#[derive(Debug, Clone)]
pub struct CommandSummary {
    pub path: Vec<String>,
    pub description: String,
    pub is_leaf: bool,
    pub options: Vec<OptionDescriptor>,
}

impl CommandSummary {
    pub fn display_path(&self) -> String {
        self.path.join(" ")
    }
}

/// The set of lifecycle points a plugin may hook into (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    HandleGlobalOption,
    PreExecute,
    OnError,
    OnStartup,
}

/// Static description of a plugin, independent of its trait-object
/// behavior; used by the composer to decide merge order and hook
/// registration (spec §3, §4.C).
#[derive(Debug, Clone, Default)]
pub struct PluginManifest {
    pub name: String,
    pub hooks: Vec<HookKind>,
    pub has_context_extension: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variadic_must_be_last() {
        let args = vec![ArgDescriptor::variadic("rest"), ArgDescriptor::required("x", ValueType::String)];
        assert!(validate_args_order(&args, &[], None).is_err());
    }

    #[test]
    fn required_after_optional_is_rejected() {
        let args = vec![
            ArgDescriptor::optional("a", ValueType::String),
            ArgDescriptor::required("b", ValueType::String),
        ];
        assert!(validate_args_order(&args, &[], None).is_err());
    }

    #[test]
    fn trailing_optionals_are_fine() {
        let args = vec![
            ArgDescriptor::required("a", ValueType::String),
            ArgDescriptor::optional("b", ValueType::String),
            ArgDescriptor::variadic("rest"),
        ];
        assert!(validate_args_order(&args, &[], None).is_ok());
    }

    #[test]
    fn duplicate_short_is_rejected() {
        let mut options = IndexMap::new();
        options.insert(
            "image".to_string(),
            OptionDescriptor::boolean("image", Some('i')),
        );
        options.insert(
            "interactive".to_string(),
            OptionDescriptor::boolean("interactive", Some('i')),
        );
        assert!(validate_options(&options, &[], None).is_err());
    }

    #[test]
    fn bool_literal_parsing_is_case_insensitive() {
        assert_eq!(Value::parse_bool_literal("YES"), Some(true));
        assert_eq!(Value::parse_bool_literal("Off"), Some(false));
        assert_eq!(Value::parse_bool_literal("maybe"), None);
    }

    #[test]
    fn empty_node_without_children_or_handler_is_invalid() {
        let node = CommandNode::group("g", CommandMetadata::default());
        assert!(node.validate(&["g".to_string()], None).is_err());
    }
}
