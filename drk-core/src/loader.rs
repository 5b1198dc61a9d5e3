//! Source discovery & loader (spec §4.B).
//!
//! Walks a commands directory with `walkdir` (kept from the teacher's
//! dependency set) and parses one `.toml` manifest per command file into a
//! `CommandNode`. This is the Design Notes §9 route (a) — "a codegen step
//! that reads a manifest file per command" — substituting for the source
//! language's type-level reflection, since Rust has no equivalent runtime
//! facility.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use drk_api::{
    ArgDescriptor, CommandMetadata, CommandNode, DrkError, HandlerFn, IntWidth, OptionDescriptor,
    SchemaLocator, Value, ValueType,
};
use indexmap::IndexMap;
use serde::Deserialize;
use walkdir::WalkDir;

/// Maps a command file's declared handler name (a plain string in the
/// manifest — Rust can't address an arbitrary function by name without
/// help) to the actual function pointer the application compiled in.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, handler: HandlerFn) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<HandlerFn> {
        self.handlers.get(name).copied()
    }
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    description: String,
    usage: Option<String>,
    #[serde(default)]
    examples: Vec<String>,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    args: Vec<ArgManifest>,
    #[serde(default)]
    options: Vec<OptionManifest>,
    handler: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArgManifest {
    name: String,
    #[serde(rename = "type", default = "default_ty")]
    ty: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    variadic: bool,
    description: Option<String>,
    #[serde(default)]
    enum_values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OptionManifest {
    long: String,
    short: Option<char>,
    #[serde(rename = "type", default = "default_ty")]
    ty: String,
    default: Option<toml::Value>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    enum_values: Vec<String>,
}

fn default_ty() -> String {
    "string".to_string()
}

/// Loads the full command tree rooted at `commands_dir`. The root node
/// itself is synthetic (empty name, per spec §3) and is never required to
/// carry a handler or children — an empty commands directory is a valid,
/// if useless, tree (spec §8 boundary: empty argv with no root handler
/// yields `CommandNotFound` with an empty path).
pub fn load_tree(commands_dir: &Path, handlers: &HandlerRegistry) -> Result<CommandNode, DrkError> {
    let mut root = CommandNode::group(String::new(), CommandMetadata::default());
    populate_children(commands_dir, &[], handlers, &mut root)?;
    Ok(root)
}

fn populate_children(
    dir: &Path,
    path_so_far: &[String],
    handlers: &HandlerRegistry,
    node: &mut CommandNode,
) -> Result<(), DrkError> {
    if !dir.exists() {
        return Ok(());
    }

    tracing::debug!(dir = %dir.display(), "loader: scanning directory");

    let mut entries: Vec<_> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name().to_os_string());

    for entry in entries {
        let entry_path = entry.path().to_path_buf();

        if entry_path.is_dir() {
            let name = file_name_of(&entry_path)?;
            let mut child_path = path_so_far.to_vec();
            child_path.push(name.clone());

            let mut child = CommandNode::group(name, CommandMetadata::default());
            populate_children(&entry_path, &child_path, handlers, &mut child)?;

            let index_path = entry_path.join("index.toml");
            if index_path.is_file() {
                apply_manifest(&index_path, &mut child, &child_path, handlers, true)?;
            }

            child.validate(&child_path, Some(&entry_path))?;
            node.insert_child(child)?;
        } else if is_toml(&entry_path) && stem_of(&entry_path)? != "index" {
            let name = stem_of(&entry_path)?;
            let mut child_path = path_so_far.to_vec();
            child_path.push(name.clone());

            let mut child = CommandNode::group(name, CommandMetadata::default());
            apply_manifest(&entry_path, &mut child, &child_path, handlers, false)?;
            child.validate(&child_path, Some(&entry_path))?;
            node.insert_child(child)?;
        }
    }

    Ok(())
}

fn apply_manifest(
    path: &Path,
    node: &mut CommandNode,
    node_path: &[String],
    handlers: &HandlerRegistry,
    allow_missing_handler: bool,
) -> Result<(), DrkError> {
    let locator = |field: Option<&str>| SchemaLocator {
        file: Some(path.to_path_buf()),
        node_path: node_path.to_vec(),
        field: field.map(str::to_string),
    };

    let raw = fs::read_to_string(path).map_err(|e| DrkError::SchemaInvalid {
        locator: locator(None),
        message: format!("failed to read manifest: {e}"),
    })?;
    let manifest: ManifestFile = toml::from_str(&raw).map_err(|e| DrkError::SchemaInvalid {
        locator: locator(None),
        message: format!("invalid manifest syntax: {e}"),
    })?;

    node.metadata = CommandMetadata {
        description: manifest.description,
        usage: manifest.usage,
        examples: manifest.examples,
        arg_descriptions: manifest
            .args
            .iter()
            .filter_map(|a| a.description.clone().map(|d| (a.name.clone(), d)))
            .collect::<BTreeMap<_, _>>(),
        synonyms: manifest.synonyms,
    };

    node.args_schema = manifest
        .args
        .iter()
        .map(|a| {
            Ok(ArgDescriptor {
                name: a.name.clone(),
                value_type: parse_value_type(&a.ty, &a.enum_values, path, node_path, &a.name)?,
                required: a.required,
                variadic: a.variadic,
                description: a.description.clone(),
            })
        })
        .collect::<Result<Vec<_>, DrkError>>()?;

    let mut options = IndexMap::new();
    for opt in &manifest.options {
        let value_type = parse_value_type(&opt.ty, &opt.enum_values, path, node_path, &opt.long)?;
        let takes_value = !matches!(value_type, ValueType::Boolean);
        let default = match &opt.default {
            Some(tv) => Some(convert_default(tv, &value_type, path, node_path, &opt.long)?),
            None if !takes_value => Some(Value::Boolean(false)),
            None => None,
        };
        let descriptor = OptionDescriptor {
            long_name: opt.long.clone(),
            short: opt.short,
            value_type,
            default,
            takes_value,
            description: opt.description.clone(),
        };
        if options.insert(descriptor.long_name.clone(), descriptor).is_some() {
            return Err(DrkError::SchemaInvalid {
                locator: locator(Some(&opt.long)),
                message: "duplicate option long name in this file".to_string(),
            });
        }
    }
    node.options_schema = options;

    match manifest.handler {
        Some(name) => {
            handlers.get(&name).ok_or_else(|| DrkError::SchemaInvalid {
                locator: locator(Some("handler")),
                message: format!("handler '{name}' is not registered"),
            })?;
            node.has_handler = true;
            node.handler_name = Some(name);
        }
        None if allow_missing_handler => {
            node.has_handler = false;
            node.handler_name = None;
        }
        None => {
            return Err(DrkError::SchemaInvalid {
                locator: locator(Some("handler")),
                message: "command file has no handler and cannot declare subcommands".to_string(),
            });
        }
    }

    Ok(())
}

fn parse_value_type(
    ty: &str,
    enum_values: &[String],
    path: &Path,
    node_path: &[String],
    field: &str,
) -> Result<ValueType, DrkError> {
    match ty {
        "string" => Ok(ValueType::String),
        "boolean" | "bool" => Ok(ValueType::Boolean),
        "float" => Ok(ValueType::Float),
        "array" => Ok(ValueType::ArrayOfString),
        "integer" | "int" => Ok(ValueType::Integer(IntWidth::I64)),
        "enum" => Ok(ValueType::Enumeration(enum_values.to_vec())),
        other => Err(DrkError::SchemaInvalid {
            locator: SchemaLocator {
                file: Some(path.to_path_buf()),
                node_path: node_path.to_vec(),
                field: Some(field.to_string()),
            },
            message: format!("unknown value type '{other}'"),
        }),
    }
}

fn convert_default(
    raw: &toml::Value,
    value_type: &ValueType,
    path: &Path,
    node_path: &[String],
    field: &str,
) -> Result<Value, DrkError> {
    let mismatch = || DrkError::SchemaInvalid {
        locator: SchemaLocator {
            file: Some(path.to_path_buf()),
            node_path: node_path.to_vec(),
            field: Some(field.to_string()),
        },
        message: "default value is not assignable to the declared type".to_string(),
    };

    Ok(match (value_type, raw) {
        (ValueType::Boolean, toml::Value::Boolean(b)) => Value::Boolean(*b),
        (ValueType::Integer(_), toml::Value::Integer(i)) => Value::Integer(*i),
        (ValueType::Float, toml::Value::Float(f)) => Value::Float(*f),
        (ValueType::Float, toml::Value::Integer(i)) => Value::Float(*i as f64),
        (ValueType::String, toml::Value::String(s)) => Value::String(s.clone()),
        (ValueType::Enumeration(labels), toml::Value::String(s)) if labels.contains(s) => {
            Value::String(s.clone())
        }
        (ValueType::ArrayOfString, toml::Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    toml::Value::String(s) => out.push(s.clone()),
                    _ => return Err(mismatch()),
                }
            }
            Value::Array(out)
        }
        _ => return Err(mismatch()),
    })
}

fn is_toml(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "toml")
}

fn stem_of(path: &Path) -> Result<String, DrkError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| DrkError::SchemaInvalid {
            locator: SchemaLocator {
                file: Some(path.to_path_buf()),
                node_path: Vec::new(),
                field: None,
            },
            message: "command file name is not valid UTF-8".to_string(),
        })
}

fn file_name_of(path: &Path) -> Result<String, DrkError> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| DrkError::SchemaInvalid {
            locator: SchemaLocator {
                file: Some(path.to_path_buf()),
                node_path: Vec::new(),
                field: None,
            },
            message: "directory name is not valid UTF-8".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_dir() -> std::path::PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        std::env::temp_dir().join(format!("drk-loader-test-{nanos}"))
    }

    fn noop(_a: &drk_api::Args, _o: &drk_api::Options, _c: &mut drk_api::Context) -> drk_api::Result<()> {
        Ok(())
    }

    #[test]
    fn loads_a_flat_command_file() {
        let dir = unique_tmp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("hello.toml"),
            r#"
            description = "Greet someone"
            handler = "hello"

            [[args]]
            name = "name"
            type = "string"
            required = true

            [[options]]
            long = "loud"
            short = "l"
            type = "boolean"
            description = "Shout it"
            "#,
        )
        .unwrap();

        let handlers = HandlerRegistry::new().register("hello", noop);
        let tree = load_tree(&dir, &handlers).unwrap();
        let hello = tree.children.get("hello").unwrap();
        assert!(hello.has_handler);
        assert_eq!(hello.args_schema.len(), 1);
        assert!(hello.options_schema.contains_key("loud"));
    }

    #[test]
    fn directory_without_index_is_a_pure_group() {
        let dir = unique_tmp_dir();
        fs::create_dir_all(dir.join("users")).unwrap();
        fs::write(
            dir.join("users").join("list.toml"),
            r#"description = "List users"
            handler = "users_list"
            "#,
        )
        .unwrap();

        let handlers = HandlerRegistry::new().register("users_list", noop);
        let tree = load_tree(&dir, &handlers).unwrap();
        let users = tree.children.get("users").unwrap();
        assert!(!users.has_handler);
        assert!(users.children.contains_key("list"));
    }

    #[test]
    fn missing_handler_on_leaf_file_is_fatal() {
        let dir = unique_tmp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("broken.toml"), r#"description = "No handler here""#).unwrap();

        let handlers = HandlerRegistry::new();
        assert!(load_tree(&dir, &handlers).is_err());
    }

    #[test]
    fn unregistered_handler_name_is_fatal() {
        let dir = unique_tmp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("broken.toml"),
            r#"description = "x"
            handler = "does_not_exist"
            "#,
        )
        .unwrap();

        let handlers = HandlerRegistry::new();
        assert!(load_tree(&dir, &handlers).is_err());
    }
}
