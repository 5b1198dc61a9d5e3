//! Schema binder (spec §4.F): turns a [`crate::token_parser::ParseResult`]
//! plus a resolved [`CommandNode`] into typed [`Args`]/[`Options`], or the
//! first binding error encountered.

use std::collections::HashMap;

use drk_api::{ArgDescriptor, Args, CommandNode, DrkError, IntWidth, OptionDescriptor, Options, Value, ValueType};

use crate::token_parser::{ParseResult, RawValue};

/// Binds positionals against `node.args_schema` and options against
/// `node.options_schema` plus the registry's global options. `global_options`
/// is passed in explicitly so the binder never needs to know about plugin
/// composition, only about the descriptors that apply to this dispatch.
pub fn bind(
    node: &CommandNode,
    global_options: &indexmap::IndexMap<String, OptionDescriptor>,
    parsed: &ParseResult,
) -> Result<(Args, Options), DrkError> {
    if let Some(first) = parsed.errors.first() {
        return Err(clone_error(first));
    }

    let args = bind_positionals(&node.args_schema, &parsed.positionals)?;
    let options = bind_options(node, global_options, &parsed.merged_options())?;
    Ok((args, options))
}

fn clone_error(err: &DrkError) -> DrkError {
    // `DrkError` does not derive `Clone` (it wraps `anyhow::Error`), so
    // parser-detected errors are re-described by kind instead of cloned.
    match err {
        DrkError::CommandNotFound { path, offending } => DrkError::CommandNotFound {
            path: path.clone(),
            offending: offending.clone(),
        },
        DrkError::UnknownOption { token } => DrkError::UnknownOption { token: token.clone() },
        DrkError::DuplicateOption { name } => DrkError::DuplicateOption { name: name.clone() },
        DrkError::InvalidOptionValue { option, value } => DrkError::InvalidOptionValue {
            option: option.clone(),
            value: value.clone(),
        },
        other => DrkError::InvalidUsage(other.to_string()),
    }
}

fn bind_positionals(schema: &[ArgDescriptor], positionals: &[String]) -> Result<Args, DrkError> {
    let mut args = Args::new();
    let mut cursor = 0;

    for (idx, descriptor) in schema.iter().enumerate() {
        let is_last = idx + 1 == schema.len();

        if descriptor.variadic {
            let rest: Vec<String> = positionals[cursor..].to_vec();
            if descriptor.required && rest.is_empty() {
                return Err(DrkError::MissingArgument {
                    name: descriptor.name.clone(),
                });
            }
            args.insert(descriptor.name.clone(), Value::Array(rest));
            cursor = positionals.len();
            continue;
        }

        match positionals.get(cursor) {
            Some(raw) => {
                let value = coerce_scalar(&descriptor.value_type, raw).map_err(|_| DrkError::InvalidOptionValue {
                    option: descriptor.name.clone(),
                    value: raw.clone(),
                })?;
                args.insert(descriptor.name.clone(), value);
                cursor += 1;
            }
            None if descriptor.required => {
                return Err(DrkError::MissingArgument {
                    name: descriptor.name.clone(),
                });
            }
            None => {}
        }

        if is_last && cursor < positionals.len() {
            return Err(DrkError::TooManyArguments {
                count: positionals.len(),
                max: cursor,
            });
        }
    }

    if schema.is_empty() && !positionals.is_empty() {
        return Err(DrkError::TooManyArguments {
            count: positionals.len(),
            max: 0,
        });
    }

    Ok(args)
}

fn bind_options(
    node: &CommandNode,
    global_options: &indexmap::IndexMap<String, OptionDescriptor>,
    raw: &HashMap<String, Vec<RawValue>>,
) -> Result<Options, DrkError> {
    let mut options = Options::new();

    for (name, descriptor) in node.options_schema.iter().chain(global_options.iter()) {
        let default = descriptor.default.clone();
        match raw.get(name) {
            Some(values) => {
                let bound = bind_option_values(descriptor, values)?;
                options.insert(name.clone(), bound);
            }
            None => {
                if let Some(default) = default {
                    options.insert(name.clone(), default);
                }
            }
        }
    }

    Ok(options)
}

fn bind_option_values(descriptor: &OptionDescriptor, values: &[RawValue]) -> Result<Value, DrkError> {
    if descriptor.value_type.is_array() {
        let mut out = Vec::with_capacity(values.len());
        for v in values {
            match v {
                RawValue::Value(s) => out.push(s.clone()),
                RawValue::Flag => {
                    return Err(DrkError::InvalidOptionValue {
                        option: descriptor.long_name.clone(),
                        value: String::new(),
                    })
                }
            }
        }
        return Ok(Value::Array(out));
    }

    // Non-array: the token parser already rejected a second occurrence as
    // DuplicateOption, so at most one value remains here.
    let value = values.first().expect("bound option must have at least one occurrence");
    match (&descriptor.value_type, value) {
        (ValueType::Boolean, RawValue::Flag) => Ok(Value::Boolean(true)),
        (ValueType::Boolean, RawValue::Value(s)) => Value::parse_bool_literal(s)
            .map(Value::Boolean)
            .ok_or_else(|| DrkError::InvalidOptionValue {
                option: descriptor.long_name.clone(),
                value: s.clone(),
            }),
        (_, RawValue::Flag) => Err(DrkError::InvalidOptionValue {
            option: descriptor.long_name.clone(),
            value: String::new(),
        }),
        (other, RawValue::Value(s)) => coerce_scalar(other, s).map_err(|_| DrkError::InvalidOptionValue {
            option: descriptor.long_name.clone(),
            value: s.clone(),
        }),
    }
}

fn coerce_scalar(value_type: &ValueType, raw: &str) -> Result<Value, ()> {
    match value_type {
        ValueType::String => Ok(Value::String(raw.to_string())),
        ValueType::Boolean => Value::parse_bool_literal(raw).map(Value::Boolean).ok_or(()),
        ValueType::Float => raw.parse::<f64>().map(Value::Float).map_err(|_| ()),
        ValueType::Integer(width) => coerce_integer(*width, raw),
        ValueType::Enumeration(labels) => {
            if labels.iter().any(|l| l == raw) {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(())
            }
        }
        ValueType::ArrayOfString => Ok(Value::Array(vec![raw.to_string()])),
    }
}

fn coerce_integer(width: IntWidth, raw: &str) -> Result<Value, ()> {
    match width {
        IntWidth::U8 => raw.parse::<u8>().map(|v| Value::Unsigned(v as u64)).map_err(|_| ()),
        IntWidth::U16 => raw.parse::<u16>().map(|v| Value::Unsigned(v as u64)).map_err(|_| ()),
        IntWidth::U32 => raw.parse::<u32>().map(|v| Value::Unsigned(v as u64)).map_err(|_| ()),
        IntWidth::U64 => raw.parse::<u64>().map(Value::Unsigned).map_err(|_| ()),
        IntWidth::I8 => raw.parse::<i8>().map(|v| Value::Integer(v as i64)).map_err(|_| ()),
        IntWidth::I16 => raw.parse::<i16>().map(|v| Value::Integer(v as i64)).map_err(|_| ()),
        IntWidth::I32 => raw.parse::<i32>().map(|v| Value::Integer(v as i64)).map_err(|_| ()),
        IntWidth::I64 => raw.parse::<i64>().map(Value::Integer).map_err(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drk_api::CommandMetadata;
    use indexmap::IndexMap;

    fn parsed(positionals: &[&str]) -> ParseResult {
        ParseResult {
            command_path: Vec::new(),
            long_options: HashMap::new(),
            short_options: HashMap::new(),
            positionals: positionals.iter().map(|s| s.to_string()).collect(),
            double_dash_tail: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[test]
    fn required_then_variadic_binds_correctly() {
        let schema = vec![
            ArgDescriptor::required("image", ValueType::String),
            ArgDescriptor::variadic("command"),
        ];
        let node = CommandNode::leaf("run", CommandMetadata::default(), schema, IndexMap::new(), "run");
        let (args, _) = bind(&node, &IndexMap::new(), &parsed(&["ubuntu", "bash", "-c", "ls"])).unwrap();
        assert_eq!(args.str("image"), Some("ubuntu"));
        assert_eq!(args.array("command"), &["bash".to_string(), "-c".to_string(), "ls".to_string()][..]);
    }

    #[test]
    fn missing_required_argument_is_an_error() {
        let schema = vec![ArgDescriptor::required("image", ValueType::String)];
        let node = CommandNode::leaf("run", CommandMetadata::default(), schema, IndexMap::new(), "run");
        let err = bind(&node, &IndexMap::new(), &parsed(&[])).unwrap_err();
        assert!(matches!(err, DrkError::MissingArgument { .. }));
    }

    #[test]
    fn too_many_positionals_without_variadic_is_an_error() {
        let schema = vec![ArgDescriptor::required("image", ValueType::String)];
        let node = CommandNode::leaf("run", CommandMetadata::default(), schema, IndexMap::new(), "run");
        let err = bind(&node, &IndexMap::new(), &parsed(&["ubuntu", "extra"])).unwrap_err();
        assert!(matches!(err, DrkError::TooManyArguments { .. }));
    }

    #[test]
    fn integer_coercion_rejects_non_numeric_values() {
        let schema = vec![ArgDescriptor::required("count", ValueType::Integer(IntWidth::I64))];
        let node = CommandNode::leaf("x", CommandMetadata::default(), schema, IndexMap::new(), "x");
        let err = bind(&node, &IndexMap::new(), &parsed(&["not-a-number"])).unwrap_err();
        assert!(matches!(err, DrkError::InvalidOptionValue { .. }));
    }

    #[test]
    fn option_default_is_used_when_absent() {
        let mut options = IndexMap::new();
        options.insert(
            "verbose".to_string(),
            OptionDescriptor::boolean("verbose", Some('v')),
        );
        let node = CommandNode::leaf("x", CommandMetadata::default(), Vec::new(), options, "x");
        let (_, opts) = bind(&node, &IndexMap::new(), &parsed(&[])).unwrap();
        assert_eq!(opts.boolean("verbose"), false);
    }
}
