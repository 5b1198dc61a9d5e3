//! Token parser (spec §4.E): splits argv into command path, options,
//! positionals, and a `--` terminator tail. This is the framework's
//! correctness-critical tokenizer, hand-rolled rather than delegated to a
//! clap-style wrapper, since the tokenizer *is* the thing under
//! specification here.

use std::collections::HashMap;

use drk_api::{CommandNode, DrkError, OptionDescriptor};

use crate::registry::Registry;

/// One observed occurrence of an option's value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Flag,
    Value(String),
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    Long,
    Short,
}

struct Occurrence {
    origin: Origin,
    value: RawValue,
}

pub struct ParseResult {
    pub command_path: Vec<String>,
    /// Occurrences that arrived via `--name` / `--name=value` syntax.
    pub long_options: HashMap<String, Vec<RawValue>>,
    /// Occurrences that arrived via `-n` / clustered shorts, keyed by the
    /// option's long name (the binder only ever deals in long names).
    pub short_options: HashMap<String, Vec<RawValue>>,
    pub positionals: Vec<String>,
    pub double_dash_tail: Vec<String>,
    pub errors: Vec<DrkError>,
}

impl ParseResult {
    /// Long- and short-form occurrences merged by long name, in the order
    /// first-long-then-short is irrelevant since duplicate detection
    /// already ran across both forms during parsing — this exists purely
    /// for the binder's convenience.
    pub fn merged_options(&self) -> HashMap<String, Vec<RawValue>> {
        let mut merged = self.long_options.clone();
        for (name, values) in &self.short_options {
            merged.entry(name.clone()).or_default().extend(values.clone());
        }
        merged
    }
}

fn resolve_option<'a>(node: &'a CommandNode, registry: &'a Registry, name: &str) -> Option<&'a OptionDescriptor> {
    node.options_schema
        .get(name)
        .or_else(|| registry.global_options.get(name))
}

fn resolve_short<'a>(node: &'a CommandNode, registry: &'a Registry, ch: char) -> Option<&'a OptionDescriptor> {
    node.short_owner(ch).or_else(|| {
        registry
            .global_short_index
            .get(&ch)
            .and_then(|long| registry.global_options.get(long))
    })
}

fn record_option(
    options: &mut HashMap<String, Vec<Occurrence>>,
    descriptor: &OptionDescriptor,
    origin: Origin,
    value: RawValue,
    errors: &mut Vec<DrkError>,
) {
    let entry = options.entry(descriptor.long_name.clone()).or_default();
    if !entry.is_empty() && !descriptor.value_type.is_array() {
        errors.push(DrkError::DuplicateOption {
            name: descriptor.long_name.clone(),
        });
        return;
    }
    entry.push(Occurrence { origin, value });
}

/// Parses `tokens` (argv after the program name) against `registry`.
pub fn parse(tokens: &[String], registry: &Registry) -> ParseResult {
    let (command_path, mut idx, node) = resolve_command_path(tokens, registry);

    let mut errors = Vec::new();
    if node.is_group() {
        errors.push(DrkError::CommandNotFound {
            path: command_path.clone(),
            offending: tokens.get(idx).cloned(),
        });
    }

    let mut occurrences: HashMap<String, Vec<Occurrence>> = HashMap::new();
    let mut positionals = Vec::new();
    let mut double_dash_tail = Vec::new();
    let mut after_double_dash = false;

    while idx < tokens.len() {
        let tok = &tokens[idx];

        if after_double_dash {
            double_dash_tail.push(tok.clone());
            idx += 1;
            continue;
        }

        if tok == "--" {
            after_double_dash = true;
            idx += 1;
            continue;
        }

        if let Some(rest) = tok.strip_prefix("--") {
            idx += 1;
            if rest.chars().count() <= 1 {
                // Single-character names must use `-`, never `--` (spec §4.E.7).
                errors.push(DrkError::UnknownOption { token: tok.clone() });
                continue;
            }

            let (name, inline_value) = match rest.split_once('=') {
                Some((n, v)) => (n.to_string(), Some(v.to_string())),
                None => (rest.to_string(), None),
            };

            match resolve_option(node, registry, &name) {
                Some(descriptor) => {
                    let value = if descriptor.takes_value {
                        match inline_value {
                            Some(v) => RawValue::Value(v),
                            None => {
                                if idx < tokens.len() {
                                    let v = tokens[idx].clone();
                                    idx += 1;
                                    RawValue::Value(v)
                                } else {
                                    errors.push(DrkError::InvalidOptionValue {
                                        option: name.clone(),
                                        value: String::new(),
                                    });
                                    RawValue::Value(String::new())
                                }
                            }
                        }
                    } else {
                        RawValue::Flag
                    };
                    record_option(&mut occurrences, descriptor, Origin::Long, value, &mut errors);
                }
                None => errors.push(DrkError::UnknownOption { token: tok.clone() }),
            }
            continue;
        }

        if tok.len() > 1 && tok.starts_with('-') {
            let rest = &tok[1..];
            let first_char = rest.chars().next().unwrap();

            // Negative-number pre-pass: `-<digit>...` is a positional
            // unless some short option actually claims that digit.
            if first_char.is_ascii_digit() && resolve_short(node, registry, first_char).is_none() {
                positionals.push(tok.clone());
                idx += 1;
                continue;
            }

            idx += 1;
            for (byte_idx, ch) in rest.char_indices() {
                match resolve_short(node, registry, ch) {
                    Some(descriptor) if descriptor.takes_value => {
                        let remainder = &rest[byte_idx + ch.len_utf8()..];
                        let value = if !remainder.is_empty() {
                            remainder.to_string()
                        } else if idx < tokens.len() {
                            let v = tokens[idx].clone();
                            idx += 1;
                            v
                        } else {
                            errors.push(DrkError::InvalidOptionValue {
                                option: descriptor.long_name.clone(),
                                value: String::new(),
                            });
                            String::new()
                        };
                        record_option(
                            &mut occurrences,
                            descriptor,
                            Origin::Short,
                            RawValue::Value(value),
                            &mut errors,
                        );
                        break;
                    }
                    Some(descriptor) => {
                        record_option(&mut occurrences, descriptor, Origin::Short, RawValue::Flag, &mut errors);
                    }
                    None => {
                        errors.push(DrkError::UnknownOption { token: format!("-{ch}") });
                    }
                }
            }
            continue;
        }

        positionals.push(tok.clone());
        idx += 1;
    }

    let mut long_options: HashMap<String, Vec<RawValue>> = HashMap::new();
    let mut short_options: HashMap<String, Vec<RawValue>> = HashMap::new();
    for (name, occs) in occurrences {
        for occ in occs {
            let target = match occ.origin {
                Origin::Long => &mut long_options,
                Origin::Short => &mut short_options,
            };
            target.entry(name.clone()).or_default().push(occ.value);
        }
    }

    ParseResult {
        command_path,
        long_options,
        short_options,
        positionals,
        double_dash_tail,
        errors,
    }
}

/// Spec §4.E.1: consume leading non-`--` tokens as long as each matches a
/// child node's name, stopping at the first mismatch or at `--` itself.
fn resolve_command_path<'a>(tokens: &[String], registry: &'a Registry) -> (Vec<String>, usize, &'a CommandNode) {
    let mut node = &registry.root;
    let mut path = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        let tok = &tokens[idx];
        if tok == "--" {
            break;
        }
        match node.children.get(tok) {
            Some(child) => {
                path.push(tok.clone());
                node = child;
                idx += 1;
            }
            None => break,
        }
    }

    (path, idx, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use drk_api::{CommandMetadata, OptionDescriptor, Value, ValueType};
    use indexmap::IndexMap;

    fn registry_with_run_command() -> Registry {
        let mut options = IndexMap::new();
        options.insert("i".to_string(), OptionDescriptor::boolean("i", Some('i')));
        options.insert("t".to_string(), OptionDescriptor::boolean("t", Some('t')));
        let run = CommandNode::leaf("run", CommandMetadata::default(), Vec::new(), options, "run");

        let mut root = CommandNode::group(String::new(), CommandMetadata::default());
        root.insert_child(run).unwrap();
        compose(root, Vec::new()).unwrap()
    }

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clustered_shorts_and_positionals_scenario() {
        let registry = registry_with_run_command();
        let parsed = parse(&tokens(&["run", "-it", "ubuntu", "bash"]), &registry);
        assert_eq!(parsed.command_path, vec!["run".to_string()]);
        assert_eq!(parsed.positionals, vec!["ubuntu".to_string(), "bash".to_string()]);
        assert_eq!(parsed.short_options["i"], vec![RawValue::Flag]);
        assert_eq!(parsed.short_options["t"], vec![RawValue::Flag]);
    }

    #[test]
    fn double_dash_tail_keeps_leading_dashes() {
        let registry = registry_with_run_command();
        let parsed = parse(&tokens(&["run", "--", "-x", "--y"]), &registry);
        assert_eq!(parsed.double_dash_tail, vec!["-x".to_string(), "--y".to_string()]);
        assert!(parsed.positionals.is_empty());
    }

    #[test]
    fn negative_number_without_claiming_short_is_positional() {
        let registry = registry_with_run_command();
        let parsed = parse(&tokens(&["run", "-5"]), &registry);
        assert_eq!(parsed.positionals, vec!["-5".to_string()]);
    }

    #[test]
    fn repeated_boolean_is_duplicate_option_error() {
        let registry = registry_with_run_command();
        let parsed = parse(&tokens(&["run", "--i", "--i"]), &registry);
        assert!(parsed
            .errors
            .iter()
            .any(|e| matches!(e, DrkError::DuplicateOption { name } if name == "i")));
    }

    #[test]
    fn inline_equals_with_empty_value_is_allowed() {
        let mut options = IndexMap::new();
        options.insert(
            "name".to_string(),
            OptionDescriptor::value("name", None, ValueType::String),
        );
        let cmd = CommandNode::leaf("x", CommandMetadata::default(), Vec::new(), options, "x");
        let mut root = CommandNode::group(String::new(), CommandMetadata::default());
        root.insert_child(cmd).unwrap();
        let registry = compose(root, Vec::new()).unwrap();

        let parsed = parse(&tokens(&["x", "--name="]), &registry);
        assert_eq!(parsed.long_options["name"], vec![RawValue::Value(String::new())]);
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn array_option_accumulates_in_order() {
        let mut options = IndexMap::new();
        options.insert(
            "env".to_string(),
            OptionDescriptor::value("env", Some('e'), ValueType::ArrayOfString)
                .with_default(Value::Array(Vec::new())),
        );
        let cmd = CommandNode::leaf("x", CommandMetadata::default(), Vec::new(), options, "x");
        let mut root = CommandNode::group(String::new(), CommandMetadata::default());
        root.insert_child(cmd).unwrap();
        let registry = compose(root, Vec::new()).unwrap();

        let parsed = parse(&tokens(&["x", "--env", "a", "--env", "b"]), &registry);
        assert_eq!(
            parsed.long_options["env"],
            vec![RawValue::Value("a".to_string()), RawValue::Value("b".to_string())]
        );
    }

    #[test]
    fn unmatched_group_path_yields_command_not_found() {
        let registry = registry_with_run_command();
        let parsed = parse(&tokens(&[]), &registry);
        assert!(matches!(
            parsed.errors.first(),
            Some(DrkError::CommandNotFound { offending: None, .. })
        ));
    }
}
