//! Plugin composer (spec §4.C): merges plugin-provided commands, global
//! options, hooks, and context extensions into the loaded tree, in
//! declared plugin order. Plugin order is authoritative and defines hook
//! invocation order (spec §5).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use drk_api::{CommandMetadata, CommandNode, DrkError, OptionDescriptor, Plugin};
use indexmap::IndexMap;

use crate::help::{BUILTIN_HELP_LONG, BUILTIN_HELP_SHORT};
use crate::registry::{HookLists, Registry};

pub fn compose(mut tree: CommandNode, plugins: Vec<Arc<dyn Plugin>>) -> Result<Registry, DrkError> {
    let mut global_options: IndexMap<String, OptionDescriptor> = IndexMap::new();
    let mut global_short_index: HashMap<char, String> = HashMap::new();
    let mut hooks = HookLists::default();
    let mut extension_plugins = Vec::new();
    let mut seen_plugin_names = HashSet::new();

    let builtin_help = OptionDescriptor::boolean(BUILTIN_HELP_LONG, Some(BUILTIN_HELP_SHORT))
        .with_description("Print help for the resolved command and exit");
    check_no_local_collision(&tree, &builtin_help)?;
    global_options.insert(BUILTIN_HELP_LONG.to_string(), builtin_help);
    global_short_index.insert(BUILTIN_HELP_SHORT, BUILTIN_HELP_LONG.to_string());

    for plugin in &plugins {
        let manifest = plugin.manifest();
        if !seen_plugin_names.insert(manifest.name.clone()) {
            return Err(DrkError::NameCollision {
                path: vec![manifest.name.clone()],
                detail: "duplicate plugin name".to_string(),
            });
        }

        tracing::debug!(plugin = %manifest.name, "composer: merging plugin");

        for command_file in plugin.provided_commands() {
            merge_command(&mut tree, &command_file.path, command_file.node)?;
        }

        for opt in plugin.provided_global_options() {
            check_no_local_collision(&tree, &opt)?;
            if let Some(short) = opt.short {
                if let Some(owner) = global_short_index.get(&short) {
                    return Err(DrkError::NameCollision {
                        path: vec![opt.long_name.clone()],
                        detail: format!("short '-{short}' already claimed by global option '{owner}'"),
                    });
                }
            }
            if global_options.contains_key(&opt.long_name) {
                return Err(DrkError::NameCollision {
                    path: vec![opt.long_name.clone()],
                    detail: "duplicate global option long name".to_string(),
                });
            }
            if let Some(short) = opt.short {
                global_short_index.insert(short, opt.long_name.clone());
            }
            global_options.insert(opt.long_name.clone(), opt);
        }

        hooks.register(plugin.clone(), &manifest.hooks);

        if manifest.has_context_extension {
            extension_plugins.push(plugin.clone());
        }
    }

    let flat_commands = Registry::flatten(&tree);

    Ok(Registry {
        root: tree,
        global_options,
        global_short_index,
        hooks,
        extension_plugins,
        flat_commands,
    })
}

fn merge_command(tree: &mut CommandNode, path: &[String], incoming: CommandNode) -> Result<(), DrkError> {
    let Some((last, ancestors)) = path.split_last() else {
        return merge_node_into(tree, incoming, &[]);
    };

    let mut cursor = tree;
    for segment in ancestors {
        cursor = cursor
            .children
            .entry(segment.clone())
            .or_insert_with(|| CommandNode::group(segment.clone(), CommandMetadata::default()));
    }

    match cursor.children.get_mut(last) {
        Some(existing) => merge_node_into(existing, incoming, path),
        None => {
            cursor.children.insert(last.clone(), incoming);
            Ok(())
        }
    }
}

fn merge_node_into(existing: &mut CommandNode, incoming: CommandNode, path: &[String]) -> Result<(), DrkError> {
    if existing.has_handler && incoming.has_handler {
        return Err(DrkError::NameCollision {
            path: path.to_vec(),
            detail: "a command with a handler already exists at this path".to_string(),
        });
    }

    merge_metadata(&mut existing.metadata, &incoming.metadata, path)?;

    if incoming.has_handler {
        existing.has_handler = true;
        existing.handler_name = incoming.handler_name;
        existing.args_schema = incoming.args_schema;
        existing.options_schema = incoming.options_schema;
    }

    for (child_name, child_node) in incoming.children {
        match existing.children.get_mut(&child_name) {
            Some(existing_child) => {
                let mut child_path = path.to_vec();
                child_path.push(child_name);
                merge_node_into(existing_child, child_node, &child_path)?;
            }
            None => {
                existing.children.insert(child_name, child_node);
            }
        }
    }

    Ok(())
}

/// Plugin metadata never overwrites user (loader-provided) metadata;
/// a genuine conflict — both sides set a non-empty, differing description
/// — is fatal (spec §4.C step 1).
fn merge_metadata(existing: &mut CommandMetadata, incoming: &CommandMetadata, path: &[String]) -> Result<(), DrkError> {
    if existing.description.is_empty() {
        existing.description = incoming.description.clone();
    } else if !incoming.description.is_empty() && incoming.description != existing.description {
        return Err(DrkError::NameCollision {
            path: path.to_vec(),
            detail: "conflicting command descriptions from plugin and loaded tree".to_string(),
        });
    }

    if existing.usage.is_none() {
        existing.usage = incoming.usage.clone();
    }
    for example in &incoming.examples {
        if !existing.examples.contains(example) {
            existing.examples.push(example.clone());
        }
    }
    for (name, description) in &incoming.arg_descriptions {
        existing
            .arg_descriptions
            .entry(name.clone())
            .or_insert_with(|| description.clone());
    }
    for synonym in &incoming.synonyms {
        if !existing.synonyms.contains(synonym) {
            existing.synonyms.push(synonym.clone());
        }
    }

    Ok(())
}

fn check_no_local_collision(node: &CommandNode, opt: &OptionDescriptor) -> Result<(), DrkError> {
    if node.options_schema.contains_key(&opt.long_name) {
        return Err(DrkError::NameCollision {
            path: vec![node.name.clone(), opt.long_name.clone()],
            detail: "global option collides with a node's local option".to_string(),
        });
    }
    if let Some(short) = opt.short {
        if node.short_owner(short).is_some() {
            return Err(DrkError::NameCollision {
                path: vec![node.name.clone()],
                detail: format!("global option short '-{short}' collides with a node's local option"),
            });
        }
    }
    for child in node.children.values() {
        check_no_local_collision(child, opt)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drk_api::{CommandFile, HookKind, OptionDescriptor, PluginManifest, ValueType};

    struct StubPlugin {
        manifest: PluginManifest,
        commands: Vec<(Vec<String>, CommandNode)>,
        global_options: Vec<OptionDescriptor>,
    }

    impl Plugin for StubPlugin {
        fn manifest(&self) -> PluginManifest {
            self.manifest.clone()
        }

        fn provided_commands(&self) -> Vec<CommandFile> {
            self.commands
                .iter()
                .cloned()
                .map(|(path, node)| CommandFile { path, node })
                .collect()
        }

        fn provided_global_options(&self) -> Vec<OptionDescriptor> {
            self.global_options.clone()
        }
    }

    fn leaf(name: &str, handler: &str) -> CommandNode {
        CommandNode::leaf(
            name,
            CommandMetadata {
                description: format!("{name} command"),
                ..Default::default()
            },
            Vec::new(),
            IndexMap::new(),
            handler,
        )
    }

    #[test]
    fn merges_a_plugin_command_into_an_empty_tree() {
        let tree = CommandNode::group(String::new(), CommandMetadata::default());
        let plugin: Arc<dyn Plugin> = Arc::new(StubPlugin {
            manifest: PluginManifest::new("basic").with_hooks([]),
            commands: vec![(vec!["greet".to_string()], leaf("greet", "greet"))],
            global_options: Vec::new(),
        });

        let registry = compose(tree, vec![plugin]).unwrap();
        assert!(registry.root.children.get("greet").unwrap().has_handler);
    }

    #[test]
    fn rejects_a_plugin_command_colliding_with_an_existing_handler() {
        let mut tree = CommandNode::group(String::new(), CommandMetadata::default());
        tree.insert_child(leaf("greet", "user_greet")).unwrap();

        let plugin: Arc<dyn Plugin> = Arc::new(StubPlugin {
            manifest: PluginManifest::new("basic").with_hooks([]),
            commands: vec![(vec!["greet".to_string()], leaf("greet", "plugin_greet"))],
            global_options: Vec::new(),
        });

        assert!(compose(tree, vec![plugin]).is_err());
    }

    #[test]
    fn rejects_global_option_colliding_with_local_option() {
        let mut tree = CommandNode::group(String::new(), CommandMetadata::default());
        let mut child = leaf("run", "run");
        child
            .options_schema
            .insert("verbose".to_string(), OptionDescriptor::boolean("verbose", Some('v')));
        tree.insert_child(child).unwrap();

        let plugin: Arc<dyn Plugin> = Arc::new(StubPlugin {
            manifest: PluginManifest::new("globals").with_hooks([HookKind::HandleGlobalOption]),
            commands: Vec::new(),
            global_options: vec![OptionDescriptor::boolean("verbose", None)],
        });

        assert!(compose(tree, vec![plugin]).is_err());
    }

    #[test]
    fn duplicate_plugin_names_are_fatal() {
        let tree = CommandNode::group(String::new(), CommandMetadata::default());
        let make = || -> Arc<dyn Plugin> {
            Arc::new(StubPlugin {
                manifest: PluginManifest::new("dup").with_hooks([]),
                commands: Vec::new(),
                global_options: Vec::new(),
            })
        };
        assert!(compose(tree, vec![make(), make()]).is_err());
    }

    #[test]
    fn enum_option_type_survives_merge() {
        let tree = CommandNode::group(String::new(), CommandMetadata::default());
        let mut node = leaf("fmt", "fmt");
        node.options_schema.insert(
            "format".to_string(),
            OptionDescriptor::value("format", None, ValueType::Enumeration(vec!["json".into(), "text".into()])),
        );
        let plugin: Arc<dyn Plugin> = Arc::new(StubPlugin {
            manifest: PluginManifest::new("fmt").with_hooks([]),
            commands: vec![(vec!["fmt".to_string()], node)],
            global_options: Vec::new(),
        });
        let registry = compose(tree, vec![plugin]).unwrap();
        assert!(matches!(
            registry.root.children["fmt"].options_schema["format"].value_type,
            ValueType::Enumeration(_)
        ));
    }
}
