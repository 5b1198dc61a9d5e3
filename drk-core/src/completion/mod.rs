//! Completion generator (spec §4.J): walks the registry once into a
//! shell-neutral tree, then each shell backend renders that tree into its
//! own nested case/switch syntax. Generation is pure (no I/O), so the same
//! registry always yields byte-identical output for a given shell.

mod bash;
mod fish;
mod zsh;

use drk_api::{CommandNode, CommandSummary, OptionDescriptor};

use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bash" => Some(Self::Bash),
            "zsh" => Some(Self::Zsh),
            "fish" => Some(Self::Fish),
            _ => None,
        }
    }
}

/// One node of the shell-neutral completion tree: its own path, the
/// subcommand candidates reachable from it, the option candidates local to
/// it, and its children (one per subcommand).
pub struct CompletionNode {
    pub path: Vec<String>,
    pub subcommands: Vec<(String, String)>,
    pub options: Vec<(String, String)>,
    pub children: Vec<CompletionNode>,
}

fn build_tree(node: &CommandNode, global_options: &[(String, String)], path: Vec<String>) -> CompletionNode {
    let subcommands = node
        .children
        .iter()
        .map(|(name, child)| (name.clone(), child.metadata.description.clone()))
        .collect();

    let mut options: Vec<(String, String)> = node
        .options_schema
        .values()
        .map(|opt| (option_flag(opt), opt.description.clone()))
        .collect();
    options.extend(global_options.iter().cloned());

    let children = node
        .children
        .iter()
        .map(|(name, child)| {
            let mut child_path = path.clone();
            child_path.push(name.clone());
            build_tree(child, global_options, child_path)
        })
        .collect();

    CompletionNode {
        path,
        subcommands,
        options,
        children,
    }
}

fn option_flag(opt: &OptionDescriptor) -> String {
    match opt.short {
        Some(short) => format!("--{} -{}", opt.long_name, short),
        None => format!("--{}", opt.long_name),
    }
}

/// Rebuilds the same shell-neutral tree from a `Context`'s flat
/// `available_commands` rather than a live `Registry` reference — a
/// command handler only ever sees the former (spec §4.K), so this is what
/// the bundled completions plugin actually calls.
pub fn build_tree_from_summaries(summaries: &[CommandSummary]) -> CompletionNode {
    build_node_from_summaries(&[], summaries)
}

fn build_node_from_summaries(path: &[String], summaries: &[CommandSummary]) -> CompletionNode {
    let depth = path.len();

    let subcommands: Vec<(String, String)> = summaries
        .iter()
        .filter(|s| s.path.len() == depth + 1 && s.path[..depth] == *path)
        .map(|s| (s.path[depth].clone(), s.description.clone()))
        .collect();

    let options: Vec<(String, String)> = summaries
        .iter()
        .find(|s| s.path == path)
        .map(|s| s.options.iter().map(|o| (option_flag(o), o.description.clone())).collect())
        .unwrap_or_default();

    let children = subcommands
        .iter()
        .map(|(name, _)| {
            let mut child_path = path.to_vec();
            child_path.push(name.clone());
            build_node_from_summaries(&child_path, summaries)
        })
        .collect();

    CompletionNode {
        path: path.to_vec(),
        subcommands,
        options,
        children,
    }
}

/// Generates a completion script purely from a flat command summary list
/// and an app name, with no `Registry` in scope.
pub fn generate_from_summaries(app_name: &str, summaries: &[CommandSummary], shell: Shell) -> String {
    let tree = build_tree_from_summaries(summaries);
    match shell {
        Shell::Bash => bash::render(app_name, &tree),
        Shell::Zsh => zsh::render(app_name, &tree),
        Shell::Fish => fish::render(app_name, &tree),
    }
}

/// Generates a single completion script for `shell`, naming the program
/// `app_name`.
pub fn generate(registry: &Registry, app_name: &str, shell: Shell) -> String {
    let global_options: Vec<(String, String)> = registry
        .global_options
        .values()
        .map(|opt| (option_flag(opt), opt.description.clone()))
        .collect();
    let tree = build_tree(&registry.root, &global_options, Vec::new());

    match shell {
        Shell::Bash => bash::render(app_name, &tree),
        Shell::Zsh => zsh::render(app_name, &tree),
        Shell::Fish => fish::render(app_name, &tree),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use drk_api::CommandMetadata;
    use indexmap::IndexMap;

    fn sample_registry() -> Registry {
        let mut root = CommandNode::group(String::new(), CommandMetadata::default());
        root.insert_child(CommandNode::leaf(
            "build",
            CommandMetadata {
                description: "build an image".to_string(),
                ..Default::default()
            },
            Vec::new(),
            IndexMap::new(),
            "build",
        ))
        .unwrap();
        compose(root, Vec::new()).unwrap()
    }

    #[test]
    fn generation_is_deterministic_across_calls() {
        let registry = sample_registry();
        let first = generate(&registry, "drk", Shell::Bash);
        let second = generate(&registry, "drk", Shell::Bash);
        assert_eq!(first, second);
    }

    #[test]
    fn every_shell_mentions_the_top_level_subcommand() {
        let registry = sample_registry();
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let script = generate(&registry, "drk", shell);
            assert!(script.contains("build"), "{shell:?} script missing subcommand");
        }
    }

    #[test]
    fn summaries_based_generation_matches_registry_based_generation_topology() {
        let registry = sample_registry();
        let from_registry = generate(&registry, "drk", Shell::Fish);
        let from_summaries = generate_from_summaries("drk", &registry.flat_commands, Shell::Fish);
        assert_eq!(from_registry, from_summaries);
    }
}
