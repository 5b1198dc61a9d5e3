//! The immutable, build-time-composed `Registry` (spec §3, §4.D).
//!
//! Produced once by [`crate::composer::compose`] and shared read-only for
//! the lifetime of the process; no locking is used or required (spec §5).

use std::collections::HashMap;
use std::sync::Arc;

use drk_api::{CommandNode, CommandSummary, HookKind, OptionDescriptor, Plugin};
use indexmap::IndexMap;

/// Plugin hook lists, one per lifecycle event, in plugin-declaration order
/// (spec §4.C step 3, §5 ordering guarantees).
#[derive(Default, Clone)]
pub struct HookLists {
    pub handle_global_option: Vec<Arc<dyn Plugin>>,
    pub pre_execute: Vec<Arc<dyn Plugin>>,
    pub on_error: Vec<Arc<dyn Plugin>>,
    pub on_startup: Vec<Arc<dyn Plugin>>,
}

impl HookLists {
    pub fn register(&mut self, plugin: Arc<dyn Plugin>, hooks: &[HookKind]) {
        for hook in hooks {
            match hook {
                HookKind::HandleGlobalOption => self.handle_global_option.push(plugin.clone()),
                HookKind::PreExecute => self.pre_execute.push(plugin.clone()),
                HookKind::OnError => self.on_error.push(plugin.clone()),
                HookKind::OnStartup => self.on_startup.push(plugin.clone()),
            }
        }
    }
}

pub struct Registry {
    pub root: CommandNode,
    pub global_options: IndexMap<String, OptionDescriptor>,
    /// Reverse index from short character to the owning global option's
    /// long name — used by the token parser to resolve clustered shorts
    /// that the currently-resolved node doesn't itself claim (spec §4.D).
    pub global_short_index: HashMap<char, String>,
    pub hooks: HookLists,
    /// Every plugin that declared a context extension, in plugin order;
    /// the dispatcher calls `context_extension()` on each when building a
    /// fresh `Context`.
    pub extension_plugins: Vec<Arc<dyn Plugin>>,
    /// Flat enumeration of every reachable command path (spec §3, §4.D),
    /// used by the suggestion engine and completion generator.
    pub flat_commands: Vec<CommandSummary>,
}

impl Registry {
    /// Recomputes `flat_commands` from `root`. Called once by the
    /// composer after merging is complete.
    pub fn flatten(root: &CommandNode) -> Vec<CommandSummary> {
        let mut out = Vec::new();
        flatten_into(root, &mut Vec::new(), &mut out);
        out
    }

    pub fn find(&self, path: &[String]) -> Option<&CommandNode> {
        let mut node = &self.root;
        for segment in path {
            node = node.children.get(segment)?;
        }
        Some(node)
    }
}

fn flatten_into(node: &CommandNode, prefix: &mut Vec<String>, out: &mut Vec<CommandSummary>) {
    if !prefix.is_empty() {
        out.push(CommandSummary {
            path: prefix.clone(),
            description: node.metadata.description.clone(),
            is_leaf: node.has_handler,
            options: node.options_schema.values().cloned().collect(),
        });
    }
    for (name, child) in &node.children {
        prefix.push(name.clone());
        flatten_into(child, prefix, out);
        prefix.pop();
    }
}
