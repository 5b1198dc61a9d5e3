//! The plugin contract (spec §3, §6). A plugin is a bundle of commands,
//! global options, lifecycle hooks, and an optional context extension,
//! composed into the registry at build time (§4.C) — never loaded
//! dynamically; see DESIGN.md for why the teacher's `libloading`-based
//! manager was dropped in favor of this static trait-object form.

use crate::context::Context;
use crate::error::DrkError;
use crate::schema::{CommandNode, HookKind, OptionDescriptor, PluginManifest};
use crate::values::{Args, Options};

/// What a dispatched command handler receives (spec §6).
pub type HandlerFn = fn(&Args, &Options, &mut Context) -> Result<(), DrkError>;

/// The bound args/options for the node currently being dispatched, as
/// handed to `pre_execute` hooks.
#[derive(Debug, Clone)]
pub struct ParsedInvocation {
    pub command_path: Vec<String>,
    pub args: Args,
    pub options: Options,
}

/// What a `pre_execute` hook returns: either let dispatch continue with
/// (possibly modified) parsed args, or stop — the dispatcher treats a stop
/// as successful termination without invoking the handler (spec §4.G).
pub enum HookOutcome {
    Continue(ParsedInvocation),
    Stop,
}

/// A command file's declared pieces, as the loader assembles them from a
/// manifest before a `CommandNode` is built (spec §6 "command-file
/// contract").
pub struct CommandFile {
    pub path: Vec<String>,
    pub node: CommandNode,
}

/// All the pieces a plugin may contribute, merged into the tree by the
/// composer (spec §4.C).
pub trait Plugin: Send + Sync {
    fn manifest(&self) -> PluginManifest;

    /// Commands this plugin injects, each keyed by its full path in the
    /// tree (e.g. `["image", "build"]`).
    fn provided_commands(&self) -> Vec<CommandFile> {
        Vec::new()
    }

    /// Global options this plugin contributes, visible to every node.
    fn provided_global_options(&self) -> Vec<OptionDescriptor> {
        Vec::new()
    }

    /// Invoked once per matching global option encountered on the command
    /// line, in plugin order, before binding (spec §4.G step 3).
    fn handle_global_option(
        &self,
        _ctx: &mut Context,
        _name: &str,
        _value: &str,
    ) -> Result<(), DrkError> {
        Ok(())
    }

    /// Invoked after binding, before the handler runs (spec §4.G step 5).
    fn pre_execute(
        &self,
        _ctx: &mut Context,
        invocation: ParsedInvocation,
    ) -> Result<HookOutcome, DrkError> {
        Ok(HookOutcome::Continue(invocation))
    }

    /// Invoked when an unsuppressed error propagates (spec §4.G step 7).
    /// Returns `true` if this hook handled (and thus suppresses) the
    /// error.
    fn on_error(&self, _ctx: &mut Context, _error: &DrkError) -> bool {
        false
    }

    /// Invoked once, before any command dispatch begins.
    fn on_startup(&self, _ctx: &mut Context) -> Result<(), DrkError> {
        Ok(())
    }

    /// Optional per-dispatch context extension value. The composer
    /// records whether a plugin declares one (`PluginManifest
    /// ::has_context_extension`); the dispatcher calls this once per
    /// dispatch when building the Context, per plugin that declared one.
    fn context_extension(&self) -> Option<Box<dyn std::any::Any + Send + Sync>> {
        None
    }
}

/// Convenience for constructing a manifest whose `hooks` reflect exactly
/// the lifecycle methods a plugin overrides; callers that want precise
/// hook-list membership should build this by hand instead of relying on
/// defaults, since the trait can't introspect which methods were
/// overridden.
impl PluginManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: Vec::new(),
            has_context_extension: false,
        }
    }

    pub fn with_hooks(mut self, hooks: impl IntoIterator<Item = HookKind>) -> Self {
        self.hooks = hooks.into_iter().collect();
        self
    }

    pub fn with_context_extension(mut self) -> Self {
        self.has_context_extension = true;
        self
    }
}
