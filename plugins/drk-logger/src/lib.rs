//! Lifecycle-hook logging plugin: traces every dispatcher phase via
//! `tracing`, and prints a dim one-liner to stderr for each command it
//! sees run.

use std::io::Write as _;

use drk_api::{style_dim, style_primary, style_warning, Context, DrkError, HookKind, HookOutcome, ParsedInvocation, Plugin, PluginManifest};

pub struct LoggerPlugin;

impl Plugin for LoggerPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("logger").with_hooks([HookKind::OnStartup, HookKind::PreExecute, HookKind::OnError])
    }

    fn on_startup(&self, ctx: &mut Context) -> Result<(), DrkError> {
        tracing::info!("dispatcher starting up");
        let _ = writeln!(ctx.stderr(), "{} system is starting up", style_dim("[logger]"));
        Ok(())
    }

    fn pre_execute(&self, ctx: &mut Context, invocation: ParsedInvocation) -> Result<HookOutcome, DrkError> {
        let path = invocation.command_path.join(" ");
        tracing::info!(command = %path, "about to run");
        let _ = writeln!(ctx.stderr(), "{} about to run: {}", style_dim("[logger]"), style_primary(&path));
        Ok(HookOutcome::Continue(invocation))
    }

    fn on_error(&self, ctx: &mut Context, error: &DrkError) -> bool {
        tracing::warn!(error = %error, "command failed");
        let _ = writeln!(
            ctx.stderr(),
            "{} command completed with status: {}",
            style_dim("[logger]"),
            style_warning("failed")
        );
        false
    }
}
