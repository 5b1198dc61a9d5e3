//! Dispatcher (spec §4.G): drives one invocation end to end —
//! parse → `handle_global_option*` → bind → `pre_execute*` → handler →
//! `on_error*` → default reporter — all single-threaded and cooperative.

use std::io::Write as _;

use drk_api::{
    icon_error, style_error, AppIdentity, Context, DrkError, HookOutcome, ParsedInvocation,
};

use crate::binder;
use crate::help::{self, HelpTarget};
use crate::loader::HandlerRegistry;
use crate::registry::Registry;
use crate::suggest;
use crate::token_parser::{self, RawValue};

/// Runs one invocation of `argv` (program arguments, program name already
/// stripped) against `registry`, writing diagnostics to `ctx`'s streams.
/// Returns the process exit code (spec §7).
pub fn dispatch(
    registry: &Registry,
    handlers: &HandlerRegistry,
    app: AppIdentity,
    argv: &[String],
) -> i32 {
    let mut ctx = Context::new(app, registry.flat_commands.clone());
    for plugin in &registry.extension_plugins {
        if let Some(value) = plugin.context_extension() {
            ctx.set_extension_boxed(plugin.manifest().name, value);
        }
    }

    for plugin in &registry.hooks.on_startup {
        if let Err(err) = plugin.on_startup(&mut ctx) {
            return report(registry, &mut ctx, err);
        }
    }

    match run(registry, handlers, &mut ctx, argv) {
        Ok(code) => code,
        Err(err) => report(registry, &mut ctx, err),
    }
}

fn run(
    registry: &Registry,
    handlers: &HandlerRegistry,
    ctx: &mut Context,
    argv: &[String],
) -> Result<i32, DrkError> {
    let parsed = token_parser::parse(argv, registry);
    ctx.command_path = parsed.command_path.clone();

    let node = registry
        .find(&parsed.command_path)
        .expect("token parser only ever walks real tree edges");

    ctx.current_command = Some(drk_api::CommandReflection {
        path: parsed.command_path.clone(),
        description: node.metadata.description.clone(),
        arg_names: node.args_schema.iter().map(|a| a.name.clone()).collect(),
        option_names: node.options_schema.keys().cloned().collect(),
    });

    let merged = parsed.merged_options();
    for (name, descriptor) in &registry.global_options {
        let Some(values) = merged.get(name) else {
            continue;
        };
        for value in values {
            let as_str = match value {
                RawValue::Flag => "true".to_string(),
                RawValue::Value(v) => v.clone(),
            };
            for plugin in &registry.hooks.handle_global_option {
                plugin.handle_global_option(ctx, &descriptor.long_name, &as_str)?;
            }
        }
    }

    // The built-in `--help`/`-h` global option (spec §2 row H) short-circuits
    // dispatch entirely: it is handled here, in the dispatcher, rather than
    // through a plugin's `pre_execute` hook, because only the dispatcher
    // still holds a `&Registry` at this point. Resolves the "two parallel
    // help-plugin variants" open question (spec §9) by always rendering help
    // for the *deepest* node the token parser actually reached — a group if
    // dispatch stopped short of a handler, the command itself otherwise —
    // never a shallower ancestor.
    let command_not_found = parsed
        .errors
        .iter()
        .any(|e| matches!(e, DrkError::CommandNotFound { .. }));
    if !command_not_found {
        if merged.get(help::BUILTIN_HELP_LONG).is_some() {
            let target = if node.has_handler {
                HelpTarget::Command(parsed.command_path.clone())
            } else {
                HelpTarget::Group(parsed.command_path.clone())
            };
            let text = help::render(registry, &ctx.app, &target);
            let _ = write!(ctx.stderr(), "{text}");
            return Ok(0);
        }
    }

    if let Some(first) = parsed.errors.first() {
        return Err(rebuild_error(first));
    }

    let (args, options) = binder::bind(node, &registry.global_options, &parsed)?;

    let mut invocation = ParsedInvocation {
        command_path: parsed.command_path.clone(),
        args,
        options,
    };

    for plugin in &registry.hooks.pre_execute {
        match plugin.pre_execute(ctx, invocation)? {
            HookOutcome::Continue(next) => invocation = next,
            HookOutcome::Stop => return Ok(0),
        }
    }

    if !node.has_handler {
        // A group with no matching child and no plugin interception; the
        // token parser already turned this into CommandNotFound.
        return Err(DrkError::CommandNotFound {
            path: parsed.command_path.clone(),
            offending: None,
        });
    }

    let handler_name = node.handler_name.as_deref().expect("has_handler implies handler_name");
    let handler = handlers
        .get(handler_name)
        .ok_or_else(|| DrkError::InvalidUsage(format!("handler '{handler_name}' is not registered")))?;

    handler(&invocation.args, &invocation.options, ctx)?;
    Ok(0)
}

fn rebuild_error(err: &DrkError) -> DrkError {
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

/// Runs `on_error` hooks in plugin order; the first hook that reports
/// "handled" suppresses the default reporter but not the exit code — the
/// process still reflects the error kind (spec §7).
fn report(registry: &Registry, ctx: &mut Context, err: DrkError) -> i32 {
    let code = err.exit_code();

    let mut handled = false;
    for plugin in &registry.hooks.on_error {
        if plugin.on_error(ctx, &err) {
            handled = true;
            break;
        }
    }

    if !handled {
        default_report(registry, ctx, &err);
    }

    code
}

fn default_report(registry: &Registry, ctx: &mut Context, err: &DrkError) {
    let _ = writeln!(ctx.stderr(), "{} {}", icon_error(), style_error(&err.to_string()));

    if let DrkError::CommandNotFound { offending: Some(token), .. } = err {
        let candidates: Vec<String> = registry
            .flat_commands
            .iter()
            .map(|c| c.display_path())
            .collect();
        let suggestions = suggest::suggest(token, &candidates);
        if !suggestions.is_empty() {
            let _ = writeln!(ctx.stderr(), "Did you mean:");
            for suggestion in suggestions {
                let _ = writeln!(ctx.stderr(), "  {suggestion}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use drk_api::{Args, CommandMetadata, CommandNode, Options};
    use indexmap::IndexMap;

    fn succeeding(_args: &Args, _options: &Options, _ctx: &mut Context) -> Result<(), DrkError> {
        Ok(())
    }

    fn echo(args: &Args, _options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
        let _ = writeln!(ctx.stdout(), "{}", args.str("name").unwrap_or(""));
        Ok(())
    }

    fn app() -> AppIdentity {
        AppIdentity {
            name: "drk".to_string(),
            version: "0.0.0".to_string(),
            description: "test".to_string(),
        }
    }

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dispatch_runs_the_resolved_handler() {
        let mut root = CommandNode::group(String::new(), CommandMetadata::default());
        root.insert_child(CommandNode::leaf(
            "hello",
            CommandMetadata::default(),
            Vec::new(),
            IndexMap::new(),
            "hello",
        ))
        .unwrap();
        let registry = compose(root, Vec::new()).unwrap();
        let handlers = HandlerRegistry::new().register("hello", succeeding);

        let code = dispatch(&registry, &handlers, app(), &tokens(&["hello"]));
        assert_eq!(code, 0);
    }

    #[test]
    fn dispatch_reports_command_not_found_with_nonzero_exit() {
        let root = CommandNode::group(String::new(), CommandMetadata::default());
        let registry = compose(root, Vec::new()).unwrap();
        let handlers = HandlerRegistry::new();

        let code = dispatch(&registry, &handlers, app(), &tokens(&["nope"]));
        assert_eq!(code, 1);
    }

    #[test]
    fn dispatch_reports_binder_errors_with_exit_code_two() {
        use drk_api::{ArgDescriptor, ValueType};
        let mut root = CommandNode::group(String::new(), CommandMetadata::default());
        root.insert_child(CommandNode::leaf(
            "greet",
            CommandMetadata::default(),
            vec![ArgDescriptor::required("name", ValueType::String)],
            IndexMap::new(),
            "greet",
        ))
        .unwrap();
        let registry = compose(root, Vec::new()).unwrap();
        let handlers = HandlerRegistry::new().register("greet", echo);

        let code = dispatch(&registry, &handlers, app(), &tokens(&["greet"]));
        assert_eq!(code, 2);
    }

    #[test]
    fn builtin_help_flag_short_circuits_before_the_handler_runs() {
        use std::cell::Cell;
        thread_local! {
            static CALLED: Cell<bool> = Cell::new(false);
        }
        fn tripwire(_args: &Args, _options: &Options, _ctx: &mut Context) -> Result<(), DrkError> {
            CALLED.with(|c| c.set(true));
            Ok(())
        }

        let mut root = CommandNode::group(String::new(), CommandMetadata::default());
        root.insert_child(CommandNode::leaf(
            "hello",
            CommandMetadata {
                description: "say hello".to_string(),
                ..Default::default()
            },
            Vec::new(),
            IndexMap::new(),
            "hello",
        ))
        .unwrap();
        let registry = compose(root, Vec::new()).unwrap();
        let handlers = HandlerRegistry::new().register("hello", tripwire);

        let code = dispatch(&registry, &handlers, app(), &tokens(&["hello", "--help"]));
        assert_eq!(code, 0);
        assert!(!CALLED.with(|c| c.get()));
    }
}
