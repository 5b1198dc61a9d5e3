//! Bundled `greet`/`echo` demo commands, statically composed into every
//! drk host (spec §2 default application surface).

use std::io::Write as _;

use drk_api::{
    icon_error, icon_info, icon_success, style_error, style_primary, style_success, ArgDescriptor,
    Args, CommandFile, CommandMetadata, CommandNode, Context, DrkError, Options, Plugin,
    PluginManifest, ValueType,
};

pub struct BasicPlugin;

impl Plugin for BasicPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("basic")
    }

    fn provided_commands(&self) -> Vec<CommandFile> {
        vec![
            CommandFile {
                path: vec!["greet".to_string()],
                node: CommandNode::leaf(
                    "greet",
                    CommandMetadata {
                        description: "Greet someone by name".to_string(),
                        ..Default::default()
                    },
                    vec![ArgDescriptor::optional("name", ValueType::String)
                        .with_description("The name to greet")],
                    Default::default(),
                    "basic::greet",
                ),
            },
            CommandFile {
                path: vec!["echo".to_string()],
                node: CommandNode::leaf(
                    "echo",
                    CommandMetadata {
                        description: "Echo back a message".to_string(),
                        ..Default::default()
                    },
                    vec![ArgDescriptor::required("message", ValueType::String)
                        .with_description("The message to echo")],
                    Default::default(),
                    "basic::echo",
                ),
            },
        ]
    }
}

pub fn greet(args: &Args, _options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
    let name = args.str("name").unwrap_or("World");
    writeln!(
        ctx.stdout(),
        "{} {} {}{}",
        style_success(icon_success()),
        style_success("Hello"),
        style_primary(name),
        style_success("!")
    )
    .map_err(|e| DrkError::HandlerError(e.into()))
}

pub fn echo(args: &Args, _options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
    let Some(message) = args.str("message") else {
        writeln!(
            ctx.stderr(),
            "{}: {}",
            style_error(icon_error()),
            style_error("message argument is required")
        )
        .ok();
        return Err(DrkError::MissingArgument {
            name: "message".to_string(),
        });
    };
    writeln!(ctx.stdout(), "{} {}", icon_info(), style_primary(message))
        .map_err(|e| DrkError::HandlerError(e.into()))
}

/// Registers this plugin's handlers into a [`drk_core::HandlerRegistry`].
pub fn register(handlers: drk_core::HandlerRegistry) -> drk_core::HandlerRegistry {
    handlers.register("basic::greet", greet).register("basic::echo", echo)
}
