//! Help engine (spec §4.H): renders a canonical, stable-column help layout
//! for the app, the root, a group, or a single command.

use drk_api::{AppIdentity, CommandNode, OptionDescriptor};

use crate::registry::Registry;

const OPTION_COLUMN: usize = 16;

/// Long and short form of the built-in help flag that `composer::compose`
/// reserves as a global option on every registry (spec §2 row H).
pub const BUILTIN_HELP_LONG: &str = "help";
pub const BUILTIN_HELP_SHORT: char = 'h';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpTarget {
    App,
    Root,
    Group(Vec<String>),
    Command(Vec<String>),
}

/// Renders help for `target` against `registry`. Returns the rendered text;
/// the caller decides where to write it (spec: always stderr).
pub fn render(registry: &Registry, app: &AppIdentity, target: &HelpTarget) -> String {
    match target {
        HelpTarget::App => render_app(registry, app),
        HelpTarget::Root => render_group(registry, app, &[]),
        HelpTarget::Group(path) => render_group(registry, app, path),
        HelpTarget::Command(path) => render_command(registry, app, path),
    }
}

fn header(app: &AppIdentity) -> String {
    format!("{} {}\n{}\n", app.name, app.version, app.description)
}

fn render_app(registry: &Registry, app: &AppIdentity) -> String {
    render_group(registry, app, &[])
}

fn render_group(registry: &Registry, app: &AppIdentity, path: &[String]) -> String {
    let mut out = header(app);

    let node = registry.find(path).unwrap_or(&registry.root);
    if !path.is_empty() {
        out.push_str(&format!("\n{}\n", node.metadata.description));
    }

    out.push_str("\nCommands:\n");
    for (name, child) in &node.children {
        out.push_str(&format!("  {:<width$}  {}\n", name, child.metadata.description, width = OPTION_COLUMN));
    }

    if !path.is_empty() {
        out.push_str(&format!("\nRun `{} {} <command> --help` for more on a subcommand.\n", app.name, path.join(" ")));
    } else {
        out.push_str(&format!("\nRun `{} <command> --help` for more on a command.\n", app.name));
    }

    out
}

fn render_command(registry: &Registry, app: &AppIdentity, path: &[String]) -> String {
    let mut out = header(app);

    let Some(node) = registry.find(path) else {
        out.push_str("\nunknown command\n");
        return out;
    };

    out.push_str(&format!("\n{}\n", node.metadata.description));
    out.push_str(&format!("\nUsage: {} {}\n", app.name, usage_line(path, node)));

    if !node.args_schema.is_empty() {
        out.push_str("\nArguments:\n");
        for arg in &node.args_schema {
            let description = node
                .metadata
                .arg_descriptions
                .get(&arg.name)
                .cloned()
                .unwrap_or_default();
            out.push_str(&format!("  {:<width$}  {}\n", arg.name, description, width = OPTION_COLUMN));
        }
    }

    if !node.options_schema.is_empty() {
        out.push_str("\nOptions:\n");
        for opt in node.options_schema.values() {
            out.push_str(&option_line(opt));
        }
    }

    if !registry.global_options.is_empty() {
        out.push_str("\nGlobal options:\n");
        for opt in registry.global_options.values() {
            out.push_str(&option_line(opt));
        }
    }

    if !node.metadata.examples.is_empty() {
        out.push_str("\nExamples:\n");
        for example in &node.metadata.examples {
            out.push_str(&format!("  {example}\n"));
        }
    }

    if !node.children.is_empty() {
        out.push_str("\nSubcommands:\n");
        for (name, child) in &node.children {
            out.push_str(&format!("  {:<width$}  {}\n", name, child.metadata.description, width = OPTION_COLUMN));
        }
    }

    out.push_str(&format!("\nRun `{} {} --help` to see this again.\n", app.name, path.join(" ")));
    out
}

fn usage_line(path: &[String], node: &CommandNode) -> String {
    if let Some(usage) = &node.metadata.usage {
        return usage.clone();
    }

    let mut parts = vec![path.join(" ")];
    if !node.options_schema.is_empty() {
        parts.push("[OPTIONS]".to_string());
    }
    for arg in &node.args_schema {
        let rendered = if arg.variadic {
            format!("[{}…]", arg.name)
        } else if arg.required {
            format!("<{}>", arg.name)
        } else {
            format!("[{}]", arg.name)
        };
        parts.push(rendered);
    }
    parts.join(" ")
}

fn option_line(opt: &OptionDescriptor) -> String {
    let flags = match opt.short {
        Some(short) => format!("--{}, -{}", opt.long_name, short),
        None => format!("--{}", opt.long_name),
    };
    format!("  {:<width$}  {}\n", flags, opt.description, width = OPTION_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use drk_api::{ArgDescriptor, CommandMetadata, ValueType};
    use indexmap::IndexMap;

    fn app() -> AppIdentity {
        AppIdentity {
            name: "drk".to_string(),
            version: "1.0.0".to_string(),
            description: "a cli".to_string(),
        }
    }

    #[test]
    fn command_help_renders_required_and_variadic_usage() {
        let mut options = IndexMap::new();
        options.insert("verbose".to_string(), OptionDescriptor::boolean("verbose", Some('v')));
        let mut root = CommandNode::group(String::new(), CommandMetadata::default());
        root.insert_child(CommandNode::leaf(
            "run",
            CommandMetadata {
                description: "run a container".to_string(),
                ..Default::default()
            },
            vec![
                ArgDescriptor::required("image", ValueType::String),
                ArgDescriptor::variadic("command"),
            ],
            options,
            "run",
        ))
        .unwrap();
        let registry = compose(root, Vec::new()).unwrap();

        let rendered = render(&registry, &app(), &HelpTarget::Command(vec!["run".to_string()]));
        assert!(rendered.contains("<image>"));
        assert!(rendered.contains("[command…]"));
        assert!(rendered.contains("--verbose, -v"));
    }

    #[test]
    fn group_help_lists_children() {
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
        let registry = compose(root, Vec::new()).unwrap();

        let rendered = render(&registry, &app(), &HelpTarget::Root);
        assert!(rendered.contains("build"));
        assert!(rendered.contains("build an image"));
    }
}
