//! A `nix` command that initializes a flake dev-environment template from
//! `the-nix-way/dev-templates` on GitHub.

use std::io::Write as _;

use drk_api::{
    icon_error, icon_info, icon_warning, style_error, style_primary, style_warning, ArgDescriptor,
    Args, CommandFile, CommandMetadata, CommandNode, Context, DrkError, Options, Plugin,
    PluginManifest, ValueType,
};
use serde::Deserialize;

pub struct NixPlugin;

#[derive(Debug, Deserialize, PartialEq)]
struct Template {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GithubItem {
    name: String,
    #[serde(rename = "type")]
    item_type: String,
}

impl Plugin for NixPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("nix")
    }

    fn provided_commands(&self) -> Vec<CommandFile> {
        vec![CommandFile {
            path: vec!["nix".to_string()],
            node: CommandNode::leaf(
                "nix",
                CommandMetadata {
                    description: "Initialize a nix flake dev-environment template".to_string(),
                    ..Default::default()
                },
                vec![ArgDescriptor::required("template", ValueType::String).with_description(
                    "Name of the template from the-nix-way/dev-templates",
                )],
                Default::default(),
                "nix::init",
            ),
        }]
    }
}

pub fn init(args: &Args, _options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
    let requested = Template {
        name: args.str("template").unwrap_or("empty").to_string(),
    };

    let templates = fetch_gh_templates().map_err(DrkError::HandlerError)?;

    if !templates.contains(&requested) {
        let _ = writeln!(ctx.stderr(), "{} {}", style_warning(icon_warning()), style_warning("Template not found!"));
        let _ = writeln!(
            ctx.stderr(),
            "{} {}",
            style_primary(icon_info()),
            style_primary("Check available templates at https://github.com/the-nix-way/dev-templates")
        );
        return Ok(());
    }

    writeln!(
        ctx.stdout(),
        "{} Initializing nix flake dev environment template: {}",
        style_warning(icon_info()),
        style_primary(&requested.name)
    )
    .map_err(|e| DrkError::HandlerError(e.into()))
}

/// Registers this plugin's handlers into a [`drk_core::HandlerRegistry`].
pub fn register(handlers: drk_core::HandlerRegistry) -> drk_core::HandlerRegistry {
    handlers.register("nix::init", init)
}

fn fetch_gh_templates() -> anyhow::Result<Vec<Template>> {
    let url = "https://api.github.com/repos/the-nix-way/dev-templates/contents";

    let client = reqwest::blocking::Client::new();
    let response = client.get(url).header("User-Agent", "drk-nix-plugin").send()?;

    if !response.status().is_success() {
        anyhow::bail!(
            "{} {}{}",
            style_error(icon_error()),
            style_warning("Failed to fetch templates from Github.\n"),
            style_error(response.status().as_str())
        );
    }

    let items: Vec<GithubItem> = response.json()?;
    Ok(items
        .into_iter()
        .filter(|item| item.item_type == "dir" && !item.name.starts_with('.'))
        .map(|item| Template { name: item.name })
        .collect())
}
