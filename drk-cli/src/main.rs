//! Host binary: wires `drk-core`'s engine, the bundled plugins, and the
//! application's own `commands/` tree into a runnable `drk` CLI.

mod commands;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use drk_api::{AppIdentity, Plugin};
use drk_core::{compose, dispatch, load_tree, HandlerRegistry};

/// Carried over unchanged from the teacher's own `config.toml` handling: a
/// flat table of plugin-owned settings, loaded once at startup and
/// rewritten once at shutdown. Nothing in the engine itself reads or
/// writes it; it's a place for plugins to persist state across runs.
type ConfigMap = BTreeMap<String, toml::Value>;

fn load_config() -> Result<(ConfigMap, PathBuf)> {
    let dirs = directories::ProjectDirs::from("com", "author", "drk")
        .context("could not determine config directory")?;
    let config_path = dirs.config_dir().join("config.toml");

    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, "")?;
        return Ok((ConfigMap::new(), config_path));
    }

    let contents = fs::read_to_string(&config_path)?;
    let map: ConfigMap = toml::from_str(&contents).unwrap_or_default();
    Ok((map, config_path))
}

fn save_config(path: &Path, map: &ConfigMap) -> Result<()> {
    let rendered = toml::to_string(map)?;
    fs::write(path, rendered)?;
    Ok(())
}

/// Build-time diagnostics only (loader/composer); dispatch-phase output
/// always goes through `drk-api::styling`, never `tracing`.
fn install_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn plugins() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(drk_basic::BasicPlugin),
        Arc::new(drk_logger::LoggerPlugin),
        Arc::new(drk_nix::NixPlugin),
        Arc::new(drk_completions::CompletionsPlugin),
    ]
}

fn handler_registry() -> HandlerRegistry {
    let handlers = HandlerRegistry::new()
        .register("app::hello", commands::hello)
        .register("app::users_list", commands::users_list);
    let handlers = drk_basic::register(handlers);
    let handlers = drk_nix::register(handlers);
    drk_completions::register(handlers)
}

fn main() -> Result<()> {
    install_tracing();

    let (config, config_path) = load_config()?;

    let handlers = handler_registry();
    let commands_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("commands");
    let root = load_tree(&commands_dir, &handlers).context("loading the application's command tree")?;
    let registry = compose(root, plugins()).context("composing plugins into the registry")?;

    let app = AppIdentity {
        name: "drk".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "A plugin-composed CLI toolkit".to_string(),
    };

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let code = dispatch(&registry, &handlers, app, &argv);

    save_config(&config_path, &config)?;
    std::process::exit(code);
}
