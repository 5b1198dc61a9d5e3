//! Shell-completion generation and installation (spec §4.J, §6 "persisted
//! state layout"). Adds a `completions generate|install|uninstall <shell>`
//! command group to any host that bundles this plugin.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use drk_api::{
    Args, CommandFile, CommandMetadata, CommandNode, Context, DrkError, Options, Plugin,
    PluginManifest, ValueType,
};
use drk_core::Shell;

pub struct CompletionsPlugin;

impl Plugin for CompletionsPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("completions")
    }

    fn provided_commands(&self) -> Vec<CommandFile> {
        let shell_arg = drk_api::ArgDescriptor::required(
            "shell",
            ValueType::Enumeration(vec!["bash".to_string(), "zsh".to_string(), "fish".to_string()]),
        )
        .with_description("Target shell");

        vec![
            CommandFile {
                path: vec!["completions".to_string(), "generate".to_string()],
                node: CommandNode::leaf(
                    "generate",
                    CommandMetadata {
                        description: "Print a completion script for the given shell".to_string(),
                        ..Default::default()
                    },
                    vec![shell_arg.clone()],
                    Default::default(),
                    "completions::generate",
                ),
            },
            CommandFile {
                path: vec!["completions".to_string(), "install".to_string()],
                node: CommandNode::leaf(
                    "install",
                    CommandMetadata {
                        description: "Install a completion script to its well-known path".to_string(),
                        ..Default::default()
                    },
                    vec![shell_arg.clone()],
                    Default::default(),
                    "completions::install",
                ),
            },
            CommandFile {
                path: vec!["completions".to_string(), "uninstall".to_string()],
                node: CommandNode::leaf(
                    "uninstall",
                    CommandMetadata {
                        description: "Remove a previously installed completion script".to_string(),
                        ..Default::default()
                    },
                    vec![shell_arg],
                    Default::default(),
                    "completions::uninstall",
                ),
            },
        ]
    }
}

fn parse_shell(args: &Args) -> Result<Shell, DrkError> {
    let name = args.str("shell").unwrap_or_default();
    Shell::parse(name).ok_or_else(|| DrkError::InvalidOptionValue {
        option: "shell".to_string(),
        value: name.to_string(),
    })
}

/// Well-known per-shell install path, relative to `$HOME` (spec §6).
fn install_path(home: &Path, app_name: &str, shell: Shell) -> PathBuf {
    match shell {
        Shell::Bash => home
            .join(".local/share/bash-completion/completions")
            .join(app_name),
        Shell::Zsh => home.join(".zsh/completions").join(format!("_{app_name}")),
        Shell::Fish => home
            .join(".config/fish/completions")
            .join(format!("{app_name}.fish")),
    }
}

/// The rc file this shell sources on startup, or `None` for shells (fish)
/// whose completion directory is auto-loaded and needs no rc edit.
fn rc_file(home: &Path, shell: Shell) -> Option<PathBuf> {
    match shell {
        Shell::Bash => Some(home.join(".bashrc")),
        Shell::Zsh => Some(home.join(".zshrc")),
        Shell::Fish => None,
    }
}

fn rc_markers(app_name: &str) -> (String, String) {
    (
        format!("# >>> {app_name} completion setup >>>"),
        format!("# <<< {app_name} completion setup <<<"),
    )
}

fn rc_block(app_name: &str, installed_path: &Path, shell: Shell) -> String {
    let (start, end) = rc_markers(app_name);
    let source_line = match shell {
        Shell::Bash => format!("source \"{}\"", installed_path.display()),
        Shell::Zsh => format!("fpath+=(\"{}\")\nautoload -Uz compinit && compinit", installed_path.parent().unwrap_or(installed_path).display()),
        Shell::Fish => unreachable!("fish has no rc block"),
    };
    format!("{start}\n{source_line}\n{end}\n")
}

fn append_rc_block(rc_path: &Path, block: &str) -> std::io::Result<()> {
    let mut existing = fs::read_to_string(rc_path).unwrap_or_default();
    if !existing.ends_with('\n') && !existing.is_empty() {
        existing.push('\n');
    }
    existing.push_str(block);
    fs::write(rc_path, existing)
}

fn remove_rc_block(rc_path: &Path, app_name: &str) -> std::io::Result<()> {
    let Ok(existing) = fs::read_to_string(rc_path) else {
        return Ok(());
    };
    let (start, end) = rc_markers(app_name);
    let Some(start_idx) = existing.find(&start) else {
        return Ok(());
    };
    let Some(end_idx) = existing[start_idx..].find(&end).map(|i| start_idx + i + end.len()) else {
        return Ok(());
    };
    let mut updated = existing[..start_idx].to_string();
    updated.push_str(existing[end_idx..].trim_start_matches('\n'));
    fs::write(rc_path, updated)
}

pub fn generate(args: &Args, _options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
    let shell = parse_shell(args)?;
    let script = drk_core::generate_from_summaries(&ctx.app.name, &ctx.available_commands, shell);
    writeln!(ctx.stdout(), "{script}").map_err(|e| DrkError::HandlerError(e.into()))
}

pub fn install(args: &Args, _options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
    let shell = parse_shell(args)?;
    let home = BaseDirs::new()
        .ok_or_else(|| DrkError::HandlerError(anyhow::anyhow!("could not resolve home directory")))?
        .home_dir()
        .to_path_buf();

    let script = drk_core::generate_from_summaries(&ctx.app.name, &ctx.available_commands, shell);
    let target = install_path(&home, &ctx.app.name, shell);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| DrkError::HandlerError(e.into()))?;
    }
    fs::write(&target, script).map_err(|e| DrkError::HandlerError(e.into()))?;

    if let Some(rc_path) = rc_file(&home, shell) {
        let block = rc_block(&ctx.app.name, &target, shell);
        append_rc_block(&rc_path, &block).map_err(|e| DrkError::HandlerError(e.into()))?;
    }

    writeln!(ctx.stdout(), "installed completions to {}", target.display())
        .map_err(|e| DrkError::HandlerError(e.into()))
}

pub fn uninstall(args: &Args, _options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
    let shell = parse_shell(args)?;
    let home = BaseDirs::new()
        .ok_or_else(|| DrkError::HandlerError(anyhow::anyhow!("could not resolve home directory")))?
        .home_dir()
        .to_path_buf();

    let target = install_path(&home, &ctx.app.name, shell);
    if target.exists() {
        fs::remove_file(&target).map_err(|e| DrkError::HandlerError(e.into()))?;
    }

    if let Some(rc_path) = rc_file(&home, shell) {
        remove_rc_block(&rc_path, &ctx.app.name).map_err(|e| DrkError::HandlerError(e.into()))?;
    }

    writeln!(ctx.stdout(), "uninstalled completions from {}", target.display())
        .map_err(|e| DrkError::HandlerError(e.into()))
}

/// Registers this plugin's handlers into a [`drk_core::HandlerRegistry`].
pub fn register(handlers: drk_core::HandlerRegistry) -> drk_core::HandlerRegistry {
    handlers
        .register("completions::generate", generate)
        .register("completions::install", install)
        .register("completions::uninstall", uninstall)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_paths_match_the_documented_layout() {
        let home = Path::new("/home/user");
        assert_eq!(
            install_path(home, "drk", Shell::Bash),
            home.join(".local/share/bash-completion/completions/drk")
        );
        assert_eq!(install_path(home, "drk", Shell::Zsh), home.join(".zsh/completions/_drk"));
        assert_eq!(
            install_path(home, "drk", Shell::Fish),
            home.join(".config/fish/completions/drk.fish")
        );
    }

    #[test]
    fn rc_block_round_trips_through_append_and_remove() {
        let dir = std::env::temp_dir().join(format!(
            "drk-completions-test-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        let rc_path = dir.join(".bashrc");
        fs::write(&rc_path, "# existing content\n").unwrap();

        let block = rc_block("drk", Path::new("/home/user/.local/share/bash-completion/completions/drk"), Shell::Bash);
        append_rc_block(&rc_path, &block).unwrap();
        let after_install = fs::read_to_string(&rc_path).unwrap();
        assert!(after_install.contains("# >>> drk completion setup >>>"));

        remove_rc_block(&rc_path, "drk").unwrap();
        let after_uninstall = fs::read_to_string(&rc_path).unwrap();
        assert_eq!(after_uninstall, "# existing content\n");

        fs::remove_dir_all(&dir).unwrap();
    }
}
