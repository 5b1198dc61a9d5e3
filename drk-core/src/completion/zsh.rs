//! Zsh completion backend.
//!
//! Unlike bash's single flat `case` over the whole path-so-far, zsh's own
//! idiom nests one dispatcher function per depth: each group gets its own
//! function that runs `_arguments -C` (which re-localizes `$line` to just
//! the words from that point on), lists its subcommands while `$state` is
//! `cmds`, then once a subcommand is chosen switches on `$line[1]` to hand
//! off to that child's function. A leaf's function completes its own
//! options plus a `_files` catch-all (spec §4.J: "a catch-all falls
//! through to file completion at each leaf").

use super::CompletionNode;

pub fn render(app_name: &str, root: &CompletionNode) -> String {
    let mut out = String::new();
    out.push_str(&format!("#compdef {app_name}\n\n"));
    emit_function(&mut out, app_name, root);
    out.push_str(&format!("_{app_name} \"$@\"\n"));
    out
}

fn function_name(app_name: &str, path: &[String]) -> String {
    let mut name = format!("_{app_name}");
    for segment in path {
        name.push('_');
        name.push_str(&sanitize(segment));
    }
    name
}

fn sanitize(segment: &str) -> String {
    segment.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

fn emit_function(out: &mut String, app_name: &str, node: &CompletionNode) {
    if node.subcommands.is_empty() {
        emit_leaf(out, app_name, node);
    } else {
        emit_group(out, app_name, node);
    }

    for child in &node.children {
        emit_function(out, app_name, child);
    }
}

fn emit_group(out: &mut String, app_name: &str, node: &CompletionNode) {
    let name = function_name(app_name, &node.path);

    out.push_str(&format!("{name}() {{\n"));
    out.push_str("  local context state state_descr line\n");
    out.push_str("  typeset -A opt_args\n\n");
    out.push_str("  _arguments -C \\\n");
    for (flag, description) in &node.options {
        for spec in option_arg_lines(flag, description) {
            out.push_str(&format!("    {spec} \\\n"));
        }
    }
    out.push_str("    \"1: :->cmds\" \\\n");
    out.push_str("    \"*::arg:->args\"\n\n");

    out.push_str("  case \"$state\" in\n");
    out.push_str("    cmds)\n");
    out.push_str("      local -a candidates\n");
    out.push_str("      candidates=(\n");
    for (subname, description) in &node.subcommands {
        out.push_str(&format!("        '{}:{}'\n", escape(subname), escape(description)));
    }
    out.push_str("      )\n");
    out.push_str("      _describe 'command' candidates\n");
    out.push_str("      ;;\n");
    out.push_str("    args)\n");
    out.push_str("      case $line[1] in\n");
    for (subname, _) in &node.subcommands {
        let mut child_path = node.path.clone();
        child_path.push(subname.clone());
        let child_fn = function_name(app_name, &child_path);
        out.push_str(&format!("        {subname})\n"));
        out.push_str(&format!("          {child_fn}\n"));
        out.push_str("          ;;\n");
    }
    out.push_str("      esac\n");
    out.push_str("      ;;\n");
    out.push_str("  esac\n");
    out.push_str("}\n\n");
}

fn emit_leaf(out: &mut String, app_name: &str, node: &CompletionNode) {
    let name = function_name(app_name, &node.path);

    out.push_str(&format!("{name}() {{\n"));
    out.push_str("  _arguments \\\n");
    for (flag, description) in &node.options {
        for spec in option_arg_lines(flag, description) {
            out.push_str(&format!("    {spec} \\\n"));
        }
    }
    out.push_str("    '*:file:_files'\n");
    out.push_str("}\n\n");
}

/// One `_arguments` spec per flag variant (`--long`, and `-s` if the
/// option has a short form too), each carrying the quoted description.
fn option_arg_lines(flag: &str, description: &str) -> Vec<String> {
    let desc = escape(description);
    flag.split_whitespace().map(|variant| format!("'{variant}[{desc}]'")).collect()
}

/// Zsh requires escaping `()[]\\` and a single quote via the `'\''` dance.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '[' | ']' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\'' => escaped.push_str("'\\''"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
