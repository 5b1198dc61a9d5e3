//! Bash completion backend. Candidates are emitted as a single `case`
//! statement keyed on the joined subcommand path seen so far.

use super::CompletionNode;

pub fn render(app_name: &str, root: &CompletionNode) -> String {
    let mut out = String::new();
    out.push_str(&format!("# bash completion for {app_name}\n"));
    out.push_str(&format!("_{app_name}_complete() {{\n"));
    out.push_str("  local cur prev path\n");
    out.push_str("  cur=\"${COMP_WORDS[COMP_CWORD]}\"\n");
    out.push_str("  path=\"${COMP_WORDS[*]:1:COMP_CWORD-1}\"\n\n");
    out.push_str("  case \"$path\" in\n");
    emit_case_arms(&mut out, root);
    out.push_str("  *)\n");
    out.push_str("    COMPREPLY=( $(compgen -f -- \"$cur\") )\n");
    out.push_str("    ;;\n");
    out.push_str("  esac\n");
    out.push_str("}\n");
    out.push_str(&format!("complete -F _{app_name}_complete {app_name}\n"));
    out
}

fn emit_case_arms(out: &mut String, node: &CompletionNode) {
    let key = escape(&node.path.join(" "));
    let mut candidates: Vec<String> = node.subcommands.iter().map(|(name, _)| name.clone()).collect();
    if node.subcommands.is_empty() {
        candidates.extend(node.options.iter().map(|(flag, _)| flag.split_whitespace().next().unwrap_or(flag).to_string()));
    }

    out.push_str(&format!("  \"{key}\")\n"));
    out.push_str(&format!(
        "    COMPREPLY=( $(compgen -W \"{}\" -- \"$cur\") )\n",
        candidates.join(" ")
    ));
    out.push_str("    ;;\n");

    for child in &node.children {
        emit_case_arms(out, child);
    }
}

fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}
