//! Fish completion backend. Fish has no nested-case concept; instead every
//! candidate gets its own `complete -c` line gated by
//! `__fish_seen_subcommand_from` conditions for its exact path prefix.

use super::CompletionNode;

pub fn render(app_name: &str, root: &CompletionNode) -> String {
    let mut out = String::new();
    out.push_str(&format!("# fish completion for {app_name}\n"));
    emit_node(&mut out, app_name, root);
    out
}

fn emit_node(out: &mut String, app_name: &str, node: &CompletionNode) {
    let condition = seen_condition(&node.path);

    for (name, description) in &node.subcommands {
        out.push_str(&format!(
            "complete -c {app_name} -f{} -a '{}' -d '{}'\n",
            condition.as_deref().map(|c| format!(" -n '{c}'")).unwrap_or_default(),
            escape(name),
            escape(description)
        ));
    }

    if node.subcommands.is_empty() {
        for (flag, description) in &node.options {
            let mut parts = flag.split_whitespace();
            let long = parts.next().unwrap_or(flag).trim_start_matches('-');
            let short = parts.next().map(|s| s.trim_start_matches('-'));
            let mut line = format!("complete -c {app_name} -l {}", escape(long));
            if let Some(short) = short {
                line.push_str(&format!(" -s {}", escape(short)));
            }
            if let Some(c) = &condition {
                line.push_str(&format!(" -n '{c}'"));
            }
            line.push_str(&format!(" -d '{}'\n", escape(description)));
            out.push_str(&line);
        }

        // No `-f` here: a leaf falls through to fish's default file
        // completion once its own flags are exhausted.
        let mut fallback = format!("complete -c {app_name}");
        if let Some(c) = &condition {
            fallback.push_str(&format!(" -n '{c}'"));
        }
        fallback.push('\n');
        out.push_str(&fallback);
    }

    for child in &node.children {
        emit_node(out, app_name, child);
    }
}

fn seen_condition(path: &[String]) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    Some(format!("__fish_seen_subcommand_from {}", path.join(" ")))
}

/// Fish single-quoted strings only need the single quote and backslash
/// escaped.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}
