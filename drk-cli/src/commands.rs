//! Handlers for the host application's own command tree (`../commands/`),
//! exercising the loader/binder/dispatcher path end to end alongside the
//! bundled plugins.

use std::io::Write as _;

use drk_api::{style_primary, style_success, Args, Context, DrkError, Options};
use serde::Serialize;

pub fn hello(args: &Args, options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
    let name = args.str("name").unwrap_or("there");
    let rendered = if options.boolean("loud") {
        format!("HELLO, {name}!")
    } else {
        format!("Hello, {name}!")
    };
    writeln!(ctx.stdout(), "{}", style_success(&rendered)).map_err(|e| DrkError::HandlerError(e.into()))
}

#[derive(Serialize)]
struct User {
    id: u32,
    name: String,
}

fn seed_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            name: "ada".to_string(),
        },
        User {
            id: 2,
            name: "grace".to_string(),
        },
        User {
            id: 3,
            name: "margaret".to_string(),
        },
    ]
}

pub fn users_list(_args: &Args, options: &Options, ctx: &mut Context) -> Result<(), DrkError> {
    let users = seed_users();
    let limit = options.int("limit").map(|n| n.max(0) as usize).unwrap_or(users.len());
    let page: Vec<&User> = users.iter().take(limit).collect();

    match options.str("format").unwrap_or("text") {
        "json" => {
            let rendered = serde_json::to_string(&page).map_err(|e| DrkError::HandlerError(e.into()))?;
            writeln!(ctx.stdout(), "{rendered}").map_err(|e| DrkError::HandlerError(e.into()))
        }
        _ => {
            for user in page {
                writeln!(ctx.stdout(), "{} {}", user.id, style_primary(&user.name))
                    .map_err(|e| DrkError::HandlerError(e.into()))?;
            }
            Ok(())
        }
    }
}
