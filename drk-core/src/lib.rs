//! Build-time loader/composer and the run-time dispatch engine that
//! together turn a command-file tree plus a set of plugins into a running
//! CLI (spec §4). Application crates depend on this and `drk-api`.

pub mod binder;
pub mod completion;
pub mod composer;
pub mod dispatcher;
pub mod help;
pub mod loader;
pub mod registry;
pub mod suggest;
pub mod token_parser;

pub use binder::bind;
pub use completion::{generate as generate_completion, generate_from_summaries, Shell};
pub use composer::compose;
pub use dispatcher::dispatch;
pub use help::{render as render_help, HelpTarget};
pub use loader::{load_tree, HandlerRegistry};
pub use registry::{HookLists, Registry};
pub use suggest::{suggest, suggest_with};
pub use token_parser::{parse as parse_tokens, ParseResult, RawValue};

pub use drk_api::*;
