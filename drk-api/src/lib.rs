//! Schema model, plugin contract, and per-dispatch `Context` for the drk
//! CLI framework. `drk-core` builds and drives a `Registry` out of these
//! types; application and plugin crates depend only on this crate.

pub mod context;
pub mod error;
pub mod plugin;
pub mod schema;
pub mod styling;
pub mod values;

pub use context::{AppIdentity, CommandReflection, Context};
pub use error::{DrkError, ErrorKind, Result, SchemaLocator};
pub use plugin::{CommandFile, HandlerFn, HookOutcome, ParsedInvocation, Plugin};
pub use schema::{
    ArgDescriptor, CommandMetadata, CommandNode, CommandSummary, HookKind, IntWidth,
    OptionDescriptor, PluginManifest, Value, ValueType,
};
pub use styling::{
    icon_error, icon_info, icon_success, icon_warning, style_dim, style_error, style_primary,
    style_success, style_warning,
};
pub use values::{Args, Options};
