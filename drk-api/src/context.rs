//! Per-invocation environment (spec §3, §4.K).
//!
//! A `Context` is created at dispatch entry and destroyed at dispatch exit;
//! it owns every allocation made while parsing, binding, and running hooks
//! for that one invocation. Nothing about it is shared across dispatches.

use std::any::Any;
use std::collections::HashMap;
use std::io::{self, Read, Write};

use crate::schema::CommandSummary;

/// Identity of the hosting application, reported in help output and made
/// available to handlers.
#[derive(Debug, Clone)]
pub struct AppIdentity {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Reflective info about the command currently being dispatched, handed to
/// handlers and the help engine without requiring them to walk the
/// registry themselves.
#[derive(Debug, Clone, Default)]
pub struct CommandReflection {
    pub path: Vec<String>,
    pub description: String,
    pub arg_names: Vec<String>,
    pub option_names: Vec<String>,
}

/// Per-dispatch state container (spec §4.K). Owns the allocator-equivalent
/// (plain heap allocations — no arena crate appears anywhere in the
/// corpus this framework is grounded on), the I/O streams, and the two
/// key-value stores used for plugin extensions and cross-hook
/// communication.
pub struct Context {
    pub app: AppIdentity,
    pub command_path: Vec<String>,
    pub available_commands: Vec<CommandSummary>,
    pub current_command: Option<CommandReflection>,

    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
    stdin: Box<dyn Read + Send>,

    extensions: HashMap<String, Box<dyn Any + Send + Sync>>,
    data: HashMap<String, String>,
}

impl Context {
    pub fn new(app: AppIdentity, available_commands: Vec<CommandSummary>) -> Self {
        Self {
            app,
            command_path: Vec::new(),
            available_commands,
            current_command: None,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
            stdin: Box::new(io::stdin()),
            extensions: HashMap::new(),
            data: HashMap::new(),
        }
    }

    /// Swaps in in-memory streams; used by tests and by embedders that
    /// want to capture output instead of writing to the real terminal.
    pub fn with_streams(
        mut self,
        stdout: Box<dyn Write + Send>,
        stderr: Box<dyn Write + Send>,
        stdin: Box<dyn Read + Send>,
    ) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self.stdin = stdin;
        self
    }

    pub fn stdout(&mut self) -> &mut (dyn Write + Send) {
        &mut *self.stdout
    }

    pub fn stderr(&mut self) -> &mut (dyn Write + Send) {
        &mut *self.stderr
    }

    pub fn stdin(&mut self) -> &mut (dyn Read + Send) {
        &mut *self.stdin
    }

    /// Registers a plugin's typed context extension under its plugin name.
    /// Destroyed along with the rest of the Context.
    pub fn set_extension<T: Any + Send + Sync>(&mut self, owner: impl Into<String>, value: T) {
        self.extensions.insert(owner.into(), Box::new(value));
    }

    /// Installs an already-boxed extension verbatim, without re-boxing it.
    /// Used by the dispatcher when installing `Plugin::context_extension()`
    /// values, whose concrete type has already been erased by the plugin.
    pub fn set_extension_boxed(&mut self, owner: impl Into<String>, value: Box<dyn Any + Send + Sync>) {
        self.extensions.insert(owner.into(), value);
    }

    pub fn extension<T: Any + Send + Sync>(&self, owner: &str) -> Option<&T> {
        self.extensions.get(owner).and_then(|b| b.downcast_ref())
    }

    pub fn extension_mut<T: Any + Send + Sync>(&mut self, owner: &str) -> Option<&mut T> {
        self.extensions.get_mut(owner).and_then(|b| b.downcast_mut())
    }

    /// String key-value store for cross-hook communication (spec §3).
    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}
