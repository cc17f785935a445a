//! Command and capability tables.
//!
//! Both tables are built explicitly when the process starts, through
//! [`CommandTables::builtin`], and are owned by whoever drives dispatch.
//! Commands take their arguments as a JSON array whose first element is the
//! command name, e.g. `["version", {"required": ["term-name"]}]`.

mod capability;
mod registry;

use std::path::PathBuf;

use serde_json::{json, Map, Value};

use crate::cancel::CancellationToken;
use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use crate::ignore::IgnoreSet;
use crate::query::TermRegistry;
use crate::search::{run_query, Query};

pub use capability::CapabilityTable;
pub use registry::{CliValidateFn, CommandDef, CommandFlags, CommandFn, CommandRegistry};

/// Version string reported by the `version` command.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a running command can see.
#[derive(Debug, Clone)]
pub struct CommandContext<'a> {
    pub terms: &'a TermRegistry,
    pub capabilities: &'a CapabilityTable,
    pub cancel: CancellationToken,
}

/// The term, command and capability tables, built together.
#[derive(Debug, Clone)]
pub struct CommandTables {
    pub terms: TermRegistry,
    pub commands: CommandRegistry,
    pub capabilities: CapabilityTable,
}

impl CommandTables {
    pub fn builtin() -> Self {
        let terms = TermRegistry::builtin();
        let commands = CommandRegistry::builtin();
        let capabilities = CapabilityTable::builtin(&terms, &commands);
        Self {
            terms,
            commands,
            capabilities,
        }
    }

    pub fn context(&self, cancel: CancellationToken) -> CommandContext<'_> {
        CommandContext {
            terms: &self.terms,
            capabilities: &self.capabilities,
            cancel,
        }
    }

    /// Runs `args` as a daemon-side command with a token that never cancels.
    pub fn dispatch(&self, args: &Value) -> Result<Value> {
        self.commands.dispatch(
            &self.context(CancellationToken::noop()),
            args,
            CommandFlags::DAEMON,
        )
    }
}

fn arguments(args: &Value) -> &[Value] {
    match args {
        Value::Array(items) => items.get(1..).unwrap_or_default(),
        _ => &[],
    }
}

fn string_list<'a>(options: &'a Map<String, Value>, key: &str) -> Result<Vec<&'a str>> {
    match options.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    WatchError::CommandValidation(format!("{key} must be an array of strings"))
                })
            })
            .collect(),
        Some(_) => Err(WatchError::CommandValidation(format!(
            "{key} must be an array of strings"
        ))),
    }
}

/// `["version"]` or `["version", {"required": [...], "optional": [...]}]`.
pub(crate) fn cmd_version(context: &CommandContext<'_>, args: &Value) -> Result<Value> {
    let mut response = json!({ "version": VERSION });
    if let Some(Value::Object(options)) = arguments(args).first() {
        let required = string_list(options, "required")?;
        let optional = string_list(options, "optional")?;
        if options.contains_key("required") || options.contains_key("optional") {
            let answer = context.capabilities.check(required, optional)?;
            response["capabilities"] = json!(answer);
        }
    }
    Ok(response)
}

pub(crate) fn validate_version(args: &mut Value) -> Result<()> {
    let params = arguments(args);
    match params {
        [] => Ok(()),
        [Value::Object(options)] => {
            string_list(options, "required")?;
            string_list(options, "optional")?;
            Ok(())
        }
        [_] => Err(WatchError::CommandValidation(
            "version arguments must be an object".to_string(),
        )),
        _ => Err(WatchError::CommandValidation(
            "version takes at most one argument".to_string(),
        )),
    }
}

pub(crate) fn cmd_list_capabilities(context: &CommandContext<'_>, _args: &Value) -> Result<Value> {
    Ok(json!({
        "version": VERSION,
        "capabilities": context.capabilities.list(),
    }))
}

/// `["query", "/abs/root", {"expression": ..., "case_sensitive": ...}]`.
pub(crate) fn cmd_query(context: &CommandContext<'_>, args: &Value) -> Result<Value> {
    let (root, query_object) = match arguments(args) {
        [Value::String(root), query_object] => (PathBuf::from(root), query_object),
        _ => {
            return Err(WatchError::CommandValidation(
                "expected [\"query\", root, query]".to_string(),
            ))
        }
    };
    let config = WatchConfig::load(&root)?;
    let ignore = IgnoreSet::from_config(&config);
    let query = Query::parse(query_object, context.terms)?;
    let result = run_query(&root, &ignore, &query, &context.cancel)?;
    Ok(json!({
        "version": VERSION,
        "files": result.files,
        "scanned": result.scanned,
        "ignored": result.ignored,
        "errors": result.errors,
    }))
}

/// Checks the query shape and replaces the root with its canonical path.
pub(crate) fn validate_query(args: &mut Value) -> Result<()> {
    let items = command_items(args, 3, "query")?;
    if !items[2].is_object() {
        return Err(WatchError::CommandValidation(
            "query must be an object".to_string(),
        ));
    }
    resolve_root(&mut items[1])
}

/// `["get-config", "/abs/root"]`: the root's configuration object as
/// written, or `{}` when it has none.
pub(crate) fn cmd_get_config(_context: &CommandContext<'_>, args: &Value) -> Result<Value> {
    let root = match arguments(args) {
        [Value::String(root)] => PathBuf::from(root),
        _ => {
            return Err(WatchError::CommandValidation(
                "expected [\"get-config\", root]".to_string(),
            ))
        }
    };
    let config = WatchConfig::load(&root)?;
    Ok(json!({
        "version": VERSION,
        "config": Value::Object(config.raw),
    }))
}

pub(crate) fn validate_get_config(args: &mut Value) -> Result<()> {
    let items = command_items(args, 2, "get-config")?;
    resolve_root(&mut items[1])
}

fn command_items<'a>(args: &'a mut Value, len: usize, name: &str) -> Result<&'a mut Vec<Value>> {
    let Value::Array(items) = args else {
        return Err(WatchError::CommandValidation("expected a command array".to_string()));
    };
    if items.len() != len {
        return Err(WatchError::CommandValidation(format!(
            "wrong number of arguments to '{name}'"
        )));
    }
    Ok(items)
}

/// Replaces a root argument with its canonical path.
fn resolve_root(root: &mut Value) -> Result<()> {
    let Some(path) = root.as_str() else {
        return Err(WatchError::CommandValidation(
            "root must be a string".to_string(),
        ));
    };
    let resolved = std::fs::canonicalize(path).map_err(|err| {
        WatchError::CommandValidation(format!("unable to resolve root {path}: {err}"))
    })?;
    *root = Value::String(resolved.to_string_lossy().into_owned());
    Ok(())
}
