use bitflags::bitflags;
use serde_json::Value;

use crate::error::{Result, WatchError};

use super::CommandContext;

bitflags! {
    /// Where a command may run and who may run it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandFlags: u32 {
        const DAEMON         = 1;
        const CLIENT         = 2;
        const POISON_IMMUNE  = 4;
        const ALLOW_ANY_USER = 8;
    }
}

/// Runs a command. `args` is the whole command array, name included.
pub type CommandFn = fn(&CommandContext<'_>, &Value) -> Result<Value>;

/// Checks, and may rewrite, a command's arguments before the client sends it.
pub type CliValidateFn = fn(&mut Value) -> Result<()>;

#[derive(Clone)]
pub struct CommandDef {
    pub name: &'static str,
    pub func: CommandFn,
    pub flags: CommandFlags,
    pub cli_validate: Option<CliValidateFn>,
}

impl std::fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("cli_validate", &self.cli_validate.is_some())
            .finish_non_exhaustive()
    }
}

/// Append-only table of command definitions, built once at startup.
///
/// A name may be registered more than once with different flags; lookups
/// return the earliest definition whose flags fit the caller's mode.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    defs: Vec<CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in command.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(CommandDef {
            name: "version",
            func: super::cmd_version,
            flags: CommandFlags::DAEMON
                | CommandFlags::CLIENT
                | CommandFlags::POISON_IMMUNE
                | CommandFlags::ALLOW_ANY_USER,
            cli_validate: Some(super::validate_version),
        });
        registry.register(CommandDef {
            name: "list-capabilities",
            func: super::cmd_list_capabilities,
            flags: CommandFlags::DAEMON
                | CommandFlags::CLIENT
                | CommandFlags::POISON_IMMUNE
                | CommandFlags::ALLOW_ANY_USER,
            cli_validate: None,
        });
        registry.register(CommandDef {
            name: "query",
            func: super::cmd_query,
            flags: CommandFlags::DAEMON,
            cli_validate: Some(super::validate_query),
        });
        registry.register(CommandDef {
            name: "get-config",
            func: super::cmd_get_config,
            flags: CommandFlags::DAEMON,
            cli_validate: Some(super::validate_get_config),
        });
        registry
    }

    pub fn register(&mut self, def: CommandDef) {
        log::trace!("registering command '{}' ({:?})", def.name, def.flags);
        self.defs.push(def);
    }

    pub fn lookup(&self, name: &str, mode: CommandFlags) -> Option<&CommandDef> {
        self.defs
            .iter()
            .find(|def| def.name == name && def.flags.intersects(mode))
    }

    /// Every definition, in registration order.
    pub fn all(&self) -> &[CommandDef] {
        &self.defs
    }

    /// Runs the client-side validator for `args`, if the command has one.
    ///
    /// A failure only rejects this invocation.
    pub fn validate_cli(&self, args: &mut Value) -> Result<()> {
        let name = command_name(args)?.to_string();
        let Some(validate) = self
            .lookup(&name, CommandFlags::CLIENT | CommandFlags::DAEMON)
            .and_then(|def| def.cli_validate)
        else {
            return Ok(());
        };
        validate(args).map_err(|err| match err {
            WatchError::CommandValidation(detail) => WatchError::CommandValidation(detail),
            other => WatchError::CommandValidation(other.to_string()),
        })
    }

    /// Looks up and runs the command named by `args[0]`.
    pub fn dispatch(
        &self,
        context: &CommandContext<'_>,
        args: &Value,
        mode: CommandFlags,
    ) -> Result<Value> {
        let name = command_name(args)?;
        let def = self
            .lookup(name, mode)
            .ok_or_else(|| WatchError::UnknownCommand(name.to_string()))?;
        log::debug!("dispatching command '{}'", def.name);
        (def.func)(context, args)
    }
}

fn command_name(args: &Value) -> Result<&str> {
    match args {
        Value::Array(items) => match items.first() {
            Some(Value::String(name)) => Ok(name),
            _ => Err(WatchError::CommandValidation(
                "expected the command name as the first array element".to_string(),
            )),
        },
        Value::String(name) => Ok(name),
        other => Err(WatchError::CommandValidation(format!(
            "expected a command array, got {other}"
        ))),
    }
}
