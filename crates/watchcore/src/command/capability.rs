//! Capability names advertised to clients.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, WatchError};
use crate::query::TermRegistry;

use super::registry::CommandRegistry;

/// Set of capability names the server supports.
#[derive(Debug, Default, Clone)]
pub struct CapabilityTable {
    names: BTreeSet<String>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capabilities implied by the registered terms and commands:
    /// `term-<name>` and `cmd-<name>`.
    pub fn builtin(terms: &TermRegistry, commands: &CommandRegistry) -> Self {
        let mut table = Self::new();
        for name in terms.names() {
            table.register(format!("term-{name}"));
        }
        for def in commands.all() {
            table.register(format!("cmd-{}", def.name));
        }
        log::debug!("capability table built with {} entries", table.names.len());
        table
    }

    pub fn register(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn supported(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// All capability names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    /// Answers a client's capability request.
    ///
    /// Every requested name appears in the map with its support status. The
    /// first unsupported `required` name fails the whole check.
    pub fn check<'a, R, O>(&self, required: R, optional: O) -> Result<BTreeMap<String, bool>>
    where
        R: IntoIterator<Item = &'a str>,
        O: IntoIterator<Item = &'a str>,
    {
        let mut answer = BTreeMap::new();
        for name in optional {
            answer.insert(name.to_string(), self.supported(name));
        }
        for name in required {
            if !self.supported(name) {
                return Err(WatchError::CapabilityRequired(name.to_string()));
            }
            answer.insert(name.to_string(), true);
        }
        Ok(answer)
    }
}
