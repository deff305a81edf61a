use std::collections::HashMap;

pub mod bills;
pub mod coach;
pub mod ledger;
pub mod system;

use crate::{cli::context::ShellContext, errors::CommandError};

pub type CommandResult = Result<(), CommandError>;

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(ledger::definitions());
    commands.extend(coach::definitions());
    commands.extend(bills::definitions());
    commands.extend(system::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
    /// Receives the rest of the line as one argument, without shell-style splitting.
    pub free_text: bool,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
            free_text: false,
        }
    }

    pub fn free_text(mut self) -> Self {
        self.free_text = true;
        self
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

pub(crate) fn usage_error(usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {usage}"))
}

pub(crate) fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    raw.trim_start_matches('$')
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid amount `{raw}`")))
}
