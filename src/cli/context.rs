use std::{future::Future, sync::Arc};

use dialoguer::{theme::ColorfulTheme, Confirm};
use strsim::levenshtein;
use tokio::runtime::{Builder, Runtime};
use tracing::{info, warn};

use super::{
    commands::{self, CommandDefinition, CommandRegistry},
    output,
};
use crate::{
    coach::{ChatCompletionsClient, FinancialCoach, InferenceService},
    config::{Config, ConfigManager},
    core::time::SystemClock,
    errors::{CliError, CommandError},
    ledger::{BillBook, LedgerStore},
    storage::{JsonFileStore, KeyValueStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) store: LedgerStore,
    pub(crate) bills: BillBook,
    pub(crate) inference: Arc<dyn InferenceService>,
    pub(crate) coach: FinancialCoach,
    pub(crate) config_manager: ConfigManager,
    pub(crate) config: Config,
    runtime: Runtime,
    pub(crate) last_command: Option<String>,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_inference(mode, ConfigManager::new()?, None)
    }

    /// Builds a context over `config_manager`'s directory. Without an explicit
    /// inference service, one is created for the configured endpoint.
    pub fn with_inference(
        mode: CliMode,
        config_manager: ConfigManager,
        inference: Option<Arc<dyn InferenceService>>,
    ) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        let data_dir = config_manager.data_dir(&config);
        let storage: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&data_dir)?);

        let mut store = LedgerStore::new(storage.clone(), Arc::new(SystemClock));
        store.initialize();
        let bills = BillBook::load(storage);

        let inference = inference.unwrap_or_else(|| {
            Arc::new(ChatCompletionsClient::new(config.model.endpoint.clone()))
        });
        let coach = FinancialCoach::with_settings(inference.clone(), config.model.coach_settings());
        let runtime = Builder::new_current_thread().enable_all().build()?;

        info!(data_dir = %data_dir.display(), transactions = store.len(), "shell ready");

        let mut context = Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            store,
            bills,
            inference,
            coach,
            config_manager,
            config,
            runtime,
            last_command: None,
            running: true,
        };
        context.auto_load_model();
        Ok(context)
    }

    fn auto_load_model(&mut self) {
        if !self.config.model.auto_load {
            return;
        }
        let Some(name) = self.config.model.name.clone() else {
            return;
        };
        match self.block_on(self.inference.load_model(&name)) {
            Ok(()) => output::success(format!("Model `{name}` loaded.")),
            Err(err) => {
                warn!(model = %name, error = %err, "automatic model load failed");
                output::warning(format!("Could not load model `{name}`: {err}"));
            }
        }
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        let ready = if self.coach.is_ready() { "" } else { "*" };
        format!("zenith{ready}> ")
    }

    pub(crate) fn persist_config(&self) -> Result<(), CommandError> {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|definition| definition.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let Some((raw, rest)) = super::shell::split_command_word(line) else {
            return Ok(LoopControl::Continue);
        };
        let command = raw.to_lowercase();
        let free_text = self
            .registry
            .get(&command)
            .map(|definition| definition.free_text)
            .unwrap_or(false);

        let tokens = if free_text {
            if rest.is_empty() {
                Vec::new()
            } else {
                vec![rest.to_string()]
            }
        } else {
            match super::shell::parse_command_line(rest) {
                Ok(tokens) => tokens,
                Err(err) => {
                    output::warning(&err);
                    return Ok(LoopControl::Continue);
                }
            }
        };
        let args: Vec<&str> = tokens.iter().map(String::as_str).collect();
        self.last_command = Some(line.trim().to_string());

        match self.dispatch(&command, raw, &args)? {
            LoopControl::Exit => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            LoopControl::Continue => Ok(LoopControl::Continue),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));

        let lowered = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &lowered), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 2 {
                output::hint(format!("Did you mean `{name}`?"));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Exit shell?")
            .default(true)
            .interact()?)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            other => output::error(other),
        }
    }
}
