use std::collections::VecDeque;

use tracing::{debug, info};

use common::{Error, Result, ValidationError};

use crate::config_var::EntryState;
use crate::{ConfigRegistry, RequiredExchanges};

/// Supplies raw answers to prompts. The interactive CLI implements this;
/// tests use [`ScriptedInput`].
pub trait InputSource {
    /// Show `prompt` for `key` and return the raw answer.
    fn read(&mut self, key: &str, prompt: &str) -> Result<String>;

    /// Surface a rejected answer before the entry is prompted again.
    fn rejected(&mut self, _key: &str, _error: &ValidationError) {}
}

/// Which entries a pass prompts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Fresh configuration: only entries flagged `prompt_on_new`.
    New,
    /// Every entry whose `required_if` holds.
    Full,
}

/// How a single entry ended up resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Resolved { rejected: usize },
}

/// Summary of a full resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub prompted: Vec<String>,
    pub skipped: Vec<String>,
    /// Answers rejected across all entries.
    pub rejected: usize,
}

/// One interactive configuration pass over a registry.
///
/// Starting a session wipes previously resolved values and the shared
/// required-exchanges list, so a reconfiguration never mixes with history.
pub struct ConfigSession<'a> {
    registry: &'a mut ConfigRegistry,
    required_exchanges: RequiredExchanges,
}

impl<'a> ConfigSession<'a> {
    pub fn begin(registry: &'a mut ConfigRegistry, required_exchanges: RequiredExchanges) -> Self {
        registry.reset();
        required_exchanges.clear();
        info!(registry = %registry.name(), "Configuration session started");
        Self {
            registry,
            required_exchanges,
        }
    }

    pub fn registry(&self) -> &ConfigRegistry {
        &*self.registry
    }

    pub fn required_exchanges(&self) -> &RequiredExchanges {
        &self.required_exchanges
    }

    /// Resolve every entry in declaration order. Stops at the first fatal error.
    pub fn resolve_all(
        &mut self,
        input: &mut dyn InputSource,
        mode: ResolveMode,
    ) -> Result<SessionReport> {
        let mut report = SessionReport::default();
        for index in 0..self.registry.len() {
            let key = self.key_at(index)?;
            match self.resolve_entry(index, input, mode)? {
                Outcome::Skipped => report.skipped.push(key),
                Outcome::Resolved { rejected } => {
                    report.prompted.push(key);
                    report.rejected += rejected;
                }
            }
        }
        info!(
            registry = %self.registry.name(),
            prompted = report.prompted.len(),
            skipped = report.skipped.len(),
            rejected = report.rejected,
            "Configuration session complete"
        );
        Ok(report)
    }

    /// Resolve the entry at `index`: skip it with its default, or prompt
    /// until an answer passes parsing and validation, then store it and run
    /// its hook.
    pub fn resolve_entry(
        &mut self,
        index: usize,
        input: &mut dyn InputSource,
        mode: ResolveMode,
    ) -> Result<Outcome> {
        let key = self.key_at(index)?;
        let (state, should_prompt) = {
            let registry: &ConfigRegistry = &*self.registry;
            let entry = registry.get(&key)?;
            let prompt_allowed = match mode {
                ResolveMode::New => entry.is_prompted_on_new(),
                ResolveMode::Full => true,
            };
            (entry.state(), prompt_allowed && entry.is_required(registry))
        };
        if state != EntryState::Unresolved {
            return Err(Error::AlreadyResolved(key));
        }

        if !should_prompt {
            self.entry_mut(index)?.skip()?;
            debug!(key = %key, "Entry skipped, default applied");
            return Ok(Outcome::Skipped);
        }

        let mut rejected = 0;
        let value = loop {
            let registry: &ConfigRegistry = &*self.registry;
            let entry = registry.get(&key)?;
            let prompt = entry.resolve_prompt(registry)?;
            let raw = input.read(&key, &prompt)?;
            match entry.check(&raw, registry)? {
                Ok(value) => break value,
                Err(e) => {
                    debug!(key = %key, error = %e, "Input rejected");
                    input.rejected(&key, &e);
                    rejected += 1;
                }
            }
        };

        self.entry_mut(index)?.set_value(value.clone())?;
        let registry: &ConfigRegistry = &*self.registry;
        registry.get(&key)?.run_hook(&value, registry)?;
        self.entry_mut(index)?.mark_resolved();
        info!(key = %key, value = %value, "Entry resolved");
        Ok(Outcome::Resolved { rejected })
    }

    fn key_at(&self, index: usize) -> Result<String> {
        self.registry
            .entry_at(index)
            .map(|e| e.key().to_string())
            .ok_or_else(|| Error::Other(format!("no config entry at position {index}")))
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut crate::ConfigVar> {
        self.registry
            .entry_at_mut(index)
            .ok_or_else(|| Error::Other(format!("no config entry at position {index}")))
    }
}

/// Replays canned answers in order and records everything it was shown.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
    pub prompts: Vec<(String, String)>,
    pub rejections: Vec<(String, ValidationError)>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            rejections: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl InputSource for ScriptedInput {
    fn read(&mut self, key: &str, prompt: &str) -> Result<String> {
        self.prompts.push((key.to_string(), prompt.to_string()));
        self.answers
            .pop_front()
            .ok_or_else(|| Error::InputExhausted(key.to_string()))
    }

    fn rejected(&mut self, key: &str, error: &ValidationError) {
        self.rejections.push((key.to_string(), error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::ConfigVar;
    use common::{ConfigValue, TypeTag};
    use rust_decimal_macros::dec;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn skipped_entry_never_prompts_or_validates() {
        let validated = counter();
        let prompted = counter();
        let (v, p) = (validated.clone(), prompted.clone());
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![ConfigVar::new("cancel_order_threshold", TypeTag::Decimal)
                .prompt_with(move |_| {
                    p.fetch_add(1, Ordering::SeqCst);
                    Ok(String::new())
                })
                .validator(move |_, _| {
                    v.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .with_default(dec!(5))
                .prompt_on_new()
                .required_if(|_| false)],
        )
        .unwrap();

        let mut input = ScriptedInput::new(Vec::<String>::new());
        let mut session = ConfigSession::begin(&mut registry, RequiredExchanges::new());
        let report = session.resolve_all(&mut input, ResolveMode::Full).unwrap();

        assert_eq!(report.skipped, vec!["cancel_order_threshold"]);
        assert_eq!(prompted.load(Ordering::SeqCst), 0);
        assert_eq!(validated.load(Ordering::SeqCst), 0);
        let value = registry.value("cancel_order_threshold").unwrap();
        assert_eq!(value, &ConfigValue::Decimal(dec!(5)));
        assert_eq!(
            registry.state("cancel_order_threshold").unwrap(),
            EntryState::Skipped
        );
    }

    #[test]
    fn reprompts_until_valid_and_runs_hook_once() {
        let hook_calls = counter();
        let calls = hook_calls.clone();
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![ConfigVar::new("min_profitability", TypeTag::Decimal)
                .prompt("profit? >>> ")
                .prompt_on_new()
                .validator(|raw, _| {
                    Ok(crate::validators::validate_decimal(
                        raw,
                        dec!(0),
                        dec!(100),
                        false,
                    ))
                })
                .on_validated(move |_, _| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })],
        )
        .unwrap();

        let mut input = ScriptedInput::new(["abc", "100", "0.3"]);
        let mut session = ConfigSession::begin(&mut registry, RequiredExchanges::new());
        let outcome = session.resolve_entry(0, &mut input, ResolveMode::New).unwrap();

        assert_eq!(outcome, Outcome::Resolved { rejected: 2 });
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
        assert_eq!(input.prompts.len(), 3);
        assert_eq!(input.rejections.len(), 2);
        assert_eq!(
            registry.decimal_value("min_profitability").unwrap(),
            dec!(0.3)
        );
        assert_eq!(
            registry.state("min_profitability").unwrap(),
            EntryState::Resolved
        );
    }

    #[test]
    fn failed_hook_leaves_entry_unfinished() {
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![ConfigVar::new("taker_market", TypeTag::String)
                .prompt_on_new()
                .on_validated(|_, _| Err(Error::Other("feed down".into())))],
        )
        .unwrap();

        let mut input = ScriptedInput::new(["kucoin"]);
        let mut session = ConfigSession::begin(&mut registry, RequiredExchanges::new());
        let err = session
            .resolve_entry(0, &mut input, ResolveMode::New)
            .unwrap_err();

        assert!(matches!(err, Error::Hook { key, .. } if key == "taker_market"));
        assert_eq!(
            registry.state("taker_market").unwrap(),
            EntryState::Validated
        );
        assert_eq!(registry.str_value("taker_market").unwrap(), "kucoin");
        assert!(!registry.is_fully_resolved());
    }

    #[test]
    fn new_mode_skips_entries_not_prompted_on_new() {
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![
                ConfigVar::new("strategy", TypeTag::String).with_default("xemm"),
                ConfigVar::new("market", TypeTag::String).prompt_on_new(),
            ],
        )
        .unwrap();

        let mut input = ScriptedInput::new(["binance"]);
        let mut session = ConfigSession::begin(&mut registry, RequiredExchanges::new());
        let report = session.resolve_all(&mut input, ResolveMode::New).unwrap();

        assert_eq!(report.skipped, vec!["strategy"]);
        assert_eq!(report.prompted, vec!["market"]);
        assert_eq!(registry.str_value("strategy").unwrap(), "xemm");
    }

    #[test]
    fn full_mode_prompts_required_entries() {
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![ConfigVar::new("strategy", TypeTag::String).with_default("xemm")],
        )
        .unwrap();

        let mut input = ScriptedInput::new(["other"]);
        let mut session = ConfigSession::begin(&mut registry, RequiredExchanges::new());
        session.resolve_all(&mut input, ResolveMode::Full).unwrap();
        assert_eq!(registry.str_value("strategy").unwrap(), "other");
    }

    #[test]
    fn resolving_twice_is_rejected() {
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![ConfigVar::new("market", TypeTag::String).prompt_on_new()],
        )
        .unwrap();
        let mut input = ScriptedInput::new(["binance", "kucoin"]);
        let mut session = ConfigSession::begin(&mut registry, RequiredExchanges::new());
        session.resolve_entry(0, &mut input, ResolveMode::New).unwrap();
        let err = session
            .resolve_entry(0, &mut input, ResolveMode::New)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyResolved(_)));
        assert_eq!(registry.str_value("market").unwrap(), "binance");
    }

    #[test]
    fn exhausted_input_aborts() {
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![ConfigVar::new("market", TypeTag::String).prompt_on_new()],
        )
        .unwrap();
        let mut input = ScriptedInput::new(Vec::<String>::new());
        let mut session = ConfigSession::begin(&mut registry, RequiredExchanges::new());
        let err = session
            .resolve_all(&mut input, ResolveMode::New)
            .unwrap_err();
        assert!(matches!(err, Error::InputExhausted(k) if k == "market"));
    }

    #[test]
    fn forward_reference_in_prompt_is_fatal() {
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![
                ConfigVar::new("pair", TypeTag::String)
                    .prompt_on_new()
                    .prompt_with(|reg| Ok(format!("pair on {} >>> ", reg.str_value("market")?))),
                ConfigVar::new("market", TypeTag::String).prompt_on_new(),
            ],
        )
        .unwrap();
        let mut input = ScriptedInput::new(["ETH-USDT", "binance"]);
        let mut session = ConfigSession::begin(&mut registry, RequiredExchanges::new());
        let err = session
            .resolve_all(&mut input, ResolveMode::New)
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedDependency(k) if k == "market"));
    }

    #[test]
    fn begin_clears_previous_session() {
        let required = RequiredExchanges::new();
        let hook_view = required.clone();
        let mut registry = ConfigRegistry::from_entries(
            "t",
            vec![ConfigVar::new("market", TypeTag::String)
                .prompt_on_new()
                .on_validated(move |value, _| {
                    hook_view.push(value.to_string());
                    Ok(())
                })],
        )
        .unwrap();

        let mut first = ScriptedInput::new(["binance"]);
        ConfigSession::begin(&mut registry, required.clone())
            .resolve_all(&mut first, ResolveMode::New)
            .unwrap();
        assert_eq!(required.snapshot(), vec!["binance"]);

        let mut second = ScriptedInput::new(["kucoin"]);
        ConfigSession::begin(&mut registry, required.clone())
            .resolve_all(&mut second, ResolveMode::New)
            .unwrap();
        assert_eq!(required.snapshot(), vec!["kucoin"]);
        assert_eq!(registry.str_value("market").unwrap(), "kucoin");
    }
}
