use tracing::debug;

use common::{ConfigValue, Error, Result, TypeTag, ValidationError};

use crate::ConfigRegistry;

/// Computes a prompt from the values resolved so far.
pub type PromptFn = Box<dyn Fn(&ConfigRegistry) -> Result<String> + Send + Sync>;

/// Checks raw input. `Ok(None)` accepts, `Ok(Some(_))` rejects the input and
/// re-prompts, `Err(_)` aborts the session.
pub type ValidatorFn =
    Box<dyn Fn(&str, &ConfigRegistry) -> Result<Option<ValidationError>> + Send + Sync>;

/// Decides whether the entry is prompted at all.
pub type RequiredIfFn = Box<dyn Fn(&ConfigRegistry) -> bool + Send + Sync>;

/// Side effect run once right after the entry's value is stored.
pub type OnValidatedFn = Box<dyn Fn(&ConfigValue, &ConfigRegistry) -> Result<()> + Send + Sync>;

pub enum Prompt {
    Static(String),
    /// Evaluated on every call, never cached.
    Dynamic(PromptFn),
}

/// Where an entry is in its resolution lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Unresolved,
    /// Not prompted; holds its default.
    Skipped,
    /// Value stored; the on-validated hook has not completed.
    Validated,
    /// Prompted, validated, hook run.
    Resolved,
}

/// One named, typed configuration field.
pub struct ConfigVar {
    key: String,
    type_tag: TypeTag,
    prompt: Prompt,
    default: Option<ConfigValue>,
    prompt_on_new: bool,
    validator: Option<ValidatorFn>,
    required_if: Option<RequiredIfFn>,
    on_validated: Option<OnValidatedFn>,
    value: Option<ConfigValue>,
    state: EntryState,
}

impl ConfigVar {
    pub fn new(key: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            key: key.into(),
            type_tag,
            prompt: Prompt::Static(String::new()),
            default: None,
            prompt_on_new: false,
            validator: None,
            required_if: None,
            on_validated: None,
            value: None,
            state: EntryState::Unresolved,
        }
    }

    pub fn prompt(mut self, text: impl Into<String>) -> Self {
        self.prompt = Prompt::Static(text.into());
        self
    }

    pub fn prompt_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigRegistry) -> Result<String> + Send + Sync + 'static,
    {
        self.prompt = Prompt::Dynamic(Box::new(f));
        self
    }

    pub fn with_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn prompt_on_new(mut self) -> Self {
        self.prompt_on_new = true;
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &ConfigRegistry) -> Result<Option<ValidationError>> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(f));
        self
    }

    pub fn required_if<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigRegistry) -> bool + Send + Sync + 'static,
    {
        self.required_if = Some(Box::new(f));
        self
    }

    pub fn on_validated<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigValue, &ConfigRegistry) -> Result<()> + Send + Sync + 'static,
    {
        self.on_validated = Some(Box::new(f));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn is_prompted_on_new(&self) -> bool {
        self.prompt_on_new
    }

    pub fn default_value(&self) -> Option<&ConfigValue> {
        self.default.as_ref()
    }

    pub fn value(&self) -> Option<&ConfigValue> {
        self.value.as_ref()
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Entries without a `required_if` predicate are always required.
    pub fn is_required(&self, registry: &ConfigRegistry) -> bool {
        self.required_if.as_ref().map_or(true, |f| f(registry))
    }

    pub fn resolve_prompt(&self, registry: &ConfigRegistry) -> Result<String> {
        match &self.prompt {
            Prompt::Static(text) => Ok(text.clone()),
            Prompt::Dynamic(f) => f(registry),
        }
    }

    /// Parse `raw` per the type tag, then run the validator on it.
    pub fn check(
        &self,
        raw: &str,
        registry: &ConfigRegistry,
    ) -> Result<Result<ConfigValue, ValidationError>> {
        let parsed = match self.type_tag.parse(raw) {
            Ok(value) => value,
            Err(e) => return Ok(Err(e)),
        };
        if let Some(validator) = &self.validator {
            if let Some(e) = validator(raw.trim(), registry)? {
                return Ok(Err(e));
            }
        }
        Ok(Ok(parsed))
    }

    /// Run the on-validated hook, if any. Any failure is reported as fatal.
    pub fn run_hook(&self, value: &ConfigValue, registry: &ConfigRegistry) -> Result<()> {
        let Some(hook) = &self.on_validated else {
            return Ok(());
        };
        debug!(key = %self.key, "Running on-validated hook");
        hook(value, registry).map_err(|e| match e {
            e @ Error::Hook { .. } => e,
            other => Error::Hook {
                key: self.key.clone(),
                reason: other.to_string(),
            },
        })
    }

    pub(crate) fn set_value(&mut self, value: ConfigValue) -> Result<()> {
        self.ensure_unresolved()?;
        if value.type_tag() != self.type_tag {
            return Err(Error::TypeMismatch {
                key: self.key.clone(),
                expected: self.type_tag,
                actual: value.type_tag(),
            });
        }
        self.value = Some(value);
        self.state = EntryState::Validated;
        Ok(())
    }

    pub(crate) fn mark_resolved(&mut self) {
        if self.state == EntryState::Validated {
            self.state = EntryState::Resolved;
        }
    }

    pub(crate) fn skip(&mut self) -> Result<()> {
        self.ensure_unresolved()?;
        self.value = self.default.clone();
        self.state = EntryState::Skipped;
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.value = None;
        self.state = EntryState::Unresolved;
    }

    fn ensure_unresolved(&self) -> Result<()> {
        if self.state == EntryState::Unresolved {
            Ok(())
        } else {
            Err(Error::AlreadyResolved(self.key.clone()))
        }
    }
}

impl std::fmt::Debug for ConfigVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigVar")
            .field("key", &self.key)
            .field("type_tag", &self.type_tag)
            .field("default", &self.default)
            .field("prompt_on_new", &self.prompt_on_new)
            .field("value", &self.value)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
