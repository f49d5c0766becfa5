use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use common::{Error, Result, ValidationError};
use strategy::InputSource;

/// Terminal prompts backed by `dialoguer`.
#[derive(Default)]
pub struct DialoguerInput {
    theme: ColorfulTheme,
}

impl InputSource for DialoguerInput {
    fn read(&mut self, key: &str, prompt: &str) -> Result<String> {
        // The theme draws its own prompt marker.
        let text = prompt.trim_end().trim_end_matches(">>>").trim_end();
        let text = if text.is_empty() { key } else { text };
        Input::<String>::with_theme(&self.theme)
            .with_prompt(text)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn rejected(&mut self, _key: &str, error: &ValidationError) {
        eprintln!("  ✗ {error}");
    }
}
