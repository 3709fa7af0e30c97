//! Asks the user for placeholder values, repainting the filled prompt after every answer.

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Editor, Input};
use promptlib::filler::{FillMut, FillPlaceholders};
use promptlib::prompt::PartialPrompt;
use promptlib::utils::printing::PromptPreview;

/// Typed instead of a value to write it in `$EDITOR`, for values that span lines.
const EDIT_COMMAND: &str = ":edit";

#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Value(String),
    OpenEditor,
}

impl From<String> for Answer {
    fn from(input: String) -> Self {
        if input.trim() == EDIT_COMMAND {
            Answer::OpenEditor
        } else {
            Answer::Value(input)
        }
    }
}

pub struct InteractiveFiller {
    theme: ColorfulTheme,
    preview: PromptPreview,
    placeholders_to_fill: Vec<String>,
}

impl InteractiveFiller {
    /// Questions and the preview both go to stderr, which must be a terminal.
    pub fn new(placeholders_to_fill: Vec<String>) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            preview: PromptPreview::default(),
            placeholders_to_fill,
        }
    }

    fn ask(&self, placeholder: &str, current: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(field_label(placeholder))
            .allow_empty(true);
        if let Some(current) = current.filter(|c| !c.contains('\n')) {
            input = input.with_initial_text(current);
        }
        match Answer::from(input.interact_text()?) {
            Answer::Value(value) => Ok(value),
            Answer::OpenEditor => {
                let edited = Editor::new().edit(current.unwrap_or_default())?;
                Ok(edited.map(trim_editor_output).unwrap_or_default())
            }
        }
    }

    fn repaint(&mut self, partial_prompt: &PartialPrompt) -> Result<()> {
        Ok(self.preview.update_and_print(partial_prompt)?)
    }
}

impl FillPlaceholders for InteractiveFiller {
    fn placeholders_to_fill(&self) -> &Vec<String> {
        &self.placeholders_to_fill
    }
}

impl FillMut for InteractiveFiller {
    fn fill_mut(&mut self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        for placeholder in self.placeholders_to_fill.clone() {
            self.repaint(partial_prompt)?;
            let value = self.ask(&placeholder, partial_prompt.value(&placeholder))?;
            partial_prompt.fill(placeholder, value);
        }
        self.repaint(partial_prompt)
    }
}

fn field_label(placeholder: &str) -> String {
    if placeholder.is_empty() {
        format!("{{}} (unnamed, {} for several lines)", EDIT_COMMAND)
    } else {
        format!("Enter {} ({} for several lines)", placeholder, EDIT_COMMAND)
    }
}

/// Editors save a trailing newline that is not part of the value.
fn trim_editor_output(text: String) -> String {
    let trimmed = text.trim_end_matches(['\n', '\r']);
    if trimmed.len() == text.len() {
        text
    } else {
        trimmed.to_string()
    }
}
