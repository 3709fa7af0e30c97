//! # Prompt
//! A prompt is simply a string
//! ## Prompt record
//! A [Prompt] is what a library stores: a title, a category and a content. The content is a template.
//!
//! ## PromptTemplate
//! A prompt template is a string with placeholders. It can also have metadata in JSON format.
//!
//! ## Placeholder
//! A placeholder is a string that is in the format of `{name}`. It can be filled with a value.
//! Its name is everything between the `{` and the first `}` after it.
//!
//! ## PartialPrompt
//! A partial prompt is a prompt template with some placeholders filled. A partial prompt can be only constructed from a prompt template via [PromptTemplate::construct_prompt].
//!
//! The placeholders in a partial prompt can be filled with values via [PartialPrompt::fill] or [PartialPrompt::try_fill]. You can also use these two methods to update the filling values of the placeholders.
//! A partial prompt can be rendered at any time via [PartialPrompt::render]; unfilled placeholders are kept as `{name}`.
//! When all placeholders are filled, [PartialPrompt::complete] gives the same string and fails otherwise.
//!
//! ### Counting tokens
//! A partial prompt can be used to count the number of tokens in its current rendering via [PartialPrompt::current_token_num].


use std::sync::Arc;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::prompt::errors::{PlaceholderNotExist, UnfilledPlaceholders};
use crate::utils::token::CountToken;
use crate::utils::{JsonMap, ValueMap};

pub use crate::utils::prompt_processing::{extract_placeholders, render};

/// A stored prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub title: String,
    pub category: String,
    pub content: String,
}

impl Prompt {
    pub fn new(title: impl Into<String>, category: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            content: content.into(),
        }
    }

    /// Build the template of this prompt, with the title and category as metadata.
    pub fn template(&self) -> PromptTemplate {
        let mut metadata = JsonMap::new();
        metadata.insert("title".to_string(), self.title.clone().into());
        metadata.insert("category".to_string(), self.category.clone().into());
        PromptTemplate::with_metadata(self.content.clone(), metadata)
    }
}

/// A prompt template with some placeholders filled. A partial prompt can be only constructed from a prompt template via [PromptTemplate::construct_prompt].
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PartialPrompt {
    /// The template of the partial prompt, readonly
    #[readonly]
    pub template: PromptTemplate,

    /// Mapping from placeholder name to its filling value
    pub(crate) placeholder_to_vals: ValueMap,
}

impl PartialPrompt {
    /// Fill a placeholder in the partial prompt with the given value.
    /// Filling a placeholder that does not exist is logged and otherwise ignored.
    pub fn fill(&mut self, placeholder: impl Into<String>, value: impl Into<String>) -> &mut Self {
        if let Err(e) = self.try_fill(placeholder, value) {
            warn!("Ignored value: {}", e);
        }
        self
    }

    /// Fill a placeholder in the partial prompt with the given value.
    /// Returns an error if the placeholder does not exist.
    pub fn try_fill(&mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Result<&mut Self, PlaceholderNotExist> {
        let placeholder = placeholder.into();
        if self.template.placeholders.contains(&placeholder) {
            self.placeholder_to_vals.insert(placeholder, value.into());
            Ok(self)
        } else {
            Err(PlaceholderNotExist::new(placeholder, value, &self.template.placeholders))
        }
    }

    /// Clear the value of a placeholder, which makes it unfilled again.
    pub fn clear(&mut self, placeholder: &str) -> &mut Self {
        self.placeholder_to_vals.remove(placeholder);
        self
    }

    /// The value entered for a placeholder, if any. An empty value is still returned.
    pub fn value(&self, placeholder: &str) -> Option<&str> {
        self.placeholder_to_vals.get(placeholder).map(String::as_str)
    }

    /// All values entered so far.
    #[inline]
    pub fn values(&self) -> &ValueMap {
        &self.placeholder_to_vals
    }

    /// Placeholders that are absent or have an empty value, in template order.
    pub fn unfilled_placeholders(&self) -> Vec<&str> {
        self.template.placeholders.iter()
            .filter(|p| self.placeholder_to_vals.get(p.as_str()).map_or(true, String::is_empty))
            .map(String::as_str)
            .collect()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.unfilled_placeholders().is_empty()
    }

    /// Render the prompt as it currently is. Unfilled placeholders are kept as `{name}`.
    pub fn render(&self) -> String {
        render(self.template.str(), &self.placeholder_to_vals)
    }

    /// Count the number of tokens in the current rendering. Unfilled placeholders are counted as `{name}`.
    pub fn current_token_num(&self, counter: &impl CountToken) -> usize {
        counter.count_token(&self.render())
    }

    /// Complete the partial prompt and return the completed prompt.
    /// Returns an error if there are still unfilled placeholders.
    pub fn complete(&self) -> Result<String, UnfilledPlaceholders> {
        let unfilled = self.unfilled_placeholders();
        if unfilled.is_empty() {
            Ok(self.render())
        } else {
            Err(UnfilledPlaceholders {
                all_placeholders: self.template.placeholders.clone(),
                unfilled_placeholders: unfilled.into_iter().map(str::to_string).collect(),
            })
        }
    }
}

/// A prompt template with placeholders. It can also have metadata in JSON format.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PromptTemplate {
    /// The template of the partial prompt, immutable
    template: Arc<String>,

    /// The distinct placeholders in the template in first-occurrence order, readonly
    #[readonly]
    pub placeholders: Vec<String>,

    /// The metadata of the prompt template, readonly
    #[readonly]
    pub meta_data: Arc<JsonMap>,
}

impl PromptTemplate {
    /// Create a prompt template from a string without metadata.
    pub fn new(template: impl Into<String>) -> Self {
        Self::with_metadata(template, JsonMap::new())
    }

    /// Create a prompt template from a string with metadata. Warns if the template does not have any placeholder.
    pub fn with_metadata(template: impl Into<String>, metadata: JsonMap) -> Self {
        let template = template.into();
        let placeholders = extract_placeholders(&template);
        if placeholders.is_empty() {
            warn!("Your prompt template does not have a placeholder. If this is intended, ignore this message. \
            Otherwise, check whether you have written placeholders correctly.\n\
            Got prompt template:\n\
            {}", template);
        }
        Self {
            template: Arc::new(template),
            meta_data: Arc::new(metadata),
            placeholders,
        }
    }

    /// Get the prompt template as a string.
    #[inline]
    pub fn str(&self) -> &str {
        &self.template
    }

    /// Construct a partial prompt from the prompt template.
    pub fn construct_prompt(&self) -> PartialPrompt {
        PartialPrompt {
            template: self.clone(),
            placeholder_to_vals: ValueMap::new(),
        }
    }
}

pub mod errors {
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;

    /// Error when trying to complete a partial prompt but there are still unfilled placeholders.
    #[derive(Debug)]
    pub struct UnfilledPlaceholders {
        pub unfilled_placeholders: Vec<String>,
        pub all_placeholders: Vec<String>,
    }

    impl fmt::Display for UnfilledPlaceholders {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "UnfilledPlaceholders: to complete the prompt template,\n  Requires Placeholders:{:?}\n  Unfilled Placeholders:{:?}",
                   self.all_placeholders, self.unfilled_placeholders)
        }
    }

    impl Error for UnfilledPlaceholders {}

    /// Error when trying to fill a placeholder that does not exist in the prompt template of the partial prompt.
    #[derive(Debug)]
    pub struct PlaceholderNotExist {
        pub try_fill_placeholder: String,
        pub value: String,
        pub available_placeholders: Vec<String>,
    }

    impl PlaceholderNotExist {
        pub(crate) fn new(try_fill_placeholder: impl Into<String>,
                          value: impl Into<String>,
                          available_placeholders: &[String]) -> Self {
            PlaceholderNotExist {
                try_fill_placeholder: try_fill_placeholder.into(),
                value: value.into(),
                available_placeholders: available_placeholders.to_vec(),
            }
        }
    }

    impl fmt::Display for PlaceholderNotExist {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "PlaceholderNotExist: try to fill placeholder = {} with value = {}, but available placeholders are {:?}",
                   self.try_fill_placeholder,
                   self.value,
                   self.available_placeholders)
        }
    }

    impl Error for PlaceholderNotExist {}
}

#[cfg(test)]
mod test_prompt {
    use super::{Prompt, PromptTemplate};
    use crate::utils::token::count_tokens_by_len;

    const EMAIL: &str = "Write a {tone} email to {client} about {goal}.";

    #[test]
    fn test_template_placeholders() {
        let template = PromptTemplate::new("{a}{b}{a}");
        assert_eq!(template.placeholders, vec!["a", "b"]);
        assert_eq!(template.str(), "{a}{b}{a}");

        let template = PromptTemplate::new("nothing to fill");
        assert!(template.placeholders.is_empty());
    }

    #[test]
    fn test_fill_and_render() {
        let mut prompt = PromptTemplate::new(EMAIL).construct_prompt();
        assert_eq!(prompt.render(), EMAIL);
        prompt.fill("tone", "friendly").fill("client", "Acme");
        assert_eq!(prompt.render(), "Write a friendly email to Acme about {goal}.");
        assert_eq!(prompt.unfilled_placeholders(), vec!["goal"]);
        assert!(!prompt.is_complete());

        prompt.fill("goal", "the renewal");
        assert_eq!(prompt.render(), "Write a friendly email to Acme about the renewal.");
        assert!(prompt.is_complete());
    }

    #[test]
    fn test_refill_and_clear() {
        let mut prompt = PromptTemplate::new(EMAIL).construct_prompt();
        prompt.fill("tone", "friendly");
        prompt.fill("tone", "formal");
        assert_eq!(prompt.value("tone"), Some("formal"));
        prompt.fill("tone", "");
        assert_eq!(prompt.value("tone"), Some(""));
        assert_eq!(prompt.render(), EMAIL);
        prompt.fill("tone", "curt").clear("tone");
        assert_eq!(prompt.value("tone"), None);
        assert_eq!(prompt.unfilled_placeholders(), vec!["tone", "client", "goal"]);
    }

    #[test]
    fn test_fill_unknown_placeholder() {
        let mut prompt = PromptTemplate::new(EMAIL).construct_prompt();
        let err = prompt.try_fill("ghost", "boo").expect_err("ghost is not a placeholder");
        assert_eq!(err.try_fill_placeholder, "ghost");
        assert_eq!(err.available_placeholders, vec!["tone", "client", "goal"]);

        prompt.fill("ghost", "boo");
        assert!(prompt.values().is_empty());
        assert_eq!(prompt.render(), EMAIL);
    }

    #[test]
    fn test_complete() {
        let mut prompt = PromptTemplate::new("{x} and {x} again").construct_prompt();
        let err = prompt.complete().expect_err("x is unfilled");
        assert_eq!(err.unfilled_placeholders, vec!["x"]);

        prompt.fill("x", "cats");
        assert_eq!(prompt.complete().unwrap(), "cats and cats again");

        let prompt = PromptTemplate::new("static").construct_prompt();
        assert_eq!(prompt.complete().unwrap(), "static");
    }

    #[test]
    fn test_token_num_counts_rendering() {
        let mut prompt = PromptTemplate::new("hi {name}").construct_prompt();
        assert_eq!(prompt.current_token_num(&count_tokens_by_len), "hi {name}".len());
        prompt.fill("name", "Al");
        assert_eq!(prompt.current_token_num(&count_tokens_by_len), "hi Al".len());
    }

    #[test]
    fn test_prompt_record_template() {
        let prompt = Prompt::new("Outreach", "Sales", EMAIL);
        let template = prompt.template();
        assert_eq!(template.str(), EMAIL);
        assert_eq!(template.meta_data["title"], "Outreach");
        assert_eq!(template.meta_data["category"], "Sales");
    }
}
