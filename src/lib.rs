//! # promptlib
//!
//! Store reusable prompt templates and fill their placeholders.
//!
//! ## Usage
//! Add a dependency in `Cargo.toml`
//! ```toml
//! promptlib = { path = "../promptlib" }
//! ```
//!
//! The `promptlib` binary in the `promptlib-cli` workspace member wraps this crate into a small prompt library
//! on the command line.
//!
//! ## Concepts and Design
//!
//! ### Prompt
//!
//! A [`Prompt`](crate::prompt::Prompt) is a stored record with a title, a category and a content. The content is a
//! template.
//!
//! ### Prompt Template and Placeholder
//!
//! A template looks like
//!
//! ```text
//! Write a {tone} email to {client} about {goal}.
//! ```
//!
//! `{tone}` is a placeholder, a slot to be filled, which has a name `"tone"`.
//!
//! The format of a named placeholder is `{whatever name you like}`. The name is everything between a `{` and the next
//! `}`, so it can be empty (`{}`) and can contain line breaks or even another `{`. There is no way to escape braces.
//!
//! A [`PromptTemplate`](crate::prompt::PromptTemplate) extracts its placeholders once, in first-occurrence order and
//! without duplicates.
//!
//! ### Partial Prompt
//!
//! A [`PartialPrompt`](crate::prompt::PartialPrompt) is a filling session over a template. It records which
//! placeholder gets filled by what value. It can be rendered at any time: filled placeholders are replaced by their
//! values and unfilled ones stay in their `{name}` form, so it's easy to see what's left.
//!
//! ```
//! use promptlib::prompt::PromptTemplate;
//!
//! let template = PromptTemplate::new("Write a {tone} email to {client} about {goal}.");
//! assert_eq!(template.placeholders, vec!["tone", "client", "goal"]);
//!
//! let mut prompt = template.construct_prompt();
//! prompt.fill("tone", "friendly").fill("client", "Acme");
//! assert_eq!(prompt.render(), "Write a friendly email to Acme about {goal}.");
//! ```
//!
//! ### Filler
//!
//! Anything that fills one or more placeholders in a partial prompt, i.e. anything that implements
//! [`FillPlaceholders`](crate::filler::FillPlaceholders) and [`Fill`](crate::filler::Fill) or
//! [`FillMut`](crate::filler::FillMut).
//!
//! ### Library and Sinks
//!
//! [`PromptLibrary`](crate::library::PromptLibrary) keeps prompts in a JSON file. A rendered prompt is handed to an
//! [`OutputSink`](crate::sink::OutputSink), e.g. the system clipboard.
//!
//! ## License
//!
//! `promptlib` is free under Apache license.
//!
//! ## Attribution
//! * `tiktoken-rs`: In [crate::utils::token::tiktoken], we re-export the `tiktoken-rs` crate.


pub mod prompt;
pub mod filler;
pub mod library;
pub mod sink;
pub mod utils;
