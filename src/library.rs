//! # Library
//! A [PromptLibrary] is an ordered collection of [Prompt]s kept in a JSON file:
//!
//! ```json
//! { "prompts": [ { "title": "Outreach", "category": "Sales", "content": "Write to {client}." } ] }
//! ```
//!
//! Titles are unique (case-sensitive) and non-empty. Writes go to a temporary file next to the library which is
//! then renamed over it, so a crash never leaves a half-written library behind.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};
use crate::prompt::Prompt;

#[derive(Debug)]
pub enum LibraryError {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    NotFound(String),
    DuplicateTitle(String),
    EmptyTitle,
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Io { path, source } => write!(f, "cannot access prompt library {}: {}", path.display(), source),
            LibraryError::Json { path, source } => write!(f, "prompt library {} is not valid: {}", path.display(), source),
            LibraryError::NotFound(title) => write!(f, "no prompt titled {:?}", title),
            LibraryError::DuplicateTitle(title) => write!(f, "a prompt titled {:?} already exists", title),
            LibraryError::EmptyTitle => write!(f, "prompt title must not be empty"),
        }
    }
}

impl Error for LibraryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LibraryError::Io { source, .. } => Some(source),
            LibraryError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    prompts: Vec<Prompt>,
}

#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    path: Option<PathBuf>,
    prompts: Vec<Prompt>,
}

impl PromptLibrary {
    /// An empty library that is not bound to a file.
    pub fn new() -> Self {
        Self::default()
    }

    /// A library with a few starter prompts.
    pub fn with_defaults() -> Self {
        let mut library = Self::new();
        library.prompts = starter_prompts();
        library
    }

    /// Load the library at `path`. A missing file gives an empty library that will be saved to `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let prompts = match fs::read_to_string(&path) {
            Ok(content) => {
                let file: LibraryFile = serde_json::from_str(&content)
                    .map_err(|source| LibraryError::Json { path: path.clone(), source })?;
                file.prompts
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("prompt library {} does not exist yet", path.display());
                Vec::new()
            }
            Err(source) => return Err(LibraryError::Io { path, source }),
        };
        debug!("loaded {} prompts from {}", prompts.len(), path.display());
        Ok(Self { path: Some(path), prompts })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bind the library to another file. Nothing is written until [PromptLibrary::save].
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// Write the library to its file. A library without a file is not saved.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            debug!("prompt library has no file, not saving");
            return Ok(());
        };
        let file = LibraryFile { prompts: self.prompts.clone() };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|source| LibraryError::Json { path: path.clone(), source })?;
        atomic_write(path, content.as_bytes())
            .map_err(|source| LibraryError::Io { path: path.clone(), source })?;
        debug!("saved {} prompts to {}", self.prompts.len(), path.display());
        Ok(())
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.title == title)
    }

    pub fn get_mut(&mut self, title: &str) -> Option<&mut Prompt> {
        self.prompts.iter_mut().find(|p| p.title == title)
    }

    pub fn add(&mut self, prompt: Prompt) -> Result<()> {
        if prompt.title.is_empty() {
            return Err(LibraryError::EmptyTitle);
        }
        if self.get(&prompt.title).is_some() {
            return Err(LibraryError::DuplicateTitle(prompt.title));
        }
        self.prompts.push(prompt);
        Ok(())
    }

    /// Replace the prompt titled `title`, keeping its position. The new prompt may have another title if it's free.
    pub fn update(&mut self, title: &str, prompt: Prompt) -> Result<()> {
        if prompt.title.is_empty() {
            return Err(LibraryError::EmptyTitle);
        }
        if prompt.title != title && self.get(&prompt.title).is_some() {
            return Err(LibraryError::DuplicateTitle(prompt.title));
        }
        let slot = self.get_mut(title).ok_or_else(|| LibraryError::NotFound(title.to_string()))?;
        *slot = prompt;
        Ok(())
    }

    pub fn remove(&mut self, title: &str) -> Result<Prompt> {
        let idx = self.prompts.iter()
            .position(|p| p.title == title)
            .ok_or_else(|| LibraryError::NotFound(title.to_string()))?;
        Ok(self.prompts.remove(idx))
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.prompts.iter()
            .map(|p| p.category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item=&'a Prompt> + 'a {
        self.prompts.iter().filter(move |p| p.category == category)
    }

    /// Prompts whose title, category or content contains `query`, ignoring case.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item=&'a Prompt> + 'a {
        let query = query.to_lowercase();
        self.prompts.iter().filter(move |p| {
            p.title.to_lowercase().contains(&query)
                || p.category.to_lowercase().contains(&query)
                || p.content.to_lowercase().contains(&query)
        })
    }
}

fn starter_prompts() -> Vec<Prompt> {
    vec![
        Prompt::new(
            "Client outreach email",
            "Sales",
            "Write a {tone} email to {client} in the {industry} industry about {goal}.",
        ),
        Prompt::new(
            "Meeting summary",
            "Operations",
            "Summarize the following meeting notes for {audience} in {length} bullet points:\n\n{notes}",
        ),
        Prompt::new(
            "Social post",
            "Marketing",
            "Draft a {platform} post announcing {announcement} for {client}. Keep it {tone}.",
        ),
    ]
}

fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let file_name = path.file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "library path has no file name"))?;
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)
}
