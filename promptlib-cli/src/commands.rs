//! Command handlers.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use promptlib::filler::{Fill, FillMut, MapFiller};
use promptlib::library::PromptLibrary;
use promptlib::prompt::{extract_placeholders, PartialPrompt, Prompt, PromptTemplate};
use promptlib::sink::{ClipboardSink, FileSink, OutputSink, StdoutSink};
use promptlib::utils::token::tiktoken::Tiktoken;

use crate::cli::{Commands, ContentArgs, FillArgs};
use crate::config::Config;
use crate::interactive::InteractiveFiller;

pub struct AppContext {
    pub config: Config,
    pub library_path: PathBuf,
}

pub fn dispatch(command: Commands, ctx: &AppContext) -> Result<()> {
    match command {
        Commands::List { category, search } => handle_list(ctx, category.as_deref(), search.as_deref()),
        Commands::Categories => handle_categories(ctx),
        Commands::Show { title } => handle_show(ctx, &title),
        Commands::Add { title, category, content } => handle_add(ctx, title, category, &content),
        Commands::Edit { title, new_title, category, content } => handle_edit(ctx, &title, new_title, category, &content),
        Commands::Remove { title } => handle_remove(ctx, &title),
        Commands::Init => handle_init(ctx),
        Commands::Fill { title, fill, no_interactive, tokens, output, stdout } => {
            let library = open_library(ctx)?;
            let prompt = find(&library, &title)?;
            let mut sink: Box<dyn OutputSink> = match (output, stdout) {
                (Some(path), _) => Box::new(FileSink::new(path)),
                (None, true) => Box::new(StdoutSink),
                (None, false) => Box::new(clipboard_sink(&ctx.config)?),
            };
            let mode = fill_mode(no_interactive, io::stdin().is_terminal(), io::stderr().is_terminal());
            if !no_interactive && mode == FillMode::FromArgs {
                warn!("stdin or stderr is not a terminal, filling only from --set");
            }
            handle_fill(ctx, prompt, &fill, mode, tokens, sink.as_mut())
        }
        Commands::Render { content, fill } => {
            let template = match read_content(&content)? {
                Some(template) => template,
                None => {
                    let mut template = String::new();
                    io::stdin().read_to_string(&mut template).context("cannot read template from stdin")?;
                    template
                }
            };
            let filled = fill_from_args(&PromptTemplate::new(template), &fill)?;
            StdoutSink.send(&filled)?;
            Ok(())
        }
    }
}

fn open_library(ctx: &AppContext) -> Result<PromptLibrary> {
    Ok(PromptLibrary::open(&ctx.library_path)?)
}

fn find<'a>(library: &'a PromptLibrary, title: &str) -> Result<&'a Prompt> {
    library.get(title).with_context(|| {
        format!("no prompt titled {:?} in {}, see `promptlib list`", title, library_display(library))
    })
}

fn library_display(library: &PromptLibrary) -> String {
    library.path().map_or_else(|| "the library".to_string(), |p| p.display().to_string())
}

fn read_content(content: &ContentArgs) -> Result<Option<String>> {
    if let Some(text) = &content.content {
        return Ok(Some(text.clone()));
    }
    match &content.file {
        Some(path) => std::fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("cannot read template file {}", path.display())),
        None => Ok(None),
    }
}

fn clipboard_sink(config: &Config) -> Result<ClipboardSink> {
    match &config.clipboard_command {
        Some(command) => ClipboardSink::with_command(command)
            .with_context(|| format!("invalid clipboard_command {:?}", command)),
        None => Ok(ClipboardSink::default()),
    }
}

fn handle_list(ctx: &AppContext, category: Option<&str>, search: Option<&str>) -> Result<()> {
    let library = open_library(ctx)?;
    let prompts: Vec<&Prompt> = match search {
        Some(query) => library.search(query).collect(),
        None => library.prompts().iter().collect(),
    };
    let prompts: Vec<&Prompt> = prompts.into_iter()
        .filter(|p| category.map_or(true, |c| p.category == c))
        .collect();
    if prompts.is_empty() {
        println!("No prompts found.");
        if library.is_empty() {
            println!("Run `promptlib init` for starter prompts or `promptlib add` to create one.");
        }
        return Ok(());
    }
    for prompt in prompts {
        println!("{}", list_line(prompt));
    }
    Ok(())
}

fn list_line(prompt: &Prompt) -> String {
    let placeholders = extract_placeholders(&prompt.content).len();
    format!("[{}] {} ({} placeholder{})", prompt.category, prompt.title, placeholders, if placeholders == 1 { "" } else { "s" })
}

fn handle_categories(ctx: &AppContext) -> Result<()> {
    let library = open_library(ctx)?;
    for category in library.categories() {
        println!("{} ({})", category, library.by_category(category).count());
    }
    Ok(())
}

fn handle_show(ctx: &AppContext, title: &str) -> Result<()> {
    let library = open_library(ctx)?;
    let prompt = find(&library, title)?;
    let template = prompt.template();
    println!("Title:    {}", prompt.title);
    println!("Category: {}", prompt.category);
    println!("Placeholders: {}", format_placeholders(&template.placeholders));
    println!();
    println!("{}", template.str());
    Ok(())
}

fn format_placeholders(placeholders: &[String]) -> String {
    if placeholders.is_empty() {
        return "(none)".to_string();
    }
    placeholders.iter()
        .map(|p| format!("{{{}}}", p))
        .collect::<Vec<_>>()
        .join(", ")
}

fn handle_add(ctx: &AppContext, title: String, category: String, content: &ContentArgs) -> Result<()> {
    let Some(content) = read_content(content)? else {
        bail!("a prompt needs a template, pass --content or --file");
    };
    let mut library = open_library(ctx)?;
    let prompt = Prompt::new(title, category, content);
    let placeholders = prompt.template().placeholders.len();
    let title = prompt.title.clone();
    library.add(prompt)?;
    library.save()?;
    println!("Added {:?} with {} placeholder(s).", title, placeholders);
    Ok(())
}

fn handle_edit(ctx: &AppContext,
               title: &str,
               new_title: Option<String>,
               category: Option<String>,
               content: &ContentArgs) -> Result<()> {
    let mut library = open_library(ctx)?;
    let mut prompt = find(&library, title)?.clone();
    if let Some(new_title) = new_title {
        prompt.title = new_title;
    }
    if let Some(category) = category {
        prompt.category = category;
    }
    if let Some(content) = read_content(content)? {
        prompt.content = content;
    }
    let updated_title = prompt.title.clone();
    library.update(title, prompt)?;
    library.save()?;
    println!("Saved {:?}.", updated_title);
    Ok(())
}

fn handle_remove(ctx: &AppContext, title: &str) -> Result<()> {
    let mut library = open_library(ctx)?;
    let removed = library.remove(title)?;
    library.save()?;
    println!("Removed {:?}.", removed.title);
    Ok(())
}

fn handle_init(ctx: &AppContext) -> Result<()> {
    let mut library = open_library(ctx)?;
    if !library.is_empty() {
        println!("{} already has {} prompt(s), nothing to do.", library_display(&library), library.len());
        return Ok(());
    }
    for prompt in PromptLibrary::with_defaults().prompts() {
        library.add(prompt.clone())?;
    }
    library.save()?;
    println!("Added {} starter prompts to {}.", library.len(), library_display(&library));
    Ok(())
}

/// Fill a template from `--set` values only.
fn fill_from_args(template: &PromptTemplate, fill: &FillArgs) -> Result<String> {
    let mut partial_prompt = template.construct_prompt();
    MapFiller::from_assignments(&fill.set)?.fill(&mut partial_prompt)?;
    finish(&partial_prompt, fill.strict)
}

fn finish(partial_prompt: &PartialPrompt, strict: bool) -> Result<String> {
    if strict {
        return Ok(partial_prompt.complete()?);
    }
    let unfilled = partial_prompt.unfilled_placeholders();
    if !unfilled.is_empty() {
        debug!("unfilled placeholders: {:?}", unfilled);
    }
    Ok(partial_prompt.render())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillMode {
    /// Only `--set` values.
    FromArgs,
    /// Ask for every placeholder. Questions and the preview are drawn on stderr, so stdout stays clean for the
    /// filled prompt even when it is redirected.
    Prompted,
}

fn fill_mode(no_interactive: bool, stdin_is_terminal: bool, stderr_is_terminal: bool) -> FillMode {
    if !no_interactive && stdin_is_terminal && stderr_is_terminal {
        FillMode::Prompted
    } else {
        FillMode::FromArgs
    }
}

fn handle_fill(ctx: &AppContext,
               prompt: &Prompt,
               fill: &FillArgs,
               mode: FillMode,
               tokens: bool,
               sink: &mut dyn OutputSink) -> Result<()> {
    let template = prompt.template();
    let mut partial_prompt = template.construct_prompt();
    MapFiller::from_assignments(&fill.set)?.fill(&mut partial_prompt)?;
    if mode == FillMode::Prompted {
        eprintln!("{}", prompt.title);
        InteractiveFiller::new(template.placeholders.clone()).fill_mut(&mut partial_prompt)?;
    }
    let filled = finish(&partial_prompt, fill.strict)?;

    deliver(&filled, sink);

    if tokens {
        match token_report(ctx.config.token_model(), &partial_prompt) {
            Ok(report) => eprintln!("{}", report),
            Err(e) => warn!("cannot count tokens: {:#}", e),
        }
    }
    Ok(())
}

fn token_report(model: &str, partial_prompt: &PartialPrompt) -> Result<String> {
    let counter = Tiktoken::new(model)?;
    Ok(format!("{} tokens ({} context)", partial_prompt.current_token_num(&counter), counter.max_tokens()))
}

/// Hand the filled prompt to the sink. A failing sink is not fatal: the prompt is printed instead so it's not lost.
fn deliver(filled: &str, sink: &mut dyn OutputSink) {
    match sink.send(filled) {
        Ok(()) => {
            let message = sink.describe();
            if !message.is_empty() {
                eprintln!("{}", message);
            }
        }
        Err(e) => {
            warn!("{}", e);
            eprintln!("Could not deliver the prompt ({}), here it is:", e);
            if let Err(e) = StdoutSink.send(filled) {
                warn!("{}", e);
            }
        }
    }
}

pub fn resolve_library_path(config: &Config, flag: Option<&Path>) -> Result<PathBuf> {
    let path = config.library_path(flag)?;
    debug!("using prompt library {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlib::sink::SinkError;
    use tempfile::TempDir;

    struct BrokenSink;

    impl OutputSink for BrokenSink {
        fn send(&mut self, _text: &str) -> Result<(), SinkError> {
            Err(SinkError::NoClipboardProgram(vec!["nothing".to_string()]))
        }

        fn describe(&self) -> String {
            "unused".to_string()
        }
    }

    fn context(dir: &TempDir) -> AppContext {
        AppContext {
            config: Config::default(),
            library_path: dir.path().join("library.json"),
        }
    }

    fn fill_args(set: &[&str], strict: bool) -> FillArgs {
        FillArgs {
            set: set.iter().map(|s| s.to_string()).collect(),
            strict,
        }
    }

    #[test]
    fn add_edit_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let content = ContentArgs { content: Some("Write to {client}.".to_string()), file: None };
        handle_add(&ctx, "Outreach".to_string(), "Sales".to_string(), &content).unwrap();
        assert!(handle_add(&ctx, "Outreach".to_string(), "Sales".to_string(), &content).is_err());

        let new_content = ContentArgs { content: Some("Write to {client} about {goal}.".to_string()), file: None };
        handle_edit(&ctx, "Outreach", Some("Cold outreach".to_string()), None, &new_content).unwrap();
        let library = PromptLibrary::open(&ctx.library_path).unwrap();
        let prompt = library.get("Cold outreach").unwrap();
        assert_eq!(prompt.category, "Sales");
        assert_eq!(prompt.content, "Write to {client} about {goal}.");

        handle_remove(&ctx, "Cold outreach").unwrap();
        assert!(PromptLibrary::open(&ctx.library_path).unwrap().is_empty());
        assert!(handle_remove(&ctx, "Cold outreach").is_err());
    }

    #[test]
    fn add_requires_content() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        assert!(handle_add(&ctx, "t".to_string(), "c".to_string(), &ContentArgs::default()).is_err());
    }

    #[test]
    fn add_reads_template_file() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let file = dir.path().join("template.txt");
        std::fs::write(&file, "Dear {name},\n").unwrap();
        handle_add(&ctx, "Letter".to_string(), "Mail".to_string(), &ContentArgs { content: None, file: Some(file) }).unwrap();
        let library = PromptLibrary::open(&ctx.library_path).unwrap();
        assert_eq!(library.get("Letter").unwrap().content, "Dear {name},\n");
    }

    #[test]
    fn init_seeds_only_empty_library() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        handle_init(&ctx).unwrap();
        let seeded = PromptLibrary::open(&ctx.library_path).unwrap().len();
        assert!(seeded > 0);
        handle_init(&ctx).unwrap();
        assert_eq!(PromptLibrary::open(&ctx.library_path).unwrap().len(), seeded);
    }

    #[test]
    fn fill_writes_to_sink() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let prompt = Prompt::new("Email", "Sales", "Write a {tone} email to {client} about {goal}.");
        let out = dir.path().join("out.txt");
        let mut sink = FileSink::new(&out);
        handle_fill(&ctx, &prompt, &fill_args(&["tone=friendly", "client=Acme"], false), FillMode::FromArgs, false, &mut sink).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "Write a friendly email to Acme about {goal}.");
    }

    #[test]
    fn strict_fill_fails_on_unfilled() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let prompt = Prompt::new("Email", "Sales", "Write to {client} about {goal}.");
        let out = dir.path().join("out.txt");
        let mut sink = FileSink::new(&out);
        assert!(handle_fill(&ctx, &prompt, &fill_args(&["client=Acme"], true), FillMode::FromArgs, false, &mut sink).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn failing_sink_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let prompt = Prompt::new("Email", "Sales", "Hi {name}");
        handle_fill(&ctx, &prompt, &fill_args(&["name=Al"], false), FillMode::FromArgs, false, &mut BrokenSink).unwrap();
    }

    #[test]
    fn bad_token_model_still_delivers() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        ctx.config.token_model = Some("not-a-model".to_string());
        let prompt = Prompt::new("Email", "Sales", "Hi {name}");
        let out = dir.path().join("out.txt");
        let mut sink = FileSink::new(&out);
        handle_fill(&ctx, &prompt, &fill_args(&["name=Al"], false), FillMode::FromArgs, true, &mut sink).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "Hi Al");
        assert!(token_report("not-a-model", &PromptTemplate::new("x").construct_prompt()).is_err());
    }

    #[test]
    fn prompting_needs_terminal_stdin_and_stderr() {
        assert_eq!(fill_mode(false, true, true), FillMode::Prompted);
        assert_eq!(fill_mode(true, true, true), FillMode::FromArgs);
        assert_eq!(fill_mode(false, false, true), FillMode::FromArgs);
        assert_eq!(fill_mode(false, true, false), FillMode::FromArgs);
    }

    #[test]
    fn render_from_args() {
        let template = PromptTemplate::new("{x} and {x} again, {y}");
        assert_eq!(fill_from_args(&template, &fill_args(&["x=cats"], false)).unwrap(), "cats and cats again, {y}");
        assert!(fill_from_args(&template, &fill_args(&["x=cats"], true)).is_err());
        assert!(fill_from_args(&template, &fill_args(&["broken"], false)).is_err());
    }

    #[test]
    fn formatting_helpers() {
        assert_eq!(format_placeholders(&[]), "(none)");
        assert_eq!(format_placeholders(&["a".to_string(), "".to_string()]), "{a}, {}");
        assert_eq!(list_line(&Prompt::new("T", "C", "{a} {b} {a}")), "[C] T (2 placeholders)");
        assert_eq!(list_line(&Prompt::new("T", "C", "{a}")), "[C] T (1 placeholder)");
    }
}
