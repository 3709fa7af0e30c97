//! Terminal preview of a prompt that is being filled.
//!
//! [AnchoredMarkdownPrinter] repaints its output on stderr below a fixed cursor anchor, clearing whatever it painted
//! before. Stdout is left alone so it can carry the filled prompt.
//! [PromptPreview] keeps the last rendering of a [PartialPrompt] and repaints only when it changed. The prompt itself
//! is printed verbatim; only the header and the list of unfilled placeholders go through markdown.

use std::io::{self, stderr, Write};
use termimad::crossterm::{cursor, terminal, ExecutableCommand};
use termimad::crossterm::terminal::Clear;
use termimad::crossterm::terminal::ClearType::FromCursorDown;
use termimad::{FmtText, MadSkin};
use crate::prompt::PartialPrompt;

struct RenderedPreview {
    text: String,
    rows: usize,
}

impl RenderedPreview {
    fn markdown(skin: &MadSkin, markdown: &str, wrap_width: Option<usize>) -> Self {
        let fmt_text = FmtText::from(skin, markdown, wrap_width);
        Self {
            text: format!("{}", fmt_text),
            rows: fmt_text.lines.len(),
        }
    }

    /// Plain text, with the rows it takes once the terminal wraps it at `width` columns.
    fn verbatim(text: &str, width: Option<usize>) -> Self {
        let mut text = text.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        let rows = text.lines()
            .map(|line| match width {
                Some(width) if width > 0 => line.chars().count().max(1).div_ceil(width),
                _ => 1,
            })
            .sum();
        Self { text, rows }
    }

    fn append(&mut self, other: RenderedPreview) {
        self.text.push_str(&other.text);
        self.rows += other.rows;
    }
}

pub struct AnchoredMarkdownPrinter {
    pub skin: MadSkin,
    pub wrap_width: Option<usize>,
    cursor_anchor: Option<(u16, u16)>,
}

impl Default for AnchoredMarkdownPrinter {
    fn default() -> Self {
        Self {
            skin: MadSkin::default(),
            wrap_width: None,
            cursor_anchor: None,
        }
    }
}

impl AnchoredMarkdownPrinter {
    pub fn activated(&self) -> bool {
        self.cursor_anchor.is_some()
    }

    /// Anchor at the current cursor position.
    pub fn activate(&mut self) -> io::Result<()> {
        self.cursor_anchor = Some(cursor::position()?);
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.cursor_anchor = None;
    }

    /// Clear everything painted since the anchor and leave the cursor there.
    pub fn clear(&mut self) -> io::Result<()> {
        if let Some((column, row)) = self.cursor_anchor {
            stderr()
                .execute(cursor::MoveTo(column, row))?
                .execute(Clear(FromCursorDown))?;
        }
        Ok(())
    }

    pub fn print(&mut self, markdown: &str) -> io::Result<()> {
        let rendered = RenderedPreview::markdown(&self.skin, markdown, self.wrap_width);
        self.print_rendered(&rendered)
    }

    fn print_rendered(&mut self, rendered: &RenderedPreview) -> io::Result<()> {
        if !self.activated() {
            self.activate()?;
        }
        self.clear()?;
        let mut err = stderr().lock();
        err.write_all(rendered.text.as_bytes())?;
        err.flush()?;
        // the cursor position is relative to the terminal not the screen/history, so the anchor drifts up when the output scrolls.
        let rows = u16::try_from(rendered.rows).unwrap_or(u16::MAX);
        let (_, row) = cursor::position()?;
        self.cursor_anchor = Some((0, row.saturating_sub(rows)));
        Ok(())
    }
}

#[derive(Default)]
pub struct PromptPreview {
    pub anchored_printer: AnchoredMarkdownPrinter,
    rendered_prompt: String,
    rendered_cache: Option<RenderedPreview>,
}

impl PromptPreview {
    /// Render the partial prompt again. The preview is rebuilt only if the prompt text changed.
    pub fn update(&mut self, partial_prompt: &PartialPrompt) {
        let rendered_prompt = partial_prompt.render();
        if self.rendered_cache.is_none() || rendered_prompt != self.rendered_prompt {
            let width = self.anchored_printer.wrap_width
                .or_else(|| terminal::size().ok().map(|(columns, _)| columns as usize));
            let rendered = compose_preview(&self.anchored_printer.skin,
                                           width,
                                           &rendered_prompt,
                                           &partial_prompt.unfilled_placeholders());
            self.rendered_cache = Some(rendered);
            self.rendered_prompt = rendered_prompt;
        }
    }

    pub fn print(&mut self) -> io::Result<()> {
        if let Some(rendered) = &self.rendered_cache {
            self.anchored_printer.print_rendered(rendered)?;
        }
        Ok(())
    }

    pub fn update_and_print(&mut self, partial_prompt: &PartialPrompt) -> io::Result<()> {
        self.update(partial_prompt);
        self.print()
    }

    /// Remove the preview from the terminal.
    pub fn close(&mut self) -> io::Result<()> {
        self.anchored_printer.clear()?;
        self.anchored_printer.deactivate();
        Ok(())
    }
}

fn compose_preview(skin: &MadSkin, width: Option<usize>, rendered_prompt: &str, unfilled: &[&str]) -> RenderedPreview {
    let mut preview = RenderedPreview::markdown(skin, "## Preview\n", width);
    preview.append(RenderedPreview::verbatim(rendered_prompt, width));
    preview.append(RenderedPreview::markdown(skin, &unfilled_markdown(unfilled), width));
    preview
}

fn unfilled_markdown(unfilled: &[&str]) -> String {
    if unfilled.is_empty() {
        "*All placeholders filled.*\n".to_string()
    } else {
        format!("*Unfilled:* {}\n", unfilled.iter()
            .map(|p| format!("`{{{}}}`", p))
            .collect::<Vec<_>>()
            .join(", "))
    }
}

#[cfg(test)]
mod test_printing {
    use super::{compose_preview, unfilled_markdown, RenderedPreview};
    use termimad::MadSkin;

    #[test]
    fn test_unfilled_markdown() {
        assert_eq!(unfilled_markdown(&["name", "goal"]), "*Unfilled:* `{name}`, `{goal}`\n");
        assert!(unfilled_markdown(&[]).contains("All placeholders filled"));
    }

    #[test]
    fn test_prompt_is_shown_verbatim() {
        let prompt = "# Use *caps* for {x}\n- item with `code`\n> quoted | piped";
        let preview = compose_preview(&MadSkin::default(), Some(80), prompt, &["x"]);
        assert!(preview.text.contains(prompt));
    }

    #[test]
    fn test_verbatim_rows() {
        assert_eq!(RenderedPreview::verbatim("one\ntwo", Some(80)).rows, 2);
        assert_eq!(RenderedPreview::verbatim("", Some(80)).rows, 1);
        assert_eq!(RenderedPreview::verbatim("abcdefghij", Some(4)).rows, 3);
        assert_eq!(RenderedPreview::verbatim("one\n\nthree", None).rows, 3);
    }
}
