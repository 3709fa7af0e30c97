//! # Sinks
//! Where a rendered prompt goes once it's done. An [OutputSink] only receives the final string; whether sending works
//! has no effect on the prompt it came from.

use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use log::debug;

#[derive(Debug)]
pub enum SinkError {
    /// None of the clipboard programs could be started.
    NoClipboardProgram(Vec<String>),
    Io(io::Error),
    CommandFailed { program: String, status: ExitStatus },
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::NoClipboardProgram(tried) => write!(f, "no clipboard program available, tried {}", tried.join(", ")),
            SinkError::Io(e) => write!(f, "cannot write output: {}", e),
            SinkError::CommandFailed { program, status } => write!(f, "{} exited with {}", program, status),
        }
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SinkError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(e: io::Error) -> Self {
        SinkError::Io(e)
    }
}

pub trait OutputSink {
    fn send(&mut self, text: &str) -> Result<(), SinkError>;

    /// What the user is told after a successful [OutputSink::send].
    fn describe(&self) -> String;
}

/// Copies text to the system clipboard by piping it into a clipboard program.
#[derive(Debug, Clone)]
pub struct ClipboardSink {
    commands: Vec<Vec<String>>,
}

impl Default for ClipboardSink {
    fn default() -> Self {
        Self { commands: default_clipboard_commands() }
    }
}

impl ClipboardSink {
    /// Use a single command line such as `xclip -selection clipboard` instead of guessing.
    pub fn with_command(command_line: &str) -> anyhow::Result<Self> {
        Self::with_commands([command_line])
    }

    /// Try these command lines in order until one of them copies the text.
    pub fn with_commands<I, S>(command_lines: I) -> anyhow::Result<Self>
        where I: IntoIterator<Item=S>,
              S: AsRef<str> {
        let mut commands = Vec::new();
        for command_line in command_lines {
            let command = shell_words::split(command_line.as_ref())?;
            if command.is_empty() {
                anyhow::bail!("clipboard command is empty");
            }
            commands.push(command);
        }
        if commands.is_empty() {
            anyhow::bail!("no clipboard command given");
        }
        Ok(Self { commands })
    }

    pub fn commands(&self) -> &[Vec<String>] {
        &self.commands
    }

    fn pipe_to(command: &[String], text: &str) -> Result<(), SinkError> {
        let (program, args) = command.split_first()
            .ok_or_else(|| SinkError::NoClipboardProgram(Vec::new()))?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        // stdin is dropped once written so the child sees EOF before it is waited on
        let written = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(text.as_bytes()) {
                // a program that exits early closes the pipe; its exit status is what gets reported
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            },
            None => Ok(()),
        };
        let status = child.wait()?;
        written?;
        if status.success() {
            Ok(())
        } else {
            Err(SinkError::CommandFailed { program: program.clone(), status })
        }
    }
}

impl OutputSink for ClipboardSink {
    /// Programs are tried in order. When none works, the last real failure is reported, or
    /// [SinkError::NoClipboardProgram] when none of them exists.
    fn send(&mut self, text: &str) -> Result<(), SinkError> {
        let mut last_failure = None;
        for command in &self.commands {
            match Self::pipe_to(command, text) {
                Ok(()) => {
                    debug!("copied {} bytes with {}", text.len(), command.join(" "));
                    return Ok(());
                }
                Err(SinkError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("clipboard program {} not found", command.join(" "));
                }
                Err(e) => {
                    debug!("clipboard program {} failed: {}", command.join(" "), e);
                    last_failure = Some(e);
                }
            }
        }
        Err(last_failure.unwrap_or_else(|| {
            SinkError::NoClipboardProgram(self.commands.iter().map(|c| c.join(" ")).collect())
        }))
    }

    fn describe(&self) -> String {
        "Prompt copied to clipboard!".to_string()
    }
}

fn default_clipboard_commands() -> Vec<Vec<String>> {
    let commands: &[&[&str]] = if cfg!(target_os = "macos") {
        &[&["pbcopy"]]
    } else if cfg!(windows) {
        &[&["clip"]]
    } else {
        &[
            &["wl-copy"],
            &["xclip", "-selection", "clipboard"],
            &["xsel", "--clipboard", "--input"],
        ]
    };
    commands.iter()
        .map(|c| c.iter().map(|s| s.to_string()).collect())
        .collect()
}

/// Writes text to stdout.
#[derive(Debug, Default, Clone)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn send(&mut self, text: &str) -> Result<(), SinkError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        String::new()
    }
}

/// Writes text to a file, replacing its content.
#[derive(Debug, Clone)]
pub struct FileSink {
    pub path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for FileSink {
    fn send(&mut self, text: &str) -> Result<(), SinkError> {
        fs::write(&self.path, text)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Prompt written to {}", self.path.display())
    }
}
