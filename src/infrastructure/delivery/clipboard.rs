//! Clipboard sinks.
//!
//! [`SystemClipboard`] pipes the content into the first platform clipboard
//! tool that accepts it. When none does, it falls back to an OSC 52 escape
//! sequence on the terminal, which most modern terminal emulators (and
//! tmux, over SSH) turn into a clipboard write.

use std::io::{self, Write};
use std::process::Stdio;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use console::Term;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::errors::DeliveryError;
use crate::domain::ports::ClipboardSink;

/// An external program that reads clipboard content from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCommand {
    /// Executable looked up on `PATH`
    pub program: String,
    /// Arguments passed ahead of the piped content
    pub args: Vec<String>,
}

impl ClipboardCommand {
    /// Build a command from borrowed parts.
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    async fn pipe(&self, content: &str) -> io::Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "no stdin handle"))?;
        stdin.write_all(content.as_bytes()).await?;
        drop(stdin);

        let status = child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("exited with {status}")))
        }
    }
}

/// Clipboard tools for the current platform, in preference order.
pub fn platform_commands() -> Vec<ClipboardCommand> {
    if cfg!(target_os = "macos") {
        vec![ClipboardCommand::new("pbcopy", &[])]
    } else if cfg!(windows) {
        vec![ClipboardCommand::new("clip.exe", &[])]
    } else {
        vec![
            ClipboardCommand::new("wl-copy", &[]),
            ClipboardCommand::new("xclip", &["-selection", "clipboard"]),
            ClipboardCommand::new("xsel", &["--clipboard", "--input"]),
            ClipboardCommand::new("clip.exe", &[]),
        ]
    }
}

/// Writes to the clipboard through an OSC 52 terminal escape sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    /// The escape sequence that sets the system clipboard to `content`.
    pub fn sequence(content: &str) -> String {
        format!("\x1b]52;c;{}\x07", STANDARD.encode(content))
    }
}

#[async_trait]
impl ClipboardSink for Osc52Clipboard {
    async fn write_clipboard(&self, content: &str) -> Result<(), DeliveryError> {
        let term = Term::stderr();
        if !term.is_term() {
            return Err(DeliveryError::ClipboardUnavailable(
                "stderr is not a terminal".to_string(),
            ));
        }

        let mut term = term;
        term.write_all(Self::sequence(content).as_bytes())
            .and_then(|()| term.flush())
            .map_err(|e| DeliveryError::ClipboardUnavailable(format!("terminal write failed: {e}")))?;
        info!(bytes = content.len(), "clipboard written via terminal escape");
        Ok(())
    }
}

/// Platform clipboard with a terminal fallback.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    commands: Vec<ClipboardCommand>,
    fallback: Option<Osc52Clipboard>,
}

impl SystemClipboard {
    /// Use the clipboard programs of the current platform, then OSC 52.
    pub fn new() -> Self {
        Self {
            commands: platform_commands(),
            fallback: Some(Osc52Clipboard),
        }
    }

    /// Use exactly these commands, with no terminal fallback.
    pub fn with_commands(commands: Vec<ClipboardCommand>) -> Self {
        Self {
            commands,
            fallback: None,
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClipboardSink for SystemClipboard {
    async fn write_clipboard(&self, content: &str) -> Result<(), DeliveryError> {
        let mut failures = Vec::new();
        for command in &self.commands {
            match command.pipe(content).await {
                Ok(()) => {
                    info!(program = %command.program, bytes = content.len(), "clipboard written");
                    return Ok(());
                }
                Err(e) => {
                    debug!(program = %command.program, error = %e, "clipboard tool failed");
                    failures.push(format!("{}: {e}", command.program));
                }
            }
        }

        if let Some(fallback) = self.fallback {
            warn!("no clipboard tool accepted the content, using terminal fallback");
            return fallback.write_clipboard(content).await;
        }

        Err(DeliveryError::ClipboardUnavailable(if failures.is_empty() {
            "no clipboard tool configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}
