use colored::Colorize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// How a console line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading,
    Success,
    Warning,
    Error,
}

/// Destination for everything the user sees on the terminal.
///
/// The runner relays live scan output through it and the reporter renders
/// results through it, so both can be exercised without a real terminal.
pub trait ConsoleSink: Send + Sync {
    fn emit(&self, tone: Tone, text: &str);

    fn line(&self, text: &str) {
        self.emit(Tone::Plain, text);
    }

    fn warn(&self, text: &str) {
        self.emit(Tone::Warning, text);
    }

    fn error(&self, text: &str) {
        self.emit(Tone::Error, text);
    }
}

pub type SharedSink = Arc<dyn ConsoleSink>;

/// Writes to stdout, colouring non-plain tones.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

impl ConsoleSink for TerminalSink {
    fn emit(&self, tone: Tone, text: &str) {
        let rendered = match tone {
            Tone::Plain => text.normal(),
            Tone::Heading => text.cyan().bold(),
            Tone::Success => text.green(),
            Tone::Warning => text.yellow(),
            Tone::Error => text.red(),
        };
        // A closed stdout (e.g. piped into `head`) must not abort the scan.
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{rendered}");
        let _ = out.flush();
    }
}

/// Keeps every emitted line in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(Tone, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Tone, String)> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Text of all lines with the given tone, in emission order.
    pub fn with_tone(&self, tone: Tone) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(t, _)| *t == tone)
            .map(|(_, s)| s)
            .collect()
    }

    /// All lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines()
            .into_iter()
            .map(|(_, s)| s)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ConsoleSink for RecordingSink {
    fn emit(&self, tone: Tone, text: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((tone, text.to_string()));
    }
}
