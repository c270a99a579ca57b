//! Manual checkpoint between prompt generation and image generation.

use crate::error::Result;
use std::io::{BufRead, Write};

/// Outcome of the operator's review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    /// Proceed with generation.
    Approved,
    /// Stop without generating anything.
    Rejected,
}

impl ApprovalDecision {
    /// Interprets a typed answer. Only `y`/`yes` (any case) approve.
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Self::Approved,
            _ => Self::Rejected,
        }
    }

    /// Returns true if generation may proceed.
    pub fn is_approved(self) -> bool {
        self == Self::Approved
    }
}

/// Something that can approve or reject a combined prompt.
pub trait ApprovalGate {
    /// Shows the style summary and the final prompt, then blocks for a decision.
    fn review(&mut self, style_summary: &str, prompt: &str) -> Result<ApprovalDecision>;
}

/// Asks on a text console (stdin/stdout in the CLI, buffers in tests).
///
/// End of input counts as a rejection.
#[derive(Debug)]
pub struct ConsoleGate<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsoleGate<R, W> {
    /// Creates a gate reading answers from `reader` and writing to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Consumes the gate, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl ConsoleGate<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Gate bound to the process's standard input and output.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ApprovalGate for ConsoleGate<R, W> {
    fn review(&mut self, style_summary: &str, prompt: &str) -> Result<ApprovalDecision> {
        writeln!(self.writer, "Generated style description:\n")?;
        writeln!(self.writer, "{}", style_summary)?;
        writeln!(self.writer, "\nProposed prompt:\n")?;
        writeln!(self.writer, "{}", prompt)?;
        write!(self.writer, "\nProceed with this prompt? [y/N]: ")?;
        self.writer.flush()?;

        let mut answer = String::new();
        self.reader.read_line(&mut answer)?;
        let decision = ApprovalDecision::from_answer(&answer);
        tracing::debug!(?decision, "operator answered");
        Ok(decision)
    }
}
