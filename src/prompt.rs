//! Interactive console prompts.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Answers accepted as "yes", compared after lowercasing.
pub const YES_ANSWERS: &[&str] = &["y", "yes", "д", "да"];

/// Answers accepted as "no", compared after lowercasing.
pub const NO_ANSWERS: &[&str] = &["n", "no", "н", "нет"];

/// Parse a folder path typed or pasted by the user. Surrounding whitespace
/// and double quotes (as added by Explorer's "Copy as path") are stripped.
pub fn parse_root_path(line: &str) -> Option<PathBuf> {
    let path = line.trim().trim_matches('"');
    if path.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Parse a yes/no answer; anything unrecognised yields `default`.
pub fn parse_yes_no(line: &str, default: bool) -> bool {
    let answer = line.trim().to_lowercase();
    if YES_ANSWERS.contains(&answer.as_str()) {
        true
    } else if NO_ANSWERS.contains(&answer.as_str()) {
        false
    } else {
        default
    }
}

/// Question/answer loop over any reader and writer.
#[derive(Debug)]
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Create a prompter over an input and an output stream.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one line. End of input reads as empty.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }

    /// Ask for a folder; `None` when the answer is blank.
    pub fn ask_path(&mut self, question: &str) -> io::Result<Option<PathBuf>> {
        Ok(parse_root_path(&self.ask(question)?))
    }

    /// Ask a yes/no question, falling back to `default`.
    pub fn ask_yes_no(&mut self, question: &str, default: bool) -> io::Result<bool> {
        Ok(parse_yes_no(&self.ask(question)?, default))
    }

    /// Print `message` and wait for Enter.
    pub fn pause(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }

    /// The output stream.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consume the prompter and return the output stream.
    pub fn into_output(self) -> W {
        self.output
    }
}
