//! The outer interpreter: word-at-a-time interpret/compile loop, number conversion, and the
//! `REQUIRE`/`INCLUDE`/`EVALUATE` entry points that drive it over a source.

use std::path::Path;

use crate::lang::numbers::{parse_number, Parsed};
use crate::lang::source_buffer::SourceLocation;
use crate::runtime::data_structures::dictionary::Xt;
use crate::runtime::error::{self, ErrorKind, ScriptError};
use crate::runtime::interpreter::Vm;

impl Vm {
    /// Interpret or compile a single token once it has already been looked up / failed lookup.
    /// `found` is `None` when the dictionary has no entry for `text`.
    fn dispatch_token(&mut self, text: &str, location: &SourceLocation, found: Option<Xt>) -> error::Result<()> {
        if let Some(xt) = found {
            let compiling_non_immediate =
                self.is_compiling() && !self.dictionary.get(xt).is_immediate();

            if compiling_non_immediate {
                self.compile_xt(xt)?;
            } else {
                self.execute_xt(xt)?;
            }
            return Ok(());
        }

        match parse_number(text, self.base()) {
            Some(Parsed::Int(value)) | Some(Parsed::Char(value)) => {
                if self.is_compiling() {
                    let lit = self.cached().lit;
                    self.compile_xt(lit)?;
                    self.compile_cell(value)?;
                } else {
                    self.push(value)?;
                }
                Ok(())
            }

            None => self.fault_at(
                ErrorKind::UnknownWord,
                location.clone(),
                format!("'{}' is not a word or a number.", text),
            ),
        }
    }

    /// Run the outer loop over whatever is on top of the input stack until that source is
    /// exhausted.  A non-interactive caller (file processing, `-e`, `EVALUATE`) calls
    /// this once per pushed source; an interactive REPL calls it once per fed line and expects it
    /// to return after the line's tokens run out (`word()` returning empty at end of line).
    pub fn interpret_current_source(&mut self) -> error::Result<()> {
        loop {
            let (text, location) = self.input.word()?;

            if text.is_empty() {
                return Ok(());
            }

            let found = self.dictionary.find(&text);
            if let Err(error) = self.dispatch_token(&text, &location, found) {
                return Err(error);
            }

            if self.exit_code.is_some() {
                return Ok(());
            }
        }
    }

    /// Interpret one line of text fed directly (the REPL's per-line driver, or a one-off `-e`
    /// argument before any file sources are pushed).
    pub fn interpret_line(&mut self, tag: &str, line: &str) -> error::Result<()> {
        self.input.feed_line(tag, line);
        self.interpret_current_source()
    }

    /// `EVALUATE`: push a transient string source, interpret it fully, then pop it back off.
    /// No implicit trailing whitespace is appended; the tokenizer does not require a delimiter
    /// after the final word to recognize it.
    pub fn evaluate_string(&mut self, text: &str) -> error::Result<()> {
        self.input.push_string("<evaluate>", text);
        let result = self.interpret_current_source();
        self.input.pop_source();
        result
    }

    /// Run a whole file: push it as an input source and interpret until it (and anything it in
    /// turn requires) drains back out.
    pub fn run_file(&mut self, path: &str) -> error::Result<()> {
        self.input.push_file(path)?;
        loop {
            self.interpret_current_source()?;
            if self.input.is_at_root() || self.exit_code.is_some() {
                break;
            }
            if !self.input.refill()? {
                break;
            }
        }
        Ok(())
    }

    /// `INCLUDE`: unconditionally load a file.
    pub fn include_file(&mut self, path: &str) -> error::Result<()> {
        self.run_file(path)
    }

    /// `REQUIRE`: load a file only if its canonical path has not already been loaded this VM
    /// lifetime; a second `REQUIRE` of the same path is a silent no-op.
    pub fn require_file(&mut self, path: &str) -> error::Result<()> {
        let canonical = canonicalize_best_effort(path);
        if self.input.is_required(&canonical) {
            return Ok(());
        }
        self.input.mark_required(canonical);
        self.run_file(path)
    }

    /// Report an error the way the REPL and batch runners do: one line to stderr, then recover.
    pub fn report_and_recover(&mut self, error: &ScriptError) {
        eprintln!("{}", error);
        self.recover_from_abort();
    }
}

fn canonicalize_best_effort(path: &str) -> String {
    Path::new(path)
        .canonicalize()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string())
}
