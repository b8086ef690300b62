//! Parser and input stack.
//!
//! Tokens are drawn from the top of a stack of input sources.  Each frame owns one line of text
//! at a time plus a scan position into it; `refill` pulls the next line from the frame's
//! underlying source (a file, or the terminal).  `word`/`parse` never look across a `refill` on
//! their own — running off the end of the current line just means there is no more text until
//! something calls `refill` again.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
};

use crate::{
    lang::source_buffer::SourceLocation,
    runtime::error::{self, err, ErrorKind},
};

/// Input sources stack at least this deep.
pub const MAX_FILES: usize = 16;

fn is_fifth_whitespace(c: u8) -> bool {
    c == b' ' || c <= 0x20
}

enum Source {
    /// The terminal (or, for batch processing, standard input is never touched — lines are
    /// supplied directly via `feed_line`/`feed_eof`).
    Terminal,
    File(BufReader<File>),
}

/// One frame of the input stack: a buffered line of text plus the scan cursor into it.
struct Frame {
    source: Source,
    path: String,
    text: String,
    pos: usize,
    line_number: usize,
}

impl Frame {
    fn new(source: Source, path: String) -> Frame {
        Frame {
            source,
            path,
            text: String::new(),
            pos: 0,
            line_number: 0,
        }
    }

    fn location(&self) -> SourceLocation {
        let column = self.text[..self.pos.min(self.text.len())].chars().count() + 1;
        SourceLocation::new(&self.path, self.line_number.max(1), column)
    }

    fn remaining(&self) -> &str {
        &self.text[self.pos.min(self.text.len())..]
    }
}

/// The stack of input sources.  `frames[0]` is always present and is the root (terminal) frame;
/// `REQUIRE`/`INCLUDE` push additional frames, which are popped on EOF or on an abort that flushes
/// the stack back to the root.
pub struct InputStack {
    frames: Vec<Frame>,
    required: Vec<String>,
}

impl InputStack {
    pub fn new() -> InputStack {
        InputStack {
            frames: vec![Frame::new(Source::Terminal, "<terminal>".to_string())],
            required: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_at_root(&self) -> bool {
        self.frames.len() == 1
    }

    pub fn current_location(&self) -> SourceLocation {
        self.frames.last().expect("input stack is never empty").location()
    }

    /// Feed a line of text directly into the root frame.  Used by a REPL host or by `-e`/file
    /// processing that wants to hand the engine text without a backing `File`.
    pub fn feed_line(&mut self, path: &str, line: &str) {
        let frame = self.frames.first_mut().expect("input stack is never empty");
        frame.path = path.to_string();
        frame.text = line.to_string();
        frame.pos = 0;
        frame.line_number += 1;
    }

    /// Push a new file frame onto the stack.  Fails with `IOError` if the file cannot be opened,
    /// or a compile mismatch if the stack is already at its maximum depth.
    pub fn push_file(&mut self, path: &str) -> error::Result<()> {
        if self.frames.len() >= MAX_FILES {
            return err(ErrorKind::IOError, "Input stack depth exceeded.");
        }

        let file = File::open(path)?;
        self.frames.push(Frame::new(Source::File(BufReader::new(file)), path.to_string()));
        Ok(())
    }

    /// Push a frame over an in-memory string (`EVALUATE`, `-e CODE`).
    pub fn push_string(&mut self, tag: &str, source: &str) {
        let mut frame = Frame::new(Source::Terminal, tag.to_string());
        frame.text = source.to_string();
        frame.line_number = 1;
        self.frames.push(frame);
    }

    /// Pop the current source.  The parent frame's scan state is untouched — it was never
    /// modified while this frame was on top.
    pub fn pop_source(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Pop every frame down to the root (used by `ABORT` recovery).
    pub fn flush_to_root(&mut self) {
        self.frames.truncate(1);
    }

    /// Replace the current frame's buffer with its source's next line.  Returns `false` only when
    /// the *root* (terminal) frame has no more text — non-root frames instead pop themselves and
    /// report success by trying the parent, mirroring how `word()` transparently walks back up the
    /// input stack at end of file.
    pub fn refill(&mut self) -> error::Result<bool> {
        loop {
            let is_root = self.frames.len() == 1;
            let frame = self.frames.last_mut().expect("input stack is never empty");

            match &mut frame.source {
                Source::Terminal => {
                    // Terminal frames (and pushed strings) are fed in whole; once their one
                    // buffer is consumed there is nothing further to refill on their own. A root
                    // terminal frame relies on a host calling `feed_line` again; a pushed string
                    // frame is simply done, and `word()`'s caller pops back to its parent.
                    let _ = is_root;
                    frame.pos = frame.text.len();
                    return Ok(false);
                }

                Source::File(reader) => {
                    let mut line = String::new();
                    let bytes_read = reader.read_line(&mut line)?;

                    if bytes_read == 0 {
                        if is_root {
                            return Ok(false);
                        }

                        self.frames.pop();
                        continue;
                    }

                    frame.text = line;
                    frame.pos = 0;
                    frame.line_number += 1;
                    return Ok(true);
                }
            }
        }
    }

    /// Skip whitespace, read up to the next whitespace.  Returns `(text, location)`; `text` is
    /// empty only once every input source, including the root, is exhausted.
    pub fn word(&mut self) -> error::Result<(String, SourceLocation)> {
        loop {
            {
                let frame = self.frames.last_mut().expect("input stack is never empty");
                let bytes = frame.text.as_bytes();
                let mut i = frame.pos;

                while i < bytes.len() && is_fifth_whitespace(bytes[i]) {
                    i += 1;
                }

                if i < bytes.len() {
                    let start = i;
                    while i < bytes.len() && !is_fifth_whitespace(bytes[i]) {
                        i += 1;
                    }

                    let location = {
                        frame.pos = start;
                        frame.location()
                    };
                    let text = frame.text[start..i].to_string();
                    frame.pos = i;

                    return Ok((text, location));
                }
            }

            // Current frame is out of text.  Try to pull more; if that fails and we are not at
            // the root, drop back to the parent frame and keep scanning there.
            if !self.refill()? {
                if self.frames.len() > 1 {
                    self.frames.pop();
                    continue;
                }

                let location = self.current_location();
                return Ok((String::new(), location));
            }
        }
    }

    /// `\`: discard the rest of the current line.  Does not refill -- the next `word()` call
    /// naturally pulls a fresh line once this one reports empty.
    pub fn skip_to_eol(&mut self) {
        let frame = self.frames.last_mut().expect("input stack is never empty");
        frame.pos = frame.text.len();
    }

    /// Copy characters up to (but not including) `delim` from the current buffer, advancing the
    /// scan pointer past the delimiter.  Does not refill across lines.
    pub fn parse(&mut self, delim: u8) -> (String, SourceLocation) {
        let frame = self.frames.last_mut().expect("input stack is never empty");
        let location = frame.location();
        let bytes = frame.text.as_bytes();
        let start = frame.pos;
        let mut i = start;

        while i < bytes.len() && bytes[i] != delim {
            i += 1;
        }

        let text = frame.text[start..i].to_string();
        frame.pos = if i < bytes.len() { i + 1 } else { i };

        (text, location)
    }

    /// Has `path` (its canonical form) already been required?
    pub fn is_required(&self, canonical_path: &str) -> bool {
        self.required.iter().any(|p| p == canonical_path)
    }

    pub fn mark_required(&mut self, canonical_path: String) {
        self.required.push(canonical_path);
    }
}

impl Default for InputStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a whole file into a string.  Used by `SLURP-FILE`.
pub fn slurp(path: &str) -> io::Result<Vec<u8>> {
    std::fs::read(path)
}

/// Flush stdout; used after prompts in the REPL loop.
pub fn flush_stdout() {
    let _ = io::stdout().flush();
}
