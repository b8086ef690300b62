use std::fmt::{self, Display, Formatter};

/// The location in the source code where a token or error was found.  Used throughout the engine
/// for error reporting and call-stack display.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    /// The path to the file, or a description such as `<repl>` or `<evaluate>`.
    path: String,

    /// The 1-based line number.
    line: usize,

    /// The 1-based column number.
    column: usize,
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} ({}, {})", self.path, self.line, self.column)
    }
}

impl SourceLocation {
    pub fn new(path: &str, line: usize, column: usize) -> SourceLocation {
        SourceLocation {
            path: path.to_string(),
            line,
            column,
        }
    }

    pub fn new_from_path(path: &str) -> SourceLocation {
        SourceLocation::new(path, 1, 1)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}
