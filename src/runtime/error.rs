use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};

use crate::lang::source_buffer::SourceLocation;

pub type Result<T> = std::result::Result<T, ScriptError>;

/// The structured category of an error, independent of its message text.  Every failure mode
/// named in the engine's error handling design has a variant here so that host code embedding the
/// VM can match on the kind without parsing the diagnostic string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    StackFault,
    DataSpaceExhausted,
    DictionaryFull,
    NameTooLong,
    UnknownWord,
    CompileMismatch,
    NumberFormat,
    IOError,
    AlignmentFault,
    Abort,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::StackFault => "StackFault",
            ErrorKind::DataSpaceExhausted => "DataSpaceExhausted",
            ErrorKind::DictionaryFull => "DictionaryFull",
            ErrorKind::NameTooLong => "NameTooLong",
            ErrorKind::UnknownWord => "UnknownWord",
            ErrorKind::CompileMismatch => "CompileMismatch",
            ErrorKind::NumberFormat => "NumberFormat",
            ErrorKind::IOError => "IOError",
            ErrorKind::AlignmentFault => "AlignmentFault",
            ErrorKind::Abort => "Abort",
        };
        write!(f, "{}", name)
    }
}

/// A snapshot of the call stack at the moment an error was raised, newest frame last.
pub type CallStack = Vec<String>;

/// Any error that can occur while running a Fifth script.
#[derive(Clone)]
pub struct ScriptError {
    kind: ErrorKind,
    location: Option<SourceLocation>,
    message: String,
    call_stack: Option<CallStack>,
}

impl Error for ScriptError {}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", location, self.kind, self.message)?,
            None => write!(f, "{}: {}", self.kind, self.message)?,
        }

        if let Some(call_stack) = &self.call_stack {
            write!(f, "\n\nCall stack")?;
            for frame in call_stack.iter().rev() {
                write!(f, "\n  {}", frame)?;
            }
        }

        Ok(())
    }
}

impl Debug for ScriptError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl ScriptError {
    pub fn new(
        kind: ErrorKind,
        location: Option<SourceLocation>,
        message: String,
        call_stack: Option<CallStack>,
    ) -> ScriptError {
        ScriptError {
            kind,
            location,
            message,
            call_stack,
        }
    }

    pub fn new_as_result<T>(
        kind: ErrorKind,
        location: Option<SourceLocation>,
        message: String,
        call_stack: Option<CallStack>,
    ) -> Result<T> {
        Err(ScriptError::new(kind, location, message, call_stack))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn location(&self) -> &Option<SourceLocation> {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn call_stack(&self) -> &Option<CallStack> {
        &self.call_stack
    }
}

impl From<std::io::Error> for ScriptError {
    fn from(error: std::io::Error) -> ScriptError {
        ScriptError::new(ErrorKind::IOError, None, format!("I/O error: {}", error), None)
    }
}

/// Convenience for raising an error of a given kind with no location or call stack attached.  Most
/// VM-internal failures (stack faults, alignment faults, data-space exhaustion) are raised this
/// way; the outer interpreter attaches location/call-stack context at the boundary where a token
/// was being processed.
pub fn err<T>(kind: ErrorKind, message: impl Into<String>) -> Result<T> {
    ScriptError::new_as_result(kind, None, message.into(), None)
}

pub fn err_at<T>(kind: ErrorKind, location: SourceLocation, message: impl Into<String>) -> Result<T> {
    ScriptError::new_as_result(kind, Some(location), message.into(), None)
}
