//! Fifth: a minimal, embeddable Forth runtime.
//!
//! The crate is split the way the spec's own module list is: `lang` holds parsing and number
//! conversion, independent of any particular VM instance; `runtime` holds the VM itself -- data
//! space, dictionary, stacks, the inner and outer interpreters, and the native word library built
//! on top of them.

pub mod lang;
pub mod runtime;

pub use runtime::error::{ErrorKind, Result, ScriptError};
pub use runtime::interpreter::Vm;
