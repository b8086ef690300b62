/// The flat data space and the pictured-numeric output buffer.
pub mod memory;

/// The word dictionary: named entries, execution tokens, and lookup.
pub mod dictionary;

/// The data and return stacks.
pub mod stack;
