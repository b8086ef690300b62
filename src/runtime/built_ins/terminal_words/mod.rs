//! Raw single-character terminal input for `KEY`, split by platform since there is no portable
//! `std` way to read one keypress without waiting for a newline.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::read_key;
#[cfg(windows)]
pub use windows::read_key;
