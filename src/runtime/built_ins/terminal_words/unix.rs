//! `KEY` on Unix: drop the terminal into raw mode for the duration of a single read, then
//! restore whatever mode it was in before.

use std::io::{Read, Error, ErrorKind::Interrupted};
use std::mem::zeroed;

use libc::{
    tcgetattr, tcsetattr, termios, BRKINT, ECHO, ICANON, ICRNL, IEXTEN, INPCK, ISIG, ISTRIP, IXON,
    OPOST, STDIN_FILENO, TCSAFLUSH,
};

use crate::runtime::error::{self, err, ErrorKind};

struct RawModeGuard {
    original: termios,
}

impl RawModeGuard {
    fn enter() -> error::Result<RawModeGuard> {
        unsafe {
            let mut original: termios = zeroed();
            if tcgetattr(STDIN_FILENO, &mut original) == -1 {
                return err(ErrorKind::IOError, format!("Could not get terminal mode: {}", Error::last_os_error()));
            }

            let mut raw = original;
            raw.c_iflag &= !(BRKINT | ICRNL | INPCK | ISTRIP | IXON);
            raw.c_oflag &= !OPOST;
            raw.c_lflag &= !(ECHO | ICANON | IEXTEN | ISIG);

            if tcsetattr(STDIN_FILENO, TCSAFLUSH, &raw) == -1 {
                return err(ErrorKind::IOError, format!("Could not set terminal mode: {}", Error::last_os_error()));
            }

            Ok(RawModeGuard { original })
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        unsafe {
            tcsetattr(STDIN_FILENO, TCSAFLUSH, &self.original);
        }
    }
}

pub fn read_key() -> error::Result<u8> {
    let _guard = RawModeGuard::enter()?;
    let mut buffer = [0u8; 1];
    let stdin = std::io::stdin();
    let mut handle = stdin.lock();

    loop {
        match handle.read_exact(&mut buffer) {
            Ok(()) => return Ok(buffer[0]),
            Err(ref e) if e.kind() == Interrupted => continue,
            Err(e) => return err(ErrorKind::IOError, format!("Failed to read from stdin: {}", e)),
        }
    }
}
