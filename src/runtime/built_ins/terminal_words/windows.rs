//! `KEY` on Windows: read one keydown event from the console input buffer.

use std::io::Error;
use std::mem::zeroed;

use winapi::shared::minwindef::DWORD;
use winapi::um::consoleapi::ReadConsoleInputA;
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::processenv::GetStdHandle;
use winapi::um::winbase::STD_INPUT_HANDLE;
use winapi::um::wincontypes::INPUT_RECORD;

use crate::runtime::error::{self, err, ErrorKind};

const KEY_EVENT: u16 = 1;

pub fn read_key() -> error::Result<u8> {
    unsafe {
        let handle = GetStdHandle(STD_INPUT_HANDLE);
        if handle == INVALID_HANDLE_VALUE {
            return err(ErrorKind::IOError, format!("Get console handle failed: {}", Error::last_os_error()));
        }

        loop {
            let mut record: INPUT_RECORD = zeroed();
            let mut read: DWORD = 0;

            if ReadConsoleInputA(handle, &mut record, 1, &mut read) == 0 {
                return err(ErrorKind::IOError, format!("Reading console input failed: {}", Error::last_os_error()));
            }

            if record.EventType == KEY_EVENT {
                let key_event = record.Event.KeyEvent();
                if key_event.bKeyDown != 0 {
                    return Ok(*key_event.uChar.AsciiChar() as u8);
                }
            }
        }
    }
}
