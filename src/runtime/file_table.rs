//! File-handle table for the I/O bridge.
//!
//! Forth-visible file IDs (`fid`s) are small integers indexing into this table rather than raw
//! host handles, so Forth code never sees a pointer.  Slots `0` and `1` are reserved so `fid 0`
//! can never collide with a legitimately opened file; `>FILE`/`>STDOUT` instead flip a current-
//! output pointer kept on the VM itself.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};

use crate::runtime::error::{self, err, ErrorKind};

/// The table holds at least this many open files at once.
pub const MAX_FILES: usize = 16;

/// `R/O`, `W/O`, `R/W`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

pub struct OpenFile {
    reader: Option<BufReader<File>>,
    writer: Option<File>,
}

impl OpenFile {
    fn for_read(file: File) -> OpenFile {
        OpenFile { reader: Some(BufReader::new(file)), writer: None }
    }

    fn for_write(file: File) -> OpenFile {
        OpenFile { reader: None, writer: Some(file) }
    }

    fn for_read_write(file: File) -> error::Result<OpenFile> {
        let writer = file.try_clone()?;
        Ok(OpenFile { reader: Some(BufReader::new(file)), writer: Some(writer) })
    }
}

/// A slab of optional open files, indexed by Forth `fid`.  `None` marks a free slot.
pub struct FileTable {
    slots: Vec<Option<OpenFile>>,
}

impl FileTable {
    pub fn new() -> FileTable {
        let mut slots = Vec::with_capacity(MAX_FILES);
        slots.resize_with(MAX_FILES, || None);
        FileTable { slots }
    }

    fn allocate(&mut self, file: OpenFile) -> error::Result<i64> {
        for (fid, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(file);
                return Ok(fid as i64);
            }
        }
        err(ErrorKind::IOError, "No free file handle slots.")
    }

    pub fn open(&mut self, path: &str, mode: FileMode) -> error::Result<i64> {
        let opened = match mode {
            FileMode::ReadOnly => OpenFile::for_read(File::open(path)?),
            FileMode::WriteOnly => OpenFile::for_write(OpenOptions::new().write(true).open(path)?),
            FileMode::ReadWrite => {
                OpenFile::for_read_write(OpenOptions::new().read(true).write(true).open(path)?)?
            }
        };
        self.allocate(opened)
    }

    pub fn create(&mut self, path: &str, mode: FileMode) -> error::Result<i64> {
        let mut options = OpenOptions::new();
        options.create(true).truncate(true);
        match mode {
            FileMode::ReadOnly => {
                options.read(true);
            }
            FileMode::WriteOnly => {
                options.write(true);
            }
            FileMode::ReadWrite => {
                options.read(true).write(true);
            }
        }
        let file = options.open(path)?;
        let opened = match mode {
            FileMode::ReadOnly => OpenFile::for_read(file),
            FileMode::WriteOnly => OpenFile::for_write(file),
            FileMode::ReadWrite => OpenFile::for_read_write(file)?,
        };
        self.allocate(opened)
    }

    pub fn close(&mut self, fid: i64) -> error::Result<()> {
        let slot = self.slot_mut(fid)?;
        if slot.is_none() {
            return err(ErrorKind::IOError, format!("File handle {} is not open.", fid));
        }
        *slot = None;
        Ok(())
    }

    fn slot_mut(&mut self, fid: i64) -> error::Result<&mut Option<OpenFile>> {
        if fid < 0 || fid as usize >= self.slots.len() {
            return err(ErrorKind::IOError, format!("File handle {} is out of range.", fid));
        }
        Ok(&mut self.slots[fid as usize])
    }

    fn open_mut(&mut self, fid: i64) -> error::Result<&mut OpenFile> {
        match self.slot_mut(fid)?.as_mut() {
            Some(file) => Ok(file),
            None => err(ErrorKind::IOError, format!("File handle {} is not open.", fid)),
        }
    }

    /// `READ-LINE`: read one line (sans newline), reporting whether end-of-file was reached.
    pub fn read_line(&mut self, fid: i64) -> error::Result<(String, bool)> {
        let file = self.open_mut(fid)?;
        let reader = match file.reader.as_mut() {
            Some(reader) => reader,
            None => return err(ErrorKind::IOError, "File handle is not open for reading."),
        };

        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok((String::new(), true));
        }
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        Ok((line, false))
    }

    /// `READ-FILE`: read up to `len` bytes, returning how many were actually read.
    pub fn read_bytes(&mut self, fid: i64, buf: &mut [u8]) -> error::Result<usize> {
        use std::io::Read;
        let file = self.open_mut(fid)?;
        let reader = match file.reader.as_mut() {
            Some(reader) => reader,
            None => return err(ErrorKind::IOError, "File handle is not open for reading."),
        };
        Ok(reader.read(buf)?)
    }

    pub fn write_bytes(&mut self, fid: i64, bytes: &[u8]) -> error::Result<()> {
        let file = self.open_mut(fid)?;
        let writer = match file.writer.as_mut() {
            Some(writer) => writer,
            None => return err(ErrorKind::IOError, "File handle is not open for writing."),
        };
        writer.write_all(bytes)?;
        Ok(())
    }

    pub fn write_line(&mut self, fid: i64, bytes: &[u8]) -> error::Result<()> {
        self.write_bytes(fid, bytes)?;
        self.write_bytes(fid, b"\n")
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}
