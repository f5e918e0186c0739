//! Heap record file.
//!
//! Append-only store of `(key, value)` tuples addressed by `RecordId`.
//! Each 1024-byte page holds a 4-byte record count followed by 9 fixed
//! 108-byte slots: key (i32 LE), value length (i32 LE), then up to 100
//! value bytes. Pages fill front to back; only the last page may be
//! partially full, so the end rid is recomputed from the page counts on
//! open.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::storage::pagefile::{OpenMode, PagedFile, PAGE_SIZE, PageId};

/// Longest value a record slot can hold, in bytes.
pub const MAX_VALUE_LEN: usize = 100;

const SLOT_SIZE: usize = 4 + 4 + MAX_VALUE_LEN;
const SLOTS_PER_PAGE: i32 = ((PAGE_SIZE - 4) / SLOT_SIZE) as i32;

/// Address of a tuple slot in the heap file. Ordered by page, then slot,
/// which makes `rid < end_rid()` the scan-termination test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordId {
    pub pid: PageId,
    pub sid: i32,
}

impl RecordId {
    pub fn new(pid: PageId, sid: i32) -> Self {
        RecordId { pid, sid }
    }
}

/// Heap file of `(key, value)` tuples.
pub struct RecordFile {
    pf: PagedFile,
    end: RecordId,
}

impl RecordFile {
    pub fn open<P: AsRef<std::path::Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let mut pf = PagedFile::open(path, mode)?;
        let pages = pf.end_pid();
        let end = if pages == 0 {
            RecordId::default()
        } else {
            let mut buf = [0u8; PAGE_SIZE];
            pf.read(pages - 1, &mut buf)?;
            let count = LittleEndian::read_i32(&buf[0..4]);
            if !(0..=SLOTS_PER_PAGE).contains(&count) {
                return Err(Error::InvalidFileFormat(format!(
                    "bad record count {count} in page {}",
                    pages - 1
                )));
            }
            if count == SLOTS_PER_PAGE {
                RecordId::new(pages, 0)
            } else {
                RecordId::new(pages - 1, count)
            }
        };
        Ok(RecordFile { pf, end })
    }

    /// One past the last stored record.
    pub fn end_rid(&self) -> RecordId {
        self.end
    }

    /// The rid immediately after `rid` in scan order.
    pub fn next_rid(&self, rid: RecordId) -> RecordId {
        if rid.sid + 1 < SLOTS_PER_PAGE {
            RecordId::new(rid.pid, rid.sid + 1)
        } else {
            RecordId::new(rid.pid + 1, 0)
        }
    }

    /// Append a tuple, returning the rid it was stored under.
    pub fn append(&mut self, key: i32, value: &str) -> Result<RecordId> {
        if value.len() > MAX_VALUE_LEN {
            return Err(Error::InvalidFileFormat(format!(
                "value exceeds {MAX_VALUE_LEN} bytes"
            )));
        }
        let rid = self.end;
        let mut buf = [0u8; PAGE_SIZE];
        if rid.sid > 0 {
            self.pf.read(rid.pid, &mut buf)?;
        }

        let off = 4 + rid.sid as usize * SLOT_SIZE;
        LittleEndian::write_i32(&mut buf[off..off + 4], key);
        LittleEndian::write_i32(&mut buf[off + 4..off + 8], value.len() as i32);
        buf[off + 8..off + 8 + value.len()].copy_from_slice(value.as_bytes());
        LittleEndian::write_i32(&mut buf[0..4], rid.sid + 1);

        self.pf.write(rid.pid, &buf)?;
        self.end = self.next_rid(rid);
        Ok(rid)
    }

    /// Read the tuple stored under `rid`.
    pub fn read(&mut self, rid: RecordId) -> Result<(i32, String)> {
        if rid.pid < 0 || rid.sid < 0 || rid.sid >= SLOTS_PER_PAGE || rid >= self.end {
            return Err(Error::InvalidCursor);
        }
        let mut buf = [0u8; PAGE_SIZE];
        self.pf.read(rid.pid, &mut buf)?;

        let off = 4 + rid.sid as usize * SLOT_SIZE;
        let key = LittleEndian::read_i32(&buf[off..off + 4]);
        let len = LittleEndian::read_i32(&buf[off + 4..off + 8]);
        if !(0..=MAX_VALUE_LEN as i32).contains(&len) {
            return Err(Error::InvalidFileFormat(format!(
                "bad value length {len} at rid ({}, {})",
                rid.pid, rid.sid
            )));
        }
        let value = String::from_utf8(buf[off + 8..off + 8 + len as usize].to_vec())
            .map_err(|e| Error::InvalidFileFormat(e.to_string()))?;
        Ok((key, value))
    }

    pub fn close(self) -> Result<()> {
        self.pf.close()
    }
}
