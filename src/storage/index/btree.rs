//! Disk-resident B+Tree index keyed on the integer column.
//!
//! Page 0 of the index file holds the metadata pair `(root_pid,
//! tree_height)`, persisted on close and reloaded on open. Node pages
//! start at pid 1. A height of 0 means the tree is empty; a height of 1
//! means the root is a leaf.

use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::index::node::{InteriorNode, LeafNode};
use crate::storage::pagefile::{OpenMode, PAGE_SIZE, PageId, PagedFile};
use crate::storage::record::RecordId;

/// Position of an entry in a leaf: `(leaf pid, entry index)`. Advances in
/// ascending key order via `read_forward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexCursor {
    pub pid: PageId,
    pub eid: usize,
}

pub struct BTreeIndex {
    pf: PagedFile,
    root_pid: PageId,
    tree_height: i32,
}

impl BTreeIndex {
    /// Open the index file, loading `(root_pid, tree_height)` from page 0.
    /// An absent or all-zero metadata page reads as an empty tree.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let mut pf = PagedFile::open(path, mode)?;
        let mut root_pid = -1;
        let mut tree_height = 0;
        if pf.end_pid() > 0 {
            let mut buf = [0u8; PAGE_SIZE];
            pf.read(0, &mut buf)?;
            let stored_root = LittleEndian::read_i32(&buf[0..4]);
            let stored_height = LittleEndian::read_i32(&buf[4..8]);
            if stored_root >= 1 {
                root_pid = stored_root;
            }
            if stored_height >= 1 {
                tree_height = stored_height;
            }
        }
        debug!(root_pid, tree_height, "index opened");
        Ok(BTreeIndex {
            pf,
            root_pid,
            tree_height,
        })
    }

    /// Persist the metadata page (write mode only) and close the file.
    /// Structural updates made since open are lost unless this runs.
    pub fn close(mut self) -> Result<()> {
        if self.pf.mode() == OpenMode::Write {
            let mut buf = [0u8; PAGE_SIZE];
            LittleEndian::write_i32(&mut buf[0..4], self.root_pid);
            LittleEndian::write_i32(&mut buf[4..8], self.tree_height);
            self.pf.write(0, &buf)?;
        }
        self.pf.close()
    }

    /// Levels from root to leaf inclusive; 0 iff empty.
    pub fn height(&self) -> i32 {
        self.tree_height
    }

    pub fn root_pid(&self) -> PageId {
        self.root_pid
    }

    /// Insert `(key, rid)`, splitting nodes as needed. A split of the
    /// root promotes a new interior root after both halves are on disk.
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        if self.tree_height == 0 {
            let mut leaf = LeafNode::new();
            leaf.insert(key, rid)?;
            // page 0 stays reserved for metadata
            let pid = self.pf.end_pid().max(1);
            leaf.write(pid, &mut self.pf)?;
            self.root_pid = pid;
            self.tree_height = 1;
            return Ok(());
        }

        let root = self.root_pid;
        if let Some((mid_key, new_pid)) = self.insert_into(root, 1, key, rid)? {
            let mut new_root = InteriorNode::new();
            new_root.initialize_root(root, mid_key, new_pid)?;
            let root_pid = self.pf.end_pid();
            new_root.write(root_pid, &mut self.pf)?;
            self.root_pid = root_pid;
            self.tree_height += 1;
            debug!(root_pid, height = self.tree_height, "root promoted");
        }
        Ok(())
    }

    /// Recursive insert. Returns the `(separator, pid)` pair the parent
    /// must adopt when the visited node split, `None` otherwise.
    fn insert_into(
        &mut self,
        pid: PageId,
        depth: i32,
        key: i32,
        rid: RecordId,
    ) -> Result<Option<(i32, PageId)>> {
        if depth == self.tree_height {
            let mut leaf = LeafNode::new();
            leaf.read(pid, &mut self.pf)?;
            match leaf.insert(key, rid) {
                Ok(()) => {
                    leaf.write(pid, &mut self.pf)?;
                    Ok(None)
                }
                Err(Error::NodeFull) => {
                    let mut sibling = LeafNode::new();
                    let split_key = leaf.insert_and_split(key, rid, &mut sibling)?;
                    let sibling_pid = self.pf.end_pid();
                    leaf.set_next_ptr(sibling_pid)?;
                    sibling.write(sibling_pid, &mut self.pf)?;
                    leaf.write(pid, &mut self.pf)?;
                    Ok(Some((split_key, sibling_pid)))
                }
                Err(e) => Err(e),
            }
        } else {
            let mut node = InteriorNode::new();
            node.read(pid, &mut self.pf)?;
            let child = node.locate_child(key);
            let Some((promoted_key, promoted_pid)) =
                self.insert_into(child, depth + 1, key, rid)?
            else {
                return Ok(None);
            };
            match node.insert(promoted_key, promoted_pid) {
                Ok(()) => {
                    node.write(pid, &mut self.pf)?;
                    Ok(None)
                }
                Err(Error::NodeFull) => {
                    let mut sibling = InteriorNode::new();
                    let mid_key =
                        node.insert_and_split(promoted_key, promoted_pid, &mut sibling)?;
                    let sibling_pid = self.pf.end_pid();
                    node.write(pid, &mut self.pf)?;
                    sibling.write(sibling_pid, &mut self.pf)?;
                    Ok(Some((mid_key, sibling_pid)))
                }
                Err(e) => Err(e),
            }
        }
    }

    /// Descend to the leaf that should hold `search_key`. The cursor
    /// points at the first entry with key >= `search_key` (possibly one
    /// past the leaf's last entry); the flag reports an exact match.
    /// Fails with `NoSuchRecord` only when the tree is empty.
    pub fn locate(&mut self, search_key: i32) -> Result<(IndexCursor, bool)> {
        if self.tree_height <= 0 {
            return Err(Error::NoSuchRecord);
        }
        let mut pid = self.root_pid;
        for _ in 1..self.tree_height {
            let mut node = InteriorNode::new();
            node.read(pid, &mut self.pf)?;
            pid = node.locate_child(search_key);
        }
        let mut leaf = LeafNode::new();
        leaf.read(pid, &mut self.pf)?;
        let (eid, found) = leaf.locate(search_key);
        Ok((IndexCursor { pid, eid }, found))
    }

    /// Read the entry under the cursor and advance it, following sibling
    /// pointers across leaf boundaries. Returns `None` once the chain is
    /// exhausted (a sibling pid of 0 or below means end-of-index).
    pub fn read_forward(
        &mut self,
        cursor: &mut IndexCursor,
    ) -> Result<Option<(i32, RecordId)>> {
        loop {
            if cursor.pid <= 0 {
                return Ok(None);
            }
            let mut leaf = LeafNode::new();
            leaf.read(cursor.pid, &mut self.pf)?;
            let count = leaf.key_count();
            if cursor.eid < count {
                let (key, rid) = leaf.read_entry(cursor.eid)?;
                if cursor.eid + 1 < count {
                    cursor.eid += 1;
                } else {
                    cursor.pid = leaf.next_ptr();
                    cursor.eid = 0;
                }
                return Ok(Some((key, rid)));
            }
            // locate can leave the cursor one past the last entry; resume
            // from the next leaf in the chain
            cursor.pid = leaf.next_ptr();
            cursor.eid = 0;
        }
    }
}
