//! FIF block tree.
//!
//! Groups a flat tag directory into nested blocks delimited by
//! `FIFF_BLOCK_START` / `FIFF_BLOCK_END`, like `mne._fiff.tree.make_dir_tree`.
use std::io::{Read, Seek};

use anyhow::Result;

use super::constants::*;
use super::tag::{FifReader, TagHeader};

/// One block of the tree.
#[derive(Debug, Default, Clone)]
pub struct Node {
    /// Block kind (`FIFFB_*`); 0 for the root.
    pub block: i32,
    /// Non-structural tags directly in this block.
    pub entries: Vec<TagHeader>,
    pub children: Vec<Node>,
}

impl Node {
    /// Depth-first search for the first block of `kind`.
    pub fn find_block(&self, kind: i32) -> Option<&Node> {
        if self.block == kind {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_block(kind))
    }

    /// First entry of `kind` in this block (no recursion).
    pub fn find_tag(&self, kind: i32) -> Option<&TagHeader> {
        self.entries.iter().find(|e| e.kind == kind)
    }
}

/// Build the tree, reading each block kind from its `FIFF_BLOCK_START` payload.
pub fn read_tree<R: Read + Seek>(reader: &mut FifReader<R>, directory: &[TagHeader]) -> Result<Node> {
    let mut stack = vec![Node::default()];
    for tag in directory {
        match tag.kind {
            FIFF_BLOCK_START => {
                let block = reader.read_i32(tag)?;
                stack.push(Node { block, ..Node::default() });
            }
            FIFF_BLOCK_END => {
                if stack.len() > 1 {
                    let done = stack.pop().unwrap_or_default();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(done);
                    }
                }
            }
            _ => {
                if let Some(node) = stack.last_mut() {
                    node.entries.push(*tag);
                }
            }
        }
    }
    // Unterminated blocks are attached to their parents.
    while stack.len() > 1 {
        let orphan = stack.pop().unwrap_or_default();
        if let Some(parent) = stack.last_mut() {
            parent.children.push(orphan);
        }
    }
    Ok(stack.pop().unwrap_or_default())
}
