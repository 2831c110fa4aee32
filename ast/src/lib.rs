pub mod decor;
pub mod token;
pub mod tree;

pub use decor::Decorations;
pub use token::{DebugToken, Token};
pub use tree::*;

use std::fmt;

/// Stable identity of a decoratable parse-tree node. Assigned by the
/// parser, used as the key of the decoration side-tables.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

/// Fresh-id generator owned by whoever builds the tree.
#[derive(Debug, Default)]
pub struct NodeIds(u32);

impl NodeIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.0);
        self.0 += 1;
        id
    }
}

/// Source position of a token, 1-based line and column.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Loc {
    pub line: u32,
    pub col: u32,
}

impl Loc {
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
