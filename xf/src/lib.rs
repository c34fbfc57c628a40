pub mod block;
pub mod call_graph;
pub mod mods;
pub mod parser;
pub mod source_map;
pub mod statement;

use crate::block::{Block, FunctionDef};

pub use mods::{ModRule, ModSet};
pub use parser::{Diagnostic, DiagnosticKind, ParseFailure, Parser, ParserOptions};

/// A scanned xf translation unit.
#[derive(Debug, Clone)]
pub struct Program {
    /// Top-level `#name { ... }` blocks in source order.
    pub blocks: Vec<Block>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl Program {
    /// All function definitions in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.blocks.iter().flat_map(|block| block.functions.iter())
    }

    /// The function invoked when the emitted program starts.
    pub fn entry(&self) -> Option<&FunctionDef> {
        self.functions().find(|function| function.is_entry)
    }
}
