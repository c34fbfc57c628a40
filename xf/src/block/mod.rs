use std::ops::Range;

use crate::statement::Statement;

/// A named top-level region: `#name { ... }`.
/// Blocks only group functions; they carry no code of their own.
#[derive(Debug, Clone)]
pub struct Block {
    /// The identifier after the `#` sigil.
    pub name: String,
    /// Function definitions inside the block, in source order.
    pub functions: Vec<FunctionDef>,
    /// Byte span of the interior (between the braces), in substituted text.
    pub span: Range<usize>,
}

/// One `fn name() { ... }` definition inside a block.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Name of the enclosing block.
    pub block: String,
    /// Unqualified function name.
    pub name: String,
    /// Identifier used for this function in emitted code.
    pub mangled: String,
    pub statements: Vec<Statement>,
    /// Whether this function was selected as the program entry point.
    pub is_entry: bool,
    /// Byte span of the `fn` header, in substituted text.
    pub span: Range<usize>,
}
