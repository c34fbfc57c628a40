pub mod error;
pub(crate) mod scan;
pub mod statement;
mod structural;

pub use error::{Diagnostic, DiagnosticKind, Diagnostics};

use std::fmt;

use tracing::debug;

use crate::Program;
use crate::call_graph::{self, DEFAULT_ENTRY_NAMES};
use crate::mods::ModSet;

/// Inputs larger than this are rejected before scanning.
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 65536;

/// Diagnostics beyond this count are dropped and only counted.
pub const DEFAULT_MAX_DIAGNOSTICS: usize = 128;

/// Limits and knobs for one parse.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub max_source_bytes: usize,
    pub max_diagnostics: usize,
    /// Function names that take over as entry point.
    pub entry_names: Vec<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            max_diagnostics: DEFAULT_MAX_DIAGNOSTICS,
            entry_names: DEFAULT_ENTRY_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A parse that reported at least one diagnostic.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    /// Diagnostics with spans in the original (pre-substitution) source.
    pub errors: Vec<Diagnostic>,
    /// Diagnostics discarded after the cap was reached.
    pub dropped: usize,
    /// Set when a structural problem stopped the parse.
    pub aborted: bool,
    /// What was built before or despite the errors, if anything.
    pub partial: Option<Program>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.errors.len() + self.dropped;
        write!(f, "translation failed with {} error(s)", total)?;
        if let Some(first) = self.errors.first() {
            write!(f, "; first: {}", first)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseFailure {}

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    mods: ModSet,
    options: ParserOptions,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            mods: ModSet::new(),
            options: ParserOptions::default(),
        }
    }

    pub fn with_mods(mut self, mods: ModSet) -> Self {
        self.mods = mods;
        self
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Substitute mods, scan blocks and functions, select the entry point and resolve calls.
    pub fn parse(&self) -> Result<Program, ParseFailure> {
        let mut diags = Diagnostics::new(self.options.max_diagnostics);

        if self.source.is_empty() || self.source.len() > self.options.max_source_bytes {
            let message = if self.source.is_empty() {
                "source file is empty".to_string()
            } else {
                format!(
                    "source is {} bytes, larger than the {} byte limit",
                    self.source.len(),
                    self.options.max_source_bytes
                )
            };
            diags.push(Diagnostic::error(
                DiagnosticKind::SizeError,
                message,
                0..0,
                self.file_id,
            ));
            return Err(self.failure(diags, true, None));
        }

        let substitution = self.mods.apply(&self.source);
        if !substitution.map.is_identity() {
            debug!("applied {} mod rule(s)", self.mods.len());
        }

        let scan = structural::scan_blocks(&substitution.text, self.file_id, &mut diags);
        let mut blocks = scan.blocks;

        if !scan.aborted {
            if blocks.is_empty() {
                diags.push(
                    Diagnostic::error(
                        DiagnosticKind::NoBlocksFound,
                        "no blocks found",
                        0..0,
                        self.file_id,
                    )
                    .with_note("a program needs at least one `#name { ... }` block"),
                );
                return Err(self.failure(diags, true, None));
            }
            if blocks.iter().all(|block| block.functions.is_empty()) {
                diags.push(
                    Diagnostic::error(
                        DiagnosticKind::NoFunctionsFound,
                        "no functions found",
                        0..0,
                        self.file_id,
                    )
                    .with_note("define one with `fn name() { ... }` inside a block"),
                );
                return Err(self.failure(diags, true, None));
            }
            call_graph::mark_entry(&mut blocks, self.options.entry_names.as_slice());
            call_graph::resolve_calls(&mut blocks, self.file_id, &mut diags);
        }

        diags.remap(&substitution.map);
        let program = Program {
            blocks,
            source_id: self.file_id,
        };

        if diags.is_empty() && !scan.aborted {
            return Ok(program);
        }
        let partial = (!program.blocks.is_empty()).then_some(program);
        Err(self.failure(diags, scan.aborted, partial))
    }

    fn failure(&self, diags: Diagnostics, aborted: bool, partial: Option<Program>) -> ParseFailure {
        ParseFailure {
            dropped: diags.dropped(),
            errors: diags.into_vec(),
            aborted,
            partial,
        }
    }
}
