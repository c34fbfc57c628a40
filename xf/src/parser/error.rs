use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic as Report, Label};

use crate::source_map::SourceMap;

/// Every problem the translator can report about a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    SizeError,
    UnterminatedString,
    UnmatchedBraces,
    EmptyCondition,
    MissingBrace,
    RangeTooLarge,
    InvalidRangeSyntax,
    UnresolvedCall,
    NoBlocksFound,
    NoFunctionsFound,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 10] = [
        DiagnosticKind::SizeError,
        DiagnosticKind::UnterminatedString,
        DiagnosticKind::UnmatchedBraces,
        DiagnosticKind::EmptyCondition,
        DiagnosticKind::MissingBrace,
        DiagnosticKind::RangeTooLarge,
        DiagnosticKind::InvalidRangeSyntax,
        DiagnosticKind::UnresolvedCall,
        DiagnosticKind::NoBlocksFound,
        DiagnosticKind::NoFunctionsFound,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::SizeError => "SizeError",
            DiagnosticKind::UnterminatedString => "UnterminatedString",
            DiagnosticKind::UnmatchedBraces => "UnmatchedBraces",
            DiagnosticKind::EmptyCondition => "EmptyCondition",
            DiagnosticKind::MissingBrace => "MissingBrace",
            DiagnosticKind::RangeTooLarge => "RangeTooLarge",
            DiagnosticKind::InvalidRangeSyntax => "InvalidRangeSyntax",
            DiagnosticKind::UnresolvedCall => "UnresolvedCall",
            DiagnosticKind::NoBlocksFound => "NoBlocksFound",
            DiagnosticKind::NoFunctionsFound => "NoFunctionsFound",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One reported problem, located in the source file.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(
        kind: DiagnosticKind,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            span,
            file_id,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Report<usize> {
        Report::error()
            .with_code(self.kind.name())
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Append-only, bounded diagnostic collector owned by one translation.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    limit: usize,
    dropped: usize,
}

impl Diagnostics {
    pub fn new(limit: usize) -> Self {
        Diagnostics {
            items: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    /// Record `diag`, or count it as dropped once the limit is reached.
    pub fn push(&mut self, diag: Diagnostic) {
        if self.items.len() < self.limit {
            self.items.push(diag);
        } else {
            self.dropped += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.dropped == 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Diagnostics discarded after the limit was hit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Translate every span from substituted text back to the original source.
    pub fn remap(&mut self, map: &SourceMap) {
        if map.is_identity() {
            return;
        }
        for diag in &mut self.items {
            diag.span = map.span_to_original(&diag.span);
        }
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_drops_past_limit() {
        let mut diags = Diagnostics::new(2);
        for _ in 0..5 {
            diags.push(Diagnostic::error(
                DiagnosticKind::EmptyCondition,
                "empty",
                0..1,
                0,
            ));
        }
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.dropped(), 3);
        assert!(!diags.is_empty());
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in DiagnosticKind::ALL {
            assert_eq!(DiagnosticKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DiagnosticKind::from_name("Nope"), None);
    }
}
