use std::ops::Range;

/// Maps byte offsets in mod-substituted text back to the original source.
///
/// Each recorded edit is one replaced token. Offsets between edits shift by the
/// accumulated length difference; offsets inside a replacement map to the start
/// of the token it replaced.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    edits: Vec<Edit>,
}

#[derive(Debug, Clone, Copy)]
struct Edit {
    out_start: usize,
    out_end: usize,
    in_start: usize,
    in_end: usize,
}

impl SourceMap {
    /// Record that `input` in the original became `output` in the substituted text.
    /// Edits must be recorded in increasing offset order.
    pub(crate) fn record(&mut self, output: Range<usize>, input: Range<usize>) {
        self.edits.push(Edit {
            out_start: output.start,
            out_end: output.end,
            in_start: input.start,
            in_end: input.end,
        });
    }

    /// True when no substitution happened.
    pub fn is_identity(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn to_original(&self, offset: usize) -> usize {
        let idx = self.edits.partition_point(|edit| edit.out_start <= offset);
        if idx == 0 {
            return offset;
        }
        let edit = &self.edits[idx - 1];
        if offset < edit.out_end {
            edit.in_start
        } else {
            edit.in_end + (offset - edit.out_end)
        }
    }

    pub fn span_to_original(&self, span: &Range<usize>) -> Range<usize> {
        let start = self.to_original(span.start);
        let end = self.to_original(span.end).max(start);
        start..end
    }
}
