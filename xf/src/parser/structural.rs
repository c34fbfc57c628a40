use std::ops::Range;

use tracing::debug;

use crate::block::{Block, FunctionDef};
use crate::call_graph;
use crate::parser::error::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::parser::scan::{CodeBytes, is_ident_byte, matching_brace};
use crate::parser::statement;

/// Result of the block scan. `aborted` is set when an unmatched brace stopped it.
pub(crate) struct Scan {
    pub blocks: Vec<Block>,
    pub aborted: bool,
}

/// Find every `#name { ... }` block and the functions inside it.
pub(crate) fn scan_blocks(source: &str, file_id: usize, diags: &mut Diagnostics) -> Scan {
    let bytes = source.as_bytes();
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(hash) = next_code_byte(bytes, pos, bytes.len(), b'#') {
        let Some((name, open)) = block_header(bytes, hash) else {
            pos = hash + 1;
            continue;
        };
        let name = source[name].to_string();
        let Some(close) = matching_brace(bytes, open, bytes.len()) else {
            diags.push(unmatched(&format!("block `#{}`", name), open, file_id));
            return Scan {
                blocks,
                aborted: true,
            };
        };

        let Some(functions) = scan_functions(source, &name, open + 1..close, file_id, diags) else {
            return Scan {
                blocks,
                aborted: true,
            };
        };
        debug!("block #{}: {} function(s)", name, functions.len());
        blocks.push(Block {
            name,
            functions,
            span: open + 1..close,
        });
        pos = close + 1;
    }

    Scan {
        blocks,
        aborted: false,
    }
}

/// Functions defined in the block interior `body`. `None` when a body is unmatched.
fn scan_functions(
    source: &str,
    block: &str,
    body: Range<usize>,
    file_id: usize,
    diags: &mut Diagnostics,
) -> Option<Vec<FunctionDef>> {
    let bytes = source.as_bytes();
    let mut functions = Vec::new();
    let mut pos = body.start;

    while let Some(start) = next_code_byte(bytes, pos, body.end, b'f') {
        let Some((name, open)) = function_header(bytes, start, body.end) else {
            pos = start + 1;
            continue;
        };
        let name = source[name].to_string();
        let Some(close) = matching_brace(bytes, open, body.end) else {
            diags.push(unmatched(&format!("function `{}`", name), open, file_id));
            return None;
        };

        let statements = statement::parse_body(source, open + 1..close, file_id, diags);
        functions.push(FunctionDef {
            block: block.to_string(),
            mangled: call_graph::mangle(block, &name),
            name,
            statements,
            is_entry: false,
            span: start..open + 1,
        });
        pos = close + 1;
    }
    Some(functions)
}

fn unmatched(what: &str, open: usize, file_id: usize) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnmatchedBraces,
        format!("unmatched `{{` opening {}", what),
        open..open + 1,
        file_id,
    )
    .with_note("scanning stopped here; the braces never return to depth zero")
}

fn next_code_byte(bytes: &[u8], start: usize, end: usize, needle: u8) -> Option<usize> {
    CodeBytes::new(bytes, start, end)
        .find(|&(_, b)| b == needle)
        .map(|(pos, _)| pos)
}

fn skip_ws(bytes: &[u8], mut pos: usize, end: usize) -> usize {
    while pos < end && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn ident_end(bytes: &[u8], mut pos: usize, end: usize) -> usize {
    while pos < end && is_ident_byte(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// `#` ws? ident ws? `{`. Returns the name range and the brace position.
fn block_header(bytes: &[u8], hash: usize) -> Option<(Range<usize>, usize)> {
    let name_start = skip_ws(bytes, hash + 1, bytes.len());
    let name_end = ident_end(bytes, name_start, bytes.len());
    if name_end == name_start {
        return None;
    }
    let open = skip_ws(bytes, name_end, bytes.len());
    (bytes.get(open) == Some(&b'{')).then_some((name_start..name_end, open))
}

/// `fn` ws ident ws? (`(` ... `)`)? ws? `{`. Returns the name range and the brace position.
fn function_header(bytes: &[u8], start: usize, end: usize) -> Option<(Range<usize>, usize)> {
    if start > 0 && is_ident_byte(bytes[start - 1]) {
        return None;
    }
    if bytes.get(start + 1) != Some(&b'n') {
        return None;
    }
    let name_start = skip_ws(bytes, start + 2, end);
    if name_start == start + 2 {
        return None;
    }
    let name_end = ident_end(bytes, name_start, end);
    if name_end == name_start {
        return None;
    }

    let mut pos = skip_ws(bytes, name_end, end);
    if bytes.get(pos) == Some(&b'(') {
        let close = bytes[pos..end].iter().position(|&b| b == b')')?;
        pos = skip_ws(bytes, pos + close + 1, end);
    }
    (pos < end && bytes[pos] == b'{').then_some((name_start..name_end, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> (Scan, Diagnostics) {
        let mut diags = Diagnostics::new(128);
        let scan = scan_blocks(source, 0, &mut diags);
        (scan, diags)
    }

    #[test]
    fn finds_blocks_and_functions() {
        let (scan, diags) = scan("#a {\n fn one() {\n }\n fn two {\n }\n}\n# b{ fn three(){} }");
        assert!(diags.is_empty());
        assert!(!scan.aborted);
        let names: Vec<_> = scan
            .blocks
            .iter()
            .flat_map(|b| b.functions.iter().map(|f| f.mangled.as_str()))
            .collect();
        assert_eq!(names, ["a_one", "a_two", "b_three"]);
    }

    #[test]
    fn hash_inside_string_is_not_a_block() {
        let (scan, _) = scan("x = \"#fake {\"\n#real { fn f() {} }");
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(scan.blocks[0].name, "real");
    }

    #[test]
    fn identifiers_ending_in_f_are_not_keywords() {
        let (scan, _) = scan("#a { iffn x() {} fn y() {} }");
        assert_eq!(scan.blocks[0].functions.len(), 1);
        assert_eq!(scan.blocks[0].functions[0].name, "y");
    }

    #[test]
    fn unmatched_block_aborts_but_keeps_earlier_blocks() {
        let (scan, diags) = scan("#ok { fn f() {} }\n#bad { fn g() {\n");
        assert!(scan.aborted);
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(diags.len(), 1);
    }
}
