use std::ops::Range;

use tracing::debug;

use crate::parser::error::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::parser::scan::{find_code_byte, is_ident_byte, strip_line_comment};
use crate::statement::generator::{RangeError, parse_generator};
use crate::statement::{Statement, Value};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Classify every line of the function body at `body` (byte range into `source`).
pub(crate) fn parse_body(
    source: &str,
    body: Range<usize>,
    file_id: usize,
    diags: &mut Diagnostics,
) -> Vec<Statement> {
    let mut parser = BodyParser {
        lines: body_lines(source, body),
        next: 0,
        file_id,
        diags,
        statements: Vec::new(),
        opens: Vec::new(),
        closed_if: false,
        follows_if: false,
    };
    while parser.next < parser.lines.len() {
        let line = parser.lines[parser.next];
        parser.next += 1;
        parser.parse_line(line);
    }
    parser.statements
}

/// Decode the body of a print literal, starting just after the opening quote.
///
/// Returns the decoded text and the number of bytes consumed including the
/// closing quote, or `None` when the literal is not terminated.
pub fn decode_print_literal(body: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, i + 1)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 't')) => out.push('\t'),
                Some((_, '"')) => out.push('"'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return None,
            },
            c => out.push(c),
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Line splitting
// ---------------------------------------------------------------------------

/// A non-empty, comment-stripped, trimmed source line.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    text: &'a str,
}

fn body_lines(source: &str, body: Range<usize>) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = body.start;
    for raw in source[body].split('\n') {
        let code = strip_line_comment(raw);
        let trimmed = code.trim_start();
        let text = trimmed.trim_end();
        if !text.is_empty() {
            lines.push(Line {
                start: offset + (code.len() - trimmed.len()),
                text,
            });
        }
        offset += raw.len() + 1;
    }
    lines
}

// ---------------------------------------------------------------------------
// Statement grammar
// ---------------------------------------------------------------------------

/// What an unclosed conditional `{` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    /// `if` or `else if`; an `else` may follow its `}`.
    If,
    Else,
    /// A header that was reported and not emitted.
    Skipped,
}

enum Step {
    /// A statement was recognised; this many bytes of the line were used.
    Consumed(usize),
    /// The rest of the line is dropped.
    Skip,
    /// The text does not have this statement's shape.
    NoMatch,
}

struct BodyParser<'s, 'd> {
    lines: Vec<Line<'s>>,
    /// Index of the next unread line.
    next: usize,
    file_id: usize,
    diags: &'d mut Diagnostics,
    statements: Vec<Statement>,
    /// One entry per unclosed conditional `{`.
    opens: Vec<Open>,
    /// Set by a `}` that closed an emitted `if` or `else if`.
    closed_if: bool,
    /// `closed_if` as it stood before the current statement.
    follows_if: bool,
}

impl BodyParser<'_, '_> {
    fn parse_line(&mut self, line: Line<'_>) {
        let mut pos = 0;
        loop {
            let rest = &line.text[pos..];
            let trimmed = rest.trim_start();
            pos += rest.len() - trimmed.len();
            if trimmed.is_empty() {
                return;
            }
            match self.parse_statement(line.start + pos, trimmed) {
                Step::Consumed(n) => pos += n,
                Step::Skip | Step::NoMatch => return,
            }
        }
    }

    fn parse_statement(&mut self, at: usize, text: &str) -> Step {
        self.follows_if = std::mem::take(&mut self.closed_if);
        let shapes: [fn(&mut Self, usize, &str) -> Step; 6] = [
            Self::print,
            Self::if_header,
            Self::else_header,
            Self::call,
            Self::close,
            Self::assignment,
        ];
        for shape in shapes {
            match shape(self, at, text) {
                Step::NoMatch => continue,
                step => return step,
            }
        }
        debug!("ignoring unrecognized statement `{}`", text);
        Step::Skip
    }

    fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Range<usize>) {
        self.diags
            .push(Diagnostic::error(kind, message, span, self.file_id));
    }

    // -- print ---------------------------------------------------------------

    fn print(&mut self, at: usize, text: &str) -> Step {
        let Some(after) = strip_word(text, "print") else {
            return Step::NoMatch;
        };
        let Some(args) = after.trim_start().strip_prefix('(') else {
            return Step::NoMatch;
        };
        let args = args.trim_start();
        let Some(body) = args.strip_prefix('"') else {
            return Step::NoMatch;
        };
        let quote = at + (text.len() - args.len());

        let Some((decoded, used)) = decode_print_literal(body) else {
            self.report(
                DiagnosticKind::UnterminatedString,
                "unterminated string literal",
                quote..at + text.len(),
            );
            return Step::Skip;
        };

        let Some(mut tail) = body[used..].trim_start().strip_prefix(')') else {
            debug!("print without closing `)`: `{}`", text);
            return Step::Skip;
        };
        if let Some(after_semi) = tail.trim_start().strip_prefix(';') {
            tail = after_semi;
        }
        let consumed = text.len() - tail.len();
        self.statements.push(Statement::Print {
            text: decoded,
            span: at..at + consumed,
        });
        Step::Consumed(consumed)
    }

    // -- conditionals --------------------------------------------------------

    fn if_header(&mut self, at: usize, text: &str) -> Step {
        let Some(after) = strip_word(text, "if") else {
            return Step::NoMatch;
        };
        self.conditional(at, text, text.len() - after.len(), true, |condition, span| {
            Statement::If { condition, span }
        })
    }

    fn else_header(&mut self, at: usize, text: &str) -> Step {
        let Some(after) = strip_word(text, "else") else {
            return Step::NoMatch;
        };
        let trimmed = after.trim_start();
        let follows_if = self.follows_if;
        if !follows_if {
            debug!("`else` without a preceding `if`: `{}`", text);
        }
        if let Some(after_if) = strip_word(trimmed, "if") {
            let head = text.len() - after_if.len();
            return self.conditional(at, text, head, follows_if, |condition, span| {
                Statement::ElseIf { condition, span }
            });
        }

        let head = text.len() - after.len();
        let consumed = match trimmed.strip_prefix('{') {
            Some(rest) => text.len() - rest.len(),
            None if trimmed.is_empty() && self.take_lone_brace() => text.len(),
            None => {
                self.report(
                    DiagnosticKind::MissingBrace,
                    "expected `{` after `else`",
                    at..at + head,
                );
                return Step::Skip;
            }
        };
        if follows_if {
            self.statements.push(Statement::Else {
                span: at..at + consumed,
            });
        }
        self.opens.push(if follows_if { Open::Else } else { Open::Skipped });
        Step::Consumed(consumed)
    }

    /// Shared tail of `if` and `else if`: `<condition> {`, brace possibly on the next line.
    /// With `emit` unset the header is checked and its brace tracked, but nothing is pushed.
    fn conditional(
        &mut self,
        at: usize,
        text: &str,
        head: usize,
        emit: bool,
        make: impl FnOnce(String, Range<usize>) -> Statement,
    ) -> Step {
        let rest = &text[head..];
        let (condition, consumed) = match find_code_byte(rest, b'{') {
            Some(brace) => (rest[..brace].trim(), head + brace + 1),
            None if self.take_lone_brace() => (rest.trim(), text.len()),
            None => {
                self.report(
                    DiagnosticKind::MissingBrace,
                    format!("expected `{{` after `{}`", text[..head].trim()),
                    at..at + text.len(),
                );
                return Step::Skip;
            }
        };
        if condition.is_empty() {
            self.report(
                DiagnosticKind::EmptyCondition,
                format!("`{}` has no condition", text[..head].trim()),
                at..at + consumed,
            );
            self.opens.push(Open::Skipped);
            return Step::Consumed(consumed);
        }
        if emit {
            self.statements
                .push(make(condition.to_string(), at..at + consumed));
        }
        self.opens.push(if emit { Open::If } else { Open::Skipped });
        Step::Consumed(consumed)
    }

    /// Consume the next line when it is exactly `{`.
    fn take_lone_brace(&mut self) -> bool {
        match self.lines.get(self.next) {
            Some(line) if line.text == "{" => {
                self.next += 1;
                true
            }
            _ => false,
        }
    }

    // -- calls and closers ---------------------------------------------------

    fn call(&mut self, at: usize, text: &str) -> Step {
        let Some(rest) = text.strip_prefix('$') else {
            return Step::NoMatch;
        };
        let block_len = ident_len(rest);
        let Some(after_at) = rest[block_len..].strip_prefix('@') else {
            return Step::NoMatch;
        };
        let function_len = ident_len(after_at);
        if block_len == 0 || function_len == 0 {
            return Step::NoMatch;
        }

        let mut tail = &after_at[function_len..];
        if let Some(after_parens) = tail.trim_start().strip_prefix("()") {
            tail = after_parens;
        }
        if let Some(after_semi) = tail.trim_start().strip_prefix(';') {
            tail = after_semi;
        }
        let consumed = text.len() - tail.len();
        self.statements.push(Statement::Call {
            block: rest[..block_len].to_string(),
            function: after_at[..function_len].to_string(),
            span: at..at + consumed,
        });
        Step::Consumed(consumed)
    }

    fn close(&mut self, at: usize, text: &str) -> Step {
        if !text.starts_with('}') {
            return Step::NoMatch;
        }
        // The `}` of a skipped header is dropped along with it.
        let opened = self.opens.pop();
        if opened != Some(Open::Skipped) {
            self.statements.push(Statement::Close { span: at..at + 1 });
        }
        self.closed_if = opened == Some(Open::If);
        Step::Consumed(1)
    }

    // -- assignment ----------------------------------------------------------

    /// `<ident> = <rhs>`; the right-hand side runs to end of line or the first `}` outside a literal.
    fn assignment(&mut self, at: usize, text: &str) -> Step {
        let name_len = ident_len(text);
        if name_len == 0 || text.as_bytes()[0].is_ascii_digit() {
            return Step::NoMatch;
        }
        let Some(rhs) = text[name_len..].trim_start().strip_prefix('=') else {
            return Step::NoMatch;
        };
        if rhs.starts_with('=') {
            return Step::NoMatch;
        }
        let rhs_start = text.len() - rhs.len();
        let consumed = match find_code_byte(rhs, b'}') {
            Some(close) => rhs_start + close,
            None => text.len(),
        };
        let rhs = text[rhs_start..consumed].trim();
        let rhs = rhs.strip_suffix(';').unwrap_or(rhs).trim_end();
        if rhs.is_empty() {
            debug!("assignment without a value: `{}`", text);
            return Step::Consumed(consumed);
        }

        let span = at..at + text[..consumed].trim_end().len();
        let value = match parse_generator(rhs) {
            None => Value::Literal(rhs.to_string()),
            Some(Ok(spec)) => Value::Generator(spec),
            Some(Err(err)) => {
                let kind = match err {
                    RangeError::TooLarge { .. } => DiagnosticKind::RangeTooLarge,
                    RangeError::InvalidSyntax(_) => DiagnosticKind::InvalidRangeSyntax,
                };
                self.report(kind, err.to_string(), span);
                return Step::Consumed(consumed);
            }
        };
        self.statements.push(Statement::Assignment {
            variable: text[..name_len].to_string(),
            value,
            span,
        });
        Step::Consumed(consumed)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ident_len(text: &str) -> usize {
    text.bytes().take_while(|&b| is_ident_byte(b)).count()
}

/// `text` after `word`, if `text` starts with `word` as a whole word.
pub(crate) fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    match rest.bytes().next() {
        Some(b) if is_ident_byte(b) => None,
        _ => Some(rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> (Vec<Statement>, Diagnostics) {
        let mut diags = Diagnostics::new(128);
        let stmts = parse_body(body, 0..body.len(), 0, &mut diags);
        (stmts, diags)
    }

    #[test]
    fn decodes_known_escapes_only() {
        let (text, used) = decode_print_literal(r#"a\"b\q\\" rest"#).unwrap();
        assert_eq!(text, "a\"b\\q\\");
        assert_eq!(used, 9);
    }

    #[test]
    fn close_and_else_on_one_line() {
        let (stmts, diags) = parse("if x == 1 {\nprint(\"one\")\n} else {\nprint(\"two\")\n}");
        assert!(diags.is_empty());
        assert!(matches!(stmts[0], Statement::If { ref condition, .. } if condition == "x == 1"));
        assert!(matches!(stmts[2], Statement::Close { .. }));
        assert!(matches!(stmts[3], Statement::Else { .. }));
        assert_eq!(stmts.len(), 6);
    }

    #[test]
    fn brace_on_next_line_is_accepted() {
        let (stmts, diags) = parse("if ready\n{\nx = 1\n}");
        assert!(diags.is_empty());
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn missing_brace_is_reported() {
        let (stmts, diags) = parse("if ready\nx = 1");
        assert_eq!(diags.iter().next().map(|d| d.kind), Some(DiagnosticKind::MissingBrace));
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn empty_condition_is_reported() {
        let (_, diags) = parse("if {\n}");
        assert_eq!(diags.iter().next().map(|d| d.kind), Some(DiagnosticKind::EmptyCondition));
    }

    #[test]
    fn assignment_stops_at_closing_brace() {
        let (stmts, diags) = parse("if x == 1 { y = 2 } else { y = seq[1...5]; }");
        assert!(diags.is_empty());
        assert_eq!(stmts.len(), 6);
        assert!(matches!(
            stmts[1],
            Statement::Assignment { value: Value::Literal(ref v), ref span, .. }
                if v == "2" && *span == (12..17)
        ));
        assert!(matches!(stmts[2], Statement::Close { .. }));
        assert!(matches!(stmts[4], Statement::Assignment { value: Value::Generator(_), .. }));
        assert!(matches!(stmts[5], Statement::Close { .. }));
    }

    #[test]
    fn brace_inside_literal_does_not_end_assignment() {
        let (stmts, _) = parse("s = \"}\" }");
        assert!(matches!(
            stmts[0],
            Statement::Assignment { value: Value::Literal(ref v), .. } if v == "\"}\""
        ));
        assert!(matches!(stmts[1], Statement::Close { .. }));
    }

    #[test]
    fn invalid_generator_keeps_following_close() {
        let (stmts, diags) = parse("if c { x = seq[1...5:0] }");
        assert_eq!(diags.len(), 1);
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[1], Statement::Close { .. }));
    }

    #[test]
    fn skipped_if_takes_its_close_and_else_along() {
        let (stmts, diags) = parse("if x {\nif {\nprint(\"a\")\n} else {\nprint(\"b\")\n}\n}");
        assert_eq!(diags.len(), 1);
        let shapes: Vec<_> = stmts
            .iter()
            .map(|s| match s {
                Statement::If { .. } => "if",
                Statement::Print { .. } => "print",
                Statement::Close { .. } => "close",
                _ => "other",
            })
            .collect();
        assert_eq!(shapes, ["if", "print", "print", "close"]);
    }

    #[test]
    fn else_without_if_is_dropped() {
        let (stmts, diags) = parse("x = 1\nelse {\nprint(\"b\")\n}");
        assert!(diags.is_empty());
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[1], Statement::Print { .. }));
    }

    #[test]
    fn comparison_is_not_assignment() {
        let (stmts, _) = parse("x == 1");
        assert!(stmts.is_empty());
    }

    #[test]
    fn call_with_optional_parens() {
        let (stmts, _) = parse("$other@helper();");
        assert_eq!(
            stmts,
            vec![Statement::Call {
                block: "other".into(),
                function: "helper".into(),
                span: 0..16,
            }]
        );
    }

    #[test]
    fn spans_are_absolute() {
        let src = "#a { fn f() {\n    print(\"hi\")\n} }";
        let start = src.find('\n').unwrap() + 1;
        let end = src.rfind('}').unwrap();
        let mut diags = Diagnostics::new(8);
        let stmts = parse_body(src, start..end, 0, &mut diags);
        let span = stmts[0].span().clone();
        assert_eq!(&src[span], "print(\"hi\")");
    }
}
