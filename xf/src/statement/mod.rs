pub mod generator;

use std::ops::Range;

use crate::statement::generator::GeneratorSpec;

/// A single classified line (or line fragment) of a function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `print("...")` with the literal already decoded.
    Print { text: String, span: Range<usize> },
    /// `variable = value`
    Assignment {
        variable: String,
        value: Value,
        span: Range<usize>,
    },
    /// `if <condition> {`
    If { condition: String, span: Range<usize> },
    /// `else if <condition> {`
    ElseIf { condition: String, span: Range<usize> },
    /// `else {`
    Else { span: Range<usize> },
    /// `$block@function`
    Call {
        block: String,
        function: String,
        span: Range<usize>,
    },
    /// `}` closing the innermost conditional body.
    Close { span: Range<usize> },
}

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Expression text copied verbatim into the target.
    Literal(String),
    Generator(GeneratorSpec),
}

impl Statement {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Statement::Print { span, .. } => span,
            Statement::Assignment { span, .. } => span,
            Statement::If { span, .. } => span,
            Statement::ElseIf { span, .. } => span,
            Statement::Else { span } => span,
            Statement::Call { span, .. } => span,
            Statement::Close { span } => span,
        }
    }
}
