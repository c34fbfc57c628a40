use std::fmt;

use tracing::debug;
use xf::Program;
use xf::block::FunctionDef;
use xf::statement::{Statement, Value};

use crate::c_string;
use crate::context::{EmitContext, ScopeStack};
use crate::generator::{self, Template};
use crate::preamble;
use crate::writer::CWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The program has no function marked as entry point.
    NoEntryPoint,
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitError::NoEntryPoint => write!(f, "no entry point: program has no functions"),
        }
    }
}

impl std::error::Error for EmitError {}

/// Render `program` as one C11 translation unit.
pub fn emit_program(program: &Program) -> Result<String, EmitError> {
    let entry = program.entry().ok_or(EmitError::NoEntryPoint)?;

    // Bodies first: they decide which cursors and helpers the preamble needs.
    let mut ctx = EmitContext::new();
    let mut bodies = CWriter::new();
    for function in program.functions() {
        write_function(&mut bodies, &mut ctx, function);
        bodies.blank();
    }

    let mut w = CWriter::new();
    preamble::write_headers(&mut w, ctx.uses_random());
    preamble::write_helpers(&mut w, ctx.uses_random());

    if !ctx.cursors().is_empty() {
        for cursor in ctx.cursors() {
            w.line(&format!(
                "static int {} = 0; /* {} in {} */",
                cursor.name, cursor.variable, cursor.function
            ));
        }
        w.blank();
    }

    for function in program.functions() {
        w.line(&format!("void {}(void);", function.mangled));
    }
    w.blank();

    w.raw(&bodies.finish());
    preamble::write_main(&mut w, &entry.mangled, ctx.uses_random());

    debug!(
        "emitted {} function(s), {} cursor(s), entry {}",
        program.functions().count(),
        ctx.cursors().len(),
        entry.mangled
    );
    Ok(w.finish())
}

fn write_function(w: &mut CWriter, ctx: &mut EmitContext, function: &FunctionDef) {
    w.open(&format!("void {}(void)", function.mangled));
    let mut scopes = ScopeStack::new();

    for stmt in &function.statements {
        match stmt {
            Statement::Print { text, .. } => {
                w.line(&format!("print_utf8(\"{}\");", c_string::encode(text)));
            }
            Statement::Assignment {
                variable, value, ..
            } => write_assignment(w, ctx, &mut scopes, &function.mangled, variable, value),
            Statement::If { condition, .. } => {
                scopes.open();
                w.open(&format!("if ({})", condition));
            }
            Statement::ElseIf { condition, .. } => {
                scopes.open();
                w.open(&format!("else if ({})", condition));
            }
            Statement::Else { .. } => {
                scopes.open();
                w.open("else");
            }
            Statement::Call {
                block, function: target, ..
            } => {
                w.line(&format!("{}();", xf::call_graph::mangle(block, target)));
            }
            Statement::Close { span } => {
                if scopes.close() {
                    w.close();
                } else {
                    debug!("stray `}}` at byte {} in {}", span.start, function.mangled);
                }
            }
        }
    }

    for _ in 0..scopes.open_count() {
        w.close();
    }
    w.close();
}

fn write_assignment(
    w: &mut CWriter,
    ctx: &mut EmitContext,
    scopes: &mut ScopeStack,
    function: &str,
    variable: &str,
    value: &Value,
) {
    let (rhs, template) = match value {
        Value::Literal(text) => (text.clone(), None),
        Value::Generator(spec) => {
            let template = generator::resolve(spec, || ctx.cursor_for(function, variable));
            if matches!(template, Template::Uniform { .. }) {
                ctx.mark_random();
            }
            (template.value_expr(), Some(template))
        }
    };

    if scopes.declare(variable) {
        w.line(&format!("int {} = {};", variable, rhs));
    } else {
        w.line(&format!("{} = {};", variable, rhs));
    }
    if let Some(advance) = template.as_ref().and_then(Template::advance) {
        w.line(&advance);
    }
}
