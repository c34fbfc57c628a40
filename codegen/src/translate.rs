use tracing::debug;
use xf::{Diagnostic, ModSet, Parser, ParserOptions};

use crate::emit::emit_program;

/// Everything one translation produced.
#[derive(Debug, Clone)]
pub struct Translation {
    /// Emitted C. Present on success, and after statement-level failures
    /// when the surviving program still has an entry point.
    pub output: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics dropped once the cap was reached.
    pub dropped: usize,
    /// Mangled name of the entry function, when one was selected.
    pub entry: Option<String>,
}

impl Translation {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty() && self.dropped == 0 && self.output.is_some()
    }
}

/// Run the whole pipeline: mod substitution, scanning, call resolution and C emission.
pub fn translate(source: &str, file_id: usize, mods: ModSet, options: ParserOptions) -> Translation {
    let parser = Parser::new(source.to_string(), file_id)
        .with_mods(mods)
        .with_options(options);

    let (program, diagnostics, dropped) = match parser.parse() {
        Ok(program) => (Some(program), Vec::new(), 0),
        Err(failure) => {
            let program = if failure.aborted { None } else { failure.partial };
            (program, failure.errors, failure.dropped)
        }
    };

    let entry = program
        .as_ref()
        .and_then(|p| p.entry())
        .map(|f| f.mangled.clone());
    let output = program.as_ref().and_then(|p| match emit_program(p) {
        Ok(c) => Some(c),
        Err(e) => {
            debug!("no C output: {}", e);
            None
        }
    });

    Translation {
        output,
        diagnostics,
        dropped,
        entry,
    }
}
