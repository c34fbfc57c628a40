use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use xf::Diagnostic;

/// Renders translation diagnostics to stderr with source context.
pub struct Reporter {
    writer: StandardStream,
    config: term::Config,
}

impl Reporter {
    pub fn new(no_color: bool, context_lines: usize) -> Self {
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Reporter {
            writer: StandardStream::stderr(color_choice),
            config: term::Config {
                before_label_lines: context_lines,
                after_label_lines: context_lines,
                ..term::Config::default()
            },
        }
    }

    pub fn diagnostics(
        &self,
        files: &SimpleFiles<String, String>,
        diagnostics: &[Diagnostic],
        dropped: usize,
    ) {
        for diag in diagnostics {
            let report = diag.to_diagnostic();
            let _ = term::emit_to_write_style(&mut self.writer.lock(), &self.config, files, &report);
        }
        if dropped > 0 {
            eprintln!(
                "note: {} further diagnostic(s) were dropped after the limit was reached",
                dropped
            );
        }
    }
}
