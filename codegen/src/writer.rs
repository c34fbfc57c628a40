const INDENT: &str = "    ";

/// Line-oriented C text builder that tracks brace indentation.
#[derive(Debug, Default)]
pub struct CWriter {
    out: String,
    depth: usize,
}

impl CWriter {
    pub fn new() -> Self {
        CWriter::default()
    }

    /// Write one line at the current indentation.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write `header {` and indent what follows.
    pub fn open(&mut self, header: &str) {
        if header.is_empty() {
            self.line("{");
        } else {
            self.line(&format!("{} {{", header));
        }
        self.depth += 1;
    }

    /// Dedent and write `}`.
    pub fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    /// Append text verbatim, without indentation.
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::CWriter;

    #[test]
    fn nested_blocks_indent() {
        let mut w = CWriter::new();
        w.open("void f(void)");
        w.open("if (x)");
        w.line("y();");
        w.close();
        w.close();
        assert_eq!(
            w.finish(),
            "void f(void) {\n    if (x) {\n        y();\n    }\n}\n"
        );
    }
}
