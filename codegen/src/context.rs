use std::collections::{HashMap, HashSet};

/// A file-scope counter backing one sequential or reciprocal generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub name: String,
    pub function: String,
    pub variable: String,
}

/// State shared across every function emitted for one translation unit.
#[derive(Debug, Default)]
pub struct EmitContext {
    cursors: Vec<Cursor>,
    index: HashMap<(String, String), usize>,
    uses_random: bool,
}

impl EmitContext {
    pub fn new() -> Self {
        EmitContext::default()
    }

    /// The cursor for `variable` in `function`, created on first use.
    /// Every assignment to the same variable in the same function shares it.
    pub fn cursor_for(&mut self, function: &str, variable: &str) -> String {
        let key = (function.to_string(), variable.to_string());
        if let Some(&i) = self.index.get(&key) {
            return self.cursors[i].name.clone();
        }
        let name = format!("xf_cursor{}_{}_{}", self.cursors.len(), function, variable);
        self.index.insert(key, self.cursors.len());
        self.cursors.push(Cursor {
            name: name.clone(),
            function: function.to_string(),
            variable: variable.to_string(),
        });
        name
    }

    pub fn cursors(&self) -> &[Cursor] {
        &self.cursors
    }

    pub fn mark_random(&mut self) {
        self.uses_random = true;
    }

    pub fn uses_random(&self) -> bool {
        self.uses_random
    }
}

/// Nested C scopes of one function body, tracking which `int`s are declared.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<HashSet<String>>,
}

impl ScopeStack {
    /// A stack holding only the function scope.
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![HashSet::new()],
        }
    }

    pub fn open(&mut self) {
        self.scopes.push(HashSet::new());
    }

    /// Pop the innermost conditional scope. `false` when only the function scope is left.
    pub fn close(&mut self) -> bool {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            true
        } else {
            false
        }
    }

    /// Conditional scopes currently open.
    pub fn open_count(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Record an assignment to `name`. `true` when it needs a declaration,
    /// i.e. no enclosing scope has declared it yet.
    pub fn declare(&mut self, name: &str) -> bool {
        if self.scopes.iter().any(|scope| scope.contains(name)) {
            return false;
        }
        if let Some(innermost) = self.scopes.last_mut() {
            innermost.insert(name.to_string());
        }
        true
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursors_are_shared_per_function_and_variable() {
        let mut ctx = EmitContext::new();
        let a = ctx.cursor_for("b_f", "x");
        let b = ctx.cursor_for("b_f", "x");
        let c = ctx.cursor_for("b_g", "x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(ctx.cursors().len(), 2);
    }

    #[test]
    fn declarations_follow_scopes() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.declare("x"));
        assert!(!scopes.declare("x"));
        scopes.open();
        assert!(!scopes.declare("x"));
        assert!(scopes.declare("y"));
        assert!(scopes.close());
        assert!(scopes.declare("y"));
        assert!(!scopes.close());
    }
}
