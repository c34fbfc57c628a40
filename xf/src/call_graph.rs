use std::collections::HashSet;

use tracing::debug;

use crate::block::Block;
use crate::parser::error::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::statement::Statement;

/// Function names that take over as entry point from the first-defined function.
pub const DEFAULT_ENTRY_NAMES: [&str; 4] = ["call", "main", "Test", "you_function_name"];

/// C names defined by the emitted preamble. Generated helpers all start with `xf_`.
pub const RESERVED_C_NAMES: [&str; 1] = ["print_utf8"];

/// Prefix given to mangled names that would clash with the preamble or start with a digit.
pub const ESCAPE_PREFIX: &str = "xf_user_";

/// C identifier for `function` inside `block`.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`. Names in the `xf_` namespace,
/// names in [`RESERVED_C_NAMES`] and names starting with a digit get [`ESCAPE_PREFIX`].
/// Collisions between user functions are not detected.
pub fn mangle(block: &str, function: &str) -> String {
    let name: String = format!("{}_{}", block, function)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let clashes = name.starts_with("xf_")
        || RESERVED_C_NAMES.contains(&name.as_str())
        || name.starts_with(|c: char| c.is_ascii_digit());
    if clashes {
        format!("{}{}", ESCAPE_PREFIX, name)
    } else {
        name
    }
}

/// Index of the entry function among `names` (unqualified, in source order).
///
/// The first function is the default; any later function whose name is in
/// `reserved` takes over, the last such one winning.
pub fn select_entry<'a, I, S>(names: I, reserved: &[S]) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
    S: AsRef<str>,
{
    let mut entry = None;
    for (index, name) in names.into_iter().enumerate() {
        if entry.is_none() || reserved.iter().any(|r| r.as_ref() == name) {
            entry = Some(index);
        }
    }
    entry
}

/// Mark the entry function in place. Returns its mangled name.
pub fn mark_entry<S: AsRef<str>>(blocks: &mut [Block], reserved: &[S]) -> Option<String> {
    let names: Vec<String> = blocks
        .iter()
        .flat_map(|b| b.functions.iter().map(|f| f.name.clone()))
        .collect();
    let index = select_entry(names.iter().map(String::as_str), reserved)?;

    let function = blocks
        .iter_mut()
        .flat_map(|b| b.functions.iter_mut())
        .nth(index)?;
    function.is_entry = true;
    debug!("entry point: {}", function.mangled);
    Some(function.mangled.clone())
}

/// Drop calls whose target is not defined anywhere, reporting each as `UnresolvedCall`.
pub fn resolve_calls(blocks: &mut [Block], file_id: usize, diags: &mut Diagnostics) {
    let defined: HashSet<(String, String)> = blocks
        .iter()
        .flat_map(|b| b.functions.iter().map(|f| (f.block.clone(), f.name.clone())))
        .collect();

    for function in blocks.iter_mut().flat_map(|b| b.functions.iter_mut()) {
        function.statements.retain(|stmt| match stmt {
            Statement::Call {
                block,
                function: target,
                span,
            } => {
                if defined.contains(&(block.clone(), target.clone())) {
                    true
                } else {
                    diags.push(
                        Diagnostic::error(
                            DiagnosticKind::UnresolvedCall,
                            format!("call to undefined function `{}@{}`", block, target),
                            span.clone(),
                            file_id,
                        )
                        .with_note(format!("no `fn {}` is defined in a block `#{}`", target, block)),
                    );
                    false
                }
            }
            _ => true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangle_replaces_non_identifier_chars() {
        assert_eq!(mangle("a", "call"), "a_call");
        assert_eq!(mangle("my-block", "f.g"), "my_block_f_g");
    }

    #[test]
    fn mangle_escapes_preamble_names() {
        assert_eq!(mangle("print", "utf8"), "xf_user_print_utf8");
        assert_eq!(mangle("xf", "random_between"), "xf_user_xf_random_between");
        assert_eq!(mangle("xf", "cursor0_b_f_x"), "xf_user_xf_cursor0_b_f_x");
        assert_eq!(mangle("1st", "f"), "xf_user_1st_f");
        assert_eq!(mangle("xfa", "f"), "xfa_f");
    }

    #[test]
    fn first_function_is_default_entry() {
        assert_eq!(select_entry(["helper", "other"], &DEFAULT_ENTRY_NAMES), Some(0));
    }

    #[test]
    fn last_reserved_name_wins() {
        let names = ["call", "main", "helper"];
        assert_eq!(select_entry(names, &DEFAULT_ENTRY_NAMES), Some(1));
    }

    #[test]
    fn no_functions_no_entry() {
        assert_eq!(select_entry(Vec::<&str>::new(), &DEFAULT_ENTRY_NAMES), None);
    }
}
