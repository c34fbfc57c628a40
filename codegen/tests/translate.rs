use codegen::generator::{self, Template};
use codegen::{Translation, translate};
use xf::statement::generator::parse_generator;
use xf::{DiagnosticKind, ModRule, ModSet, ParserOptions};

fn run(source: &str) -> Translation {
    translate(source, 0, ModSet::new(), ParserOptions::default())
}

fn emit(source: &str) -> String {
    let translation = run(source);
    assert!(
        translation.is_success(),
        "translation failed: {:?}",
        translation.diagnostics
    );
    translation.output.unwrap()
}

fn kinds(translation: &Translation) -> Vec<DiagnosticKind> {
    translation.diagnostics.iter().map(|d| d.kind).collect()
}

/// Step a cursor template the way the emitted C does.
fn simulate(template: &Template, activations: usize) -> Vec<i64> {
    let count = match template {
        Template::Ascending { count, .. } | Template::Descending { count, .. } => *count,
        Template::Uniform { .. } => panic!("random generators have no cursor"),
    };
    let mut cursor = 0;
    let mut values = Vec::new();
    for _ in 0..activations {
        values.push(template.value_at(cursor).unwrap());
        cursor += 1;
        if cursor >= count {
            cursor = 0;
        }
    }
    values
}

fn template(rhs: &str) -> Template {
    let spec = parse_generator(rhs).unwrap().unwrap();
    generator::resolve(&spec, || "c".to_string())
}

#[test]
fn hello_world() {
    let c = emit("#hello {\n    fn call() {\n        print(\"hello\")\n    }\n}\n");
    assert!(c.contains("void hello_call(void);"));
    assert!(c.contains("print_utf8(\"hello\");"));
    assert!(c.contains("    hello_call();\n"));
    assert!(c.contains("int main(void)"));
    assert!(!c.contains("<time.h>"));
}

#[test]
fn sequential_wraps_after_end() {
    assert_eq!(simulate(&template("sequential[1...5]"), 7), [1, 2, 3, 4, 5, 1, 2]);
}

#[test]
fn reciprocal_counts_down_and_wraps() {
    assert_eq!(simulate(&template("reciprocal[1...5]"), 7), [5, 4, 3, 2, 1, 5, 4]);
}

#[test]
fn stepped_sequence_stops_before_end() {
    assert_eq!(simulate(&template("seq[1...6:2]"), 4), [1, 3, 5, 1]);
    assert_eq!(simulate(&template("rcp[1...6:2]"), 4), [6, 4, 2, 6]);
}

#[test]
fn generator_cursor_is_file_scope() {
    let c = emit("#b {\n fn f() {\n  x = sequential[1...20]\n  x = sequential[1...20]\n }\n}");
    assert_eq!(c.matches("static int xf_cursor0_b_f_x = 0;").count(), 1);
    assert!(c.contains("int x = 1 + xf_cursor0_b_f_x;"));
    assert!(c.contains("    x = 1 + xf_cursor0_b_f_x;"));
    assert_eq!(c.matches("if (++xf_cursor0_b_f_x >= 20) xf_cursor0_b_f_x = 0;").count(), 2);
}

#[test]
fn random_pulls_in_seed_and_helper() {
    let c = emit("#b {\n fn f() {\n  y = random[1...20:2]\n }\n}");
    assert!(c.contains("#include <time.h>"));
    assert!(c.contains("srand((unsigned int)time(NULL));"));
    assert!(c.contains("int y = xf_random_between(1, 20);"));
    assert!(!c.contains("xf_cursor"));
}

#[test]
fn oversized_range_skips_only_that_statement() {
    let t = run("#b {\n fn f() {\n  x = sequential[1...5000]\n  print(\"still here\")\n }\n}");
    assert_eq!(kinds(&t), [DiagnosticKind::RangeTooLarge]);
    let c = t.output.unwrap();
    assert!(!c.contains("int x"));
    assert!(c.contains("print_utf8(\"still here\");"));
}

#[test]
fn descending_range_is_copied_verbatim() {
    let c = emit("#b {\n fn f() {\n  x = sequential[5...1]\n }\n}");
    assert!(c.contains("int x = sequential[5...1];"));
}

#[test]
fn escaped_quote_round_trips() {
    let c = emit("#b {\n fn f() {\n  print(\"say \\\"hi\\\"\")\n }\n}");
    assert!(c.contains(r#"print_utf8("say \"hi\"");"#));
}

#[test]
fn non_ascii_text_uses_octal_escapes() {
    let c = emit("#b {\n fn f() {\n  print(\"你好\")\n }\n}");
    assert!(c.contains(r#"print_utf8("\344\275\240\345\245\275");"#));
}

#[test]
fn last_reserved_name_is_entry() {
    let t = run("#a {\n fn call() {\n }\n}\n#b {\n fn main() {\n }\n}\n#c {\n fn helper() {\n }\n}");
    assert!(t.is_success());
    assert_eq!(t.entry.as_deref(), Some("b_main"));
    assert!(t.output.unwrap().contains("    b_main();\n    return 0;"));
}

#[test]
fn conditionals_track_declarations() {
    let c = emit(
        "#b {\n fn f() {\n  x = 1\n  if x == 1 {\n   x = 2\n   y = 3\n  } else {\n   y = 4\n  }\n }\n}",
    );
    assert!(c.contains("    int x = 1;\n    if (x == 1) {\n        x = 2;\n        int y = 3;\n    }\n"));
    assert!(c.contains("    else {\n        int y = 4;\n    }\n"));
}

#[test]
fn unbalanced_braces_abort_the_block() {
    let t = run("#b {\n fn f() {\n  if ready {\n   print(\"x\")\n }\n}");
    // The function's own brace closes the conditional, leaving the block open.
    assert_eq!(kinds(&t), [DiagnosticKind::UnmatchedBraces]);
    assert!(t.output.is_none());
}

#[test]
fn calls_across_blocks() {
    let c = emit("#a {\n fn call() {\n  $b@helper\n }\n}\n#b {\n fn helper() {\n  print(\"hi\")\n }\n}");
    let prototype = c.find("void b_helper(void);").unwrap();
    let call = c.find("    b_helper();").unwrap();
    assert!(prototype < call);
}

#[test]
fn unresolved_call_is_reported() {
    let t = run("#a {\n fn call() {\n  $nowhere@helper\n  print(\"after\")\n }\n}");
    assert_eq!(kinds(&t), [DiagnosticKind::UnresolvedCall]);
    let c = t.output.unwrap();
    assert!(!c.contains("nowhere_helper"));
    assert!(c.contains("print_utf8(\"after\");"));
}

#[test]
fn unmatched_block_produces_no_output() {
    let t = run("#a { fn f() { print(\"x\") }");
    assert_eq!(kinds(&t), [DiagnosticKind::UnmatchedBraces]);
    assert!(t.output.is_none());
}

#[test]
fn mods_apply_before_scanning() {
    let mods = ModSet::from_rules(vec![
        ModRule {
            from: "func".into(),
            to: "fn".into(),
        },
        ModRule {
            from: "say".into(),
            to: "print".into(),
        },
    ]);
    let t = translate(
        "#m {\n func call() {\n  say(\"say\")\n }\n}",
        0,
        mods,
        ParserOptions::default(),
    );
    assert!(t.is_success());
    assert!(t.output.unwrap().contains("print_utf8(\"say\");"));
}

#[test]
fn assignment_inside_one_line_conditional() {
    let c = emit("#b {\n fn f() {\n  x = 1\n  if x == 1 { y = 2 }\n  print(\"after\")\n }\n}");
    assert!(c.contains(
        "    int x = 1;\n    if (x == 1) {\n        int y = 2;\n    }\n    print_utf8(\"after\");\n"
    ));
}

#[test]
fn generator_inside_one_line_conditional() {
    let c = emit("#b {\n fn f() {\n  if 1 { x = seq[1...5] }\n }\n}");
    assert!(c.contains("    if (1) {\n        int x = 1 + xf_cursor0_b_f_x;\n"));
    assert!(c.contains("xf_cursor0_b_f_x = 0;\n    }\n"));
}

#[test]
fn skipped_if_drops_its_else() {
    let t = run("#b {\n fn f() {\n  if {\n   print(\"a\")\n  } else {\n   print(\"b\")\n  }\n }\n}");
    assert_eq!(kinds(&t), [DiagnosticKind::EmptyCondition]);
    let c = t.output.unwrap();
    assert!(!c.contains("else {"));
    assert!(c.contains("    print_utf8(\"a\");\n    print_utf8(\"b\");\n}\n"));
}

#[test]
fn skipped_if_does_not_close_enclosing_conditional() {
    let t = run(
        "#b {\n fn f() {\n  if ready {\n   if {\n   }\n   print(\"in\")\n  } else {\n   print(\"out\")\n  }\n }\n}",
    );
    assert_eq!(kinds(&t), [DiagnosticKind::EmptyCondition]);
    let c = t.output.unwrap();
    assert!(c.contains(
        "    if (ready) {\n        print_utf8(\"in\");\n    }\n    else {\n        print_utf8(\"out\");\n    }\n"
    ));
}

#[test]
fn function_names_never_shadow_preamble_helpers() {
    let c = emit("#print {\n fn utf8() {\n  $xf@random_between\n }\n}\n#xf {\n fn random_between() {\n }\n}");
    assert_eq!(c.matches("static void print_utf8(const char *text)").count(), 2);
    assert!(c.contains("void xf_user_print_utf8(void);"));
    assert!(c.contains("    xf_user_xf_random_between();\n"));
    assert!(c.contains("    xf_user_print_utf8();\n    return 0;"));
}
