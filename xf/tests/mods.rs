use std::fs;

use xf::mods::{ModSet, RuleError, parse_rule_line};
use xf::ModRule;

fn rules(pairs: &[(&str, &str)]) -> ModSet {
    ModSet::from_rules(
        pairs
            .iter()
            .map(|(from, to)| ModRule {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect(),
    )
}

#[test]
fn whole_tokens_only() {
    let set = rules(&[("foo", "baz")]);
    assert_eq!(set.apply("foo bar").text, "baz bar");
    assert_eq!(set.apply("food foo_ foo").text, "food foo_ baz");
}

#[test]
fn substitution_is_idempotent_when_targets_do_not_match() {
    let set = rules(&[("foo", "baz")]);
    let once = set.apply("foo bar").text;
    assert_eq!(set.apply(&once).text, "baz bar");
}

#[test]
fn replacement_text_is_not_rescanned() {
    let set = rules(&[("a", "b"), ("b", "c")]);
    assert_eq!(set.apply("a b").text, "b c");
}

#[test]
fn first_rule_wins() {
    let set = rules(&[("x", "first"), ("x", "second")]);
    assert_eq!(set.apply("x").text, "first");
}

#[test]
fn string_literals_are_untouched() {
    let set = rules(&[("hi", "bye")]);
    assert_eq!(
        set.apply(r#"hi "hi \" hi" hi"#).text,
        r#"bye "hi \" hi" bye"#
    );
    assert_eq!(set.apply("hi \"hi\nhi").text, "bye \"hi\nhi");
}

#[test]
fn non_ascii_passes_through() {
    let set = rules(&[("x", "y")]);
    assert_eq!(set.apply("x→x é").text, "y→y é");
}

#[test]
fn source_map_maps_back() {
    let set = rules(&[("p", "print")]);
    let sub = set.apply("p(1) p(2)");
    assert_eq!(sub.text, "print(1) print(2)");
    assert_eq!(sub.map.to_original(5), 1);
    assert_eq!(sub.map.to_original(2), 0);
    assert_eq!(sub.map.to_original(9), 5);
    assert_eq!(sub.map.to_original(14), 6);
    assert_eq!(sub.map.span_to_original(&(9..17)), 5..9);
}

#[test]
fn rule_line_format() {
    assert_eq!(
        parse_rule_line(r#"  "func" = "fn"  "#),
        Some(Ok(ModRule {
            from: "func".into(),
            to: "fn".into(),
        }))
    );
    assert_eq!(parse_rule_line(""), None);
    assert_eq!(parse_rule_line("// comment"), None);
    assert_eq!(parse_rule_line("# comment"), None);
    assert_eq!(parse_rule_line(r#""a" "b""#), Some(Err(RuleError::Malformed)));
    assert_eq!(
        parse_rule_line(r#""two words" = "x""#),
        Some(Err(RuleError::NotAToken("two words".into())))
    );
}

#[test]
fn load_dir_reads_sorted_rule_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.xfmod"), "\"say\" = \"second\"\n").unwrap();
    fs::write(
        dir.path().join("a.xfmod"),
        "// aliases\n\"say\" = \"print\"\nnot a rule\n\"func\" = \"fn\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("ignored.txt"), "\"x\" = \"y\"\n").unwrap();
    fs::write(dir.path().join("empty.xfmod"), "").unwrap();

    let set = ModSet::load_dir(dir.path());
    let froms: Vec<_> = set.rules().iter().map(|r| r.from.as_str()).collect();
    assert_eq!(froms, ["say", "func", "say"]);
    assert_eq!(set.apply("say").text, "print");
}

#[test]
fn missing_dir_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let set = ModSet::load_dir(&dir.path().join("nope"));
    assert!(set.is_empty());
}
