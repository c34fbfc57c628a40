use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use codegen::{Translation, translate};
use xf::{ModSet, ParserOptions};

const TEST_SUFFIX: &str = ".test.xf";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedDiagnostic {
    /// Diagnostic kind name, e.g. `"RangeTooLarge"`.
    pub kind: String,

    /// If set, the diagnostic must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// Mod rule lines applied before translation, in `"from" = "to"` form.
    #[serde(default)]
    pub mods: Vec<String>,

    /// Replaces the reserved entry names.
    #[serde(default)]
    pub entry_names: Option<Vec<String>>,

    /// Mangled name of the function expected to be the entry point.
    #[serde(default)]
    pub expect_entry: Option<String>,

    /// Substrings that must appear in the emitted C.
    #[serde(default)]
    pub expect_contains: Vec<String>,

    /// Substrings that must not appear in the emitted C.
    #[serde(default)]
    pub expect_absent: Vec<String>,

    /// Diagnostics expected in order. When absent, translation must succeed.
    #[serde(default)]
    pub expect_diagnostics: Option<Vec<ExpectedDiagnostic>>,
}

/// Split a `.test.xf` file into its TOML frontmatter and xf source.
fn split_frontmatter(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let body = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);

    let close = body
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;
    let frontmatter = body[..close].trim_end_matches('\r');
    let rest = &body[close + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, source))
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    /// `None` on pass, the reason on failure.
    pub failure: Option<String>,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description
            .as_deref()
            .or_else(|| self.path.file_name().and_then(|n| n.to_str()))
            .map(|name| name.strip_suffix(TEST_SUFFIX).unwrap_or(name))
            .unwrap_or("?")
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, failure) = match std::fs::read_to_string(path) {
        Ok(content) => match split_frontmatter(&content) {
            Ok((config, source)) => {
                let failure = check_translation(path, &config, source);
                (config.description, failure)
            }
            Err(e) => (None, Some(format!("frontmatter error: {}", e))),
        },
        Err(e) => (None, Some(format!("cannot read file: {}", e))),
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        failure,
    }
}

/// Translate `source` under `config`. Returns `Some(reason)` on the first unmet expectation.
fn check_translation(path: &Path, config: &TestConfig, source: &str) -> Option<String> {
    let mut mods = ModSet::new();
    mods.parse_into(&config.mods.join("\n"), &path.display().to_string());
    let mut options = ParserOptions::default();
    if let Some(names) = &config.entry_names {
        options.entry_names = names.clone();
    }

    let translation = translate(source, 0, mods, options);

    match &config.expect_diagnostics {
        None if !translation.is_success() => {
            return Some(format!(
                "unexpected diagnostics:\n{}",
                describe_diagnostics(source, &translation)
            ));
        }
        None => {}
        Some(expected) => {
            if let Some(reason) = check_diagnostics(source, &translation, expected) {
                return Some(reason);
            }
        }
    }

    if let Some(expected) = &config.expect_entry {
        if translation.entry.as_deref() != Some(expected.as_str()) {
            return Some(format!(
                "expected entry point {}, got {}",
                expected,
                translation.entry.as_deref().unwrap_or("(none)")
            ));
        }
    }

    if config.expect_contains.is_empty() && config.expect_absent.is_empty() {
        return None;
    }
    let Some(output) = &translation.output else {
        return Some("expected C output, but none was produced".into());
    };
    for needle in &config.expect_contains {
        if !output.contains(needle.as_str()) {
            return Some(format!(
                "emitted C does not contain:\n    {}\n  output:\n{}",
                needle,
                indent(output)
            ));
        }
    }
    for needle in &config.expect_absent {
        if output.contains(needle.as_str()) {
            return Some(format!("emitted C unexpectedly contains: {}", needle));
        }
    }
    None
}

fn check_diagnostics(
    source: &str,
    translation: &Translation,
    expected: &[ExpectedDiagnostic],
) -> Option<String> {
    let actual = &translation.diagnostics;
    if actual.len() != expected.len() || translation.dropped > 0 {
        return Some(format!(
            "expected {} diagnostic(s), got {}\n  actual diagnostics:\n{}",
            expected.len(),
            actual.len() + translation.dropped,
            describe_diagnostics(source, translation)
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        if actual.kind.name() != expected.kind {
            return Some(format!(
                "diagnostic[{}]: expected {}, got {}",
                i, expected.kind, actual
            ));
        }
        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "diagnostic[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }
    None
}

fn describe_diagnostics(source: &str, translation: &Translation) -> String {
    if translation.diagnostics.is_empty() {
        return "    (none)".to_string();
    }
    translation
        .diagnostics
        .iter()
        .map(|d| {
            format!(
                "    - line {}: {}",
                byte_offset_to_line(source, d.span.start),
                d
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    | {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// `.test.xf` files under `root`, keyed by sub-folder ("" for the root itself).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(TEST_SUFFIX));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }
}

/// Pick the categories to run. Unknown names are reported and skipped.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let nested = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&nested) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                available.join(", ")
            );
        }
    }
    selected
}

/// Run one `.test.xf` file, or every one under a directory.
/// Returns the process exit code: 0 when everything passed.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { color: !no_color };
    let mut results = Vec::new();

    if path.is_file() {
        let result = run_single_test(path);
        print_result(&palette, &result);
        results.push(result);
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
            return 1;
        }
        let selected = select_categories(&all, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        for (category, files) in selected {
            eprintln!();
            eprintln!("{}", palette.paint("1", category_label(category)));
            for file in files {
                let result = run_single_test(file);
                print_result(&palette, &result);
                results.push(result);
            }
        }
    }

    print_summary(&palette, &results)
}

fn print_result(palette: &Palette, result: &TestResult) {
    let status = if result.failure.is_none() {
        palette.pass()
    } else {
        palette.fail()
    };
    eprintln!("  {}  {}", status, result.label());
}

fn print_summary(palette: &Palette, results: &[TestResult]) -> i32 {
    let failures: Vec<&TestResult> = results.iter().filter(|r| r.failure.is_some()).collect();
    let passed = results.len() - failures.len();

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for result in &failures {
            eprintln!();
            eprintln!("  --- {} ---", result.path.display());
            for line in result.failure.iter().flat_map(|reason| reason.lines()) {
                eprintln!("  {}", line);
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", palette.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("31", "FAILED"),
            passed,
            failures.len(),
            results.len()
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmatter_is_split_from_source() {
        let (config, source) = split_frontmatter(
            "---\ndescription = \"hello\"\nexpect_contains = [\"x\"]\n---\n#a { fn f() { } }\n",
        )
        .unwrap();
        assert_eq!(config.description.as_deref(), Some("hello"));
        assert_eq!(config.expect_contains, ["x"]);
        assert_eq!(source, "#a { fn f() { } }\n");
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        assert!(split_frontmatter("#a { fn f() { } }").is_err());
    }

    #[test]
    fn diagnostics_are_matched_by_kind_and_line() {
        let (config, source) = split_frontmatter(
            "---\nexpect_diagnostics = [{ kind = \"RangeTooLarge\", line = 3 }]\n---\n#a {\n fn f() {\n  x = seq[1...9000]\n }\n}\n",
        )
        .unwrap();
        assert_eq!(check_translation(Path::new("t.test.xf"), &config, source), None);
    }

    #[test]
    fn bundled_suite_passes() {
        let suite = Path::new(env!("CARGO_MANIFEST_DIR")).join("../testsuite");
        assert_eq!(run_tests(&suite, true, &[]), 0);
    }

    #[test]
    fn line_numbers_are_one_based() {
        assert_eq!(byte_offset_to_line("a\nb\nc", 0), 1);
        assert_eq!(byte_offset_to_line("a\nb\nc", 2), 2);
        assert_eq!(byte_offset_to_line("a\nb\nc", 99), 3);
    }
}
