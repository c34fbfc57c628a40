use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::parser::scan::{is_ident_byte, literal_end_unbounded};
use crate::source_map::SourceMap;

/// File extension of mod rule files.
pub const MOD_EXTENSION: &str = "xfmod";

/// Rule files larger than this are skipped.
pub const MAX_MOD_FILE_BYTES: u64 = 65536;

/// One whole-token substitution: every `from` token outside string literals becomes `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRule {
    pub from: String,
    pub to: String,
}

/// Why a rule line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    Malformed,
    NotAToken(String),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::Malformed => write!(f, "expected `\"from\" = \"to\"`"),
            RuleError::NotAToken(from) => {
                write!(f, "`{}` is not a single identifier token and can never match", from)
            }
        }
    }
}

impl std::error::Error for RuleError {}

/// Ordered rule list. The first rule whose `from` matches a token wins.
#[derive(Debug, Clone, Default)]
pub struct ModSet {
    rules: Vec<ModRule>,
}

/// Output of a substitution pass.
#[derive(Debug, Clone)]
pub struct Substitution {
    pub text: String,
    pub map: SourceMap,
}

impl ModSet {
    pub fn new() -> Self {
        ModSet { rules: Vec::new() }
    }

    pub fn from_rules(rules: Vec<ModRule>) -> Self {
        ModSet { rules }
    }

    pub fn rules(&self) -> &[ModRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append every valid rule line of `text`. `origin` names the file in log output.
    /// Returns the number of rules added.
    pub fn parse_into(&mut self, text: &str, origin: &str) -> usize {
        let mut added = 0;
        for (index, line) in text.lines().enumerate() {
            match parse_rule_line(line) {
                None => {}
                Some(Ok(rule)) => {
                    debug!("mod rule {}:{}: `{}` -> `{}`", origin, index + 1, rule.from, rule.to);
                    self.rules.push(rule);
                    added += 1;
                }
                Some(Err(err)) => {
                    warn!("skipping mod rule {}:{}: {}", origin, index + 1, err);
                }
            }
        }
        added
    }

    /// Load every `*.xfmod` file in `dir`, in file-name order.
    /// A missing directory, or an unreadable, empty or oversized file, is skipped.
    pub fn load_dir(dir: &Path) -> ModSet {
        let mut set = ModSet::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("no mods loaded from '{}': {}", dir.display(), e);
                return set;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(MOD_EXTENSION)
            })
            .collect();
        paths.sort();

        for path in paths {
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if size == 0 || size > MAX_MOD_FILE_BYTES {
                warn!("skipping mod file '{}': size {} bytes", path.display(), size);
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    let added = set.parse_into(&text, &path.display().to_string());
                    debug!("loaded {} rule(s) from '{}'", added, path.display());
                }
                Err(e) => warn!("skipping mod file '{}': {}", path.display(), e),
            }
        }
        set
    }

    fn lookup(&self, token: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.from == token)
            .map(|rule| rule.to.as_str())
    }

    /// Run the single substitution pass over `source`.
    /// Replacement text is never rescanned.
    pub fn apply(&self, source: &str) -> Substitution {
        let mut map = SourceMap::default();
        if self.rules.is_empty() {
            return Substitution {
                text: source.to_string(),
                map,
            };
        }

        let bytes = source.as_bytes();
        let mut out = String::with_capacity(source.len());
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'"' {
                let end = literal_end_unbounded(bytes, i);
                out.push_str(&source[i..end]);
                i = end;
            } else if is_ident_byte(b) {
                let start = i;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                let token = &source[start..i];
                match self.lookup(token) {
                    Some(to) => {
                        map.record(out.len()..out.len() + to.len(), start..i);
                        out.push_str(to);
                    }
                    None => out.push_str(token),
                }
            } else {
                let len = source[i..].chars().next().map_or(1, char::len_utf8);
                out.push_str(&source[i..i + len]);
                i += len;
            }
        }

        Substitution { text: out, map }
    }
}

/// Parse one line of a mod file.
/// Blank lines and `//` or `#` comment lines yield `None`.
pub fn parse_rule_line(line: &str) -> Option<Result<ModRule, RuleError>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
        return None;
    }
    Some(parse_rule(line))
}

fn parse_rule(line: &str) -> Result<ModRule, RuleError> {
    let (from, rest) = take_quoted(line).ok_or(RuleError::Malformed)?;
    let rest = rest
        .trim_start()
        .strip_prefix('=')
        .ok_or(RuleError::Malformed)?;
    let (to, rest) = take_quoted(rest.trim_start()).ok_or(RuleError::Malformed)?;
    if !rest.trim().is_empty() {
        return Err(RuleError::Malformed);
    }
    if from.is_empty() || !from.bytes().all(is_ident_byte) {
        return Err(RuleError::NotAToken(from.to_string()));
    }
    Ok(ModRule {
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// Split `"content" rest` into `(content, rest)`.
fn take_quoted(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('"')?;
    let close = body.find('"')?;
    Some((&body[..close], &body[close + 1..]))
}
