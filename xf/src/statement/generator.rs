use std::fmt;

/// Upper bound on the number of values a single generator may cycle through.
pub const MAX_RANGE_ELEMENTS: i64 = 4096;

/// How a generator produces its next value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorMode {
    /// `sequential` / `seq`: counts up from `start`, wrapping after `end`.
    Sequential,
    /// `random` / `rnd`: a uniform draw from `[start, end]`.
    Random,
    /// `reciprocal` / `rcp`: counts down from `end`, wrapping below `start`.
    Reciprocal,
}

impl GeneratorMode {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "sequential" | "seq" => Some(GeneratorMode::Sequential),
            "random" | "rnd" => Some(GeneratorMode::Random),
            "reciprocal" | "rcp" => Some(GeneratorMode::Reciprocal),
            _ => None,
        }
    }
}

impl fmt::Display for GeneratorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorMode::Sequential => write!(f, "sequential"),
            GeneratorMode::Random => write!(f, "random"),
            GeneratorMode::Reciprocal => write!(f, "reciprocal"),
        }
    }
}

/// A validated `mode[start...end:step]` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorSpec {
    pub mode: GeneratorMode,
    pub start: i32,
    pub end: i32,
    pub step: i32,
}

impl GeneratorSpec {
    /// Number of values in one full cycle: `(end - start) / step + 1`.
    pub fn element_count(&self) -> i64 {
        (i64::from(self.end) - i64::from(self.start)) / i64::from(self.step) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    InvalidSyntax(String),
    TooLarge { count: i64 },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::InvalidSyntax(msg) => write!(f, "{}", msg),
            RangeError::TooLarge { count } => write!(
                f,
                "range has {} elements (max {})",
                count, MAX_RANGE_ELEMENTS
            ),
        }
    }
}

impl std::error::Error for RangeError {}

/// Recognize a generator right-hand side.
///
/// Returns `None` when `text` is not a generator shape at all. A descending range
/// (`end < start`) is also `None`: callers treat it as an ordinary expression.
pub fn parse_generator(text: &str) -> Option<Result<GeneratorSpec, RangeError>> {
    let text = text.trim();
    let open = text.find('[')?;
    let mode = GeneratorMode::from_keyword(text[..open].trim())?;
    parse_range(mode, &text[open + 1..]).transpose()
}

fn parse_range(mode: GeneratorMode, rest: &str) -> Result<Option<GeneratorSpec>, RangeError> {
    let inner = rest
        .strip_suffix(']')
        .ok_or_else(|| RangeError::InvalidSyntax("missing closing `]`".into()))?;
    let (start_text, tail) = inner.split_once("...").ok_or_else(|| {
        RangeError::InvalidSyntax(format!("expected `start...end`, found `{}`", inner.trim()))
    })?;
    let (end_text, step_text) = match tail.split_once(':') {
        Some((end, step)) => (end, Some(step)),
        None => (tail, None),
    };

    let start = parse_bound(start_text, "start")?;
    let end = parse_bound(end_text, "end")?;
    let step = match step_text {
        Some(text) => parse_bound(text, "step")?,
        None => 1,
    };
    if step <= 0 {
        return Err(RangeError::InvalidSyntax(format!(
            "step must be positive, got {}",
            step
        )));
    }
    if end < start {
        return Ok(None);
    }

    let spec = GeneratorSpec {
        mode,
        start,
        end,
        step,
    };
    let count = spec.element_count();
    if count > MAX_RANGE_ELEMENTS {
        return Err(RangeError::TooLarge { count });
    }
    Ok(Some(spec))
}

fn parse_bound(text: &str, what: &str) -> Result<i32, RangeError> {
    let text = text.trim();
    text.parse::<i32>()
        .map_err(|_| RangeError::InvalidSyntax(format!("invalid range {}: `{}`", what, text)))
}
