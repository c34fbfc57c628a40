use xf::statement::generator::{GeneratorMode, GeneratorSpec};

/// Emission strategy chosen for one generator assignment.
///
/// Each template is fully determined by the generator's constants; no values are
/// drawn or enumerated at translation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// `start + cursor * step`, cursor wrapping after `count` values.
    Ascending {
        cursor: String,
        start: i32,
        step: i32,
        count: i64,
    },
    /// `end - cursor * step`, cursor wrapping after `count` values.
    Descending {
        cursor: String,
        end: i32,
        step: i32,
        count: i64,
    },
    /// A fresh uniform draw from `[start, end]`.
    Uniform { start: i32, end: i32 },
}

/// Pick the template for `spec`. `cursor` names the persistent counter and is
/// only called for modes that need one.
pub fn resolve(spec: &GeneratorSpec, cursor: impl FnOnce() -> String) -> Template {
    match spec.mode {
        GeneratorMode::Sequential => Template::Ascending {
            cursor: cursor(),
            start: spec.start,
            step: spec.step,
            count: spec.element_count(),
        },
        GeneratorMode::Reciprocal => Template::Descending {
            cursor: cursor(),
            end: spec.end,
            step: spec.step,
            count: spec.element_count(),
        },
        GeneratorMode::Random => Template::Uniform {
            start: spec.start,
            end: spec.end,
        },
    }
}

impl Template {
    /// C expression producing the current value.
    pub fn value_expr(&self) -> String {
        match self {
            Template::Ascending {
                cursor,
                start,
                step,
                count,
            } => offset_expr(*start, '+', cursor, *step, *count),
            Template::Descending {
                cursor,
                end,
                step,
                count,
            } => offset_expr(*end, '-', cursor, *step, *count),
            Template::Uniform { start, end } => {
                format!("xf_random_between({}, {})", c_int(*start), c_int(*end))
            }
        }
    }

    /// C statement moving the cursor to the next value, if the template has one.
    pub fn advance(&self) -> Option<String> {
        match self {
            Template::Ascending { cursor, count, .. } | Template::Descending { cursor, count, .. } => {
                Some(format!("if (++{c} >= {n}) {c} = 0;", c = cursor, n = count))
            }
            Template::Uniform { .. } => None,
        }
    }

    /// Value yielded when the cursor holds `position`. Mirrors the emitted C.
    pub fn value_at(&self, position: i64) -> Option<i64> {
        match self {
            Template::Ascending {
                start, step, count, ..
            } if (0..*count).contains(&position) => Some(i64::from(*start) + position * i64::from(*step)),
            Template::Descending {
                end, step, count, ..
            } if (0..*count).contains(&position) => Some(i64::from(*end) - position * i64::from(*step)),
            _ => None,
        }
    }
}

/// `base op cursor * step`, widened to `long long` when the product can leave `int` range.
fn offset_expr(base: i32, op: char, cursor: &str, step: i32, count: i64) -> String {
    let reach = (count - 1) * i64::from(step);
    if reach > i64::from(i32::MAX) {
        format!(
            "(int)({} {} (long long){} * {})",
            c_int(base),
            op,
            cursor,
            step
        )
    } else if step == 1 {
        format!("{} {} {}", c_int(base), op, cursor)
    } else {
        format!("{} {} {} * {}", c_int(base), op, cursor, step)
    }
}

/// An `int` constant that is safe to splice into any expression.
pub fn c_int(value: i32) -> String {
    if value == i32::MIN {
        "(-2147483647 - 1)".to_string()
    } else if value < 0 {
        format!("({})", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(mode: GeneratorMode, start: i32, end: i32, step: i32) -> GeneratorSpec {
        GeneratorSpec {
            mode,
            start,
            end,
            step,
        }
    }

    #[test]
    fn random_has_no_cursor() {
        let template = resolve(&spec(GeneratorMode::Random, 1, 20, 2), || unreachable!());
        assert_eq!(template, Template::Uniform { start: 1, end: 20 });
        assert_eq!(template.advance(), None);
        assert_eq!(template.value_expr(), "xf_random_between(1, 20)");
    }

    #[test]
    fn negative_constants_are_parenthesised() {
        let template = resolve(&spec(GeneratorMode::Sequential, -3, 3, 2), || "c".into());
        assert_eq!(template.value_expr(), "(-3) + c * 2");
        assert_eq!(c_int(i32::MIN), "(-2147483647 - 1)");
    }

    #[test]
    fn wide_ranges_use_long_long() {
        let template = resolve(
            &spec(GeneratorMode::Sequential, -2_000_000_000, 2_000_000_000, 1_000_000_000),
            || "c".into(),
        );
        assert_eq!(
            template.value_expr(),
            "(int)((-2000000000) + (long long)c * 1000000000)"
        );
    }

    #[test]
    fn advance_wraps_at_count() {
        let template = resolve(&spec(GeneratorMode::Reciprocal, 1, 6, 2), || "c".into());
        assert_eq!(template.advance().as_deref(), Some("if (++c >= 3) c = 0;"));
        assert_eq!(template.value_at(2), Some(2));
        assert_eq!(template.value_at(3), None);
    }
}
