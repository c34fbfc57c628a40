/// Encode `text` as the body of a C string literal (without the surrounding quotes).
///
/// Printable ASCII passes through; `"`, `\` and `\n \r \t` use their short escapes;
/// every other byte becomes a three-digit octal escape, so the next character can
/// never be absorbed into it. A `?` following another `?` is escaped to keep
/// trigraphs out of the output.
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut prev = 0u8;
    for &b in text.as_bytes() {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'?' if prev == b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(char::from(b)),
            _ => out.push_str(&format!("\\{:03o}", b)),
        }
        prev = b;
    }
    out
}
