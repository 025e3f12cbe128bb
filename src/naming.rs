//! Schema identifiers → target-language identifiers.

/// Render one raw segment (property name, definition name, enum literal).
///
/// Hyphens become underscores and exactly the first character is upper-cased
/// (ASCII only). Word boundaries after the first character are left alone, so
/// `"foo-bar"` renders as `"Foo_bar"`, not `"Foo_Bar"`.
pub fn render_name(segment: &str) -> String {
    let snake = segment.replace('-', "_");
    let mut chars = snake.chars();
    match chars.next() {
        None => snake,
        Some(first) => {
            let mut out = String::with_capacity(snake.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
    }
}

/// Concatenate rendered segments of a definition path into one identifier.
pub fn render_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(|s| render_name(s.as_ref())).collect()
}
