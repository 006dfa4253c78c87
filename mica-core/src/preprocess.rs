use regex::Regex;

/// Options for the dialect-to-host rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Rewrite `"..."` literals into the runtime's UTF-32 literal form
    /// (`U"..."s`). Off by default; the runtime accepts narrow
    /// literals through its own conversion helpers.
    pub rewrite_string_literals: bool,
}

/// Maps dialect source text to host source text.
///
/// Total and pure: comments are stripped (quote-aware, so `//` inside
/// a string literal is not a comment), whitespace runs collapse to
/// single spaces, and the result is trimmed, so the output always
/// embeds as a single-line statement sequence. Idempotent under any
/// options. No host-language validation happens here; a syntax error
/// surfaces from the external compiler.
pub fn preprocess(text: &str, options: &PreprocessOptions) -> String {
    let whitespace = Regex::new(r"\s+").expect("whitespace pattern is valid");

    let text = strip_comments(text);
    let text = whitespace.replace_all(&text, " ");
    let text = text.trim().to_string();

    if options.rewrite_string_literals {
        // The optional prefix/suffix make the rewrite self-stable: a
        // literal already in `U"..."s` form maps onto itself.
        let literals =
            Regex::new(r#"U?"((?:[^"\\]|\\.)*)"s?"#).expect("string literal pattern is valid");
        literals.replace_all(&text, r#"U"$1"s"#).into_owned()
    } else {
        text
    }
}

/// Removes line and block comments, leaving string literals intact.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}
