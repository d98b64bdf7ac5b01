// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Strips SQL comments from input text before it reaches the lexer.

/// Removes `--` line comments and `/* .. */` block comments from `input`.
///
/// Comment markers inside single-quoted literals and double-quoted
/// identifiers are left untouched. Block comments do not nest, matching
/// Oracle's reading of them. A line comment swallows everything up to, but
/// not including, the line terminator, so line counts are preserved.
pub fn strip_comments(input: &str) -> String {
    #[derive(Copy, Clone, PartialEq)]
    enum State {
        Code,
        SingleQuoted,
        DoubleQuoted,
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '\'' => {
                    state = State::SingleQuoted;
                    out.push(c);
                }
                '"' => {
                    state = State::DoubleQuoted;
                    out.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                _ => out.push(c),
            },
            State::SingleQuoted => {
                out.push(c);
                if c == '\'' {
                    // An immediately following quote is an escaped quote, not
                    // the end of the literal.
                    if chars.peek() == Some(&'\'') {
                        out.push(chars.next().unwrap());
                    } else {
                        state = State::Code;
                    }
                }
            }
            State::DoubleQuoted => {
                out.push(c);
                if c == '"' {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn strip_line_comment() {
        assert_eq!(
            strip_comments("SELECT 1 -- one\nFROM dual"),
            "SELECT 1 \nFROM dual"
        );
    }

    #[test]
    fn strip_block_comment() {
        assert_eq!(
            strip_comments("SELECT /* the answer */ 42 FROM dual"),
            "SELECT  42 FROM dual"
        );
    }

    #[test]
    fn keep_markers_inside_literals() {
        assert_eq!(
            strip_comments("SELECT '--not a comment' FROM dual"),
            "SELECT '--not a comment' FROM dual"
        );
        assert_eq!(
            strip_comments(r#"SELECT "weird--name" FROM t"#),
            r#"SELECT "weird--name" FROM t"#
        );
    }

    #[test]
    fn escaped_quote_does_not_end_literal() {
        assert_eq!(
            strip_comments("SELECT 'it''s -- fine' FROM dual"),
            "SELECT 'it''s -- fine' FROM dual"
        );
    }

    #[test]
    fn unterminated_block_comment_is_dropped() {
        assert_eq!(strip_comments("SELECT 1 /* oops"), "SELECT 1 ");
    }
}
