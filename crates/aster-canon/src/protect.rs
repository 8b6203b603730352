//! Steps 3–5 of the canonicalizer pipeline: smart-quote normalization,
//! string-literal protection, and line-comment removal.
//!
//! String contents must never be touched by any later rewrite (article
//! removal, keyword normalization, identifier translation, ...); comments
//! must be gone before those rewrites run too. Both are handled in one
//! left-to-right scan so a quote inside a comment (or a comment marker
//! inside a string) is classified correctly.

use aster_base::{Result, Span, SpannedError, Symbol};
use aster_lexicon::Lexicon;

/// Sentinel wrapping a placeholder index. Chosen from the Unicode Private
/// Use Area so it can never collide with real source text, and so later
/// regex-based steps never accidentally match across a placeholder boundary.
const MARK: char = '\u{E000}';

/// Replaces U+201C/U+201D and U+2018/U+2019 with straight ASCII quotes.
/// Only applied for the English skin — other locales' smart-quote
/// conventions, if any, are the lexicon's own quote characters.
fn normalize_smart_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Result of protecting string literals: the text with each string literal's
/// content replaced by a `MARK{index}MARK` placeholder, and the original
/// contents (without the surrounding quotes) in placeholder order so step 13
/// can restore them verbatim.
pub struct Protected {
    pub text: String,
    pub strings: Vec<String>,
}

/// Runs smart-quote normalization, string protection, and line-comment
/// removal in one pass (`spec.md` §4.2 steps 3–5).
///
/// Standalone comments (only whitespace precedes the marker on their line)
/// are removed but leave behind a blank line, preserving line numbers for
/// diagnostics raised by later stages. Inline comments truncate the line at
/// the marker and the trailing whitespace before it is trimmed.
pub fn protect(text: &str, lexicon: &Lexicon, file: Symbol) -> Result<Protected> {
    let text = if lexicon.id() == "en" { normalize_smart_quotes(text) } else { text.to_string() };

    let open = lexicon.punctuation().string_quote_open.as_str();
    let close = lexicon.punctuation().string_quote_close.as_str();
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();

    let mut out = String::with_capacity(text.len());
    let mut strings = Vec::new();
    let mut i = 0usize;
    let mut line = 1u32;
    let mut col = 1u32;
    let mut at_line_start = true;

    while i < n {
        if starts_with_at(&chars, i, open) {
            let (str_line, str_col) = (line, col);
            let open_len = open.chars().count();
            let (loc_i, loc_line, loc_col) = advance(&chars, i, open_len, line, col);
            let mut j = loc_i;
            let mut content = String::new();
            let mut closed = false;
            let (mut cur_line, mut cur_col) = (loc_line, loc_col);
            while j < n {
                if chars[j] == '\n' {
                    break;
                }
                if chars[j] == '\\' && j + 1 < n {
                    content.push(chars[j]);
                    content.push(chars[j + 1]);
                    let (nj, nl, nc) = advance(&chars, j, 2, cur_line, cur_col);
                    j = nj;
                    cur_line = nl;
                    cur_col = nc;
                    continue;
                }
                if starts_with_at(&chars, j, close) {
                    closed = true;
                    let close_len = close.chars().count();
                    let (nj, nl, nc) = advance(&chars, j, close_len, cur_line, cur_col);
                    j = nj;
                    cur_line = nl;
                    cur_col = nc;
                    break;
                }
                content.push(chars[j]);
                let (nj, nl, nc) = advance(&chars, j, 1, cur_line, cur_col);
                j = nj;
                cur_line = nl;
                cur_col = nc;
            }
            if !closed {
                return Err(SpannedError::new(
                    "unterminated string literal",
                    Span::point(file, i, str_line, str_col),
                ));
            }
            out.push(MARK);
            out.push_str(&strings.len().to_string());
            out.push(MARK);
            strings.push(content);
            i = j;
            line = cur_line;
            col = cur_col;
            at_line_start = false;
            continue;
        }

        if chars[i] == '/' && i + 1 < n && chars[i + 1] == '/' || chars[i] == '#' {
            let standalone = at_line_start;
            let mut j = i;
            while j < n && chars[j] != '\n' {
                j += 1;
            }
            if standalone {
                // Leave a blank line in place of the comment.
            } else {
                while out.ends_with(' ') || out.ends_with('\t') {
                    out.pop();
                }
            }
            col += (j - i) as u32;
            i = j;
            continue;
        }

        let c = chars[i];
        out.push(c);
        if c == '\n' {
            line += 1;
            col = 1;
            at_line_start = true;
        } else {
            col += 1;
            if !c.is_whitespace() {
                at_line_start = false;
            }
        }
        i += 1;
    }

    Ok(Protected { text: out, strings })
}

fn starts_with_at(chars: &[char], i: usize, needle: &str) -> bool {
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() || i + needle_chars.len() > chars.len() {
        return false;
    }
    chars[i..i + needle_chars.len()] == needle_chars[..]
}

fn advance(chars: &[char], i: usize, count: usize, mut line: u32, mut col: u32) -> (usize, u32, u32) {
    let mut j = i;
    for _ in 0..count {
        if j >= chars.len() {
            break;
        }
        if chars[j] == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
        j += 1;
    }
    (j, line, col)
}

/// Restores each `MARK{index}MARK` placeholder with its original string
/// content, re-wrapped in the lexicon's quote characters (step 13).
pub fn restore(text: &str, strings: &[String], lexicon: &Lexicon) -> String {
    let open = &lexicon.punctuation().string_quote_open;
    let close = &lexicon.punctuation().string_quote_close;
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == MARK {
            let mut j = i + 1;
            let mut digits = String::new();
            while j < chars.len() && chars[j] != MARK {
                digits.push(chars[j]);
                j += 1;
            }
            if j < chars.len() && chars[j] == MARK {
                if let Ok(idx) = digits.parse::<usize>() {
                    if let Some(content) = strings.get(idx) {
                        out.push_str(open);
                        out.push_str(content);
                        out.push_str(close);
                        i = j + 1;
                        continue;
                    }
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_base::Interner;

    fn en_file() -> (Lexicon, Symbol) {
        let mut interner = Interner::new();
        (Lexicon::english(), interner.intern("test.cnl"))
    }

    #[test]
    fn protects_and_restores_a_simple_string() {
        let (lexicon, file) = en_file();
        let protected = protect(r#"print "hello world""#, &lexicon, file).unwrap();
        assert!(!protected.text.contains("hello world"));
        let restored = restore(&protected.text, &protected.strings, &lexicon);
        assert_eq!(restored, r#"print "hello world""#);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let (lexicon, file) = en_file();
        let err = protect(r#"print "hello"#, &lexicon, file).unwrap_err();
        assert_eq!(err.span.start_line, 1);
    }

    #[test]
    fn standalone_comment_becomes_blank_line() {
        let (lexicon, file) = en_file();
        let protected = protect("// a note\nLet x be 1.", &lexicon, file).unwrap();
        assert_eq!(protected.text, "\nLet x be 1.");
    }

    #[test]
    fn inline_comment_truncates_and_trims() {
        let (lexicon, file) = en_file();
        let protected = protect("Let x be 1. # trailing note", &lexicon, file).unwrap();
        assert_eq!(protected.text, "Let x be 1.");
    }

    #[test]
    fn possessive_inside_string_is_untouched_by_protection() {
        let (lexicon, file) = en_file();
        let protected = protect(r#"print "driver's license""#, &lexicon, file).unwrap();
        let restored = restore(&protected.text, &protected.strings, &lexicon);
        assert!(restored.contains("driver's license"));
    }
}
