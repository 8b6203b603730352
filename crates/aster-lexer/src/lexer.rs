//! The indentation-sensitive lexer (`spec.md` §4.3).

use crate::token::{OperatorKind, Token, TokenKind};
use aster_base::{Interner, Span, Symbol};
use aster_diagnostics::{DiagnosticBuilder, ErrorCode};
use aster_lexicon::{Lexicon, Punctuation, SemanticKind};
use std::collections::HashMap;

/// Tokenizes already-canonicalized `source` into a finite token stream
/// ending in `Eof`, plus any diagnostics raised along the way.
///
/// `lexicon` supplies the locale's structural punctuation and quote marks —
/// canonicalization never rewrites punctuation, only keywords — while
/// keyword recognition always matches against the built-in English
/// lexicon's surfaces, since canonicalization has already rewritten every
/// locale's keywords into their English canonical form. Identifiers are
/// interned into `interner` as they are scanned.
pub fn tokenize(
    source: &str,
    file: Symbol,
    lexicon: &Lexicon,
    interner: &mut Interner,
) -> (Vec<Token>, DiagnosticBuilder) {
    let english = Lexicon::english();
    let mut keyword_lookup: HashMap<&str, SemanticKind> = HashMap::new();
    for kind in SemanticKind::ALL {
        if matches!(kind, SemanticKind::True | SemanticKind::False | SemanticKind::Null) {
            continue;
        }
        if let Some(surface) = english.surface(*kind) {
            keyword_lookup.insert(surface, *kind);
        }
    }
    let bool_true = english.surface(SemanticKind::True).unwrap_or("true").to_string();
    let bool_false = english.surface(SemanticKind::False).unwrap_or("false").to_string();
    let null_surface = english.surface(SemanticKind::Null).unwrap_or("null").to_string();

    let mut tokens = Vec::new();
    let mut diagnostics = DiagnosticBuilder::new();
    let mut indent_stack: Vec<u32> = vec![0];

    let lines: Vec<&str> = source.split('\n').collect();
    let line_count = lines.len();
    let mut byte_offset = 0usize;

    for (idx, raw_line) in lines.iter().enumerate() {
        let line_no = (idx + 1) as u32;
        let is_last_physical_line = idx + 1 == line_count;
        let line_byte_start = byte_offset;
        byte_offset += raw_line.len() + 1; // the '\n' consumed between physical lines

        if raw_line.trim().is_empty() {
            if !is_last_physical_line {
                let span = Span::point(file, line_byte_start, line_no, 1);
                tokens.push(Token::new(TokenKind::Newline, span));
            }
            continue;
        }

        let leading_spaces = raw_line.len() - raw_line.trim_start_matches(' ').len();
        let w = leading_spaces as u32;

        if w % 2 != 0 {
            let span = Span::point(file, line_byte_start, line_no, 1);
            diagnostics.raise(ErrorCode::InvalidIndentation, Some(span), &[("found", w.to_string())]);
        }
        let adjusted_w = w - (w % 2);

        let top = *indent_stack.last().unwrap();
        if adjusted_w > top {
            indent_stack.push(adjusted_w);
            let span = Span::point(file, line_byte_start, line_no, 1);
            tokens.push(Token::new(TokenKind::Indent, span));
        } else if adjusted_w < top {
            while *indent_stack.last().unwrap() > adjusted_w {
                indent_stack.pop();
                let span = Span::point(file, line_byte_start, line_no, 1);
                tokens.push(Token::new(TokenKind::Dedent, span));
            }
            if *indent_stack.last().unwrap() != adjusted_w {
                let span = Span::point(file, line_byte_start, line_no, 1);
                diagnostics.raise(ErrorCode::InconsistentDedent, Some(span), &[]);
                indent_stack.push(adjusted_w);
            }
        }

        let content = &raw_line[leading_spaces..];
        let content_byte_start = line_byte_start + leading_spaces;
        let content_start_col = w + 1;
        let mut line_tokens = tokenize_line_content(
            content,
            file,
            line_no,
            content_start_col,
            content_byte_start,
            lexicon.punctuation(),
            &keyword_lookup,
            &bool_true,
            &bool_false,
            &null_surface,
            interner,
            &mut diagnostics,
        );
        tokens.append(&mut line_tokens);

        if !is_last_physical_line {
            let end_col = content_start_col + content.chars().count() as u32;
            let span = Span::point(file, byte_offset - 1, line_no, end_col);
            tokens.push(Token::new(TokenKind::Newline, span));
        }
    }

    let eof_line = line_count as u32;
    while indent_stack.len() > 1 {
        indent_stack.pop();
        let span = Span::point(file, byte_offset, eof_line, 1);
        tokens.push(Token::new(TokenKind::Dedent, span));
    }
    tokens.push(Token::new(TokenKind::Eof, Span::point(file, byte_offset, eof_line, 1)));

    (tokens, diagnostics)
}

/// Scans one physical line's content (the part after leading indentation)
/// into tokens. Strings cannot contain raw newlines (`spec.md` §9), so a
/// line is always a safe, self-contained unit for this scan.
#[allow(clippy::too_many_arguments)]
fn tokenize_line_content(
    content: &str,
    file: Symbol,
    line_no: u32,
    start_col: u32,
    byte_offset: usize,
    punctuation: &Punctuation,
    keyword_lookup: &HashMap<&str, SemanticKind>,
    bool_true: &str,
    bool_false: &str,
    null_surface: &str,
    interner: &mut Interner,
    diagnostics: &mut DiagnosticBuilder,
) -> Vec<Token> {
    let chars: Vec<char> = content.chars().collect();
    let n = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut col = start_col;
    let mut byte = byte_offset;

    let matches_at = |chars: &[char], i: usize, needle: &str| -> bool {
        let nc: Vec<char> = needle.chars().collect();
        !nc.is_empty() && i + nc.len() <= chars.len() && chars[i..i + nc.len()] == nc[..]
    };

    while i < n {
        let c = chars[i];

        if c == ' ' || c == '\t' {
            i += 1;
            col += 1;
            byte += c.len_utf8();
            continue;
        }

        if matches_at(&chars, i, &punctuation.string_quote_open) {
            let start_byte = byte;
            let start_col = col;
            let open_len = punctuation.string_quote_open.chars().count();
            for _ in 0..open_len {
                byte += chars[i].len_utf8();
                col += 1;
                i += 1;
            }
            let mut value = String::new();
            let mut closed = false;
            while i < n {
                if matches_at(&chars, i, &punctuation.string_quote_close) {
                    closed = true;
                    let close_len = punctuation.string_quote_close.chars().count();
                    for _ in 0..close_len {
                        byte += chars[i].len_utf8();
                        col += 1;
                        i += 1;
                    }
                    break;
                }
                if chars[i] == '\\' && i + 1 < n {
                    let escape = chars[i + 1];
                    match escape {
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        'u' => {
                            let hex_end = (i + 6).min(n);
                            let hex: String = chars[(i + 2).min(n)..hex_end].iter().collect();
                            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                                Some(decoded) => {
                                    value.push(decoded);
                                    let consumed = 2 + hex.chars().count();
                                    byte += chars[i..(i + consumed).min(n)].iter().map(|c| c.len_utf8()).sum::<usize>();
                                    col += consumed as u32;
                                    i += consumed;
                                    continue;
                                }
                                None => {
                                    let span = Span::point(file, byte, line_no, col);
                                    diagnostics.raise(
                                        ErrorCode::InvalidEscape,
                                        Some(span),
                                        &[("escape", format!("u{hex}"))],
                                    );
                                }
                            }
                        }
                        other => {
                            let span = Span::point(file, byte, line_no, col);
                            diagnostics.raise(
                                ErrorCode::InvalidEscape,
                                Some(span),
                                &[("escape", other.to_string())],
                            );
                        }
                    }
                    byte += chars[i].len_utf8() + chars[i + 1].len_utf8();
                    col += 2;
                    i += 2;
                    continue;
                }
                value.push(chars[i]);
                byte += chars[i].len_utf8();
                col += 1;
                i += 1;
            }
            if !closed {
                let span = Span::point(file, start_byte, line_no, start_col);
                diagnostics.raise(ErrorCode::UnterminatedString, Some(span), &[]);
            }
            let span = Span::new(file, start_byte, byte, line_no, start_col, line_no, col);
            tokens.push(Token::new(TokenKind::Str(value), span));
            continue;
        }

        if c.is_ascii_digit() {
            let start_byte = byte;
            let start_col = col;
            let mut text = String::new();
            while i < n && chars[i].is_ascii_digit() {
                text.push(chars[i]);
                byte += 1;
                col += 1;
                i += 1;
            }
            let mut is_float = false;
            if i < n && chars[i] == '.' && i + 1 < n && chars[i + 1].is_ascii_digit() {
                is_float = true;
                text.push('.');
                byte += 1;
                col += 1;
                i += 1;
                while i < n && chars[i].is_ascii_digit() {
                    text.push(chars[i]);
                    byte += 1;
                    col += 1;
                    i += 1;
                }
            }
            if is_float {
                let value: f64 = text.parse().unwrap_or(0.0);
                let span = Span::new(file, start_byte, byte, line_no, start_col, line_no, col);
                tokens.push(Token::new(TokenKind::Float(value), span));
            } else if i < n && chars[i] == 'L' {
                byte += 1;
                col += 1;
                i += 1;
                let value: i64 = text.parse().unwrap_or(0);
                let span = Span::new(file, start_byte, byte, line_no, start_col, line_no, col);
                tokens.push(Token::new(TokenKind::Long(value), span));
            } else {
                let value: i64 = text.parse().unwrap_or(0);
                let span = Span::new(file, start_byte, byte, line_no, start_col, line_no, col);
                tokens.push(Token::new(TokenKind::Int(value), span));
            }
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start_byte = byte;
            let start_col = col;
            let mut word = String::new();
            while i < n && (chars[i].is_alphanumeric() || chars[i] == '_') {
                word.push(chars[i]);
                byte += chars[i].len_utf8();
                col += 1;
                i += 1;
            }
            let span = Span::new(file, start_byte, byte, line_no, start_col, line_no, col);
            let kind = if word == bool_true {
                TokenKind::Bool(true)
            } else if word == bool_false {
                TokenKind::Bool(false)
            } else if word == null_surface {
                TokenKind::Null
            } else if let Some(semantic) = keyword_lookup.get(word.as_str()) {
                TokenKind::Keyword(*semantic)
            } else if word.chars().next().map(char::is_uppercase).unwrap_or(false) {
                TokenKind::TypeIdent(interner.intern(&word))
            } else {
                TokenKind::Ident(interner.intern(&word))
            };
            tokens.push(Token::new(kind, span));
            continue;
        }

        if let Some(mut tok) = scan_structural_punctuation(&chars, &mut i, &mut col, &mut byte, file, line_no, punctuation) {
            tokens.append(&mut tok);
            continue;
        }

        if let Some(token) = scan_symbol(&chars, &mut i, &mut col, &mut byte, file, line_no) {
            tokens.push(token);
            continue;
        }

        // Unrecognized character (stray punctuation the locale's tables don't
        // cover); skip it rather than abort the whole line.
        i += 1;
        col += 1;
        byte += c.len_utf8();
    }

    tokens
}

fn scan_structural_punctuation(
    chars: &[char],
    i: &mut usize,
    col: &mut u32,
    byte: &mut usize,
    file: Symbol,
    line_no: u32,
    punctuation: &Punctuation,
) -> Option<Vec<Token>> {
    let candidates: [(&str, TokenKind); 4] = [
        (&punctuation.statement_end, TokenKind::Dot),
        (&punctuation.list_separator, TokenKind::Comma),
        (&punctuation.enum_separator, TokenKind::Comma),
        (&punctuation.block_start, TokenKind::Colon),
    ];
    for (marker, kind) in candidates {
        let marker_chars: Vec<char> = marker.chars().collect();
        if marker_chars.is_empty() || *i + marker_chars.len() > chars.len() {
            continue;
        }
        if chars[*i..*i + marker_chars.len()] != marker_chars[..] {
            continue;
        }
        let start_byte = *byte;
        let start_col = *col;
        for _ in 0..marker_chars.len() {
            *byte += chars[*i].len_utf8();
            *col += 1;
            *i += 1;
        }
        let span = Span::new(file, start_byte, *byte, line_no, start_col, line_no, *col);
        return Some(vec![Token::new(kind, span)]);
    }
    None
}

fn scan_symbol(
    chars: &[char],
    i: &mut usize,
    col: &mut u32,
    byte: &mut usize,
    file: Symbol,
    line_no: u32,
) -> Option<Token> {
    let c = chars[*i];
    let (kind, width) = match c {
        '(' => (TokenKind::LParen, 1),
        ')' => (TokenKind::RParen, 1),
        '[' => (TokenKind::LBracket, 1),
        ']' => (TokenKind::RBracket, 1),
        '+' => (TokenKind::Operator(OperatorKind::Plus), 1),
        '-' => (TokenKind::Operator(OperatorKind::Minus), 1),
        '*' => (TokenKind::Operator(OperatorKind::Star), 1),
        '/' => (TokenKind::Operator(OperatorKind::Slash), 1),
        '<' if chars.get(*i + 1) == Some(&'=') => (TokenKind::Operator(OperatorKind::Le), 2),
        '>' if chars.get(*i + 1) == Some(&'=') => (TokenKind::Operator(OperatorKind::Ge), 2),
        '!' if chars.get(*i + 1) == Some(&'=') => (TokenKind::Operator(OperatorKind::Ne), 2),
        '<' => (TokenKind::Operator(OperatorKind::Lt), 1),
        '>' => (TokenKind::Operator(OperatorKind::Gt), 1),
        '=' => (TokenKind::Operator(OperatorKind::Assign), 1),
        '!' => (TokenKind::Operator(OperatorKind::Bang), 1),
        _ => return None,
    };
    let start_byte = *byte;
    let start_col = *col;
    for _ in 0..width {
        *byte += chars[*i].len_utf8();
        *col += 1;
        *i += 1;
    }
    let span = Span::new(file, start_byte, *byte, line_no, start_col, line_no, *col);
    Some(Token::new(kind, span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aster_lexicon::Lexicon;

    fn file(interner: &mut Interner) -> Symbol {
        interner.intern("test.cnl")
    }

    fn kinds(tokens: &[Token]) -> Vec<&TokenKind> {
        tokens.iter().map(|t| &t.kind).collect()
    }

    #[test]
    fn simple_let_statement_tokenizes() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let (tokens, diags) = tokenize("Let x be 1.", f, &lexicon, &mut interner);
        assert!(diags.is_empty());
        assert!(matches!(tokens[0].kind, TokenKind::Keyword(SemanticKind::Let)));
        assert!(matches!(tokens[1].kind, TokenKind::Ident(_)));
        assert!(matches!(tokens[2].kind, TokenKind::Keyword(SemanticKind::Be)));
        assert!(matches!(tokens[3].kind, TokenKind::Int(1)));
        assert!(matches!(tokens[4].kind, TokenKind::Dot));
        assert!(matches!(tokens.last().unwrap().kind, TokenKind::Eof));
    }

    #[test]
    fn type_ident_starts_uppercase() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let (tokens, _) = tokenize("Driver", f, &lexicon, &mut interner);
        assert!(matches!(tokens[0].kind, TokenKind::TypeIdent(_)));
    }

    #[test]
    fn every_indent_is_matched_by_a_dedent() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let source = "Rule f produce Int:\n  Let x be 1.\n  If x > 0:\n    Return x.\n  Return 0.";
        let (tokens, diags) = tokenize(source, f, &lexicon, &mut interner);
        assert!(diags.is_empty());
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, dedents);

        let mut depth = 0i32;
        for t in &tokens {
            match t.kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth -= 1,
                _ => {}
            }
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn odd_indentation_raises_invalid_indentation() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let source = "Rule f produce Int:\n   Return 1.";
        let (_, diags) = tokenize(source, f, &lexicon, &mut interner);
        assert!(diags.diagnostics().iter().any(|d| d.code == ErrorCode::InvalidIndentation));
    }

    #[test]
    fn dedent_to_unknown_level_is_inconsistent() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let source = "Rule f produce Int:\n    Let x be 1.\n  Return x.";
        let (_, diags) = tokenize(source, f, &lexicon, &mut interner);
        assert!(diags.diagnostics().iter().any(|d| d.code == ErrorCode::InconsistentDedent));
    }

    #[test]
    fn blank_line_does_not_affect_indentation() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let source = "Rule f produce Int:\n  Let x be 1.\n\n  Return x.";
        let (_, diags) = tokenize(source, f, &lexicon, &mut interner);
        assert!(diags.is_empty());
    }

    #[test]
    fn string_escape_sequences_decode() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let (tokens, diags) = tokenize(r#"print "a\nb\tc""#, f, &lexicon, &mut interner);
        assert!(diags.is_empty());
        let TokenKind::Str(value) = &tokens[1].kind else { panic!("expected string token") };
        assert_eq!(value, "a\nb\tc");
    }

    #[test]
    fn unknown_escape_raises_invalid_escape() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let (_, diags) = tokenize(r#"print "bad \q escape""#, f, &lexicon, &mut interner);
        assert!(diags.diagnostics().iter().any(|d| d.code == ErrorCode::InvalidEscape));
    }

    #[test]
    fn long_suffix_produces_long_token() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let (tokens, _) = tokenize("42L", f, &lexicon, &mut interner);
        assert!(matches!(tokens[0].kind, TokenKind::Long(42)));
    }

    #[test]
    fn decimal_point_produces_float_token() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let (tokens, _) = tokenize("3.14", f, &lexicon, &mut interner);
        assert!(matches!(tokens[0].kind, TokenKind::Float(_)));
    }

    #[test]
    fn true_false_null_are_literal_tokens_not_keywords() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let (tokens, _) = tokenize("true false null", f, &lexicon, &mut interner);
        assert!(matches!(tokens[0].kind, TokenKind::Bool(true)));
        assert!(matches!(tokens[1].kind, TokenKind::Bool(false)));
        assert!(matches!(tokens[2].kind, TokenKind::Null));
    }

    #[test]
    fn comparison_operators_tokenize() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let (tokens, _) = tokenize("x <= y", f, &lexicon, &mut interner);
        assert!(matches!(tokens[1].kind, TokenKind::Operator(OperatorKind::Le)));
        let _ = kinds(&tokens);
    }

    #[test]
    fn s6_three_space_indent_after_colon_is_invalid() {
        // spec.md §8 S6: an otherwise-valid rule body indented by three
        // spaces instead of two (or four) must fail with InvalidIndentation.
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::english();
        let source = "Rule f produce Int:\n   Return 1.";
        let (_, diags) = tokenize(source, f, &lexicon, &mut interner);
        let found = diags
            .diagnostics()
            .iter()
            .find(|d| d.code == ErrorCode::InvalidIndentation)
            .expect("expected InvalidIndentation diagnostic");
        assert_eq!(found.span.unwrap().start_line, 2);
    }

    #[test]
    fn chinese_punctuation_is_recognized_without_translation() {
        let mut interner = Interner::new();
        let f = file(&mut interner);
        let lexicon = Lexicon::chinese();
        let (tokens, diags) = tokenize("Return x。", f, &lexicon, &mut interner);
        assert!(diags.is_empty());
        assert!(matches!(tokens[2].kind, TokenKind::Dot));
    }
}
