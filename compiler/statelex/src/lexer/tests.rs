use super::*;
use crate::ScanError;
use pretty_assertions::assert_eq;

const NUMBER: TokenType = TokenType::new(1);
const OPERATOR: TokenType = TokenType::new(2);
const IDENT: TokenType = TokenType::new(3);

// === Grammars ===

/// Digits, ignored spaces, single-character operators.
fn lex_expr(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.accept_run(" \t");
    l.ignore();
    match l.peek() {
        None => {
            l.emit(TokenType::EOF);
            None
        }
        Some('0'..='9') => Some(StateFn(lex_number)),
        Some('+' | '-' | '*' | '/') => {
            l.next();
            l.emit(OPERATOR);
            Some(StateFn(lex_expr))
        }
        Some(c) => l.errorf(format_args!("unexpected character {c:?}")),
    }
}

fn lex_number(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.accept_run('0'..='9');
    l.emit(NUMBER);
    Some(StateFn(lex_expr))
}

/// Identifiers; anything else is an error.
fn lex_idents(l: &mut Lexer<'_>) -> Option<StateFn> {
    if l.accept_while(char::is_alphabetic) > 0 {
        l.emit(IDENT);
        return Some(StateFn(lex_idents));
    }
    match l.next() {
        None => {
            l.emit(TokenType::EOF);
            None
        }
        Some(c) => l.errorf(format_args!("unexpected character {c:?}")),
    }
}

/// Emits every character as its own token, all from a single state call.
fn lex_all_at_once(l: &mut Lexer<'_>) -> Option<StateFn> {
    while l.next().is_some() {
        l.emit(IDENT);
    }
    l.emit(TokenType::EOF);
    None
}

/// Consumes everything and stops without a terminal token.
fn lex_silent_end(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.accept_while(|_| true);
    None
}

/// Emits EOF but keeps returning itself.
fn lex_eof_then_continue(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.emit(TokenType::EOF);
    l.emit(IDENT);
    Some(StateFn(lex_eof_then_continue))
}

/// Skips whitespace runs and emits everything else one character at a time.
fn lex_lines(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.accept_run(" \n");
    l.ignore();
    if l.next().is_none() {
        l.emit(TokenType::EOF);
        return None;
    }
    l.emit(IDENT);
    Some(StateFn(lex_lines))
}

fn collect<C>(lexer: &mut Lexer<'_, C>) -> Vec<(i32, String, usize)> {
    lexer
        .tokens()
        .map(|t| (t.typ.raw(), t.text, t.pos))
        .collect()
}

fn triple(typ: i32, text: &str, pos: usize) -> (i32, String, usize) {
    (typ, text.to_owned(), pos)
}

// === Scenarios ===

#[test]
fn arithmetic_expression() {
    let mut lexer = Lexer::new("expr", "1 + 23", StateFn(lex_expr));
    assert_eq!(
        collect(&mut lexer),
        vec![
            triple(1, "1", 0),
            triple(2, "+", 2),
            triple(1, "23", 4),
            triple(-1, "", 6),
        ]
    );
}

#[test]
fn error_ends_the_scan() {
    let mut lexer = Lexer::new("idents", "ab#cd", StateFn(lex_idents));
    assert_eq!(
        collect(&mut lexer),
        vec![
            triple(3, "ab", 0),
            triple(-2, "unexpected character '#'", 2),
        ]
    );
}

#[test]
fn empty_input_yields_only_eof() {
    let mut lexer = Lexer::new("empty", "", StateFn(lex_expr));
    assert_eq!(lexer.next_token(), Token::eof(0));
}

// === Terminal behavior ===

#[test]
fn eof_is_repeated_after_end() {
    let mut lexer = Lexer::new("expr", "7", StateFn(lex_expr));
    assert_eq!(lexer.next_token(), Token::new(NUMBER, "7", 0));
    assert_eq!(lexer.next_token(), Token::eof(1));
    assert_eq!(lexer.next_token(), Token::eof(1));
    assert_eq!(lexer.next_token(), Token::eof(1));
}

#[test]
fn error_is_repeated_after_end() {
    let mut lexer = Lexer::new("idents", "#", StateFn(lex_idents));
    let first = lexer.next_token();
    assert!(first.is_error());
    assert_eq!(lexer.next_token(), first);
    assert_eq!(lexer.next_token(), first);
}

#[test]
fn chain_without_terminal_gets_synthesized_eof() {
    let mut lexer = Lexer::new("silent", "abc", StateFn(lex_silent_end));
    assert_eq!(lexer.next_token(), Token::eof(3));
    assert_eq!(lexer.next_token(), Token::eof(3));
}

#[test]
fn no_transitions_after_terminal() {
    let mut lexer = Lexer::new("eof", "", StateFn(lex_eof_then_continue));
    assert_eq!(lexer.next_token(), Token::eof(0));
    assert_eq!(lexer.next_token(), Token::eof(0));
    assert!(lexer.state.is_some());
    assert!(lexer.finished);
}

#[test]
fn tokens_iterator_stops_after_terminal() {
    let mut lexer = Lexer::new("expr", "1", StateFn(lex_expr));
    let mut tokens = lexer.tokens();
    assert_eq!(tokens.next().map(|t| t.typ), Some(NUMBER));
    assert_eq!(tokens.next().map(|t| t.typ), Some(TokenType::EOF));
    assert_eq!(tokens.next(), None);
    assert_eq!(tokens.next(), None);
}

// === Laziness ===

#[test]
fn state_functions_run_on_demand() {
    let mut lexer = Lexer::new("expr", "12 + 3", StateFn(lex_expr));
    assert_eq!(lexer.cursor().pos(), 0);
    lexer.next_token();
    assert_eq!(lexer.cursor().pos(), 2);
    lexer.next_token();
    assert_eq!(lexer.cursor().pos(), 4);
}

#[test]
fn buffered_tokens_are_handed_out_in_order() {
    let mut lexer = Lexer::new("burst", "abc", StateFn(lex_all_at_once));
    assert_eq!(
        collect(&mut lexer),
        vec![
            triple(3, "a", 0),
            triple(3, "b", 1),
            triple(3, "c", 2),
            triple(-1, "", 3),
        ]
    );
}

// === Emission ===

#[test]
fn ignore_excludes_earlier_text() {
    let mut lexer = Lexer::new("expr", "   42", StateFn(lex_expr));
    assert_eq!(lexer.next_token(), Token::new(NUMBER, "42", 3));
}

#[test]
fn error_position_is_pending_start() {
    fn lex_fail_mid_token(l: &mut Lexer<'_>) -> Option<StateFn> {
        l.accept_run("ab");
        l.ignore();
        l.accept_run("cd");
        let pending = l.cursor().pending().into_owned();
        l.errorf(format_args!("bad run {pending:?}"))
    }
    let mut lexer = Lexer::new("fail", "abcd", StateFn(lex_fail_mid_token));
    assert_eq!(lexer.next_token(), Token::error("bad run \"cd\"", 2));
}

#[test]
fn emit_after_ignore_then_backup_is_empty() {
    fn lex_lookbehind(l: &mut Lexer<'_>) -> Option<StateFn> {
        l.next();
        l.ignore();
        l.backup();
        l.emit(OPERATOR);
        l.accept_run("ab");
        l.emit(IDENT);
        l.emit(TokenType::EOF);
        None
    }
    let mut lexer = Lexer::new("lookbehind", "ab", StateFn(lex_lookbehind));
    assert_eq!(
        collect(&mut lexer),
        vec![triple(2, "", 0), triple(3, "ab", 0), triple(-1, "", 2)]
    );
}

#[test]
fn zero_width_emit() {
    fn lex_marker(l: &mut Lexer<'_>) -> Option<StateFn> {
        l.emit(OPERATOR);
        l.accept_run('x');
        l.emit(IDENT);
        l.emit(TokenType::EOF);
        None
    }
    let mut lexer = Lexer::new("marker", "xx", StateFn(lex_marker));
    assert_eq!(
        collect(&mut lexer),
        vec![triple(2, "", 0), triple(3, "xx", 0), triple(-1, "", 2)]
    );
}

#[test]
fn malformed_bytes_keep_offsets() {
    let input = [b'a', 0xFF, b'b'];
    let mut lexer = Lexer::from_bytes("bytes", &input, StateFn(lex_all_at_once));
    assert_eq!(
        collect(&mut lexer),
        vec![
            triple(3, "a", 0),
            triple(3, "\u{FFFD}", 1),
            triple(3, "b", 2),
            triple(-1, "", 3),
        ]
    );
}

// === Grammar context ===

const OPEN: TokenType = TokenType::new(4);
const CLOSE: TokenType = TokenType::new(5);

/// Identifiers inside balanced parentheses. The context is the open depth.
fn lex_parens(l: &mut Lexer<'_, usize>) -> Option<StateFn<usize>> {
    l.accept_run(' ');
    l.ignore();
    if l.accept_while(char::is_alphabetic) > 0 {
        l.emit(IDENT);
        return Some(StateFn(lex_parens));
    }
    match l.next() {
        Some('(') => {
            *l.context_mut() += 1;
            l.emit(OPEN);
        }
        Some(')') => {
            if *l.context() == 0 {
                return l.errorf(format_args!("unbalanced ')'"));
            }
            *l.context_mut() -= 1;
            l.emit(CLOSE);
        }
        Some(c) => return l.errorf(format_args!("unexpected character {c:?}")),
        None => {
            let depth = *l.context();
            if depth > 0 {
                return l.errorf(format_args!("{depth} unclosed '('"));
            }
            l.emit(TokenType::EOF);
            return None;
        }
    }
    Some(StateFn(lex_parens))
}

#[test]
fn context_tracks_paren_depth() {
    let mut lexer = Lexer::with_context("parens", "(a (b)) c", StateFn(lex_parens), 0);
    let types: Vec<i32> = lexer.tokens().map(|t| t.typ.raw()).collect();
    assert_eq!(types, [4, 3, 4, 3, 5, 5, 3, -1]);
    assert_eq!(*lexer.context(), 0);
}

#[test]
fn unbalanced_close_paren_is_an_error() {
    let mut lexer = Lexer::with_context("parens", "(a)) b", StateFn(lex_parens), 0);
    assert_eq!(
        collect(&mut lexer),
        vec![
            triple(4, "(", 0),
            triple(3, "a", 1),
            triple(5, ")", 2),
            triple(-2, "unbalanced ')'", 3),
        ]
    );
}

#[test]
fn unclosed_paren_is_reported_at_end() {
    let mut lexer = Lexer::with_context("parens", "((a)", StateFn(lex_parens), 0);
    let last = lexer.tokens().last();
    assert_eq!(last, Some(Token::error("1 unclosed '('", 4)));
    assert_eq!(lexer.into_context(), 1);
}

#[test]
fn next_token_from_a_state_function_is_refused() {
    fn lex_reentrant(l: &mut Lexer<'_, Option<Token>>) -> Option<StateFn<Option<Token>>> {
        l.accept_run('a');
        let inner = l.next_token();
        *l.context_mut() = Some(inner);
        l.emit(IDENT);
        l.emit(TokenType::EOF);
        None
    }

    let mut lexer = Lexer::with_context("reentrant", "aa", StateFn(lex_reentrant), None);
    assert_eq!(
        collect(&mut lexer),
        vec![triple(3, "aa", 0), triple(-1, "", 2)]
    );
    assert_eq!(lexer.context(), &Some(Token::error(REENTRANT, 0)));
}

// === Line numbers ===

#[test]
fn line_number_follows_delivered_tokens() {
    let mut lexer = Lexer::new("lines", "a\nb\n\nc", StateFn(lex_lines));
    assert_eq!(lexer.line_number(), 1);
    assert_eq!(lexer.next_token().text, "a");
    assert_eq!(lexer.line_number(), 1);
    assert_eq!(lexer.next_token().text, "b");
    assert_eq!(lexer.line_number(), 2);
    assert_eq!(lexer.next_token().text, "c");
    assert_eq!(lexer.line_number(), 4);
}

// === tokenize ===

#[test]
fn tokenize_returns_tokens_without_eof() {
    let tokens = Lexer::new("expr", "1+2", StateFn(lex_expr)).tokenize();
    assert!(matches!(tokens.as_deref(), Ok([_, _, _])));
}

#[test]
fn tokenize_surfaces_lexical_error() {
    let err = Lexer::new("lines.txt", "ab\ncd#", StateFn(lex_lines_then_idents))
        .tokenize()
        .err();
    match err {
        Some(ScanError::Lexical {
            name,
            message,
            pos,
            line,
        }) => {
            assert_eq!(name, "lines.txt");
            assert_eq!(message, "unexpected character '#'");
            assert_eq!(pos, 5);
            assert_eq!(line, 2);
        }
        other => panic!("expected lexical error, got {other:?}"),
    }
}

fn lex_lines_then_idents(l: &mut Lexer<'_>) -> Option<StateFn> {
    if l.accept('\n') {
        l.ignore();
    }
    if l.accept_while(char::is_alphabetic) > 0 {
        l.emit(IDENT);
        return Some(StateFn(lex_lines_then_idents));
    }
    match l.next() {
        None => {
            l.emit(TokenType::EOF);
            None
        }
        Some('\n') => {
            l.ignore();
            Some(StateFn(lex_lines_then_idents))
        }
        Some(c) => {
            l.backup();
            l.errorf(format_args!("unexpected character {c:?}"))
        }
    }
}

#[test]
fn scan_error_display_includes_location() {
    let err = ScanError::Lexical {
        name: "input".to_owned(),
        message: "boom".to_owned(),
        pos: 0,
        line: 3,
    };
    assert_eq!(err.to_string(), "input:3: boom");
}

#[test]
fn debug_output_names_the_scan() {
    let lexer = Lexer::new("dbg", "", StateFn(lex_expr));
    let rendered = format!("{lexer:?}");
    assert!(rendered.starts_with("Lexer {"));
    assert!(rendered.contains("\"dbg\""));
}
