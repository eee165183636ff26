//! A small scanner over the restricted expression grammar that fluent
//! assertion receivers and arguments are written in.
//!
//! The grammar is deliberately narrow: dotted identifier chains, call and
//! indexer groups with balanced delimiters, string and character literals,
//! generic method arguments, postfix `!`, null-conditional `?.`, a leading
//! `new`, and parenthesized units. Anything else terminates the receiver.

/// Returns true for bytes that can appear in an identifier.
///
/// Bytes at or above 0x80 are accepted so that scanning never stops inside
/// a multi-byte UTF-8 sequence.
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'@' || b >= 0x80
}

fn closer_for(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None,
    }
}

fn opener_for(close: u8) -> Option<u8> {
    match close {
        b')' => Some(b'('),
        b']' => Some(b'['),
        b'}' => Some(b'{'),
        _ => None,
    }
}

/// Skips a string or character literal starting at `start` (the opening
/// quote, or the `@` of a verbatim string). Returns the index just past it.
fn skip_literal_forward(b: &[u8], start: usize) -> Option<usize> {
    let (quote, verbatim, mut i) = match b[start] {
        b'@' => (b'"', true, start + 2),
        q => (q, false, start + 1),
    };
    while i < b.len() {
        let c = b[i];
        if verbatim {
            if c == b'"' {
                if b.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                return Some(i + 1);
            }
        } else if c == b'\\' {
            i += 2;
            continue;
        } else if c == quote {
            return Some(i + 1);
        } else if c == b'\n' {
            return None;
        }
        i += 1;
    }
    None
}

/// Given the index of an opening `(`, `[` or `{`, returns the index of its
/// matching closer. String and character literals are skipped.
pub fn matching_close(source: &str, open: usize) -> Option<usize> {
    let b = source.as_bytes();
    closer_for(*b.get(open)?)?;
    let mut stack: Vec<u8> = Vec::new();
    let mut i = open;
    while i < b.len() {
        let c = b[i];
        match c {
            b'"' | b'\'' => {
                i = skip_literal_forward(b, i)?;
                continue;
            }
            b'@' if b.get(i + 1) == Some(&b'"') => {
                i = skip_literal_forward(b, i)?;
                continue;
            }
            b'(' | b'[' | b'{' => stack.push(c),
            b')' | b']' | b'}' => {
                let expected = closer_for(stack.pop()?)?;
                if expected != c {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Walks backwards from a closing quote at `close` to the opening quote of
/// the literal, including any `@`/`$` prefix.
fn literal_start_back(b: &[u8], close: usize) -> Option<usize> {
    let quote = b[close];
    let mut j = close;
    loop {
        j = j.checked_sub(1)?;
        if b[j] == b'\n' {
            return None;
        }
        if b[j] != quote {
            continue;
        }
        let mut slashes = 0;
        while j > slashes && b[j - slashes - 1] == b'\\' {
            slashes += 1;
        }
        if slashes % 2 == 0 {
            break;
        }
    }
    while j > 0 && matches!(b[j - 1], b'@' | b'$') {
        j -= 1;
    }
    Some(j)
}

/// Given the index of a closing `)`, `]` or `}`, returns the index of its
/// matching opener.
pub fn matching_open(source: &str, close: usize) -> Option<usize> {
    let b = source.as_bytes();
    opener_for(*b.get(close)?)?;
    let mut stack: Vec<u8> = Vec::new();
    let mut i = close + 1;
    while i > 0 {
        i -= 1;
        let c = b[i];
        match c {
            b'"' | b'\'' => {
                i = literal_start_back(b, i)?;
            }
            b')' | b']' | b'}' => stack.push(c),
            b'(' | b'[' | b'{' => {
                let expected = opener_for(stack.pop()?)?;
                if expected != c {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Consumes generic type arguments `<...>` ending at `close` (a `>`).
/// Returns the index of the `<` when the span looks like a type list and is
/// attached to an identifier.
fn generic_open_back(b: &[u8], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = close + 1;
    while j > 0 {
        j -= 1;
        match b[j] {
            b'>' => depth += 1,
            b'<' => {
                depth -= 1;
                if depth == 0 {
                    return (j > 0 && is_ident_byte(b[j - 1])).then_some(j);
                }
            }
            c if is_ident_byte(c) => {}
            b'.' | b',' | b' ' | b'?' | b'[' | b']' | b'(' | b')' => {}
            _ => return None,
        }
    }
    None
}

fn ident_start_back(b: &[u8], end: usize) -> usize {
    let mut j = end;
    while j > 0 && is_ident_byte(b[j - 1]) {
        j -= 1;
    }
    j
}

/// Extends a receiver starting at `start` leftwards over a `new` keyword.
fn include_new_keyword(b: &[u8], start: usize) -> usize {
    let mut j = start;
    while j > 0 && b[j - 1] == b' ' {
        j -= 1;
    }
    if j == start || j < 3 || &b[j - 3..j] != b"new" {
        return start;
    }
    if j > 3 && is_ident_byte(b[j - 4]) {
        return start;
    }
    j - 3
}

/// Keywords that may sit before a parenthesized expression.
const GROUP_KEYWORDS: &[&[u8]] = &[b"return", b"await", b"throw", b"else", b"in", b"case", b"yield"];

/// True when the group starting at `open` is spaced away from a name that
/// calls or indexes it, as in `Foo (x)`. Only spaces and tabs count, so a
/// group at the start of a line is never attached to the line above.
fn detached_call_name(b: &[u8], open: usize) -> bool {
    let mut j = open;
    while j > 0 && matches!(b[j - 1], b' ' | b'\t') {
        j -= 1;
    }
    let start = ident_start_back(b, j);
    start < j && !GROUP_KEYWORDS.contains(&&b[start..j])
}

#[derive(Clone, Copy)]
enum Scan {
    Primary,
    AfterIdent,
    AfterGroup,
}

/// Finds the start of the receiver expression that ends at `end`.
///
/// `end` is the index of the `.` that introduces `.Should()`. Returns `None`
/// when no receiver is attached (whitespace, an operator, or an unbalanced
/// delimiter sits directly to the left).
pub fn receiver_start(source: &str, end: usize) -> Option<usize> {
    let b = source.as_bytes();
    let mut i = end;
    let mut state = Scan::Primary;

    loop {
        let prev = if i > 0 { Some(b[i - 1]) } else { None };
        match state {
            Scan::Primary => match prev? {
                c if is_ident_byte(c) => {
                    i = ident_start_back(b, i);
                    state = Scan::AfterIdent;
                }
                b')' | b']' => {
                    i = matching_open(source, i - 1)?;
                    state = Scan::AfterGroup;
                }
                b'"' | b'\'' => {
                    i = literal_start_back(b, i - 1)?;
                    break;
                }
                b'!' if i > 1 && (is_ident_byte(b[i - 2]) || matches!(b[i - 2], b')' | b']')) => {
                    i -= 1;
                }
                _ => return None,
            },
            Scan::AfterIdent => match prev {
                Some(b'.') if i > 1 => {
                    i -= 1;
                    if b[i - 1] == b'?' {
                        i -= 1;
                    }
                    state = Scan::Primary;
                }
                _ => {
                    i = include_new_keyword(b, i);
                    break;
                }
            },
            Scan::AfterGroup => match prev {
                Some(c) if is_ident_byte(c) => state = Scan::Primary,
                Some(b')') | Some(b']') | Some(b'!') => state = Scan::Primary,
                Some(b'?') if b[i] == b'[' => {
                    i -= 1;
                    state = Scan::Primary;
                }
                Some(b'>') => match generic_open_back(b, i - 1) {
                    Some(open) => {
                        i = open;
                        state = Scan::Primary;
                    }
                    None => break,
                },
                Some(b' ' | b'\t') if detached_call_name(b, i) => return None,
                _ => break,
            },
        }
    }

    (i < end).then_some(i)
}

/// Splits `args` on commas that sit outside any delimiters or literals.
pub fn split_top_level(args: &str) -> Vec<&str> {
    let b = args.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'"' | b'\'' => {
                i = skip_literal_forward(b, i).unwrap_or(b.len());
                continue;
            }
            b'@' if b.get(i + 1) == Some(&b'"') => {
                i = skip_literal_forward(b, i).unwrap_or(b.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(args[last..i].trim());
                last = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    let tail = args[last..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Removes parentheses that wrap the whole expression. A tuple such as
/// `(a, b)` keeps its parentheses.
pub fn strip_outer_parens(expr: &str) -> &str {
    let mut expr = expr.trim();
    while expr.starts_with('(') && matching_close(expr, 0) == Some(expr.len() - 1) {
        let inner = expr[1..expr.len() - 1].trim();
        if split_top_level(inner).len() > 1 {
            break;
        }
        expr = inner;
    }
    expr
}

/// Returns true when `expr` contains whitespace or an operator outside any
/// delimiters, i.e. it would bind differently next to a binary operator.
pub fn has_top_level_operator(expr: &str) -> bool {
    let b = expr.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'"' | b'\'' => {
                i = skip_literal_forward(b, i).unwrap_or(b.len());
                continue;
            }
            b'@' if b.get(i + 1) == Some(&b'"') => {
                i = skip_literal_forward(b, i).unwrap_or(b.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'?' if depth == 0 && b.get(i + 1) == Some(&b'.') => i += 1,
            b'!' if depth == 0 && i > 0 && b.get(i + 1).is_none_or(|&n| n != b'=') => {}
            b'-' if depth == 0 && i == 0 => {}
            c if depth == 0 && (c.is_ascii_whitespace() || b"?:<>=&|+-*/%^".contains(&c)) => {
                return true;
            }
            _ => {}
        }
        i += 1;
    }
    false
}

/// Reads the identifier that starts at `start`, returning it with its end.
pub fn ident_at(source: &str, start: usize) -> Option<(&str, usize)> {
    let b = source.as_bytes();
    let mut j = start;
    while j < b.len() && is_ident_byte(b[j]) {
        j += 1;
    }
    (j > start).then(|| (&source[start..j], j))
}
