//! Normalizes doubled quotes inside embedded JSON documents.
//!
//! Verbatim string literals spell a literal quote as `""`. Test sources that
//! embed JSON this way are rewritten to use single-quoted JSON, which is
//! easier to read and is accepted by lenient JSON parsers.

use super::{MatchSpan, Rule, RuleMeta};
use std::ops::Range;

/// Keywords that mark a line as carrying an embedded document. The two
/// verbatim openers cover `$@"` as well, which contains `@"`.
pub const DEFAULT_MARKERS: &[&str] = &[
    "@\"",
    "@$\"",
    "json",
    "Json",
    "JSON",
    "script",
    "Script",
    "stateMachine",
];

const ESCAPED: &str = "\\\"\"";
const SENTINEL: char = '\u{E000}';

/// Rewrites `""` to `'` inside verbatim string content on eligible lines.
pub struct QuoteRule {
    meta: RuleMeta,
    markers: Vec<String>,
}

impl Default for QuoteRule {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS.iter().copied())
    }
}

impl QuoteRule {
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            meta: RuleMeta::new(
                "json-doubled-quotes",
                "\"\" -> ' inside verbatim literals on marked lines (\\\"\" preserved)",
            ),
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    fn is_marked(&self, line: &str) -> bool {
        self.markers.iter().any(|m| line.contains(m.as_str()))
    }
}

/// Lexer state carried from one line to the next.
#[derive(Default)]
struct LineState {
    /// Inside a verbatim literal; the flag records whether the line it
    /// opened on was marked.
    verbatim: Option<bool>,
}

/// A run of verbatim-literal content within one line.
struct Segment {
    range: Range<usize>,
    opened_marked: Option<bool>,
}

/// Splits `line` into the verbatim-literal content runs it contains.
///
/// `opened_marked` is `None` for a literal that opened on this line and
/// `Some(flag)` for one continued from an earlier line.
fn verbatim_segments(line: &str, state: &mut LineState, marked: bool) -> Vec<Segment> {
    let b = line.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut carried = state.verbatim;
    let mut i = 0;

    while i < b.len() {
        if state.verbatim.is_some() {
            if b[i] == b'"' {
                if b.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                segments.push(Segment {
                    range: start..i,
                    opened_marked: carried.take(),
                });
                state.verbatim = None;
            }
            i += 1;
            continue;
        }

        let opener = match (b[i], b.get(i + 1), b.get(i + 2)) {
            (b'@', Some(b'"'), _) => Some(2),
            (b'$', Some(b'@'), Some(b'"')) | (b'@', Some(b'$'), Some(b'"')) => Some(3),
            _ => None,
        };
        if let Some(len) = opener {
            state.verbatim = Some(marked);
            i += len;
            start = i;
            continue;
        }

        match b[i] {
            b'/' if b.get(i + 1) == Some(&b'/') => break,
            b'"' | b'\'' => {
                let quote = b[i];
                i += 1;
                while i < b.len() && b[i] != quote {
                    if b[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if state.verbatim.is_some() {
        segments.push(Segment {
            range: start..b.len(),
            opened_marked: carried,
        });
    }
    segments
}

/// Replaces doubled quotes with single quotes, keeping `\""` intact.
pub fn normalize_quotes(text: &str) -> String {
    text.replace(ESCAPED, &SENTINEL.to_string())
        .replace("\"\"", "'")
        .replace(SENTINEL, ESCAPED)
}

impl Rule for QuoteRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn find_matches(&self, source: &str) -> Vec<MatchSpan> {
        let mut spans = Vec::new();
        let mut state = LineState::default();
        let mut offset = 0;

        for line in source.split_inclusive('\n') {
            let marked = self.is_marked(line);
            for segment in verbatim_segments(line, &mut state, marked) {
                let eligible = marked || segment.opened_marked.unwrap_or(false);
                let text = &line[segment.range.clone()];
                if eligible && text.contains("\"\"") && !text.contains(SENTINEL) {
                    spans.push(MatchSpan::new(
                        offset + segment.range.start..offset + segment.range.end,
                    ));
                }
            }
            offset += line.len();
        }
        spans
    }

    fn rewrite(&self, source: &str, span: &MatchSpan) -> String {
        normalize_quotes(span.text(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::apply_rule;

    fn normalize(source: &str) -> String {
        apply_rule(&QuoteRule::default(), source).text
    }

    #[test]
    fn test_marked_line_is_rewritten() {
        assert_eq!(
            normalize("var json = @\"{ \"\"id\"\": \"\"start\"\" }\";"),
            "var json = @\"{ 'id': 'start' }\";"
        );
    }

    #[test]
    fn test_escaped_quote_survives_round_trip() {
        assert_eq!(
            normalize("var json = @\"{ \"\"msg\"\": \"\"say \\\"\"hi\\\"\"\"\" }\";"),
            "var json = @\"{ 'msg': 'say \\\"\"hi\\\"\"' }\";"
        );
    }

    #[test]
    fn test_continuation_lines_inherit_eligibility() {
        let source = "var script = @\"{\n    \"\"id\"\": \"\"m\"\",\n    \"\"initial\"\": \"\"a\"\"\n}\";\n";
        assert_eq!(
            normalize(source),
            "var script = @\"{\n    'id': 'm',\n    'initial': 'a'\n}\";\n"
        );
    }

    #[test]
    fn test_regular_strings_untouched() {
        let source = "var json = \"a\" + \"\" + \"b\";\nvar c = '\"';\n";
        assert_eq!(normalize(source), source);
    }

    #[test]
    fn test_empty_literals_untouched() {
        let source = "var json = \"\";\nvar script = @\"\";\n";
        assert_eq!(normalize(source), source);
    }

    #[test]
    fn test_comment_ends_scan() {
        let source = "var x = 1; // json: @\"\"\"\"a\"\"";
        assert_eq!(normalize(source), source);
    }

    #[test]
    fn test_interpolated_verbatim() {
        assert_eq!(
            normalize("var json = $@\"{{ \"\"id\"\": \"\"{id}\"\" }}\";"),
            "var json = $@\"{{ 'id': '{id}' }}\";"
        );
    }

    #[test]
    fn test_interpolated_verbatim_opener_marks_line() {
        let source = "var body = @$\"{{\n    \"\"id\"\": \"\"{id}\"\"\n}}\";\n";
        assert_eq!(normalize(source), "var body = @$\"{{\n    'id': '{id}'\n}}\";\n");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("var json = @\"{ \"\"id\"\": \"\"\"\" }\";");
        assert_eq!(once, "var json = @\"{ 'id': '' }\";");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_custom_markers() {
        let rule = QuoteRule::new(["payload"]);
        let marked = "var payload = @\"{ \"\"a\"\": 1 }\";";
        let unmarked = "var json = @\"{ \"\"a\"\": 1 }\";";
        assert_eq!(apply_rule(&rule, marked).text, "var payload = @\"{ 'a': 1 }\";");
        assert_eq!(apply_rule(&rule, unmarked).text, unmarked);
    }

    #[test]
    fn test_normalize_quotes() {
        assert_eq!(normalize_quotes("\"\"id\"\""), "'id'");
        assert_eq!(normalize_quotes("a\\\"\"b"), "a\\\"\"b");
    }
}
