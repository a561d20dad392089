//! Line-level match extraction.
//!
//! Case-sensitive single-term scans go through a `memchr` substring finder;
//! case-insensitive and multi-term scans use an escaped-literal regex so byte
//! offsets stay exact even where lower-casing changes lengths.

use crate::search::types::{LineMatch, MatchSpan};
use memchr::memmem;
use regex::{Regex, RegexBuilder};

enum Matcher {
    /// Empty query, nothing ever matches
    Nothing,
    Literal(memmem::Finder<'static>),
    Pattern(Regex),
}

/// Finds all non-overlapping occurrences of the query terms, line by line
pub struct MatchScanner {
    matcher: Matcher,
    max_line_length: usize,
}

impl MatchScanner {
    /// Scanner for one literal term (plain mode)
    pub fn literal(
        term: &str,
        case_sensitive: bool,
        max_line_length: usize,
    ) -> Result<Self, regex::Error> {
        Self::with_terms(&[term], case_sensitive, max_line_length)
    }

    /// Scanner matching any of several terms (ranked mode display lines)
    pub fn with_terms<S: AsRef<str>>(
        terms: &[S],
        case_sensitive: bool,
        max_line_length: usize,
    ) -> Result<Self, regex::Error> {
        let mut terms: Vec<&str> = terms
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| !t.is_empty())
            .collect();

        let matcher = match terms.as_slice() {
            [] => Matcher::Nothing,
            [term] if case_sensitive => {
                Matcher::Literal(memmem::Finder::new(term.as_bytes()).into_owned())
            }
            _ => {
                // Longest first so the leftmost-first alternation prefers longer terms
                terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
                terms.dedup();
                let pattern = terms
                    .iter()
                    .map(|t| regex::escape(t))
                    .collect::<Vec<_>>()
                    .join("|");
                Matcher::Pattern(
                    RegexBuilder::new(&pattern)
                        .case_insensitive(!case_sensitive)
                        .build()?,
                )
            }
        };

        Ok(Self {
            matcher,
            max_line_length: max_line_length.max(1),
        })
    }

    /// Scan decoded text. Lines end at `\n`; a trailing `\r` is dropped.
    pub fn scan(&self, text: &str) -> Vec<LineMatch> {
        if matches!(self.matcher, Matcher::Nothing) {
            return Vec::new();
        }

        let mut results = Vec::new();
        for (idx, raw) in text.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let spans = self.find_spans(line);
            if let Some(&first) = spans.first() {
                results.push(self.build_line(idx + 1, line, first, spans));
            }
        }
        results
    }

    /// Whether any line of `text` matches
    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Nothing => false,
            Matcher::Literal(finder) => finder.find(text.as_bytes()).is_some(),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }

    fn find_spans(&self, line: &str) -> Vec<MatchSpan> {
        match &self.matcher {
            Matcher::Nothing => Vec::new(),
            Matcher::Literal(finder) => {
                let len = finder.needle().len();
                finder
                    .find_iter(line.as_bytes())
                    .map(|start| MatchSpan::new(start, start + len))
                    .collect()
            }
            Matcher::Pattern(re) => re
                .find_iter(line)
                .filter(|m| !m.is_empty())
                .map(|m| MatchSpan::new(m.start(), m.end()))
                .collect(),
        }
    }

    fn build_line(
        &self,
        line_number: usize,
        line: &str,
        first: MatchSpan,
        match_spans: Vec<MatchSpan>,
    ) -> LineMatch {
        let (start, end) = display_window(line, first, self.max_line_length);
        let (start, end) = snap_to_spans(start, end, first, &match_spans);
        LineMatch {
            line_number,
            display_text: line[start..end].to_string(),
            display_start: start,
            line_len: line.len(),
            match_spans,
            truncated: start > 0 || end < line.len(),
        }
    }
}

/// Pick the byte range of at most `max_chars` characters to display.
///
/// The line prefix is used when it contains the whole first match; otherwise
/// the window is centred on the first match. A first match longer than the
/// window is cut at its end.
fn display_window(line: &str, first: MatchSpan, max_chars: usize) -> (usize, usize) {
    let total_chars = line.chars().count();
    if total_chars <= max_chars {
        return (0, line.len());
    }

    let match_start = line[..first.start].chars().count();
    let match_end = match_start + line[first.start..first.end].chars().count();

    let match_chars = match_end - match_start;
    let start_char = if match_end <= max_chars {
        0
    } else {
        let lead = max_chars.saturating_sub(match_chars) / 2;
        match_start
            .saturating_sub(lead)
            .min(total_chars - max_chars)
    };

    (
        byte_offset(line, start_char),
        byte_offset(line, start_char + max_chars),
    )
}

/// Pull window edges that fall inside a match out to the match boundary, so
/// no later match is shown half cut. The first match always stays in view;
/// when it alone is wider than the window it keeps its cut end.
fn snap_to_spans(
    mut start: usize,
    mut end: usize,
    first: MatchSpan,
    spans: &[MatchSpan],
) -> (usize, usize) {
    if let Some(span) = spans.iter().find(|s| s.start < start && start < s.end)
        && span.end <= first.start
    {
        start = span.end;
    }
    if let Some(span) = spans.iter().find(|s| s.start < end && end < s.end)
        && span.start >= first.end
    {
        end = span.start;
    }
    (start, end)
}

fn byte_offset(line: &str, char_idx: usize) -> usize {
    line.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(line.len())
}
