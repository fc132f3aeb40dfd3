//! Substring-or-subsequence fuzzy matching and highlight computation
//! (§4.8 step 4, step 6).

/// How a query matched a post's searchable text. Declared subsequence
/// first so the derived `Ord` ranks `Substring` above `Subsequence`,
/// matching §4.8's "substring matches score higher" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Subsequence,
    Substring,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    pub kind: MatchKind,
    /// Byte ranges in the (lowercased) text that matched the query,
    /// collapsed into maximal contiguous runs.
    pub highlights: Vec<(usize, usize)>,
}

/// Match `query_lower` against `text_lower` (both already lowercased by
/// the caller). Returns `None` when neither a substring nor an in-order
/// subsequence match exists. An empty query always matches as a
/// (zero-width) substring at offset 0, per §4.8's "empty query matches
/// all posts" rule.
pub fn match_text(text_lower: &str, query_lower: &str) -> Option<TextMatch> {
    if let Some(idx) = text_lower.find(query_lower) {
        return Some(TextMatch {
            kind: MatchKind::Substring,
            highlights: vec![(idx, idx + query_lower.len())],
        });
    }

    let positions = subsequence_positions(text_lower, query_lower)?;
    Some(TextMatch {
        kind: MatchKind::Subsequence,
        highlights: collapse_ranges(positions),
    })
}

/// Greedily match each character of `query` in order against `text`;
/// returns the byte range of each matched character, or `None` if some
/// query character has no remaining occurrence.
fn subsequence_positions(text: &str, query: &str) -> Option<Vec<(usize, usize)>> {
    let mut positions = Vec::new();
    let mut query_chars = query.chars();
    let mut wanted = query_chars.next();

    for (idx, c) in text.char_indices() {
        let Some(qc) = wanted else { break };
        if c == qc {
            positions.push((idx, idx + c.len_utf8()));
            wanted = query_chars.next();
        }
    }

    if wanted.is_some() {
        None
    } else {
        Some(positions)
    }
}

fn collapse_ranges(ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::new();
    for (start, end) in ranges {
        match out.last_mut() {
            Some(last) if last.1 == start => last.1 = end,
            _ => out.push((start, end)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything_at_zero_width() {
        let m = match_text("hello world", "").unwrap();
        assert_eq!(m.kind, MatchKind::Substring);
        assert_eq!(m.highlights, vec![(0, 0)]);
    }

    #[test]
    fn contiguous_substring_match() {
        let m = match_text("hello world", "hello").unwrap();
        assert_eq!(m.kind, MatchKind::Substring);
        assert_eq!(m.highlights, vec![(0, 5)]);
    }

    #[test]
    fn substring_match_mid_string() {
        let m = match_text("hello world", "world").unwrap();
        assert_eq!(m.highlights, vec![(6, 11)]);
    }

    #[test]
    fn fuzzy_subsequence_match_scores_below_substring() {
        let text = "compact denoised format";
        let m = match_text(text, "cmatdnoe").unwrap();
        assert_eq!(m.kind, MatchKind::Subsequence);
        assert!(MatchKind::Substring > MatchKind::Subsequence);
    }

    #[test]
    fn no_match_returns_none() {
        assert!(match_text("hello world", "xyzqwertyuiop123456789unlikely").is_none());
    }

    #[test]
    fn subsequence_highlights_collapse_contiguous_runs() {
        let m = match_text("abcdef", "abc").unwrap();
        // "abc" is a contiguous substring, so it should match as Substring
        // not Subsequence — verifying the substring check runs first.
        assert_eq!(m.kind, MatchKind::Substring);

        let m = match_text("a_b_c_def", "abc").unwrap();
        assert_eq!(m.kind, MatchKind::Subsequence);
        assert_eq!(m.highlights, vec![(0, 1), (2, 3), (4, 5)]);
    }
}
