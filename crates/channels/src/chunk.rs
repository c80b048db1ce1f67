//! Markdown-aware text chunking.
//!
//! Limits are measured in characters, not bytes.

const FENCE: &str = "```";

/// Characters reserved for the `\n```` that closes a fence cut mid-block.
const FENCE_CLOSE_RESERVE: usize = 4;

#[derive(Debug, Clone, Copy)]
struct Split {
    /// Byte offset where the chunk ends.
    at: usize,
    /// Separator bytes dropped after the chunk.
    skip: usize,
}

/// Split markdown into chunks of at most `limit` characters.
///
/// Prefers paragraph breaks, then newlines, then spaces. A chunk cut inside
/// a fenced code block is closed with a fence and the next chunk reopens it
/// with the same info string.
pub fn chunk_markdown_text(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 || text.is_empty() {
        return Vec::new();
    }

    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut reopen = String::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        // A fence header that leaves no room for content is not worth carrying.
        if reopen.chars().count() + FENCE_CLOSE_RESERVE >= limit {
            reopen.clear();
        }
        let budget = limit - reopen.chars().count();

        if remaining.chars().count() <= budget {
            chunks.push(format!("{reopen}{remaining}"));
            break;
        }

        let can_close = budget > FENCE_CLOSE_RESERVE;
        let mut split = find_split(remaining, budget);
        let mut open = open_fence(&reopen, &remaining[..split.at]);
        if open.is_some() && can_close {
            split = find_split(remaining, budget - FENCE_CLOSE_RESERVE);
            open = open_fence(&reopen, &remaining[..split.at]);
        }

        let head = &remaining[..split.at];
        remaining = &remaining[split.at + split.skip..];

        match open {
            Some(fence_line) if can_close => {
                chunks.push(format!(
                    "{reopen}{}\n{FENCE}",
                    head.trim_end_matches('\n')
                ));
                reopen = format!("{fence_line}\n");
            },
            _ => {
                chunks.push(format!("{reopen}{head}"));
                reopen.clear();
                remaining = remaining.trim_start_matches('\n');
            },
        }
    }

    chunks
}

fn find_split(text: &str, max_chars: usize) -> Split {
    // Look one character past the budget so a separator sitting exactly at
    // the limit still counts.
    let window = &text[..byte_index_at_char(text, max_chars + 1)];

    if let Some(at) = window.rfind("\n\n").filter(|at| *at > 0) {
        return Split { at, skip: 2 };
    }
    if let Some(at) = window
        .rfind('\n')
        .or_else(|| window.rfind(' '))
        .filter(|at| *at > 0)
    {
        return Split { at, skip: 1 };
    }

    Split {
        at: byte_index_at_char(text, max_chars),
        skip: 0,
    }
}

/// Returns the opening fence line if `prefix + body` ends inside a code block.
fn open_fence(prefix: &str, body: &str) -> Option<String> {
    let mut open: Option<&str> = None;
    for line in prefix.lines().chain(body.lines()) {
        let trimmed = line.trim_start();
        if trimmed.starts_with(FENCE) {
            open = match open {
                Some(_) => None,
                None => Some(trimmed.trim_end()),
            };
        }
    }
    open.map(str::to_string)
}

fn byte_index_at_char(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn fence_lines(chunk: &str) -> usize {
        chunk
            .lines()
            .filter(|line| line.trim_start().starts_with(FENCE))
            .count()
    }

    #[rstest]
    #[case("", 10)]
    #[case("hello", 0)]
    fn empty_input_or_zero_limit_yields_nothing(#[case] text: &str, #[case] limit: usize) {
        assert!(chunk_markdown_text(text, limit).is_empty());
    }

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(chunk_markdown_text("hello", 100), vec!["hello"]);
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let text = "你好世界";
        assert_eq!(chunk_markdown_text(text, 4), vec![text]);
    }

    #[test]
    fn chunk_at_newline() {
        let chunks = chunk_markdown_text("line1\nline2\nline3", 10);
        assert_eq!(chunks, vec!["line1", "line2", "line3"]);
    }

    #[test]
    fn chunk_at_space() {
        let chunks = chunk_markdown_text("hello world foo bar", 10);
        assert_eq!(chunks, vec!["hello", "world foo", "bar"]);
    }

    #[test]
    fn prefers_paragraph_break() {
        let text = "first para\n\nsecond line\nthird";
        let chunks = chunk_markdown_text(text, 24);
        assert_eq!(chunks[0], "first para");
        assert_eq!(chunks[1], "second line\nthird");
    }

    #[test]
    fn hard_split_respects_utf8() {
        let chunks = chunk_markdown_text("ééééé", 2);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn code_fence_is_closed_and_reopened() {
        let mut text = String::from("intro\n```rust\n");
        for i in 0..30 {
            text.push_str(&format!("let x{i} = {i};\n"));
        }
        text.push_str("```\noutro");

        let chunks = chunk_markdown_text(&text, 60);
        assert!(chunks.len() > 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 60, "chunk too long: {chunk:?}");
            assert_eq!(fence_lines(chunk) % 2, 0, "unbalanced fence: {chunk:?}");
        }
        assert!(chunks[1].starts_with("```rust\n"));
        assert!(chunks.last().is_some_and(|c| c.ends_with("outro")));
    }

    #[test]
    fn chunks_never_exceed_limit() {
        let text = "word ".repeat(2_000);
        let chunks = chunk_markdown_text(&text, 4000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4000));
    }
}
