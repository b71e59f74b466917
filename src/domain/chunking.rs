//! Overlapping, boundary-aware text chunking.
//!
//! A window of `size` chars slides over the text. When a window stops short of
//! the end of the text, its end is pulled back to just after the last `.` or
//! `\n` inside it, unless that boundary is the window's first char. The next
//! window starts `overlap` chars before the previous end. Chunks are trimmed
//! and empty ones are dropped.
//!
//! Positions are counted in chars, so multi-byte text never splits inside a
//! code point and offsets stay meaningful to callers that index by char.

use crate::domain::{Chunk, Document, DomainError};

const BOUNDARIES: [char; 2] = ['.', '\n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self, DomainError> {
        if size == 0 {
            return Err(DomainError::configuration("chunk size must be positive"));
        }
        if overlap >= size {
            return Err(DomainError::configuration(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits `document` into chunks with ids `{stem}_{index}`.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let stem = document.stem();
        self.spans(&document.text)
            .into_iter()
            .enumerate()
            .map(|(index, (start, end, text))| Chunk {
                document_id: document.source.clone(),
                id: format!("{stem}_{index}"),
                index,
                text,
                start,
                end,
            })
            .collect()
    }

    /// Returns `(start, end, text)` for every non-empty chunk of `text`.
    pub fn spans(&self, text: &str) -> Vec<(usize, usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut spans = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = start + self.size;

            if end < len {
                let window = &chars[start..end];
                if let Some(pos) = window.iter().rposition(|c| BOUNDARIES.contains(c)) {
                    if pos > 0 {
                        end = start + pos + 1;
                    }
                }
            }

            if let Some(span) = trimmed_span(&chars, start, end.min(len)) {
                spans.push(span);
            }

            // A snap close to the window start could otherwise move backwards.
            start = end.saturating_sub(self.overlap).max(start + 1);
        }

        spans
    }
}

fn trimmed_span(chars: &[char], start: usize, end: usize) -> Option<(usize, usize, String)> {
    let window = &chars[start..end];
    let lead = window.iter().take_while(|c| c.is_whitespace()).count();
    if lead == window.len() {
        return None;
    }
    let trail = window.iter().rev().take_while(|c| c.is_whitespace()).count();
    let text: String = window[lead..window.len() - trail].iter().collect();
    Some((start + lead, end - trail, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunker: &Chunker, text: &str) -> Vec<String> {
        chunker.spans(text).into_iter().map(|(_, _, t)| t).collect()
    }

    #[test]
    fn test_golden_short_sentences() {
        let chunker = Chunker::new(4, 1).unwrap();
        assert_eq!(texts(&chunker, "A. B. C."), vec!["A.", ". B.", ". C.", "."]);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = Chunker::new(40, 8).unwrap();
        let text = "Digital Twin training needs UE data.\nTopology is required. \
                    RF Prediction runs after training. Results are collected at the end.";
        assert_eq!(chunker.spans(text), chunker.spans(text));
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(matches!(
            Chunker::new(10, 10),
            Err(DomainError::Configuration(_))
        ));
        assert!(Chunker::new(10, 11).is_err());
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(10, 9).is_ok());
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let chunker = Chunker::new(25, 5).unwrap();
        let text = "First sentence here. Second one follows.\nThird line without a stop \
                    and a long tail that keeps going for a while";
        for (_, _, chunk) in chunker.spans(text) {
            assert!(chunk.chars().count() <= 25, "oversized chunk: {chunk:?}");
        }
    }

    #[test]
    fn test_snaps_to_line_break_when_later_than_period() {
        let chunker = Chunker::new(12, 2).unwrap();
        let spans = texts(&chunker, "Intro. Line\nnext words go here");
        assert_eq!(spans[0], "Intro. Line");
    }

    #[test]
    fn test_boundary_at_window_start_is_ignored() {
        let chunker = Chunker::new(5, 1).unwrap();
        let spans = texts(&chunker, ".abcdefghij");
        assert_eq!(spans[0], ".abcd");
    }

    #[test]
    fn test_empty_and_whitespace_text_yield_nothing() {
        let chunker = Chunker::new(10, 2).unwrap();
        assert!(chunker.spans("").is_empty());
        assert!(chunker.spans("   \n\t  ").is_empty());
    }

    #[test]
    fn test_offsets_point_into_source() {
        let chunker = Chunker::new(10, 3).unwrap();
        let text = "  Alpha. Beta gamma. Delta epsilon.";
        let chars: Vec<char> = text.chars().collect();

        for (start, end, chunk) in chunker.spans(text) {
            let slice: String = chars[start..end].iter().collect();
            assert_eq!(slice, chunk);
        }
    }

    #[test]
    fn test_multibyte_text_is_split_on_chars() {
        let chunker = Chunker::new(3, 1).unwrap();
        let spans = texts(&chunker, "ééééé");
        assert_eq!(spans, vec!["ééé", "ééé", "é"]);
    }

    #[test]
    fn test_early_snap_still_makes_progress() {
        let chunker = Chunker::new(10, 8).unwrap();
        let spans = chunker.spans("a.bcdefghijklmnopqrstuvwxyz");
        assert!(!spans.is_empty());
        let starts: Vec<usize> = spans.iter().map(|(s, _, _)| *s).collect();
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_chunk_ids_use_document_stem() {
        let chunker = Chunker::new(4, 1).unwrap();
        let chunks = chunker.chunk(&Document::new("notes.md", "A. B. C."));

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["notes_0", "notes_1", "notes_2", "notes_3"]);
        assert!(chunks.iter().all(|c| c.document_id == "notes.md"));
        assert_eq!(chunks[1].index, 1);
    }
}
