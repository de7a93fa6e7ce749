//! Context Selection
//!
//! Reduces a ranked candidate list to the [`ContextBlock`] injected into a
//! prompt. The retriever's ordering is trusted as-is: passages are never
//! re-sorted here, only truncated.

use crate::passage::{ContextBlock, ScoredPassage};

/// Number of passages placed in a prompt.
pub const DEFAULT_CONTEXT_LIMIT: usize = 3;

/// Takes the first `limit` candidates in their given order and joins their text.
///
/// Fewer than `limit` candidates are all used without padding. Blank
/// passages are dropped, and a selection with nothing left yields the
/// fallback block.
pub fn select(candidates: &[ScoredPassage], limit: usize) -> ContextBlock {
    ContextBlock::from_texts(
        candidates
            .iter()
            .take(limit)
            .map(|passage| passage.text.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::NO_CONTEXT_FOUND;

    fn passages(items: &[(&str, f32)]) -> Vec<ScoredPassage> {
        items
            .iter()
            .map(|(text, score)| ScoredPassage::new(*text, *score))
            .collect()
    }

    #[test]
    fn test_select_takes_first_three_of_five() {
        let candidates = passages(&[
            ("a", 0.9),
            ("b", 0.8),
            ("c", 0.7),
            ("d", 0.6),
            ("e", 0.5),
        ]);
        let block = select(&candidates, DEFAULT_CONTEXT_LIMIT);
        assert_eq!(block.as_str(), "a\n\nb\n\nc");
    }

    #[test]
    fn test_select_preserves_input_order_over_score() {
        // Lower-scored passage first: the selector must not reorder.
        let candidates = passages(&[("low", 0.1), ("high", 0.9)]);
        let block = select(&candidates, DEFAULT_CONTEXT_LIMIT);
        assert_eq!(block.as_str(), "low\n\nhigh");
    }

    #[test]
    fn test_select_fewer_than_limit_uses_all() {
        let candidates = passages(&[("only", 0.4)]);
        let block = select(&candidates, DEFAULT_CONTEXT_LIMIT);
        assert_eq!(block.as_str(), "only");
    }

    #[test]
    fn test_select_empty_returns_sentinel() {
        let block = select(&[], DEFAULT_CONTEXT_LIMIT);
        assert_eq!(block.as_str(), NO_CONTEXT_FOUND);
    }

    #[test]
    fn test_select_zero_limit_returns_sentinel() {
        let candidates = passages(&[("ignored", 1.0)]);
        assert!(select(&candidates, 0).is_fallback());
    }

    #[test]
    fn test_select_blank_candidates_return_sentinel() {
        let empty = select(&passages(&[("", 0.9), ("", 0.8)]), DEFAULT_CONTEXT_LIMIT);
        assert_eq!(empty.as_str(), NO_CONTEXT_FOUND);
        assert!(empty.is_fallback());

        let whitespace = select(&passages(&[("   ", 0.9)]), DEFAULT_CONTEXT_LIMIT);
        assert_eq!(whitespace.as_str(), NO_CONTEXT_FOUND);
        assert!(whitespace.is_fallback());
    }

    #[test]
    fn test_select_passage_matching_sentinel_is_retrieved_text() {
        let block = select(&passages(&[(NO_CONTEXT_FOUND, 0.7)]), DEFAULT_CONTEXT_LIMIT);
        assert_eq!(block.as_str(), NO_CONTEXT_FOUND);
        assert!(!block.is_fallback());
    }

    #[test]
    fn test_select_never_exceeds_limit() {
        for count in 0..8 {
            let candidates: Vec<ScoredPassage> = (0..count)
                .map(|i| ScoredPassage::new(format!("p{}", i), 1.0 - i as f32 * 0.1))
                .collect();
            let block = select(&candidates, DEFAULT_CONTEXT_LIMIT);
            let used = if count == 0 {
                0
            } else {
                block.as_str().split("\n\n").count()
            };
            assert!(used <= DEFAULT_CONTEXT_LIMIT);
            assert_eq!(used, count.min(DEFAULT_CONTEXT_LIMIT));
        }
    }
}
