//! Packing split pieces into overlapping, token-bounded chunks.

use std::collections::VecDeque;

use crate::error::{Result, SplitError};
use crate::splitter::Chunk;

/// Greedily packs `chunks` into strings of at most `budget` tokens.
///
/// When a chunk closes, the next one is seeded with the longest run of trailing
/// pieces whose sizes sum to at most `overlap`. Seed pieces are dropped from the
/// front when they leave no room for the next piece, so the budget always holds.
/// Output chunks are trimmed and empty ones are dropped.
///
/// # Errors
/// Returns [`SplitError::Configuration`] if `overlap >= budget` and
/// [`SplitError::IndivisibleUnit`] if a single piece exceeds the budget.
pub fn merge_chunks(chunks: &[Chunk<'_>], budget: usize, overlap: usize) -> Result<Vec<String>> {
    if overlap >= budget {
        return Err(SplitError::Configuration(format!(
            "chunk overlap ({overlap}) must be less than the token budget ({budget})"
        )));
    }

    let mut merged = Vec::new();
    let mut current: VecDeque<(&str, usize)> = VecDeque::new();
    let mut current_len = 0;
    let mut fresh = true;
    let mut pending = chunks.iter().peekable();

    while let Some(chunk) = pending.peek() {
        if chunk.token_size > budget {
            return Err(SplitError::IndivisibleUnit {
                token_size: chunk.token_size,
                budget,
            });
        }
        if current_len + chunk.token_size > budget {
            if !fresh {
                merged.push(concat(&current));
                seed_overlap(&mut current, &mut current_len, overlap);
                fresh = true;
                continue;
            }
            while current_len + chunk.token_size > budget {
                let Some((_, size)) = current.pop_front() else {
                    break;
                };
                current_len -= size;
            }
        }
        current.push_back((chunk.text, chunk.token_size));
        current_len += chunk.token_size;
        fresh = false;
        pending.next();
    }
    if !fresh {
        merged.push(concat(&current));
    }

    Ok(merged
        .into_iter()
        .filter_map(|chunk| {
            let trimmed = chunk.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect())
}

fn concat(pieces: &VecDeque<(&str, usize)>) -> String {
    pieces.iter().map(|(text, _)| *text).collect()
}

/// Keeps the longest suffix of whole pieces that fits in `overlap`.
fn seed_overlap(pieces: &mut VecDeque<(&str, usize)>, len: &mut usize, overlap: usize) {
    let mut kept = 0;
    let mut size = 0;
    for (_, piece_size) in pieces.iter().rev() {
        if size + piece_size > overlap {
            break;
        }
        size += piece_size;
        kept += 1;
    }
    let excess = pieces.len() - kept;
    pieces.drain(..excess);
    *len = size;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<Chunk<'_>> {
        crate::splitting::split_by_separator(text, " ")
            .into_iter()
            .map(|piece| Chunk {
                text: piece,
                token_size: 1,
                is_sentence_boundary: false,
            })
            .collect()
    }

    #[test]
    fn packs_without_overlap() {
        let chunks = merge_chunks(&words("a b c d e"), 2, 0).unwrap();
        assert_eq!(chunks, ["a b", "c d", "e"]);
    }

    #[test]
    fn overlap_repeats_trailing_pieces() {
        let chunks = merge_chunks(&words("a b c d e f"), 3, 1).unwrap();
        assert_eq!(chunks, ["a b c", "c d e", "e f"]);
    }

    #[test]
    fn everything_fits_in_one_chunk() {
        let chunks = merge_chunks(&words("  a b  "), 10, 2).unwrap();
        assert_eq!(chunks, ["a b"]);
    }

    #[test]
    fn whitespace_chunks_are_dropped() {
        let pieces = [
            Chunk {
                text: "x",
                token_size: 2,
                is_sentence_boundary: true,
            },
            Chunk {
                text: "   ",
                token_size: 2,
                is_sentence_boundary: true,
            },
        ];
        assert_eq!(merge_chunks(&pieces, 2, 0).unwrap(), ["x"]);
    }

    #[test]
    fn seed_is_dropped_when_it_blocks_progress() {
        let pieces = [
            Chunk {
                text: "aa",
                token_size: 2,
                is_sentence_boundary: true,
            },
            Chunk {
                text: "bbbb",
                token_size: 4,
                is_sentence_boundary: true,
            },
        ];
        assert_eq!(merge_chunks(&pieces, 4, 2).unwrap(), ["aa", "bbbb"]);
    }

    #[test]
    fn oversized_piece_is_rejected() {
        let pieces = [Chunk {
            text: "big",
            token_size: 9,
            is_sentence_boundary: false,
        }];
        assert!(matches!(
            merge_chunks(&pieces, 4, 1),
            Err(SplitError::IndivisibleUnit {
                token_size: 9,
                budget: 4
            })
        ));
    }

    #[test]
    fn overlap_must_be_below_budget() {
        assert!(matches!(
            merge_chunks(&words("a b"), 2, 2),
            Err(SplitError::Configuration(_))
        ));
    }

    #[test]
    fn empty_input() {
        assert!(merge_chunks(&[], 4, 1).unwrap().is_empty());
    }
}
