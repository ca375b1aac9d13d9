use crate::core::text::char_len;

const TERMINAL_PUNCTUATION: [char; 3] = ['.', '?', '!'];

/// Forward-merges short, unterminated candidates into the candidate that
/// follows them.
///
/// A running buffer is grown while it is shorter than `merge_threshold` and
/// does not end in `.`, `?` or `!`. Whenever it stops growing it is emitted,
/// provided it is at least `min_length` long. The last buffer goes through
/// the same acceptance check, so a lone candidate that never reached the
/// merge threshold is still kept if it meets `min_length`.
///
/// This repairs layout analysis splitting one paragraph across several small
/// containers. It is a heuristic: unrelated short lines without terminal
/// punctuation get glued together, and a sentence broken across a page whose
/// first half is long enough is left split.
pub fn merge_short_paragraphs<I>(candidates: I, merge_threshold: usize, min_length: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut merged = Vec::new();
    let mut current = String::new();

    for candidate in candidates {
        if current.is_empty() {
            current = candidate;
        } else if char_len(&current) < merge_threshold && !current.ends_with(TERMINAL_PUNCTUATION) {
            current.push(' ');
            current.push_str(&candidate);
        } else {
            let finished = std::mem::replace(&mut current, candidate);
            if char_len(&finished) >= min_length {
                merged.push(finished);
            }
        }
    }

    if !current.is_empty() && char_len(&current) >= min_length {
        merged.push(current);
    }

    merged
}
