/// Collapses every run of whitespace (newlines included) into a single space
/// and trims both ends.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length in characters, the unit every threshold in this crate is measured in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
