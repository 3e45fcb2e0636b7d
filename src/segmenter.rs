//! Sentence splitting for speech playback.
//!
//! A sentence is a run of non-terminator characters followed by one or more
//! of `.!?`. A trailing run without a terminator is a sentence too. Nothing
//! clever happens with abbreviations, decimals or quotes.

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into terminator-inclusive sentences. Whitespace is kept as-is.
pub fn segment(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        // Terminators with no body in front of them are dropped
        if is_terminator(c) {
            chars.next();
            continue;
        }

        while chars.next_if(|&(_, c)| !is_terminator(c)).is_some() {}
        while chars.next_if(|&(_, c)| is_terminator(c)).is_some() {}

        let end = chars.peek().map_or(text.len(), |&(i, _)| i);
        sentences.push(text[start..end].to_string());
    }

    if sentences.is_empty() {
        sentences.push(text.to_string());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_each_terminator_kind() {
        assert_eq!(segment("A. B! C?"), vec!["A.", " B!", " C?"]);
    }

    #[test]
    fn text_without_terminators_is_one_sentence() {
        assert_eq!(segment("yo fr fr "), vec!["yo fr fr "]);
        assert_eq!(segment("   "), vec!["   "]);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn trailing_text_without_terminator_is_kept() {
        assert_eq!(segment("No cap. it's giving"), vec!["No cap.", " it's giving"]);
    }

    #[test]
    fn consecutive_terminators_stay_together() {
        assert_eq!(segment("Wait... what?!"), vec!["Wait...", " what?!"]);
    }

    #[test]
    fn bodiless_terminators_are_skipped() {
        assert_eq!(segment("?! skibidi."), vec![" skibidi."]);
        assert_eq!(segment("!!!"), vec!["!!!"]);
    }

    #[test]
    fn decimals_are_split_naively() {
        assert_eq!(segment("Pi is 3.14"), vec!["Pi is 3.", "14"]);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        assert_eq!(segment("ohio 💀. rizz"), vec!["ohio 💀.", " rizz"]);
    }
}
