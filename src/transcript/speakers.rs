use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DELIMITER_RE: Regex = Regex::new(r"[.:]").unwrap();
}

/// Per-speaker transcript segments in first-seen speaker order.
#[derive(Debug, Clone, Default)]
pub struct SpeakerSegments {
    order: Vec<(String, Vec<String>)>,
    by_name: HashMap<String, usize>,
}

impl SpeakerSegments {
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Speakers in the order they first took the floor.
    pub fn speakers(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order
            .iter()
            .map(|(name, segments)| (name.as_str(), segments.as_slice()))
    }

    pub fn get(&self, speaker: &str) -> Option<&[String]> {
        self.by_name
            .get(speaker)
            .map(|&i| self.order[i].1.as_slice())
    }

    /// Open a new segment for a speaker, returning the speaker's slot.
    fn start_segment(&mut self, speaker: &str, text: String) -> usize {
        let index = *self.by_name.entry(speaker.to_string()).or_insert_with(|| {
            self.order.push((speaker.to_string(), Vec::new()));
            self.order.len() - 1
        });
        self.order[index].1.push(text);
        index
    }

    fn extend_last(&mut self, index: usize, line: &str) {
        if let Some(last) = self.order[index].1.last_mut() {
            last.push(' ');
            last.push_str(line);
        }
    }
}

/// True under Python `str.isupper` rules: at least one cased character and
/// no lowercase character. Uncased characters (digits, punctuation) are
/// ignored, so `V. PAVARDENĖ (LSDPF*)` qualifies.
fn is_all_uppercase(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Split a transcript into segments grouped by speaker.
///
/// A line opens a new segment when some `.` or `:` is preceded by an
/// all-uppercase, non-digit-leading name. The scan is careful not to split
/// inside initials such as `V. ALEKNAVIČIENĖ`: when the text after a
/// candidate delimiter starts with another all-uppercase word, that
/// delimiter is skipped and the scan moves to the next one on the line.
/// Lines without a valid speaker start are appended to the active
/// speaker's last segment, and dropped when no speaker is active yet.
pub fn parse_speakers(text: &str) -> SpeakerSegments {
    let mut result = SpeakerSegments::default();
    let mut current: Option<usize> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let mut found = false;
        for delimiter in DELIMITER_RE.find_iter(line) {
            let speaker = line[..delimiter.start()].trim();
            let remainder = line[delimiter.end()..].trim();

            if speaker.is_empty()
                || !is_all_uppercase(speaker)
                || speaker.starts_with(|c: char| c.is_numeric())
            {
                continue;
            }
            if let Some(first_word) = remainder.split_whitespace().next() {
                if is_all_uppercase(first_word) {
                    // Likely an initial, keep searching
                    continue;
                }
            }

            current = Some(result.start_segment(speaker, remainder.to_string()));
            found = true;
            break;
        }

        if !found {
            if let Some(index) = current {
                result.extend_last(index, line);
            }
        }
    }

    result
}
