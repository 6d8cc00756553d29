use chrono::NaiveDate;
use tracing::debug;

use crate::error::EngineError;
use crate::retrieval::{rank_labeled, SegmentIndex};
use crate::transcript::{
    date_sort_key, extract_document_date, parse_date_label, parse_speakers, DATE_SCAN_LINES,
    UNKNOWN_DATE_LABEL,
};

/// Default number of context segments returned by a query.
pub const DEFAULT_TOP_K: usize = 3;

/// What one ingested document contributed to the indices.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Speaker keys touched, in first-seen order. Empty for free-form
    /// documents that fell back to paragraph segmentation.
    pub speakers: Vec<String>,
    /// The date label the document's segments were bucketed under.
    pub date_label: String,
    /// Number of segments this document contributed.
    pub segments: usize,
}

/// A validated date-mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    /// Only the unknown-date bucket.
    Unknown,
    /// Every date label falling within [start, end] inclusive.
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateSelection {
    /// Validate raw user bounds into a selection.
    ///
    /// All validation happens here, before any retrieval work: the
    /// unknown-date bucket is mutually exclusive with a range, both bounds
    /// are required, each must be an ISO date, and start must not be after
    /// end.
    pub fn from_bounds(
        start: Option<&str>,
        end: Option<&str>,
        include_unknown: bool,
    ) -> Result<Self, EngineError> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());

        if include_unknown {
            if start.is_some() || end.is_some() {
                return Err(EngineError::UnknownDateWithPeriod);
            }
            return Ok(Self::Unknown);
        }

        let (Some(start), Some(end)) = (start, end) else {
            return Err(EngineError::PeriodIncomplete);
        };
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .map_err(|_| EngineError::InvalidDate(start.to_string()))?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .map_err(|_| EngineError::InvalidDate(end.to_string()))?;

        if start > end {
            return Err(EngineError::PeriodInverted { start, end });
        }
        Ok(Self::Range { start, end })
    }
}

/// The retrieval orchestrator: one index keyed by speaker, one by date
/// label, both populated from the same ingested documents.
///
/// All state is in-memory and append-only between resets. Processing is
/// synchronous; an embedding application serving concurrent requests must
/// serialize mutations itself.
#[derive(Debug, Default)]
pub struct RetrievalEngine {
    speakers: SegmentIndex,
    dates: SegmentIndex,
}

impl RetrievalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one document's raw text.
    ///
    /// Speaker segments merge after any existing segments for the same
    /// speaker key. Every segment the document produced also lands,
    /// verbatim, under the document's single date label: the extracted
    /// date or the unknown sentinel. A document without recognizable
    /// speaker markers falls back to blank-line-delimited paragraphs,
    /// indexed under the date key only.
    pub fn ingest(&mut self, text: &str) -> IngestReport {
        let parsed = parse_speakers(text);

        let mut touched = Vec::new();
        let mut date_segments: Vec<String> = Vec::new();
        for (speaker, segments) in parsed.iter() {
            let mut merged: Vec<String> = self
                .speakers
                .segments(speaker)
                .into_iter()
                .map(str::to_string)
                .collect();
            merged.extend(segments.iter().cloned());
            self.speakers.put(speaker, merged);

            date_segments.extend(segments.iter().cloned());
            touched.push(speaker.to_string());
        }

        if date_segments.is_empty() {
            date_segments = text
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        let date_label = extract_document_date(text, DATE_SCAN_LINES)
            .unwrap_or_else(|| UNKNOWN_DATE_LABEL.to_string());
        let count = date_segments.len();
        if !date_segments.is_empty() {
            self.append_dated(&date_label, date_segments);
        }

        debug!(
            "Ingested document: {} speakers, {} segments, date label '{}'",
            touched.len(),
            count,
            date_label
        );
        IngestReport {
            speakers: touched,
            date_label,
            segments: count,
        }
    }

    /// Ingest pre-segmented text from an external source.
    ///
    /// The synthetic label (e.g. `YouTube <id>: <title>`) becomes a
    /// speaker key holding the segments verbatim; the segments also land
    /// under the resolved date label. A label that is already present is
    /// rejected without touching either index.
    pub fn ingest_source(
        &mut self,
        label: &str,
        segments: Vec<String>,
        date_label: Option<&str>,
    ) -> Result<IngestReport, EngineError> {
        if self.speakers.contains(label) {
            return Err(EngineError::SourceAlreadyIngested(label.to_string()));
        }

        let date_label = date_label.unwrap_or(UNKNOWN_DATE_LABEL).to_string();
        let count = segments.len();
        self.speakers.put(label, segments.clone());
        self.append_dated(&date_label, segments);

        Ok(IngestReport {
            speakers: vec![label.to_string()],
            date_label,
            segments: count,
        })
    }

    fn append_dated(&mut self, date_label: &str, segments: Vec<String>) {
        let mut merged: Vec<String> = self
            .dates
            .segments(date_label)
            .into_iter()
            .map(str::to_string)
            .collect();
        merged.extend(segments);
        self.dates.put(date_label, merged);
    }

    /// Speaker-mode query: top-k segments for one speaker key.
    pub fn query_speaker(
        &self,
        speaker: &str,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<String>, EngineError> {
        if !self.has_speaker(speaker) {
            return Err(EngineError::SpeakerNotFound(speaker.to_string()));
        }
        self.speakers.query(speaker, question, top_k)
    }

    /// Date-mode query over a validated selection.
    ///
    /// A single resolved date with one matching label queries that key
    /// directly; several matching labels, or a widening range, merge into
    /// one ranked pool with each segment prefixed by its date label. Empty
    /// outcomes are reported as errors so the caller never builds an empty
    /// prompt.
    pub fn query_period(
        &self,
        selection: DateSelection,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<String>, EngineError> {
        match selection {
            DateSelection::Unknown => {
                if !self.dates.contains(UNKNOWN_DATE_LABEL) {
                    return Err(EngineError::DateNotFound(UNKNOWN_DATE_LABEL.to_string()));
                }
                let segments = self.dates.query(UNKNOWN_DATE_LABEL, question, top_k)?;
                if segments.is_empty() {
                    return Err(EngineError::NoContext);
                }
                Ok(segments)
            }
            DateSelection::Range { start, end } if start == end => {
                let labels = self.labels_in_range(start, end);
                if labels.is_empty() {
                    return Err(EngineError::NoContextForDate(start));
                }
                let segments = if labels.len() == 1 {
                    self.dates.query(&labels[0], question, top_k)?
                } else {
                    rank_labeled(&self.corpus_for(&labels), question, top_k)
                };
                if segments.is_empty() {
                    return Err(EngineError::NoContextForDate(start));
                }
                Ok(segments)
            }
            DateSelection::Range { start, end } => {
                let labels = self.labels_in_range(start, end);
                if labels.is_empty() {
                    return Err(EngineError::EmptyPeriod { start, end });
                }
                let segments = rank_labeled(&self.corpus_for(&labels), question, top_k);
                if segments.is_empty() {
                    return Err(EngineError::NoContext);
                }
                Ok(segments)
            }
        }
    }

    /// Date labels whose parsed date falls within [start, end] inclusive,
    /// chronologically sorted.
    fn labels_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<String> {
        let mut labels: Vec<String> = self
            .dates
            .keys()
            .filter(|label| {
                parse_date_label(label).is_some_and(|date| start <= date && date <= end)
            })
            .map(str::to_string)
            .collect();
        labels.sort_by_key(|label| date_sort_key(label));
        labels
    }

    fn corpus_for(&self, labels: &[String]) -> Vec<(String, String)> {
        let mut corpus = Vec::new();
        for label in labels {
            for segment in self.dates.segments(label) {
                corpus.push((label.clone(), segment.to_string()));
            }
        }
        corpus
    }

    /// Known speaker keys, lexicographically sorted.
    pub fn list_speakers(&self) -> Vec<String> {
        let mut speakers: Vec<String> = self.speakers.keys().map(str::to_string).collect();
        speakers.sort();
        speakers
    }

    /// Known date labels, chronological with the unknown sentinel last.
    pub fn list_dates(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.dates.keys().map(str::to_string).collect();
        labels.sort_by_key(|label| date_sort_key(label));
        labels
    }

    /// Distinct parsed dates with documents, ascending. The unknown
    /// bucket does not appear here.
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .dates
            .keys()
            .filter_map(parse_date_label)
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }

    pub fn has_speaker(&self, speaker: &str) -> bool {
        self.speakers.contains(speaker)
    }

    /// Drop everything from both indices.
    pub fn reset(&mut self) {
        self.speakers.clear();
        self.dates.clear();
    }
}
