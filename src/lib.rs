pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod llm;
pub mod retrieval;
pub mod sources;
pub mod transcript;

pub use config::{Settings, SETTINGS_FILE};
pub use engine::{DateSelection, IngestReport, RetrievalEngine, DEFAULT_TOP_K};
pub use error::EngineError;
pub use io::{load_text, LoadError};
pub use llm::{build_prompt, ContextSource, OllamaClient, OllamaConfig};
pub use retrieval::{cosine_similarity, rank_labeled, tokenize, SegmentIndex, TokenBag};
pub use sources::{
    extract_video_id, source_label, SourceError, VideoMetadata, YoutubeClient,
};
pub use transcript::{
    extract_document_date, parse_date_label, parse_speakers, SpeakerSegments, DATE_SCAN_LINES,
    UNKNOWN_DATE_LABEL,
};
