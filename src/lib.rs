pub mod detector;
pub mod discovery;
pub mod error;
pub mod pgn;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod scanner;
pub mod segmenter;
pub mod stats;

// Re-export main types for convenient access
pub use detector::{detect, Detection};
pub use error::{Expected, LexError, ParseError, RatingParseError};
pub use pgn::{parse_entry, parse_pgn, Game, Move, MoveKind, MovetextNormalizer, Outcome, Record, Turn};

// Re-export streaming pipeline types for the binary and benchmarks
pub use pipeline::{Pipeline, PipelineConfig};
pub use reader::{InputSource, LineReader, ReaderConfig};
pub use report::OutputFormat;
pub use scanner::{Match, ScanConfig, ScanEvent, Scanner};
pub use segmenter::{Segment, Segmenter, DEFAULT_MIN_ELO};
