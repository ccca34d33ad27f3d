pub mod artifacts;
pub mod bm25;
pub mod corpus;
pub mod ranking;
pub mod snapshot;
pub mod tfidf;

mod error;

pub use artifacts::{Artifacts, CHUNKS_FILE, PROTOCOLS_FILE};
pub use bm25::{Bm25Params, LexicalScorer};
pub use corpus::{Chunk, CorpusIndex, IndexSettings, TermMatch};
pub use error::{Error, Result};
pub use ranking::{Normalization, RankedChunk, RankedPage};
pub use snapshot::{IndexSnapshot, SnapshotHandle};
pub use tfidf::{SemanticScorer, SparseVector, TfidfModel};
