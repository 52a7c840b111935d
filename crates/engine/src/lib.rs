pub mod annotate;
pub mod batch;
pub mod engine;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod filter;
pub mod host;
pub mod memory;
pub mod selection;
pub mod state;

pub use engine::{ApplyOutcome, ClearSummary, FilterEngine, FilterSummary};
pub use error::FilterError;
pub use filter::{CandidateList, FilterSelection};
pub use host::{HeaderSnapshot, HostDocument, HostError, Marker};
pub use memory::MemoryDocument;
pub use selection::{ScriptedCollector, Selection, SelectionCollector};
pub use state::{FilterState, FilterStateStore};
