pub mod analyzer;
pub mod anchor;
pub mod content;
pub mod corroboration;
pub mod fetch;
pub mod fusion;
pub mod ingest;
pub mod news;
pub mod registry;
pub mod report;
pub mod reputation;
pub mod search;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use analyzer::ItemAnalyzer;
pub use anchor::{match_anchor, AnchorReconciler, RegionScope};
pub use content::{ContentVerdict, ContentVerdictAdapter};
pub use corroboration::CorroborationClient;
pub use fetch::HttpPageFetcher;
pub use fusion::{fuse, SourceSignal, Verifier};
pub use ingest::{IngestionCycle, IngestionReport};
pub use news::NewsDataFetcher;
pub use registry::SnapshotRegistry;
pub use report::CivicReportChecker;
pub use reputation::SourceReputation;
pub use search::{DisabledSearcher, SerperSearcher, TavilySearcher};
