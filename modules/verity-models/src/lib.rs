pub mod claude;
pub mod classifier;
pub mod ner;
pub mod schema;

pub use claude::Claude;
pub use classifier::ClaudeClassifier;
pub use ner::{merge_locations, pattern_locations, ClaudeEntityExtractor};
pub use schema::StructuredOutput;
