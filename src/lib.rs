// CampusDB - a read-only query API over an in-memory campus dataset
// This is the library root that exposes the public API

pub mod query;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use query::{QueryEngine, QueryError, QueryParser, QueryResult};
pub use storage::{Dataset, DatasetError, Id};
