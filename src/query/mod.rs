// Query module - turns API paths into queries and executes them
pub mod error;
pub mod executor;
pub mod grading;
pub mod parser;

pub use error::{ErrorBody, QueryError};
pub use executor::{QueryEngine, QueryResult};
pub use parser::{Collection, Query, QueryParser, RELATIONS};
