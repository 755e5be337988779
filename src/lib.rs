pub mod cache;
pub mod config;
pub mod corpus;
pub mod error;
pub mod logging;
pub mod schema;
pub mod search;
pub mod server;
pub mod state;
pub mod tools;

pub use config::Config;
pub use error::{CacheError, Result, SearchError};
pub use schema::{Document, FieldSchema};
pub use search::{BuiltIndex, DocId, Filters, IndexBuilder, ScoredDocument, tokenize};
pub use server::SearchServer;
pub use state::IndexState;
