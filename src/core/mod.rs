pub mod agents;
pub mod session;
pub mod workflow;

pub use crate::domain::model::{RunOutcome, RunResponse, SearchOutcome, SearchResultSet};
pub use crate::domain::ports::{Extractor, Searcher, SessionStore};
pub use crate::utils::error::Result;
