// Adapters layer: concrete clients for the external capabilities behind the domain ports.

pub mod duckduckgo;
pub mod gemini;
pub mod knowledge_base;
pub mod page;
pub mod schema;
pub mod session_store;

pub use duckduckgo::DuckDuckGoSearch;
pub use gemini::GeminiClient;
pub use knowledge_base::KnowledgeBase;
pub use page::HttpPageFetcher;
pub use session_store::LocalSessionStore;
