//! Abacus - Adaptive SQL payload mutation engine
//!
//! Mutates payloads through chains of string transforms, learns from
//! reported outcomes which operators and chains get through, and paces
//! output with a bounded backoff.
//!
//! # Modules
//!
//! - `mutation` - Operator registry and transform primitives
//! - `feedback` - Operator statistics, selection, success memory and backoff
//! - `cache` - Bounded fingerprint and encoding caches
//! - `engine` - The `TamperEngine` orchestrator and its configuration
//! - `detection` - Response classification
//! - `headers` - Request header generation
//!
//! # Example
//!
//! ```rust,no_run
//! use abacus::engine::{EngineConfig, TamperEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let mut engine = TamperEngine::new(EngineConfig::default().with_seed(7));
//! let cancel = CancellationToken::new();
//!
//! let mutation = engine.mutate("SELECT * FROM users WHERE id=1", &cancel).await;
//! // send mutation.encoded, then
//! engine.report(&mutation.chain_names(), false);
//! # }
//! ```

pub mod cache;
pub mod codec;
pub mod context;
pub mod detection;
pub mod engine;
pub mod feedback;
pub mod headers;
pub mod mutation;

// Re-export commonly used types
pub use context::PayloadContext;
pub use detection::{ResponseClassifier, ResponseSignals};
pub use engine::{EngineConfig, EngineProfile, Feedback, Mutation, SharedTamperEngine, TamperEngine};
pub use feedback::Outcome;
pub use mutation::{Chain, MutationOperator};
