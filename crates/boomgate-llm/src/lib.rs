//! Provider routing, fallback and streaming relay for boomgate.
//!
//! This crate hides a pool of unreliable, interchangeable chat-completion
//! providers behind one contract that always answers.
//!
//! # Architecture
//!
//! - [`ProviderCatalog`] is the static table of providers and ranked groups
//! - [`ProviderSelector`] classifies the message and orders candidates
//! - [`FallbackOrchestrator`] tries candidates in rounds, validating each answer
//! - [`StreamingRelay`] forwards chunk streams, switching providers on failure
//! - [`LocalResponder`] answers when every provider failed
//! - [`ResponseCache`] memoizes validated non-streaming answers
//! - [`Backend`] is the seam to the outside; [`HttpBackend`] speaks the
//!   OpenAI chat-completions format to a multi-provider endpoint
//! - [`Gateway`] wires them together
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use boomgate_llm::{ChatRequest, Gateway};
//! use boomgate_types::GatewayConfig;
//!
//! let gateway = Gateway::from_config(GatewayConfig::default())?;
//! let reply = gateway.chat(&ChatRequest::new("What is Rust?")).await?;
//! println!("{} (via {})", reply.response, reply.provider);
//! ```

pub mod backend;
pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod error;
pub mod gateway;
pub mod http;
pub mod orchestrator;
pub mod relay;
pub mod responder;
pub mod selector;
pub mod sse;
pub mod types;
pub mod validator;

pub use backend::{Backend, ChunkStream};
pub use cache::ResponseCache;
pub use catalog::{CATALOG_VERSION, ProviderCatalog};
pub use classifier::{KeywordClassifier, TaskProfile};
pub use error::{BackendError, GatewayError, Result};
pub use gateway::Gateway;
pub use http::HttpBackend;
pub use orchestrator::{FallbackOrchestrator, Resolution};
pub use relay::{RelayOutcome, StreamingRelay};
pub use responder::LocalResponder;
pub use selector::ProviderSelector;
pub use types::{
    AttemptOutcome, AttemptResult, Candidate, ChatMessage, ChatReply, ChatRequest, InboundRequest,
    StreamEvent,
};
pub use validator::{Rejection, validate};
