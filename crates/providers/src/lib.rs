//! LLM backend adapters.
//!
//! One capability, three variants: a local grammar-capable inference
//! server, any OpenAI-compatible endpoint, and a hosted gateway. The
//! active backend is chosen once at startup from config — the turn hot
//! path never dispatches on strings.

mod gateway;
mod json;
mod local;
mod openai_compat;
pub mod prompts;
mod registry;
mod traits;

pub use gateway::HostedGatewayBackend;
pub use json::{extract_json, parse_reply, reply_schema, InterviewerReply};
pub use local::LocalGrammarBackend;
pub use openai_compat::OpenAiCompatBackend;
pub use registry::build_backend;
pub use traits::{ChatOptions, ChatResponse, LlmBackend};
