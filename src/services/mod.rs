pub mod llm_service;
pub mod prompts;
pub mod retrieval;

pub use llm_service::{CompletionRequest, LanguageModel, LlmService, UserContent};
pub use prompts::TranscriptionVariant;
pub use retrieval::RetrievalPolicy;
