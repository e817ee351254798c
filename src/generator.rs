//! The opaque content-generation collaborator
//!
//! AI text generation happens outside this crate. The core only needs a
//! single call: hand over a system prompt and a user prompt, get text back.
//! No retry behavior is assumed of the collaborator; a failed call is
//! surfaced as [`QuireError::Generation`] and the caller may simply invoke
//! the operation again, which is safe because generation results are cached
//! on the suggestion once persisted.
//!
//! [`QuireError::Generation`]: crate::error::QuireError::Generation

use crate::error::Result;

/// Opaque text-generation collaborator
///
/// Implementations wrap whatever model endpoint the host application uses.
/// Calls may block for seconds (network round-trip); the invoking worker
/// thread is suspended for the duration and there is no cooperative
/// cancellation of an in-flight call.
pub trait ContentGenerator: Send + Sync {
    /// Generate text for the given prompts
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
