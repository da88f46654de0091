// Resume feedback: the structured review returned by the model, the
// instructions that request it, and the score bands used to present it.
// All model calls go through ai::AiClient.

pub mod analyzer;
pub mod models;
pub mod prompts;
pub mod scoring;
