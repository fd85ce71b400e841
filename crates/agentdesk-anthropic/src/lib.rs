// Anthropic Driver
//
// This crate provides the Anthropic Claude LlmDriver. Call `register_driver`
// at startup so agents bound to an ANTHROPIC LLM can be resolved.

mod driver;

#[cfg(test)]
mod tests;

pub use driver::{register_driver, AnthropicLlmDriver, DEFAULT_API_URL};
