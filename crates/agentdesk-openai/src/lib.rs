// OpenAI Protocol Driver
//
// This crate provides the LlmDriver for OpenAI's chat completions API and
// every provider that speaks the same protocol. Call `register_driver` at
// startup to make these providers available to the runner.

mod driver;
mod types;


use agentdesk_core::llm_drivers::DriverRegistry;
use agentdesk_core::llm_providers::LlmProviderKind;

pub use driver::{chat_completions_url, AuthScheme, OpenAiLlmDriver, DEFAULT_API_URL};

/// Public endpoints of hosts that expose the OpenAI protocol
pub const COMPATIBLE_HOSTS: &[(LlmProviderKind, &str)] = &[
    (LlmProviderKind::Perplexity, "https://api.perplexity.ai"),
    (LlmProviderKind::TogetherAi, "https://api.together.xyz/v1"),
    (LlmProviderKind::Groq, "https://api.groq.com/openai/v1"),
    (LlmProviderKind::Mistral, "https://api.mistral.ai/v1"),
    (
        LlmProviderKind::HuggingFace,
        "https://router.huggingface.co/v1",
    ),
];

/// Register OpenAI, Azure OpenAI and the OpenAI-compatible hosts
pub fn register_driver(registry: &mut DriverRegistry) {
    registry.register(LlmProviderKind::OpenAi, |api_key, base_url| {
        Box::new(match base_url {
            Some(url) => OpenAiLlmDriver::with_base_url(api_key, url),
            None => OpenAiLlmDriver::new(api_key),
        })
    });

    registry.register(LlmProviderKind::AzureOpenAi, |api_key, base_url| {
        Box::new(OpenAiLlmDriver::azure(api_key, base_url.unwrap_or_default()))
    });

    for (provider, default_url) in COMPATIBLE_HOSTS {
        let default_url = *default_url;
        registry.register(*provider, move |api_key, base_url| {
            Box::new(OpenAiLlmDriver::with_base_url(
                api_key,
                base_url.unwrap_or(default_url),
            ))
        });
    }
}
