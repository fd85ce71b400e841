// LLM provider identifiers and model aliases
//
// Provider identifiers are persisted upper-case (e.g. "OPENAI", "AZURE_OPENAI").
// Agent records may also carry an enum-style model alias (e.g. "GPT_4_0613")
// which is resolved to the provider's model name before calling the LLM.

use serde::{Deserialize, Serialize};

/// LLM provider attached to an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LlmProviderKind {
    #[serde(rename = "OPENAI")]
    OpenAi,
    #[serde(rename = "AZURE_OPENAI")]
    AzureOpenAi,
    Anthropic,
    #[serde(rename = "HUGGINGFACE")]
    HuggingFace,
    Perplexity,
    TogetherAi,
    Groq,
    Mistral,
}

impl LlmProviderKind {
    /// All known providers
    pub const ALL: [LlmProviderKind; 8] = [
        LlmProviderKind::OpenAi,
        LlmProviderKind::AzureOpenAi,
        LlmProviderKind::Anthropic,
        LlmProviderKind::HuggingFace,
        LlmProviderKind::Perplexity,
        LlmProviderKind::TogetherAi,
        LlmProviderKind::Groq,
        LlmProviderKind::Mistral,
    ];

    /// Persisted identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProviderKind::OpenAi => "OPENAI",
            LlmProviderKind::AzureOpenAi => "AZURE_OPENAI",
            LlmProviderKind::Anthropic => "ANTHROPIC",
            LlmProviderKind::HuggingFace => "HUGGINGFACE",
            LlmProviderKind::Perplexity => "PERPLEXITY",
            LlmProviderKind::TogetherAi => "TOGETHER_AI",
            LlmProviderKind::Groq => "GROQ",
            LlmProviderKind::Mistral => "MISTRAL",
        }
    }

    /// OpenAI and Azure OpenAI share the native function-calling back end
    pub fn is_openai_family(&self) -> bool {
        matches!(self, LlmProviderKind::OpenAi | LlmProviderKind::AzureOpenAi)
    }
}

impl std::fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LlmProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        LlmProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown provider type: {}", s))
    }
}

/// Model aliases stored on agent records
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("GPT_3_5_TURBO", "gpt-3.5-turbo"),
    ("GPT_3_5_TURBO_16K_0613", "gpt-3.5-turbo-16k-0613"),
    ("GPT_3_5_TURBO_0613", "gpt-3.5-turbo-0613"),
    ("GPT_3_5_TURBO_1106", "gpt-3.5-turbo-1106"),
    ("GPT_4", "gpt-4"),
    ("GPT_4_0613", "gpt-4-0613"),
    ("GPT_4_32K_0613", "gpt-4-32k-0613"),
    ("GPT_4_1106_PREVIEW", "gpt-4-1106-preview"),
    ("GPT_4_TURBO_PREVIEW", "gpt-4-turbo-preview"),
    (
        "MISTRAL_7B_INSTRUCT_V01",
        "mistralai/Mistral-7B-Instruct-v0.1",
    ),
    (
        "MIXTRAL_8X7B_INSTRUCT_V01",
        "mistralai/Mixtral-8x7B-Instruct-v0.1",
    ),
];

/// Resolve a persisted model alias to the provider model name.
///
/// Unknown values are returned unchanged so that raw model names
/// (e.g. "claude-3-haiku-20240307") can be stored directly.
pub fn resolve_model_name(model: &str) -> String {
    MODEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == model)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| model.to_string())
}
