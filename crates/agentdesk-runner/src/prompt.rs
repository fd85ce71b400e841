// System prompt assembly

use agentdesk_core::agent::{AgentDatasource, AgentTool};

/// Prompt used when the agent record has none
pub const DEFAULT_PROMPT: &str =
    "You are a helpful AI Assistant, answer the users questions to the best of your ability.";

/// The agent's own prompt, or the default one when absent or blank
pub fn base_prompt(prompt: Option<&str>) -> &str {
    prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROMPT)
}

/// Instruction appended when the caller asks for structured output
pub fn output_schema_instruction(schema: &str) -> String {
    format!(
        "Always answer using the following JSON schema and return only valid JSON, \
         without any surrounding text:\n{}",
        schema.trim()
    )
}

/// Textual tool listing for back ends without native function calling
pub fn render_tools(tools: &[AgentTool]) -> Option<String> {
    if tools.is_empty() {
        return None;
    }
    let mut section = String::from("You have access to the following tools:");
    for agent_tool in tools {
        section.push_str(&format!(
            "\n- {}: {}",
            agent_tool.tool.name, agent_tool.tool.description
        ));
    }
    Some(section)
}

/// Textual datasource listing for back ends without native function calling
pub fn render_datasources(datasources: &[&AgentDatasource]) -> Option<String> {
    if datasources.is_empty() {
        return None;
    }
    let mut section = String::from("You can answer questions using the following datasources:");
    for agent_datasource in datasources {
        let datasource = &agent_datasource.datasource;
        section.push_str(&format!(
            "\n- {} ({}): {}",
            datasource.name, datasource.datasource_type, datasource.description
        ));
    }
    Some(section)
}

/// Builds a system prompt from a base prompt and optional sections
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    sections: Vec<String>,
}

impl PromptBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            sections: vec![base.into()],
        }
    }

    /// Append a section when present
    pub fn section(mut self, section: Option<String>) -> Self {
        if let Some(section) = section {
            self.sections.push(section);
        }
        self
    }

    pub fn output_schema(self, schema: Option<&str>) -> Self {
        let instruction = schema
            .filter(|s| !s.trim().is_empty())
            .map(output_schema_instruction);
        self.section(instruction)
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_prompt_falls_back_to_default() {
        assert_eq!(base_prompt(None), DEFAULT_PROMPT);
        assert_eq!(base_prompt(Some("   ")), DEFAULT_PROMPT);
        assert_eq!(base_prompt(Some(" Be brief. ")), "Be brief.");
    }

    #[test]
    fn test_prompt_builder_appends_schema() {
        let prompt = PromptBuilder::new("Base")
            .section(None)
            .output_schema(Some("{\"type\": \"object\"}"))
            .build();

        assert!(prompt.starts_with("Base\n\n"));
        assert!(prompt.ends_with("{\"type\": \"object\"}"));
    }

    #[test]
    fn test_blank_schema_is_ignored() {
        let prompt = PromptBuilder::new("Base").output_schema(Some("  ")).build();
        assert_eq!(prompt, "Base");
    }
}
