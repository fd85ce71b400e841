// Tool definitions derived from agent relations
//
// Tools and ready datasources are exposed to function-calling models as
// function definitions. Function names must match ^[a-zA-Z0-9_-]{1,64}$ and
// be unique within one request.

use std::collections::HashSet;

use agentdesk_core::agent::{AgentDatasource, AgentDefinition, AgentTool};
use agentdesk_core::tool_types::ToolDefinition;
use serde_json::{json, Value};

/// Datasource status meaning the content has been ingested
pub const DATASOURCE_READY: &str = "DONE";

const MAX_FUNCTION_NAME_LEN: usize = 64;

/// Datasources whose ingestion has finished
pub fn ready_datasources(definition: &AgentDefinition) -> Vec<&AgentDatasource> {
    definition
        .datasources
        .iter()
        .filter(|ds| ds.datasource.status.eq_ignore_ascii_case(DATASOURCE_READY))
        .collect()
}

/// Function definitions for all tools and ready datasources of an agent
pub fn tool_definitions(definition: &AgentDefinition) -> Vec<ToolDefinition> {
    let mut used = HashSet::new();
    let mut tools: Vec<ToolDefinition> = definition
        .tools
        .iter()
        .map(|agent_tool| tool_definition(agent_tool, &mut used))
        .collect();
    tools.extend(
        ready_datasources(definition)
            .into_iter()
            .map(|agent_datasource| datasource_definition(agent_datasource, &mut used)),
    );
    tools
}

fn tool_definition(agent_tool: &AgentTool, used: &mut HashSet<String>) -> ToolDefinition {
    let tool = &agent_tool.tool;
    let parameters = tool
        .metadata
        .get("parameters")
        .filter(|p| p.is_object())
        .cloned()
        .unwrap_or_else(|| string_parameter("input", "The input to pass to the tool"));

    ToolDefinition {
        name: unique_name(function_name(&tool.name), used),
        description: tool.description.clone(),
        parameters,
    }
}

fn datasource_definition(
    agent_datasource: &AgentDatasource,
    used: &mut HashSet<String>,
) -> ToolDefinition {
    let datasource = &agent_datasource.datasource;
    ToolDefinition {
        name: unique_name(function_name(&datasource.name), used),
        description: format!(
            "Useful for answering questions about: {}",
            datasource.description
        ),
        parameters: string_parameter("question", "The question to look up in the datasource"),
    }
}

fn string_parameter(name: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            name: { "type": "string", "description": description }
        },
        "required": [name]
    })
}

/// Turn a display name into a valid function name
pub fn function_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    let out: String = out.chars().take(MAX_FUNCTION_NAME_LEN).collect();
    if out.is_empty() {
        "tool".to_string()
    } else {
        out
    }
}

fn unique_name(base: String, used: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        let suffix = format!("_{}", n);
        let keep = MAX_FUNCTION_NAME_LEN.saturating_sub(suffix.len());
        candidate = format!("{}{}", &base[..base.len().min(keep)], suffix);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}
