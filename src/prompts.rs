//! Prompt templates for the three turn steps
//!
//! A template is an ordered list of role-tagged messages containing
//! `{name}` placeholders. Rendering substitutes every placeholder from a
//! variable map and fails if one is missing.

use crate::llm::{LlmMessage, LlmRequest, MessageRole};
use std::collections::BTreeMap;
use thiserror::Error;

/// Variables substituted into a template
pub type PromptVariables = BTreeMap<&'static str, String>;

/// Shown to the response step when nothing was retrieved
pub const NO_CONTEXT_PLACEHOLDER: &str = "No additional information available.";

/// Shown to the decision step when nothing was retrieved
pub const NO_DECISION_CONTEXT: &str = "None.";

const DECIDE_SYSTEM: &str = "Decide if we need to consult the retrieval agents for more information \
or if we can respond directly. Output ONLY 'query' or 'respond'. \
Invalid decisions so far: {invalid_count}. More than {max_invalid} will result in termination.";

const DECIDE_CONTEXT: &str = "Context retrieved from the retrieval agents: {context} Query again?";

const FORMULATE_SYSTEM: &str = "Formulate a natural language query for the retrieval agents \
based on the student's question. Output only the query.";

const RESPOND_SYSTEM: &str = "You are a helpful assistant for a student. Respond based on the \
conversation and any information from the retrieval agents.";

const RESPOND_CONTEXT: &str = "Information provided by the retrieval agents: {context}\nResponse:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Template {template} is missing variable '{name}'")]
    MissingVariable {
        template: &'static str,
        name: String,
    },
    #[error("Template {template} has an unterminated placeholder")]
    Unterminated { template: &'static str },
}

/// Identifies which prompt a model call renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptTemplate {
    /// Classify the latest message as `query` or `respond`
    Decide,
    /// Rewrite the latest message as a retrieval query
    FormulateQuery,
    /// Synthesize the final reply
    Respond,
}

impl PromptTemplate {
    pub fn id(self) -> &'static str {
        match self {
            PromptTemplate::Decide => "decide",
            PromptTemplate::FormulateQuery => "formulate_query",
            PromptTemplate::Respond => "respond",
        }
    }

    fn layout(self) -> &'static [(MessageRole, &'static str)] {
        match self {
            PromptTemplate::Decide => &[
                (MessageRole::System, DECIDE_SYSTEM),
                (MessageRole::User, "{input}"),
                (MessageRole::System, DECIDE_CONTEXT),
            ],
            PromptTemplate::FormulateQuery => &[
                (MessageRole::System, FORMULATE_SYSTEM),
                (MessageRole::User, "{input}"),
            ],
            PromptTemplate::Respond => &[
                (MessageRole::System, RESPOND_SYSTEM),
                (MessageRole::User, "{input}"),
                (MessageRole::System, RESPOND_CONTEXT),
            ],
        }
    }

    /// Upper bound on generated tokens; the decision only needs one word
    fn max_tokens(self) -> u32 {
        match self {
            PromptTemplate::Decide => 16,
            PromptTemplate::FormulateQuery => 256,
            PromptTemplate::Respond => 1024,
        }
    }

    /// Render into a request ready for an `LlmService`
    pub fn render(self, variables: &PromptVariables) -> Result<LlmRequest, PromptError> {
        let messages = self
            .layout()
            .iter()
            .map(|(role, text)| {
                Ok(LlmMessage {
                    role: *role,
                    content: substitute(self.id(), text, variables)?,
                })
            })
            .collect::<Result<Vec<_>, PromptError>>()?;

        Ok(LlmRequest::new(messages)
            .with_max_tokens(self.max_tokens())
            .with_temperature(0.0))
    }
}

/// Replace `{name}` placeholders. Values are inserted verbatim, so braces
/// inside user text are never re-expanded.
fn substitute(
    template: &'static str,
    text: &str,
    variables: &PromptVariables,
) -> Result<String, PromptError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some((before, after)) = rest.split_once('{') {
        out.push_str(before);
        let (name, tail) = after
            .split_once('}')
            .ok_or(PromptError::Unterminated { template })?;
        let value = variables
            .get(name)
            .ok_or_else(|| PromptError::MissingVariable {
                template,
                name: name.to_string(),
            })?;
        out.push_str(value);
        rest = tail;
    }
    out.push_str(rest);

    Ok(out)
}
