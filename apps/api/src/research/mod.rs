//! Company / role web summary, answered by the search-backed chat model.

pub mod handlers;
pub mod prompts;

use crate::llm_client::prompts::fill;
use crate::llm_client::{LlmClient, LlmError};
use crate::research::prompts::{RESEARCH_SYSTEM, SUMMARY_PROMPT_TEMPLATE};

const SUMMARY_MAX_TOKENS: u32 = 700;

/// Returns a short overview of the company and role named in `query`.
pub async fn company_summary(llm: &LlmClient, query: &str) -> Result<String, LlmError> {
    let prompt = fill(SUMMARY_PROMPT_TEMPLATE, &[("query", query.trim())]);
    llm.call_text(&prompt, RESEARCH_SYSTEM, SUMMARY_MAX_TOKENS)
        .await
        .map(|summary| summary.trim().to_string())
}
