//! Interview coaching relays: each one templates user input into a prompt,
//! forwards it to the chat model and shapes the plain-text reply.
//! All LLM calls go through llm_client — no direct API calls here.

pub mod handlers;
pub mod prompts;

use tracing::debug;

use crate::errors::AppError;
use crate::interview::prompts::{
    ANSWER_ANALYSIS_TEMPLATE, COACH_SYSTEM, COMPANY_SUMMARY_BLOCK, FOLLOW_UP_TEMPLATE,
    INTERVIEW_QAS_TEMPLATE, RESUME_ANALYSIS_TEMPLATE, SIMILAR_QUESTIONS_BLOCK,
};
use crate::llm_client::prompts::{fill, NO_QUOTES, ONE_ITEM_PER_LINE};
use crate::llm_client::{non_empty_lines, LlmClient, LlmError};
use crate::research::company_summary;
use crate::retrieval::search::SearchService;

const COACH_MAX_TOKENS: u32 = 1000;

/// Resume feedback, one item per line.
pub async fn analyze_resume(
    llm: &LlmClient,
    resume: &str,
    company: &str,
    position: &str,
) -> Result<Vec<String>, LlmError> {
    let prompt = fill(
        RESUME_ANALYSIS_TEMPLATE,
        &[
            ("company", company),
            ("position", position),
            ("resume", resume),
            ("line_rule", ONE_ITEM_PER_LINE),
        ],
    );
    let text = llm.call_text(&prompt, COACH_SYSTEM, COACH_MAX_TOKENS).await?;
    Ok(non_empty_lines(&text))
}

/// Free-form evaluation of an answer to an interview question.
pub async fn analyze_answer(
    llm: &LlmClient,
    question: &str,
    answer: &str,
    resume: &str,
) -> Result<String, LlmError> {
    let prompt = fill(
        ANSWER_ANALYSIS_TEMPLATE,
        &[("question", question), ("answer", answer), ("resume", resume)],
    );
    llm.call_text(&prompt, COACH_SYSTEM, COACH_MAX_TOKENS).await
}

/// A follow-up question digging into the given answer.
pub async fn follow_up(
    llm: &LlmClient,
    question: &str,
    answer: &str,
) -> Result<Vec<String>, LlmError> {
    let prompt = fill(
        FOLLOW_UP_TEMPLATE,
        &[
            ("question", question),
            ("answer", answer),
            ("no_quotes", NO_QUOTES),
        ],
    );
    let text = llm.call_text(&prompt, COACH_SYSTEM, COACH_MAX_TOKENS).await?;
    Ok(non_empty_lines(&text))
}

/// Optional references folded into the expected-question prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct QaEnrichment {
    pub company_summary: bool,
    /// Number of similar questions to pull from the index; `None` skips the lookup.
    pub similar_questions: Option<usize>,
}

/// Expected interview questions for a company / position / resume.
/// Enrichment lookups run before the relay and their failures propagate.
pub async fn generate_interview_qas(
    llm: &LlmClient,
    search: &SearchService,
    company: &str,
    position: &str,
    resume: &str,
    enrichment: QaEnrichment,
) -> Result<Vec<String>, AppError> {
    let lookup = format!("{} {}", company.trim(), position.trim());
    let mut references = String::new();

    if enrichment.company_summary {
        let summary = company_summary(llm, &lookup).await?;
        references.push_str(&fill(COMPANY_SUMMARY_BLOCK, &[("summary", &summary)]));
    }

    if let Some(k) = enrichment.similar_questions {
        let similar = search.search(&lookup, k).await?;
        debug!("found {} similar questions for '{lookup}'", similar.len());
        if !similar.is_empty() {
            let listed = similar
                .iter()
                .map(|r| format!("- {}", r.content))
                .collect::<Vec<_>>()
                .join("\n");
            references.push_str(&fill(SIMILAR_QUESTIONS_BLOCK, &[("questions", &listed)]));
        }
    }

    let prompt = fill(
        INTERVIEW_QAS_TEMPLATE,
        &[
            ("company", company),
            ("position", position),
            ("resume", resume),
            ("references", &references),
            ("line_rule", ONE_ITEM_PER_LINE),
            ("no_quotes", NO_QUOTES),
        ],
    );
    let text = llm.call_text(&prompt, COACH_SYSTEM, COACH_MAX_TOKENS).await?;
    Ok(non_empty_lines(&text))
}
