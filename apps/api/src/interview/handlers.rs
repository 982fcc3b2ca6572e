//! Axum route handlers for the interview coaching API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::{
    analyze_answer, analyze_resume, follow_up, generate_interview_qas, QaEnrichment,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub resume: String,
    pub company: String,
    pub position: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeFeedbackResponse {
    pub feedback: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerAnalysisRequest {
    pub question: String,
    pub answer: String,
    pub resume: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerAnalysisResponse {
    pub analysis: String,
}

#[derive(Debug, Deserialize)]
pub struct FollowUpRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpResponse {
    pub follow_ups: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQasRequest {
    pub company: String,
    pub position: String,
    pub resume_content: String,
    #[serde(default)]
    pub include_company_summary: bool,
    #[serde(default)]
    pub include_similar_questions: bool,
}

#[derive(Debug, Serialize)]
pub struct InterviewQasResponse {
    pub questions: Vec<String>,
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /interview/analyze-resume
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    Json(req): Json<ResumeRequest>,
) -> Result<Json<ResumeFeedbackResponse>, AppError> {
    require("resume", &req.resume)?;
    require("company", &req.company)?;
    require("position", &req.position)?;

    let feedback = analyze_resume(&state.llm, &req.resume, &req.company, &req.position).await?;
    Ok(Json(ResumeFeedbackResponse { feedback }))
}

/// POST /interview/analyze-answer
pub async fn handle_analyze_answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerAnalysisRequest>,
) -> Result<Json<AnswerAnalysisResponse>, AppError> {
    require("question", &req.question)?;
    require("answer", &req.answer)?;

    let analysis = analyze_answer(&state.llm, &req.question, &req.answer, &req.resume).await?;
    Ok(Json(AnswerAnalysisResponse { analysis }))
}

/// POST /interview/follow-up
pub async fn handle_follow_up(
    State(state): State<AppState>,
    Json(req): Json<FollowUpRequest>,
) -> Result<Json<FollowUpResponse>, AppError> {
    require("question", &req.question)?;
    require("answer", &req.answer)?;

    let follow_ups = follow_up(&state.llm, &req.question, &req.answer).await?;
    Ok(Json(FollowUpResponse { follow_ups }))
}

/// POST /interview/generate-qas
///
/// Optionally enriches the prompt with a web summary of the company / position
/// and with similar questions from the question index.
pub async fn handle_generate_qas(
    State(state): State<AppState>,
    Json(req): Json<InterviewQasRequest>,
) -> Result<Json<InterviewQasResponse>, AppError> {
    require("company", &req.company)?;
    require("position", &req.position)?;
    require("resumeContent", &req.resume_content)?;

    let enrichment = QaEnrichment {
        company_summary: req.include_company_summary,
        similar_questions: req
            .include_similar_questions
            .then_some(state.config.search_top_k),
    };
    let questions = generate_interview_qas(
        &state.llm,
        &state.search,
        &req.company,
        &req.position,
        &req.resume_content,
        enrichment,
    )
    .await?;
    Ok(Json(InterviewQasResponse { questions }))
}
