// All LLM prompt templates for the interview coaching module.
// Placeholders are filled with `llm_client::prompts::fill`.

/// System prompt shared by every coaching relay.
pub const COACH_SYSTEM: &str = "\
당신은 자기소개서를 분석해 피드백을 제공하고, \
면접 질문의 답변을 분석하며, 추가 질문을 제공하는 취업 컨설팅 전문가입니다. \
구체적이고 실질적인 피드백을 제공해주세요.";

/// Replace: {company}, {position}, {resume}, {line_rule}
pub const RESUME_ANALYSIS_TEMPLATE: &str = r#"지원 기업: {company}
지원 직무: {position}

자기소개서:
{resume}

위 자기소개서를 지원 기업과 직무 관점에서 분석해주세요.
강점, 보완이 필요한 부분, 구체적인 수정 제안을 항목별로 제시해주세요.
{line_rule}"#;

/// Replace: {question}, {answer}, {resume}
pub const ANSWER_ANALYSIS_TEMPLATE: &str = r#"면접 질문: {question}
지원자 답변: {answer}

참고용 자기소개서:
{resume}

위 답변이 질문의 의도에 맞는지, 논리적으로 구성되었는지, 자기소개서의 경험과 일관되는지 평가해주세요.
잘한 점과 개선할 점을 구분하여 설명하고, 더 나은 답변 예시를 간단히 제시해주세요."#;

/// Replace: {question}, {answer}, {no_quotes}
pub const FOLLOW_UP_TEMPLATE: &str = r#"질문: {question}
답변: {answer}

위 질문에 대한 답변을 바탕으로 추가 질문 1개를 생성해주세요.
답변의 내용을 더 깊이 파악할 수 있는 질문이어야 합니다.
출력에는 질문 문장만 포함되며, 어떤 설명도 붙이지 마세요.
{no_quotes}"#;

/// Replace: {company}, {position}, {resume}, {references}, {line_rule}, {no_quotes}
pub const INTERVIEW_QAS_TEMPLATE: &str = r#"지원 기업: {company}
지원 직무: {position}

자기소개서:
{resume}
{references}
위 정보를 바탕으로 실제 면접에서 나올 법한 예상 질문 5개를 생성해주세요.
자기소개서의 경험을 구체적으로 검증하는 질문과 직무 역량을 확인하는 질문을 섞어주세요.
출력에는 질문 문장만 포함되며, 번호나 설명을 붙이지 마세요.
{line_rule}
{no_quotes}"#;

/// Reference block inserted into the QA prompt when a company summary is requested.
/// Replace: {summary}
pub const COMPANY_SUMMARY_BLOCK: &str = r#"
기업 및 직무 개요:
{summary}
"#;

/// Reference block listing similar questions from the question index.
/// Replace: {questions}
pub const SIMILAR_QUESTIONS_BLOCK: &str = r#"
참고할 기출 면접 질문:
{questions}
"#;
