use serde::Serialize;
use tracing::{info, warn};

use crate::audit::models::*;
use crate::audit::prompts::system_prompt;
use crate::audit::schemas::schema_for;
use crate::audit::AuditAction;
use crate::errors::AppError;
use crate::llm_client::provider::ProviderConfig;
use crate::llm_client::request::{
    build_request, Document, FileAttachment, PromptRequest, ResumeSource,
};
use crate::llm_client::{LlmClient, LlmError};
use crate::repair::{recover, ModelOutput, Recovered, RepairStage};

/// Everything a user can submit for one action. Which fields matter depends on the action.
#[derive(Debug, Clone, Default)]
pub struct AuditInput {
    pub file: Option<FileAttachment>,
    pub text: Option<String>,
    pub job_description: Option<String>,
    pub context: Option<String>,
    pub role: Option<String>,
    pub level: Option<String>,
    pub extra_projects: Option<String>,
    pub achievements: Option<String>,
    /// Only read by `compare`.
    pub candidates: Vec<Document>,
}

impl AuditInput {
    /// Picks the resume source for this provider. Text wins only when the provider
    /// cannot see files; otherwise an uploaded file is embedded as-is.
    pub fn resume_source(&self, config: &ProviderConfig) -> Option<ResumeSource> {
        let text = non_blank(&self.text);
        match (&self.file, text) {
            (Some(_), Some(text)) if !config.supports_vision() => {
                Some(ResumeSource::Text(text.to_string()))
            }
            (Some(file), _) => Some(ResumeSource::File(file.clone())),
            (None, Some(text)) => Some(ResumeSource::Text(text.to_string())),
            (None, None) => None,
        }
    }

    /// Rejects inputs that cannot produce a meaningful call, before any I/O.
    pub fn validate(&self, action: AuditAction) -> Result<(), AppError> {
        if action == AuditAction::Compare {
            if self.candidates.len() < 2 {
                return Err(AppError::Validation(
                    "Comparison needs at least two candidates".to_string(),
                ));
            }
            return Ok(());
        }
        if self.file.is_none() && non_blank(&self.text).is_none() {
            return Err(AppError::Validation(
                "Resume content is required: upload a file or paste text".to_string(),
            ));
        }
        if action.needs_target_context() && non_blank(&self.context).is_none() {
            return Err(AppError::Validation(
                "A target role or goal is required for this action".to_string(),
            ));
        }
        Ok(())
    }

    /// What history records as the resume: the pasted text, else a note naming the file.
    pub fn resume_content(&self) -> Option<String> {
        non_blank(&self.text)
            .map(str::to_string)
            .or_else(|| self.file.as_ref().map(|f| format!("File uploaded: {}", f.name)))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn wrapped(tag: &str, value: &Option<String>) -> String {
    match non_blank(value) {
        Some(v) => format!("<{tag}>{v}</{tag}>"),
        None => String::new(),
    }
}

/// The per-action user message. Resume content is attached separately by the builder.
pub fn user_prompt(action: AuditAction, input: &AuditInput) -> String {
    let jd = wrapped("job_description", &input.job_description);
    let target = wrapped("target_context", &input.context);
    match action {
        AuditAction::Analyze => {
            let context = match (non_blank(&input.role), non_blank(&input.level)) {
                (None, None) => "General".to_string(),
                (role, level) => format!(
                    "Role: {}, Level: {}",
                    role.unwrap_or("Any"),
                    level.unwrap_or("Any")
                ),
            };
            format!("Analyze Resume. Context: {context}\n{jd}")
        }
        AuditAction::Remaster => format!(
            "Remaster Resume. Inputs: Projects: {}\nAwards: {}. JD: {jd}",
            non_blank(&input.extra_projects).unwrap_or("None"),
            non_blank(&input.achievements).unwrap_or("None"),
        ),
        AuditAction::Interview => format!("Generate Questions. JD: {jd}"),
        AuditAction::Pivot => "Generate Pivots".to_string(),
        AuditAction::Roadmap | AuditAction::ColdEmail => format!("Target: {target}"),
        AuditAction::LinkedIn => "Generate Profile".to_string(),
        AuditAction::GithubProfile => "Generate README".to_string(),
        AuditAction::Plan90 | AuditAction::Salary => format!("Target Context: {target}"),
        AuditAction::Compare => {
            let jd = if jd.is_empty() { "None".to_string() } else { jd };
            format!("Compare candidates. JD: {jd}")
        }
    }
}

/// One typed result per action. Serialized without a tag; the action travels alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuditResult {
    Analysis(AnalysisResult),
    Remaster(RemasterResult),
    Interview(InterviewPrepResult),
    Pivot(PivotResult),
    Roadmap(RoadmapResult),
    LinkedIn(LinkedInProfile),
    GithubProfile(GithubProfileResult),
    ColdEmail(ColdEmailResult),
    Plan90(Plan90DaysResult),
    Salary(SalaryNegotiationResult),
    Comparison(ComparisonResult),
}

#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub result: AuditResult,
    pub stage: RepairStage,
    /// The provider hit its output bound; the result may be incomplete.
    pub truncated: bool,
}

impl AuditOutcome {
    pub fn is_partial(&self) -> bool {
        self.stage == RepairStage::Salvaged
    }
}

fn documents_for(action: AuditAction, input: &AuditInput, config: &ProviderConfig) -> Vec<Document> {
    if action == AuditAction::Compare {
        return input.candidates.clone();
    }
    input
        .resume_source(config)
        .map(Document::resume)
        .into_iter()
        .collect()
}

fn candidate_summaries(candidates: &[Document]) -> Vec<CandidateSummary> {
    candidates
        .iter()
        .filter_map(|doc| match doc {
            Document::Candidate { name, source } => Some(match source {
                ResumeSource::Text(text) => CandidateSummary {
                    name: name.clone(),
                    kind: CandidateKind::Text,
                    text: Some(text.clone()),
                },
                ResumeSource::File(_) => CandidateSummary {
                    name: name.clone(),
                    kind: CandidateKind::File,
                    text: None,
                },
            }),
            Document::Resume(_) => None,
        })
        .collect()
}

fn recover_into<T, F>(raw: &str, wrap: F) -> Result<(AuditResult, RepairStage), LlmError>
where
    T: ModelOutput,
    F: FnOnce(T) -> AuditResult,
{
    let Recovered { value, stage } = recover::<T>(raw).map_err(|_| LlmError::Unparseable)?;
    Ok((wrap(value), stage))
}

/// Runs one action end to end: build request, call the provider, repair the output.
pub async fn execute(
    llm: &LlmClient,
    config: &ProviderConfig,
    action: AuditAction,
    input: &AuditInput,
) -> Result<AuditOutcome, LlmError> {
    let system = system_prompt(action);
    let schema = schema_for(action);
    let prompt = PromptRequest {
        system: &system,
        user: user_prompt(action, input),
        documents: documents_for(action, input, config),
        schema: &schema,
    };
    let envelope = build_request(config, &prompt);

    info!(
        "Running {action:?} with {:?} model {}",
        config.provider, config.model_name
    );
    let completion = llm.complete(config, &envelope).await?;
    if completion.truncated {
        warn!("{action:?} output was truncated by the provider");
    }

    let raw = completion.text.as_str();
    let (result, stage) = match action {
        AuditAction::Analyze => recover_into(raw, AuditResult::Analysis)?,
        AuditAction::Remaster => recover_into(raw, AuditResult::Remaster)?,
        AuditAction::Interview => recover_into(raw, AuditResult::Interview)?,
        AuditAction::Pivot => recover_into(raw, AuditResult::Pivot)?,
        AuditAction::Roadmap => recover_into(raw, AuditResult::Roadmap)?,
        AuditAction::LinkedIn => recover_into(raw, AuditResult::LinkedIn)?,
        AuditAction::GithubProfile => recover_into(raw, AuditResult::GithubProfile)?,
        AuditAction::ColdEmail => recover_into(raw, AuditResult::ColdEmail)?,
        AuditAction::Plan90 => recover_into(raw, AuditResult::Plan90)?,
        AuditAction::Salary => recover_into(raw, AuditResult::Salary)?,
        AuditAction::Compare => recover_into(raw, |mut c: ComparisonResult| {
            c.candidate_data = candidate_summaries(&input.candidates);
            AuditResult::Comparison(c)
        })?,
    };

    Ok(AuditOutcome {
        result,
        stage,
        truncated: completion.truncated,
    })
}
