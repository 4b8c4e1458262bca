use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::activity::LastError;
use crate::audit::service::{execute, AuditInput, AuditResult};
use crate::audit::upload::{parse_form, AuditForm};
use crate::audit::AuditAction;
use crate::errors::AppError;
use crate::repair::RepairStage;
use crate::state::AppState;
use crate::store::{HistoryEntry, HistoryResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub action: AuditAction,
    pub stage: RepairStage,
    /// Only a few fields were salvaged; the rest are placeholders.
    pub partial: bool,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<Uuid>,
    pub result: AuditResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub busy: Vec<AuditAction>,
    pub last_error: Option<LastError>,
    pub relay_enabled: bool,
    pub daily_limit: u64,
}

fn parse_action(slug: &str) -> Result<AuditAction, AppError> {
    serde_json::from_value(Value::String(slug.to_string()))
        .map_err(|_| AppError::NotFound(format!("Unknown action '{slug}'")))
}

/// POST /api/v1/audit/:action
pub async fn handle_audit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Json<AuditResponse>, AppError> {
    let action = parse_action(&slug)?;
    let _busy = state
        .activity
        .try_begin(action)
        .ok_or(AppError::ActionBusy(slug))?;

    let response = run_audit(&state, action, multipart).await;
    if let Err(e) = &response {
        state
            .activity
            .record_error(Some(action), e.code(), &e.user_message());
    }
    response.map(Json)
}

async fn run_audit(
    state: &AppState,
    action: AuditAction,
    multipart: Multipart,
) -> Result<AuditResponse, AppError> {
    let AuditForm { input, history_id } = parse_form(multipart).await?;
    input.validate(action)?;

    let config = state.store.load_settings().await;
    let outcome = execute(&state.llm, &config, action, &input).await?;
    if outcome.is_partial() {
        warn!("{action:?} returned salvaged placeholder data");
    }

    let history_id = save_to_history(state, action, &input, history_id, &outcome.result).await;

    Ok(AuditResponse {
        action,
        stage: outcome.stage,
        partial: outcome.is_partial(),
        truncated: outcome.truncated,
        history_id,
        result: outcome.result,
    })
}

/// Analyses and comparisons become new entries; salary scripts and 90-day plans are
/// attached to the analysis they were generated from. A storage failure is recorded
/// but never discards the result.
async fn save_to_history(
    state: &AppState,
    action: AuditAction,
    input: &AuditInput,
    attach_to: Option<Uuid>,
    result: &AuditResult,
) -> Option<Uuid> {
    let saved = match (result, attach_to) {
        (AuditResult::Analysis(analysis), _) => {
            let entry = HistoryEntry::new(
                HistoryResult::Analysis(analysis.clone()),
                input.resume_content(),
                input.job_description.clone(),
            );
            let id = entry.id;
            state.store.push_history(entry).await.map(|_| Some(id))
        }
        (AuditResult::Comparison(comparison), _) => {
            let entry = HistoryEntry::new(
                HistoryResult::Comparison(comparison.clone()),
                None,
                input.job_description.clone(),
            );
            let id = entry.id;
            state.store.push_history(entry).await.map(|_| Some(id))
        }
        (AuditResult::Salary(salary), Some(id)) => state
            .store
            .update_entry(id, |entry| {
                if let HistoryResult::Analysis(analysis) = &mut entry.result {
                    analysis.salary_negotiation = Some(salary.clone());
                }
            })
            .await
            .map(|found| found.map(|e| e.id)),
        (AuditResult::Plan90(plan), Some(id)) => state
            .store
            .update_entry(id, |entry| {
                if let HistoryResult::Analysis(analysis) = &mut entry.result {
                    analysis.plan_90_days = Some(plan.clone());
                }
            })
            .await
            .map(|found| found.map(|e| e.id)),
        _ => Ok(None),
    };

    match saved {
        Ok(Some(id)) => {
            info!("{action:?} result saved to history entry {id}");
            Some(id)
        }
        Ok(None) => {
            if let Some(id) = attach_to {
                warn!("History entry {id} not found; {action:?} result not attached");
            }
            None
        }
        Err(e) => {
            error!("Failed to save {action:?} result: {e:#}");
            let code = AppError::Internal(e).code();
            state
                .activity
                .record_error(Some(action), code, "Result could not be saved to history");
            None
        }
    }
}

/// GET /api/v1/status
pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        busy: state.activity.busy_actions(),
        last_error: state.activity.last_error(),
        relay_enabled: state.relay.has_key(),
        daily_limit: state.config.daily_limit,
    })
}
