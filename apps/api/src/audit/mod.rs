// Audit actions: resume analysis and the tools built on top of it.
// Each action is one provider call: build request → transport → sanitize → repair.
// All provider calls go through llm_client; nothing here talks HTTP directly.

pub mod activity;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod schemas;
pub mod service;
pub mod upload;

use serde::{Deserialize, Serialize};

/// One user-triggerable action. Kebab-case in URLs (`/api/v1/audit/cold-email`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditAction {
    Analyze,
    Remaster,
    Interview,
    Pivot,
    Roadmap,
    #[serde(rename = "linkedin")]
    LinkedIn,
    GithubProfile,
    ColdEmail,
    #[serde(rename = "plan-90")]
    Plan90,
    Salary,
    Compare,
}

impl AuditAction {
    pub const ALL: [AuditAction; 11] = [
        AuditAction::Analyze,
        AuditAction::Remaster,
        AuditAction::Interview,
        AuditAction::Pivot,
        AuditAction::Roadmap,
        AuditAction::LinkedIn,
        AuditAction::GithubProfile,
        AuditAction::ColdEmail,
        AuditAction::Plan90,
        AuditAction::Salary,
        AuditAction::Compare,
    ];

    /// Actions that need a target role or goal in addition to the resume.
    pub fn needs_target_context(self) -> bool {
        matches!(
            self,
            AuditAction::Roadmap | AuditAction::ColdEmail | AuditAction::Plan90 | AuditAction::Salary
        )
    }
}
