//! Typed result shapes returned by the model.
//!
//! Every struct tolerates missing fields: the schema sent with the prompt is a hint,
//! not a contract, so absent keys fall back to defaults instead of failing the parse.
//! Scores are `f64` because models freely mix `85` and `85.0`, and they are read
//! through [`lenient`] so `"85"` and `null` are accepted as well.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repair::{lenient, salvage, ModelOutput};

// ────────────────────────────────────────────────────────────────────────────
// Analysis (auditor + psychometric profile)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisResult {
    pub candidate_name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub overall_score: f64,
    pub roast_headline: String,
    pub brutal_truth: String,
    pub metrics: Metrics,
    pub red_flags: Vec<String>,
    pub green_flags: Vec<String>,
    pub fixes: Vec<RewriteSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ats_analysis: Option<AtsAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psychometric_profile: Option<PsychometricProfile>,
    /// Attached later when the user generates salary scripts for this analysis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_negotiation: Option<SalaryNegotiationResult>,
    /// Attached later when the user generates a 90-day plan for this analysis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_90_days: Option<Plan90DaysResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metrics {
    #[serde(deserialize_with = "lenient::number")]
    pub impact: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub brevity: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub technical_depth: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub formatting: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteSuggestion {
    pub original: String,
    pub improved: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtsAnalysis {
    #[serde(deserialize_with = "lenient::number")]
    pub match_score: f64,
    pub missing_keywords: Vec<String>,
    pub matching_keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PsychometricProfile {
    pub archetype: String,
    pub summary: String,
    pub traits: Vec<TraitScore>,
    pub culture_fit: String,
    pub friction_points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraitScore {
    #[serde(rename = "trait")]
    pub name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub score: f64,
    pub explanation: String,
}

impl ModelOutput for AnalysisResult {
    fn salvage(raw: &str) -> Option<Value> {
        salvage::analysis(raw)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Executive actions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Plan90DaysResult {
    pub role_context: String,
    pub days30: PlanPhase,
    pub days60: PlanPhase,
    pub days90: PlanPhase,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanPhase {
    pub focus: String,
    pub goals: Vec<String>,
}

impl ModelOutput for Plan90DaysResult {
    fn salvage(raw: &str) -> Option<Value> {
        salvage::plan_90_days(raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SalaryNegotiationResult {
    pub estimated_market_value: String,
    pub leverage_points: Vec<String>,
    pub scripts: Vec<SalaryScript>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SalaryScript {
    /// Conservative, Balanced or Aggressive.
    pub scenario: String,
    pub subject_line: String,
    pub email_body: String,
    /// Low, Medium or High.
    pub risk_level: String,
    pub why_use_it: String,
}

impl ModelOutput for SalaryNegotiationResult {
    fn salvage(raw: &str) -> Option<Value> {
        salvage::salary(raw)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Solo tools
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemasterResult {
    pub markdown_content: String,
    pub cut_report: Vec<CutItem>,
    pub improvements_made: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutItem {
    pub text: String,
    pub reason: String,
}

impl ModelOutput for RemasterResult {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterviewPrepResult {
    pub questions: Vec<InterviewQuestion>,
    pub elevator_pitch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterviewQuestion {
    pub asked_by: String,
    pub question: String,
    pub context: String,
    pub good_answer_key: String,
    pub bad_answer_trap: String,
}

impl ModelOutput for InterviewPrepResult {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotResult {
    pub options: Vec<PivotOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PivotOption {
    pub role: String,
    pub salary_range: String,
    #[serde(deserialize_with = "lenient::number")]
    pub fit_score: f64,
    pub why_it_fits: String,
    pub gap_analysis: String,
    /// EASY, MEDIUM or HARD.
    pub transition_difficulty: String,
    pub market_outlook: String,
    pub bridge_project: String,
    pub translation_layer: TranslationLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationLayer {
    pub original: String,
    pub adapted: String,
}

impl ModelOutput for PivotResult {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoadmapResult {
    pub target_goal: String,
    pub schedule: Vec<WeekPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekPlan {
    #[serde(deserialize_with = "lenient::whole")]
    pub week: u32,
    pub theme: String,
    pub tasks: Vec<String>,
    pub resources: Vec<String>,
    pub checkpoint: String,
}

impl ModelOutput for RoadmapResult {
    fn salvage(raw: &str) -> Option<Value> {
        salvage::roadmap(raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkedInProfile {
    pub headlines: Vec<String>,
    pub about_section: String,
    pub experience_rewrite: Vec<ExperienceRewrite>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExperienceRewrite {
    pub company: String,
    pub role: String,
    pub optimized_bullets: Vec<String>,
}

impl ModelOutput for LinkedInProfile {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GithubProfileResult {
    pub markdown_content: String,
}

impl ModelOutput for GithubProfileResult {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColdEmailResult {
    pub emails: Vec<ColdEmail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColdEmail {
    /// DIRECT, SOFT or VALUE.
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: String,
    pub body: String,
    pub explanation: String,
}

impl ModelOutput for ColdEmailResult {}

// ────────────────────────────────────────────────────────────────────────────
// Comparison (multi-candidate + dream team)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComparisonResult {
    pub summary: String,
    pub leaderboard: Vec<RankItem>,
    pub category_breakdown: Vec<CategoryRank>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dream_team_analysis: Option<DreamTeamAnalysis>,
    /// Filled in by the service, never by the model.
    pub candidate_data: Vec<CandidateSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankItem {
    #[serde(deserialize_with = "lenient::whole")]
    pub rank: u32,
    pub candidate_name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRank {
    pub category: String,
    pub rankings: Vec<RankItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DreamTeamAnalysis {
    pub squad_name: String,
    pub selected_members: Vec<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub synergy_score: f64,
    pub rationale: String,
    pub roles: Vec<TeamRole>,
    pub collective_weaknesses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRole {
    pub name: String,
    pub role: String,
    pub contribution: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateKind {
    File,
    #[default]
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ModelOutput for ComparisonResult {}
