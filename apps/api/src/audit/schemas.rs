//! Output schema hints, one per action. Appended to the system prompt as text;
//! providers are free to ignore them.

use serde_json::{json, Value};

use crate::audit::AuditAction;

pub fn schema_for(action: AuditAction) -> Value {
    match action {
        AuditAction::Analyze => analysis(),
        AuditAction::Remaster => json!({
            "type": "OBJECT",
            "properties": {
                "markdownContent": { "type": "STRING" },
                "cutReport": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": { "text": { "type": "STRING" }, "reason": { "type": "STRING" } } } },
                "improvementsMade": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["markdownContent"]
        }),
        AuditAction::Interview => json!({
            "type": "OBJECT",
            "properties": {
                "questions": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                    "askedBy": { "type": "STRING" },
                    "question": { "type": "STRING" },
                    "context": { "type": "STRING" },
                    "goodAnswerKey": { "type": "STRING" },
                    "badAnswerTrap": { "type": "STRING" }
                } } },
                "elevatorPitch": { "type": "STRING" }
            },
            "required": ["questions"]
        }),
        AuditAction::Pivot => json!({
            "type": "OBJECT",
            "properties": {
                "options": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                    "role": { "type": "STRING" },
                    "salaryRange": { "type": "STRING" },
                    "fitScore": { "type": "INTEGER" },
                    "whyItFits": { "type": "STRING" },
                    "gapAnalysis": { "type": "STRING" },
                    "transitionDifficulty": { "type": "STRING", "enum": ["EASY", "MEDIUM", "HARD"] },
                    "marketOutlook": { "type": "STRING" },
                    "bridgeProject": { "type": "STRING" },
                    "translationLayer": { "type": "OBJECT", "properties": { "original": { "type": "STRING" }, "adapted": { "type": "STRING" } } }
                } } }
            },
            "required": ["options"]
        }),
        AuditAction::Roadmap => json!({
            "type": "OBJECT",
            "properties": {
                "targetGoal": { "type": "STRING" },
                "schedule": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                    "week": { "type": "INTEGER" },
                    "theme": { "type": "STRING" },
                    "tasks": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "resources": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "checkpoint": { "type": "STRING" }
                }, "required": ["week", "theme", "tasks", "resources"] } }
            },
            "required": ["targetGoal", "schedule"]
        }),
        AuditAction::LinkedIn => json!({
            "type": "OBJECT",
            "properties": {
                "headlines": { "type": "ARRAY", "items": { "type": "STRING" } },
                "aboutSection": { "type": "STRING" },
                "experienceRewrite": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                    "company": { "type": "STRING" },
                    "role": { "type": "STRING" },
                    "optimizedBullets": { "type": "ARRAY", "items": { "type": "STRING" } }
                } } }
            },
            "required": ["headlines"]
        }),
        AuditAction::GithubProfile => json!({
            "type": "OBJECT",
            "properties": { "markdownContent": { "type": "STRING" } },
            "required": ["markdownContent"]
        }),
        AuditAction::ColdEmail => json!({
            "type": "OBJECT",
            "properties": {
                "emails": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                    "type": { "type": "STRING" },
                    "subject": { "type": "STRING" },
                    "body": { "type": "STRING" },
                    "explanation": { "type": "STRING" }
                } } }
            },
            "required": ["emails"]
        }),
        AuditAction::Plan90 => plan_90_days(),
        AuditAction::Salary => json!({
            "type": "OBJECT",
            "properties": {
                "estimatedMarketValue": { "type": "STRING" },
                "leveragePoints": { "type": "ARRAY", "items": { "type": "STRING" } },
                "scripts": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                    "scenario": { "type": "STRING" },
                    "subjectLine": { "type": "STRING" },
                    "emailBody": { "type": "STRING" },
                    "riskLevel": { "type": "STRING" },
                    "whyUseIt": { "type": "STRING" }
                } } }
            },
            "required": ["scripts"]
        }),
        AuditAction::Compare => comparison(),
    }
}

/// Auditor and psychometric profile merged into one call.
fn analysis() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "candidateName": { "type": "STRING" },
            "overallScore": { "type": "INTEGER" },
            "roastHeadline": { "type": "STRING" },
            "brutalTruth": { "type": "STRING" },
            "metrics": {
                "type": "OBJECT",
                "properties": {
                    "impact": { "type": "INTEGER" },
                    "brevity": { "type": "INTEGER" },
                    "technicalDepth": { "type": "INTEGER" },
                    "formatting": { "type": "INTEGER" }
                },
                "required": ["impact", "brevity", "technicalDepth", "formatting"]
            },
            "redFlags": { "type": "ARRAY", "items": { "type": "STRING" } },
            "greenFlags": { "type": "ARRAY", "items": { "type": "STRING" } },
            "fixes": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                "original": { "type": "STRING" },
                "improved": { "type": "STRING" },
                "reason": { "type": "STRING" }
            } } },
            "atsAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "matchScore": { "type": "INTEGER" },
                    "missingKeywords": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "matchingKeywords": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "nullable": true
            },
            "psychometricProfile": {
                "type": "OBJECT",
                "properties": {
                    "archetype": { "type": "STRING" },
                    "summary": { "type": "STRING" },
                    "traits": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                        "trait": { "type": "STRING" },
                        "score": { "type": "INTEGER" },
                        "explanation": { "type": "STRING" }
                    } } },
                    "cultureFit": { "type": "STRING" },
                    "frictionPoints": { "type": "ARRAY", "items": { "type": "STRING" } }
                }
            }
        },
        "required": ["candidateName", "overallScore", "metrics", "fixes", "psychometricProfile"]
    })
}

fn plan_90_days() -> Value {
    let phase = json!({
        "type": "OBJECT",
        "properties": {
            "focus": { "type": "STRING" },
            "goals": { "type": "ARRAY", "items": { "type": "STRING" } }
        }
    });
    json!({
        "type": "OBJECT",
        "properties": {
            "roleContext": { "type": "STRING" },
            "days30": phase,
            "days60": phase,
            "days90": phase
        },
        "required": ["days30", "days60", "days90"]
    })
}

/// Comparator and dream-team synergy merged into one call.
fn comparison() -> Value {
    let rank_item = json!({
        "type": "OBJECT",
        "properties": {
            "rank": { "type": "INTEGER" },
            "candidateName": { "type": "STRING" },
            "score": { "type": "INTEGER" },
            "reason": { "type": "STRING" }
        }
    });
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "leaderboard": { "type": "ARRAY", "items": rank_item },
            "categoryBreakdown": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                "category": { "type": "STRING" },
                "rankings": { "type": "ARRAY", "items": rank_item }
            } } },
            "dreamTeamAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "squadName": { "type": "STRING" },
                    "selectedMembers": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "synergyScore": { "type": "INTEGER" },
                    "rationale": { "type": "STRING" },
                    "roles": { "type": "ARRAY", "items": { "type": "OBJECT", "properties": {
                        "name": { "type": "STRING" },
                        "role": { "type": "STRING" },
                        "contribution": { "type": "STRING" }
                    } } },
                    "collectiveWeaknesses": { "type": "ARRAY", "items": { "type": "STRING" } }
                }
            }
        },
        "required": ["summary", "leaderboard", "dreamTeamAnalysis"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_an_object_schema_with_required_keys() {
        for action in AuditAction::ALL {
            let schema = schema_for(action);
            assert_eq!(schema["type"], "OBJECT", "{action:?}");
            let required = schema["required"].as_array().expect("required list");
            for key in required {
                let key = key.as_str().unwrap();
                assert!(
                    schema["properties"].get(key).is_some(),
                    "{action:?} requires undeclared key {key}"
                );
            }
        }
    }
}
