//! Repair Cascade: turns untrusted model text into a typed result, or a typed failure.
//!
//! Flow: sanitize → parse → unquoted values → parse → bracket balancing → parse →
//!       missing commas → parse → newline escape → parse → field salvage → error.
//!
//! Each repair runs once, in this order, on the cumulative output of the ones before it.
//! The order matters: balancing assumes bare values are already quoted, and comma
//! insertion assumes the structure is closed. Best effort only: a repaired document
//! may differ from what the model meant.
//!
//! The first stage that yields valid JSON ends the cascade. That document is then
//! fitted to the result shape leniently (see [`lenient::conform`]), so a stray null or
//! a quoted score never sends good output to salvage.

pub mod lenient;
pub mod salvage;
pub mod sanitize;
pub mod strategies;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::llm_client::truncate_chars;

pub use sanitize::sanitize;

/// A result shape the cascade can produce.
pub trait ModelOutput: DeserializeOwned {
    /// Builds a minimal, explicitly labeled placeholder from anchor fields in the raw
    /// text. `None` when the shape has no anchors or none were found.
    fn salvage(_raw: &str) -> Option<Value> {
        None
    }
}

impl ModelOutput for Value {}

/// Which step produced the parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStage {
    Clean,
    UnquotedValues,
    BalancedBrackets,
    MissingCommas,
    EscapedNewlines,
    Salvaged,
}

#[derive(Debug, Clone)]
pub struct Recovered<T> {
    pub value: T,
    pub stage: RepairStage,
}

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("model output could not be parsed or repaired")]
    Unrecoverable,
}

type Repair = fn(&str) -> String;

const REPAIRS: [(RepairStage, Repair); 4] = [
    (RepairStage::UnquotedValues, strategies::quote_bare_values),
    (RepairStage::BalancedBrackets, strategies::balance_brackets),
    (RepairStage::MissingCommas, strategies::insert_missing_commas),
    (RepairStage::EscapedNewlines, strategies::escape_newlines_in_strings),
];

/// Runs the full pipeline. Never panics; every input ends in a value or `RepairError`.
pub fn recover<T: ModelOutput>(raw: &str) -> Result<Recovered<T>, RepairError> {
    let sanitized = sanitize(raw);

    let parsed = match try_parse(&sanitized) {
        Some(doc) => Some((doc, RepairStage::Clean)),
        None => {
            warn!("Initial JSON parse failed. Attempting repairs...");
            repair_until_parsed(sanitized)
        }
    };

    match parsed {
        Some((doc, stage)) => {
            if let Some(value) = lenient::conform::<T>(doc) {
                if stage != RepairStage::Clean {
                    info!("Model output recovered by {stage:?} repair");
                }
                return Ok(Recovered { value, stage });
            }
            warn!("Parsed model output is not an object of the expected shape");
        }
        None => error!(
            "All JSON repair attempts failed. Raw output: {}",
            truncate_chars(raw, 500)
        ),
    }

    match T::salvage(raw).and_then(lenient::conform::<T>) {
        Some(value) => {
            warn!("Returning partial data salvaged from known fields");
            Ok(Recovered {
                value,
                stage: RepairStage::Salvaged,
            })
        }
        None => Err(RepairError::Unrecoverable),
    }
}

fn repair_until_parsed(mut candidate: String) -> Option<(Value, RepairStage)> {
    for (stage, repair) in REPAIRS {
        candidate = repair(&candidate);
        if let Some(doc) = try_parse(&candidate) {
            return Some((doc, stage));
        }
        debug!("{stage:?} repair did not produce parseable output");
    }
    None
}

fn try_parse(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}
