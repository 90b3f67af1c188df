//! Pipeline roles and the rules for choosing a model and token budget per role.

pub mod resolver;
pub mod tokens;

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

pub use resolver::{ModelResolver, matches_model_pattern, supports_system_role};
pub use tokens::TokenPolicy;

/// A named pipeline stage.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Refiner,
    DebaterA,
    DebaterB,
    DebaterC,
    Summarizer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Refiner,
        Role::DebaterA,
        Role::DebaterB,
        Role::DebaterC,
        Role::Summarizer,
    ];

    /// Parse a role name received at the service boundary.
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        Self::from_str(name.trim()).map_err(|_| ValidationError::UnknownRole(name.to_string()))
    }

    /// Static default model, used when neither the request nor config names one.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Refiner | Self::Summarizer => "openai/gpt-4o-mini",
            Self::DebaterA => "anthropic/claude-3.5-haiku",
            Self::DebaterB => "google/gemini-2.0-flash-001",
            Self::DebaterC => "deepseek/deepseek-chat",
        }
    }

    pub fn default_max_tokens(self) -> u32 {
        match self {
            Self::Refiner => 800,
            Self::DebaterA | Self::DebaterB | Self::DebaterC => 1_200,
            Self::Summarizer => 1_600,
        }
    }

    /// Suffix used by `ROUNDTABLE_MODEL_<ROLE>` / `ROUNDTABLE_MAX_TOKENS_<ROLE>`.
    pub fn env_suffix(self) -> &'static str {
        match self {
            Self::Refiner => "REFINER",
            Self::DebaterA => "DEBATER_A",
            Self::DebaterB => "DEBATER_B",
            Self::DebaterC => "DEBATER_C",
            Self::Summarizer => "SUMMARIZER",
        }
    }
}
