//! Flavor profile table
//!
//! Every generation endpoint runs the same pipeline; a flavor only picks a
//! row of this table: prompt template, sampling parameters, attempt bound,
//! candidate shape, whether to enrich, and whether the single-flight guard
//! applies.
//!
//! Templates accept `{letter}`, `{tier}` and `{topic}` placeholders.

use crate::error::ConfigError;
use crate::types::{GenerationRequest, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const SINGLE_WORD_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Please provide a single English word.";
const QUESTION_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const QUESTION_FORMAT: &str = "Format it as: \"Word: [word], Options: [option1, option2, option3, option4], Correct Answer: [correctOption]\"";

/// Generation flavor exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavor {
    /// Bare word starting with a letter
    WordByLetter,
    /// Word starting with a letter, with definitions
    EnrichedWordByLetter,
    /// Quiz question for a tier
    Question(Tier),
    /// Vocabulary word for a topic, with definitions
    Topic,
}

impl Flavor {
    /// Every flavor, in table order
    pub const ALL: [Flavor; 6] = [
        Flavor::WordByLetter,
        Flavor::EnrichedWordByLetter,
        Flavor::Question(Tier::Easy),
        Flavor::Question(Tier::Medium),
        Flavor::Question(Tier::Hard),
        Flavor::Topic,
    ];

    /// Config key of the flavor
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Flavor::WordByLetter => "word",
            Flavor::EnrichedWordByLetter => "word_enriched",
            Flavor::Question(Tier::Easy) => "question_easy",
            Flavor::Question(Tier::Medium) => "question_medium",
            Flavor::Question(Tier::Hard) => "question_hard",
            Flavor::Topic => "topic",
        }
    }

    /// Whether the flavor accepts the request kind
    #[must_use]
    pub fn accepts(&self, request: &GenerationRequest) -> bool {
        match (self, request) {
            (
                Flavor::WordByLetter | Flavor::EnrichedWordByLetter,
                GenerationRequest::ByStartingLetter(_),
            )
            | (Flavor::Topic, GenerationRequest::ByTopic(_)) => true,
            (Flavor::Question(tier), GenerationRequest::ByTier(requested)) => tier == requested,
            _ => false,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Flavor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flavor::ALL
            .into_iter()
            .find(|flavor| flavor.key() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: format!("profiles.{s}"),
                reason: "unknown flavor".to_string(),
            })
    }
}

/// Shape the generator parses out of the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateShape {
    /// First token, alphabetic characters only
    SingleWord,
    /// `Word:` / `Options:` / `Correct Answer:` fields
    Question,
}

/// One row of the profile table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineProfile {
    /// System prompt
    pub system_prompt: String,
    /// User prompt template
    pub user_prompt: String,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling, if set
    pub top_p: Option<f32>,
    /// Attempt bound of the retry loop
    pub max_attempts: u32,
    /// Response shape
    pub shape: CandidateShape,
    /// Translate the definition during validation
    pub enrich: bool,
    /// Run under the single-flight guard
    pub guarded: bool,
}

impl PipelineProfile {
    fn single_word(user_prompt: &str, max_attempts: u32, enrich: bool) -> Self {
        Self {
            system_prompt: SINGLE_WORD_SYSTEM_PROMPT.to_string(),
            user_prompt: user_prompt.to_string(),
            max_output_tokens: 5,
            temperature: 0.7,
            top_p: None,
            max_attempts,
            shape: CandidateShape::SingleWord,
            enrich,
            guarded: false,
        }
    }

    fn question(tier: Tier) -> Self {
        let difficulty = match tier {
            Tier::Easy => "a common, everyday English word",
            Tier::Medium => "a moderately difficult English word",
            Tier::Hard => "a rare, advanced English word",
        };
        Self {
            system_prompt: QUESTION_SYSTEM_PROMPT.to_string(),
            user_prompt: format!(
                "Give me {difficulty} and four options where one of the options is a synonym of the word. {QUESTION_FORMAT}"
            ),
            max_output_tokens: 100,
            temperature: 0.7,
            top_p: None,
            max_attempts: 20,
            shape: CandidateShape::Question,
            enrich: false,
            guarded: true,
        }
    }

    /// Default row for a flavor
    #[must_use]
    pub fn default_for(flavor: Flavor) -> Self {
        match flavor {
            Flavor::WordByLetter => Self::single_word(
                "Give me a single English word that starts with the letter \"{letter}\".",
                3,
                false,
            ),
            Flavor::EnrichedWordByLetter => Self::single_word(
                "Give me a single English word that starts with the letter \"{letter}\".",
                3,
                true,
            ),
            Flavor::Question(tier) => Self::question(tier),
            Flavor::Topic => Self::single_word(
                "Give me a single English vocabulary word related to the topic \"{topic}\".",
                10,
                true,
            ),
        }
    }

    /// Render the user prompt for a request
    #[must_use]
    pub fn render_user_prompt(&self, request: &GenerationRequest) -> String {
        let mut prompt = self.user_prompt.clone();
        match request {
            GenerationRequest::ByStartingLetter(letter) => {
                prompt = prompt.replace("{letter}", &letter.to_string());
            }
            GenerationRequest::ByTier(tier) => {
                prompt = prompt.replace("{tier}", tier.as_str());
            }
            GenerationRequest::ByTopic(topic) => {
                prompt = prompt.replace("{topic}", topic.trim());
            }
        }
        prompt
    }

    /// Apply a partial override on top of this row
    pub fn apply(&mut self, overrides: &ProfileOverride) {
        if let Some(v) = &overrides.system_prompt {
            self.system_prompt.clone_from(v);
        }
        if let Some(v) = &overrides.user_prompt {
            self.user_prompt.clone_from(v);
        }
        if let Some(v) = overrides.max_output_tokens {
            self.max_output_tokens = v;
        }
        if let Some(v) = overrides.temperature {
            self.temperature = v;
        }
        if overrides.top_p.is_some() {
            self.top_p = overrides.top_p;
        }
        if let Some(v) = overrides.max_attempts {
            self.max_attempts = v;
        }
        if let Some(v) = overrides.enrich {
            self.enrich = v;
        }
        if let Some(v) = overrides.guarded {
            self.guarded = v;
        }
    }

    fn check(&self, flavor: Flavor) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            key: format!("profiles.{flavor}.{field}"),
            reason: reason.to_string(),
        };
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        if self.max_output_tokens == 0 {
            return Err(invalid("max_output_tokens", "must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature", "must be within 0.0..=2.0"));
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(invalid("top_p", "must be within 0.0..=1.0"));
            }
        }
        Ok(())
    }
}

/// Partial profile from configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverride {
    /// System prompt
    pub system_prompt: Option<String>,
    /// User prompt template
    pub user_prompt: Option<String>,
    /// Output token cap
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Nucleus sampling
    pub top_p: Option<f32>,
    /// Attempt bound
    pub max_attempts: Option<u32>,
    /// Translate the definition
    pub enrich: Option<bool>,
    /// Single-flight guard
    pub guarded: Option<bool>,
}

/// Effective profile per flavor
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    rows: BTreeMap<Flavor, PipelineProfile>,
}

impl ProfileTable {
    /// Table with the built-in defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Flavor::ALL
                .into_iter()
                .map(|flavor| (flavor, PipelineProfile::default_for(flavor)))
                .collect(),
        }
    }

    /// Defaults with keyed overrides applied
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` for an unknown flavor key or an
    ///   out-of-range field
    pub fn with_overrides(
        overrides: &BTreeMap<String, ProfileOverride>,
    ) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for (key, patch) in overrides {
            let flavor: Flavor = key.parse()?;
            table.row_mut(flavor).apply(patch);
        }
        for (flavor, row) in &table.rows {
            row.check(*flavor)?;
        }
        Ok(table)
    }

    /// Profile for a flavor
    #[must_use]
    pub fn get(&self, flavor: Flavor) -> &PipelineProfile {
        // Every flavor is inserted in `new`.
        &self.rows[&flavor]
    }

    /// Mutable profile for a flavor
    pub fn row_mut(&mut self, flavor: Flavor) -> &mut PipelineProfile {
        self.rows
            .entry(flavor)
            .or_insert_with(|| PipelineProfile::default_for(flavor))
    }

    /// Rows in flavor order
    pub fn iter(&self) -> impl Iterator<Item = (Flavor, &PipelineProfile)> {
        self.rows.iter().map(|(flavor, row)| (*flavor, row))
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::new()
    }
}
