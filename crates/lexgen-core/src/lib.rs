//! lexgen Core - vocabulary content pipeline
//!
//! Produces words and quiz questions that are:
//! - Generated by a text source from a flavor profile
//! - Confirmed by an authoritative dictionary
//! - Optionally enriched with a translated definition
//! - Unique within a bounded, process-wide history
//!
//! # Example
//!
//! ```rust,ignore
//! use lexgen_core::{LexgenConfig, LexiconService, Tier};
//!
//! # async fn example(
//! #     source: std::sync::Arc<dyn lexgen_core::GenerativeSource>,
//! #     dictionary: std::sync::Arc<dyn lexgen_core::DictionaryLookup>,
//! #     translator: std::sync::Arc<dyn lexgen_core::Translator>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = LexgenConfig::load(None)?;
//! let service = LexiconService::new(
//!     &config.pipeline,
//!     config.profile_table()?,
//!     source,
//!     dictionary,
//!     translator,
//! );
//!
//! let item = service.generate_question(Tier::Easy).await?;
//! println!("{} -> {:?}", item.word, item.correct_answer);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod profile;
pub mod retry;
pub mod service;
pub mod single_flight;
pub mod types;
pub mod validator;

// Re-exports for convenience
pub use config::{DictionaryConfig, LexgenConfig, OpenAiConfig, PipelineConfig, TranslationConfig};
pub use error::{AttemptFailure, ConfigError, ParseError, PipelineError, ServiceError};
pub use generator::{
    parse_question, parse_single_word, CandidateGenerator, CompletionRequest, GenerativeSource,
};
pub use history::{
    HistoryStats, HistoryStore, OverflowPolicy, RecordOutcome, DEFAULT_HISTORY_CAPACITY,
};
pub use profile::{CandidateShape, Flavor, PipelineProfile, ProfileOverride, ProfileTable};
pub use retry::{AttemptLog, RetryController};
pub use service::{LexiconService, ServiceStats};
pub use single_flight::{SingleFlight, SingleFlightPermit, SingleFlightStats};
pub use types::{
    normalize_word, Candidate, GeneratedItem, GenerationRequest, Rejection, RequestId, Tier,
    Translation, UnknownTier, ValidationResult,
};
pub use validator::{DictionaryEntry, DictionaryLookup, Translator, Validator};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with lexgen Core
    pub use crate::{
        DictionaryLookup, Flavor, GeneratedItem, GenerativeSource, LexgenConfig, LexiconService,
        PipelineError, Tier, Translator, ValidationResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
