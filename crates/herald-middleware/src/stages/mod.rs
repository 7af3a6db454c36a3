//! The core pipeline stages.
//!
//! Outermost first:
//!
//! 1. [`error_translation`] - Catch faults and panics, write the envelope
//! 2. [`request_tagging`] - Correlation identity, log target, request span
//! 3. [`auth_outcome`] - Rewrite empty 401/403 responses into envelopes

pub mod auth_outcome;
pub mod error_translation;
pub mod request_tagging;

pub use auth_outcome::AuthOutcomeRewriteStage;
pub use error_translation::{
    EnvelopeEncoder, ErrorTranslationStage, JsonEnvelopeEncoder, TranslatedFault,
};
pub use request_tagging::RequestTaggingStage;
