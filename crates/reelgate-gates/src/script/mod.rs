//! Built-in script gates.

pub mod completeness;
pub mod duplicates;
pub mod forbidden_terms;
pub mod language;
pub mod schema;
pub mod word_bounds;

pub use completeness::CompletenessGate;
pub use duplicates::DuplicatesGate;
pub use forbidden_terms::ForbiddenTermsGate;
pub use language::LanguageGate;
pub use schema::SchemaGate;
pub use word_bounds::WordBoundsGate;
