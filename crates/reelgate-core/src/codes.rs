//! Machine codes carried in every `GateOutcome` detail under `code`.

// Runner
pub const SKIPPED_AFTER_CRITICAL: &str = "SKIPPED_AFTER_CRITICAL";
pub const GATE_EXECUTION_ERROR: &str = "GATE_EXECUTION_ERROR";
pub const UNSUPPORTED_ARTIFACT: &str = "UNSUPPORTED_ARTIFACT";

// Schema
pub const SCHEMA_OK: &str = "SCHEMA_OK";
pub const SCHEMA_INVALID: &str = "SCHEMA_INVALID";

// Word bounds
pub const WORD_COUNT_OK: &str = "WORD_COUNT_OK";
pub const WORD_COUNT_TOO_LOW: &str = "WORD_COUNT_TOO_LOW";
pub const WORD_COUNT_TOO_HIGH: &str = "WORD_COUNT_TOO_HIGH";

// Forbidden terms
pub const FORBIDDEN_TERMS_NONE: &str = "FORBIDDEN_TERMS_NONE";
pub const FORBIDDEN_TERMS_FOUND: &str = "FORBIDDEN_TERMS_FOUND";

// Language
pub const LANGUAGE_OK: &str = "LANGUAGE_OK";
pub const LANGUAGE_MISMATCH: &str = "LANGUAGE_MISMATCH";
pub const LANGUAGE_EMPTY: &str = "LANGUAGE_EMPTY";

// Completeness
pub const SCRIPT_COMPLETE: &str = "SCRIPT_COMPLETE";
pub const SCRIPT_NO_TERMINAL_PUNCTUATION: &str = "SCRIPT_NO_TERMINAL_PUNCTUATION";
pub const SCRIPT_DANGLING_ENDING: &str = "SCRIPT_DANGLING_ENDING";
pub const SCRIPT_TOO_FEW_SENTENCES: &str = "SCRIPT_TOO_FEW_SENTENCES";

// Duplicates
pub const DUPLICATE_NONE: &str = "DUPLICATE_NONE";
pub const DUPLICATE_FOUND: &str = "DUPLICATE_FOUND";
pub const DUPLICATE_ALLOWED: &str = "DUPLICATE_ALLOWED";

// Audio format
pub const AUDIO_FORMAT_OK: &str = "AUDIO_FORMAT_OK";
pub const AUDIO_FILE_MISSING: &str = "AUDIO_FILE_MISSING";
pub const AUDIO_SAMPLE_RATE_LOW: &str = "AUDIO_SAMPLE_RATE_LOW";
pub const AUDIO_CHANNELS_INVALID: &str = "AUDIO_CHANNELS_INVALID";
pub const AUDIO_DURATION_INVALID: &str = "AUDIO_DURATION_INVALID";
pub const AUDIO_DECODE_FAILED: &str = "AUDIO_DECODE_FAILED";

// Duration consistency
pub const DURATION_CONSISTENT: &str = "DURATION_CONSISTENT";
pub const DURATION_TOO_SLOW: &str = "DURATION_TOO_SLOW";
pub const DURATION_TOO_FAST: &str = "DURATION_TOO_FAST";
pub const DURATION_WORD_COUNT_MISSING: &str = "DURATION_WORD_COUNT_MISSING";

// Silence
pub const SILENCE_OK: &str = "SILENCE_OK";
pub const SILENCE_LEADING_EXCESSIVE: &str = "SILENCE_LEADING_EXCESSIVE";
pub const SILENCE_TRAILING_EXCESSIVE: &str = "SILENCE_TRAILING_EXCESSIVE";
pub const SILENCE_PROPORTION_EXCESSIVE: &str = "SILENCE_PROPORTION_EXCESSIVE";

// Loudness
pub const LOUDNESS_OK: &str = "LOUDNESS_OK";
pub const LOUDNESS_TOO_QUIET: &str = "LOUDNESS_TOO_QUIET";
pub const LOUDNESS_TOO_LOUD: &str = "LOUDNESS_TOO_LOUD";

// Shared
pub const DECODER_UNAVAILABLE: &str = "DECODER_UNAVAILABLE";
