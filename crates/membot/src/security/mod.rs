//! Input validation for user messages and uploads
//!
//! The checks here are intentionally shallow: a length limit, an emptiness
//! check and a case-insensitive substring denylist. No HTML parsing or
//! normalization beyond lowercasing is performed.

use thiserror::Error;

use crate::config::SecurityConfig;

/// Substrings rejected anywhere in user input (matched case-insensitively)
pub const DANGEROUS_PATTERNS: &[&str] = &[
    "script",
    "javascript:",
    "data:",
    "vbscript:",
    "<script",
    "</script>",
    "onload=",
    "onerror=",
];

/// Human-readable list of the checks this validator performs
pub const SECURITY_FEATURES: &[&str] = &[
    "Input length validation",
    "Content sanitization",
    "Dangerous pattern detection",
    "Memory size limits",
];

/// Reasons an input can be rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input is longer than the configured limit
    #[error("Input too long: {len} characters (maximum {max})")]
    TooLong { len: usize, max: usize },

    /// Input is empty or whitespace only
    #[error("Input is empty")]
    Empty,

    /// Input contains a denylisted substring
    #[error("Dangerous pattern detected: {0}")]
    DangerousPattern(&'static str),
}

/// Stateless validator built from [`SecurityConfig`]
#[derive(Debug, Clone)]
pub struct InputValidator {
    max_input_length: usize,
    allowed_file_types: Vec<String>,
    max_file_size_mb: u64,
}

impl InputValidator {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            max_input_length: config.max_input_length,
            allowed_file_types: config
                .allowed_file_types
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            max_file_size_mb: config.max_file_size_mb,
        }
    }

    pub fn max_input_length(&self) -> usize {
        self.max_input_length
    }

    /// Returns true if `input` passes every check
    pub fn validate(&self, input: &str) -> bool {
        match self.check(input) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Input rejected: {e}");
                false
            }
        }
    }

    /// Run every check and report the first one that fails
    pub fn check(&self, input: &str) -> Result<(), ValidationError> {
        let len = input.chars().count();
        if len > self.max_input_length {
            return Err(ValidationError::TooLong {
                len,
                max: self.max_input_length,
            });
        }

        if input.trim().is_empty() {
            return Err(ValidationError::Empty);
        }

        let lowered = input.to_lowercase();
        if let Some(pattern) = DANGEROUS_PATTERNS.iter().find(|p| lowered.contains(*p)) {
            return Err(ValidationError::DangerousPattern(pattern));
        }

        Ok(())
    }

    /// Length-only check, shared with the memory store
    pub fn validate_input_length(&self, text: &str) -> bool {
        text.chars().count() <= self.max_input_length
    }

    /// Accepts a filename whose last extension is in the allowlist
    pub fn validate_file_type(&self, filename: &str) -> bool {
        let extension = filename.rsplit('.').next().unwrap_or_default().to_lowercase();
        self.allowed_file_types.contains(&extension)
    }

    pub fn validate_file_size(&self, size_bytes: u64) -> bool {
        size_bytes <= self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(&SecurityConfig::default())
    }
}
