//! Shared types and constants for the Capitol Call IVR service.
//!
//! This crate provides the foundational types used across all Capitol Call
//! crates: the telephony call lifecycle status, the configured language
//! entry, and the record types returned by the congressional data APIs
//! (legislators, bills, votes, contributors, election offices).
//!
//! No crate in the workspace depends on anything *except* `capitolcall-types`
//! for cross-cutting type definitions. This keeps the dependency graph clean
//! and prevents circular dependencies.

mod records;
mod status;

pub use records::{
    bill_type_name, Bill, Contributor, ElectionOffice, Legislator, UpcomingBill, Vote,
};
pub use status::CallStatus;

use serde::{Deserialize, Serialize};

/// One entry in the configured language list.
///
/// The language gate offers each configured language by 1-based index; the
/// `prompt` line is spoken in the language itself so callers can recognize
/// their own entry (e.g. "Presione 2 para continuar en espanol."). The
/// `{digit}` placeholder is substituted with the assigned index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Locale code stored in the call context (e.g. "en", "es").
    pub code: String,
    /// Human-readable name, used in logs and admin surfaces.
    pub label: String,
    /// Selection prompt template containing a `{digit}` placeholder.
    pub prompt: String,
}

impl Language {
    /// Renders the selection prompt for the given 1-based menu digit.
    pub fn selection_prompt(&self, digit: usize) -> String {
        self.prompt.replace("{digit}", &digit.to_string())
    }
}

/// The fallback locale when a call has not selected a language yet.
pub const DEFAULT_LANGUAGE: &str = "en";
