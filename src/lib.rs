//! # scry-testenv
//!
//! Test environment plumbing for the Scry API.
//!
//! The crate answers one question well: *which database should this test run
//! talk to?* Candidate variables are read in priority order from an explicit
//! [`env::Environment`] snapshot, and under CI the winning URL is standardized
//! to the credentials, host, database and options the CI Postgres service
//! expects.
//!
//! ## Modules
//!
//! - [`dsn`]: database URL resolution and CI standardization.
//! - [`mask`]: credential masking for diagnostic output.
//! - [`redact`]: pattern-based redaction of free text (SQL, tokens, paths).
//! - [`ci`]: CI provider detection and run metadata.
//! - [`project`]: project root and migrations directory discovery.
//! - [`logging`]: `tracing` subscriber setup and in-memory log capture.
//! - [`db`]: readiness checks, pools, migrations and isolated transactions.
//!
//! Nothing in the resolver touches the process environment; writing the
//! standardized URL back into real variables is an explicit, separate step.

pub mod ci;
pub mod cli;
pub mod db;
pub mod dsn;
pub mod env;
pub mod logging;
pub mod mask;
pub mod project;
pub mod redact;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
