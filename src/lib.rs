//! # unlockpdf
//!
//! A Rust library for removing the open password from a PDF document when the
//! password is known.
//!
//! ## What this crate does
//!
//! 1. **Check size** — refuses inputs above a configurable ceiling before any
//!    parsing work is done.
//! 2. **Detect encryption** — parses the bytes and decides whether the document
//!    is password protected at all.
//! 3. **Decrypt once** — tries the supplied password exactly once and tells a
//!    user password apart from an owner password.
//! 4. **Rebuild** — copies every page, in order, into a fresh document with no
//!    encryption dictionary and carries the document metadata over when it can.
//! 5. **Report** — returns the new bytes together with a [`PipelineReport`].
//!
//! ## Quick example
//!
//! ```no_run
//! use unlockpdf::UnlockPipeline;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("statement.pdf")?;
//! let unlocked = UnlockPipeline::new().run(&bytes, "secret123")?;
//!
//! println!("Outcome : {}", unlocked.report.outcome.describe());
//! println!("Pages   : {}", unlocked.report.pages);
//! unlocked.save_to_disk("statement - unlocked.pdf")?;
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod codec;
mod lopdf_codec;
mod pdf_utils;
mod pipeline;
mod report;
mod security;
mod unlocked;
mod validator;

pub use codec::{PasswordKind, PdfCodec};
pub use lopdf_codec::{LopdfCodec, RebuiltPdf};
pub use pipeline::UnlockPipeline;
pub use report::{DecryptionOutcome, PipelineReport, SizeAssessment};
pub use unlocked::{unlocked_file_name, UnlockedPdf};

// ── Configuration ────────────────────────────────────────────────────────────

/// One mebibyte, the unit the size thresholds are usually expressed in.
pub const MIB: usize = 1_048_576;

/// Runtime configuration for [`UnlockPipeline`].
#[derive(Debug, Clone)]
pub struct UnlockConfig {
    /// Inputs strictly larger than this many bytes are refused with
    /// [`UnlockError::OversizedInput`] before they are parsed.
    pub max_input_bytes: usize,

    /// Inputs larger than this are processed, but a warning is logged because
    /// they may be slow. `None` disables the warning.
    pub large_input_warning_bytes: Option<usize>,

    /// Copy the `/Info` dictionary (title, author, ...) into the rebuilt
    /// document. Failures are never fatal.
    pub copy_metadata: bool,

    /// Flate-compress the streams of the rebuilt document before writing it.
    pub compress_output: bool,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 150 * MIB,
            large_input_warning_bytes: Some(80 * MIB),
            copy_metadata: true,
            compress_output: false,
        }
    }
}

impl UnlockConfig {
    /// Set both size thresholds in MiB. Values too large to express in bytes
    /// saturate instead of wrapping.
    pub fn with_size_limits_mib(mut self, max_mib: usize, warn_mib: usize) -> Self {
        self.max_input_bytes = max_mib.saturating_mul(MIB);
        self.large_input_warning_bytes = Some(warn_mib.saturating_mul(MIB));
        self
    }

    /// Classify an input length against the configured thresholds.
    pub fn assess_size(&self, len: usize) -> SizeAssessment {
        if len > self.max_input_bytes {
            SizeAssessment::Oversized
        } else if self.large_input_warning_bytes.is_some_and(|warn| len > warn) {
            SizeAssessment::Large
        } else {
            SizeAssessment::Normal
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum UnlockError {
    /// A filesystem I/O error occurred while saving the result.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input bytes do not form a structurally valid PDF document.
    #[error("Malformed PDF: {0}")]
    MalformedDocument(String),

    /// The password was rejected. A caller may try again with another one.
    #[error("Incorrect password: the document could not be decrypted with the supplied password")]
    IncorrectPassword,

    /// The document is encrypted with a scheme the PDF codec cannot handle.
    /// This says nothing about whether the password was right.
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// The input is larger than [`UnlockConfig::max_input_bytes`].
    #[error("Input of {size} bytes exceeds the configured limit of {limit} bytes")]
    OversizedInput { size: usize, limit: usize },

    /// The document was decrypted but the unprotected copy could not be
    /// assembled or written.
    #[error("Failed to write the unlocked PDF: {0}")]
    SerializationFailure(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, UnlockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_assessment_uses_strict_bounds() {
        let cfg = UnlockConfig {
            max_input_bytes: 100,
            large_input_warning_bytes: Some(50),
            ..Default::default()
        };
        assert_eq!(cfg.assess_size(50), SizeAssessment::Normal);
        assert_eq!(cfg.assess_size(51), SizeAssessment::Large);
        assert_eq!(cfg.assess_size(100), SizeAssessment::Large);
        assert_eq!(cfg.assess_size(101), SizeAssessment::Oversized);
    }

    #[test]
    fn size_limits_in_mib_saturate() {
        let cfg = UnlockConfig::default().with_size_limits_mib(usize::MAX, 2);
        assert_eq!(cfg.max_input_bytes, usize::MAX);
        assert_eq!(cfg.large_input_warning_bytes, Some(2 * MIB));
        assert_eq!(cfg.assess_size(usize::MAX), SizeAssessment::Large);
    }

    #[test]
    fn warning_can_be_disabled() {
        let cfg = UnlockConfig {
            large_input_warning_bytes: None,
            ..Default::default()
        };
        assert_eq!(cfg.assess_size(cfg.max_input_bytes), SizeAssessment::Normal);
    }
}
