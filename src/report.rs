use crate::PasswordKind;
use std::fmt;
use std::time::Duration;

// ── DecryptionOutcome ─────────────────────────────────────────────────────────

/// How the encryption check and the single decrypt attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionOutcome {
    /// The document had no password protection.
    NotEncrypted,
    /// The password matched the user password.
    UserPasswordAccepted,
    /// The password matched the owner password.
    OwnerPasswordAccepted,
    /// The password matched neither. Never part of a successful
    /// [`PipelineReport`]; the pipeline returns
    /// [`crate::UnlockError::IncorrectPassword`] instead.
    Rejected,
}

impl DecryptionOutcome {
    /// A short message suitable for showing to the person who uploaded the file.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::NotEncrypted => "This PDF is not password protected",
            Self::UserPasswordAccepted => "User password accepted (some restrictions may remain)",
            Self::OwnerPasswordAccepted => "Owner password accepted (complete unlock)",
            Self::Rejected => "Incorrect password",
        }
    }

    /// `true` for every variant except [`DecryptionOutcome::Rejected`].
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

impl From<PasswordKind> for DecryptionOutcome {
    fn from(kind: PasswordKind) -> Self {
        match kind {
            PasswordKind::User => Self::UserPasswordAccepted,
            PasswordKind::Owner => Self::OwnerPasswordAccepted,
        }
    }
}

impl fmt::Display for DecryptionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// ── PipelineReport ────────────────────────────────────────────────────────────

/// Diagnostics for one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub outcome: DecryptionOutcome,

    /// Number of pages in both the source and the rebuilt document.
    pub pages: usize,

    pub input_bytes: usize,
    pub output_bytes: usize,

    /// Wall time from the size check to the end of serialization.
    pub elapsed: Duration,

    /// Whether the `/Info` metadata made it into the output. Independent of
    /// `outcome`.
    pub metadata_copied: bool,
}

// ── SizeAssessment ────────────────────────────────────────────────────────────

/// Result of [`crate::UnlockConfig::assess_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAssessment {
    Normal,
    /// Accepted, but above the warning threshold.
    Large,
    /// Above the hard ceiling; the pipeline will refuse it.
    Oversized,
}
