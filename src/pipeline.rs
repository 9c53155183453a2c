use crate::{
    DecryptionOutcome, LopdfCodec, PdfCodec, PipelineReport, Result, SizeAssessment,
    UnlockConfig, UnlockError, UnlockedPdf,
};
use log::{debug, info, warn};
use std::time::Instant;

// ── UnlockPipeline ────────────────────────────────────────────────────────────

/// Entry point: turns a password-protected PDF into an unprotected copy.
///
/// A pipeline holds only immutable configuration, so one instance can serve
/// any number of calls, including concurrent ones.
///
/// # Creating a pipeline
///
/// ```no_run
/// use unlockpdf::{LopdfCodec, UnlockConfig, UnlockPipeline, MIB};
///
/// // Defaults: 150 MiB ceiling, metadata copied, no compression
/// let p = UnlockPipeline::new();
///
/// // With custom configuration
/// let cfg = UnlockConfig {
///     max_input_bytes: 20 * MIB,
///     compress_output: true,
///     ..Default::default()
/// };
/// let p = UnlockPipeline::with_config(cfg);
///
/// // With an explicit codec
/// let p = UnlockPipeline::with_codec(LopdfCodec::new(), UnlockConfig::default());
/// ```
#[derive(Debug, Clone)]
pub struct UnlockPipeline<C: PdfCodec = LopdfCodec> {
    codec: C,
    config: UnlockConfig,
}

impl UnlockPipeline<LopdfCodec> {
    pub fn new() -> Self {
        Self::with_config(UnlockConfig::default())
    }

    /// lopdf-backed pipeline; [`UnlockConfig::compress_output`] is handed to
    /// the codec.
    pub fn with_config(config: UnlockConfig) -> Self {
        Self {
            codec: LopdfCodec::with_compression(config.compress_output),
            config,
        }
    }
}

impl Default for UnlockPipeline<LopdfCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: PdfCodec> UnlockPipeline<C> {
    pub fn with_codec(codec: C, config: UnlockConfig) -> Self {
        Self { codec, config }
    }

    pub fn config(&self) -> &UnlockConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Remove password protection from `bytes`.
    ///
    /// The password is tried exactly once. An unencrypted document is rebuilt
    /// as-is and the password is ignored. An empty password never unlocks an
    /// encrypted document.
    ///
    /// # Errors
    ///
    /// - [`UnlockError::OversizedInput`] before anything is parsed
    /// - [`UnlockError::MalformedDocument`] when the bytes are not a PDF
    /// - [`UnlockError::IncorrectPassword`] when the password is rejected
    /// - [`UnlockError::UnsupportedEncryption`] when the encryption scheme
    ///   cannot be handled, regardless of the password
    /// - [`UnlockError::SerializationFailure`] when the copy cannot be written
    ///
    /// A failure to copy metadata is not an error; it shows up as
    /// [`PipelineReport::metadata_copied`] being `false`.
    pub fn run(&self, bytes: &[u8], password: &str) -> Result<UnlockedPdf> {
        let started = Instant::now();

        match self.config.assess_size(bytes.len()) {
            SizeAssessment::Oversized => {
                return Err(UnlockError::OversizedInput {
                    size: bytes.len(),
                    limit: self.config.max_input_bytes,
                });
            }
            SizeAssessment::Large => warn!(
                "large input ({} bytes), processing may be slow",
                bytes.len()
            ),
            SizeAssessment::Normal => {}
        }

        let mut source = self.codec.load(bytes)?;

        let outcome = if self.codec.is_encrypted(&source) {
            self.decrypt(&mut source, bytes, password)?
        } else {
            debug!("document is not encrypted, password ignored");
            DecryptionOutcome::NotEncrypted
        };

        let pages = self.codec.pages(&source);
        let mut builder = self.codec.new_builder(&source);
        for &page in &pages {
            self.codec.add_page(&mut builder, &source, page)?;
        }

        let metadata_copied = self.config.copy_metadata
            && match self.codec.copy_metadata(&mut builder, &source) {
                Ok(()) => true,
                Err(e) => {
                    warn!("continuing without metadata: {e}");
                    false
                }
            };

        let data = self.codec.serialize(builder)?;

        let report = PipelineReport {
            outcome,
            pages: pages.len(),
            input_bytes: bytes.len(),
            output_bytes: data.len(),
            elapsed: started.elapsed(),
            metadata_copied,
        };
        info!(
            "unlocked {} page(s), {} -> {} bytes in {:?}: {}",
            report.pages, report.input_bytes, report.output_bytes, report.elapsed, report.outcome
        );

        Ok(UnlockedPdf { data, report })
    }

    fn decrypt(&self, source: &mut C::Document, bytes: &[u8], password: &str) -> Result<DecryptionOutcome> {
        if password.is_empty() {
            debug!("empty password on an encrypted document, not attempting decryption");
            return Err(UnlockError::IncorrectPassword);
        }

        match self.codec.decrypt(source, bytes, password) {
            Ok(kind) => Ok(kind.into()),
            Err(e) => {
                match &e {
                    UnlockError::IncorrectPassword => info!("password rejected"),
                    UnlockError::UnsupportedEncryption(reason) => {
                        warn!("cannot decrypt this document: {reason}")
                    }
                    _ => {}
                }
                Err(e)
            }
        }
    }
}
