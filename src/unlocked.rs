use crate::PipelineReport;
use std::path::Path;

// ── UnlockedPdf ───────────────────────────────────────────────────────────────

/// The unprotected copy of a document.
///
/// Returned by [`crate::UnlockPipeline::run`].
#[derive(Debug, Clone)]
pub struct UnlockedPdf {
    /// The serialized PDF. Opens without a password.
    pub data: Vec<u8>,

    /// What happened while producing `data`.
    pub report: PipelineReport,
}

impl UnlockedPdf {
    /// Write the document to `path`, creating parent directories if necessary.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use unlockpdf::UnlockPipeline;
    ///
    /// let bytes = std::fs::read("locked.pdf").unwrap();
    /// let unlocked = UnlockPipeline::new().run(&bytes, "secret123").unwrap();
    /// unlocked.save_to_disk("./out/locked - unlocked.pdf").unwrap();
    /// ```
    pub fn save_to_disk<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, &self.data)
    }

    /// Size of the serialized document in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Derive the download name for an unlocked copy: `"a.pdf"` becomes
/// `"a - unlocked.pdf"`.
///
/// ```
/// # use unlockpdf::unlocked_file_name;
/// assert_eq!(unlocked_file_name("invoice.pdf"), "invoice - unlocked.pdf");
/// assert_eq!(unlocked_file_name("scan"), "scan - unlocked");
/// ```
pub fn unlocked_file_name(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original);

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem} - unlocked.{ext}"),
        None => format!("{stem} - unlocked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_extension_case() {
        assert_eq!(unlocked_file_name("Scan.PDF"), "Scan - unlocked.PDF");
    }

    #[test]
    fn only_last_extension_is_split_off() {
        assert_eq!(
            unlocked_file_name("archive.v2.pdf"),
            "archive.v2 - unlocked.pdf"
        );
    }

    #[test]
    fn directories_are_dropped() {
        assert_eq!(
            unlocked_file_name("uploads/report.pdf"),
            "report - unlocked.pdf"
        );
    }
}
