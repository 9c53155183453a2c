use crate::Result;

// ── PasswordKind ──────────────────────────────────────────────────────────────

/// Which of the two standard passwords a successful decrypt matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordKind {
    /// The user ("open") password. Permission restrictions still apply to the
    /// original file.
    User,
    /// The owner password. All restrictions are lifted.
    Owner,
}

// ── PdfCodec ──────────────────────────────────────────────────────────────────

/// The PDF operations [`crate::UnlockPipeline`] needs, and nothing more.
///
/// The crate ships [`crate::LopdfCodec`]; tests and callers with a different
/// PDF backend can supply their own implementation.
///
/// Implementations report failures with the crate's error variants:
///
/// | method | expected failures |
/// |---|---|
/// | `load` | `MalformedDocument` |
/// | `decrypt` | `IncorrectPassword`, `UnsupportedEncryption`, `MalformedDocument` |
/// | `add_page`, `serialize` | `SerializationFailure` |
/// | `copy_metadata` | anything; the pipeline treats it as non-fatal |
pub trait PdfCodec {
    /// A parsed source document.
    type Document;
    /// A handle to one page of a source document.
    type Page: Copy;
    /// A new, unencrypted document being assembled.
    type Builder;

    /// Parse raw bytes.
    fn load(&self, bytes: &[u8]) -> Result<Self::Document>;

    /// Whether the parsed document is protected by an encryption dictionary.
    fn is_encrypted(&self, document: &Self::Document) -> bool;

    /// Try `password` once. On success `document` is replaced by its
    /// decrypted form. `bytes` are the same bytes `document` was loaded from.
    fn decrypt(
        &self,
        document: &mut Self::Document,
        bytes: &[u8],
        password: &str,
    ) -> Result<PasswordKind>;

    /// Pages of `document` in reading order.
    fn pages(&self, document: &Self::Document) -> Vec<Self::Page>;

    /// Start an empty document that pages of `source` can be added to.
    fn new_builder(&self, source: &Self::Document) -> Self::Builder;

    /// Append one page of `source` to `builder`.
    fn add_page(
        &self,
        builder: &mut Self::Builder,
        source: &Self::Document,
        page: Self::Page,
    ) -> Result<()>;

    /// Copy document-level metadata (title, author, ...) from `source`.
    fn copy_metadata(&self, builder: &mut Self::Builder, source: &Self::Document) -> Result<()>;

    /// Finish the document and encode it.
    fn serialize(&self, builder: Self::Builder) -> Result<Vec<u8>>;
}
