use crate::{UnlockError, Result};
use lopdf::Document;

// ── PdfValidator ──────────────────────────────────────────────────────────────
//
// Internal type. The codec runs it on every document it is about to rebuild.

pub(crate) struct PdfValidator<'a> {
    document: &'a Document,
}

impl<'a> PdfValidator<'a> {
    pub(crate) fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Asserts the elements a rebuild reads are present: a trailer, a catalog
    /// and a `/Pages` entry in that catalog.
    ///
    /// Only meaningful on readable documents. An encrypted file that lopdf
    /// could not open has no catalog yet.
    pub(crate) fn validate_structure(&self) -> Result<()> {
        if self.document.trailer.is_empty() {
            return Err(UnlockError::MalformedDocument(
                "missing trailer dictionary".into(),
            ));
        }

        let catalog = self.document.catalog().map_err(|e| {
            UnlockError::MalformedDocument(format!("missing or invalid catalog: {e}"))
        })?;

        if catalog.get(b"Pages").is_err() {
            return Err(UnlockError::MalformedDocument(
                "catalog has no /Pages entry".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object};

    #[test]
    fn empty_document_is_rejected() {
        let doc = Document::with_version("1.5");
        let err = PdfValidator::new(&doc).validate_structure().unwrap_err();
        assert!(matches!(err, UnlockError::MalformedDocument(_)));
    }

    #[test]
    fn catalog_without_pages_is_rejected() {
        let mut doc = Document::with_version("1.5");
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog" });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let err = PdfValidator::new(&doc).validate_structure().unwrap_err();
        assert!(err.to_string().contains("/Pages"));
    }

    #[test]
    fn minimal_document_passes() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![],
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        assert!(PdfValidator::new(&doc).validate_structure().is_ok());
    }
}
