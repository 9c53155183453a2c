use crate::pdf_utils::{self, INHERITABLE_PAGE_KEYS};
use crate::security::{self, lopdf_error};
use crate::validator::PdfValidator;
use crate::{PasswordKind, PdfCodec, Result, UnlockError};
use log::{debug, warn};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

// ── LopdfCodec ────────────────────────────────────────────────────────────────

/// [`PdfCodec`] backed by the `lopdf` crate.
///
/// Object decryption is lopdf's. Owner passwords are resolved to the key lopdf
/// needs in the crate's security helpers first.
#[derive(Debug, Clone, Default)]
pub struct LopdfCodec {
    /// Flate-compress streams in [`PdfCodec::serialize`].
    pub compress: bool,
}

impl LopdfCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(compress: bool) -> Self {
        Self { compress }
    }
}

impl PdfCodec for LopdfCodec {
    type Document = Document;
    type Page = ObjectId;
    type Builder = RebuiltPdf;

    fn load(&self, bytes: &[u8]) -> Result<Document> {
        let document = Document::load_mem(bytes)
            .map_err(|e| UnlockError::MalformedDocument(e.to_string()))?;

        // An encrypted file that needs a password has no readable catalog
        // until it is decrypted; it is validated after `decrypt` instead.
        if !document.is_encrypted() {
            PdfValidator::new(&document).validate_structure()?;
        }

        Ok(document)
    }

    /// lopdf opens a file whose user password is empty on its own and drops
    /// `/Encrypt` from the trailer, leaving `encryption_state` set. Both forms
    /// count as encrypted.
    fn is_encrypted(&self, document: &Document) -> bool {
        document.is_encrypted() || document.encryption_state.is_some()
    }

    fn decrypt(&self, document: &mut Document, bytes: &[u8], password: &str) -> Result<PasswordKind> {
        if let Ok(value) = document.trailer.get(b"Encrypt") {
            let encrypt_dict = pdf_utils::resolve_dict(document, value)
                .cloned()
                .ok_or_else(|| UnlockError::MalformedDocument("/Encrypt is not a dictionary".into()))?;
            check_security_handler(&encrypt_dict)?;

            let credentials = security::authenticate_locked(document, &encrypt_dict, password)?;
            debug!("password authenticated as {:?}", credentials.kind);

            let decrypted =
                Document::load_mem_with_password(bytes, &credentials.user_password).map_err(lopdf_error)?;
            PdfValidator::new(&decrypted).validate_structure()?;
            *document = decrypted;
            return Ok(credentials.kind);
        }

        // Opened by lopdf with the empty user password; only the password
        // still needs checking.
        let state = document.encryption_state.as_ref().ok_or_else(|| {
            UnlockError::MalformedDocument("encryption dictionary not found".into())
        })?;
        let kind = security::authenticate_opened(document, state, password)?;
        debug!("password authenticated as {kind:?} on a document opened without one");
        Ok(kind)
    }

    fn pages(&self, document: &Document) -> Vec<ObjectId> {
        // BTreeMap keyed by page number, so values come out in reading order.
        document.get_pages().into_values().collect()
    }

    fn new_builder(&self, source: &Document) -> RebuiltPdf {
        RebuiltPdf::new(source, &self.pages(source))
    }

    fn add_page(&self, builder: &mut RebuiltPdf, source: &Document, page: ObjectId) -> Result<()> {
        builder.add_page(source, page)
    }

    fn copy_metadata(&self, builder: &mut RebuiltPdf, source: &Document) -> Result<()> {
        builder.copy_info(source)
    }

    fn serialize(&self, builder: RebuiltPdf) -> Result<Vec<u8>> {
        builder.finish(self.compress)
    }
}

// ── Security handler ──────────────────────────────────────────────────────────

fn check_security_handler(encrypt_dict: &Dictionary) -> Result<()> {
    match pdf_utils::name_from_dict(encrypt_dict, b"Filter").as_deref() {
        Some("Standard") => Ok(()),
        Some(other) => Err(UnlockError::UnsupportedEncryption(format!(
            "security handler /{other} is not supported, only password-based /Standard encryption is"
        ))),
        None => Err(UnlockError::MalformedDocument(
            "encryption dictionary has no /Filter".into(),
        )),
    }
}

// ── RebuiltPdf ────────────────────────────────────────────────────────────────

/// A fresh lopdf document that source pages are copied into.
///
/// Object ids for every source page are reserved up front so that links
/// between pages (annotation `/P` entries, `/Dest` arrays) resolve to the new
/// pages instead of dragging the old page tree along.
pub struct RebuiltPdf {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    /// Source id → id in `document`.
    copied: BTreeMap<ObjectId, ObjectId>,
    /// Source page id → reserved id, removed once the page is added.
    pending_pages: BTreeMap<ObjectId, ObjectId>,
}

impl RebuiltPdf {
    fn new(source: &Document, pages: &[ObjectId]) -> Self {
        let mut document = Document::with_version(source.version.clone());
        let pages_id = document.new_object_id();

        let mut copied = BTreeMap::new();
        let mut pending_pages = BTreeMap::new();
        for &page_id in pages {
            let new_id = document.new_object_id();
            copied.insert(page_id, new_id);
            pending_pages.insert(page_id, new_id);
        }

        Self {
            document,
            pages_id,
            kids: Vec::with_capacity(pages.len()),
            copied,
            pending_pages,
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    fn add_page(&mut self, source: &Document, page_id: ObjectId) -> Result<()> {
        let new_id = self.pending_pages.remove(&page_id).ok_or_else(|| {
            UnlockError::SerializationFailure(format!(
                "page {} {} is not a page of the source document or was already added",
                page_id.0, page_id.1
            ))
        })?;

        let page = source.get_dictionary(page_id).map_err(|e| {
            UnlockError::SerializationFailure(format!(
                "page object {} {} is unreadable: {e}",
                page_id.0, page_id.1
            ))
        })?;

        let mut copy = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() != b"Parent" {
                copy.set(key.clone(), self.copy_object(source, value));
            }
        }
        for key in INHERITABLE_PAGE_KEYS {
            if !copy.has(key) {
                if let Some(value) = pdf_utils::inherited_attribute(source, page, key) {
                    copy.set(key.to_vec(), self.copy_object(source, value));
                }
            }
        }
        copy.set("Parent", Object::Reference(self.pages_id));

        self.document.objects.insert(new_id, Object::Dictionary(copy));
        self.kids.push(Object::Reference(new_id));
        Ok(())
    }

    /// Copy the `/Info` dictionary into the new trailer.
    fn copy_info(&mut self, source: &Document) -> Result<()> {
        let Ok(info_value) = source.trailer.get(b"Info") else {
            debug!("source document has no /Info dictionary");
            return Ok(());
        };

        let info = pdf_utils::resolve_dict(source, info_value).ok_or_else(|| {
            UnlockError::MalformedDocument("/Info is not a dictionary".into())
        })?;

        let mut copy = Dictionary::new();
        for (key, value) in info.iter() {
            let value = match value {
                Object::Reference(id) => source.get_object(*id).map_err(|e| {
                    UnlockError::MalformedDocument(format!(
                        "/Info entry /{} is unreadable: {e}",
                        String::from_utf8_lossy(key)
                    ))
                })?,
                direct => direct,
            };
            copy.set(key.clone(), value.clone());
        }

        let info_id = self.document.add_object(copy);
        self.document.trailer.set("Info", Object::Reference(info_id));
        Ok(())
    }

    fn copy_object(&mut self, source: &Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(source, *id),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(source, item))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(source, dict)),
            Object::Stream(stream) => {
                let mut stream = stream.clone();
                stream.dict = self.copy_dictionary(source, &stream.dict);
                Object::Stream(stream)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, source: &Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy_object(source, value));
        }
        copy
    }

    fn copy_reference(&mut self, source: &Document, id: ObjectId) -> Object {
        if let Some(&new_id) = self.copied.get(&id) {
            return Object::Reference(new_id);
        }

        let Ok(target) = source.get_object(id) else {
            warn!("dropping dangling reference {} {}", id.0, id.1);
            return Object::Null;
        };
        if pdf_utils::is_pages_node(target) {
            return Object::Null;
        }

        // Registered before recursing so cycles terminate.
        let new_id = self.document.new_object_id();
        self.copied.insert(id, new_id);
        let copy = self.copy_object(source, target);
        self.document.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }

    fn finish(mut self, compress: bool) -> Result<Vec<u8>> {
        if !self.pending_pages.is_empty() {
            warn!(
                "{} reserved page(s) were never added to the rebuilt document",
                self.pending_pages.len()
            );
            for new_id in self.pending_pages.values() {
                self.document.objects.remove(new_id);
            }
        }

        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        if compress {
            self.document.compress();
        }

        let mut buffer = Vec::new();
        self.document
            .save_to(&mut buffer)
            .map_err(|e| UnlockError::SerializationFailure(e.to_string()))?;
        Ok(buffer)
    }
}
