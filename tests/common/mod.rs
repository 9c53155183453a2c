// Fixture builders shared by the integration tests. Every PDF is generated in
// memory with lopdf so the suite needs no binary fixtures.

#![allow(dead_code)]

use lopdf::{dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream, StringFormat};

pub const TITLE: &str = "Quarterly statement";

/// The text drawn on page `n` (1-based).
pub fn page_label(n: usize) -> String {
    format!("Page {n} of the statement")
}

/// A document with `pages` pages, each showing [`page_label`], plus an
/// `/Info` dictionary and a file identifier.
pub fn build_document(pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String((1u8..=16).collect(), StringFormat::Literal),
            Object::String((1u8..=16).rev().collect(), StringFormat::Literal),
        ]),
    );

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages);
    for n in 1..=pages {
        let content = format!("BT\n/F1 18 Tf\n72 720 Td\n({}) Tj\nET\n", page_label(n));
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(TITLE),
        "Author" => Object::string_literal("Accounts team"),
    });
    doc.trailer.set("Info", info_id);

    doc
}

pub fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Serialized, 128-bit RC4 encrypted document.
pub fn encrypted_bytes(pages: usize, owner_password: &str, user_password: &str) -> Vec<u8> {
    let mut doc = build_document(pages);
    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password,
        user_password,
        key_length: 128,
        permissions: Permissions::PRINTABLE,
    };
    let state = EncryptionState::try_from(version).unwrap();
    doc.encrypt(&state).unwrap();
    to_bytes(doc)
}

/// Concatenated content of every page of `bytes`, in page order.
pub fn page_contents(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}

/// Asserts `bytes` is a PDF that opens without any password.
pub fn assert_opens_without_password(bytes: &[u8]) {
    let doc = Document::load_mem(bytes).unwrap();
    assert!(!doc.is_encrypted(), "output still carries /Encrypt");
    assert!(doc.encryption_state.is_none(), "output needed decryption to open");
    assert!(doc.trailer.get(b"Encrypt").is_err());
}
