//! Password checks for the standard security handler.
//!
//! lopdf authenticates passwords and decrypts objects, but it always derives
//! the file key as if it had been given the *user* password, and it strips
//! `/Encrypt` from files it can open with an empty user password. The helpers
//! here fill both gaps:
//!
//! * for a locked revision 2–4 file, an owner password is turned back into the
//!   user password stored under `/O` so lopdf can derive the right key;
//! * for a file lopdf already opened, the owner password is checked against
//!   the `/O` and `/U` values lopdf keeps in its encryption state.

use crate::{PasswordKind, Result, UnlockError};
use lopdf::encryption::{DecryptionError, EncryptionState, PasswordAlgorithm};
use lopdf::{dictionary, Dictionary, Document, Object, StringFormat};
use md5::{Digest, Md5};
use rc4::{consts, KeyInit, Rc4, StreamCipher};

/// Padding appended to every revision 2–4 password before it is hashed.
const PAD_BYTES: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// How a password authenticated against a locked document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub kind: PasswordKind,
    /// The password lopdf has to be given to derive the file key.
    pub user_password: String,
}

// ── Locked documents ──────────────────────────────────────────────────────────

/// Check `password` against the owner entry first and the user entry second.
pub(crate) fn authenticate_locked(
    source: &Document,
    encrypt: &Dictionary,
    password: &str,
) -> Result<Credentials> {
    let stub = stub_document(source, encrypt.clone());
    let algorithm = PasswordAlgorithm::try_from(&stub).map_err(lopdf_error)?;
    let sanitized = algorithm
        .sanitize_password(password)
        .map_err(decryption_error)?;

    if algorithm.authenticate_owner_password(&stub, &sanitized).is_ok() {
        let user_password = match Rc4Handler::from_dict(encrypt)? {
            Some(handler) => {
                let owner_value = encrypt
                    .get(b"O")
                    .and_then(Object::as_str)
                    .map_err(|_| UnlockError::MalformedDocument("encryption dictionary has no /O".into()))?;
                let recovered = handler.padded_user_password(&sanitized, owner_value)?;
                let user_password = pdf_doc_to_string(unpad(&recovered)).ok_or_else(|| {
                    UnlockError::UnsupportedEncryption(
                        "the user password stored under /O is not representable as text".into(),
                    )
                })?;

                algorithm
                    .sanitize_password(&user_password)
                    .and_then(|pw| algorithm.authenticate_user_password(&stub, pw))
                    .map_err(|_| {
                        UnlockError::UnsupportedEncryption(
                            "the user password recovered from /O does not open the document".into(),
                        )
                    })?;
                user_password
            }
            // Revision 5 and later derive the file key from either password.
            None => password.to_owned(),
        };

        return Ok(Credentials {
            kind: PasswordKind::Owner,
            user_password,
        });
    }

    algorithm
        .authenticate_user_password(&stub, &sanitized)
        .map_err(decryption_error)?;

    Ok(Credentials {
        kind: PasswordKind::User,
        user_password: password.to_owned(),
    })
}

// ── Documents lopdf opened on its own ─────────────────────────────────────────

/// Authenticate against a document lopdf already decrypted with the empty user
/// password. The document itself needs no further work.
pub(crate) fn authenticate_opened(
    source: &Document,
    state: &EncryptionState,
    password: &str,
) -> Result<PasswordKind> {
    if password.is_empty() {
        return Ok(PasswordKind::User);
    }

    let owner = if state.owner_value().len() == 48 {
        aes256_owner_matches(source, state, password)
    } else {
        rc4_owner_matches(state, password)?
    };

    if owner {
        Ok(PasswordKind::Owner)
    } else {
        Err(UnlockError::IncorrectPassword)
    }
}

/// The user password is known to be empty, so the owner password is right
/// exactly when `/O` decrypts to the bare padding string.
fn rc4_owner_matches(state: &EncryptionState, password: &str) -> Result<bool> {
    let Some(owner_password) = string_to_pdf_doc(password) else {
        return Ok(false);
    };

    // lopdf keeps the key but not /R. A 40-bit key may come from either
    // revision family.
    let key_len = state.file_encryption_key().len();
    let revisions: &[i64] = if key_len == 5 { &[3, 2] } else { &[3] };

    for &revision in revisions {
        let handler = Rc4Handler::new(revision, key_len)?;
        if handler.padded_user_password(&owner_password, &state.owner_value())? == PAD_BYTES {
            return Ok(true);
        }
    }
    Ok(false)
}

fn aes256_owner_matches(source: &Document, state: &EncryptionState, password: &str) -> bool {
    let encrypt = dictionary! {
        "Filter" => "Standard",
        "V" => 5,
        "R" => 6,
        "Length" => 256,
        "O" => hex(&state.owner_value()),
        "U" => hex(&state.user_value()),
        "OE" => hex(&state.owner_encrypted()),
        "UE" => hex(&state.user_encrypted()),
        "P" => state.permissions().bits() as i64,
        // Required to be present, never read by the owner check.
        "Perms" => hex(&[0u8; 16]),
    };

    let stub = stub_document(source, encrypt);
    let Ok(algorithm) = PasswordAlgorithm::try_from(&stub) else {
        return false;
    };
    algorithm
        .sanitize_password(password)
        .and_then(|pw| algorithm.authenticate_owner_password(&stub, pw))
        .is_ok()
}

fn hex(bytes: &[u8]) -> Object {
    Object::String(bytes.to_vec(), StringFormat::Hexadecimal)
}

// ── Revision 2–4 owner entry ──────────────────────────────────────────────────

/// The parameters of an RC4-era (revision 2–4) standard handler that the owner
/// entry depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rc4Handler {
    revision: i64,
    key_len: usize,
}

impl Rc4Handler {
    pub(crate) fn new(revision: i64, key_len: usize) -> Result<Self> {
        if !(5..=16).contains(&key_len) {
            return Err(UnlockError::UnsupportedEncryption(format!(
                "{}-bit RC4 keys are not supported",
                key_len * 8
            )));
        }
        Ok(Self { revision, key_len })
    }

    /// `None` for revision 5 and later.
    pub(crate) fn from_dict(encrypt: &Dictionary) -> Result<Option<Self>> {
        let revision = encrypt
            .get(b"R")
            .and_then(Object::as_i64)
            .map_err(|_| UnlockError::MalformedDocument("encryption dictionary has no /R".into()))?;
        if revision >= 5 {
            return Ok(None);
        }

        let key_len = if revision == 2 {
            5
        } else {
            let bits = encrypt.get(b"Length").and_then(Object::as_i64).unwrap_or(40);
            usize::try_from(bits / 8).unwrap_or(0)
        };
        Self::new(revision, key_len).map(Some)
    }

    /// Decrypt `/O` with the key derived from `owner_password`, giving the
    /// padded user password (Algorithm 7 of ISO 32000-2).
    pub(crate) fn padded_user_password(&self, owner_password: &[u8], owner_value: &[u8]) -> Result<Vec<u8>> {
        let len = owner_password.len().min(32);
        let mut hasher = Md5::new();
        hasher.update(&owner_password[..len]);
        hasher.update(&PAD_BYTES[..32 - len]);
        let mut hash = hasher.finalize();

        if self.revision >= 3 {
            for _ in 0..50 {
                hash = Md5::digest(hash);
            }
        }
        let key = &hash[..self.key_len];

        if self.revision == 2 {
            return rc4(key, owner_value);
        }

        let mut result = owner_value.to_vec();
        for round in (0..20u8).rev() {
            let round_key: Vec<u8> = key.iter().map(|byte| byte ^ round).collect();
            result = rc4(&round_key, &result)?;
        }
        Ok(result)
    }
}

fn rc4(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = data.to_vec();

    macro_rules! apply_keystream {
        ($($len:literal => $size:ident),+ $(,)?) => {
            match key.len() {
                $($len => Rc4::<consts::$size>::new_from_slice(key)
                    .map(|mut cipher| cipher.apply_keystream(&mut buffer)),)+
                other => {
                    return Err(UnlockError::UnsupportedEncryption(format!(
                        "{}-bit RC4 keys are not supported",
                        other * 8
                    )))
                }
            }
        };
    }

    let applied = apply_keystream!(
        5 => U5, 6 => U6, 7 => U7, 8 => U8, 9 => U9, 10 => U10,
        11 => U11, 12 => U12, 13 => U13, 14 => U14, 15 => U15, 16 => U16,
    );
    applied.map_err(|e| UnlockError::UnsupportedEncryption(format!("RC4 key rejected: {e}")))?;

    Ok(buffer)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A document holding only the file identifier and `encrypt`, which is all
/// the standard security handler reads.
fn stub_document(source: &Document, encrypt: Dictionary) -> Document {
    let mut stub = Document::with_version(source.version.clone());
    if let Ok(id) = source.trailer.get(b"ID") {
        stub.trailer.set("ID", id.clone());
    }
    let encrypt_id = stub.add_object(encrypt);
    stub.trailer.set("Encrypt", Object::Reference(encrypt_id));
    stub
}

/// Drop the padding string from the end of a padded password.
fn unpad(padded: &[u8]) -> &[u8] {
    let len = (0..=padded.len())
        .find(|&n| PAD_BYTES.starts_with(&padded[n..]))
        .unwrap_or(padded.len());
    &padded[..len]
}

/// Decode password bytes in the part of PDFDocEncoding that agrees with
/// Latin-1.
fn pdf_doc_to_string(bytes: &[u8]) -> Option<String> {
    bytes
        .iter()
        .map(|&byte| match byte {
            0x09 | 0x0A | 0x0D | 0x20..=0x7E => Some(char::from(byte)),
            0xA1..=0xFF if byte != 0xAD => Some(char::from(byte)),
            _ => None,
        })
        .collect()
}

fn string_to_pdf_doc(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| {
            let byte = u8::try_from(u32::from(c)).ok()?;
            pdf_doc_to_string(&[byte]).map(|_| byte)
        })
        .collect()
}

pub(crate) fn decryption_error(err: DecryptionError) -> UnlockError {
    match err {
        DecryptionError::IncorrectPassword => UnlockError::IncorrectPassword,
        DecryptionError::UnsupportedEncryption | DecryptionError::UnsupportedRevision => {
            UnlockError::UnsupportedEncryption(err.to_string())
        }
        other => UnlockError::MalformedDocument(format!("invalid encryption dictionary: {other}")),
    }
}

pub(crate) fn lopdf_error(err: lopdf::Error) -> UnlockError {
    match err {
        lopdf::Error::InvalidPassword => UnlockError::IncorrectPassword,
        lopdf::Error::Decryption(inner) => decryption_error(inner),
        other => UnlockError::MalformedDocument(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{EncryptionVersion, Permissions};

    fn encrypted(owner_password: &str, user_password: &str) -> Document {
        let mut doc = Document::with_version("1.5");
        doc.trailer.set(
            "ID",
            Object::Array(vec![
                Object::String(vec![7; 16], StringFormat::Literal),
                Object::String(vec![9; 16], StringFormat::Literal),
            ]),
        );
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let version = EncryptionVersion::V2 {
            document: &doc,
            owner_password,
            user_password,
            key_length: 128,
            permissions: Permissions::PRINTABLE,
        };
        let state = EncryptionState::try_from(version).unwrap();
        doc.encrypt(&state).unwrap();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        Document::load_mem(&bytes).unwrap()
    }

    fn encrypt_dict(doc: &Document) -> Dictionary {
        let id = doc.trailer.get(b"Encrypt").unwrap().as_reference().unwrap();
        doc.get_dictionary(id).unwrap().clone()
    }

    #[test]
    fn owner_entry_yields_the_user_password() {
        let doc = encrypted("secret123", "reader");
        let encrypt = encrypt_dict(&doc);
        let handler = Rc4Handler::from_dict(&encrypt).unwrap().unwrap();
        let owner_value = encrypt.get(b"O").unwrap().as_str().unwrap();

        let padded = handler.padded_user_password(b"secret123", owner_value).unwrap();
        assert_eq!(unpad(&padded), b"reader");
    }

    #[test]
    fn owner_password_maps_to_stored_user_password() {
        let doc = encrypted("secret123", "reader");
        let creds = authenticate_locked(&doc, &encrypt_dict(&doc), "secret123").unwrap();
        assert_eq!(creds.kind, PasswordKind::Owner);
        assert_eq!(creds.user_password, "reader");
    }

    #[test]
    fn user_password_is_passed_through() {
        let doc = encrypted("secret123", "reader");
        let creds = authenticate_locked(&doc, &encrypt_dict(&doc), "reader").unwrap();
        assert_eq!(creds.kind, PasswordKind::User);
        assert_eq!(creds.user_password, "reader");
    }

    #[test]
    fn wrong_password_on_locked_document() {
        let doc = encrypted("secret123", "reader");
        let err = authenticate_locked(&doc, &encrypt_dict(&doc), "guess").unwrap_err();
        assert!(matches!(err, UnlockError::IncorrectPassword));
    }

    #[test]
    fn opened_document_checks_owner_entry() {
        let doc = encrypted("secret123", "");
        let state = doc.encryption_state.as_ref().expect("opened with the empty user password");

        assert_eq!(authenticate_opened(&doc, state, "secret123").unwrap(), PasswordKind::Owner);
        assert_eq!(authenticate_opened(&doc, state, "").unwrap(), PasswordKind::User);
        assert!(matches!(
            authenticate_opened(&doc, state, "wrong"),
            Err(UnlockError::IncorrectPassword)
        ));
    }

    #[test]
    fn unpad_strips_only_the_padding() {
        let mut padded = b"reader".to_vec();
        padded.extend_from_slice(&PAD_BYTES[..26]);
        assert_eq!(unpad(&padded), b"reader");
        assert_eq!(unpad(&PAD_BYTES), b"");

        let full = [b'x'; 32];
        assert_eq!(unpad(&full), &full[..]);
    }

    #[test]
    fn latin_passwords_survive_encoding() {
        let bytes = string_to_pdf_doc("café").unwrap();
        assert_eq!(bytes, b"caf\xE9");
        assert_eq!(pdf_doc_to_string(&bytes).as_deref(), Some("café"));
        assert!(string_to_pdf_doc("密码").is_none());
    }

    #[test]
    fn oversized_rc4_keys_are_unsupported() {
        assert!(matches!(
            Rc4Handler::new(3, 32),
            Err(UnlockError::UnsupportedEncryption(_))
        ));

        let encrypt = dictionary! { "R" => 3, "Length" => 256 };
        assert!(Rc4Handler::from_dict(&encrypt).is_err());
        let encrypt = dictionary! { "R" => 6 };
        assert_eq!(Rc4Handler::from_dict(&encrypt).unwrap(), None);
    }
}
