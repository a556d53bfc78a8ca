//! Authenticated sealing of short secrets for transport inside cookies.
//!
//! A [`SealedBlob`] is `base64url(nonce[12] || tag[16] || ciphertext)` without padding, produced
//! with AES-256-GCM under a key derived from a passphrase by SHA-256. Every call to [`seal`]
//! draws a fresh random nonce. [`unseal`] fails closed: a short blob, bad base64, a failed tag
//! check, or non-UTF-8 plaintext all yield the same [`IntegrityError`].

// crates.io
use aes_gcm::{
	Aes256Gcm, Key, Nonce, Tag,
	aead::{AeadInPlace, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, IntegrityError},
};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = NONCE_LEN + TAG_LEN;

/// 256-bit sealing key. The passphrase it came from is not retained.
#[derive(Clone, PartialEq, Eq)]
pub struct SealingKey([u8; 32]);
impl SealingKey {
	/// Derives a key from `passphrase`; the same passphrase always yields the same key.
	pub fn derive(passphrase: &str) -> Self {
		let mut key = [0_u8; 32];

		key.copy_from_slice(&Sha256::digest(passphrase.as_bytes()));

		Self(key)
	}

	fn cipher(&self) -> Aes256Gcm {
		Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
	}
}
impl Debug for SealingKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SealingKey(<redacted>)")
	}
}

/// Sealed secret in its cookie-safe text form.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SealedBlob(String);
impl SealedBlob {
	/// Borrows the encoded text.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns the encoded text.
	pub fn into_string(self) -> String {
		self.0
	}
}
impl AsRef<str> for SealedBlob {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for SealedBlob {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl Debug for SealedBlob {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SealedBlob").field(&self.0.len()).finish()
	}
}

/// Seals `plaintext` under `key` with a fresh random nonce.
pub fn seal(plaintext: &str, key: &SealingKey) -> Result<SealedBlob> {
	let nonce_bytes: [u8; NONCE_LEN] = rand::random();
	let mut buffer = plaintext.as_bytes().to_vec();
	let tag = key
		.cipher()
		.encrypt_in_place_detached(Nonce::from_slice(&nonce_bytes), b"", &mut buffer)
		.map_err(|_| ConfigError::Seal)?;
	let mut raw = Vec::with_capacity(HEADER_LEN + buffer.len());

	raw.extend_from_slice(&nonce_bytes);
	raw.extend_from_slice(tag.as_slice());
	raw.extend_from_slice(&buffer);

	Ok(SealedBlob(URL_SAFE_NO_PAD.encode(raw)))
}

/// Opens a blob produced by [`seal`] under the same key.
pub fn unseal(blob: &str, key: &SealingKey) -> Result<String, IntegrityError> {
	let raw = URL_SAFE_NO_PAD.decode(blob.trim_end_matches('=')).map_err(|_| IntegrityError)?;

	if raw.len() < HEADER_LEN {
		return Err(IntegrityError);
	}

	let (nonce, rest) = raw.split_at(NONCE_LEN);
	let (tag, ciphertext) = rest.split_at(TAG_LEN);
	let mut buffer = ciphertext.to_vec();

	key.cipher()
		.decrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut buffer, Tag::from_slice(tag))
		.map_err(|_| IntegrityError)?;

	String::from_utf8(buffer).map_err(|_| IntegrityError)
}
