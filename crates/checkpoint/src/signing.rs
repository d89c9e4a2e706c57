//! Attendance record signing.
//!
//! Each record is serialized to JSON, hashed with SHA-256, and the digest is
//! signed with the device's ed25519 key. The signed envelope carries the
//! signer's public key so a backend can check it against its allow-list.
//!
//! Envelope: { record, digest: hex, signature: base64url, signer: base64url }

use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::record::AttendanceRecord;

/// A record plus its signature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedAttendanceRecord {
    pub record: AttendanceRecord,
    /// Hex SHA-256 of the record JSON
    pub digest: String,
    pub signature: String,
    pub signer: String,
}

/// Signs attendance records with an ed25519 key
pub struct RecordSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl RecordSigner {
    /// Load the key from `path` if given, otherwise generate an ephemeral one
    pub fn load(private_key_path: Option<&str>) -> Result<Self> {
        match private_key_path {
            Some(path) => Self::from_key_file(Path::new(path)),
            None => {
                tracing::warn!("Using ephemeral signing key (will change on restart)");
                Ok(Self::ephemeral())
            }
        }
    }

    /// Read a raw 32-byte ed25519 secret key
    pub fn from_key_file(path: &Path) -> Result<Self> {
        let key_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read signing key file {}", path.display()))?;

        if key_bytes.len() != 32 {
            bail!(
                "Invalid signing key length (expected 32 bytes, got {})",
                key_bytes.len()
            );
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&key_bytes);
        Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes)))
    }

    /// Generate a key using OsRng (compatible with ed25519-dalek)
    pub fn ephemeral() -> Self {
        use rand_core::OsRng;
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    pub fn public_key_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.verifying_key.as_bytes())
    }

    pub fn sign(&self, record: AttendanceRecord) -> Result<SignedAttendanceRecord> {
        let digest = record_digest(&record)?;
        let signature = self.signing_key.sign(&digest);

        tracing::debug!(
            record_id = record.record_id(),
            digest = %hex_digest(&digest),
            "Signed attendance record"
        );

        Ok(SignedAttendanceRecord {
            digest: hex_digest(&digest),
            signature: URL_SAFE_NO_PAD.encode(signature.to_bytes()),
            signer: self.public_key_b64(),
            record,
        })
    }
}

/// Check a signed record against the public key it carries
pub fn verify(signed: &SignedAttendanceRecord) -> Result<()> {
    let digest = record_digest(&signed.record)?;
    if hex_digest(&digest) != signed.digest {
        bail!("Record digest mismatch");
    }

    let key_bytes = URL_SAFE_NO_PAD
        .decode(&signed.signer)
        .context("Invalid signer encoding")?;
    let key_bytes: [u8; 32] = key_bytes
        .as_slice()
        .try_into()
        .context("Invalid signer key length")?;
    let verifying = VerifyingKey::from_bytes(&key_bytes).context("Invalid signer key")?;

    let sig_bytes = URL_SAFE_NO_PAD
        .decode(&signed.signature)
        .context("Invalid signature encoding")?;
    if sig_bytes.len() != 64 {
        bail!("Invalid signature length");
    }
    let mut sig_array = [0u8; 64];
    sig_array.copy_from_slice(&sig_bytes);
    let signature = Signature::from_bytes(&sig_array);

    verifying
        .verify(&digest, &signature)
        .context("Invalid signature")?;

    Ok(())
}

fn record_digest(record: &AttendanceRecord) -> Result<[u8; 32]> {
    let json = serde_json::to_vec(record).context("Failed to serialize record")?;
    Ok(Sha256::digest(&json).into())
}

fn hex_digest(digest: &[u8; 32]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
