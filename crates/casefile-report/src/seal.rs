//! Password-based sealing of report documents.
//!
//! Key schedule: Argon2id(password, 16-byte random salt, recorded params)
//! yields 64 bytes. The first half keys AES-256-GCM, the second half keys
//! HMAC-SHA256.
//!
//! The integrity tag covers the envelope version, KDF parameters, salt,
//! nonce, evidence hash, and ciphertext. [`open`] checks the tag in constant
//! time first and only then runs the AEAD decryption, which authenticates the
//! ciphertext a second time against the evidence hash as associated data.
//! No plaintext byte is returned unless both checks pass.

use aes_gcm::{
  Aes256Gcm, Nonce,
  aead::{Aead, KeyInit, Payload},
};
use argon2::{Algorithm, Argon2, Params, Version};
use casefile_core::{
  integrity::EvidenceHash,
  report::{KdfParams, SealedEnvelope},
};
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha2::Sha256;

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

pub const ENVELOPE_VERSION: u8 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Key material for one envelope. Wiped on drop.
struct DerivedKeys {
  cipher: [u8; KEY_LEN],
  mac:    [u8; KEY_LEN],
}

impl Drop for DerivedKeys {
  fn drop(&mut self) {
    self.cipher.fill(0);
    self.mac.fill(0);
  }
}

fn derive_keys(password: &str, salt: &[u8], kdf: &KdfParams) -> Result<DerivedKeys> {
  let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, Some(2 * KEY_LEN))
    .map_err(|e| Error::Kdf(e.to_string()))?;
  let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

  let mut okm = [0u8; 2 * KEY_LEN];
  argon2
    .hash_password_into(password.as_bytes(), salt, &mut okm)
    .map_err(|e| Error::Kdf(e.to_string()))?;

  let mut keys = DerivedKeys { cipher: [0; KEY_LEN], mac: [0; KEY_LEN] };
  keys.cipher.copy_from_slice(&okm[..KEY_LEN]);
  keys.mac.copy_from_slice(&okm[KEY_LEN..]);
  okm.fill(0);
  Ok(keys)
}

fn tag_mac(key: &[u8], envelope: &SealedEnvelope) -> Result<HmacSha256> {
  let mut mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| Error::Cipher)?;
  mac.update(&[envelope.version]);
  mac.update(&envelope.kdf.memory_kib.to_be_bytes());
  mac.update(&envelope.kdf.iterations.to_be_bytes());
  mac.update(&envelope.kdf.parallelism.to_be_bytes());
  mac.update(&envelope.salt);
  mac.update(&envelope.nonce);
  mac.update(envelope.evidence_hash.as_bytes());
  mac.update(&(envelope.ciphertext.len() as u64).to_be_bytes());
  mac.update(&envelope.ciphertext);
  Ok(mac)
}

/// Encrypt `plaintext` under `password`, bound to `evidence_hash`.
///
/// Salt and nonce are fresh for every call. CPU- and memory-heavy; run it
/// off the async executor.
pub fn seal(
  plaintext: &[u8],
  password: &str,
  evidence_hash: &EvidenceHash,
  kdf: KdfParams,
) -> Result<SealedEnvelope> {
  if password.is_empty() {
    return Err(Error::EmptyPassword);
  }

  let mut salt = vec![0u8; SALT_LEN];
  OsRng.fill_bytes(&mut salt);
  let mut nonce = vec![0u8; NONCE_LEN];
  OsRng.fill_bytes(&mut nonce);

  let keys = derive_keys(password, &salt, &kdf)?;
  let cipher = Aes256Gcm::new_from_slice(&keys.cipher).map_err(|_| Error::Cipher)?;
  let ciphertext = cipher
    .encrypt(
      Nonce::from_slice(&nonce),
      Payload { msg: plaintext, aad: evidence_hash.as_bytes() },
    )
    .map_err(|_| Error::Cipher)?;

  let mut envelope = SealedEnvelope {
    version: ENVELOPE_VERSION,
    kdf,
    salt,
    nonce,
    ciphertext,
    integrity_tag: Vec::new(),
    evidence_hash: evidence_hash.clone(),
  };
  envelope.integrity_tag = tag_mac(&keys.mac, &envelope)?.finalize().into_bytes().to_vec();
  Ok(envelope)
}

/// Authenticate and decrypt an envelope.
///
/// Every failure, whatever its cause, is reported as [`Error::Decryption`].
pub fn open(envelope: &SealedEnvelope, password: &str) -> Result<Vec<u8>> {
  if envelope.version != ENVELOPE_VERSION
    || envelope.salt.len() != SALT_LEN
    || envelope.nonce.len() != NONCE_LEN
  {
    return Err(Error::Decryption);
  }

  let keys = derive_keys(password, &envelope.salt, &envelope.kdf)
    .map_err(|_| Error::Decryption)?;

  tag_mac(&keys.mac, envelope)
    .map_err(|_| Error::Decryption)?
    .verify_slice(&envelope.integrity_tag)
    .map_err(|_| Error::Decryption)?;

  let cipher = Aes256Gcm::new_from_slice(&keys.cipher).map_err(|_| Error::Decryption)?;
  cipher
    .decrypt(
      Nonce::from_slice(&envelope.nonce),
      Payload {
        msg: &envelope.ciphertext,
        aad: envelope.evidence_hash.as_bytes(),
      },
    )
    .map_err(|_| Error::Decryption)
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Cheap parameters so tests stay fast.
  fn test_kdf() -> KdfParams {
    KdfParams { memory_kib: 256, iterations: 1, parallelism: 1 }
  }

  fn hash(byte: char) -> EvidenceHash {
    EvidenceHash::from_hex(&byte.to_string().repeat(64)).unwrap()
  }

  const DOC: &[u8] = b"FORENSIC INVESTIGATION REPORT\nrisk: 49.00/100\n";

  #[test]
  fn round_trip_reproduces_plaintext() {
    let env = seal(DOC, "Secret123!", &hash('a'), test_kdf()).unwrap();
    assert_ne!(env.ciphertext.as_slice(), DOC);
    assert_eq!(open(&env, "Secret123!").unwrap(), DOC);
  }

  #[test]
  fn wrong_password_fails() {
    let env = seal(DOC, "Secret123!", &hash('a'), test_kdf()).unwrap();
    assert!(matches!(open(&env, "wrong"), Err(Error::Decryption)));
    assert!(matches!(open(&env, ""), Err(Error::Decryption)));
  }

  #[test]
  fn empty_password_rejected_on_seal() {
    assert!(matches!(
      seal(DOC, "", &hash('a'), test_kdf()),
      Err(Error::EmptyPassword)
    ));
  }

  #[test]
  fn salt_and_nonce_are_fresh() {
    let a = seal(DOC, "pw", &hash('a'), test_kdf()).unwrap();
    let b = seal(DOC, "pw", &hash('a'), test_kdf()).unwrap();
    assert_ne!(a.salt, b.salt);
    assert_ne!(a.nonce, b.nonce);
    assert_ne!(a.ciphertext, b.ciphertext);
  }

  #[test]
  fn flipped_ciphertext_bit_fails() {
    let mut env = seal(DOC, "pw", &hash('a'), test_kdf()).unwrap();
    env.ciphertext[0] ^= 0x01;
    assert!(matches!(open(&env, "pw"), Err(Error::Decryption)));
  }

  #[test]
  fn altered_tag_fails() {
    let mut env = seal(DOC, "pw", &hash('a'), test_kdf()).unwrap();
    let last = env.integrity_tag.len() - 1;
    env.integrity_tag[last] ^= 0x80;
    assert!(matches!(open(&env, "pw"), Err(Error::Decryption)));
  }

  #[test]
  fn rebinding_to_other_evidence_fails() {
    let mut env = seal(DOC, "pw", &hash('a'), test_kdf()).unwrap();
    env.evidence_hash = hash('b');
    assert!(matches!(open(&env, "pw"), Err(Error::Decryption)));
  }

  #[test]
  fn downgraded_kdf_params_fail() {
    let mut env = seal(DOC, "pw", &hash('a'), test_kdf()).unwrap();
    env.kdf.iterations = 2;
    assert!(matches!(open(&env, "pw"), Err(Error::Decryption)));
  }

  #[test]
  fn truncated_nonce_fails_without_panicking() {
    let mut env = seal(DOC, "pw", &hash('a'), test_kdf()).unwrap();
    env.nonce.pop();
    assert!(matches!(open(&env, "pw"), Err(Error::Decryption)));
  }
}
