//! Credential encryption for the login handshake.
//!
//! The backend hands out the key in the `challenge` header and expects the
//! password AES-encrypted block by block (ECB, no IV), zero-padded, base64-encoded.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Error, Result};

pub const BLOCK_SIZE: usize = 16;

/// Encrypts `secret` with `key` and returns the base64 ciphertext.
///
/// The key length picks the AES variant (16, 24 or 32 bytes). Any other
/// length is a [`Error::Crypto`].
pub fn encrypt(secret: &[u8], key: &[u8]) -> Result<String> {
    let mut buf = zero_pad(secret);
    match key.len() {
        16 => encrypt_blocks::<Aes128>(key, &mut buf)?,
        24 => encrypt_blocks::<Aes192>(key, &mut buf)?,
        32 => encrypt_blocks::<Aes256>(key, &mut buf)?,
        other => {
            return Err(Error::Crypto(format!(
                "unsupported key length {other}, expected 16, 24 or 32 bytes"
            )))
        }
    }
    Ok(STANDARD.encode(buf))
}

/// Pads to the next multiple of the block size. An aligned input still
/// receives a full block of zeros; the backend decrypts with that layout.
fn zero_pad(secret: &[u8]) -> Vec<u8> {
    let padded_len = secret.len() + (BLOCK_SIZE - secret.len() % BLOCK_SIZE);
    let mut buf = Vec::with_capacity(padded_len);
    buf.extend_from_slice(secret);
    buf.resize(padded_len, 0);
    buf
}

fn encrypt_blocks<C>(key: &[u8], buf: &mut [u8]) -> Result<()>
where
    C: BlockEncrypt + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|e| Error::Crypto(e.to_string()))?;
    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_secret_to_one_block() {
        let padded = zero_pad(b"abc");
        assert_eq!(padded.len(), 16);
        assert_eq!(&padded[..3], b"abc");
        assert!(padded[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn aligned_secret_gets_extra_zero_block() {
        assert_eq!(zero_pad(&[7u8; 16]).len(), 32);
        assert_eq!(zero_pad(&[7u8; 32]).len(), 48);
        assert_eq!(zero_pad(b"").len(), 16);
    }

    #[test]
    fn ragged_secret_rounds_up() {
        assert_eq!(zero_pad(&[1u8; 17]).len(), 32);
        assert_eq!(zero_pad(&[1u8; 31]).len(), 32);
    }
}
