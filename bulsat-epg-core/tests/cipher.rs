use base64::{engine::general_purpose::STANDARD, Engine as _};
use bulsat_epg_core::cipher::encrypt;
use bulsat_epg_core::Error;

const KEY_128: &[u8] = b"0123456789abcdef";

fn decoded(ciphertext: &str) -> Vec<u8> {
    STANDARD.decode(ciphertext).expect("output should be valid base64")
}

#[test]
fn short_secret_encrypts_to_one_block() {
    let out = encrypt(b"abc", KEY_128).expect("valid key");
    let bytes = decoded(&out);
    assert_eq!(bytes.len() % 16, 0);
    assert_eq!(bytes.len(), 16);
}

#[test]
fn encryption_is_deterministic() {
    let first = encrypt(b"hunter2", KEY_128).unwrap();
    let second = encrypt(b"hunter2", KEY_128).unwrap();
    assert_eq!(first, second, "ECB without IV must be deterministic");
}

#[test]
fn block_aligned_secret_gains_a_zero_block() {
    let out = decoded(&encrypt(b"exactly16bytes!!", KEY_128).unwrap());
    assert_eq!(out.len(), 32);

    // The trailing block is the encryption of sixteen zero bytes, identical to
    // what an empty secret produces.
    let empty = decoded(&encrypt(b"", KEY_128).unwrap());
    assert_eq!(empty.len(), 16);
    assert_eq!(&out[16..], &empty[..]);
}

#[test]
fn matches_fips_197_vector_in_first_block() {
    let key: Vec<u8> = (0u8..16).collect();
    let plaintext: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];
    let expected: [u8; 16] = [
        0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4, 0xc5,
        0x5a,
    ];
    let out = decoded(&encrypt(&plaintext, &key).unwrap());
    assert_eq!(&out[..16], &expected);
}

#[test]
fn identical_blocks_encrypt_identically() {
    let secret = [b'a'; 32];
    let out = decoded(&encrypt(&secret, KEY_128).unwrap());
    assert_eq!(out.len(), 48);
    assert_eq!(&out[..16], &out[16..32]);
}

#[test]
fn longer_keys_select_wider_aes() {
    let k24 = [7u8; 24];
    let k32 = [7u8; 32];
    let a = encrypt(b"pw", &k24).unwrap();
    let b = encrypt(b"pw", &k32).unwrap();
    assert_ne!(a, b);
    assert_eq!(decoded(&a).len(), 16);
    assert_eq!(decoded(&b).len(), 16);
}

#[test]
fn invalid_key_length_is_crypto_error() {
    for len in [0usize, 10, 15, 17, 33] {
        let key = vec![1u8; len];
        let err = encrypt(b"pw", &key).unwrap_err();
        assert!(matches!(err, Error::Crypto(_)), "len {len} gave {err:?}");
    }
}
