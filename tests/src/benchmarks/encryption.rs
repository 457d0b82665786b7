//! Per-chunk AEAD overhead and key-rotation behavior under a
//! sustained stream of chunks, one session at a time.

use lucid_06_encryption::Encryptor;
use lucid_crypto::Cipher;
use std::time::Instant;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_thousand_chunks_encrypt_well_under_a_second() {
        let mut encryptor = Encryptor::with_default_rotation(Cipher::Aes256Gcm).unwrap();
        let chunk = vec![0x42u8; 64 * 1024];
        let session_id = "bench-session";

        let started = Instant::now();
        for _ in 0..1000 {
            let packet = encryptor.encrypt(session_id, &chunk, None).unwrap();
            let plaintext = encryptor.decrypt(&packet).unwrap();
            assert_eq!(plaintext, chunk);
        }
        let elapsed = started.elapsed();
        assert!(elapsed.as_secs() < 1, "1000 round trips took {elapsed:?}");
    }

    #[test]
    fn rotation_keeps_retired_keys_decryptable() {
        let mut encryptor = Encryptor::with_default_rotation(Cipher::Aes256Gcm).unwrap();
        let session_id = "rotation-session";

        let before_rotation = encryptor.encrypt(session_id, b"first generation", None).unwrap();
        encryptor.rotate(session_id);
        let after_rotation = encryptor.encrypt(session_id, b"second generation", None).unwrap();

        assert_eq!(encryptor.decrypt(&before_rotation).unwrap(), b"first generation");
        assert_eq!(encryptor.decrypt(&after_rotation).unwrap(), b"second generation");
    }
}
