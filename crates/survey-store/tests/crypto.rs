use proptest::prelude::*;
use serde_json::json;
use survey_store::crypto::{decrypt, decrypt_json, encrypt, encrypt_json, hash};

#[test]
fn wrong_key_and_tampering_fail_softly() {
    let sealed = encrypt("rahasia", "kunci-a");
    assert!(decrypt(&sealed, "kunci-b").is_none());

    let mut bytes = sealed.into_bytes();
    let last = bytes.len() - 3;
    bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).expect("ascii");
    assert!(decrypt(&tampered, "kunci-a").is_none());
}

#[test]
fn legacy_plaintext_is_not_mistaken_for_ciphertext() {
    assert!(decrypt(r#"{"userId":"TS_001"}"#, "kunci").is_none());
    assert!(decrypt("", "kunci").is_none());
    assert!(decrypt("not base64 !!", "kunci").is_none());
}

#[test]
fn json_helpers_wrap_encrypt() {
    let value = json!({ "answers": { "q1": "Budi" }, "index": 2 });
    let sealed = encrypt_json(&value, "kunci").expect("serializable");
    let opened: serde_json::Value = decrypt_json(&sealed, "kunci").expect("decrypts");
    assert_eq!(opened, value);
    assert!(decrypt_json::<serde_json::Value>(&sealed, "lain").is_none());
}

#[test]
fn hash_never_equals_raw_pin() {
    let digest = hash("482913", "tracer");
    assert_ne!(digest, "482913");
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

proptest! {
    #[test]
    fn encrypt_then_decrypt_returns_input(text in ".*", key in "[a-zA-Z0-9]{0,32}") {
        let sealed = encrypt(&text, &key);
        prop_assert_eq!(decrypt(&sealed, &key), Some(text));
    }
}
