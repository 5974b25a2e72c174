// Signing soundness and URL encryption through the public API

use dims::signing::{
    constant_time_compare, decrypt_url, derive_key, encrypt_url, sign_v4, sign_v5_hex, verify_v5,
    SigningError,
};

const NO_EXTRAS: &[&str] = &[];

#[test]
fn test_v5_signature_shape() {
    let sig = sign_v5_hex("secret", "resize/100x100", "http://img/x.png", NO_EXTRAS);
    // 31 bytes, hex encoded
    assert_eq!(sig.len(), 62);
    assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_v5_verify_accepts_only_exact_inputs() {
    let cases = [
        ("resize/100x100", "http://img/a.png", vec!["acme"]),
        ("crop/10x10+5+5/format/webp", "s3://bucket/key.jpg", vec![]),
        ("", "", vec![]),
    ];

    for (commands, url, extras) in cases {
        let sig = sign_v5_hex("key", commands, url, &extras);
        assert_eq!(verify_v5(&sig, "key", commands, url, &extras), Ok(true));
        assert_eq!(verify_v5(&sig, "other", commands, url, &extras), Ok(false));
        assert_eq!(
            verify_v5(&sig, "key", &format!("{}/x", commands), url, &extras),
            Ok(false)
        );
        assert_eq!(
            verify_v5(&sig, "key", commands, &format!("{}?", url), &extras),
            Ok(false)
        );
        assert_eq!(
            verify_v5(&sig, "key", commands, url, &["extra"]),
            Ok(extras == ["extra"])
        );
    }
}

#[test]
fn test_v5_verify_rejects_truncated_signature() {
    let sig = sign_v5_hex("key", "resize/1x1", "u", NO_EXTRAS);
    assert_eq!(verify_v5(&sig[..60], "key", "resize/1x1", "u", NO_EXTRAS), Ok(false));
    assert!(matches!(
        verify_v5("zz", "key", "resize/1x1", "u", NO_EXTRAS),
        Err(SigningError::InvalidSignatureEncoding(_))
    ));
}

#[test]
fn test_v5_spaces_sign_like_plus() {
    assert_eq!(
        sign_v5_hex("k", "crop/10x10 5 5", "u", NO_EXTRAS),
        sign_v5_hex("k", "crop/10x10+5+5", "u", NO_EXTRAS)
    );
}

#[test]
fn test_v4_signature_is_seven_hex_chars() {
    let sig = sign_v4(1_700_000_000, "k", "resize/10x10", false, "http://img/x.png");
    assert_eq!(sig.len(), 7);
    assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_v4_trailing_slash_changes_signature() {
    let plain = sign_v4(1, "k", "resize/10x10", false, "u");
    let slashed = sign_v4(1, "k", "resize/10x10", true, "u");
    assert_ne!(plain, slashed);
    // leading and trailing slashes in the command text are normalised
    assert_eq!(plain, sign_v4(1, "k", "/resize/10x10/", false, "u"));
}

#[test]
fn test_v4_every_input_contributes() {
    let base = sign_v4(1, "k", "resize/10x10", false, "u");
    assert_ne!(base, sign_v4(2, "k", "resize/10x10", false, "u"));
    assert_ne!(base, sign_v4(1, "j", "resize/10x10", false, "u"));
    assert_ne!(base, sign_v4(1, "k", "resize/10x11", false, "u"));
    assert_ne!(base, sign_v4(1, "k", "resize/10x10", false, "v"));
}

#[test]
fn test_encrypted_url_round_trip_with_derived_keys() {
    for signing_key in ["secret", "hkdf:secret", "sha1:secret"] {
        let key = derive_key(signing_key);
        let url = "https://images.example.com/a/b.jpg?v=2&w=100";
        let eurl = encrypt_url(&key, url).unwrap();
        assert_ne!(eurl, url);
        assert_eq!(decrypt_url(&key, &eurl).unwrap(), url);
    }
}

#[test]
fn test_constant_time_compare() {
    assert!(constant_time_compare("abc1234", "abc1234"));
    assert!(!constant_time_compare("abc1234", "abc1235"));
    assert!(!constant_time_compare("abc", "abcd"));
}
