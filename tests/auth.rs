use ascend::auth::{self, Claims, TokenOutcome};
use jsonwebtoken::{encode, EncodingKey, Header};
use serial_test::serial;

const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

fn set_secret() {
    std::env::set_var("JWT_SECRET", SECRET);
}

#[test]
#[serial]
fn token_roundtrip_resolves_same_user() {
    set_secret();
    let token = auth::create_token(42).expect("token");
    assert_eq!(auth::verify_token(&token), TokenOutcome::Valid(42));
}

#[test]
#[serial]
fn expired_token_is_classified_as_expired() {
    set_secret();
    // Craft a token whose expiry is well past the validation leeway.
    let claims = Claims {
        id: 7,
        exp: (chrono::Utc::now().timestamp() - 7200) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token");
    assert_eq!(auth::verify_token(&token), TokenOutcome::Expired);
}

#[test]
#[serial]
fn garbage_token_is_classified_as_malformed() {
    set_secret();
    assert_eq!(auth::verify_token("notatoken"), TokenOutcome::Malformed);
}

#[test]
#[serial]
fn token_signed_with_other_secret_is_malformed() {
    set_secret();
    let claims = Claims {
        id: 7,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"a-completely-different-secret-key!!"),
    )
    .expect("token");
    assert_eq!(auth::verify_token(&token), TokenOutcome::Malformed);
}

#[test]
fn password_hash_verifies_and_rejects() {
    let hash = auth::hash_password("hunter2-but-longer").expect("hash");
    assert!(hash.starts_with("$argon2"));
    assert!(auth::verify_password("hunter2-but-longer", &hash));
    assert!(!auth::verify_password("wrong password", &hash));
}

#[test]
fn two_hashes_of_same_password_differ() {
    // Salted hashing: equal inputs must not produce equal PHC strings.
    let a = auth::hash_password("same-password").expect("hash");
    let b = auth::hash_password("same-password").expect("hash");
    assert_ne!(a, b);
    assert!(auth::verify_password("same-password", &a));
    assert!(auth::verify_password("same-password", &b));
}

#[test]
fn unparsable_stored_hash_counts_as_mismatch() {
    assert!(!auth::verify_password("anything", "not-a-phc-string"));
}
