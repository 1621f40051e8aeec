// =========================
// tests/unit/password_tests.rs
// =========================
//! Password hashing and policy checks
use backend_lib::auth::{validate_password_strength, CredentialHasher, PasswordVerdict};
use backend_lib::config::PasswordRequirements;

fn hasher() -> CredentialHasher {
    CredentialHasher::new(10).unwrap()
}

#[test]
fn test_hash_is_salted_phc_string() {
    let hasher = hasher();
    let first = hasher.hash("kepler-452b").unwrap();
    let second = hasher.hash("kepler-452b").unwrap();

    assert!(first.starts_with("$scrypt$ln=10,"));
    assert_ne!(first, second);
    assert_eq!(hasher.verify("kepler-452b", &first), PasswordVerdict::Match);
    assert_eq!(hasher.verify("kepler-452b", &second), PasswordVerdict::Match);
}

#[test]
fn test_wrong_password_is_mismatch() {
    let hasher = hasher();
    let hash = hasher.hash("kepler-452b").unwrap();
    assert_eq!(hasher.verify("kepler-452c", &hash), PasswordVerdict::Mismatch);
    assert!(!hasher.verify("", &hash).is_match());
}

#[test]
fn test_hash_from_other_work_factor_still_verifies() {
    let strong = CredentialHasher::new(11).unwrap().hash("trappist-1e").unwrap();
    assert_eq!(hasher().verify("trappist-1e", &strong), PasswordVerdict::Match);
}

#[test]
fn test_corrupted_hashes_are_reported_not_raised() {
    let hasher = hasher();
    for stored in [
        "",
        "plaintext-password",
        "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo",
    ] {
        assert_eq!(
            hasher.verify("anything", stored),
            PasswordVerdict::MalformedHash,
            "stored hash {stored:?}"
        );
    }
}

#[test]
fn test_decoy_never_matches() {
    assert!(!hasher().verify_decoy("anything"));
}

#[test]
fn test_password_strength_rules() {
    let strict = PasswordRequirements {
        min_length: 10,
        max_length: 20,
        require_uppercase: true,
        require_lowercase: true,
        require_digit: true,
        require_special: true,
    };
    assert!(validate_password_strength("Kepler-452b!", &strict));
    assert!(!validate_password_strength("kepler-452b!", &strict));
    assert!(!validate_password_strength("KEPLER-452B!", &strict));
    assert!(!validate_password_strength("Kepler-abcd!", &strict));
    assert!(!validate_password_strength("Kepler452bX", &strict));
    assert!(!validate_password_strength("K-1b!", &strict));
    assert!(!validate_password_strength(&"Ab1!".repeat(6), &strict));
}
