use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::AuthError;

pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;
const SCHEME: &str = "pbkdf2-sha256";

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut out = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, out.as_mut_slice());
    out
}

/// Hash a password as `pbkdf2-sha256$<iterations>$<salt>$<hash>`.
///
/// The iteration count travels with the hash, so raising it later does
/// not invalidate stored passwords.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = generate_salt();
    let hash = derive(password, &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash.as_slice())
    )
}

/// Run one derivation against a fixed salt and throw the result away.
///
/// Used when there is no stored hash to check, so a missing account costs
/// the same as a wrong password.
pub(crate) fn verify_without_hash(password: &str, iterations: u32) {
    let salt = [0u8; SALT_LENGTH];
    std::hint::black_box(derive(password, &salt, iterations.max(1)));
}

/// Check a password against a stored hash in constant time.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(AuthError::MalformedHash);
    };
    if scheme != SCHEME {
        return Err(AuthError::MalformedHash);
    }

    let iterations: u32 = iterations.parse().map_err(|_| AuthError::MalformedHash)?;
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| AuthError::MalformedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(expected)
        .map_err(|_| AuthError::MalformedHash)?;
    if expected.len() != HASH_LENGTH || iterations == 0 {
        return Err(AuthError::MalformedHash);
    }

    let actual = derive(password, &salt, iterations);
    Ok(bool::from(actual.as_slice().ct_eq(expected.as_slice())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("shortpassword", FAST);
        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("shortpassword", &stored).unwrap());
        assert!(!verify_password("wrong", &stored).unwrap());
    }

    #[test]
    fn verify_without_hash_accepts_any_iteration_count() {
        verify_without_hash("anything", FAST);
        verify_without_hash("anything", 0);
    }

    #[test]
    fn same_password_different_salts() {
        let a = hash_password("pw", FAST);
        let b = hash_password("pw", FAST);
        assert_ne!(a, b);
    }

    #[test]
    fn long_passwords_supported() {
        let long = "x".repeat(500);
        let stored = hash_password(&long, FAST);
        assert!(verify_password(&long, &stored).unwrap());
        assert!(!verify_password(&"x".repeat(499), &stored).unwrap());
    }

    #[test]
    fn malformed_hash_rejected() {
        for bad in [
            "",
            "plain",
            "md5$1$abc$def",
            "pbkdf2-sha256$x$abc$def",
            "pbkdf2-sha256$10$a$b$c",
        ] {
            assert!(matches!(verify_password("pw", bad), Err(AuthError::MalformedHash)));
        }
    }

    #[test]
    fn generate_salt_is_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
