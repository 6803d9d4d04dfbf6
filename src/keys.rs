//! License key generation and normalization.
//!
//! Canonical format: `PREFIX-XXXX-XXXX-XXXX` using an unambiguous uppercase
//! alphabet (no 0/O, no 1/I). Keys are generated server-side, stored
//! uppercase, and compared case-insensitively.

use rand::Rng;

/// Unambiguous uppercase alphanumeric alphabet, 32 symbols.
pub const KEY_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const GROUP_LEN: usize = 4;
const GROUP_COUNT: usize = 3;

/// Bounded retries when a generated key collides with an existing row.
pub const KEY_GENERATION_ATTEMPTS: u32 = 10;

/// Generate a license key: `PREFIX-XXXX-XXXX-XXXX` (60 bits entropy).
pub fn generate_license_key(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let chars: Vec<char> = KEY_ALPHABET.chars().collect();

    let mut part = || -> String {
        (0..GROUP_LEN)
            .map(|_| chars[rng.gen_range(0..chars.len())])
            .collect()
    };

    format!("{}-{}-{}-{}", prefix, part(), part(), part())
}

/// Normalize a user-supplied key to canonical storage form.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Cheap format check to reject garbage before hitting the store.
///
/// Accepts a normalized key: non-empty prefix followed by three groups of
/// four characters from the key alphabet.
pub fn is_valid_key(key: &str) -> bool {
    let parts: Vec<&str> = key.split('-').collect();
    if parts.len() != GROUP_COUNT + 1 {
        return false;
    }
    if parts[0].is_empty() {
        return false;
    }
    parts[1..]
        .iter()
        .all(|group| group.len() == GROUP_LEN && group.chars().all(|c| KEY_ALPHABET.contains(c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_canonical_format() {
        let key = generate_license_key("DASHY");
        assert!(key.starts_with("DASHY-"));
        // DASHY- (6) + 4 + 1 + 4 + 1 + 4 = 20 chars
        assert_eq!(key.len(), 20);
        assert!(is_valid_key(&key));
    }

    #[test]
    fn alphabet_excludes_ambiguous_characters() {
        for c in ['0', 'O', '1', 'I'] {
            assert!(!KEY_ALPHABET.contains(c), "alphabet must not contain {}", c);
        }
    }

    #[test]
    fn generated_keys_are_unique() {
        let a = generate_license_key("DASHY");
        let b = generate_license_key("DASHY");
        assert_ne!(a, b);
    }

    #[test]
    fn normalization_uppercases_and_trims() {
        assert_eq!(
            normalize_key("  dashy-ab12-cd34-ef56 "),
            "DASHY-AB12-CD34-EF56"
        );
    }

    #[test]
    fn format_validation() {
        assert!(is_valid_key("DASHY-AB22-CD34-EF56"));
        assert!(is_valid_key(&generate_license_key("PC")));

        assert!(!is_valid_key(""));
        assert!(!is_valid_key("DASHY-AB12-CD34")); // too few groups
        assert!(!is_valid_key("DASHY-AB12-CD34-EF56-GH78")); // too many
        assert!(!is_valid_key("-AB12-CD34-EF56")); // empty prefix
        assert!(!is_valid_key("DASHY-AB1-CD34-EF56")); // short group
        assert!(!is_valid_key("DASHY-AB10-CD34-EF56")); // '0' not in alphabet
        assert!(!is_valid_key("DASHY-ab12-cd34-ef56")); // not normalized
    }
}
