//! Key material generation.

use gridgate_core::{TopologyError, TopologyResult};

const KEY_BYTES: usize = 16;

/// Generate a gateway key: `sk-` followed by 128 bits of OS randomness in hex.
pub fn generate_key() -> TopologyResult<String> {
    let mut buf = [0u8; KEY_BYTES];
    getrandom::getrandom(&mut buf)
        .map_err(|e| TopologyError::provisioning(format!("getrandom failed: {e}")))?;
    Ok(format!("sk-{}", hex::encode(buf)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_shape() {
        let key = generate_key().unwrap();
        assert!(key.starts_with("sk-"));
        assert_eq!(key.len(), 3 + KEY_BYTES * 2);
        assert!(key[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn keys_do_not_repeat() {
        let keys: HashSet<String> = (0..64).map(|_| generate_key().unwrap()).collect();
        assert_eq!(keys.len(), 64);
    }
}
