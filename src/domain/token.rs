/// Length of a share token
pub const TOKEN_LEN: usize = 8;

const MAX_ATTEMPTS: usize = 16;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a short lowercase alphanumeric share token.
///
/// Draws from the random bits of a v4 UUID, so the only side effect is
/// consuming the system randomness source.
pub fn generate_token() -> String {
    let mut bits = uuid::Uuid::new_v4().as_u128();
    let mut token = String::with_capacity(TOKEN_LEN);
    for _ in 0..TOKEN_LEN {
        token.push(ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
    }
    token
}

/// Generate a token not already taken according to `exists`.
///
/// Retries on collision; after `MAX_ATTEMPTS` collisions in a row it falls
/// back to a full UUID.
pub fn generate_unique_token<F>(exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate_token();
        if !exists(&candidate) {
            return candidate;
        }
        tracing::debug!(token = %candidate, "share token collision, retrying");
    }

    uuid::Uuid::new_v4().simple().to_string()
}
