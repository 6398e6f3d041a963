use rand::Rng;

/// Generates a cryptographically secure 40-character hex service token
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();
    hex::encode(bytes)
}

/// Validates token format (40 lowercase hex chars)
pub fn is_valid_token_format(token: &str) -> bool {
    token.len() == 40
        && token
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_uppercase())
}
