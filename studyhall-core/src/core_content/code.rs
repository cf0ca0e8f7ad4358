//! Short human-shareable code generation
//!
//! Codes identify classrooms and live video sessions. They are join codes,
//! not credentials: uppercase alphanumeric, fixed length, no structural
//! uniqueness guarantee. Callers enforce uniqueness with a check-then-retry
//! loop bounded at [`CODE_RETRY_BUDGET`] and surface
//! `CodeGenerationExhausted` when the budget runs out.

use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every generated code
pub const CODE_LEN: usize = 6;

/// How many collision retries a caller gets before giving up
pub const CODE_RETRY_BUDGET: usize = 5;

/// Generate one candidate code
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
