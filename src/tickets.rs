//! Ticket ID generation.
//!
//! Ticket IDs are `"F"` followed by 5 random uppercase alphanumerics. The
//! space is small enough that collisions are possible; callers retry on a
//! primary-key conflict rather than assuming uniqueness.

use rand::Rng;

const TICKET_PREFIX: char = 'F';
const TICKET_SUFFIX_LEN: usize = 5;
const TICKET_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[must_use]
pub fn generate_ticket_id() -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(1 + TICKET_SUFFIX_LEN);
    id.push(TICKET_PREFIX);
    for _ in 0..TICKET_SUFFIX_LEN {
        let idx = rng.gen_range(0..TICKET_CHARSET.len());
        id.push(TICKET_CHARSET[idx] as char);
    }
    id
}

#[must_use]
pub fn is_valid_ticket_id(id: &str) -> bool {
    let mut chars = id.chars();
    if chars.next() != Some(TICKET_PREFIX) {
        return false;
    }
    let suffix: Vec<char> = chars.collect();
    suffix.len() == TICKET_SUFFIX_LEN
        && suffix
            .iter()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
