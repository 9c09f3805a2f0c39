//! Identifier generation for uuid, timeuuid and nanoid fields.

use rand::Rng;
use uuid::Uuid;

/// URL-safe alphabet used for nanoids.
pub const NANOID_ALPHABET: &[u8; 64] =
    b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

/// Default nanoid length.
pub const DEFAULT_NANOID_LENGTH: usize = 21;

pub(super) fn random_node_id() -> [u8; 6] {
    rand::random()
}

pub(super) fn random_uuid() -> Uuid {
    Uuid::new_v4()
}

pub(super) fn time_uuid(node_id: &[u8; 6]) -> Uuid {
    Uuid::now_v1(node_id)
}

pub(super) fn nanoid(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| NANOID_ALPHABET[rng.gen_range(0..NANOID_ALPHABET.len())] as char)
        .collect()
}
