use uuid::Uuid;

/// Short random id for a new block: the first 8 hex digits of a v4 UUID.
pub fn new_block_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Id for a new draft document.
pub fn new_document_id() -> String {
    new_block_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_short_hex_and_distinct() {
        let a = new_block_id();
        let b = new_block_id();
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
