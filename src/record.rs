//! RecordKey: the key-extraction capability a stored record type provides.

/// Key extraction for records stored in a [`HashIndex`](crate::HashIndex).
///
/// Keys may be variable-length: any byte slice the record can produce. The
/// index never copies key bytes; it hashes and compares them in place through
/// the active collation.
pub trait RecordKey {
    /// The record's current key bytes.
    fn key(&self) -> &[u8];

    /// Key bytes to use while the record is being unlinked.
    ///
    /// Records that derive their key from state torn down ahead of removal
    /// can serve a cached copy here instead. Defaults to [`key`](Self::key).
    fn removal_key(&self) -> &[u8] {
        self.key()
    }
}

/// Byte-buffer record whose key occupies the fixed range `OFF..OFF + LEN`.
///
/// Covers the common "key at a constant offset inside every record" case
/// without a custom `RecordKey` impl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedKeyed<const OFF: usize, const LEN: usize>(pub Vec<u8>);

impl<const OFF: usize, const LEN: usize> RecordKey for FixedKeyed<OFF, LEN> {
    fn key(&self) -> &[u8] {
        &self.0[OFF..OFF + LEN]
    }
}

impl RecordKey for Vec<u8> {
    fn key(&self) -> &[u8] {
        self
    }
}

impl RecordKey for String {
    fn key(&self) -> &[u8] {
        self.as_bytes()
    }
}
