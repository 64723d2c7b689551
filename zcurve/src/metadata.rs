/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use crate::proto::*;
use crate::result::{FaultType, OpenError};

/// An ordered list of `(name, value)` properties exchanged in INITIATE and READY.
///
/// On the wire each property is a one byte name length, the name, a four byte big-endian value
/// length and the value. Names follow the ZMTP property rules: 1 to 255 characters from
/// `[A-Za-z0-9.+_-]`, compared case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Metadata(Vec<(String, Vec<u8>)>);

fn is_valid_name(name: &[u8]) -> bool {
    !name.is_empty()
        && name.len() <= METADATA_NAME_MAX_SIZE
        && name
            .iter()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'.' | b'+' | b'_' | b'-'))
}

impl Metadata {
    /// Create empty metadata.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a property. Order is preserved on the wire.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.0.push((name.into(), value.into()));
        self
    }

    /// Builder form of `push`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.push(name, value);
        self
    }

    /// The value of the first property called `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// The value of the first property called `name`, if it is valid UTF-8.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of bytes `encode` will produce.
    pub fn encoded_len(&self) -> usize {
        self.0
            .iter()
            .map(|(n, v)| 1 + n.len() + METADATA_VALUE_LEN_SIZE + v.len())
            .sum()
    }

    /// Serialize to the wire format, checking every name and every value length.
    pub fn encode(&self) -> Result<Vec<u8>, OpenError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        for (name, value) in &self.0 {
            if !is_valid_name(name.as_bytes()) {
                return Err(OpenError::InvalidMetadata);
            }
            let value_len = u32::try_from(value.len()).map_err(|_| OpenError::MetadataTooLarge)?;
            out.push(name.len() as u8);
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&value_len.to_be_bytes());
            out.extend_from_slice(value);
        }
        Ok(out)
    }

    /// Parse the wire format. Trailing partial properties and invalid names are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, FaultType> {
        use FaultType::MalformedCommand;
        let mut properties = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let name_len = bytes[i] as usize;
            i += 1;
            let j = i + name_len;
            if j + METADATA_VALUE_LEN_SIZE > bytes.len() || !is_valid_name(&bytes[i..j]) {
                return Err(MalformedCommand);
            }
            // `is_valid_name` only admits ASCII.
            let name = String::from_utf8(bytes[i..j].to_vec()).map_err(|_| MalformedCommand)?;
            let k = j + METADATA_VALUE_LEN_SIZE;
            let value_len = u32::from_be_bytes([bytes[j], bytes[j + 1], bytes[j + 2], bytes[j + 3]]) as usize;
            if value_len > bytes.len() - k {
                return Err(MalformedCommand);
            }
            i = k + value_len;
            properties.push((name, bytes[k..i].to_vec()));
        }
        Ok(Self(properties))
    }
}

impl<N: Into<String>, V: Into<Vec<u8>>> FromIterator<(N, V)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_format() {
        let metadata = Metadata::new().with("Socket-Type", "DEALER").with("Identity", "");
        let bytes = metadata.encode().unwrap();
        let mut expected = vec![11u8];
        expected.extend_from_slice(b"Socket-Type");
        expected.extend_from_slice(&[0, 0, 0, 6]);
        expected.extend_from_slice(b"DEALER");
        expected.push(8);
        expected.extend_from_slice(b"Identity");
        expected.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(bytes, expected);
        assert_eq!(metadata.encoded_len(), expected.len());
        assert_eq!(Metadata::decode(&bytes).unwrap(), metadata);
    }

    #[test]
    fn lookup_ignores_case_and_keeps_order() {
        let metadata: Metadata = [("User-Id", "alice"), ("user-id", "bob")].into_iter().collect();
        assert_eq!(metadata.get_str("USER-ID"), Some("alice"));
        assert_eq!(metadata.iter().map(|(_, v)| v).collect::<Vec<_>>(), vec![&b"alice"[..], &b"bob"[..]]);
        assert_eq!(metadata.get("missing"), None);
    }

    #[test]
    fn empty_decodes_to_empty() {
        assert!(Metadata::decode(&[]).unwrap().is_empty());
        assert!(Metadata::new().encode().unwrap().is_empty());
    }

    #[test]
    fn rejects_truncated_properties() {
        let bytes = Metadata::new().with("Name", "value").encode().unwrap();
        for end in 1..bytes.len() {
            assert_eq!(Metadata::decode(&bytes[..end]), Err(FaultType::MalformedCommand), "end {}", end);
        }
    }

    #[test]
    fn rejects_bad_names() {
        assert_eq!(Metadata::decode(&[0, 0, 0, 0, 0]), Err(FaultType::MalformedCommand));
        assert_eq!(Metadata::decode(&[1, b' ', 0, 0, 0, 0]), Err(FaultType::MalformedCommand));
        assert_eq!(Metadata::new().with("", "x").encode(), Err(OpenError::InvalidMetadata));
        assert_eq!(Metadata::new().with("a b", "x").encode(), Err(OpenError::InvalidMetadata));
        assert_eq!(Metadata::new().with("n".repeat(256), "x").encode(), Err(OpenError::InvalidMetadata));
        assert!(Metadata::new().with("n".repeat(255), "x").encode().is_ok());
    }

    #[test]
    fn rejects_oversized_value_length() {
        let mut bytes = vec![1, b'a'];
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(b"short");
        assert_eq!(Metadata::decode(&bytes), Err(FaultType::MalformedCommand));
    }
}
