/**
 * MIT License
 *
 * Copyright (c) 2025 Takatoshi Kondo
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::IoSlice;

use crate::mqtt::result_code::MqttError;

/// MQTT UTF-8 string: owned text plus its pre-encoded 2-byte big-endian
/// length prefix.
///
/// The prefix is computed once at construction so serialization is a pair
/// of buffer copies. The MQTT limit of 65 535 encoded bytes is enforced by
/// [`MqttString::new`], and [`MqttString::decode`] rejects bytes that are
/// not valid UTF-8.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct MqttString {
    value: String,
    length_buf: [u8; 2],
}

impl MqttString {
    /// Maximum number of encoded bytes a string may hold.
    pub const MAX_SIZE: usize = 65535;

    pub fn new(value: impl Into<String>) -> Result<Self, MqttError> {
        let value = value.into();
        if value.len() > Self::MAX_SIZE {
            return Err(MqttError::ValueOutOfRange);
        }
        let length_buf = (value.len() as u16).to_be_bytes();
        Ok(Self { value, length_buf })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Number of encoded payload bytes (without the length prefix).
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Total wire size: prefix plus payload.
    pub fn size(&self) -> usize {
        2 + self.value.len()
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        vec![
            IoSlice::new(&self.length_buf),
            IoSlice::new(self.value.as_bytes()),
        ]
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.length_buf);
        buf.extend_from_slice(self.value.as_bytes());
        buf
    }

    /// Decode a length-prefixed string, returning the value and the number
    /// of bytes consumed.
    ///
    /// Short input yields `InsufficientBytes` so length-aware callers can
    /// distinguish truncation from corruption; invalid UTF-8 is
    /// `MalformedPacket`.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), MqttError> {
        if data.len() < 2 {
            return Err(MqttError::InsufficientBytes);
        }
        let len = u16::from_be_bytes([data[0], data[1]]) as usize;
        if data.len() < 2 + len {
            return Err(MqttError::InsufficientBytes);
        }
        let value = core::str::from_utf8(&data[2..2 + len])
            .map_err(|_| MqttError::MalformedPacket)?
            .to_owned();
        Ok((
            Self {
                value,
                length_buf: [data[0], data[1]],
            },
            2 + len,
        ))
    }
}

impl AsRef<str> for MqttString {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl TryFrom<&str> for MqttString {
    type Error = MqttError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for MqttString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

impl fmt::Display for MqttString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Debug for MqttString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let s = MqttString::new("a/b").unwrap();
        let encoded = s.to_continuous_buffer();
        assert_eq!(encoded, [0x00, 0x03, b'a', b'/', b'b']);
        let (decoded, consumed) = MqttString::decode(&encoded).unwrap();
        assert_eq!(decoded, s);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn truncated_input_is_insufficient() {
        let encoded = MqttString::new("hello").unwrap().to_continuous_buffer();
        for k in 0..encoded.len() {
            assert_eq!(
                MqttString::decode(&encoded[..k]).unwrap_err(),
                MqttError::InsufficientBytes,
                "prefix of length {k}"
            );
        }
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let bad = [0x00, 0x02, 0xC3, 0x28];
        assert_eq!(
            MqttString::decode(&bad).unwrap_err(),
            MqttError::MalformedPacket
        );
    }
}
