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

/// MQTT binary data: an owned byte blob plus its pre-encoded 2-byte
/// big-endian length prefix.
///
/// Same shape as [`super::MqttString`] without the UTF-8 requirement. Used
/// for passwords, correlation data, authentication data and will payloads.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct MqttBinary {
    value: Vec<u8>,
    length_buf: [u8; 2],
}

impl MqttBinary {
    /// Maximum number of encoded bytes a blob may hold.
    pub const MAX_SIZE: usize = 65535;

    pub fn new(value: impl Into<Vec<u8>>) -> Result<Self, MqttError> {
        let value = value.into();
        if value.len() > Self::MAX_SIZE {
            return Err(MqttError::ValueOutOfRange);
        }
        let length_buf = (value.len() as u16).to_be_bytes();
        Ok(Self { value, length_buf })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.value
    }

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
        vec![IoSlice::new(&self.length_buf), IoSlice::new(&self.value)]
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.length_buf);
        buf.extend_from_slice(&self.value);
        buf
    }

    /// Decode a length-prefixed blob, returning the value and the number of
    /// bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), MqttError> {
        if data.len() < 2 {
            return Err(MqttError::InsufficientBytes);
        }
        let len = u16::from_be_bytes([data[0], data[1]]) as usize;
        if data.len() < 2 + len {
            return Err(MqttError::InsufficientBytes);
        }
        Ok((
            Self {
                value: data[2..2 + len].to_vec(),
                length_buf: [data[0], data[1]],
            },
            2 + len,
        ))
    }
}

impl AsRef<[u8]> for MqttBinary {
    fn as_ref(&self) -> &[u8] {
        &self.value
    }
}

impl TryFrom<&[u8]> for MqttBinary {
    type Error = MqttError;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::new(value.to_vec())
    }
}

impl Serialize for MqttBinary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.value)
    }
}

impl fmt::Display for MqttBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.value.len())
    }
}

impl fmt::Debug for MqttBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x?}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let b = MqttBinary::new(vec![1, 2, 3]).unwrap();
        let encoded = b.to_continuous_buffer();
        assert_eq!(encoded, [0x00, 0x03, 1, 2, 3]);
        let (decoded, consumed) = MqttBinary::decode(&encoded).unwrap();
        assert_eq!(decoded, b);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn empty_blob() {
        let b = MqttBinary::new(Vec::new()).unwrap();
        assert_eq!(b.to_continuous_buffer(), [0x00, 0x00]);
        assert_eq!(b.size(), 2);
    }
}
