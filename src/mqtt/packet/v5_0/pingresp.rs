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
use std::fmt;
use std::io::IoSlice;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::mqtt::packet::packet_type::{FixedHeader, PacketType};
use crate::mqtt::result_code::MqttError;

/// PINGRESP packet: the broker's answer to a PINGREQ.
///
/// No variable header and no payload; the whole packet is the two bytes
/// `0xD0 0x00`. The client consumes it silently, it only refreshes the
/// keep-alive bookkeeping.
#[derive(PartialEq, Eq, Clone)]
pub struct Pingresp {
    all: [u8; 2],
}

impl Pingresp {
    pub fn new() -> Self {
        Self {
            all: [FixedHeader::Pingresp.as_u8(), 0x00],
        }
    }

    pub fn packet_type() -> PacketType {
        PacketType::Pingresp
    }

    pub fn size(&self) -> usize {
        2
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        vec![IoSlice::new(&self.all)]
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        self.all.to_vec()
    }

    /// Parse the (empty) packet body.
    pub fn parse(data: &[u8]) -> Result<(Self, usize), MqttError> {
        if !data.is_empty() {
            return Err(MqttError::MalformedPacket);
        }
        Ok((Self::new(), 0))
    }
}

impl Default for Pingresp {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Pingresp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("pingresp", 1)?;
        state.serialize_field("type", PacketType::Pingresp.as_str())?;
        state.end()
    }
}

impl fmt::Display for Pingresp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Pingresp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
