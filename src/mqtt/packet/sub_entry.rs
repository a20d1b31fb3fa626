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
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;
use std::io::IoSlice;

use crate::mqtt::packet::mqtt_string::MqttString;
use crate::mqtt::packet::qos::Qos;
use crate::mqtt::packet::retain_handling::RetainHandling;
use crate::mqtt::result_code::MqttError;

/// MQTT Subscription Options
///
/// The options byte of each SUBSCRIBE payload entry:
///
/// ```text
/// Bit:  7  6  5  4  3  2  1  0
///      [Reserved] [RH] [RAP][NL][QoS]
/// ```
///
/// Bits 6-7 are reserved and must be zero; `from_u8` rejects reserved bits,
/// the QoS value 3 and the retain-handling value 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SubOpts {
    sub_opts_buf: [u8; 1],
}

impl SubOpts {
    /// Options with every field zero: QoS 0, no flags, send retained.
    pub fn new() -> Self {
        Self { sub_opts_buf: [0] }
    }

    /// Parse and validate an options byte.
    pub fn from_u8(value: u8) -> Result<Self, MqttError> {
        if value & 0b1100_0000 != 0 {
            return Err(MqttError::MalformedPacket);
        }
        Qos::try_from(value & 0b0000_0011).map_err(|_| MqttError::MalformedPacket)?;
        RetainHandling::try_from((value >> 4) & 0b0000_0011)
            .map_err(|_| MqttError::MalformedPacket)?;
        Ok(Self {
            sub_opts_buf: [value],
        })
    }

    pub fn as_u8(&self) -> u8 {
        self.sub_opts_buf[0]
    }

    /// Maximum QoS the broker may use when forwarding to this subscription.
    pub fn set_qos(mut self, qos: Qos) -> Self {
        self.sub_opts_buf[0] = (self.sub_opts_buf[0] & !0b0000_0011) | qos as u8;
        self
    }

    /// No Local: do not forward messages published by this client itself.
    pub fn set_nl(mut self, nl: bool) -> Self {
        if nl {
            self.sub_opts_buf[0] |= 0b0000_0100;
        } else {
            self.sub_opts_buf[0] &= !0b0000_0100;
        }
        self
    }

    /// Retain As Published: keep the retain flag of forwarded messages.
    pub fn set_rap(mut self, rap: bool) -> Self {
        if rap {
            self.sub_opts_buf[0] |= 0b0000_1000;
        } else {
            self.sub_opts_buf[0] &= !0b0000_1000;
        }
        self
    }

    /// Retain Handling: whether retained messages are sent on subscribe.
    pub fn set_rh(mut self, rh: RetainHandling) -> Self {
        self.sub_opts_buf[0] = (self.sub_opts_buf[0] & !0b0011_0000) | ((rh as u8) << 4);
        self
    }

    pub fn qos(&self) -> Qos {
        // Validated at construction.
        Qos::try_from(self.sub_opts_buf[0] & 0b0000_0011).unwrap()
    }

    pub fn nl(&self) -> bool {
        self.sub_opts_buf[0] & 0b0000_0100 != 0
    }

    pub fn rap(&self) -> bool {
        self.sub_opts_buf[0] & 0b0000_1000 != 0
    }

    pub fn rh(&self) -> RetainHandling {
        RetainHandling::try_from((self.sub_opts_buf[0] >> 4) & 0b0000_0011).unwrap()
    }
}

impl Serialize for SubOpts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("sub_opts", 4)?;
        state.serialize_field("qos", &self.qos())?;
        state.serialize_field("nl", &self.nl())?;
        state.serialize_field("rap", &self.rap())?;
        state.serialize_field("rh", &self.rh())?;
        state.end()
    }
}

/// One SUBSCRIBE payload entry: a topic filter and its subscription
/// options.
///
/// Filters may contain `+` and `#` wildcards; positional validity is left
/// to the broker, the encoder only enforces the string limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubEntry {
    topic_filter: MqttString,
    sub_opts: SubOpts,
}

impl SubEntry {
    pub fn new(topic_filter: impl Into<String>, sub_opts: SubOpts) -> Result<Self, MqttError> {
        let topic_filter = MqttString::new(topic_filter)?;
        if topic_filter.is_empty() {
            return Err(MqttError::MalformedPacket);
        }
        Ok(Self {
            topic_filter,
            sub_opts,
        })
    }

    pub fn topic_filter(&self) -> &str {
        self.topic_filter.as_str()
    }

    pub fn sub_opts(&self) -> SubOpts {
        self.sub_opts
    }

    /// Wire size: filter string plus one options byte.
    pub fn size(&self) -> usize {
        self.topic_filter.size() + 1
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        let mut bufs = self.topic_filter.to_buffers();
        bufs.push(IoSlice::new(&self.sub_opts.sub_opts_buf));
        bufs
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = self.topic_filter.to_continuous_buffer();
        buf.push(self.sub_opts.as_u8());
        buf
    }

    pub fn parse(data: &[u8]) -> Result<(Self, usize), MqttError> {
        let (topic_filter, consumed) = MqttString::decode(data)?;
        if consumed >= data.len() {
            return Err(MqttError::InsufficientBytes);
        }
        let sub_opts = SubOpts::from_u8(data[consumed])?;
        Ok((
            Self {
                topic_filter,
                sub_opts,
            },
            consumed + 1,
        ))
    }
}

impl Serialize for SubEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("sub_entry", 2)?;
        state.serialize_field("topic_filter", self.topic_filter())?;
        state.serialize_field("sub_opts", &self.sub_opts)?;
        state.end()
    }
}

impl fmt::Display for SubEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_bit_layout() {
        let opts = SubOpts::new()
            .set_qos(Qos::AtLeastOnce)
            .set_nl(true)
            .set_rap(true)
            .set_rh(RetainHandling::DoNotSendRetained);
        assert_eq!(opts.as_u8(), 0b0010_1101);
        assert_eq!(opts.qos(), Qos::AtLeastOnce);
        assert!(opts.nl());
        assert!(opts.rap());
        assert_eq!(opts.rh(), RetainHandling::DoNotSendRetained);
    }

    #[test]
    fn reserved_bits_rejected() {
        assert!(SubOpts::from_u8(0b0100_0000).is_err());
        assert!(SubOpts::from_u8(0b0000_0011).is_err()); // QoS 3
        assert!(SubOpts::from_u8(0b0011_0000).is_err()); // RH 3
        assert!(SubOpts::from_u8(0b0010_1101).is_ok());
    }

    #[test]
    fn entry_round_trip() {
        let entry = SubEntry::new("a/+/b", SubOpts::new().set_qos(Qos::ExactlyOnce)).unwrap();
        let bytes = entry.to_continuous_buffer();
        let (parsed, consumed) = SubEntry::parse(&bytes).unwrap();
        assert_eq!(parsed, entry);
        assert_eq!(consumed, bytes.len());
        assert_eq!(consumed, entry.size());
    }
}
