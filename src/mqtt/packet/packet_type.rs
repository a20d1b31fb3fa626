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
use num_enum::TryFromPrimitive;
use serde::{Serialize, Serializer};
use std::fmt;

/// MQTT Control Packet Type enumeration
///
/// Bits 7-4 of the Fixed Header's first byte. Each variant maps to its
/// numeric value as defined in the MQTT v5.0 protocol.
#[derive(PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum PacketType {
    /// Client connection request packet
    Connect = 1,
    /// Server connection acknowledgment packet
    Connack = 2,
    /// Publish message packet (QoS 0, 1, 2)
    Publish = 3,
    /// Publish acknowledgment packet (QoS 1)
    Puback = 4,
    /// Publish received packet (QoS 2, step 1)
    Pubrec = 5,
    /// Publish release packet (QoS 2, step 2)
    Pubrel = 6,
    /// Publish complete packet (QoS 2, step 3)
    Pubcomp = 7,
    /// Client subscription request packet
    Subscribe = 8,
    /// Server subscription acknowledgment packet
    Suback = 9,
    /// Client unsubscription request packet
    Unsubscribe = 10,
    /// Server unsubscription acknowledgment packet
    Unsuback = 11,
    /// Ping request packet (keep-alive)
    Pingreq = 12,
    /// Ping response packet (keep-alive)
    Pingresp = 13,
    /// Disconnect notification packet
    Disconnect = 14,
    /// Authentication exchange packet
    Auth = 15,
}

impl PacketType {
    /// Numeric value of the packet type (the high nibble, unshifted).
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PacketType::Connect => "connect",
            PacketType::Connack => "connack",
            PacketType::Publish => "publish",
            PacketType::Puback => "puback",
            PacketType::Pubrec => "pubrec",
            PacketType::Pubrel => "pubrel",
            PacketType::Pubcomp => "pubcomp",
            PacketType::Subscribe => "subscribe",
            PacketType::Suback => "suback",
            PacketType::Unsubscribe => "unsubscribe",
            PacketType::Unsuback => "unsuback",
            PacketType::Pingreq => "pingreq",
            PacketType::Pingresp => "pingresp",
            PacketType::Disconnect => "disconnect",
            PacketType::Auth => "auth",
        }
    }

    /// Flags nibble this packet type requires in its fixed header.
    ///
    /// PUBLISH carries real flags (DUP/QoS/RETAIN) and has no fixed value;
    /// `None` is returned for it.
    pub fn expected_flags(&self) -> Option<u8> {
        match self {
            PacketType::Publish => None,
            PacketType::Pubrel | PacketType::Subscribe | PacketType::Unsubscribe => Some(0b0010),
            _ => Some(0b0000),
        }
    }
}

impl Serialize for PacketType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// MQTT Fixed Header first byte enumeration
///
/// The complete first byte of the Fixed Header: packet type in bits 7-4 and
/// packet-specific flags in bits 3-0. PUBREL, SUBSCRIBE and UNSUBSCRIBE
/// carry the mandatory reserved flags value 0b0010; PUBLISH is listed with
/// flags zero and gets DUP/QoS/RETAIN or'ed in by the packet builder.
#[derive(PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum FixedHeader {
    /// CONNECT packet header (0x10)
    Connect = 0x10,
    /// CONNACK packet header (0x20)
    Connack = 0x20,
    /// PUBLISH packet header (0x30) - flags for DUP, QoS, RETAIN in lower bits
    Publish = 0x30,
    /// PUBACK packet header (0x40)
    Puback = 0x40,
    /// PUBREC packet header (0x50)
    Pubrec = 0x50,
    /// PUBREL packet header (0x62) - reserved bits set as required
    Pubrel = 0x62,
    /// PUBCOMP packet header (0x70)
    Pubcomp = 0x70,
    /// SUBSCRIBE packet header (0x82) - reserved bits set as required
    Subscribe = 0x82,
    /// SUBACK packet header (0x90)
    Suback = 0x90,
    /// UNSUBSCRIBE packet header (0xa2) - reserved bits set as required
    Unsubscribe = 0xa2,
    /// UNSUBACK packet header (0xb0)
    Unsuback = 0xb0,
    /// PINGREQ packet header (0xc0)
    Pingreq = 0xc0,
    /// PINGRESP packet header (0xd0)
    Pingresp = 0xd0,
    /// DISCONNECT packet header (0xe0)
    Disconnect = 0xe0,
    /// AUTH packet header (0xf0)
    Auth = 0xf0,
}

impl FixedHeader {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Packet type encoded in the high nibble.
    pub fn packet_type(self) -> PacketType {
        // The nibble of every variant is a valid PacketType by construction.
        PacketType::try_from((self as u8) >> 4).unwrap()
    }
}

impl fmt::Debug for FixedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", *self as u8)
    }
}
