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
use serde::Serialize;
use std::fmt;
use std::io::IoSlice;

use crate::mqtt::packet::packet_type::PacketType;
use crate::mqtt::packet::v5_0;
use crate::mqtt::result_code::MqttError;

/// Sum type over every MQTT v5.0 control packet.
///
/// [`Packet::parse`] dispatches a reassembled frame (fixed-header byte plus
/// body) to the right typed parser, after checking that the flags nibble
/// carries the value the packet type mandates. Serialization delegates to
/// the contained packet.
#[derive(PartialEq, Eq, Clone, Serialize)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum Packet {
    Connect(v5_0::Connect),
    Connack(v5_0::Connack),
    Publish(v5_0::Publish),
    Puback(v5_0::Puback),
    Pubrec(v5_0::Pubrec),
    Pubrel(v5_0::Pubrel),
    Pubcomp(v5_0::Pubcomp),
    Subscribe(v5_0::Subscribe),
    Suback(v5_0::Suback),
    Unsubscribe(v5_0::Unsubscribe),
    Unsuback(v5_0::Unsuback),
    Pingreq(v5_0::Pingreq),
    Pingresp(v5_0::Pingresp),
    Disconnect(v5_0::Disconnect),
    Auth(v5_0::Auth),
}

macro_rules! packet_dispatch {
    ($self:ident, $p:ident => $body:expr) => {
        match $self {
            Packet::Connect($p) => $body,
            Packet::Connack($p) => $body,
            Packet::Publish($p) => $body,
            Packet::Puback($p) => $body,
            Packet::Pubrec($p) => $body,
            Packet::Pubrel($p) => $body,
            Packet::Pubcomp($p) => $body,
            Packet::Subscribe($p) => $body,
            Packet::Suback($p) => $body,
            Packet::Unsubscribe($p) => $body,
            Packet::Unsuback($p) => $body,
            Packet::Pingreq($p) => $body,
            Packet::Pingresp($p) => $body,
            Packet::Disconnect($p) => $body,
            Packet::Auth($p) => $body,
        }
    };
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Connect(_) => PacketType::Connect,
            Packet::Connack(_) => PacketType::Connack,
            Packet::Publish(_) => PacketType::Publish,
            Packet::Puback(_) => PacketType::Puback,
            Packet::Pubrec(_) => PacketType::Pubrec,
            Packet::Pubrel(_) => PacketType::Pubrel,
            Packet::Pubcomp(_) => PacketType::Pubcomp,
            Packet::Subscribe(_) => PacketType::Subscribe,
            Packet::Suback(_) => PacketType::Suback,
            Packet::Unsubscribe(_) => PacketType::Unsubscribe,
            Packet::Unsuback(_) => PacketType::Unsuback,
            Packet::Pingreq(_) => PacketType::Pingreq,
            Packet::Pingresp(_) => PacketType::Pingresp,
            Packet::Disconnect(_) => PacketType::Disconnect,
            Packet::Auth(_) => PacketType::Auth,
        }
    }

    /// Total packet size on the wire.
    pub fn size(&self) -> usize {
        packet_dispatch!(self, p => p.size())
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        packet_dispatch!(self, p => p.to_buffers())
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        packet_dispatch!(self, p => p.to_continuous_buffer())
    }

    /// Parse a complete frame from its fixed-header byte and body.
    ///
    /// The flags nibble is checked against the value the type mandates
    /// (0b0010 for PUBREL/SUBSCRIBE/UNSUBSCRIBE, zero elsewhere); PUBLISH
    /// flags are handed to the PUBLISH parser instead.
    pub fn parse(fixed_header: u8, body: &[u8]) -> Result<Packet, MqttError> {
        let packet_type =
            PacketType::try_from(fixed_header >> 4).map_err(|_| MqttError::MalformedPacket)?;
        let flags = fixed_header & 0x0F;
        if let Some(expected) = packet_type.expected_flags() {
            if flags != expected {
                return Err(MqttError::MalformedPacket);
            }
        }

        let packet = match packet_type {
            PacketType::Connect => Packet::Connect(v5_0::Connect::parse(body)?.0),
            PacketType::Connack => Packet::Connack(v5_0::Connack::parse(body)?.0),
            PacketType::Publish => Packet::Publish(v5_0::Publish::parse(fixed_header, body)?.0),
            PacketType::Puback => Packet::Puback(v5_0::Puback::parse(body)?.0),
            PacketType::Pubrec => Packet::Pubrec(v5_0::Pubrec::parse(body)?.0),
            PacketType::Pubrel => Packet::Pubrel(v5_0::Pubrel::parse(body)?.0),
            PacketType::Pubcomp => Packet::Pubcomp(v5_0::Pubcomp::parse(body)?.0),
            PacketType::Subscribe => Packet::Subscribe(v5_0::Subscribe::parse(body)?.0),
            PacketType::Suback => Packet::Suback(v5_0::Suback::parse(body)?.0),
            PacketType::Unsubscribe => Packet::Unsubscribe(v5_0::Unsubscribe::parse(body)?.0),
            PacketType::Unsuback => Packet::Unsuback(v5_0::Unsuback::parse(body)?.0),
            PacketType::Pingreq => Packet::Pingreq(v5_0::Pingreq::parse(body)?.0),
            PacketType::Pingresp => Packet::Pingresp(v5_0::Pingresp::parse(body)?.0),
            PacketType::Disconnect => Packet::Disconnect(v5_0::Disconnect::parse(body)?.0),
            PacketType::Auth => Packet::Auth(v5_0::Auth::parse(body)?.0),
        };
        Ok(packet)
    }
}

macro_rules! packet_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Packet {
            fn from(p: $ty) -> Self {
                Packet::$variant(p)
            }
        }
    };
}

packet_from!(Connect, v5_0::Connect);
packet_from!(Connack, v5_0::Connack);
packet_from!(Publish, v5_0::Publish);
packet_from!(Puback, v5_0::Puback);
packet_from!(Pubrec, v5_0::Pubrec);
packet_from!(Pubrel, v5_0::Pubrel);
packet_from!(Pubcomp, v5_0::Pubcomp);
packet_from!(Subscribe, v5_0::Subscribe);
packet_from!(Suback, v5_0::Suback);
packet_from!(Unsubscribe, v5_0::Unsubscribe);
packet_from!(Unsuback, v5_0::Unsuback);
packet_from!(Pingreq, v5_0::Pingreq);
packet_from!(Pingresp, v5_0::Pingresp);
packet_from!(Disconnect, v5_0::Disconnect);
packet_from!(Auth, v5_0::Auth);

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        packet_dispatch!(self, p => write!(f, "{p}"))
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
