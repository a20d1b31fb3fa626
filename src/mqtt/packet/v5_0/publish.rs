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

use derive_builder::Builder;
use getset::Getters;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::mqtt::common::Cursor;
use crate::mqtt::packet::mqtt_string::MqttString;
use crate::mqtt::packet::packet_type::{FixedHeader, PacketType};
use crate::mqtt::packet::property::{
    validate_properties_for, Properties, PropertiesParse, PropertiesSize, PropertiesToBuffers,
    PropertiesToContinuousBuffer,
};
use crate::mqtt::packet::qos::Qos;
use crate::mqtt::packet::variable_byte_integer::VariableByteInteger;
use crate::mqtt::result_code::MqttError;

/// PUBLISH packet: an application message in either direction.
///
/// The fixed-header flags nibble carries `{DUP, QoS(2b), RETAIN}`. The
/// variable header holds the topic name, a packet identifier when QoS is 1
/// or 2, and the property list; everything after the properties is the
/// opaque application payload.
#[derive(PartialEq, Eq, Builder, Clone, Getters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Publish {
    #[builder(private)]
    fixed_header: [u8; 1],
    #[builder(private)]
    remaining_length: VariableByteInteger,
    #[builder(private)]
    topic_name_buf: MqttString,
    #[builder(private)]
    packet_id_buf: Option<[u8; 2]>,
    #[builder(private)]
    property_length: VariableByteInteger,

    /// Properties of the application message.
    #[getset(get = "pub")]
    props: Properties,

    /// Opaque application payload.
    #[builder(setter(into))]
    payload: Vec<u8>,
}

impl Publish {
    pub fn builder() -> PublishBuilder {
        PublishBuilder::default()
    }

    pub fn packet_type() -> PacketType {
        PacketType::Publish
    }

    pub fn topic_name(&self) -> &str {
        self.topic_name_buf.as_str()
    }

    /// Packet identifier; present iff QoS >= 1.
    pub fn packet_id(&self) -> Option<u16> {
        self.packet_id_buf.map(u16::from_be_bytes)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn qos(&self) -> Qos {
        // The two QoS bits are validated at construction / parse time.
        Qos::try_from((self.fixed_header[0] >> 1) & 0b0000_0011).unwrap()
    }

    pub fn retain(&self) -> bool {
        self.fixed_header[0] & 0b0000_0001 != 0
    }

    pub fn dup(&self) -> bool {
        self.fixed_header[0] & 0b0000_1000 != 0
    }

    /// Total packet size on the wire.
    pub fn size(&self) -> usize {
        1 + self.remaining_length.size() + self.remaining_length.to_u32() as usize
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        let mut bufs = Vec::new();
        bufs.push(IoSlice::new(&self.fixed_header));
        bufs.push(IoSlice::new(self.remaining_length.as_bytes()));
        bufs.append(&mut self.topic_name_buf.to_buffers());
        if let Some(buf) = &self.packet_id_buf {
            bufs.push(IoSlice::new(buf));
        }
        bufs.push(IoSlice::new(self.property_length.as_bytes()));
        bufs.append(&mut self.props.to_buffers());
        bufs.push(IoSlice::new(&self.payload));
        bufs
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.fixed_header);
        buf.extend_from_slice(self.remaining_length.as_bytes());
        buf.append(&mut self.topic_name_buf.to_continuous_buffer());
        if let Some(id_buf) = &self.packet_id_buf {
            buf.extend_from_slice(id_buf);
        }
        buf.extend_from_slice(self.property_length.as_bytes());
        buf.append(&mut self.props.to_continuous_buffer());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parse the packet body given the fixed-header byte (which carries the
    /// DUP/QoS/RETAIN flags) and everything after the remaining-length
    /// field.
    pub fn parse(fixed_header: u8, data: &[u8]) -> Result<(Self, usize), MqttError> {
        let qos_bits = (fixed_header >> 1) & 0b0000_0011;
        let qos = Qos::try_from(qos_bits).map_err(|_| MqttError::MalformedPacket)?;

        let mut cursor = Cursor::new(data);
        let (topic_name_buf, consumed) = MqttString::decode(cursor.remaining_slice())?;
        cursor.skip(consumed);

        let packet_id_buf = if qos != Qos::AtMostOnce {
            let id = cursor.read_u16_be().ok_or(MqttError::InsufficientBytes)?;
            if id == 0 {
                return Err(MqttError::MalformedPacket);
            }
            Some(id.to_be_bytes())
        } else {
            None
        };

        let (props, consumed) = Properties::parse(cursor.remaining_slice())?;
        cursor.skip(consumed);
        validate_properties_for(&props, PacketType::Publish)?;
        let property_length = VariableByteInteger::from_u32(props.size() as u32).unwrap();

        let payload = cursor.remaining_slice().to_vec();
        cursor.skip(payload.len());

        let remaining = cursor.position() as usize;
        let publish = Publish {
            fixed_header: [fixed_header],
            remaining_length: VariableByteInteger::from_u32(remaining as u32).unwrap(),
            topic_name_buf,
            packet_id_buf,
            property_length,
            props,
            payload,
        };

        Ok((publish, remaining))
    }
}

impl PublishBuilder {
    fn fixed_header_byte(&self) -> u8 {
        self.fixed_header
            .map_or(FixedHeader::Publish.as_u8(), |fh| fh[0])
    }

    /// Topic the message is published to. Must not be empty; wildcard
    /// characters are not validated here, the broker re-validates.
    pub fn topic_name(mut self, topic: impl AsRef<str>) -> Result<Self, MqttError> {
        let topic = MqttString::new(topic.as_ref())?;
        if topic.is_empty() {
            return Err(MqttError::MalformedPacket);
        }
        self.topic_name_buf = Some(topic);
        Ok(self)
    }

    pub fn qos(mut self, qos: Qos) -> Self {
        let fh = (self.fixed_header_byte() & !0b0000_0110) | ((qos as u8) << 1);
        self.fixed_header = Some([fh]);
        self
    }

    pub fn retain(mut self, retain: bool) -> Self {
        let mut fh = self.fixed_header_byte();
        if retain {
            fh |= 0b0000_0001;
        } else {
            fh &= !0b0000_0001;
        }
        self.fixed_header = Some([fh]);
        self
    }

    pub fn dup(mut self, dup: bool) -> Self {
        let mut fh = self.fixed_header_byte();
        if dup {
            fh |= 0b0000_1000;
        } else {
            fh &= !0b0000_1000;
        }
        self.fixed_header = Some([fh]);
        self
    }

    pub fn packet_id(mut self, id: u16) -> Self {
        self.packet_id_buf = Some(Some(id.to_be_bytes()));
        self
    }

    fn validate(&self) -> Result<(), MqttError> {
        if self.topic_name_buf.is_none() {
            return Err(MqttError::MalformedPacket);
        }

        let qos_bits = (self.fixed_header_byte() >> 1) & 0b0000_0011;
        let qos = Qos::try_from(qos_bits).map_err(|_| MqttError::MalformedPacket)?;
        match (qos, &self.packet_id_buf) {
            // A packet identifier is mandatory for QoS 1 and 2 ...
            (Qos::AtLeastOnce | Qos::ExactlyOnce, Some(Some(buf))) => {
                if buf.iter().all(|&b| b == 0) {
                    return Err(MqttError::MalformedPacket);
                }
            }
            (Qos::AtLeastOnce | Qos::ExactlyOnce, _) => return Err(MqttError::MalformedPacket),
            // ... and forbidden for QoS 0.
            (Qos::AtMostOnce, Some(Some(_))) => return Err(MqttError::MalformedPacket),
            (Qos::AtMostOnce, _) => {}
        }

        if let Some(props) = &self.props {
            validate_properties_for(props, PacketType::Publish)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Publish, MqttError> {
        self.validate()?;

        let fixed_header = [self.fixed_header_byte()];
        let topic_name_buf = self.topic_name_buf.unwrap();
        let packet_id_buf = self.packet_id_buf.flatten();
        let props = self.props.unwrap_or_default();
        let payload = self.payload.unwrap_or_default();
        let props_size = props.size();
        let property_length = VariableByteInteger::from_u32(props_size as u32).unwrap();

        let remaining = topic_name_buf.size()
            + packet_id_buf.map_or(0, |_| 2)
            + property_length.size()
            + props_size
            + payload.len();
        let remaining_length =
            VariableByteInteger::from_u32(remaining as u32).ok_or(MqttError::PacketTooLarge)?;

        Ok(Publish {
            fixed_header,
            remaining_length,
            topic_name_buf,
            packet_id_buf,
            property_length,
            props,
            payload,
        })
    }
}

impl Serialize for Publish {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut field_count = 6; // type, topic, qos, retain, dup, props
        if self.packet_id_buf.is_some() {
            field_count += 1;
        }
        if !self.payload.is_empty() {
            field_count += 1;
        }

        let mut state = serializer.serialize_struct("publish", field_count)?;
        state.serialize_field("type", PacketType::Publish.as_str())?;
        state.serialize_field("topic_name", self.topic_name())?;
        state.serialize_field("qos", &self.qos())?;
        state.serialize_field("retain", &self.retain())?;
        state.serialize_field("dup", &self.dup())?;
        if self.packet_id_buf.is_some() {
            state.serialize_field("packet_id", &self.packet_id())?;
        }
        state.serialize_field("props", &self.props)?;
        if !self.payload.is_empty() {
            state.serialize_field("payload_len", &self.payload.len())?;
        }
        state.end()
    }
}

impl fmt::Display for Publish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Publish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
