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
use crate::mqtt::packet::packet_type::{FixedHeader, PacketType};
use crate::mqtt::packet::property::{
    validate_properties_for, Properties, PropertiesParse, PropertiesSize, PropertiesToBuffers,
    PropertiesToContinuousBuffer,
};
use crate::mqtt::packet::variable_byte_integer::VariableByteInteger;
use crate::mqtt::result_code::{MqttError, SubackReasonCode};

/// SUBACK packet: the broker's answer to SUBSCRIBE.
///
/// The payload carries one reason code per requested topic filter, in
/// order. Codes of 0x80 and above report the failure of that filter.
#[derive(PartialEq, Eq, Builder, Clone, Getters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Suback {
    #[builder(private)]
    fixed_header: [u8; 1],
    #[builder(private)]
    remaining_length: VariableByteInteger,
    #[builder(private)]
    packet_id_buf: [u8; 2],
    #[builder(private)]
    property_length: VariableByteInteger,

    /// Properties attached to the acknowledgment.
    #[getset(get = "pub")]
    props: Properties,

    #[builder(private)]
    reason_codes_buf: Vec<u8>,
}

impl Suback {
    pub fn builder() -> SubackBuilder {
        SubackBuilder::default()
    }

    pub fn packet_type() -> PacketType {
        PacketType::Suback
    }

    pub fn packet_id(&self) -> u16 {
        u16::from_be_bytes(self.packet_id_buf)
    }

    /// One reason code per topic filter of the SUBSCRIBE, in order.
    pub fn reason_codes(&self) -> Vec<SubackReasonCode> {
        self.reason_codes_buf
            .iter()
            .map(|&b| SubackReasonCode::try_from(b).unwrap())
            .collect()
    }

    /// Total packet size on the wire.
    pub fn size(&self) -> usize {
        1 + self.remaining_length.size() + self.remaining_length.to_u32() as usize
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        let mut bufs = Vec::new();
        bufs.push(IoSlice::new(&self.fixed_header));
        bufs.push(IoSlice::new(self.remaining_length.as_bytes()));
        bufs.push(IoSlice::new(&self.packet_id_buf));
        bufs.push(IoSlice::new(self.property_length.as_bytes()));
        bufs.append(&mut self.props.to_buffers());
        bufs.push(IoSlice::new(&self.reason_codes_buf));
        bufs
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.fixed_header);
        buf.extend_from_slice(self.remaining_length.as_bytes());
        buf.extend_from_slice(&self.packet_id_buf);
        buf.extend_from_slice(self.property_length.as_bytes());
        buf.append(&mut self.props.to_continuous_buffer());
        buf.extend_from_slice(&self.reason_codes_buf);
        buf
    }

    /// Parse the packet body (everything after the remaining-length field).
    pub fn parse(data: &[u8]) -> Result<(Self, usize), MqttError> {
        let mut cursor = Cursor::new(data);

        let packet_id = cursor.read_u16_be().ok_or(MqttError::InsufficientBytes)?;
        if packet_id == 0 {
            return Err(MqttError::MalformedPacket);
        }

        let (props, consumed) = Properties::parse(cursor.remaining_slice())?;
        cursor.skip(consumed);
        validate_properties_for(&props, PacketType::Suback)?;
        let property_length = VariableByteInteger::from_u32(props.size() as u32).unwrap();

        let reason_codes_buf = cursor.remaining_slice().to_vec();
        if reason_codes_buf.is_empty() {
            return Err(MqttError::MalformedPacket);
        }
        for &b in &reason_codes_buf {
            let _ = SubackReasonCode::try_from(b).map_err(|_| MqttError::MalformedPacket)?;
        }
        cursor.skip(reason_codes_buf.len());

        let remaining = cursor.position() as usize;
        let suback = Suback {
            fixed_header: [FixedHeader::Suback.as_u8()],
            remaining_length: VariableByteInteger::from_u32(remaining as u32).unwrap(),
            packet_id_buf: packet_id.to_be_bytes(),
            property_length,
            props,
            reason_codes_buf,
        };

        Ok((suback, remaining))
    }
}

impl SubackBuilder {
    /// Identifier of the SUBSCRIBE being acknowledged; must be non-zero.
    pub fn packet_id(mut self, id: u16) -> Self {
        self.packet_id_buf = Some(id.to_be_bytes());
        self
    }

    pub fn reason_codes(mut self, codes: impl IntoIterator<Item = SubackReasonCode>) -> Self {
        self.reason_codes_buf = Some(codes.into_iter().map(|c| c as u8).collect());
        self
    }

    fn validate(&self) -> Result<(), MqttError> {
        match &self.packet_id_buf {
            None => return Err(MqttError::MalformedPacket),
            Some(buf) if buf.iter().all(|&b| b == 0) => return Err(MqttError::MalformedPacket),
            _ => {}
        }
        match &self.reason_codes_buf {
            None => return Err(MqttError::MalformedPacket),
            Some(codes) if codes.is_empty() => return Err(MqttError::MalformedPacket),
            _ => {}
        }
        if let Some(props) = &self.props {
            validate_properties_for(props, PacketType::Suback)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Suback, MqttError> {
        self.validate()?;

        let packet_id_buf = self.packet_id_buf.unwrap();
        let reason_codes_buf = self.reason_codes_buf.unwrap();
        let props = self.props.unwrap_or_default();
        let props_size = props.size();
        let property_length = VariableByteInteger::from_u32(props_size as u32).unwrap();

        let remaining = 2 + property_length.size() + props_size + reason_codes_buf.len();
        let remaining_length =
            VariableByteInteger::from_u32(remaining as u32).ok_or(MqttError::PacketTooLarge)?;

        Ok(Suback {
            fixed_header: [FixedHeader::Suback.as_u8()],
            remaining_length,
            packet_id_buf,
            property_length,
            props,
            reason_codes_buf,
        })
    }
}

impl Serialize for Suback {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("suback", 4)?;
        state.serialize_field("type", PacketType::Suback.as_str())?;
        state.serialize_field("packet_id", &self.packet_id())?;
        state.serialize_field("props", &self.props)?;
        state.serialize_field("reason_codes", &self.reason_codes())?;
        state.end()
    }
}

impl fmt::Display for Suback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Suback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
