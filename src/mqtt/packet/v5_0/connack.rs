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
use crate::mqtt::result_code::{ConnectReasonCode, MqttError};

/// CONNACK packet: the broker's answer to CONNECT.
///
/// The acknowledge-flags byte carries the session-present bit, followed by
/// the connect reason code and the property list. The properties returned
/// here drive client-side renegotiation: `MaximumPacketSize`,
/// `AssignedClientIdentifier`, `ServerKeepAlive` and the authentication
/// pair all update the session state when received.
#[derive(PartialEq, Eq, Builder, Clone, Getters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Connack {
    #[builder(private)]
    fixed_header: [u8; 1],
    #[builder(private)]
    remaining_length: VariableByteInteger,
    #[builder(private)]
    ack_flags_buf: [u8; 1],
    #[builder(private)]
    reason_code_buf: [u8; 1],
    #[builder(private)]
    property_length: VariableByteInteger,

    /// Properties announced by the broker.
    #[getset(get = "pub")]
    props: Properties,
}

impl Connack {
    pub fn builder() -> ConnackBuilder {
        ConnackBuilder::default()
    }

    pub fn packet_type() -> PacketType {
        PacketType::Connack
    }

    /// Whether the broker resumed a stored session (bit 0 of the
    /// acknowledge flags).
    pub fn session_present(&self) -> bool {
        self.ack_flags_buf[0] & 0b0000_0001 != 0
    }

    pub fn reason_code(&self) -> ConnectReasonCode {
        // Validated at construction / parse time.
        ConnectReasonCode::try_from(self.reason_code_buf[0]).unwrap()
    }

    /// Total packet size on the wire.
    pub fn size(&self) -> usize {
        1 + self.remaining_length.size() + self.remaining_length.to_u32() as usize
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        let mut bufs = Vec::new();
        bufs.push(IoSlice::new(&self.fixed_header));
        bufs.push(IoSlice::new(self.remaining_length.as_bytes()));
        bufs.push(IoSlice::new(&self.ack_flags_buf));
        bufs.push(IoSlice::new(&self.reason_code_buf));
        bufs.push(IoSlice::new(self.property_length.as_bytes()));
        bufs.append(&mut self.props.to_buffers());
        bufs
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.fixed_header);
        buf.extend_from_slice(self.remaining_length.as_bytes());
        buf.extend_from_slice(&self.ack_flags_buf);
        buf.extend_from_slice(&self.reason_code_buf);
        buf.extend_from_slice(self.property_length.as_bytes());
        buf.append(&mut self.props.to_continuous_buffer());
        buf
    }

    /// Parse the packet body (everything after the remaining-length field).
    pub fn parse(data: &[u8]) -> Result<(Self, usize), MqttError> {
        let mut cursor = Cursor::new(data);

        let ack_flags = cursor.read_u8().ok_or(MqttError::InsufficientBytes)?;
        if ack_flags & 0b1111_1110 != 0 {
            return Err(MqttError::MalformedPacket);
        }

        let rc = cursor.read_u8().ok_or(MqttError::InsufficientBytes)?;
        let _ = ConnectReasonCode::try_from(rc).map_err(|_| MqttError::MalformedPacket)?;

        let (props, consumed) = Properties::parse(cursor.remaining_slice())?;
        cursor.skip(consumed);
        validate_properties_for(&props, PacketType::Connack)?;
        let property_length = VariableByteInteger::from_u32(props.size() as u32).unwrap();

        let remaining = cursor.position() as usize;
        let connack = Connack {
            fixed_header: [FixedHeader::Connack.as_u8()],
            remaining_length: VariableByteInteger::from_u32(remaining as u32).unwrap(),
            ack_flags_buf: [ack_flags],
            reason_code_buf: [rc],
            property_length,
            props,
        };

        Ok((connack, remaining))
    }
}

impl ConnackBuilder {
    pub fn session_present(mut self, present: bool) -> Self {
        self.ack_flags_buf = Some([u8::from(present)]);
        self
    }

    pub fn reason_code(mut self, rc: ConnectReasonCode) -> Self {
        self.reason_code_buf = Some([rc as u8]);
        self
    }

    fn validate(&self) -> Result<(), MqttError> {
        if self.reason_code_buf.is_none() {
            return Err(MqttError::MalformedPacket);
        }
        if let Some(props) = &self.props {
            validate_properties_for(props, PacketType::Connack)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Connack, MqttError> {
        self.validate()?;

        let ack_flags_buf = self.ack_flags_buf.unwrap_or([0]);
        let reason_code_buf = self.reason_code_buf.unwrap();
        let props = self.props.unwrap_or_default();
        let props_size = props.size();
        let property_length = VariableByteInteger::from_u32(props_size as u32).unwrap();

        let remaining = 2 + property_length.size() + props_size;
        let remaining_length = VariableByteInteger::from_u32(remaining as u32).unwrap();

        Ok(Connack {
            fixed_header: [FixedHeader::Connack.as_u8()],
            remaining_length,
            ack_flags_buf,
            reason_code_buf,
            property_length,
            props,
        })
    }
}

impl Serialize for Connack {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("connack", 4)?;
        state.serialize_field("type", PacketType::Connack.as_str())?;
        state.serialize_field("session_present", &self.session_present())?;
        state.serialize_field("reason_code", &self.reason_code())?;
        state.serialize_field("props", &self.props)?;
        state.end()
    }
}

impl fmt::Display for Connack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Connack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
