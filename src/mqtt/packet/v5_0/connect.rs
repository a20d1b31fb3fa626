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
use crate::mqtt::packet::mqtt_binary::MqttBinary;
use crate::mqtt::packet::mqtt_string::MqttString;
use crate::mqtt::packet::packet_type::{FixedHeader, PacketType};
use crate::mqtt::packet::property::{
    validate_properties_for, validate_will_properties, Properties, PropertiesParse,
    PropertiesSize, PropertiesToBuffers, PropertiesToContinuousBuffer,
};
use crate::mqtt::packet::qos::Qos;
use crate::mqtt::packet::variable_byte_integer::VariableByteInteger;
use crate::mqtt::result_code::MqttError;

/// CONNECT packet: the first packet of every session.
///
/// The variable header carries the protocol name `"MQTT"`, protocol level
/// 5, the connect flags byte, the keep-alive interval and properties. The
/// payload follows in fixed order: client identifier, then the will
/// properties/topic/payload when a will is present, then the user name and
/// password when set. Each payload element's presence is governed by its
/// flag bit; the reserved flag bit 0 must be zero.
///
/// An empty client identifier asks the broker to assign one; the assigned
/// value comes back in CONNACK as `AssignedClientIdentifier`.
#[derive(PartialEq, Eq, Builder, Clone, Getters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Connect {
    #[builder(private)]
    fixed_header: [u8; 1],
    #[builder(private)]
    remaining_length: VariableByteInteger,
    #[builder(private)]
    protocol_name_buf: [u8; 6],
    #[builder(private)]
    protocol_version_buf: [u8; 1],
    #[builder(private)]
    connect_flags_buf: [u8; 1],
    #[builder(private)]
    keep_alive_buf: [u8; 2],
    #[builder(private)]
    property_length: VariableByteInteger,

    /// Properties of the connection request.
    #[getset(get = "pub")]
    props: Properties,

    #[builder(private)]
    client_id_buf: MqttString,
    #[builder(private)]
    will_property_length: Option<VariableByteInteger>,
    #[builder(private)]
    will_props_buf: Option<Properties>,
    #[builder(private)]
    will_topic_buf: Option<MqttString>,
    #[builder(private)]
    will_payload_buf: Option<MqttBinary>,
    #[builder(private)]
    user_name_buf: Option<MqttString>,
    #[builder(private)]
    password_buf: Option<MqttBinary>,
}

impl Connect {
    pub fn builder() -> ConnectBuilder {
        ConnectBuilder::default()
    }

    pub fn packet_type() -> PacketType {
        PacketType::Connect
    }

    pub fn protocol_name(&self) -> &str {
        // Fixed "MQTT" by construction.
        "MQTT"
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version_buf[0]
    }

    pub fn clean_start(&self) -> bool {
        self.connect_flags_buf[0] & 0b0000_0010 != 0
    }

    pub fn will_flag(&self) -> bool {
        self.connect_flags_buf[0] & 0b0000_0100 != 0
    }

    pub fn will_qos(&self) -> Qos {
        // Validated at construction / parse time.
        Qos::try_from((self.connect_flags_buf[0] >> 3) & 0b0000_0011).unwrap()
    }

    pub fn will_retain(&self) -> bool {
        self.connect_flags_buf[0] & 0b0010_0000 != 0
    }

    pub fn password_flag(&self) -> bool {
        self.connect_flags_buf[0] & 0b0100_0000 != 0
    }

    pub fn user_name_flag(&self) -> bool {
        self.connect_flags_buf[0] & 0b1000_0000 != 0
    }

    pub fn keep_alive(&self) -> u16 {
        u16::from_be_bytes(self.keep_alive_buf)
    }

    pub fn client_id(&self) -> &str {
        self.client_id_buf.as_str()
    }

    pub fn will_topic(&self) -> Option<&str> {
        self.will_topic_buf.as_ref().map(MqttString::as_str)
    }

    pub fn will_payload(&self) -> Option<&[u8]> {
        self.will_payload_buf.as_ref().map(MqttBinary::as_slice)
    }

    pub fn will_props(&self) -> Option<&Properties> {
        self.will_props_buf.as_ref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name_buf.as_ref().map(MqttString::as_str)
    }

    pub fn password(&self) -> Option<&[u8]> {
        self.password_buf.as_ref().map(MqttBinary::as_slice)
    }

    /// Total packet size on the wire.
    pub fn size(&self) -> usize {
        1 + self.remaining_length.size() + self.remaining_length.to_u32() as usize
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        let mut bufs = Vec::new();
        bufs.push(IoSlice::new(&self.fixed_header));
        bufs.push(IoSlice::new(self.remaining_length.as_bytes()));
        bufs.push(IoSlice::new(&self.protocol_name_buf));
        bufs.push(IoSlice::new(&self.protocol_version_buf));
        bufs.push(IoSlice::new(&self.connect_flags_buf));
        bufs.push(IoSlice::new(&self.keep_alive_buf));
        bufs.push(IoSlice::new(self.property_length.as_bytes()));
        bufs.append(&mut self.props.to_buffers());
        bufs.append(&mut self.client_id_buf.to_buffers());
        if let Some(wpl) = &self.will_property_length {
            bufs.push(IoSlice::new(wpl.as_bytes()));
        }
        if let Some(will_props) = &self.will_props_buf {
            bufs.append(&mut will_props.to_buffers());
        }
        if let Some(will_topic) = &self.will_topic_buf {
            bufs.append(&mut will_topic.to_buffers());
        }
        if let Some(will_payload) = &self.will_payload_buf {
            bufs.append(&mut will_payload.to_buffers());
        }
        if let Some(user_name) = &self.user_name_buf {
            bufs.append(&mut user_name.to_buffers());
        }
        if let Some(password) = &self.password_buf {
            bufs.append(&mut password.to_buffers());
        }
        bufs
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.fixed_header);
        buf.extend_from_slice(self.remaining_length.as_bytes());
        buf.extend_from_slice(&self.protocol_name_buf);
        buf.extend_from_slice(&self.protocol_version_buf);
        buf.extend_from_slice(&self.connect_flags_buf);
        buf.extend_from_slice(&self.keep_alive_buf);
        buf.extend_from_slice(self.property_length.as_bytes());
        buf.append(&mut self.props.to_continuous_buffer());
        buf.append(&mut self.client_id_buf.to_continuous_buffer());
        if let Some(wpl) = &self.will_property_length {
            buf.extend_from_slice(wpl.as_bytes());
        }
        if let Some(will_props) = &self.will_props_buf {
            buf.append(&mut will_props.to_continuous_buffer());
        }
        if let Some(will_topic) = &self.will_topic_buf {
            buf.append(&mut will_topic.to_continuous_buffer());
        }
        if let Some(will_payload) = &self.will_payload_buf {
            buf.append(&mut will_payload.to_continuous_buffer());
        }
        if let Some(user_name) = &self.user_name_buf {
            buf.append(&mut user_name.to_continuous_buffer());
        }
        if let Some(password) = &self.password_buf {
            buf.append(&mut password.to_continuous_buffer());
        }
        buf
    }

    /// Parse the packet body (everything after the remaining-length field).
    pub fn parse(data: &[u8]) -> Result<(Self, usize), MqttError> {
        let mut cursor = Cursor::new(data);

        let protocol_name = cursor.read_bytes(6).ok_or(MqttError::InsufficientBytes)?;
        if protocol_name != [0x00, 0x04, b'M', b'Q', b'T', b'T'] {
            return Err(MqttError::MalformedPacket);
        }

        let version = cursor.read_u8().ok_or(MqttError::InsufficientBytes)?;
        if version != 5 {
            return Err(MqttError::UnsupportedProtocolVersion);
        }

        let connect_flags = cursor.read_u8().ok_or(MqttError::InsufficientBytes)?;
        if connect_flags & 0b0000_0001 != 0 {
            return Err(MqttError::MalformedPacket);
        }
        let will_flag = connect_flags & 0b0000_0100 != 0;
        let will_qos_bits = (connect_flags >> 3) & 0b0000_0011;
        let _ = Qos::try_from(will_qos_bits).map_err(|_| MqttError::MalformedPacket)?;
        let will_retain = connect_flags & 0b0010_0000 != 0;
        if !will_flag && (will_qos_bits != 0 || will_retain) {
            return Err(MqttError::MalformedPacket);
        }
        let password_flag = connect_flags & 0b0100_0000 != 0;
        let user_name_flag = connect_flags & 0b1000_0000 != 0;

        let keep_alive = cursor.read_u16_be().ok_or(MqttError::InsufficientBytes)?;

        let (props, consumed) = Properties::parse(cursor.remaining_slice())?;
        cursor.skip(consumed);
        validate_properties_for(&props, PacketType::Connect)?;
        let property_length = VariableByteInteger::from_u32(props.size() as u32).unwrap();

        let (client_id_buf, consumed) = MqttString::decode(cursor.remaining_slice())?;
        cursor.skip(consumed);

        let (will_property_length, will_props_buf, will_topic_buf, will_payload_buf) = if will_flag
        {
            let (will_props, consumed) = Properties::parse(cursor.remaining_slice())?;
            cursor.skip(consumed);
            validate_will_properties(&will_props)?;
            let wpl = VariableByteInteger::from_u32(will_props.size() as u32).unwrap();

            let (will_topic, consumed) = MqttString::decode(cursor.remaining_slice())?;
            cursor.skip(consumed);
            let (will_payload, consumed) = MqttBinary::decode(cursor.remaining_slice())?;
            cursor.skip(consumed);

            (Some(wpl), Some(will_props), Some(will_topic), Some(will_payload))
        } else {
            (None, None, None, None)
        };

        let user_name_buf = if user_name_flag {
            let (user_name, consumed) = MqttString::decode(cursor.remaining_slice())?;
            cursor.skip(consumed);
            Some(user_name)
        } else {
            None
        };

        let password_buf = if password_flag {
            let (password, consumed) = MqttBinary::decode(cursor.remaining_slice())?;
            cursor.skip(consumed);
            Some(password)
        } else {
            None
        };

        let remaining = cursor.position() as usize;
        let connect = Connect {
            fixed_header: [FixedHeader::Connect.as_u8()],
            remaining_length: VariableByteInteger::from_u32(remaining as u32).unwrap(),
            protocol_name_buf: [0x00, 0x04, b'M', b'Q', b'T', b'T'],
            protocol_version_buf: [5],
            connect_flags_buf: [connect_flags],
            keep_alive_buf: keep_alive.to_be_bytes(),
            property_length,
            props,
            client_id_buf,
            will_property_length,
            will_props_buf,
            will_topic_buf,
            will_payload_buf,
            user_name_buf,
            password_buf,
        };

        Ok((connect, remaining))
    }
}

impl ConnectBuilder {
    fn connect_flags_byte(&self) -> u8 {
        self.connect_flags_buf.map_or(0, |buf| buf[0])
    }

    /// Client identifier; may be empty to request a broker-assigned one.
    pub fn client_id(mut self, id: impl AsRef<str>) -> Result<Self, MqttError> {
        self.client_id_buf = Some(MqttString::new(id.as_ref())?);
        Ok(self)
    }

    pub fn clean_start(mut self, clean: bool) -> Self {
        let mut flags = self.connect_flags_byte();
        if clean {
            flags |= 0b0000_0010;
        } else {
            flags &= !0b0000_0010;
        }
        self.connect_flags_buf = Some([flags]);
        self
    }

    pub fn keep_alive(mut self, seconds: u16) -> Self {
        self.keep_alive_buf = Some(seconds.to_be_bytes());
        self
    }

    /// Attach a will message; sets the will flag, QoS and retain bits.
    pub fn will_message(
        mut self,
        topic: impl AsRef<str>,
        payload: impl Into<Vec<u8>>,
        qos: Qos,
        retain: bool,
        will_props: Properties,
    ) -> Result<Self, MqttError> {
        let topic = MqttString::new(topic.as_ref())?;
        if topic.is_empty() {
            return Err(MqttError::MalformedPacket);
        }
        validate_will_properties(&will_props)?;

        let mut flags = self.connect_flags_byte();
        flags |= 0b0000_0100;
        flags = (flags & !0b0001_1000) | ((qos as u8) << 3);
        if retain {
            flags |= 0b0010_0000;
        } else {
            flags &= !0b0010_0000;
        }
        self.connect_flags_buf = Some([flags]);
        self.will_property_length = Some(Some(
            VariableByteInteger::from_u32(will_props.size() as u32).unwrap(),
        ));
        self.will_props_buf = Some(Some(will_props));
        self.will_topic_buf = Some(Some(topic));
        self.will_payload_buf = Some(Some(MqttBinary::new(payload)?));
        Ok(self)
    }

    pub fn user_name(mut self, name: impl AsRef<str>) -> Result<Self, MqttError> {
        let mut flags = self.connect_flags_byte();
        flags |= 0b1000_0000;
        self.connect_flags_buf = Some([flags]);
        self.user_name_buf = Some(Some(MqttString::new(name.as_ref())?));
        Ok(self)
    }

    pub fn password(mut self, password: impl Into<Vec<u8>>) -> Result<Self, MqttError> {
        let mut flags = self.connect_flags_byte();
        flags |= 0b0100_0000;
        self.connect_flags_buf = Some([flags]);
        self.password_buf = Some(Some(MqttBinary::new(password)?));
        Ok(self)
    }

    fn validate(&self) -> Result<(), MqttError> {
        if self.client_id_buf.is_none() {
            return Err(MqttError::MalformedPacket);
        }
        if let Some(props) = &self.props {
            validate_properties_for(props, PacketType::Connect)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Connect, MqttError> {
        self.validate()?;

        let connect_flags_buf = self.connect_flags_buf.unwrap_or([0]);
        let keep_alive_buf = self.keep_alive_buf.unwrap_or([0, 0]);
        let props = self.props.unwrap_or_default();
        let props_size = props.size();
        let property_length = VariableByteInteger::from_u32(props_size as u32).unwrap();
        let client_id_buf = self.client_id_buf.unwrap();
        let will_property_length = self.will_property_length.flatten();
        let will_props_buf = self.will_props_buf.flatten();
        let will_topic_buf = self.will_topic_buf.flatten();
        let will_payload_buf = self.will_payload_buf.flatten();
        let user_name_buf = self.user_name_buf.flatten();
        let password_buf = self.password_buf.flatten();

        let mut remaining = 6 + 1 + 1 + 2 + property_length.size() + props_size;
        remaining += client_id_buf.size();
        if let Some(wpl) = &will_property_length {
            remaining += wpl.size();
        }
        if let Some(will_props) = &will_props_buf {
            remaining += will_props.size();
        }
        if let Some(will_topic) = &will_topic_buf {
            remaining += will_topic.size();
        }
        if let Some(will_payload) = &will_payload_buf {
            remaining += will_payload.size();
        }
        if let Some(user_name) = &user_name_buf {
            remaining += user_name.size();
        }
        if let Some(password) = &password_buf {
            remaining += password.size();
        }
        let remaining_length =
            VariableByteInteger::from_u32(remaining as u32).ok_or(MqttError::PacketTooLarge)?;

        Ok(Connect {
            fixed_header: [FixedHeader::Connect.as_u8()],
            remaining_length,
            protocol_name_buf: [0x00, 0x04, b'M', b'Q', b'T', b'T'],
            protocol_version_buf: [5],
            connect_flags_buf,
            keep_alive_buf,
            property_length,
            props,
            client_id_buf,
            will_property_length,
            will_props_buf,
            will_topic_buf,
            will_payload_buf,
            user_name_buf,
            password_buf,
        })
    }
}

impl Serialize for Connect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut field_count = 5; // type, client_id, clean_start, keep_alive, props
        if self.will_flag() {
            field_count += 3;
        }
        if self.user_name_flag() {
            field_count += 1;
        }
        if self.password_flag() {
            field_count += 1;
        }

        let mut state = serializer.serialize_struct("connect", field_count)?;
        state.serialize_field("type", PacketType::Connect.as_str())?;
        state.serialize_field("client_id", self.client_id())?;
        state.serialize_field("clean_start", &self.clean_start())?;
        state.serialize_field("keep_alive", &self.keep_alive())?;
        state.serialize_field("props", &self.props)?;
        if self.will_flag() {
            state.serialize_field("will_topic", &self.will_topic())?;
            state.serialize_field("will_qos", &self.will_qos())?;
            state.serialize_field("will_retain", &self.will_retain())?;
        }
        if self.user_name_flag() {
            state.serialize_field("user_name", &self.user_name())?;
        }
        if self.password_flag() {
            state.serialize_field("password_len", &self.password().map(<[u8]>::len))?;
        }
        state.end()
    }
}

impl fmt::Display for Connect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Connect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
