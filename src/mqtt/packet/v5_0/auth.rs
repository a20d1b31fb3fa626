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
use crate::mqtt::result_code::{AuthReasonCode, MqttError};

/// AUTH packet: one round of an extended authentication exchange.
///
/// Exchanged in both directions during CONNECT (and for re-authentication
/// afterwards), carrying the `AuthenticationMethod` and
/// `AuthenticationData` properties. When the reason code is `Success` and
/// there are no properties, both are omitted and the packet shrinks to its
/// two-byte fixed header; this shortened form is produced and accepted.
#[derive(PartialEq, Eq, Builder, Clone, Getters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Auth {
    #[builder(private)]
    fixed_header: [u8; 1],
    #[builder(private)]
    remaining_length: VariableByteInteger,
    #[builder(private)]
    reason_code_buf: Option<[u8; 1]>,
    #[builder(private)]
    property_length: Option<VariableByteInteger>,

    /// Optional properties: `AuthenticationMethod`, `AuthenticationData`,
    /// `ReasonString` and `UserProperty` entries.
    #[builder(setter(into, strip_option))]
    #[getset(get = "pub")]
    props: Option<Properties>,
}

impl Auth {
    pub fn builder() -> AuthBuilder {
        AuthBuilder::default()
    }

    pub fn packet_type() -> PacketType {
        PacketType::Auth
    }

    /// Reason code, or `None` for the shortened success form.
    pub fn reason_code(&self) -> Option<AuthReasonCode> {
        self.reason_code_buf
            .as_ref()
            .and_then(|buf| AuthReasonCode::try_from(buf[0]).ok())
    }

    /// Total packet size on the wire.
    pub fn size(&self) -> usize {
        1 + self.remaining_length.size() + self.remaining_length.to_u32() as usize
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        let mut bufs = Vec::new();
        bufs.push(IoSlice::new(&self.fixed_header));
        bufs.push(IoSlice::new(self.remaining_length.as_bytes()));
        if let Some(buf) = &self.reason_code_buf {
            bufs.push(IoSlice::new(buf));
        }
        if let Some(pl) = &self.property_length {
            bufs.push(IoSlice::new(pl.as_bytes()));
        }
        if let Some(ref props) = self.props {
            bufs.append(&mut props.to_buffers());
        }

        bufs
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.fixed_header);
        buf.extend_from_slice(self.remaining_length.as_bytes());
        if let Some(rc_buf) = &self.reason_code_buf {
            buf.extend_from_slice(rc_buf);
        }
        if let Some(pl) = &self.property_length {
            buf.extend_from_slice(pl.as_bytes());
        }
        if let Some(ref props) = self.props {
            buf.append(&mut props.to_continuous_buffer());
        }
        buf
    }

    /// Parse the packet body (everything after the remaining-length field).
    pub fn parse(data: &[u8]) -> Result<(Self, usize), MqttError> {
        let mut cursor = Cursor::new(data);

        let reason_code_buf = match cursor.read_u8() {
            Some(rc) => {
                let _ =
                    AuthReasonCode::try_from(rc).map_err(|_| MqttError::MalformedPacket)?;
                Some([rc])
            }
            None => None,
        };

        let (property_length, props) = if reason_code_buf.is_some() && cursor.remaining() > 0 {
            let (props, consumed) = Properties::parse(cursor.remaining_slice())?;
            cursor.skip(consumed);
            validate_properties_for(&props, PacketType::Auth)?;
            let prop_len = VariableByteInteger::from_u32(props.size() as u32).unwrap();
            (Some(prop_len), Some(props))
        } else {
            (None, None)
        };

        let remaining = cursor.position() as usize;
        let auth = Auth {
            fixed_header: [FixedHeader::Auth.as_u8()],
            remaining_length: VariableByteInteger::from_u32(remaining as u32).unwrap(),
            reason_code_buf,
            property_length,
            props,
        };

        Ok((auth, remaining))
    }
}

impl AuthBuilder {
    pub fn reason_code(mut self, rc: AuthReasonCode) -> Self {
        self.reason_code_buf = Some(Some([rc as u8]));
        self
    }

    fn validate(&self) -> Result<(), MqttError> {
        // Properties cannot be encoded without a reason code preceding them.
        if self.reason_code_buf.is_none() && matches!(self.props, Some(Some(_))) {
            return Err(MqttError::MalformedPacket);
        }
        if let Some(Some(props)) = &self.props {
            validate_properties_for(props, PacketType::Auth)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Auth, MqttError> {
        self.validate()?;

        let reason_code_buf = self.reason_code_buf.flatten();
        let props = self.props.flatten();
        let props_size: usize = props.as_ref().map_or(0, |p| p.size());
        let property_length = props
            .as_ref()
            .map(|_| VariableByteInteger::from_u32(props_size as u32).unwrap());

        let mut remaining = 0;
        if reason_code_buf.is_some() {
            remaining += 1;
        }
        if let Some(ref pl) = property_length {
            remaining += pl.size() + props_size;
        }
        let remaining_length = VariableByteInteger::from_u32(remaining as u32).unwrap();

        Ok(Auth {
            fixed_header: [FixedHeader::Auth.as_u8()],
            remaining_length,
            reason_code_buf,
            property_length,
            props,
        })
    }
}

impl Serialize for Auth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut field_count = 1; // type
        if self.reason_code_buf.is_some() {
            field_count += 1;
        }
        if self.props.is_some() {
            field_count += 1;
        }

        let mut state = serializer.serialize_struct("auth", field_count)?;
        state.serialize_field("type", PacketType::Auth.as_str())?;
        if self.reason_code_buf.is_some() {
            state.serialize_field("reason_code", &self.reason_code())?;
        }
        if let Some(props) = &self.props {
            state.serialize_field("props", props)?;
        }

        state.end()
    }
}

impl fmt::Display for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
