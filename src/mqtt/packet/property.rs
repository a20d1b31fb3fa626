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
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::io::IoSlice;

use crate::mqtt::packet::mqtt_binary::MqttBinary;
use crate::mqtt::packet::mqtt_string::MqttString;
use crate::mqtt::packet::packet_type::PacketType;
use crate::mqtt::packet::variable_byte_integer::{DecodeResult, VariableByteInteger};
use crate::mqtt::result_code::MqttError;

/// MQTT v5.0 property identifiers.
///
/// Each id determines the value type that follows it on the wire and the
/// set of packet types the property is legal in (see
/// [`validate_properties_for`]).
#[derive(PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum PropertyId {
    /// Indicates the format of the payload in PUBLISH packets (0=binary, 1=UTF-8)
    PayloadFormatIndicator = 1,
    /// Message expiry interval in seconds
    MessageExpiryInterval = 2,
    /// Content type of the application message
    ContentType = 3,
    /// Topic name for response messages
    ResponseTopic = 8,
    /// Correlation data for request/response messaging
    CorrelationData = 9,
    /// Subscription identifier for matching subscriptions
    SubscriptionIdentifier = 11,
    /// Session expiry interval in seconds
    SessionExpiryInterval = 17,
    /// Client identifier assigned by the server
    AssignedClientIdentifier = 18,
    /// Keep alive time assigned by the server
    ServerKeepAlive = 19,
    /// Authentication method name
    AuthenticationMethod = 21,
    /// Authentication data
    AuthenticationData = 22,
    /// Request problem information flag
    RequestProblemInformation = 23,
    /// Will delay interval in seconds
    WillDelayInterval = 24,
    /// Request response information flag
    RequestResponseInformation = 25,
    /// Response information string
    ResponseInformation = 26,
    /// Server reference for redirection
    ServerReference = 28,
    /// Human readable reason string
    ReasonString = 31,
    /// Maximum number of concurrent PUBLISH packets
    ReceiveMaximum = 33,
    /// Maximum topic alias value
    TopicAliasMaximum = 34,
    /// Topic alias value
    TopicAlias = 35,
    /// Maximum QoS level supported
    MaximumQos = 36,
    /// Retain availability flag
    RetainAvailable = 37,
    /// User-defined property key-value pair
    UserProperty = 38,
    /// Maximum packet size
    MaximumPacketSize = 39,
    /// Wildcard subscription availability flag
    WildcardSubscriptionAvailable = 40,
    /// Subscription identifier availability flag
    SubscriptionIdentifierAvailable = 41,
    /// Shared subscription availability flag
    SharedSubscriptionAvailable = 42,
}

impl PropertyId {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyId::PayloadFormatIndicator => "payload_format_indicator",
            PropertyId::MessageExpiryInterval => "message_expiry_interval",
            PropertyId::ContentType => "content_type",
            PropertyId::ResponseTopic => "response_topic",
            PropertyId::CorrelationData => "correlation_data",
            PropertyId::SubscriptionIdentifier => "subscription_identifier",
            PropertyId::SessionExpiryInterval => "session_expiry_interval",
            PropertyId::AssignedClientIdentifier => "assigned_client_identifier",
            PropertyId::ServerKeepAlive => "server_keep_alive",
            PropertyId::AuthenticationMethod => "authentication_method",
            PropertyId::AuthenticationData => "authentication_data",
            PropertyId::RequestProblemInformation => "request_problem_information",
            PropertyId::WillDelayInterval => "will_delay_interval",
            PropertyId::RequestResponseInformation => "request_response_information",
            PropertyId::ResponseInformation => "response_information",
            PropertyId::ServerReference => "server_reference",
            PropertyId::ReasonString => "reason_string",
            PropertyId::ReceiveMaximum => "receive_maximum",
            PropertyId::TopicAliasMaximum => "topic_alias_maximum",
            PropertyId::TopicAlias => "topic_alias",
            PropertyId::MaximumQos => "maximum_qos",
            PropertyId::RetainAvailable => "retain_available",
            PropertyId::UserProperty => "user_property",
            PropertyId::MaximumPacketSize => "maximum_packet_size",
            PropertyId::WildcardSubscriptionAvailable => "wildcard_subscription_available",
            PropertyId::SubscriptionIdentifierAvailable => "subscription_identifier_available",
            PropertyId::SharedSubscriptionAvailable => "shared_subscription_available",
        }
    }
}

impl Serialize for PropertyId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Payload Format Indicator values (0=binary, 1=UTF-8 text).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, TryFromPrimitive)]
#[repr(u8)]
pub enum PayloadFormat {
    Binary = 0,
    String = 1,
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Binary => "binary",
            Self::String => "string",
        };
        write!(f, "{s}")
    }
}

macro_rules! property_common {
    ($name:ident, |$p:ident, $map:ident| $body:expr) => {
        impl From<$name> for Property {
            fn from(p: $name) -> Self {
                Property::$name(p)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(Some(1))?;
                {
                    let $p = self;
                    let $map = &mut map;
                    $body?;
                }
                map.end()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match serde_json::to_string(self) {
                    Ok(json) => write!(f, "{json}"),
                    Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    };
}

macro_rules! byte_property {
    ($(#[$meta:meta])* $name:ident, $id:expr, $ok:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            buf: [u8; 2],
        }

        impl $name {
            pub fn new(v: u8) -> Result<Self, MqttError> {
                let ok: fn(u8) -> bool = $ok;
                if !ok(v) {
                    return Err(MqttError::MalformedPacket);
                }
                Ok(Self {
                    buf: [$id as u8, v],
                })
            }

            pub fn id(&self) -> PropertyId {
                $id
            }

            pub fn val(&self) -> u8 {
                self.buf[1]
            }

            pub fn size(&self) -> usize {
                2
            }

            pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
                vec![IoSlice::new(&self.buf)]
            }

            pub fn to_continuous_buffer(&self) -> Vec<u8> {
                self.buf.to_vec()
            }

            /// Parse the value bytes following an already-consumed id.
            pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MqttError> {
                if bytes.is_empty() {
                    return Err(MqttError::InsufficientBytes);
                }
                Ok((Self::new(bytes[0])?, 1))
            }
        }

        property_common!($name, |p, map| map.serialize_entry(p.id().as_str(), &p.val()));
    };
}

macro_rules! u16_property {
    ($(#[$meta:meta])* $name:ident, $id:expr, $ok:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            buf: [u8; 3],
        }

        impl $name {
            pub fn new(v: u16) -> Result<Self, MqttError> {
                let ok: fn(u16) -> bool = $ok;
                if !ok(v) {
                    return Err(MqttError::MalformedPacket);
                }
                let be = v.to_be_bytes();
                Ok(Self {
                    buf: [$id as u8, be[0], be[1]],
                })
            }

            pub fn id(&self) -> PropertyId {
                $id
            }

            pub fn val(&self) -> u16 {
                u16::from_be_bytes([self.buf[1], self.buf[2]])
            }

            pub fn size(&self) -> usize {
                3
            }

            pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
                vec![IoSlice::new(&self.buf)]
            }

            pub fn to_continuous_buffer(&self) -> Vec<u8> {
                self.buf.to_vec()
            }

            pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MqttError> {
                if bytes.len() < 2 {
                    return Err(MqttError::InsufficientBytes);
                }
                Ok((Self::new(u16::from_be_bytes([bytes[0], bytes[1]]))?, 2))
            }
        }

        property_common!($name, |p, map| map.serialize_entry(p.id().as_str(), &p.val()));
    };
}

macro_rules! u32_property {
    ($(#[$meta:meta])* $name:ident, $id:expr, $ok:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            buf: [u8; 5],
        }

        impl $name {
            pub fn new(v: u32) -> Result<Self, MqttError> {
                let ok: fn(u32) -> bool = $ok;
                if !ok(v) {
                    return Err(MqttError::MalformedPacket);
                }
                let be = v.to_be_bytes();
                Ok(Self {
                    buf: [$id as u8, be[0], be[1], be[2], be[3]],
                })
            }

            pub fn id(&self) -> PropertyId {
                $id
            }

            pub fn val(&self) -> u32 {
                u32::from_be_bytes([self.buf[1], self.buf[2], self.buf[3], self.buf[4]])
            }

            pub fn size(&self) -> usize {
                5
            }

            pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
                vec![IoSlice::new(&self.buf)]
            }

            pub fn to_continuous_buffer(&self) -> Vec<u8> {
                self.buf.to_vec()
            }

            pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MqttError> {
                if bytes.len() < 4 {
                    return Err(MqttError::InsufficientBytes);
                }
                Ok((
                    Self::new(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))?,
                    4,
                ))
            }
        }

        property_common!($name, |p, map| map.serialize_entry(p.id().as_str(), &p.val()));
    };
}

macro_rules! vbi_property {
    ($(#[$meta:meta])* $name:ident, $id:expr, $ok:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            id_buf: [u8; 1],
            value: VariableByteInteger,
        }

        impl $name {
            pub fn new(v: u32) -> Result<Self, MqttError> {
                let ok: fn(u32) -> bool = $ok;
                if !ok(v) {
                    return Err(MqttError::MalformedPacket);
                }
                let value = VariableByteInteger::from_u32(v).ok_or(MqttError::ValueOutOfRange)?;
                Ok(Self {
                    id_buf: [$id as u8],
                    value,
                })
            }

            pub fn id(&self) -> PropertyId {
                $id
            }

            pub fn val(&self) -> u32 {
                self.value.to_u32()
            }

            pub fn size(&self) -> usize {
                1 + self.value.size()
            }

            pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
                vec![IoSlice::new(&self.id_buf), IoSlice::new(self.value.as_bytes())]
            }

            pub fn to_continuous_buffer(&self) -> Vec<u8> {
                let mut buf = Vec::with_capacity(self.size());
                buf.extend_from_slice(&self.id_buf);
                buf.extend_from_slice(self.value.as_bytes());
                buf
            }

            pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MqttError> {
                match VariableByteInteger::decode_stream(bytes) {
                    DecodeResult::Ok(vbi, consumed) => Ok((Self::new(vbi.to_u32())?, consumed)),
                    DecodeResult::Incomplete => Err(MqttError::InsufficientBytes),
                    DecodeResult::Err(_) => Err(MqttError::MalformedPacket),
                }
            }
        }

        property_common!($name, |p, map| map.serialize_entry(p.id().as_str(), &p.val()));
    };
}

macro_rules! string_property {
    ($(#[$meta:meta])* $name:ident, $id:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            id_buf: [u8; 1],
            value: MqttString,
        }

        impl $name {
            pub fn new(v: impl Into<String>) -> Result<Self, MqttError> {
                Ok(Self {
                    id_buf: [$id as u8],
                    value: MqttString::new(v)?,
                })
            }

            pub fn id(&self) -> PropertyId {
                $id
            }

            pub fn val(&self) -> &str {
                self.value.as_str()
            }

            pub fn size(&self) -> usize {
                1 + self.value.size()
            }

            pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
                let mut bufs = vec![IoSlice::new(&self.id_buf)];
                bufs.append(&mut self.value.to_buffers());
                bufs
            }

            pub fn to_continuous_buffer(&self) -> Vec<u8> {
                let mut buf = Vec::with_capacity(self.size());
                buf.extend_from_slice(&self.id_buf);
                buf.append(&mut self.value.to_continuous_buffer());
                buf
            }

            pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MqttError> {
                let (value, consumed) = MqttString::decode(bytes)?;
                Ok((
                    Self {
                        id_buf: [$id as u8],
                        value,
                    },
                    consumed,
                ))
            }
        }

        property_common!($name, |p, map| map.serialize_entry(p.id().as_str(), p.val()));
    };
}

macro_rules! binary_property {
    ($(#[$meta:meta])* $name:ident, $id:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            id_buf: [u8; 1],
            value: MqttBinary,
        }

        impl $name {
            pub fn new(v: impl Into<Vec<u8>>) -> Result<Self, MqttError> {
                Ok(Self {
                    id_buf: [$id as u8],
                    value: MqttBinary::new(v)?,
                })
            }

            pub fn id(&self) -> PropertyId {
                $id
            }

            pub fn val(&self) -> &[u8] {
                self.value.as_slice()
            }

            pub fn size(&self) -> usize {
                1 + self.value.size()
            }

            pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
                let mut bufs = vec![IoSlice::new(&self.id_buf)];
                bufs.append(&mut self.value.to_buffers());
                bufs
            }

            pub fn to_continuous_buffer(&self) -> Vec<u8> {
                let mut buf = Vec::with_capacity(self.size());
                buf.extend_from_slice(&self.id_buf);
                buf.append(&mut self.value.to_continuous_buffer());
                buf
            }

            pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MqttError> {
                let (value, consumed) = MqttBinary::decode(bytes)?;
                Ok((
                    Self {
                        id_buf: [$id as u8],
                        value,
                    },
                    consumed,
                ))
            }
        }

        property_common!($name, |p, map| map
            .serialize_entry(p.id().as_str(), &format!("{:02x?}", p.val())));
    };
}

byte_property!(
    /// Format of the PUBLISH payload; only 0 (binary) and 1 (UTF-8) exist.
    PayloadFormatIndicator,
    PropertyId::PayloadFormatIndicator,
    |v| v <= 1
);
u32_property!(
    MessageExpiryInterval,
    PropertyId::MessageExpiryInterval,
    |_| true
);
string_property!(ContentType, PropertyId::ContentType);
string_property!(ResponseTopic, PropertyId::ResponseTopic);
binary_property!(CorrelationData, PropertyId::CorrelationData);
vbi_property!(
    /// Non-zero by specification; one per matching subscription in an
    /// incoming PUBLISH.
    SubscriptionIdentifier,
    PropertyId::SubscriptionIdentifier,
    |v| v != 0
);
u32_property!(
    SessionExpiryInterval,
    PropertyId::SessionExpiryInterval,
    |_| true
);
string_property!(
    AssignedClientIdentifier,
    PropertyId::AssignedClientIdentifier
);
u16_property!(ServerKeepAlive, PropertyId::ServerKeepAlive, |_| true);
string_property!(AuthenticationMethod, PropertyId::AuthenticationMethod);
binary_property!(AuthenticationData, PropertyId::AuthenticationData);
byte_property!(
    RequestProblemInformation,
    PropertyId::RequestProblemInformation,
    |v| v <= 1
);
u32_property!(WillDelayInterval, PropertyId::WillDelayInterval, |_| true);
byte_property!(
    RequestResponseInformation,
    PropertyId::RequestResponseInformation,
    |v| v <= 1
);
string_property!(ResponseInformation, PropertyId::ResponseInformation);
string_property!(ServerReference, PropertyId::ServerReference);
string_property!(ReasonString, PropertyId::ReasonString);
u16_property!(ReceiveMaximum, PropertyId::ReceiveMaximum, |v| v != 0);
u16_property!(TopicAliasMaximum, PropertyId::TopicAliasMaximum, |_| true);
u16_property!(TopicAlias, PropertyId::TopicAlias, |v| v != 0);
byte_property!(MaximumQos, PropertyId::MaximumQos, |v| v <= 1);
byte_property!(RetainAvailable, PropertyId::RetainAvailable, |v| v <= 1);
u32_property!(MaximumPacketSize, PropertyId::MaximumPacketSize, |v| v != 0);
byte_property!(
    WildcardSubscriptionAvailable,
    PropertyId::WildcardSubscriptionAvailable,
    |v| v <= 1
);
byte_property!(
    SubscriptionIdentifierAvailable,
    PropertyId::SubscriptionIdentifierAvailable,
    |v| v <= 1
);
byte_property!(
    SharedSubscriptionAvailable,
    PropertyId::SharedSubscriptionAvailable,
    |v| v <= 1
);

/// UTF-8 string pair carrying an application defined name and value.
///
/// The only property that may appear any number of times in any packet.
#[derive(Clone, PartialEq, Eq)]
pub struct UserProperty {
    id_buf: [u8; 1],
    key: MqttString,
    val: MqttString,
}

impl UserProperty {
    pub fn new(key: impl Into<String>, val: impl Into<String>) -> Result<Self, MqttError> {
        Ok(Self {
            id_buf: [PropertyId::UserProperty as u8],
            key: MqttString::new(key)?,
            val: MqttString::new(val)?,
        })
    }

    pub fn id(&self) -> PropertyId {
        PropertyId::UserProperty
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn val(&self) -> &str {
        self.val.as_str()
    }

    pub fn size(&self) -> usize {
        1 + self.key.size() + self.val.size()
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        let mut bufs = vec![IoSlice::new(&self.id_buf)];
        bufs.append(&mut self.key.to_buffers());
        bufs.append(&mut self.val.to_buffers());
        bufs
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend_from_slice(&self.id_buf);
        buf.append(&mut self.key.to_continuous_buffer());
        buf.append(&mut self.val.to_continuous_buffer());
        buf
    }

    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MqttError> {
        let (key, consumed_key) = MqttString::decode(bytes)?;
        let (val, consumed_val) = MqttString::decode(&bytes[consumed_key..])?;
        Ok((
            Self {
                id_buf: [PropertyId::UserProperty as u8],
                key,
                val,
            },
            consumed_key + consumed_val,
        ))
    }
}

property_common!(UserProperty, |p, map| map.serialize_entry(p.key(), p.val()));

/// Typed MQTT v5.0 property, one variant per identifier.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum Property {
    PayloadFormatIndicator(PayloadFormatIndicator),
    MessageExpiryInterval(MessageExpiryInterval),
    ContentType(ContentType),
    ResponseTopic(ResponseTopic),
    CorrelationData(CorrelationData),
    SubscriptionIdentifier(SubscriptionIdentifier),
    SessionExpiryInterval(SessionExpiryInterval),
    AssignedClientIdentifier(AssignedClientIdentifier),
    ServerKeepAlive(ServerKeepAlive),
    AuthenticationMethod(AuthenticationMethod),
    AuthenticationData(AuthenticationData),
    RequestProblemInformation(RequestProblemInformation),
    WillDelayInterval(WillDelayInterval),
    RequestResponseInformation(RequestResponseInformation),
    ResponseInformation(ResponseInformation),
    ServerReference(ServerReference),
    ReasonString(ReasonString),
    ReceiveMaximum(ReceiveMaximum),
    TopicAliasMaximum(TopicAliasMaximum),
    TopicAlias(TopicAlias),
    MaximumQos(MaximumQos),
    RetainAvailable(RetainAvailable),
    UserProperty(UserProperty),
    MaximumPacketSize(MaximumPacketSize),
    WildcardSubscriptionAvailable(WildcardSubscriptionAvailable),
    SubscriptionIdentifierAvailable(SubscriptionIdentifierAvailable),
    SharedSubscriptionAvailable(SharedSubscriptionAvailable),
}

macro_rules! property_dispatch {
    ($self:ident, $p:ident => $body:expr) => {
        match $self {
            Property::PayloadFormatIndicator($p) => $body,
            Property::MessageExpiryInterval($p) => $body,
            Property::ContentType($p) => $body,
            Property::ResponseTopic($p) => $body,
            Property::CorrelationData($p) => $body,
            Property::SubscriptionIdentifier($p) => $body,
            Property::SessionExpiryInterval($p) => $body,
            Property::AssignedClientIdentifier($p) => $body,
            Property::ServerKeepAlive($p) => $body,
            Property::AuthenticationMethod($p) => $body,
            Property::AuthenticationData($p) => $body,
            Property::RequestProblemInformation($p) => $body,
            Property::WillDelayInterval($p) => $body,
            Property::RequestResponseInformation($p) => $body,
            Property::ResponseInformation($p) => $body,
            Property::ServerReference($p) => $body,
            Property::ReasonString($p) => $body,
            Property::ReceiveMaximum($p) => $body,
            Property::TopicAliasMaximum($p) => $body,
            Property::TopicAlias($p) => $body,
            Property::MaximumQos($p) => $body,
            Property::RetainAvailable($p) => $body,
            Property::UserProperty($p) => $body,
            Property::MaximumPacketSize($p) => $body,
            Property::WildcardSubscriptionAvailable($p) => $body,
            Property::SubscriptionIdentifierAvailable($p) => $body,
            Property::SharedSubscriptionAvailable($p) => $body,
        }
    };
}

impl Property {
    /// The identifier of this property.
    pub fn id(&self) -> PropertyId {
        property_dispatch!(self, p => p.id())
    }

    /// Encoded size in bytes including the identifier.
    pub fn size(&self) -> usize {
        property_dispatch!(self, p => p.size())
    }

    pub fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        property_dispatch!(self, p => p.to_buffers())
    }

    pub fn to_continuous_buffer(&self) -> Vec<u8> {
        property_dispatch!(self, p => p.to_continuous_buffer())
    }

    /// Parse a property starting at its identifier byte.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MqttError> {
        if bytes.is_empty() {
            return Err(MqttError::InsufficientBytes);
        }

        let id = PropertyId::try_from(bytes[0]).map_err(|_| MqttError::MalformedPacket)?;
        let rest = &bytes[1..];

        macro_rules! typed {
            ($variant:ident) => {{
                let (p, consumed) = $variant::parse(rest)?;
                Ok((Self::$variant(p), consumed + 1))
            }};
        }

        match id {
            PropertyId::PayloadFormatIndicator => typed!(PayloadFormatIndicator),
            PropertyId::MessageExpiryInterval => typed!(MessageExpiryInterval),
            PropertyId::ContentType => typed!(ContentType),
            PropertyId::ResponseTopic => typed!(ResponseTopic),
            PropertyId::CorrelationData => typed!(CorrelationData),
            PropertyId::SubscriptionIdentifier => typed!(SubscriptionIdentifier),
            PropertyId::SessionExpiryInterval => typed!(SessionExpiryInterval),
            PropertyId::AssignedClientIdentifier => typed!(AssignedClientIdentifier),
            PropertyId::ServerKeepAlive => typed!(ServerKeepAlive),
            PropertyId::AuthenticationMethod => typed!(AuthenticationMethod),
            PropertyId::AuthenticationData => typed!(AuthenticationData),
            PropertyId::RequestProblemInformation => typed!(RequestProblemInformation),
            PropertyId::WillDelayInterval => typed!(WillDelayInterval),
            PropertyId::RequestResponseInformation => typed!(RequestResponseInformation),
            PropertyId::ResponseInformation => typed!(ResponseInformation),
            PropertyId::ServerReference => typed!(ServerReference),
            PropertyId::ReasonString => typed!(ReasonString),
            PropertyId::ReceiveMaximum => typed!(ReceiveMaximum),
            PropertyId::TopicAliasMaximum => typed!(TopicAliasMaximum),
            PropertyId::TopicAlias => typed!(TopicAlias),
            PropertyId::MaximumQos => typed!(MaximumQos),
            PropertyId::RetainAvailable => typed!(RetainAvailable),
            PropertyId::UserProperty => typed!(UserProperty),
            PropertyId::MaximumPacketSize => typed!(MaximumPacketSize),
            PropertyId::WildcardSubscriptionAvailable => typed!(WildcardSubscriptionAvailable),
            PropertyId::SubscriptionIdentifierAvailable => typed!(SubscriptionIdentifierAvailable),
            PropertyId::SharedSubscriptionAvailable => typed!(SharedSubscriptionAvailable),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        property_dispatch!(self, p => write!(f, "{p}"))
    }
}

/// Trait for accessing property values without matching on every variant.
///
/// Each method returns `Some` only for the variants that store the
/// requested value shape.
pub trait PropertyValueAccess {
    fn as_u8(&self) -> Option<u8>;
    fn as_u16(&self) -> Option<u16>;
    fn as_u32(&self) -> Option<u32>;
    fn as_str(&self) -> Option<&str>;
    fn as_bytes(&self) -> Option<&[u8]>;
    fn as_key_value(&self) -> Option<(&str, &str)>;
}

impl PropertyValueAccess for Property {
    fn as_u8(&self) -> Option<u8> {
        match self {
            Property::PayloadFormatIndicator(p) => Some(p.val()),
            Property::MaximumQos(p) => Some(p.val()),
            Property::RetainAvailable(p) => Some(p.val()),
            Property::RequestProblemInformation(p) => Some(p.val()),
            Property::RequestResponseInformation(p) => Some(p.val()),
            Property::WildcardSubscriptionAvailable(p) => Some(p.val()),
            Property::SubscriptionIdentifierAvailable(p) => Some(p.val()),
            Property::SharedSubscriptionAvailable(p) => Some(p.val()),
            _ => None,
        }
    }

    fn as_u16(&self) -> Option<u16> {
        match self {
            Property::TopicAlias(p) => Some(p.val()),
            Property::ReceiveMaximum(p) => Some(p.val()),
            Property::TopicAliasMaximum(p) => Some(p.val()),
            Property::ServerKeepAlive(p) => Some(p.val()),
            _ => None,
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            Property::MessageExpiryInterval(p) => Some(p.val()),
            Property::SessionExpiryInterval(p) => Some(p.val()),
            Property::WillDelayInterval(p) => Some(p.val()),
            Property::MaximumPacketSize(p) => Some(p.val()),
            Property::SubscriptionIdentifier(p) => Some(p.val()),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Property::ContentType(p) => Some(p.val()),
            Property::ResponseTopic(p) => Some(p.val()),
            Property::AssignedClientIdentifier(p) => Some(p.val()),
            Property::AuthenticationMethod(p) => Some(p.val()),
            Property::ResponseInformation(p) => Some(p.val()),
            Property::ServerReference(p) => Some(p.val()),
            Property::ReasonString(p) => Some(p.val()),
            _ => None,
        }
    }

    fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Property::CorrelationData(p) => Some(p.val()),
            Property::AuthenticationData(p) => Some(p.val()),
            _ => None,
        }
    }

    fn as_key_value(&self) -> Option<(&str, &str)> {
        match self {
            Property::UserProperty(p) => Some((p.key(), p.val())),
            _ => None,
        }
    }
}

/// Collection of MQTT properties, stored in wire order.
pub type Properties = Vec<Property>;

/// Trait for converting a properties collection to a continuous buffer
/// (content only, without the length prefix).
pub trait PropertiesToContinuousBuffer {
    fn to_continuous_buffer(&self) -> Vec<u8>;
}

/// Trait for converting a properties collection to IoSlice buffers for
/// vectored I/O (content only, without the length prefix).
pub trait PropertiesToBuffers {
    fn to_buffers(&self) -> Vec<IoSlice<'_>>;
}

impl PropertiesToContinuousBuffer for Properties {
    fn to_continuous_buffer(&self) -> Vec<u8> {
        let mut result = Vec::new();

        for prop in self {
            result.append(&mut prop.to_continuous_buffer());
        }

        result
    }
}

impl PropertiesToBuffers for Properties {
    fn to_buffers(&self) -> Vec<IoSlice<'_>> {
        let mut result = Vec::new();

        for prop in self {
            result.append(&mut prop.to_buffers());
        }

        result
    }
}

/// Total encoded size of the collection in bytes, without the length
/// prefix.
pub trait PropertiesSize {
    fn size(&self) -> usize;
}

impl PropertiesSize for Properties {
    fn size(&self) -> usize {
        self.iter().map(|prop| prop.size()).sum()
    }
}

/// Parse a properties collection from its wire form: a variable byte
/// integer length prefix followed by that many bytes of content.
pub trait PropertiesParse {
    fn parse(data: &[u8]) -> Result<(Self, usize), MqttError>
    where
        Self: Sized;
}

impl PropertiesParse for Properties {
    fn parse(data: &[u8]) -> Result<(Self, usize), MqttError> {
        if data.is_empty() {
            return Err(MqttError::InsufficientBytes);
        }

        let (prop_len, consumed) = match VariableByteInteger::decode_stream(data) {
            DecodeResult::Ok(vbi, cons) => (vbi, cons),
            DecodeResult::Incomplete => return Err(MqttError::InsufficientBytes),
            DecodeResult::Err(_) => return Err(MqttError::MalformedPacket),
        };

        let mut cursor = consumed;
        let mut props = Properties::new();

        if prop_len.to_u32() == 0 {
            return Ok((props, cursor));
        }

        let props_end = cursor + prop_len.to_u32() as usize;
        if props_end > data.len() {
            return Err(MqttError::InsufficientBytes);
        }

        while cursor < props_end {
            let (p, c) = Property::parse(&data[cursor..props_end])?;
            props.push(p);
            cursor += c;
        }

        Ok((props, cursor))
    }
}

/// Look up whether a property id is legal in the given packet type.
fn allowed_in(id: PropertyId, packet_type: PacketType) -> bool {
    use PacketType::*;
    use PropertyId::*;
    match id {
        PayloadFormatIndicator | MessageExpiryInterval | ContentType | ResponseTopic
        | CorrelationData => matches!(packet_type, Publish),
        SubscriptionIdentifier => matches!(packet_type, Publish | Subscribe),
        SessionExpiryInterval => matches!(packet_type, Connect | Connack | Disconnect),
        AssignedClientIdentifier | ResponseInformation | MaximumQos | RetainAvailable
        | WildcardSubscriptionAvailable | SubscriptionIdentifierAvailable
        | SharedSubscriptionAvailable | ServerKeepAlive => matches!(packet_type, Connack),
        AuthenticationMethod | AuthenticationData => matches!(packet_type, Connect | Connack | Auth),
        RequestProblemInformation | RequestResponseInformation => matches!(packet_type, Connect),
        WillDelayInterval => false, // will properties only, see validate_will_properties
        ServerReference => matches!(packet_type, Connack | Disconnect),
        ReasonString => matches!(
            packet_type,
            Connack | Puback | Pubrec | Pubrel | Pubcomp | Suback | Unsuback | Disconnect | Auth
        ),
        ReceiveMaximum | TopicAliasMaximum | MaximumPacketSize => {
            matches!(packet_type, Connect | Connack)
        }
        TopicAlias => matches!(packet_type, Publish),
        UserProperty => true,
    }
}

/// Validate a property collection against the legality table of the given
/// packet type and the duplicate rules.
///
/// `UserProperty` may repeat freely. `SubscriptionIdentifier` may repeat in
/// an incoming PUBLISH (one per matching subscription) but at most once in
/// SUBSCRIBE. Every other property is limited to a single occurrence.
pub fn validate_properties_for(
    props: &Properties,
    packet_type: PacketType,
) -> Result<(), MqttError> {
    let mut seen: Vec<PropertyId> = Vec::new();
    for prop in props {
        let id = prop.id();
        if !allowed_in(id, packet_type) {
            return Err(MqttError::ProtocolError);
        }
        let repeatable = id == PropertyId::UserProperty
            || (id == PropertyId::SubscriptionIdentifier && packet_type == PacketType::Publish);
        if !repeatable {
            if seen.contains(&id) {
                return Err(MqttError::ProtocolError);
            }
            seen.push(id);
        }
    }
    Ok(())
}

/// Validate the property collection attached to a will message inside
/// CONNECT.
pub fn validate_will_properties(props: &Properties) -> Result<(), MqttError> {
    use PropertyId::*;
    let mut seen: Vec<PropertyId> = Vec::new();
    for prop in props {
        let id = prop.id();
        let legal = matches!(
            id,
            PayloadFormatIndicator
                | MessageExpiryInterval
                | ContentType
                | ResponseTopic
                | CorrelationData
                | WillDelayInterval
                | UserProperty
        );
        if !legal {
            return Err(MqttError::ProtocolError);
        }
        if id != UserProperty {
            if seen.contains(&id) {
                return Err(MqttError::ProtocolError);
            }
            seen.push(id);
        }
    }
    Ok(())
}
