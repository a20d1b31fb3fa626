//! MQTT v5.0 packet codec and typed packet model.
//!
//! Leaves first: the variable byte integer codec, length-prefixed strings
//! and binary blobs, the typed property system, then one module per
//! control packet under [`v5_0`] and the [`Packet`] sum type over all of
//! them.
//!
//! Every packet type follows the same surface: a builder with validation,
//! `size()`, `to_buffers()` / `to_continuous_buffer()` for serialization
//! and `parse()` for the reverse direction. Serialization is bit-exact per
//! the MQTT v5.0 specification, including the shortened ack forms that
//! omit the reason code and properties when they carry no information.

// MIT License
//
// Copyright (c) 2025 Takatoshi Kondo
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.


pub mod v5_0;

mod enum_packet;
mod mqtt_binary;
mod mqtt_string;
mod packet_id;
mod packet_type;
mod property;
mod qos;
mod retain_handling;
mod sub_entry;
mod variable_byte_integer;

pub use enum_packet::Packet;
pub use mqtt_binary::MqttBinary;
pub use mqtt_string::MqttString;
pub use packet_id::PacketIdAllocator;
pub use packet_type::{FixedHeader, PacketType};
pub use property::{
    validate_properties_for, validate_will_properties, AssignedClientIdentifier,
    AuthenticationData, AuthenticationMethod, ContentType, CorrelationData, MaximumPacketSize,
    MaximumQos, MessageExpiryInterval, PayloadFormat, PayloadFormatIndicator, Properties,
    PropertiesParse, PropertiesSize, PropertiesToBuffers, PropertiesToContinuousBuffer, Property,
    PropertyId, PropertyValueAccess, ReasonString, ReceiveMaximum, RequestProblemInformation,
    RequestResponseInformation, ResponseInformation, ResponseTopic, RetainAvailable,
    ServerKeepAlive, ServerReference, SessionExpiryInterval, SharedSubscriptionAvailable,
    SubscriptionIdentifier, SubscriptionIdentifierAvailable, TopicAlias, TopicAliasMaximum,
    UserProperty, WildcardSubscriptionAvailable, WillDelayInterval,
};
pub use qos::Qos;
pub use retain_handling::RetainHandling;
pub use sub_entry::{SubEntry, SubOpts};
pub use variable_byte_integer::{DecodeResult, VariableByteInteger};
