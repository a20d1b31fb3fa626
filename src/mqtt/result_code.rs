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
use derive_builder::UninitializedFieldError;
use num_enum::TryFromPrimitive;
use serde::{Serialize, Serializer};
use std::fmt;

/// Unified error type surfaced by the codec and the client engine.
///
/// The numeric space is split in two:
///
/// - `0x0080..=0x00A2` mirror the MQTT v5.0 reason codes, so a failure
///   reported by the broker can be returned to the caller unchanged
/// - `0x0101..` are library-level error kinds that never appear on the wire
///   (bad arguments, connection state violations, timeouts, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MqttError {
    // MQTT protocol based error
    UnspecifiedError = 0x0080,
    MalformedPacket = 0x0081,
    ProtocolError = 0x0082,
    ImplementationSpecificError = 0x0083,
    UnsupportedProtocolVersion = 0x0084,
    ClientIdentifierNotValid = 0x0085,
    BadUserNameOrPassword = 0x0086,
    NotAuthorized = 0x0087,
    ServerUnavailable = 0x0088,
    ServerBusy = 0x0089,
    Banned = 0x008A,
    ServerShuttingDown = 0x008B,
    BadAuthenticationMethod = 0x008C,
    KeepAliveTimeout = 0x008D,
    SessionTakenOver = 0x008E,
    TopicFilterInvalid = 0x008F,
    TopicNameInvalid = 0x0090,
    PacketIdentifierInUse = 0x0091,
    PacketIdentifierNotFound = 0x0092,
    ReceiveMaximumExceeded = 0x0093,
    TopicAliasInvalid = 0x0094,
    PacketTooLarge = 0x0095,
    MessageRateTooHigh = 0x0096,
    QuotaExceeded = 0x0097,
    AdministrativeAction = 0x0098,
    PayloadFormatInvalid = 0x0099,
    RetainNotSupported = 0x009A,
    QosNotSupported = 0x009B,
    UseAnotherServer = 0x009C,
    ServerMoved = 0x009D,
    SharedSubscriptionsNotSupported = 0x009E,
    ConnectionRateExceeded = 0x009F,
    MaximumConnectTime = 0x00A0,
    SubscriptionIdentifiersNotSupported = 0x00A1,
    WildcardSubscriptionsNotSupported = 0x00A2,

    // Library error
    /// The caller passed an illegal argument (empty topic, port 0, a reason
    /// code that is not allowed for the operation, ...).
    BadParameter = 0x0101,
    /// The validated property set is illegal for the packet being built.
    BadProperties = 0x0102,
    /// The operation requires a connected session.
    NotConnected = 0x0103,
    /// `connect_to` was called while a session is already open.
    AlreadyConnected = 0x0104,
    /// The transport did not complete within the configured timeout.
    TimedOut = 0x0105,
    /// Transport-level failure; the connection has been closed.
    NetworkError = 0x0106,
    /// An inbound packet interrupted a synchronous exchange, or an ACK did
    /// not match the expected packet identifier. Drive `event_loop` to
    /// resolve the out-of-order packet.
    TranscientPacket = 0x0107,
    /// An asynchronous result (unsubscribe) is not available yet.
    WaitingForResult = 0x0108,
    /// The decoder needs more bytes than the input slice holds.
    InsufficientBytes = 0x0109,
    /// A numeric field exceeds its encodable range.
    ValueOutOfRange = 0x010A,
}

// Map builder validation failures onto MalformedPacket.
impl From<UninitializedFieldError> for MqttError {
    fn from(_: UninitializedFieldError) -> Self {
        MqttError::MalformedPacket
    }
}

impl MqttError {
    /// Translate a raw reason byte received from the broker.
    ///
    /// Bytes below 0x80 are successes and have no error mapping; unknown
    /// failure bytes collapse to `UnspecifiedError`.
    pub fn from_reason_byte(byte: u8) -> Option<MqttError> {
        if byte < 0x80 {
            return None;
        }
        Some(Self::try_from(byte).unwrap_or(MqttError::UnspecifiedError))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnspecifiedError => "UnspecifiedError",
            Self::MalformedPacket => "MalformedPacket",
            Self::ProtocolError => "ProtocolError",
            Self::ImplementationSpecificError => "ImplementationSpecificError",
            Self::UnsupportedProtocolVersion => "UnsupportedProtocolVersion",
            Self::ClientIdentifierNotValid => "ClientIdentifierNotValid",
            Self::BadUserNameOrPassword => "BadUserNameOrPassword",
            Self::NotAuthorized => "NotAuthorized",
            Self::ServerUnavailable => "ServerUnavailable",
            Self::ServerBusy => "ServerBusy",
            Self::Banned => "Banned",
            Self::ServerShuttingDown => "ServerShuttingDown",
            Self::BadAuthenticationMethod => "BadAuthenticationMethod",
            Self::KeepAliveTimeout => "KeepAliveTimeout",
            Self::SessionTakenOver => "SessionTakenOver",
            Self::TopicFilterInvalid => "TopicFilterInvalid",
            Self::TopicNameInvalid => "TopicNameInvalid",
            Self::PacketIdentifierInUse => "PacketIdentifierInUse",
            Self::PacketIdentifierNotFound => "PacketIdentifierNotFound",
            Self::ReceiveMaximumExceeded => "ReceiveMaximumExceeded",
            Self::TopicAliasInvalid => "TopicAliasInvalid",
            Self::PacketTooLarge => "PacketTooLarge",
            Self::MessageRateTooHigh => "MessageRateTooHigh",
            Self::QuotaExceeded => "QuotaExceeded",
            Self::AdministrativeAction => "AdministrativeAction",
            Self::PayloadFormatInvalid => "PayloadFormatInvalid",
            Self::RetainNotSupported => "RetainNotSupported",
            Self::QosNotSupported => "QosNotSupported",
            Self::UseAnotherServer => "UseAnotherServer",
            Self::ServerMoved => "ServerMoved",
            Self::SharedSubscriptionsNotSupported => "SharedSubscriptionsNotSupported",
            Self::ConnectionRateExceeded => "ConnectionRateExceeded",
            Self::MaximumConnectTime => "MaximumConnectTime",
            Self::SubscriptionIdentifiersNotSupported => "SubscriptionIdentifiersNotSupported",
            Self::WildcardSubscriptionsNotSupported => "WildcardSubscriptionsNotSupported",
            Self::BadParameter => "BadParameter",
            Self::BadProperties => "BadProperties",
            Self::NotConnected => "NotConnected",
            Self::AlreadyConnected => "AlreadyConnected",
            Self::TimedOut => "TimedOut",
            Self::NetworkError => "NetworkError",
            Self::TranscientPacket => "TranscientPacket",
            Self::WaitingForResult => "WaitingForResult",
            Self::InsufficientBytes => "InsufficientBytes",
            Self::ValueOutOfRange => "ValueOutOfRange",
        }
    }
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for MqttError {}

impl Serialize for MqttError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl core::convert::TryFrom<u8> for MqttError {
    type Error = ();

    /// Accepts only the protocol reason-code range (>= 0x80).
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x80 => Ok(Self::UnspecifiedError),
            0x81 => Ok(Self::MalformedPacket),
            0x82 => Ok(Self::ProtocolError),
            0x83 => Ok(Self::ImplementationSpecificError),
            0x84 => Ok(Self::UnsupportedProtocolVersion),
            0x85 => Ok(Self::ClientIdentifierNotValid),
            0x86 => Ok(Self::BadUserNameOrPassword),
            0x87 => Ok(Self::NotAuthorized),
            0x88 => Ok(Self::ServerUnavailable),
            0x89 => Ok(Self::ServerBusy),
            0x8A => Ok(Self::Banned),
            0x8B => Ok(Self::ServerShuttingDown),
            0x8C => Ok(Self::BadAuthenticationMethod),
            0x8D => Ok(Self::KeepAliveTimeout),
            0x8E => Ok(Self::SessionTakenOver),
            0x8F => Ok(Self::TopicFilterInvalid),
            0x90 => Ok(Self::TopicNameInvalid),
            0x91 => Ok(Self::PacketIdentifierInUse),
            0x92 => Ok(Self::PacketIdentifierNotFound),
            0x93 => Ok(Self::ReceiveMaximumExceeded),
            0x94 => Ok(Self::TopicAliasInvalid),
            0x95 => Ok(Self::PacketTooLarge),
            0x96 => Ok(Self::MessageRateTooHigh),
            0x97 => Ok(Self::QuotaExceeded),
            0x98 => Ok(Self::AdministrativeAction),
            0x99 => Ok(Self::PayloadFormatInvalid),
            0x9A => Ok(Self::RetainNotSupported),
            0x9B => Ok(Self::QosNotSupported),
            0x9C => Ok(Self::UseAnotherServer),
            0x9D => Ok(Self::ServerMoved),
            0x9E => Ok(Self::SharedSubscriptionsNotSupported),
            0x9F => Ok(Self::ConnectionRateExceeded),
            0xA0 => Ok(Self::MaximumConnectTime),
            0xA1 => Ok(Self::SubscriptionIdentifiersNotSupported),
            0xA2 => Ok(Self::WildcardSubscriptionsNotSupported),
            _ => Err(()),
        }
    }
}

macro_rules! reason_code_common {
    ($name:ident) => {
        impl $name {
            pub fn is_failure(&self) -> bool {
                (*self as u8) >= 0x80
            }

            pub fn is_success(&self) -> bool {
                !self.is_failure()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&format!("{self:?}"))
            }
        }

        impl From<$name> for MqttError {
            /// Failure codes map onto the matching protocol error; success
            /// codes have no error meaning and collapse to
            /// `UnspecifiedError` (callers check `is_failure` first).
            fn from(code: $name) -> Self {
                MqttError::from_reason_byte(code as u8).unwrap_or(MqttError::UnspecifiedError)
            }
        }
    };
}

/// CONNACK reason codes (MQTT v5.0 3.2.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ConnectReasonCode {
    Success = 0x00,
    UnspecifiedError = 0x80,
    MalformedPacket = 0x81,
    ProtocolError = 0x82,
    ImplementationSpecificError = 0x83,
    UnsupportedProtocolVersion = 0x84,
    ClientIdentifierNotValid = 0x85,
    BadUserNameOrPassword = 0x86,
    NotAuthorized = 0x87,
    ServerUnavailable = 0x88,
    ServerBusy = 0x89,
    Banned = 0x8A,
    BadAuthenticationMethod = 0x8C,
    TopicNameInvalid = 0x90,
    PacketTooLarge = 0x95,
    QuotaExceeded = 0x97,
    PayloadFormatInvalid = 0x99,
    RetainNotSupported = 0x9A,
    QosNotSupported = 0x9B,
    UseAnotherServer = 0x9C,
    ServerMoved = 0x9D,
    ConnectionRateExceeded = 0x9F,
}
reason_code_common!(ConnectReasonCode);

/// DISCONNECT reason codes (MQTT v5.0 3.14.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum DisconnectReasonCode {
    NormalDisconnection = 0x00,
    DisconnectWithWillMessage = 0x04,
    UnspecifiedError = 0x80,
    MalformedPacket = 0x81,
    ProtocolError = 0x82,
    ImplementationSpecificError = 0x83,
    NotAuthorized = 0x87,
    ServerBusy = 0x89,
    ServerShuttingDown = 0x8B,
    KeepAliveTimeout = 0x8D,
    SessionTakenOver = 0x8E,
    TopicFilterInvalid = 0x8F,
    TopicNameInvalid = 0x90,
    ReceiveMaximumExceeded = 0x93,
    TopicAliasInvalid = 0x94,
    PacketTooLarge = 0x95,
    MessageRateTooHigh = 0x96,
    QuotaExceeded = 0x97,
    AdministrativeAction = 0x98,
    PayloadFormatInvalid = 0x99,
    RetainNotSupported = 0x9A,
    QosNotSupported = 0x9B,
    UseAnotherServer = 0x9C,
    ServerMoved = 0x9D,
    SharedSubscriptionsNotSupported = 0x9E,
    ConnectionRateExceeded = 0x9F,
    MaximumConnectTime = 0xA0,
    SubscriptionIdentifiersNotSupported = 0xA1,
    WildcardSubscriptionsNotSupported = 0xA2,
}
reason_code_common!(DisconnectReasonCode);

/// PUBACK reason codes (MQTT v5.0 3.4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum PubackReasonCode {
    Success = 0x00,
    NoMatchingSubscribers = 0x10,
    UnspecifiedError = 0x80,
    ImplementationSpecificError = 0x83,
    NotAuthorized = 0x87,
    TopicNameInvalid = 0x90,
    PacketIdentifierInUse = 0x91,
    QuotaExceeded = 0x97,
    PayloadFormatInvalid = 0x99,
}
reason_code_common!(PubackReasonCode);

/// PUBREC reason codes (MQTT v5.0 3.5.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum PubrecReasonCode {
    Success = 0x00,
    NoMatchingSubscribers = 0x10,
    UnspecifiedError = 0x80,
    ImplementationSpecificError = 0x83,
    NotAuthorized = 0x87,
    TopicNameInvalid = 0x90,
    PacketIdentifierInUse = 0x91,
    QuotaExceeded = 0x97,
    PayloadFormatInvalid = 0x99,
}
reason_code_common!(PubrecReasonCode);

/// PUBREL reason codes (MQTT v5.0 3.6.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum PubrelReasonCode {
    Success = 0x00,
    PacketIdentifierNotFound = 0x92,
}
reason_code_common!(PubrelReasonCode);

/// PUBCOMP reason codes (MQTT v5.0 3.7.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum PubcompReasonCode {
    Success = 0x00,
    PacketIdentifierNotFound = 0x92,
}
reason_code_common!(PubcompReasonCode);

/// SUBACK reason codes (MQTT v5.0 3.9.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum SubackReasonCode {
    GrantedQos0 = 0x00,
    GrantedQos1 = 0x01,
    GrantedQos2 = 0x02,
    UnspecifiedError = 0x80,
    ImplementationSpecificError = 0x83,
    NotAuthorized = 0x87,
    TopicFilterInvalid = 0x8F,
    PacketIdentifierInUse = 0x91,
    QuotaExceeded = 0x97,
    SharedSubscriptionsNotSupported = 0x9E,
    SubscriptionIdentifiersNotSupported = 0xA1,
    WildcardSubscriptionsNotSupported = 0xA2,
}
reason_code_common!(SubackReasonCode);

/// UNSUBACK reason codes (MQTT v5.0 3.11.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum UnsubackReasonCode {
    Success = 0x00,
    NoSubscriptionExisted = 0x11,
    UnspecifiedError = 0x80,
    ImplementationSpecificError = 0x83,
    NotAuthorized = 0x87,
    TopicFilterInvalid = 0x8F,
    PacketIdentifierInUse = 0x91,
}
reason_code_common!(UnsubackReasonCode);

/// AUTH reason codes (MQTT v5.0 3.15.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum AuthReasonCode {
    Success = 0x00,
    ContinueAuthentication = 0x18,
    ReAuthenticate = 0x19,
}
reason_code_common!(AuthReasonCode);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_byte_mapping() {
        assert_eq!(MqttError::from_reason_byte(0x00), None);
        assert_eq!(MqttError::from_reason_byte(0x18), None);
        assert_eq!(
            MqttError::from_reason_byte(0x87),
            Some(MqttError::NotAuthorized)
        );
        // Unknown failure bytes still report a failure.
        assert_eq!(
            MqttError::from_reason_byte(0xFF),
            Some(MqttError::UnspecifiedError)
        );
    }

    #[test]
    fn failure_threshold() {
        assert!(SubackReasonCode::GrantedQos2.is_success());
        assert!(SubackReasonCode::UnspecifiedError.is_failure());
        assert!(DisconnectReasonCode::NormalDisconnection.is_success());
        assert!(DisconnectReasonCode::DisconnectWithWillMessage.is_success());
        assert!(PubrelReasonCode::PacketIdentifierNotFound.is_failure());
    }
}
