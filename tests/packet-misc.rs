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
mod common;

use mqtt_client_core::mqtt::packet::v5_0::{Auth, Connack, Disconnect, Pingreq, Pingresp};
use mqtt_client_core::mqtt::packet::{
    AssignedClientIdentifier, AuthenticationMethod, Packet, Properties, Property, ServerKeepAlive,
};
use mqtt_client_core::mqtt::result_code::{
    AuthReasonCode, ConnectReasonCode, DisconnectReasonCode, MqttError,
};

#[test]
fn pingreq_is_exactly_two_bytes() {
    let ping = Pingreq::new();
    let bytes = ping.to_continuous_buffer();
    assert_eq!(bytes, [0xC0, 0x00]);
    assert_eq!(ping.size(), 2);

    let Packet::Pingreq(_) = common::reparse(&bytes) else {
        panic!("not a PINGREQ");
    };
}

#[test]
fn pingresp_is_exactly_two_bytes() {
    let bytes = Pingresp::new().to_continuous_buffer();
    assert_eq!(bytes, [0xD0, 0x00]);
    let Packet::Pingresp(_) = common::reparse(&bytes) else {
        panic!("not a PINGRESP");
    };
}

#[test]
fn ping_with_payload_is_malformed() {
    assert_eq!(
        Pingreq::parse(&[0x00]).unwrap_err(),
        MqttError::MalformedPacket
    );
}

#[test]
fn shortened_disconnect_is_two_bytes() {
    let disconnect = Disconnect::builder().build().unwrap();
    let bytes = disconnect.to_continuous_buffer();
    assert_eq!(bytes, [0xE0, 0x00]);

    let Packet::Disconnect(decoded) = common::reparse(&bytes) else {
        panic!("not a DISCONNECT");
    };
    // Absent reason implies normal disconnection.
    assert_eq!(decoded.reason_code(), None);
}

#[test]
fn disconnect_with_reason_round_trips() {
    let disconnect = Disconnect::builder()
        .reason_code(DisconnectReasonCode::DisconnectWithWillMessage)
        .build()
        .unwrap();
    let bytes = disconnect.to_continuous_buffer();
    assert_eq!(bytes, [0xE0, 0x01, 0x04]);

    let Packet::Disconnect(decoded) = common::reparse(&bytes) else {
        panic!("not a DISCONNECT");
    };
    assert_eq!(
        decoded.reason_code(),
        Some(DisconnectReasonCode::DisconnectWithWillMessage)
    );
}

#[test]
fn auth_round_trips_with_method() {
    let mut props = Properties::new();
    props.push(AuthenticationMethod::new("SCRAM-SHA-1").unwrap().into());

    let auth = Auth::builder()
        .reason_code(AuthReasonCode::ContinueAuthentication)
        .props(props)
        .build()
        .unwrap();
    let bytes = auth.to_continuous_buffer();
    assert_eq!(bytes.len(), auth.size());

    let Packet::Auth(decoded) = common::reparse(&bytes) else {
        panic!("not an AUTH");
    };
    assert_eq!(
        decoded.reason_code(),
        Some(AuthReasonCode::ContinueAuthentication)
    );
    assert_eq!(decoded, auth);
}

#[test]
fn shortened_auth_is_two_bytes() {
    let bytes = Auth::builder().build().unwrap().to_continuous_buffer();
    assert_eq!(bytes, [0xF0, 0x00]);
}

#[test]
fn connack_negotiation_fields_round_trip() {
    let mut props = Properties::new();
    props.push(AssignedClientIdentifier::new("assigned-1").unwrap().into());
    props.push(ServerKeepAlive::new(20).unwrap().into());

    let connack = Connack::builder()
        .session_present(true)
        .reason_code(ConnectReasonCode::Success)
        .props(props)
        .build()
        .unwrap();
    let bytes = connack.to_continuous_buffer();

    let Packet::Connack(decoded) = common::reparse(&bytes) else {
        panic!("not a CONNACK");
    };
    assert!(decoded.session_present());
    assert_eq!(decoded.reason_code(), ConnectReasonCode::Success);
    assert!(decoded
        .props()
        .iter()
        .any(|p| matches!(p, Property::ServerKeepAlive(_))));
    assert_eq!(decoded, connack);
}

#[test]
fn truncated_connack_reports_insufficient_bytes() {
    // A CONNACK header alone, then byte by byte until the full packet.
    let connack = Connack::builder()
        .reason_code(ConnectReasonCode::Success)
        .build()
        .unwrap();
    let bytes = connack.to_continuous_buffer();
    let body = &bytes[2..];

    for k in 0..body.len() {
        let err = Connack::parse(&body[..k]).unwrap_err();
        assert_eq!(err, MqttError::InsufficientBytes, "prefix {k}");
    }
    assert!(Connack::parse(body).is_ok());
}

#[test]
fn connack_reserved_ack_flags_rejected() {
    let connack = Connack::builder()
        .reason_code(ConnectReasonCode::Success)
        .build()
        .unwrap();
    let mut bytes = connack.to_continuous_buffer();
    bytes[2] |= 0b0000_0010;
    assert_eq!(
        Connack::parse(&bytes[2..]).unwrap_err(),
        MqttError::MalformedPacket
    );
}
