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

use mqtt_client_core::mqtt::packet::v5_0::{Puback, Pubcomp, Pubrec, Pubrel};
use mqtt_client_core::mqtt::packet::{Packet, Properties, ReasonString};
use mqtt_client_core::mqtt::result_code::{
    MqttError, PubackReasonCode, PubcompReasonCode, PubrecReasonCode, PubrelReasonCode,
};

#[test]
fn shortened_success_form_is_two_bytes_of_body() {
    let puback = Puback::builder().packet_id(9u16).build().unwrap();
    let bytes = puback.to_continuous_buffer();
    // type + remaining length + packet id, nothing else
    assert_eq!(bytes, [0x40, 0x02, 0x00, 0x09]);
    assert_eq!(puback.size(), 4);

    let Packet::Puback(decoded) = common::reparse(&bytes) else {
        panic!("not a PUBACK");
    };
    assert_eq!(decoded.packet_id(), 9);
    assert_eq!(decoded.reason_code(), None);
    assert!(decoded.props().is_none());
}

#[test]
fn reason_code_only_form() {
    let pubrec = Pubrec::builder()
        .packet_id(0x0100u16)
        .reason_code(PubrecReasonCode::NoMatchingSubscribers)
        .build()
        .unwrap();
    let bytes = pubrec.to_continuous_buffer();
    assert_eq!(bytes, [0x50, 0x03, 0x01, 0x00, 0x10]);

    let Packet::Pubrec(decoded) = common::reparse(&bytes) else {
        panic!("not a PUBREC");
    };
    assert_eq!(decoded.packet_id(), 0x0100);
    assert_eq!(
        decoded.reason_code(),
        Some(PubrecReasonCode::NoMatchingSubscribers)
    );
    assert_eq!(decoded, pubrec);
}

#[test]
fn pubrel_fixed_header_carries_reserved_flags() {
    let pubrel = Pubrel::builder().packet_id(0x1234u16).build().unwrap();
    let bytes = pubrel.to_continuous_buffer();
    assert_eq!(bytes[0], 0x62);

    let Packet::Pubrel(decoded) = common::reparse(&bytes) else {
        panic!("not a PUBREL");
    };
    assert_eq!(decoded.packet_id(), 0x1234);

    // The same body under a zero flags nibble must be rejected.
    assert_eq!(
        Packet::parse(0x60, &bytes[2..]).unwrap_err(),
        MqttError::MalformedPacket
    );
}

#[test]
fn full_form_with_properties_round_trips() {
    let mut props = Properties::new();
    props.push(ReasonString::new("stop sending").unwrap().into());

    let pubcomp = Pubcomp::builder()
        .packet_id(77u16)
        .reason_code(PubcompReasonCode::PacketIdentifierNotFound)
        .props(props)
        .build()
        .unwrap();
    let bytes = pubcomp.to_continuous_buffer();
    assert_eq!(bytes.len(), pubcomp.size());

    let Packet::Pubcomp(decoded) = common::reparse(&bytes) else {
        panic!("not a PUBCOMP");
    };
    assert_eq!(decoded, pubcomp);
    assert_eq!(
        decoded.reason_code(),
        Some(PubcompReasonCode::PacketIdentifierNotFound)
    );
}

#[test]
fn zero_packet_id_is_malformed() {
    assert_eq!(
        Puback::builder().packet_id(0u16).build().unwrap_err(),
        MqttError::MalformedPacket
    );
    assert_eq!(
        Puback::parse(&[0x00, 0x00]).unwrap_err(),
        MqttError::MalformedPacket
    );
}

#[test]
fn properties_require_reason_code() {
    let mut props = Properties::new();
    props.push(ReasonString::new("x").unwrap().into());
    assert_eq!(
        Pubrel::builder()
            .packet_id(1u16)
            .props(props)
            .build()
            .unwrap_err(),
        MqttError::MalformedPacket
    );
}

#[test]
fn unknown_reason_code_rejected() {
    // 0x10 is valid for PUBACK but not for PUBREL.
    assert!(Puback::parse(&[0x00, 0x01, 0x10]).is_ok());
    assert_eq!(
        Pubrel::parse(&[0x00, 0x01, 0x10]).unwrap_err(),
        MqttError::MalformedPacket
    );
    assert!(Pubrel::parse(&[0x00, 0x01, 0x92]).is_ok());
}

#[test]
fn success_reason_with_props_keeps_reason_on_wire() {
    let mut props = Properties::new();
    props.push(ReasonString::new("ok").unwrap().into());
    let puback = Puback::builder()
        .packet_id(3u16)
        .reason_code(PubackReasonCode::Success)
        .props(props)
        .build()
        .unwrap();
    let bytes = puback.to_continuous_buffer();
    assert_eq!(bytes[4], 0x00); // explicit Success byte precedes properties

    let Packet::Puback(decoded) = common::reparse(&bytes) else {
        panic!("not a PUBACK");
    };
    assert_eq!(decoded.reason_code(), Some(PubackReasonCode::Success));
    assert_eq!(decoded, puback);
}

#[test]
fn pubrel_reason_code_enum_matches_spec_values() {
    assert_eq!(PubrelReasonCode::Success as u8, 0x00);
    assert_eq!(PubrelReasonCode::PacketIdentifierNotFound as u8, 0x92);
}
