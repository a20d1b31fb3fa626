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

use mqtt_client_core::mqtt::packet::{
    MaximumPacketSize, Packet, Properties, Property, PropertyValueAccess, Qos, UserProperty,
};
use mqtt_client_core::mqtt::packet::v5_0::Connect;
use mqtt_client_core::mqtt::result_code::MqttError;

#[test]
fn encode_and_decode_plain_connect() {
    let mut props = Properties::new();
    props.push(MaximumPacketSize::new(2048).unwrap().into());
    props.push(UserProperty::new("key", "value").unwrap().into());

    let connect = Connect::builder()
        .client_id("clientID")
        .unwrap()
        .clean_start(true)
        .keep_alive(60u16)
        .props(props)
        .build()
        .unwrap();

    let bytes = connect.to_continuous_buffer();
    assert_eq!(bytes.len(), connect.size());
    // Fixed header of a CONNECT.
    assert_eq!(bytes[0], 0x10);

    let Packet::Connect(decoded) = common::reparse(&bytes) else {
        panic!("not a CONNECT");
    };
    assert_eq!(decoded.client_id(), "clientID");
    assert_eq!(decoded.keep_alive(), 60);
    assert!(decoded.clean_start());
    assert!(!decoded.will_flag());
    assert!(!decoded.user_name_flag());
    assert!(!decoded.password_flag());
    assert_eq!(decoded.protocol_name(), "MQTT");
    assert_eq!(decoded.protocol_version(), 5);

    let max = decoded
        .props()
        .iter()
        .find(|p| matches!(p, Property::MaximumPacketSize(_)))
        .and_then(PropertyValueAccess::as_u32);
    assert_eq!(max, Some(2048));

    let pair = decoded
        .props()
        .iter()
        .find_map(PropertyValueAccess::as_key_value);
    assert_eq!(pair, Some(("key", "value")));

    assert_eq!(decoded, connect);
}

#[test]
fn will_and_credentials_round_trip() {
    let connect = Connect::builder()
        .client_id("dev-7")
        .unwrap()
        .clean_start(false)
        .keep_alive(30u16)
        .will_message("alarm/last", b"gone".to_vec(), Qos::AtLeastOnce, true, Properties::new())
        .unwrap()
        .user_name("sensor")
        .unwrap()
        .password(b"hunter2".to_vec())
        .unwrap()
        .build()
        .unwrap();

    let bytes = connect.to_continuous_buffer();
    let Packet::Connect(decoded) = common::reparse(&bytes) else {
        panic!("not a CONNECT");
    };
    assert!(decoded.will_flag());
    assert_eq!(decoded.will_topic(), Some("alarm/last"));
    assert_eq!(decoded.will_payload(), Some(&b"gone"[..]));
    assert_eq!(decoded.will_qos(), Qos::AtLeastOnce);
    assert!(decoded.will_retain());
    assert!(!decoded.clean_start());
    assert_eq!(decoded.user_name(), Some("sensor"));
    assert_eq!(decoded.password(), Some(&b"hunter2"[..]));
    assert_eq!(decoded, connect);
}

#[test]
fn empty_client_id_requests_assignment() {
    let connect = Connect::builder()
        .client_id("")
        .unwrap()
        .clean_start(true)
        .build()
        .unwrap();
    let bytes = connect.to_continuous_buffer();
    let Packet::Connect(decoded) = common::reparse(&bytes) else {
        panic!("not a CONNECT");
    };
    assert_eq!(decoded.client_id(), "");
}

#[test]
fn reserved_flag_bit_rejected_on_parse() {
    let connect = Connect::builder()
        .client_id("x")
        .unwrap()
        .build()
        .unwrap();
    let mut bytes = connect.to_continuous_buffer();
    // Body starts after the one-byte remaining length here; the connect
    // flags byte sits right after name + version.
    let flags_index = 2 + 6 + 1;
    bytes[flags_index] |= 0x01;
    let body = &bytes[2..];
    assert_eq!(
        Connect::parse(body).unwrap_err(),
        MqttError::MalformedPacket
    );
}

#[test]
fn wrong_protocol_version_rejected() {
    let connect = Connect::builder()
        .client_id("x")
        .unwrap()
        .build()
        .unwrap();
    let mut bytes = connect.to_continuous_buffer();
    bytes[2 + 6] = 4; // MQTT 3.1.1 protocol level
    assert_eq!(
        Connect::parse(&bytes[2..]).unwrap_err(),
        MqttError::UnsupportedProtocolVersion
    );
}
