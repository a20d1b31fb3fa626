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

use mqtt_client_core::mqtt::packet::v5_0::Publish;
use mqtt_client_core::mqtt::packet::{Packet, Properties, Qos, TopicAlias};
use mqtt_client_core::mqtt::result_code::MqttError;

#[test]
fn qos1_wire_layout() {
    let publish = Publish::builder()
        .topic_name("a/b")
        .unwrap()
        .qos(Qos::AtLeastOnce)
        .packet_id(1u16)
        .payload(vec![0x01, 0x02, 0x03])
        .build()
        .unwrap();

    let bytes = publish.to_continuous_buffer();
    // Flags nibble: QoS bit 1 set, DUP and RETAIN clear.
    assert_eq!(bytes[0], 0x32);
    assert_eq!(
        bytes[1..],
        [
            0x0B, // remaining length
            0x00, 0x03, b'a', b'/', b'b', // topic
            0x00, 0x01, // packet id
            0x00, // empty property list
            0x01, 0x02, 0x03, // payload
        ]
    );
    assert_eq!(bytes.len(), publish.size());
}

#[test]
fn qos0_round_trip() {
    let publish = Publish::builder()
        .topic_name("metrics/cpu")
        .unwrap()
        .qos(Qos::AtMostOnce)
        .retain(true)
        .payload(&b"55"[..])
        .build()
        .unwrap();

    let bytes = publish.to_continuous_buffer();
    let Packet::Publish(decoded) = common::reparse(&bytes) else {
        panic!("not a PUBLISH");
    };
    assert_eq!(decoded.topic_name(), "metrics/cpu");
    assert_eq!(decoded.packet_id(), None);
    assert_eq!(decoded.qos(), Qos::AtMostOnce);
    assert!(decoded.retain());
    assert!(!decoded.dup());
    assert_eq!(decoded.payload(), b"55");
    assert_eq!(decoded, publish);
}

#[test]
fn qos2_with_properties_round_trip() {
    let mut props = Properties::new();
    props.push(TopicAlias::new(4).unwrap().into());

    let publish = Publish::builder()
        .topic_name("t")
        .unwrap()
        .qos(Qos::ExactlyOnce)
        .dup(true)
        .packet_id(0x1234u16)
        .props(props)
        .payload(Vec::new())
        .build()
        .unwrap();

    let bytes = publish.to_continuous_buffer();
    let Packet::Publish(decoded) = common::reparse(&bytes) else {
        panic!("not a PUBLISH");
    };
    assert_eq!(decoded.packet_id(), Some(0x1234));
    assert_eq!(decoded.qos(), Qos::ExactlyOnce);
    assert!(decoded.dup());
    assert!(decoded.payload().is_empty());
    assert_eq!(decoded, publish);
}

#[test]
fn qos_three_rejected_on_parse() {
    let publish = Publish::builder()
        .topic_name("t")
        .unwrap()
        .qos(Qos::AtLeastOnce)
        .packet_id(1u16)
        .build()
        .unwrap();
    let bytes = publish.to_continuous_buffer();
    // Force the two QoS bits on.
    assert_eq!(
        Publish::parse(bytes[0] | 0b0000_0110, &bytes[2..]).unwrap_err(),
        MqttError::MalformedPacket
    );
}

#[test]
fn missing_packet_id_rejected_by_builder() {
    let result = Publish::builder()
        .topic_name("t")
        .unwrap()
        .qos(Qos::AtLeastOnce)
        .build();
    assert_eq!(result.unwrap_err(), MqttError::MalformedPacket);

    let result = Publish::builder()
        .topic_name("t")
        .unwrap()
        .qos(Qos::AtMostOnce)
        .packet_id(3u16)
        .build();
    assert_eq!(result.unwrap_err(), MqttError::MalformedPacket);
}

#[test]
fn truncated_publish_reports_insufficient_bytes() {
    let publish = Publish::builder()
        .topic_name("sensors/t1")
        .unwrap()
        .qos(Qos::AtLeastOnce)
        .packet_id(7u16)
        .payload(&b"22.5"[..])
        .build()
        .unwrap();
    let bytes = publish.to_continuous_buffer();
    let body = &bytes[2..];

    // Any strict prefix that cuts into topic or packet id must report
    // missing data, never read past the slice.
    for k in 0..body.len() - 4 {
        let err = Publish::parse(bytes[0], &body[..k]).unwrap_err();
        assert_eq!(err, MqttError::InsufficientBytes, "prefix {k}");
    }
}
