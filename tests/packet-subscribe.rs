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

use mqtt_client_core::mqtt::packet::v5_0::{Suback, Subscribe, Unsuback, Unsubscribe};
use mqtt_client_core::mqtt::packet::{
    Packet, Properties, Qos, RetainHandling, SubEntry, SubOpts, SubscriptionIdentifier,
};
use mqtt_client_core::mqtt::result_code::{MqttError, SubackReasonCode, UnsubackReasonCode};

#[test]
fn subscribe_round_trips() {
    let entries = vec![
        SubEntry::new("a/+", SubOpts::new().set_qos(Qos::AtLeastOnce)).unwrap(),
        SubEntry::new(
            "b/#",
            SubOpts::new()
                .set_qos(Qos::ExactlyOnce)
                .set_nl(true)
                .set_rap(true)
                .set_rh(RetainHandling::DoNotSendRetained),
        )
        .unwrap(),
    ];
    let mut props = Properties::new();
    props.push(SubscriptionIdentifier::new(42).unwrap().into());

    let subscribe = Subscribe::builder()
        .packet_id(5u16)
        .entries(entries)
        .props(props)
        .build()
        .unwrap();

    let bytes = subscribe.to_continuous_buffer();
    assert_eq!(bytes[0], 0x82);
    assert_eq!(bytes.len(), subscribe.size());

    let Packet::Subscribe(decoded) = common::reparse(&bytes) else {
        panic!("not a SUBSCRIBE");
    };
    assert_eq!(decoded.packet_id(), 5);
    assert_eq!(decoded.entries().len(), 2);
    assert_eq!(decoded.entries()[0].topic_filter(), "a/+");
    assert_eq!(decoded.entries()[1].sub_opts().qos(), Qos::ExactlyOnce);
    assert!(decoded.entries()[1].sub_opts().nl());
    assert_eq!(decoded, subscribe);
}

#[test]
fn subscribe_needs_at_least_one_entry() {
    assert_eq!(
        Subscribe::builder()
            .packet_id(1u16)
            .entries(Vec::<SubEntry>::new())
            .build()
            .unwrap_err(),
        MqttError::MalformedPacket
    );
}

#[test]
fn suback_round_trips_and_flags_failures() {
    let suback = Suback::builder()
        .packet_id(5u16)
        .reason_codes([
            SubackReasonCode::GrantedQos1,
            SubackReasonCode::NotAuthorized,
        ])
        .build()
        .unwrap();
    let bytes = suback.to_continuous_buffer();

    let Packet::Suback(decoded) = common::reparse(&bytes) else {
        panic!("not a SUBACK");
    };
    let codes = decoded.reason_codes();
    assert_eq!(codes.len(), 2);
    assert!(codes[0].is_success());
    assert!(codes[1].is_failure());
    assert_eq!(decoded, suback);
}

#[test]
fn unsubscribe_round_trips() {
    let unsubscribe = Unsubscribe::builder()
        .packet_id(9u16)
        .entries(["a/+", "b"])
        .unwrap()
        .build()
        .unwrap();
    let bytes = unsubscribe.to_continuous_buffer();
    assert_eq!(bytes[0], 0xA2);

    let Packet::Unsubscribe(decoded) = common::reparse(&bytes) else {
        panic!("not an UNSUBSCRIBE");
    };
    assert_eq!(decoded.packet_id(), 9);
    let filters: Vec<&str> = decoded.entries().collect();
    assert_eq!(filters, ["a/+", "b"]);
    assert_eq!(decoded, unsubscribe);
}

#[test]
fn unsuback_round_trips() {
    let unsuback = Unsuback::builder()
        .packet_id(9u16)
        .reason_codes([
            UnsubackReasonCode::Success,
            UnsubackReasonCode::NoSubscriptionExisted,
        ])
        .build()
        .unwrap();
    let bytes = unsuback.to_continuous_buffer();

    let Packet::Unsuback(decoded) = common::reparse(&bytes) else {
        panic!("not an UNSUBACK");
    };
    assert_eq!(decoded.packet_id(), 9);
    assert!(decoded.reason_codes().iter().all(|c| c.is_success()));
    assert_eq!(decoded, unsuback);
}

#[test]
fn invalid_sub_opts_rejected_on_parse() {
    let subscribe = Subscribe::builder()
        .packet_id(2u16)
        .entries(vec![SubEntry::new("x", SubOpts::new()).unwrap()])
        .build()
        .unwrap();
    let mut bytes = subscribe.to_continuous_buffer();
    // Corrupt the options byte (reserved bit).
    let last = bytes.len() - 1;
    bytes[last] = 0b1000_0000;
    assert_eq!(
        Subscribe::parse(&bytes[2..]).unwrap_err(),
        MqttError::MalformedPacket
    );
}
