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

use common::{establish_connection, MockTransport, RecordingHandler};
use mqtt_client_core::mqtt::packet::v5_0::{Suback, Unsuback};
use mqtt_client_core::mqtt::packet::{Packet, Properties, Qos, SubEntry, SubOpts};
use mqtt_client_core::mqtt::result_code::{MqttError, SubackReasonCode, UnsubackReasonCode};
use mqtt_client_core::mqtt::{Client, ClientOptions};

fn connected_client() -> (Client<RecordingHandler>, MockTransport) {
    let link = MockTransport::new();
    let mut client = Client::new(ClientOptions::new("sub-test"), RecordingHandler::new());
    establish_connection(&mut client, &link);
    (client, link)
}

#[test]
fn subscribe_round_trip_with_broker() {
    let (mut client, link) = connected_client();

    let suback: Packet = Suback::builder()
        .packet_id(1u16)
        .reason_codes([SubackReasonCode::GrantedQos1])
        .build()
        .unwrap()
        .into();
    link.push_packet(&suback);

    client
        .subscribe(
            "commands/+",
            SubOpts::new().set_qos(Qos::AtLeastOnce),
            Properties::new(),
        )
        .unwrap();

    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    let Packet::Subscribe(subscribe) = &frames[0] else {
        panic!("not a SUBSCRIBE");
    };
    assert_eq!(subscribe.packet_id(), 1);
    assert_eq!(subscribe.entries()[0].topic_filter(), "commands/+");
}

#[test]
fn subscribe_failure_code_is_the_result() {
    let (mut client, link) = connected_client();

    let suback: Packet = Suback::builder()
        .packet_id(1u16)
        .reason_codes([SubackReasonCode::TopicFilterInvalid])
        .build()
        .unwrap()
        .into();
    link.push_packet(&suback);

    let err = client
        .subscribe("bad/#/filter", SubOpts::new(), Properties::new())
        .unwrap_err();
    assert_eq!(err, MqttError::TopicFilterInvalid);
}

#[test]
fn suback_with_wrong_id_is_transient() {
    let (mut client, link) = connected_client();

    let suback: Packet = Suback::builder()
        .packet_id(77u16)
        .reason_codes([SubackReasonCode::GrantedQos0])
        .build()
        .unwrap()
        .into();
    link.push_packet(&suback);

    let err = client
        .subscribe("t", SubOpts::new(), Properties::new())
        .unwrap_err();
    assert_eq!(err, MqttError::TranscientPacket);
    assert!(client.is_connected());
}

#[test]
fn multi_entry_subscribe() {
    let (mut client, link) = connected_client();

    let suback: Packet = Suback::builder()
        .packet_id(1u16)
        .reason_codes([SubackReasonCode::GrantedQos2, SubackReasonCode::GrantedQos0])
        .build()
        .unwrap()
        .into();
    link.push_packet(&suback);

    let entries = vec![
        SubEntry::new("a/#", SubOpts::new().set_qos(Qos::ExactlyOnce)).unwrap(),
        SubEntry::new("b", SubOpts::new()).unwrap(),
    ];
    client.subscribe_many(entries, Properties::new()).unwrap();
}

#[test]
fn short_suback_payload_is_a_protocol_error() {
    let (mut client, link) = connected_client();

    // Two filters requested, one reason code returned.
    let suback: Packet = Suback::builder()
        .packet_id(1u16)
        .reason_codes([SubackReasonCode::GrantedQos0])
        .build()
        .unwrap()
        .into();
    link.push_packet(&suback);

    let entries = vec![
        SubEntry::new("a", SubOpts::new()).unwrap(),
        SubEntry::new("b", SubOpts::new()).unwrap(),
    ];
    let err = client.subscribe_many(entries, Properties::new()).unwrap_err();
    assert_eq!(err, MqttError::ProtocolError);
}

#[test]
fn unsubscribe_is_asynchronous() {
    let (mut client, link) = connected_client();

    client.unsubscribe(["commands/+"], Properties::new()).unwrap();
    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    let Packet::Unsubscribe(unsubscribe) = &frames[0] else {
        panic!("not an UNSUBSCRIBE");
    };
    assert_eq!(unsubscribe.packet_id(), 1);

    // No UNSUBACK processed yet.
    assert_eq!(
        client.unsubscribe_result().unwrap_err(),
        MqttError::WaitingForResult
    );

    // A second request while one is in flight is refused.
    assert_eq!(
        client.unsubscribe(["x"], Properties::new()).unwrap_err(),
        MqttError::TranscientPacket
    );

    let unsuback: Packet = Unsuback::builder()
        .packet_id(1u16)
        .reason_codes([UnsubackReasonCode::Success])
        .build()
        .unwrap()
        .into();
    link.push_packet(&unsuback);
    client.event_loop().unwrap();

    assert!(client.unsubscribe_result().is_ok());
    // Reading the result re-arms it.
    assert_eq!(
        client.unsubscribe_result().unwrap_err(),
        MqttError::WaitingForResult
    );
}

#[test]
fn unsubscribe_failure_code_is_reported() {
    let (mut client, link) = connected_client();

    client.unsubscribe(["nope"], Properties::new()).unwrap();
    let _ = link.take_sent();

    let unsuback: Packet = Unsuback::builder()
        .packet_id(1u16)
        .reason_codes([UnsubackReasonCode::NoSubscriptionExisted])
        .build()
        .unwrap()
        .into();
    link.push_packet(&unsuback);
    client.event_loop().unwrap();

    // NoSubscriptionExisted is a success-class code.
    assert!(client.unsubscribe_result().is_ok());

    client.unsubscribe(["other"], Properties::new()).unwrap();
    let unsuback: Packet = Unsuback::builder()
        .packet_id(2u16)
        .reason_codes([UnsubackReasonCode::NotAuthorized])
        .build()
        .unwrap()
        .into();
    link.push_packet(&unsuback);
    client.event_loop().unwrap();
    assert_eq!(
        client.unsubscribe_result().unwrap_err(),
        MqttError::NotAuthorized
    );
}

#[test]
fn subscribe_requires_connection() {
    let mut client = Client::new(ClientOptions::new("x"), RecordingHandler::new());
    assert_eq!(
        client
            .subscribe("t", SubOpts::new(), Properties::new())
            .unwrap_err(),
        MqttError::NotConnected
    );
    assert_eq!(
        client.unsubscribe(["t"], Properties::new()).unwrap_err(),
        MqttError::NotConnected
    );
}
