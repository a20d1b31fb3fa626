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
use mqtt_client_core::mqtt::packet::v5_0::{Puback, Pubcomp, Publish, Pubrec, Pubrel};
use mqtt_client_core::mqtt::packet::{Packet, Properties, Qos};
use mqtt_client_core::mqtt::result_code::{MqttError, PubackReasonCode, PubrecReasonCode};
use mqtt_client_core::mqtt::{Client, ClientOptions};

fn connected_client() -> (Client<RecordingHandler>, MockTransport) {
    let link = MockTransport::new();
    let mut client = Client::new(ClientOptions::new("pub-test"), RecordingHandler::new());
    establish_connection(&mut client, &link);
    (client, link)
}

#[test]
fn qos0_publish_is_fire_and_forget() {
    let (mut client, link) = connected_client();

    client
        .publish("metrics", b"1", false, Qos::AtMostOnce, Properties::new())
        .unwrap();

    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    let Packet::Publish(publish) = &frames[0] else {
        panic!("not a PUBLISH");
    };
    assert_eq!(publish.packet_id(), None);
    assert_eq!(publish.qos(), Qos::AtMostOnce);
}

#[test]
fn qos1_publish_waits_for_matching_puback() {
    let (mut client, link) = connected_client();

    // The first allocated id on a fresh connection is 1.
    let ack: Packet = Puback::builder().packet_id(1u16).build().unwrap().into();
    link.push_packet(&ack);

    client
        .publish("a/b", b"x", false, Qos::AtLeastOnce, Properties::new())
        .unwrap();

    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    let Packet::Publish(publish) = &frames[0] else {
        panic!("not a PUBLISH");
    };
    assert_eq!(publish.packet_id(), Some(1));
}

#[test]
fn qos1_mismatched_ack_is_transient() {
    let (mut client, link) = connected_client();

    let ack: Packet = Puback::builder().packet_id(99u16).build().unwrap().into();
    link.push_packet(&ack);

    let err = client
        .publish("a/b", b"x", false, Qos::AtLeastOnce, Properties::new())
        .unwrap_err();
    assert_eq!(err, MqttError::TranscientPacket);
    // Connection survives; the event loop is expected to resolve this.
    assert!(client.is_connected());
}

#[test]
fn qos1_failure_reason_surfaces() {
    let (mut client, link) = connected_client();

    let ack: Packet = Puback::builder()
        .packet_id(1u16)
        .reason_code(PubackReasonCode::NotAuthorized)
        .build()
        .unwrap()
        .into();
    link.push_packet(&ack);

    let err = client
        .publish("a/b", b"x", false, Qos::AtLeastOnce, Properties::new())
        .unwrap_err();
    assert_eq!(err, MqttError::NotAuthorized);
}

#[test]
fn qos2_cycle_uses_one_packet_id_throughout() {
    let (mut client, link) = connected_client();

    let rec: Packet = Pubrec::builder().packet_id(1u16).build().unwrap().into();
    let comp: Packet = Pubcomp::builder().packet_id(1u16).build().unwrap().into();
    link.push_packet(&rec);
    link.push_packet(&comp);

    client
        .publish("q2", b"payload", false, Qos::ExactlyOnce, Properties::new())
        .unwrap();

    // Observable wire trace: PUBLISH then PUBREL, same id, PUBREL flags
    // carrying the mandatory 0b0010.
    let sent = link.take_sent();
    let frames = common::split_frames(&sent);
    assert_eq!(frames.len(), 2);
    let Packet::Publish(publish) = &frames[0] else {
        panic!("first frame is not PUBLISH");
    };
    let Packet::Pubrel(pubrel) = &frames[1] else {
        panic!("second frame is not PUBREL");
    };
    assert_eq!(publish.packet_id(), Some(1));
    assert_eq!(pubrel.packet_id(), 1);
    assert_eq!(sent[sent.len() - 4], 0x62);
}

#[test]
fn qos2_pubrec_failure_stops_the_cycle() {
    let (mut client, link) = connected_client();

    let rec: Packet = Pubrec::builder()
        .packet_id(1u16)
        .reason_code(PubrecReasonCode::QuotaExceeded)
        .build()
        .unwrap()
        .into();
    link.push_packet(&rec);

    let err = client
        .publish("q2", b"x", false, Qos::ExactlyOnce, Properties::new())
        .unwrap_err();
    assert_eq!(err, MqttError::QuotaExceeded);

    // No PUBREL must follow a failed PUBREC.
    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    assert!(matches!(frames[0], Packet::Publish(_)));
}

#[test]
fn inbound_qos0_is_delivered_without_response() {
    let (mut client, link) = connected_client();

    let publish: Packet = Publish::builder()
        .topic_name("news")
        .unwrap()
        .qos(Qos::AtMostOnce)
        .payload(&b"hello"[..])
        .build()
        .unwrap()
        .into();
    link.push_packet(&publish);

    client.event_loop().unwrap();
    assert_eq!(client.handler().messages.len(), 1);
    assert_eq!(client.handler().messages[0].0, "news");
    assert_eq!(client.handler().messages[0].2, None);
    assert!(link.take_sent().is_empty());
}

#[test]
fn inbound_qos1_is_acknowledged() {
    let (mut client, link) = connected_client();

    let publish: Packet = Publish::builder()
        .topic_name("cmd")
        .unwrap()
        .qos(Qos::AtLeastOnce)
        .packet_id(0x0505u16)
        .payload(&b"go"[..])
        .build()
        .unwrap()
        .into();
    link.push_packet(&publish);

    client.event_loop().unwrap();
    assert_eq!(client.handler().messages.len(), 1);
    assert_eq!(client.handler().messages[0].2, Some(0x0505));

    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    let Packet::Puback(ack) = &frames[0] else {
        panic!("not a PUBACK");
    };
    assert_eq!(ack.packet_id(), 0x0505);
}

#[test]
fn inbound_qos2_runs_the_full_handshake() {
    let (mut client, link) = connected_client();

    let publish: Packet = Publish::builder()
        .topic_name("exact")
        .unwrap()
        .qos(Qos::ExactlyOnce)
        .packet_id(0x0A0Bu16)
        .payload(&b"once"[..])
        .build()
        .unwrap()
        .into();
    let rel: Packet = Pubrel::builder().packet_id(0x0A0Bu16).build().unwrap().into();
    link.push_packet(&publish);
    link.push_packet(&rel);

    client.event_loop().unwrap();
    assert_eq!(client.handler().messages.len(), 1);

    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 2);
    let Packet::Pubrec(rec) = &frames[0] else {
        panic!("first response is not PUBREC");
    };
    let Packet::Pubcomp(comp) = &frames[1] else {
        panic!("second response is not PUBCOMP");
    };
    assert_eq!(rec.packet_id(), 0x0A0B);
    assert_eq!(comp.packet_id(), 0x0A0B);
}

#[test]
fn publish_guards_arguments_and_state() {
    let mut client = Client::new(ClientOptions::new("x"), RecordingHandler::new());
    assert_eq!(
        client
            .publish("t", b"x", false, Qos::AtMostOnce, Properties::new())
            .unwrap_err(),
        MqttError::NotConnected
    );

    let link = MockTransport::new();
    establish_connection(&mut client, &link);
    assert_eq!(
        client
            .publish("", b"x", false, Qos::AtMostOnce, Properties::new())
            .unwrap_err(),
        MqttError::BadParameter
    );
}
