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

use common::MockTransport;
use mqtt_client_core::mqtt::connection::{PacketBuilder, ReadState, RecvStatus};
use mqtt_client_core::mqtt::packet::v5_0::{Pingresp, Publish};
use mqtt_client_core::mqtt::packet::{Packet, PacketType, Qos};
use mqtt_client_core::mqtt::result_code::MqttError;
use mqtt_client_core::mqtt::transport::Transport;

fn publish_with_payload(payload_len: usize) -> Vec<u8> {
    Publish::builder()
        .topic_name("t")
        .unwrap()
        .qos(Qos::AtMostOnce)
        .payload(vec![0xAB; payload_len])
        .build()
        .unwrap()
        .to_continuous_buffer()
}

#[test]
fn complete_packet_in_one_burst() {
    let mut link = MockTransport::new();
    let mut builder = PacketBuilder::new(2048);

    let bytes = publish_with_payload(16);
    link.push_incoming(&bytes);

    match builder.receive(&mut link).unwrap() {
        RecvStatus::Complete(size) => assert_eq!(size, bytes.len()),
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(builder.state(), ReadState::GotCompletePacket);
    assert_eq!(builder.last_packet_type(), Some(PacketType::Publish));

    let Packet::Publish(publish) = builder.extract(PacketType::Publish).unwrap() else {
        panic!("wrong packet");
    };
    assert_eq!(publish.payload().len(), 16);
    assert_eq!(builder.state(), ReadState::Ready);
}

#[test]
fn two_byte_frame_completes_immediately() {
    let mut link = MockTransport::new();
    let mut builder = PacketBuilder::new(2048);

    link.push_incoming(&Pingresp::new().to_continuous_buffer());
    match builder.receive(&mut link).unwrap() {
        RecvStatus::Complete(2) => {}
        other => panic!("expected a 2 byte frame, got {other:?}"),
    }
    assert_eq!(builder.last_packet_type(), Some(PacketType::Pingresp));
}

#[test]
fn byte_dribble_resumes_across_timeouts() {
    let mut link = MockTransport::new();
    let mut builder = PacketBuilder::new(2048);
    let bytes = publish_with_payload(8);

    // Nothing on the wire yet.
    assert_eq!(builder.receive(&mut link).unwrap(), RecvStatus::Timeout);
    assert_eq!(builder.state(), ReadState::Ready);

    // One byte: the type arrives alone.
    link.push_incoming(&bytes[..1]);
    assert_eq!(builder.receive(&mut link).unwrap(), RecvStatus::Timeout);
    assert_eq!(builder.state(), ReadState::GotType);

    // Length plus a bit of body.
    link.push_incoming(&bytes[1..4]);
    assert_eq!(builder.receive(&mut link).unwrap(), RecvStatus::Timeout);
    assert_eq!(builder.state(), ReadState::GotLength);

    // The rest.
    link.push_incoming(&bytes[4..]);
    match builder.receive(&mut link).unwrap() {
        RecvStatus::Complete(size) => assert_eq!(size, bytes.len()),
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn multi_byte_remaining_length_split_mid_field() {
    let mut link = MockTransport::new();
    let mut builder = PacketBuilder::new(2048);

    // Payload large enough for a two-byte remaining-length field.
    let bytes = publish_with_payload(200);
    assert!(bytes[1] & 0x80 != 0);

    // Type byte plus the first (continuation) length byte only.
    link.push_incoming(&bytes[..2]);
    assert_eq!(builder.receive(&mut link).unwrap(), RecvStatus::Timeout);
    assert_eq!(builder.state(), ReadState::GotType);

    link.push_incoming(&bytes[2..]);
    match builder.receive(&mut link).unwrap() {
        RecvStatus::Complete(size) => assert_eq!(size, bytes.len()),
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn oversize_packet_is_a_protocol_violation() {
    let mut link = MockTransport::new();
    // Advertised maximum is 16 bytes (clamped minimum is 8).
    let mut builder = PacketBuilder::new(16);

    let bytes = publish_with_payload(64);
    link.push_incoming(&bytes);

    assert_eq!(
        builder.receive(&mut link).unwrap_err(),
        MqttError::PacketTooLarge
    );
}

#[test]
fn extract_of_wrong_type_keeps_packet_pending() {
    let mut link = MockTransport::new();
    let mut builder = PacketBuilder::new(2048);

    link.push_incoming(&publish_with_payload(4));
    builder.receive(&mut link).unwrap();

    assert_eq!(
        builder.extract(PacketType::Puback).unwrap_err(),
        MqttError::TranscientPacket
    );
    // Still there for the event loop.
    assert_eq!(builder.last_packet_type(), Some(PacketType::Publish));
    assert!(builder.extract(PacketType::Publish).is_ok());
}

#[test]
fn extract_without_complete_packet_fails() {
    let mut builder = PacketBuilder::new(2048);
    assert_eq!(
        builder.extract(PacketType::Publish).unwrap_err(),
        MqttError::InsufficientBytes
    );
}

#[test]
fn closed_transport_is_a_network_error() {
    let mut link = MockTransport::new();
    let mut builder = PacketBuilder::new(2048);
    link.close();

    assert_eq!(
        builder.receive(&mut link).unwrap_err(),
        MqttError::NetworkError
    );
}

#[test]
fn reset_discards_partial_frame() {
    let mut link = MockTransport::new();
    let mut builder = PacketBuilder::new(2048);
    let bytes = publish_with_payload(8);

    link.push_incoming(&bytes[..3]);
    let _ = builder.receive(&mut link);
    assert_ne!(builder.state(), ReadState::Ready);

    builder.reset();
    assert_eq!(builder.state(), ReadState::Ready);
    assert!(builder.raw().is_empty());

    // A full packet afterwards is read cleanly.
    link.push_incoming(&bytes);
    match builder.receive(&mut link).unwrap() {
        RecvStatus::Complete(size) => assert_eq!(size, bytes.len()),
        other => panic!("expected completion, got {other:?}"),
    }
}
