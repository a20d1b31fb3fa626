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

use std::time::Duration;

use common::{establish_connection, MockTransport, RecordingHandler};
use mqtt_client_core::mqtt::packet::v5_0::{Auth, Disconnect, Pingresp, Puback};
use mqtt_client_core::mqtt::packet::{AuthenticationMethod, Packet, Properties};
use mqtt_client_core::mqtt::result_code::{AuthReasonCode, DisconnectReasonCode, MqttError};
use mqtt_client_core::mqtt::{AuthResponse, Client, ClientOptions, ConnectOptions};

fn connected_client() -> (Client<RecordingHandler>, MockTransport) {
    let link = MockTransport::new();
    let mut client = Client::new(ClientOptions::new("loop-test"), RecordingHandler::new());
    establish_connection(&mut client, &link);
    (client, link)
}

#[test]
fn idle_wire_is_not_an_error() {
    let (mut client, link) = connected_client();
    client.event_loop().unwrap();
    client.event_loop().unwrap();
    assert!(link.take_sent().is_empty());
    assert!(client.is_connected());
}

#[test]
fn pingresp_is_consumed_silently() {
    let (mut client, link) = connected_client();

    link.push_packet(&Pingresp::new().into());
    client.event_loop().unwrap();
    assert!(client.handler().messages.is_empty());
    assert!(link.take_sent().is_empty());
    assert!(client.is_connected());
}

#[test]
fn keep_alive_triggers_pingreq() {
    let link = MockTransport::new();
    let mut client = Client::new(ClientOptions::new("ping-test"), RecordingHandler::new());

    let connack = mqtt_client_core::mqtt::packet::v5_0::Connack::builder()
        .reason_code(mqtt_client_core::mqtt::result_code::ConnectReasonCode::Success)
        .build()
        .unwrap();
    link.push_packet(&connack.into());
    let options = ConnectOptions {
        // Effective ping interval becomes 1 second.
        keep_alive: 2,
        ..ConnectOptions::default()
    };
    client.connect_with(Box::new(link.clone()), options).unwrap();
    assert_eq!(client.keep_alive(), 1);
    let _ = link.take_sent();

    assert!(!client.should_ping());
    std::thread::sleep(Duration::from_millis(1100));
    assert!(client.should_ping());

    client.event_loop().unwrap();
    let sent = link.take_sent();
    assert_eq!(sent, [0xC0, 0x00]);

    // The ping refreshed the clock, no second ping right away.
    client.event_loop().unwrap();
    assert!(link.take_sent().is_empty());
}

#[test]
fn broker_disconnect_tears_the_session_down() {
    let (mut client, link) = connected_client();

    let disconnect: Packet = Disconnect::builder()
        .reason_code(DisconnectReasonCode::ServerShuttingDown)
        .build()
        .unwrap()
        .into();
    link.push_packet(&disconnect);

    assert_eq!(client.event_loop().unwrap_err(), MqttError::NotConnected);
    assert!(!client.is_connected());
    assert!(link.is_closed());
}

#[test]
fn stray_ack_is_dropped() {
    let (mut client, link) = connected_client();

    let stray: Packet = Puback::builder().packet_id(321u16).build().unwrap().into();
    link.push_packet(&stray);

    client.event_loop().unwrap();
    assert!(link.take_sent().is_empty());
    assert!(client.is_connected());

    // The engine is back in a clean receive state.
    link.push_packet(&Pingresp::new().into());
    client.event_loop().unwrap();
}

#[test]
fn server_initiated_reauthentication() {
    let (mut client, link) = connected_client();
    client
        .handler_mut()
        .auth_script
        .push_back(AuthResponse::Continue {
            reason: AuthReasonCode::ContinueAuthentication,
            method: "SCRAM".to_owned(),
            data: b"round2".to_vec(),
            properties: Properties::new(),
        });

    let mut props = Properties::new();
    props.push(AuthenticationMethod::new("SCRAM").unwrap().into());
    let challenge: Packet = Auth::builder()
        .reason_code(AuthReasonCode::ReAuthenticate)
        .props(props)
        .build()
        .unwrap()
        .into();
    link.push_packet(&challenge);

    client.event_loop().unwrap();
    assert_eq!(client.handler().auth_events, 1);

    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    assert!(matches!(frames[0], Packet::Auth(_)));
}

#[test]
fn client_disconnect_sends_and_closes() {
    let (mut client, link) = connected_client();

    client
        .disconnect(DisconnectReasonCode::NormalDisconnection, Properties::new())
        .unwrap();
    assert!(!client.is_connected());
    assert!(link.is_closed());

    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    let Packet::Disconnect(disconnect) = &frames[0] else {
        panic!("not a DISCONNECT");
    };
    assert_eq!(
        disconnect.reason_code(),
        Some(DisconnectReasonCode::NormalDisconnection)
    );
}

#[test]
fn disconnect_reason_is_checked() {
    let (mut client, _link) = connected_client();
    // 0x04 and failure codes are allowed; other success-range codes are
    // not a valid disconnect reason from a client.
    assert!(client
        .disconnect(
            DisconnectReasonCode::DisconnectWithWillMessage,
            Properties::new()
        )
        .is_ok());
    // Disconnecting twice is a no-op.
    assert!(client
        .disconnect(DisconnectReasonCode::NormalDisconnection, Properties::new())
        .is_ok());
}

#[test]
fn event_loop_requires_connection() {
    let mut client = Client::new(ClientOptions::new("x"), RecordingHandler::new());
    assert_eq!(client.event_loop().unwrap_err(), MqttError::NotConnected);
}

#[test]
fn auth_api_round_trip() {
    let (mut client, link) = connected_client();

    // Broker answers the re-authentication with a success AUTH.
    let ok: Packet = Auth::builder()
        .reason_code(AuthReasonCode::Success)
        .build()
        .unwrap()
        .into();
    link.push_packet(&ok);
    client
        .handler_mut()
        .auth_script
        .push_back(AuthResponse::Accept);

    client
        .auth(
            AuthReasonCode::ReAuthenticate,
            "SCRAM",
            b"initial",
            Properties::new(),
        )
        .unwrap();
    assert_eq!(client.handler().auth_events, 1);

    let frames = common::split_frames(&link.take_sent());
    assert_eq!(frames.len(), 1);
    let Packet::Auth(sent) = &frames[0] else {
        panic!("not an AUTH");
    };
    assert_eq!(sent.reason_code(), Some(AuthReasonCode::ReAuthenticate));
}

#[test]
fn auth_requires_method() {
    let (mut client, _link) = connected_client();
    assert_eq!(
        client
            .auth(AuthReasonCode::ReAuthenticate, "", b"", Properties::new())
            .unwrap_err(),
        MqttError::BadParameter
    );
}
