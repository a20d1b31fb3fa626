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
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use mqtt_client_core::mqtt;
use mqtt_client_core::mqtt::transport::{Transport, TransportError};

#[allow(dead_code)]
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Split a serialized frame into fixed header and body and run it back
/// through the packet parser, checking the advertised length on the way.
#[allow(dead_code)]
pub fn reparse(bytes: &[u8]) -> mqtt::packet::Packet {
    use mqtt::packet::{DecodeResult, Packet, VariableByteInteger};

    assert!(bytes.len() >= 2, "frame shorter than the minimal packet");
    match VariableByteInteger::decode_stream(&bytes[1..]) {
        DecodeResult::Ok(remaining, consumed) => {
            let body = &bytes[1 + consumed..];
            assert_eq!(
                body.len(),
                remaining.to_u32() as usize,
                "remaining-length field does not match the body"
            );
            Packet::parse(bytes[0], body).expect("reparse failed")
        }
        other => panic!("bad remaining length: {other:?}"),
    }
}

/// Split a byte stream of concatenated frames into parsed packets.
#[allow(dead_code)]
pub fn split_frames(mut bytes: &[u8]) -> Vec<mqtt::packet::Packet> {
    use mqtt::packet::{DecodeResult, VariableByteInteger};

    let mut packets = Vec::new();
    while !bytes.is_empty() {
        let DecodeResult::Ok(remaining, consumed) = VariableByteInteger::decode_stream(&bytes[1..])
        else {
            panic!("bad remaining length in stream");
        };
        let total = 1 + consumed + remaining.to_u32() as usize;
        packets.push(reparse(&bytes[..total]));
        bytes = &bytes[total..];
    }
    packets
}

#[derive(Default)]
struct MockState {
    /// Scripted inbound bytes, one entry per arrival burst. `recv` drains
    /// bursts in order; an empty queue behaves like a receive timeout.
    incoming: VecDeque<Vec<u8>>,
    /// Everything the client wrote, in order.
    sent: Vec<u8>,
    closed: bool,
    /// When set, the next send fails with this outcome.
    fail_send: bool,
}

/// Scripted in-memory transport shared between a test and the client it
/// drives.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes the client will receive on its next `recv` calls.
    pub fn push_incoming(&self, bytes: &[u8]) {
        self.state.borrow_mut().incoming.push_back(bytes.to_vec());
    }

    /// Queue a complete packet as one arrival burst.
    pub fn push_packet(&self, packet: &mqtt::packet::Packet) {
        self.push_incoming(&packet.to_continuous_buffer());
    }

    /// Take everything the client has written so far.
    pub fn take_sent(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.borrow_mut().sent)
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    pub fn fail_next_send(&self) {
        self.state.borrow_mut().fail_send = true;
    }
}

impl Transport for MockTransport {
    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if state.fail_send {
            state.fail_send = false;
            return Err(TransportError::Closed);
        }
        state.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn recv(&mut self, buf: &mut [u8], min: usize) -> Result<usize, TransportError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(TransportError::Closed);
        }
        let min = min.min(buf.len());
        let mut got = 0;
        while got < buf.len() {
            let Some(front) = state.incoming.front_mut() else {
                break;
            };
            let n = front.len().min(buf.len() - got);
            buf[got..got + n].copy_from_slice(&front[..n]);
            front.drain(..n);
            if front.is_empty() {
                state.incoming.pop_front();
            }
            got += n;
            if got >= min {
                break;
            }
        }
        if got == 0 {
            return Err(TransportError::Timeout);
        }
        Ok(got)
    }

    fn select_read(&mut self, _timeout: Duration) -> Result<bool, TransportError> {
        Ok(!self.state.borrow().incoming.is_empty())
    }

    fn set_timeout(&mut self, _timeout: Duration) {}

    fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

/// Event handler recording everything it sees.
#[derive(Default)]
pub struct RecordingHandler {
    pub messages: Vec<(String, Vec<u8>, Option<u16>)>,
    /// Scripted answers for auth events, consumed front first.
    pub auth_script: VecDeque<mqtt::AuthResponse>,
    pub auth_events: usize,
}

#[allow(dead_code)]
impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl mqtt::EventHandler for RecordingHandler {
    fn message_received(&mut self, message: &mqtt::Message<'_>) {
        self.messages.push((
            message.topic.to_owned(),
            message.payload.to_vec(),
            message.packet_id,
        ));
    }

    fn auth_received(&mut self, _event: mqtt::AuthEvent<'_>) -> mqtt::AuthResponse {
        self.auth_events += 1;
        self.auth_script
            .pop_front()
            .unwrap_or(mqtt::AuthResponse::Abort)
    }

    fn max_packet_size(&self) -> u32 {
        2048
    }
}

/// Drive a client through a successful plain CONNECT / CONNACK exchange
/// over the given mock.
#[allow(dead_code)]
pub fn establish_connection(
    client: &mut mqtt::Client<RecordingHandler>,
    link: &MockTransport,
) {
    let connack = mqtt::packet::v5_0::Connack::builder()
        .session_present(false)
        .reason_code(mqtt_client_core::mqtt::result_code::ConnectReasonCode::Success)
        .build()
        .expect("Failed to build Connack packet");
    link.push_packet(&connack.into());

    client
        .connect_with(Box::new(link.clone()), mqtt::ConnectOptions::default())
        .expect("connect exchange failed");
    // Drop the CONNECT bytes so tests observe only their own traffic.
    let _ = link.take_sent();
}
