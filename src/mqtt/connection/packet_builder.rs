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
use crate::mqtt::common::tracing::trace;
use crate::mqtt::packet::{DecodeResult, Packet, PacketType, VariableByteInteger};
use crate::mqtt::result_code::MqttError;
use crate::mqtt::transport::{Transport, TransportError};

/// Packet reading state.
///
/// Because data on a TCP stream is a stream, the reader has to remember
/// how far through the current frame it got when a timeout interrupts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// No bytes held.
    Ready,
    /// First byte (or the first byte plus a partial length field) held.
    GotType,
    /// Full header parsed; body size known.
    GotLength,
    /// One complete packet is available at offset 0.
    GotCompletePacket,
}

/// Outcome of a receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvStatus {
    /// A complete packet occupies the buffer; total size in bytes.
    Complete(usize),
    /// The timeout elapsed first. Partial state is preserved, the next
    /// call resumes where this one stopped.
    Timeout,
}

/// Receive framing engine: reassembles exactly one control packet at a
/// time from a [`Transport`].
///
/// The receive buffer is sized once at construction to the largest packet
/// the client is willing to accept (the same value it advertises in
/// CONNECT as `MaximumPacketSize`). A frame that would exceed the buffer
/// is a protocol violation by the peer and surfaces as an error, upon
/// which the caller must close the connection.
///
/// The engine never reads byte-by-byte: once the frame header is known it
/// asks the transport for all remaining bytes of the frame in one call.
pub struct PacketBuilder {
    state: ReadState,
    /// Frame reassembly buffer; length fixed at construction.
    buf: Vec<u8>,
    /// Bytes of the current frame received so far.
    available: usize,
    /// Total frame size; valid from `GotLength` on.
    total_size: usize,
    /// Fixed header byte plus remaining-length field; valid from
    /// `GotLength` on.
    header_size: usize,
    /// Encoded size of the largest remaining-length our buffer allows.
    expected_vbi_size: usize,
}

impl PacketBuilder {
    /// Create an engine with the given receive buffer size (clamped to a
    /// minimum of 8 bytes).
    pub fn new(recv_buffer_size: u32) -> Self {
        let size = recv_buffer_size.max(8).min(VariableByteInteger::MAX) as usize;
        let expected_vbi_size = VariableByteInteger::from_u32(size as u32).unwrap().size();
        Self {
            state: ReadState::Ready,
            buf: vec![0; size],
            available: 0,
            total_size: 0,
            header_size: 0,
            expected_vbi_size,
        }
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    pub fn buffer_size(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial or complete frame and return to `Ready`.
    pub fn reset(&mut self) {
        self.state = ReadState::Ready;
        self.available = 0;
        self.total_size = 0;
        self.header_size = 0;
    }

    /// Type of the completely received packet, if one is pending.
    pub fn last_packet_type(&self) -> Option<PacketType> {
        if self.state != ReadState::GotCompletePacket {
            return None;
        }
        PacketType::try_from(self.buf[0] >> 4).ok()
    }

    /// Raw bytes of the frame received so far (complete or partial).
    pub fn raw(&self) -> &[u8] {
        &self.buf[..self.available]
    }

    /// Drive the reassembly forward with one bounded receive attempt.
    ///
    /// Errors mean the connection is no longer usable: `NetworkError`
    /// for transport failures, `MalformedPacket`/`PacketTooLarge` when
    /// the peer violates the protocol. The caller must close on any of
    /// them. `Ok(Timeout)` keeps all partial state.
    pub fn receive<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<RecvStatus, MqttError> {
        match self.state {
            ReadState::GotCompletePacket => return Ok(RecvStatus::Complete(self.total_size)),
            ReadState::Ready | ReadState::GotType => {
                // The minimal frame is 2 bytes (PINGRESP and the shortened
                // DISCONNECT/AUTH), so fetch those first.
                if self.available < 2 {
                    let n = match transport.recv(&mut self.buf[self.available..2], 2) {
                        Ok(n) => n,
                        Err(TransportError::Timeout) => 0,
                        Err(_) => return Err(MqttError::NetworkError),
                    };
                    self.available += n;
                    if self.available < 2 {
                        self.state = if self.available == 1 {
                            ReadState::GotType
                        } else {
                            ReadState::Ready
                        };
                        return Ok(RecvStatus::Timeout);
                    }
                }
                self.state = ReadState::GotType;

                // Complete the remaining-length field. A frame whose
                // second byte is zero is already complete at this point;
                // the general decode below covers that case without
                // special-casing any packet type.
                let mut queried = false;
                loop {
                    match VariableByteInteger::decode_stream(&self.buf[1..self.available]) {
                        DecodeResult::Ok(vbi, consumed) => {
                            let total = 1 + consumed + vbi.to_u32() as usize;
                            if total > self.buf.len() {
                                // The peer ignored our advertised maximum
                                // packet size.
                                return Err(MqttError::PacketTooLarge);
                            }
                            self.total_size = total;
                            self.header_size = 1 + consumed;
                            self.state = ReadState::GotLength;
                            break;
                        }
                        DecodeResult::Incomplete => {
                            if self.available > self.expected_vbi_size {
                                // A longer length field than our buffer
                                // could ever need.
                                return Err(MqttError::PacketTooLarge);
                            }
                            if queried {
                                return Ok(RecvStatus::Timeout);
                            }
                            let want = self.expected_vbi_size + 1;
                            let n = match transport.recv(&mut self.buf[self.available..want], 1) {
                                Ok(n) => n,
                                Err(TransportError::Timeout) => return Ok(RecvStatus::Timeout),
                                Err(_) => return Err(MqttError::NetworkError),
                            };
                            self.available += n;
                            queried = true;
                        }
                        DecodeResult::Err(_) => return Err(MqttError::MalformedPacket),
                    }
                }
            }
            ReadState::GotLength => {}
        }

        // Body: request everything still missing in one call.
        if self.available < self.total_size {
            let missing = self.total_size - self.available;
            let n = match transport.recv(&mut self.buf[self.available..self.total_size], missing) {
                Ok(n) => n,
                Err(TransportError::Timeout) => return Ok(RecvStatus::Timeout),
                Err(_) => return Err(MqttError::NetworkError),
            };
            self.available += n;
            if self.available < self.total_size {
                return Ok(RecvStatus::Timeout);
            }
        }

        self.state = ReadState::GotCompletePacket;
        trace!("received complete packet, {} bytes", self.total_size);
        Ok(RecvStatus::Complete(self.total_size))
    }

    /// Parse the pending complete packet, which must be of the expected
    /// type, and return to `Ready`.
    ///
    /// A pending packet of a different type yields `TranscientPacket`
    /// and stays buffered so the event loop can process it.
    pub fn extract(&mut self, expected: PacketType) -> Result<Packet, MqttError> {
        if self.state != ReadState::GotCompletePacket {
            return Err(MqttError::InsufficientBytes);
        }
        let actual = self.last_packet_type().ok_or(MqttError::MalformedPacket)?;
        if actual != expected {
            return Err(MqttError::TranscientPacket);
        }

        let packet = Packet::parse(self.buf[0], &self.buf[self.header_size..self.total_size])?;
        self.reset();
        Ok(packet)
    }
}
