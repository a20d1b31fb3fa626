//! Connection-oriented byte transports the client engine runs on.
//!
//! The engine consumes the minimal [`Transport`] surface: timed reliable
//! send, timed bounded receive, a readability probe and close. Two
//! implementations are provided, plain TCP and (behind the `tls` feature)
//! TLS via `rustls`. Both bound the total time of every call by the
//! configured timeout so the single-threaded client never blocks
//! indefinitely.

// MIT License
//
// Copyright (c) 2025 Takatoshi Kondo
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.


mod tcp;
#[cfg(feature = "tls")]
mod tls;

use std::time::Duration;

use thiserror::Error;

pub use tcp::TcpTransport;
#[cfg(feature = "tls")]
pub use tls::TlsTransport;

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The operation did not complete within the timeout and no partial
    /// progress was possible.
    #[error("operation timed out")]
    Timeout,
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,
    /// The remote address did not resolve to any usable endpoint.
    #[error("invalid broker address {0:?}")]
    Addr(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "tls")]
    #[error("tls failure: {0}")]
    Tls(#[from] rustls::Error),
}

/// A connected byte stream with timed operations.
///
/// `recv` reads until at least `min` bytes have arrived or the timeout
/// elapses; a timeout with partial data returns the partial count so the
/// caller can keep its reassembly state, a timeout with nothing at all is
/// `TransportError::Timeout`.
pub trait Transport {
    /// Send the whole buffer, or fail. Partial sends within the timeout
    /// are retried internally.
    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Receive at least `min` bytes into `buf` (up to `buf.len()`),
    /// bounded by the timeout.
    fn recv(&mut self, buf: &mut [u8], min: usize) -> Result<usize, TransportError>;

    /// Probe whether the stream is readable within `timeout`.
    fn select_read(&mut self, timeout: Duration) -> Result<bool, TransportError>;

    /// Replace the per-call timeout.
    fn set_timeout(&mut self, timeout: Duration);

    /// Shut the connection down. Subsequent calls fail.
    fn close(&mut self);
}
