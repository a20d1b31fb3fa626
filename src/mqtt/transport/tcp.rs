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
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::mqtt::common::tracing::trace;
use crate::mqtt::transport::{Transport, TransportError};

/// Plain TCP transport.
///
/// The socket stays in blocking mode; per-call read/write timeouts bound
/// every operation instead. Nagle is disabled since MQTT frames are small
/// and latency-sensitive.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    timeout: Duration,
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Resolve `host:port` and open a TCP stream, trying each resolved
/// address until one answers within the timeout.
pub(crate) fn connect_stream(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<TcpStream, TransportError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|_| TransportError::Addr(format!("{host}:{port}")))?
        .collect();
    if addrs.is_empty() {
        return Err(TransportError::Addr(format!("{host}:{port}")));
    }

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                trace!("tcp connected to {addr}");
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    let e = last_err.unwrap();
    if is_timeout(e.kind()) {
        Err(TransportError::Timeout)
    } else {
        Err(TransportError::Io(e))
    }
}

impl TcpTransport {
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, TransportError> {
        let stream = connect_stream(host, port, timeout)?;
        Ok(Self {
            stream: Some(stream),
            timeout,
        })
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        let timeout = self.timeout;
        let stream = self.stream()?;
        stream.set_write_timeout(Some(timeout))?;

        let mut sent = 0;
        let deadline = Instant::now() + timeout;
        while sent < buf.len() {
            match stream.write(&buf[sent..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => sent += n,
                Err(e) if is_timeout(e.kind()) => return Err(TransportError::Timeout),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Io(e)),
            }
            if Instant::now() >= deadline && sent < buf.len() {
                return Err(TransportError::Timeout);
            }
        }
        Ok(sent)
    }

    fn recv(&mut self, buf: &mut [u8], min: usize) -> Result<usize, TransportError> {
        let timeout = self.timeout;
        let stream = self.stream()?;
        let min = min.min(buf.len());
        let deadline = Instant::now() + timeout;

        let mut got = 0;
        while got < min {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            stream.set_read_timeout(Some(remaining))?;
            match stream.read(&mut buf[got..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => got += n,
                Err(e) if is_timeout(e.kind()) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Io(e)),
            }
        }

        if got == 0 {
            return Err(TransportError::Timeout);
        }
        Ok(got)
    }

    fn select_read(&mut self, timeout: Duration) -> Result<bool, TransportError> {
        let stream = self.stream()?;
        // Timeouts of zero would mean "blocking" to the OS; clamp up.
        stream.set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;
        let mut probe = [0u8; 1];
        match stream.peek(&mut probe) {
            // A zero-byte peek is a closed peer; report readable so the
            // caller runs into the EOF and tears down.
            Ok(_) => Ok(true),
            Err(e) if is_timeout(e.kind()) => Ok(false),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}
