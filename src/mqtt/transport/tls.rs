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
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, StreamOwned};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};

use crate::mqtt::common::tracing::{trace, warn};
use crate::mqtt::transport::tcp::connect_stream;
use crate::mqtt::transport::{Transport, TransportError};

/// TLS transport over TCP via `rustls`.
///
/// The handshake runs inside [`TlsTransport::connect`]. Trust anchoring
/// depends on the caller:
///
/// - a DER-encoded root certificate makes that certificate the only trust
///   anchor (private broker deployments)
/// - no certificate falls back to the bundled `webpki-roots` store
/// - `insecure` skips verification entirely, an explicit opt-in that is
///   logged as a warning
pub struct TlsTransport {
    stream: Option<StreamOwned<ClientConnection, TcpStream>>,
    timeout: Duration,
}

/// Accepts any certificate. Only reachable through the explicit
/// `insecure` flag.
#[derive(Debug)]
struct NoCertificateVerification;

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn client_config(
    root_cert: Option<&[u8]>,
    insecure: bool,
) -> Result<ClientConfig, TransportError> {
    if insecure {
        warn!("tls certificate verification disabled");
        let config = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoCertificateVerification))
            .with_no_client_auth();
        return Ok(config);
    }

    let mut roots = RootCertStore::empty();
    match root_cert {
        Some(der) => {
            roots.add(CertificateDer::from(der.to_vec()))?;
        }
        None => {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
    }
    Ok(ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth())
}

impl TlsTransport {
    /// Open a TCP stream to `host:port` and complete the TLS handshake,
    /// all within the timeout.
    pub fn connect(
        host: &str,
        port: u16,
        root_cert: Option<&[u8]>,
        insecure: bool,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let sock = connect_stream(host, port, timeout)?;
        sock.set_read_timeout(Some(timeout))?;
        sock.set_write_timeout(Some(timeout))?;

        let config = client_config(root_cert, insecure)?;
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| TransportError::Addr(format!("{host}:{port}")))?;
        let conn = ClientConnection::new(Arc::new(config), server_name)?;
        let mut stream = StreamOwned::new(conn, sock);

        let deadline = Instant::now() + timeout;
        while stream.conn.is_handshaking() {
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout);
            }
            match stream.conn.complete_io(&mut stream.sock) {
                Ok(_) => {}
                Err(e) if is_timeout(e.kind()) => return Err(TransportError::Timeout),
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        trace!("tls handshake complete with {host}:{port}");

        Ok(Self {
            stream: Some(stream),
            timeout,
        })
    }

    fn stream(
        &mut self,
    ) -> Result<&mut StreamOwned<ClientConnection, TcpStream>, TransportError> {
        self.stream.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for TlsTransport {
    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        let timeout = self.timeout;
        let stream = self.stream()?;
        stream.sock.set_write_timeout(Some(timeout))?;

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
            stream.sock.set_read_timeout(Some(remaining))?;
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

        // Plaintext already decrypted and waiting counts as readable.
        let state = stream
            .conn
            .process_new_packets()
            .map_err(TransportError::Tls)?;
        if state.plaintext_bytes_to_read() > 0 {
            return Ok(true);
        }

        stream
            .sock
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;
        let mut probe = [0u8; 1];
        match stream.sock.peek(&mut probe) {
            Ok(_) => Ok(true),
            Err(e) if is_timeout(e.kind()) => Ok(false),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.conn.send_close_notify();
            let _ = stream.flush();
            let _ = stream.sock.shutdown(Shutdown::Both);
        }
    }
}
