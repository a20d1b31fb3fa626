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
use std::time::{Duration, Instant};

use crate::mqtt::common::tracing::{debug, trace};
use crate::mqtt::connection::{PacketBuilder, RecvStatus};
use crate::mqtt::packet::{
    self, validate_properties_for, validate_will_properties, AuthenticationData,
    AuthenticationMethod, MaximumPacketSize, Packet, PacketIdAllocator, PacketType, Properties,
    Property, PropertyId, Qos, SubEntry, SubOpts, VariableByteInteger,
};
use crate::mqtt::result_code::{
    AuthReasonCode, ConnectReasonCode, DisconnectReasonCode, MqttError,
};
use crate::mqtt::transport::TcpTransport;
#[cfg(feature = "tls")]
use crate::mqtt::transport::TlsTransport;
use crate::mqtt::transport::{Transport, TransportError};

/// An inbound application message, borrowed from the receive buffer for
/// the duration of the callback.
pub struct Message<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    /// Present iff the message was published with QoS 1 or 2.
    pub packet_id: Option<u16>,
    pub props: &'a Properties,
}

/// An authentication exchange event handed to the application.
pub enum AuthEvent<'a> {
    /// An AUTH packet arrived, during CONNECT or as a server-initiated
    /// re-authentication round.
    Challenge {
        reason: AuthReasonCode,
        method: Option<&'a str>,
        data: Option<&'a [u8]>,
        props: &'a Properties,
    },
    /// CONNACK refused the connection with an authentication-related
    /// reason. The broker's hints let the next connect attempt carry the
    /// right credentials.
    Rejected {
        reason: ConnectReasonCode,
        method: Option<&'a str>,
        data: Option<&'a [u8]>,
        props: &'a Properties,
    },
}

/// The application's answer to an [`AuthEvent`].
///
/// Returning a value instead of calling back into the client keeps the
/// exchange single-threaded: the engine itself sends the follow-up AUTH
/// packet of a `Continue`.
pub enum AuthResponse {
    /// Send another AUTH round with this content.
    Continue {
        reason: AuthReasonCode,
        method: String,
        data: Vec<u8>,
        properties: Properties,
    },
    /// The exchange is complete from the application's point of view.
    Accept,
    /// Give up; the connection is closed and the caller sees a network
    /// error.
    Abort,
}

/// Application-side collaborator of the client.
///
/// `message_received` is invoked synchronously from [`Client::event_loop`]
/// for every inbound PUBLISH, after the protocol response has been
/// decided but before it is awaited. The callback must not call back
/// into the client.
pub trait EventHandler {
    fn message_received(&mut self, message: &Message<'_>);

    /// Invoked on AUTH packets and on auth-related CONNACK failures.
    /// The default declines, which surfaces a network error.
    fn auth_received(&mut self, _event: AuthEvent<'_>) -> AuthResponse {
        AuthResponse::Abort
    }

    /// Largest packet this application accepts; consulted once at
    /// construction to size the receive buffer and advertised to the
    /// broker in CONNECT.
    fn max_packet_size(&self) -> u32 {
        2048
    }
}

/// Last-will message registered at connect time.
pub struct WillMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: Qos,
    pub retain: bool,
    pub properties: Properties,
}

/// Per-client configuration, fixed at construction.
pub struct ClientOptions {
    /// Client identifier; empty requests a broker-assigned one.
    pub client_id: String,
    /// DER-encoded root certificate anchoring TLS verification.
    pub broker_cert: Option<Vec<u8>>,
    /// Skip TLS certificate verification entirely. Explicit opt-in to
    /// insecurity, for brokers with self-signed certificates only.
    pub insecure_skip_tls_verify: bool,
    /// Check property sets against the per-packet legality table before
    /// sending.
    pub validate_properties: bool,
    /// Emit a hex dump of every packet sent and received (requires the
    /// `tracing` feature to be observable).
    pub dump_packets: bool,
    /// Probe readability before receiving in `event_loop`, returning
    /// faster when the wire is idle.
    pub low_latency: bool,
    /// Bound on the total time of every wire operation.
    pub default_timeout: Duration,
}

impl ClientOptions {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            broker_cert: None,
            insecure_skip_tls_verify: false,
            validate_properties: true,
            dump_packets: false,
            low_latency: false,
            default_timeout: Duration::from_secs(3),
        }
    }
}

/// Per-connection options for [`Client::connect_to`].
pub struct ConnectOptions {
    pub use_tls: bool,
    /// Keep-alive interval in seconds as offered to the broker. The
    /// client pings at 0.75x the negotiated value.
    pub keep_alive: u16,
    pub clean_start: bool,
    pub user_name: Option<String>,
    pub password: Option<Vec<u8>>,
    pub will: Option<WillMessage>,
    pub properties: Properties,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            use_tls: false,
            keep_alive: 300,
            clean_start: true,
            user_name: None,
            password: None,
            will: None,
            properties: Properties::new(),
        }
    }
}

/// Make the ping interval 75% of the negotiated keep-alive so the client
/// always wakes up before the broker's deadline.
fn effective_keep_alive(keep_alive: u16) -> u16 {
    let ka = u32::from(keep_alive);
    ((ka + ka / 2) / 2) as u16
}

enum AuthOutcome {
    /// A follow-up AUTH round was sent.
    Sent,
    /// The application accepted without sending anything.
    Accepted,
}

/// Blocking MQTT v5.0 client engine.
///
/// Owns the transport, the receive framing engine and all session state.
/// Single-threaded cooperative: the application drives progress through
/// the blocking calls and [`Client::event_loop`]; exclusive access is
/// guaranteed by `&mut self`, there is no internal locking.
pub struct Client<H: EventHandler> {
    handler: H,
    options: ClientOptions,
    transport: Option<Box<dyn Transport>>,
    builder: PacketBuilder,
    client_id: String,
    /// Effective ping interval in seconds (0.75x the negotiated value).
    keep_alive: u16,
    /// Outbound ceiling imposed by the broker.
    max_packet_size: u32,
    packet_ids: PacketIdAllocator,
    last_communication: Instant,
    /// Packet id of an in-flight UNSUBSCRIBE, 0 when none.
    unsubscribe_id: u16,
    unsubscribe_result: Result<(), MqttError>,
}

impl<H: EventHandler> Client<H> {
    pub fn new(options: ClientOptions, handler: H) -> Self {
        let recv_buffer_size = handler.max_packet_size().max(8);
        let client_id = options.client_id.clone();
        Self {
            handler,
            options,
            transport: None,
            builder: PacketBuilder::new(recv_buffer_size),
            client_id,
            keep_alive: effective_keep_alive(300),
            max_packet_size: 65535,
            packet_ids: PacketIdAllocator::new(),
            last_communication: Instant::now(),
            unsubscribe_id: 0,
            unsubscribe_result: Err(MqttError::WaitingForResult),
        }
    }

    /// Current client identifier; replaced by the broker-assigned one
    /// after a CONNACK carrying `AssignedClientIdentifier`.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Effective ping interval in seconds: 0.75x the negotiated
    /// keep-alive.
    pub fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Replace the timeout bounding every wire operation.
    pub fn set_default_timeout(&mut self, timeout: Duration) {
        self.options.default_timeout = timeout;
        if let Some(transport) = self.transport.as_mut() {
            transport.set_timeout(timeout);
        }
    }

    /// Whether the silence on the wire reached the ping interval.
    pub fn should_ping(&self) -> bool {
        self.keep_alive != 0
            && self.last_communication.elapsed() >= Duration::from_secs(u64::from(self.keep_alive))
    }

    fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.builder.reset();
        self.unsubscribe_id = 0;
    }

    fn dump(&self, _direction: &str, _bytes: &[u8]) {
        #[cfg(feature = "tracing")]
        if self.options.dump_packets {
            let hex: String = _bytes.iter().map(|b| format!("{b:02X} ")).collect();
            tracing::debug!("{} [{} bytes] {}", _direction, _bytes.len(), hex.trim_end());
        }
    }

    fn check_properties(
        &self,
        props: &Properties,
        packet_type: PacketType,
    ) -> Result<(), MqttError> {
        if self.options.validate_properties {
            validate_properties_for(props, packet_type).map_err(|_| MqttError::BadProperties)?;
        }
        Ok(())
    }

    /// One bounded receive attempt; stamps the keep-alive clock on
    /// completion and closes the connection on unrecoverable errors.
    fn receive_once(&mut self) -> Result<RecvStatus, MqttError> {
        let transport = self.transport.as_mut().ok_or(MqttError::NotConnected)?;
        match self.builder.receive(transport.as_mut()) {
            Ok(RecvStatus::Complete(size)) => {
                self.last_communication = Instant::now();
                self.dump("<", self.builder.raw());
                Ok(RecvStatus::Complete(size))
            }
            Ok(RecvStatus::Timeout) => Ok(RecvStatus::Timeout),
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    /// Serialize, send, and optionally await the next packet
    /// (send-and-receive).
    ///
    /// The outbound packet is rejected locally with `PacketTooLarge` when
    /// it exceeds the broker's advertised maximum. Any transport failure
    /// closes the connection.
    fn prepare_sar(&mut self, packet: &Packet, with_answer: bool) -> Result<(), MqttError> {
        let bytes = packet.to_continuous_buffer();
        if bytes.len() as u32 > self.max_packet_size {
            return Err(MqttError::PacketTooLarge);
        }
        self.dump(">", &bytes);

        // Make sure we are on a clean receiving state.
        self.builder.reset();

        let transport = self.transport.as_mut().ok_or(MqttError::NotConnected)?;
        match transport.send(&bytes) {
            Ok(n) if n == bytes.len() => {}
            Ok(_) => {
                self.close();
                return Err(MqttError::NetworkError);
            }
            Err(TransportError::Timeout) => {
                // A partially written frame is unrecoverable.
                self.close();
                return Err(MqttError::TimedOut);
            }
            Err(_) => {
                self.close();
                return Err(MqttError::NetworkError);
            }
        }
        self.last_communication = Instant::now();
        trace!("sent {} packet", packet.packet_type());

        if !with_answer {
            return Ok(());
        }

        match self.receive_once()? {
            RecvStatus::Complete(_) => Ok(()),
            RecvStatus::Timeout => Err(MqttError::TimedOut),
        }
    }

    /// Connect to the broker and run the CONNECT / CONNACK (and AUTH)
    /// exchange to completion.
    pub fn connect_to(
        &mut self,
        host: &str,
        port: u16,
        options: ConnectOptions,
    ) -> Result<(), MqttError> {
        if host.is_empty() || port == 0 {
            return Err(MqttError::BadParameter);
        }
        if self.transport.is_some() {
            return Err(MqttError::AlreadyConnected);
        }

        let use_tls = options.use_tls;
        let (connect, keep_alive) = self.build_connect_packet(options)?;
        self.open_transport(host, port, use_tls)?;
        self.connect_exchange(connect, keep_alive)
    }

    /// Run the CONNECT exchange over a caller-supplied transport.
    ///
    /// For transports beyond the built-in TCP and TLS ones (serial
    /// bridges, in-memory pipes in tests, ...). The transport must
    /// already be connected.
    pub fn connect_with(
        &mut self,
        transport: Box<dyn Transport>,
        options: ConnectOptions,
    ) -> Result<(), MqttError> {
        if self.transport.is_some() {
            return Err(MqttError::AlreadyConnected);
        }

        let (connect, keep_alive) = self.build_connect_packet(options)?;
        self.transport = Some(transport);
        self.connect_exchange(connect, keep_alive)
    }

    fn build_connect_packet(
        &mut self,
        options: ConnectOptions,
    ) -> Result<(packet::v5_0::Connect, u16), MqttError> {
        // Let the broker know our limitation, unless the caller already
        // announced one.
        let mut props = options.properties;
        let recv_buffer_size = self.builder.buffer_size() as u32;
        if recv_buffer_size < VariableByteInteger::MAX
            && !props.iter().any(|p| p.id() == PropertyId::MaximumPacketSize)
        {
            props.push(MaximumPacketSize::new(recv_buffer_size).unwrap().into());
        }
        self.check_properties(&props, PacketType::Connect)?;
        if let Some(will) = &options.will {
            if self.options.validate_properties {
                validate_will_properties(&will.properties)
                    .map_err(|_| MqttError::BadProperties)?;
            }
        }

        let mut connect = packet::v5_0::Connect::builder()
            .client_id(&self.client_id)?
            .clean_start(options.clean_start)
            .keep_alive(options.keep_alive)
            .props(props);
        if let Some(will) = options.will {
            connect = connect.will_message(
                will.topic,
                will.payload,
                will.qos,
                will.retain,
                will.properties,
            )?;
        }
        if let Some(user_name) = options.user_name {
            connect = connect.user_name(user_name)?;
        }
        if let Some(password) = options.password {
            connect = connect.password(password)?;
        }
        Ok((connect.build()?, options.keep_alive))
    }

    fn connect_exchange(
        &mut self,
        connect: packet::v5_0::Connect,
        keep_alive: u16,
    ) -> Result<(), MqttError> {
        self.keep_alive = effective_keep_alive(keep_alive);
        self.max_packet_size = 65535;

        if let Err(e) = self.prepare_sar(&connect.into(), true) {
            self.close();
            return Err(e);
        }

        match self.builder.last_packet_type() {
            Some(PacketType::Connack) => {
                let result = self.handle_connack();
                if result.is_err() {
                    self.close();
                }
                result
            }
            Some(PacketType::Auth) => loop {
                match self.builder.last_packet_type() {
                    Some(PacketType::Connack) => {
                        let result = self.handle_connack();
                        if result.is_err() {
                            self.close();
                        }
                        return result;
                    }
                    Some(PacketType::Auth) => match self.handle_auth(true)? {
                        AuthOutcome::Sent => {}
                        AuthOutcome::Accepted => {
                            // Nothing was sent; the broker's verdict is
                            // still outstanding.
                            match self.receive_once()? {
                                RecvStatus::Complete(_) => {}
                                RecvStatus::Timeout => {
                                    self.close();
                                    return Err(MqttError::TimedOut);
                                }
                            }
                        }
                    },
                    _ => {
                        self.close();
                        return Err(MqttError::ProtocolError);
                    }
                }
            },
            _ => {
                self.close();
                Err(MqttError::ProtocolError)
            }
        }
    }

    fn open_transport(&mut self, host: &str, port: u16, use_tls: bool) -> Result<(), MqttError> {
        let timeout = self.options.default_timeout;
        let transport: Box<dyn Transport> = if use_tls {
            #[cfg(feature = "tls")]
            {
                Box::new(
                    TlsTransport::connect(
                        host,
                        port,
                        self.options.broker_cert.as_deref(),
                        self.options.insecure_skip_tls_verify,
                        timeout,
                    )
                    .map_err(map_connect_error)?,
                )
            }
            #[cfg(not(feature = "tls"))]
            {
                return Err(MqttError::BadParameter);
            }
        } else {
            Box::new(TcpTransport::connect(host, port, timeout).map_err(map_connect_error)?)
        };
        self.transport = Some(transport);
        Ok(())
    }

    /// Apply the broker's CONNACK: negotiated limits, assigned identity
    /// and the success / failure verdict.
    fn handle_connack(&mut self) -> Result<(), MqttError> {
        let packet = self.builder.extract(PacketType::Connack)?;
        let Packet::Connack(connack) = packet else {
            return Err(MqttError::ProtocolError);
        };

        let reason = connack.reason_code();
        if reason.is_failure()
            && reason != ConnectReasonCode::NotAuthorized
            && reason != ConnectReasonCode::BadAuthenticationMethod
        {
            return Err(reason.into());
        }

        let mut auth_method = None;
        let mut auth_data = None;
        for prop in connack.props() {
            match prop {
                Property::MaximumPacketSize(p) => self.max_packet_size = p.val(),
                Property::AssignedClientIdentifier(p) => {
                    self.client_id = p.val().to_owned();
                }
                Property::ServerKeepAlive(p) => {
                    self.keep_alive = effective_keep_alive(p.val());
                }
                Property::AuthenticationMethod(p) => auth_method = Some(p.val()),
                Property::AuthenticationData(p) => auth_data = Some(p.val()),
                _ => {}
            }
        }

        if reason.is_failure() {
            // NotAuthorized / BadAuthenticationMethod: let the
            // application see the broker's hints so the next connect can
            // carry them.
            let event = AuthEvent::Rejected {
                reason,
                method: auth_method,
                data: auth_data,
                props: connack.props(),
            };
            return match self.handler.auth_received(event) {
                AuthResponse::Abort => Err(MqttError::NetworkError),
                _ => Ok(()),
            };
        }

        debug!("connected, keep alive interval {}s", self.keep_alive);
        Ok(())
    }

    /// Process one inbound AUTH round through the handler, sending the
    /// follow-up packet when the handler continues the exchange.
    fn handle_auth(&mut self, with_answer: bool) -> Result<AuthOutcome, MqttError> {
        let packet = match self.builder.extract(PacketType::Auth) {
            Ok(p) => p,
            Err(e) => {
                self.close();
                return Err(e);
            }
        };
        let Packet::Auth(auth) = packet else {
            self.close();
            return Err(MqttError::ProtocolError);
        };

        let reason = auth.reason_code().unwrap_or(AuthReasonCode::Success);
        let empty = Properties::new();
        let props = auth.props().as_ref().unwrap_or(&empty);
        let method = props.iter().find_map(|p| match p {
            Property::AuthenticationMethod(m) => Some(m.val()),
            _ => None,
        });
        let data = props.iter().find_map(|p| match p {
            Property::AuthenticationData(d) => Some(d.val()),
            _ => None,
        });

        let response = self.handler.auth_received(AuthEvent::Challenge {
            reason,
            method,
            data,
            props,
        });

        match response {
            AuthResponse::Abort => {
                self.close();
                Err(MqttError::NetworkError)
            }
            AuthResponse::Accept => Ok(AuthOutcome::Accepted),
            AuthResponse::Continue {
                reason,
                method,
                data,
                mut properties,
            } => {
                if !properties
                    .iter()
                    .any(|p| p.id() == PropertyId::AuthenticationMethod)
                {
                    properties.push(AuthenticationMethod::new(method)?.into());
                }
                if !data.is_empty()
                    && !properties
                        .iter()
                        .any(|p| p.id() == PropertyId::AuthenticationData)
                {
                    properties.push(AuthenticationData::new(data)?.into());
                }
                let packet = packet::v5_0::Auth::builder()
                    .reason_code(reason)
                    .props(properties)
                    .build()?;
                self.prepare_sar(&packet.into(), with_answer)?;
                Ok(AuthOutcome::Sent)
            }
        }
    }

    /// Start a re-authentication exchange and drive it to completion.
    pub fn auth(
        &mut self,
        reason: AuthReasonCode,
        method: &str,
        data: &[u8],
        properties: Properties,
    ) -> Result<(), MqttError> {
        let mut properties = properties;
        if method.is_empty()
            && !properties
                .iter()
                .any(|p| p.id() == PropertyId::AuthenticationMethod)
        {
            // An authentication method is required.
            return Err(MqttError::BadParameter);
        }
        if self.transport.is_none() {
            return Err(MqttError::NotConnected);
        }
        if self.builder.last_packet_type().is_some() {
            return Err(MqttError::TranscientPacket);
        }

        if !properties
            .iter()
            .any(|p| p.id() == PropertyId::AuthenticationMethod)
        {
            properties.push(AuthenticationMethod::new(method)?.into());
        }
        if !data.is_empty()
            && !properties
                .iter()
                .any(|p| p.id() == PropertyId::AuthenticationData)
        {
            properties.push(AuthenticationData::new(data)?.into());
        }
        self.check_properties(&properties, PacketType::Auth)?;

        let packet = packet::v5_0::Auth::builder()
            .reason_code(reason)
            .props(properties)
            .build()?;
        self.prepare_sar(&packet.into(), true)?;

        loop {
            match self.builder.last_packet_type() {
                Some(PacketType::Auth) => match self.handle_auth(true)? {
                    AuthOutcome::Sent => {}
                    AuthOutcome::Accepted => return Ok(()),
                },
                _ => {
                    self.close();
                    return Err(MqttError::ProtocolError);
                }
            }
        }
    }

    /// Subscribe to a single topic filter.
    pub fn subscribe(
        &mut self,
        topic_filter: &str,
        sub_opts: SubOpts,
        properties: Properties,
    ) -> Result<(), MqttError> {
        if topic_filter.is_empty() {
            return Err(MqttError::BadParameter);
        }
        let entry = SubEntry::new(topic_filter, sub_opts)?;
        self.subscribe_many(vec![entry], properties)
    }

    /// Subscribe to several topic filters in one request. The SUBACK is
    /// awaited synchronously; the first failing reason code becomes the
    /// result.
    pub fn subscribe_many(
        &mut self,
        entries: Vec<SubEntry>,
        properties: Properties,
    ) -> Result<(), MqttError> {
        if entries.is_empty() {
            return Err(MqttError::BadParameter);
        }
        if self.transport.is_none() {
            return Err(MqttError::NotConnected);
        }
        // If we are interrupting a packet being received, stop before
        // making any more damage.
        if self.builder.last_packet_type().is_some() {
            return Err(MqttError::TranscientPacket);
        }
        self.check_properties(&properties, PacketType::Subscribe)?;

        let entry_count = entries.len();
        let packet_id = self.packet_ids.allocate();
        let packet = packet::v5_0::Subscribe::builder()
            .packet_id(packet_id)
            .entries(entries)
            .props(properties)
            .build()?;

        self.prepare_sar(&packet.into(), true)?;

        let packet = self.builder.extract(PacketType::Suback)?;
        let Packet::Suback(suback) = packet else {
            return Err(MqttError::ProtocolError);
        };
        if suback.packet_id() != packet_id {
            return Err(MqttError::TranscientPacket);
        }

        let codes = suback.reason_codes();
        if codes.len() < entry_count {
            return Err(MqttError::ProtocolError);
        }
        for code in codes {
            if code.is_failure() {
                return Err(code.into());
            }
        }
        Ok(())
    }

    /// Remove subscriptions. The request is sent immediately; the UNSUBACK
    /// is processed by `event_loop` and the outcome is available through
    /// [`Client::unsubscribe_result`].
    pub fn unsubscribe<I, S>(&mut self, filters: I, properties: Properties) -> Result<(), MqttError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.transport.is_none() {
            return Err(MqttError::NotConnected);
        }
        if self.builder.last_packet_type().is_some() {
            return Err(MqttError::TranscientPacket);
        }
        // One unsubscribe in flight at a time.
        if self.unsubscribe_id != 0 {
            return Err(MqttError::TranscientPacket);
        }
        self.check_properties(&properties, PacketType::Unsubscribe)?;

        let packet_id = self.packet_ids.allocate();
        let packet = packet::v5_0::Unsubscribe::builder()
            .packet_id(packet_id)
            .entries(filters)?
            .props(properties)
            .build()?;

        self.unsubscribe_id = packet_id;
        self.unsubscribe_result = Err(MqttError::WaitingForResult);
        let result = self.prepare_sar(&packet.into(), false);
        if result.is_err() {
            self.unsubscribe_id = 0;
        }
        result
    }

    /// Outcome of the last unsubscribe request, once its UNSUBACK has
    /// been processed by `event_loop`. Reading the result re-arms it to
    /// `WaitingForResult`.
    pub fn unsubscribe_result(&mut self) -> Result<(), MqttError> {
        if self.transport.is_none() {
            return Err(MqttError::NotConnected);
        }
        if self.unsubscribe_id != 0 {
            return Err(MqttError::WaitingForResult);
        }
        std::mem::replace(&mut self.unsubscribe_result, Err(MqttError::WaitingForResult))
    }

    /// Publish a message. QoS 0 returns after the send; QoS 1 and 2 run
    /// their acknowledgment cycle synchronously with the same packet
    /// identifier throughout.
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
        qos: Qos,
        properties: Properties,
    ) -> Result<(), MqttError> {
        if topic.is_empty() {
            return Err(MqttError::BadParameter);
        }
        if self.transport.is_none() {
            return Err(MqttError::NotConnected);
        }
        if self.builder.last_packet_type().is_some() {
            return Err(MqttError::TranscientPacket);
        }
        self.check_properties(&properties, PacketType::Publish)?;

        let mut builder = packet::v5_0::Publish::builder()
            .topic_name(topic)?
            .qos(qos)
            .retain(retain)
            .dup(false)
            .props(properties)
            .payload(payload);
        let packet_id = if qos != Qos::AtMostOnce {
            let id = self.packet_ids.allocate();
            builder = builder.packet_id(id);
            Some(id)
        } else {
            None
        };
        let packet = builder.build()?;

        self.prepare_sar(&packet.into(), packet_id.is_some())?;

        match (qos, packet_id) {
            (Qos::AtMostOnce, _) => Ok(()),
            (Qos::AtLeastOnce, Some(id)) => {
                let packet = self.builder.extract(PacketType::Puback)?;
                let Packet::Puback(ack) = packet else {
                    return Err(MqttError::ProtocolError);
                };
                if ack.packet_id() != id {
                    // Could be a protocol error, but the next event_loop
                    // call will sort that out.
                    return Err(MqttError::TranscientPacket);
                }
                match ack.reason_code() {
                    Some(rc) if rc.is_failure() => Err(rc.into()),
                    _ => Ok(()),
                }
            }
            (Qos::ExactlyOnce, Some(id)) => {
                let packet = self.builder.extract(PacketType::Pubrec)?;
                let Packet::Pubrec(rec) = packet else {
                    return Err(MqttError::ProtocolError);
                };
                if rec.packet_id() != id {
                    return Err(MqttError::TranscientPacket);
                }
                if let Some(rc) = rec.reason_code() {
                    if rc.is_failure() {
                        return Err(rc.into());
                    }
                }

                let pubrel = packet::v5_0::Pubrel::builder().packet_id(id).build()?;
                self.prepare_sar(&pubrel.into(), true)?;

                let packet = self.builder.extract(PacketType::Pubcomp)?;
                let Packet::Pubcomp(comp) = packet else {
                    return Err(MqttError::ProtocolError);
                };
                if comp.packet_id() != id {
                    return Err(MqttError::TranscientPacket);
                }
                match comp.reason_code() {
                    Some(rc) if rc.is_failure() => Err(rc.into()),
                    _ => Ok(()),
                }
            }
            _ => Err(MqttError::ProtocolError),
        }
    }

    /// Finish the receive cycle of an inbound PUBLISH: deliver to the
    /// handler, then produce the acknowledgments its QoS requires.
    fn handle_inbound_publish(&mut self, publish: packet::v5_0::Publish) -> Result<(), MqttError> {
        let message = Message {
            topic: publish.topic_name(),
            payload: publish.payload(),
            packet_id: publish.packet_id(),
            props: publish.props(),
        };
        self.handler.message_received(&message);

        match (publish.qos(), publish.packet_id()) {
            (Qos::AtMostOnce, _) => Ok(()),
            (Qos::AtLeastOnce, Some(id)) => {
                let ack = packet::v5_0::Puback::builder().packet_id(id).build()?;
                self.prepare_sar(&ack.into(), false)
            }
            (Qos::ExactlyOnce, Some(id)) => {
                let rec = packet::v5_0::Pubrec::builder().packet_id(id).build()?;
                self.prepare_sar(&rec.into(), true)?;

                let packet = self.builder.extract(PacketType::Pubrel)?;
                let Packet::Pubrel(rel) = packet else {
                    return Err(MqttError::ProtocolError);
                };
                if rel.packet_id() != id {
                    return Err(MqttError::TranscientPacket);
                }

                let comp = packet::v5_0::Pubcomp::builder().packet_id(id).build()?;
                self.prepare_sar(&comp.into(), false)
            }
            _ => Err(MqttError::ProtocolError),
        }
    }

    /// Drive the connection: ping when the keep-alive interval elapsed,
    /// make one bounded receive attempt, and dispatch whatever arrived.
    ///
    /// A receive timeout is not an error; call again on the application's
    /// own schedule. Inbound PUBLISH packets are delivered to the handler
    /// from inside this call.
    pub fn event_loop(&mut self) -> Result<(), MqttError> {
        if self.transport.is_none() {
            return Err(MqttError::NotConnected);
        }

        if self.builder.last_packet_type().is_none() {
            if self.should_ping() {
                let ping = packet::v5_0::Pingreq::new();
                self.prepare_sar(&ping.into(), false)?;
            }

            if self.options.low_latency {
                let transport = self.transport.as_mut().ok_or(MqttError::NotConnected)?;
                match transport.select_read(Duration::from_millis(1)) {
                    Ok(true) => {}
                    Ok(false) => return Ok(()),
                    Err(_) => {
                        self.close();
                        return Err(MqttError::NetworkError);
                    }
                }
            }

            match self.receive_once() {
                Ok(RecvStatus::Complete(_)) => {}
                // No answer in time is not an error here.
                Ok(RecvStatus::Timeout) => return Ok(()),
                Err(MqttError::NetworkError) => return Err(MqttError::NetworkError),
                Err(_) => return Err(MqttError::NotConnected),
            }
        }

        match self.builder.last_packet_type() {
            // Ping responses just refresh the keep-alive clock.
            Some(PacketType::Pingresp) => {
                let _ = self.builder.extract(PacketType::Pingresp)?;
                Ok(())
            }
            Some(PacketType::Disconnect) => {
                self.close();
                Err(MqttError::NotConnected)
            }
            Some(PacketType::Publish) => {
                let packet = self.builder.extract(PacketType::Publish)?;
                let Packet::Publish(publish) = packet else {
                    return Err(MqttError::ProtocolError);
                };
                self.handle_inbound_publish(publish)
            }
            Some(PacketType::Unsuback) => {
                let packet = self.builder.extract(PacketType::Unsuback)?;
                let Packet::Unsuback(unsuback) = packet else {
                    return Err(MqttError::ProtocolError);
                };
                if unsuback.packet_id() != self.unsubscribe_id {
                    return Err(MqttError::NetworkError);
                }
                let mut result = Ok(());
                for code in unsuback.reason_codes() {
                    if code.is_failure() {
                        result = Err(code.into());
                    }
                }
                self.unsubscribe_result = result;
                self.unsubscribe_id = 0;
                Ok(())
            }
            Some(PacketType::Auth) => {
                // Server-initiated re-authentication; follow-up rounds are
                // sent without blocking on the reply.
                self.handle_auth(false).map(|_| ())
            }
            // Stray ACKs of an interrupted synchronous exchange are
            // dropped; their cycle is considered terminated.
            _ => {
                self.builder.reset();
                Ok(())
            }
        }
    }

    /// Send DISCONNECT and close the transport immediately; no
    /// acknowledgment is awaited.
    pub fn disconnect(
        &mut self,
        reason: DisconnectReasonCode,
        properties: Properties,
    ) -> Result<(), MqttError> {
        if reason != DisconnectReasonCode::NormalDisconnection
            && reason != DisconnectReasonCode::DisconnectWithWillMessage
            && (reason as u8) < 0x80
        {
            return Err(MqttError::BadParameter);
        }
        if self.transport.is_none() {
            return Ok(());
        }
        self.check_properties(&properties, PacketType::Disconnect)?;

        let mut builder = packet::v5_0::Disconnect::builder().reason_code(reason);
        if !properties.is_empty() {
            builder = builder.props(properties);
        }
        let packet = builder.build()?;

        self.prepare_sar(&packet.into(), false)?;

        // There is no need to wait for an ACK on a disconnect.
        self.close();
        Ok(())
    }
}

fn map_connect_error(e: TransportError) -> MqttError {
    match e {
        TransportError::Timeout => MqttError::TimedOut,
        _ => MqttError::NetworkError,
    }
}
