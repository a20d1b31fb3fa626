//! # MQTT Client Core
//!
//! A blocking MQTT v5.0 client library for Rust aimed at resource-constrained
//! devices such as sensors, appliances and gateways.
//!
//! The crate is built from three layers:
//!
//! - [`mqtt::packet`] - a bit-exact codec and typed model for every MQTT v5.0
//!   control packet, including variable byte integers, properties and payload
//!   shapes
//! - [`mqtt::transport`] - a small connection-oriented byte transport with
//!   timed send/receive, implemented for plain TCP and (behind the `tls`
//!   feature) for TLS via `rustls`
//! - [`mqtt::Client`] - the protocol engine that owns the transport, drives
//!   the QoS 0/1/2 publish cycles in both directions, negotiates CONNACK
//!   parameters, exchanges AUTH rounds and keeps the connection alive
//!
//! The client is single-threaded and cooperative: the application drives
//! progress by calling [`mqtt::Client::event_loop`] and the blocking API
//! calls from one thread. Exclusive ownership (`&mut self`) replaces any
//! internal locking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mqtt_client_core::mqtt;
//!
//! struct Handler;
//!
//! impl mqtt::EventHandler for Handler {
//!     fn message_received(&mut self, message: &mqtt::Message<'_>) {
//!         println!("{}: {} bytes", message.topic, message.payload.len());
//!     }
//! }
//!
//! let options = mqtt::ClientOptions::new("sensor-17");
//! let mut client = mqtt::Client::new(options, Handler);
//!
//! client
//!     .connect_to("broker.example.org", 1883, mqtt::ConnectOptions::default())
//!     .unwrap();
//! client
//!     .publish(
//!         "status/sensor-17",
//!         b"online",
//!         false,
//!         mqtt::packet::Qos::AtLeastOnce,
//!         mqtt::packet::Properties::new(),
//!     )
//!     .unwrap();
//!
//! loop {
//!     // A single receive attempt with a short timeout; incoming PUBLISH
//!     // packets are delivered to the handler from inside this call.
//!     if client.event_loop().is_err() {
//!         break;
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - **`tls`** (default): enables the `rustls` based secure transport
//! - **`tracing`**: enables logging via the `tracing` crate. When disabled,
//!   trace statements compile to no-ops with zero overhead

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

pub mod mqtt;
