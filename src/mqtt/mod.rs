//! Public module surface of the MQTT v5.0 client library.
//!
//! - [`packet`] holds the codec: variable byte integers, properties and the
//!   typed model of every control packet
//! - [`transport`] is the byte-stream abstraction the client runs on
//! - [`connection`] contains the receive framing engine that reassembles
//!   control packets from the stream
//! - the client engine itself is re-exported at this level as [`Client`]

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


pub mod common;
pub mod connection;
pub mod packet;
pub mod result_code;
pub mod transport;

mod client;

pub use client::{
    AuthEvent, AuthResponse, Client, ClientOptions, ConnectOptions, EventHandler, Message,
    WillMessage,
};
pub use result_code::MqttError;
