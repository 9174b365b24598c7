/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
This crate implements the core of an MQTT 3.1.1 client that transports its control packets over
a websocket carrier, one packet per binary message.

The crate is built around three pieces:

* a packet codec that serializes outgoing control packets to byte strings and parses incoming
  byte strings into typed packet values, rejecting malformed or disallowed input;
* a single-threaded client session state machine that drives connection setup, keep-alive,
  subscription and publish exchanges (QoS 0 and 1 outbound, QoS 0/1/2 inbound), and orderly
  teardown, correlating acknowledgements with pending requests by packet identifier;
* a carrier abstraction for the underlying binary message channel, with a synchronous
  [`tungstenite`](https://crates.io/crates/tungstenite)-backed implementation included.

The session never runs callbacks re-entrantly: completions and events queue up inside the
session and the surrounding event loop drains them once per turn.

# Example: connect and react to events

```no_run
use loam_mqtt::carrier::NetworkRequest;
use loam_mqtt::session::{Session, SessionConfig};
use loam_mqtt::ws::WebsocketCarrier;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig::builder("sensor-17").build();
    let mut session = Session::new(config)?;

    let request = NetworkRequest::new("ws://localhost:8080/mqtt");
    session.connect(Box::new(WebsocketCarrier::new()), &request);

    loop {
        session.pump_carrier(Instant::now());

        while let Some(event) = session.poll_session_event() {
            println!("{:?}", event);
        }

        session.dispatch_deferred_completions();
        session.service(Instant::now());
    }
}
```
*/

#![warn(missing_docs)]

pub mod carrier;
mod decode;
mod encode;
pub mod error;
mod logging;
pub mod mqtt;
pub mod session;
mod validate;
pub mod ws;

/* Re-export the commonly used types at the root level */
pub use carrier::{Carrier, CarrierEvent, NetworkRequest, TlsError};
pub use error::{MqttError, MqttResult};
pub use mqtt::{ConnectReturnCode, MqttPacket, PacketType, QualityOfService, Will};
pub use session::{CompletionHandler, Session, SessionConfig, SessionEvent, SessionState};
pub use ws::WebsocketCarrier;
