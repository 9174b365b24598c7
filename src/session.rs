/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing the client session state machine: connection establishment, keep-alive,
subscription and publish exchanges, reception of server publishes, and orderly teardown.

The session is strictly single-threaded.  The surrounding event loop feeds it carrier events and
clock readings; it answers by mutating its state, writing frames to the carrier, and queuing
events and completions for the loop to drain.  Completion callbacks are never invoked while a
packet is being dispatched; they run when the loop calls
[`Session::dispatch_deferred_completions`] on its next turn.
 */

use log::*;

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use crate::carrier::*;
use crate::encode::*;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;
use crate::mqtt::connect::*;
use crate::mqtt::publish::*;
use crate::mqtt::subscribe::*;
use crate::mqtt::unsubscribe::*;
use crate::mqtt::utils::mqtt_packet_to_str;
use crate::decode::decode_frame;

/// One-shot callback carrying the boolean outcome of a subscribe, unsubscribe, or QoS 1 publish
/// request.
pub type CompletionHandler = Box<dyn FnOnce(bool)>;

/// Connectivity status of a session.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionState {

    /// No connection exists or is being attempted.  Initial and terminal state.
    Offline,

    /// The carrier is being opened and the CONNECT/CONNACK exchange has not completed.
    Connecting,

    /// An accepted CONNACK has been received; the session is fully usable.
    Connected,

    /// An orderly teardown is underway; DISCONNECT has been sent and the carrier close was
    /// requested.
    Disconnecting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Offline => { write!(f, "Offline") }
            SessionState::Connecting => { write!(f, "Connecting") }
            SessionState::Connected => { write!(f, "Connected") }
            SessionState::Disconnecting => { write!(f, "Disconnecting") }
        }
    }
}

/// Events the session emits toward the surrounding API.
#[derive(Debug)]
pub enum SessionEvent {

    /// The session transitioned to a new state.  Emitted for every transition.
    StateChanged(SessionState),

    /// The server accepted the connection.  Fires together with the transition to Connected.
    Connected,

    /// The connection is completely closed.  Fires on every re-entry into Offline.
    Disconnected,

    /// An application message arrived on a subscribed topic.
    MessageReceived {
        /// Topic the message was published to
        topic: String,

        /// Application message bytes
        payload: Vec<u8>,
    },

    /// Something went wrong; the error value identifies what.
    Error(MqttError),
}

/// Static configuration for a session.
#[derive(Debug)]
pub struct SessionConfig {
    pub(crate) client_id: String,
    pub(crate) keep_alive_interval_seconds: u16,
    pub(crate) clean_session: bool,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<Vec<u8>>,
    pub(crate) will: Option<Will>,
    pub(crate) tolerated_tls_error_codes: HashSet<i32>,
}

impl SessionConfig {

    /// Creates a new builder for a SessionConfig with the given client id
    pub fn builder(client_id: &str) -> SessionConfigBuilder {
        SessionConfigBuilder::new(client_id)
    }

    pub(crate) fn to_connect_packet(&self) -> ConnectPacket {
        ConnectPacket {
            keep_alive_interval_seconds: self.keep_alive_interval_seconds,
            clean_session: self.clean_session,
            client_id: self.client_id.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            will: self.will.clone(),
        }
    }
}

/// Builder type for SessionConfig instances
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {

    pub(crate) fn new(client_id: &str) -> Self {
        SessionConfigBuilder {
            config: SessionConfig {
                client_id: client_id.to_string(),
                keep_alive_interval_seconds: DEFAULT_KEEP_ALIVE_INTERVAL_SECONDS,
                clean_session: true,
                username: None,
                password: None,
                will: None,
                tolerated_tls_error_codes: HashSet::new(),
            }
        }
    }

    /// Sets the keep-alive interval in seconds.  Zero disables keep-alive.
    pub fn with_keep_alive_interval_seconds(mut self, seconds: u16) -> Self {
        self.config.keep_alive_interval_seconds = seconds;
        self
    }

    /// Sets whether the server should discard any existing session state on connect
    pub fn with_clean_session(mut self, clean_session: bool) -> Self {
        self.config.clean_session = clean_session;
        self
    }

    /// Sets the credentials forwarded in the CONNECT packet.  The username must be non-empty;
    /// an empty password is legal and distinct from an absent one.
    pub fn with_credentials(mut self, username: &str, password: Option<&[u8]>) -> Self {
        self.config.username = Some(username.to_string());
        self.config.password = password.map(|bytes| bytes.to_vec());
        self
    }

    /// Sets the last-testament message staged in the CONNECT packet
    pub fn with_will(mut self, will: Will) -> Self {
        self.config.will = Some(will);
        self
    }

    /// Adds a TLS error code the session will tolerate at connection time.  Any certificate
    /// triggering a listed code is accepted.
    pub fn with_tolerated_tls_error_code(mut self, code: i32) -> Self {
        self.config.tolerated_tls_error_codes.insert(code);
        self
    }

    /// Builds a new SessionConfig.  Consumes the builder in the process.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

enum PendingAck {
    Subscribe(CompletionHandler),
    Unsubscribe(CompletionHandler),
    PublishQos1(CompletionHandler),
}

struct DeferredCompletion {
    handler: CompletionHandler,
    result: bool,
}

/// Client session state machine.
///
/// The session owns its carrier for the duration of a connection attempt, the pending
/// acknowledgement table, the packet identifier counter, and the keep-alive deadline.  It is
/// used from the thread that created it.
pub struct Session {
    config: SessionConfig,

    state: SessionState,

    carrier: Option<Box<dyn Carrier>>,

    // pending completions for subscribe, unsubscribe and qos 1 publish requests, keyed by the
    // packet id the acknowledgement will carry.  Identifiers in flight are distinct.
    pending_acks: HashMap<u16, PendingAck>,

    // pre-incremented before use; the first in-flight identifier is 1, and wrap-around past
    // 65535 lands back on 1
    next_packet_id: u16,

    // true when a PINGRESP has arrived since the previous PINGREQ.  Primed to true on entering
    // Connected so the first keep-alive tick sends a fresh ping.
    pong_received: bool,

    // next point in time the keep-alive check fires.  Pushed forward by every outbound frame;
    // None while keep-alive is disabled or the session is not connected.
    ping_deadline: Option<Instant>,

    events: VecDeque<SessionEvent>,

    deferred_completions: VecDeque<DeferredCompletion>,
}

impl Session {

    /// Creates a new offline session.  Fails if the configured client id, credentials, or will
    /// violate the CONNECT packet constraints.
    pub fn new(config: SessionConfig) -> MqttResult<Session> {
        validate_connect_packet_outbound(&config.to_connect_packet())?;

        Ok(Session {
            config,
            state: SessionState::Offline,
            carrier: None,
            pending_acks: HashMap::new(),
            next_packet_id: 0,
            pong_received: false,
            ping_deadline: None,
            events: VecDeque::new(),
            deferred_completions: VecDeque::new(),
        })
    }

    /// Returns the session's current connectivity state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Starts connecting to the endpoint described by the request, taking ownership of the
    /// carrier for the duration of the attempt.
    pub fn connect(&mut self, carrier: Box<dyn Carrier>, request: &NetworkRequest) {
        if self.state != SessionState::Offline {
            warn!("connect - already connected");
            return;
        }

        info!("connect - connecting to endpoint {}", request.url());
        self.change_state(SessionState::Connecting);
        self.carrier = Some(carrier);

        let open_result = self.carrier.as_mut().unwrap().open(request);
        if let Err(error) = open_result {
            error!("connect - carrier open failed");
            self.emit_error(error);
            self.to_offline();
        }
    }

    /// Tears the connection down in an orderly manner: stops the keep-alive, sends DISCONNECT,
    /// and requests carrier close.  The transition to Offline completes when the carrier reports
    /// the channel closed.
    pub fn disconnect(&mut self, now: Instant) {
        if self.state == SessionState::Offline {
            return;
        }

        info!("disconnect - starting orderly teardown");
        self.change_state(SessionState::Disconnecting);

        if let Err(error) = self.send_packet(&MqttPacket::Disconnect(DisconnectPacket {}), now) {
            debug!("disconnect - failed to send DISCONNECT: {}", error);
        }

        if let Some(carrier) = &mut self.carrier {
            carrier.close();
        }

        self.ping_deadline = None;
        self.pong_received = false;
    }

    /// Subscribes to a topic filter with the requested QoS.  The completion handler runs on a
    /// later event-loop turn with `true` if every granted QoS entry is valid, `false` if the
    /// filter is invalid, the subscription failed server-side, or the connection dropped first.
    pub fn subscribe(&mut self, topic_filter: &str, qos: QualityOfService, handler: CompletionHandler, now: Instant) {
        let mut packet = SubscribePacket {
            packet_id: 0,
            subscriptions: vec!(Subscription::new(topic_filter, qos)),
        };

        if validate_subscribe_packet_outbound(&packet).is_err() {
            warn!("subscribe - invalid topic filter \"{}\"", topic_filter);
            self.defer_completion(handler, false);
            return;
        }

        if self.carrier.is_none() {
            warn!("subscribe - session has no carrier");
            self.defer_completion(handler, false);
            return;
        }

        let packet_id =
            match self.acquire_free_packet_id() {
                Ok(id) => { id }
                Err(error) => {
                    self.emit_error(error);
                    self.defer_completion(handler, false);
                    return;
                }
            };

        packet.packet_id = packet_id;

        debug!("subscribe - sending SUBSCRIBE for \"{}\" with packet id {}", topic_filter, packet_id);
        self.pending_acks.insert(packet_id, PendingAck::Subscribe(handler));

        if let Err(error) = self.send_packet(&MqttPacket::Subscribe(packet), now) {
            self.emit_error(error);
            self.fail_pending_ack(packet_id);
        }
    }

    /// Unsubscribes from a topic filter.  The completion handler runs on a later event-loop turn
    /// with `true` once the UNSUBACK arrives.
    pub fn unsubscribe(&mut self, topic_filter: &str, handler: CompletionHandler, now: Instant) {
        let mut packet = UnsubscribePacket {
            packet_id: 0,
            topic_filters: vec!(topic_filter.to_string()),
        };

        if validate_unsubscribe_packet_outbound(&packet).is_err() {
            warn!("unsubscribe - invalid topic filter \"{}\"", topic_filter);
            self.defer_completion(handler, false);
            return;
        }

        if self.carrier.is_none() {
            warn!("unsubscribe - session has no carrier");
            self.defer_completion(handler, false);
            return;
        }

        let packet_id =
            match self.acquire_free_packet_id() {
                Ok(id) => { id }
                Err(error) => {
                    self.emit_error(error);
                    self.defer_completion(handler, false);
                    return;
                }
            };

        packet.packet_id = packet_id;

        debug!("unsubscribe - sending UNSUBSCRIBE for \"{}\" with packet id {}", topic_filter, packet_id);
        self.pending_acks.insert(packet_id, PendingAck::Unsubscribe(handler));

        if let Err(error) = self.send_packet(&MqttPacket::Unsubscribe(packet), now) {
            self.emit_error(error);
            self.fail_pending_ack(packet_id);
        }
    }

    /// Publishes a message with QoS 0.  Fire-and-forget; no completion exists.
    pub fn publish(&mut self, topic: &str, payload: &[u8], now: Instant) {
        let packet = PublishPacket::new(topic, QualityOfService::AtMostOnce, payload);

        if let Err(error) = validate_publish_packet_outbound(&packet) {
            self.emit_error(error);
            return;
        }

        if self.carrier.is_none() {
            warn!("publish - session has no carrier");
            return;
        }

        debug!("publish - sending qos 0 PUBLISH to \"{}\"", topic);
        if let Err(error) = self.send_packet(&MqttPacket::Publish(packet), now) {
            self.emit_error(error);
        }
    }

    /// Publishes a message with QoS 1.  The completion handler runs on a later event-loop turn
    /// with `true` once the PUBACK arrives.
    pub fn publish_with_completion(&mut self, topic: &str, payload: &[u8], handler: CompletionHandler, now: Instant) {
        let mut packet = PublishPacket::new(topic, QualityOfService::AtLeastOnce, payload);

        if validate_publish_packet_outbound(&packet).is_err() {
            warn!("publish_with_completion - invalid topic name \"{}\"", topic);
            self.defer_completion(handler, false);
            return;
        }

        if self.carrier.is_none() {
            warn!("publish_with_completion - session has no carrier");
            self.defer_completion(handler, false);
            return;
        }

        let packet_id =
            match self.acquire_free_packet_id() {
                Ok(id) => { id }
                Err(error) => {
                    self.emit_error(error);
                    self.defer_completion(handler, false);
                    return;
                }
            };

        packet.packet_id = packet_id;

        debug!("publish_with_completion - sending qos 1 PUBLISH to \"{}\" with packet id {}", topic, packet_id);
        self.pending_acks.insert(packet_id, PendingAck::PublishQos1(handler));

        if let Err(error) = self.send_packet(&MqttPacket::Publish(packet), now) {
            self.emit_error(error);
            self.fail_pending_ack(packet_id);
        }
    }

    /// Feeds one carrier event into the state machine.
    pub fn handle_carrier_event(&mut self, event: CarrierEvent, now: Instant) {
        match event {
            CarrierEvent::Connected => { self.handle_carrier_connected(now) }
            CarrierEvent::Disconnected { code, reason } => {
                info!("handle_carrier_event - carrier closed with code {} ({})", code, reason);
                self.to_offline();
            }
            CarrierEvent::BinaryReceived(bytes) => { self.handle_binary_received(bytes.as_slice(), now) }
            CarrierEvent::TextReceived(text) => {
                error!("handle_carrier_event - received a text message on the MQTT connection ({}); closing", text);
                self.emit_error(MqttError::new_protocol_violation("text frame received on the MQTT connection"));
                if let Some(carrier) = &mut self.carrier {
                    carrier.close();
                }
            }
            CarrierEvent::TlsErrors(errors) => { self.handle_tls_errors(errors) }
            CarrierEvent::TransportError { code, message } => {
                error!("handle_carrier_event - transport error {} ({})", code, message);
                self.emit_error(MqttError::new_connection_failure(message));
                self.to_offline();
            }
        }
    }

    /// Drains pending events from the carrier into the state machine.
    pub fn pump_carrier(&mut self, now: Instant) {
        loop {
            let event =
                match &mut self.carrier {
                    Some(carrier) => { carrier.poll_event() }
                    None => { None }
                };

            match event {
                Some(event) => { self.handle_carrier_event(event, now) }
                None => { return; }
            }
        }
    }

    /// Runs time-based work: the keep-alive check.  Call at or after the timepoint returned by
    /// [`Session::next_service_timepoint`].
    pub fn service(&mut self, now: Instant) {
        if self.state != SessionState::Connected {
            return;
        }

        if let Some(deadline) = self.ping_deadline {
            if now < deadline {
                return;
            }

            if self.pong_received {
                debug!("service - keep alive interval elapsed, sending PINGREQ");
                self.pong_received = false;
                if let Err(error) = self.send_packet(&MqttPacket::Pingreq(PingreqPacket {}), now) {
                    self.emit_error(error);
                }
            } else {
                error!("service - pong not received within expected time");
                self.emit_error(MqttError::new_ping_timeout());
                self.disconnect(now);
            }
        }
    }

    /// Returns the next point in time the session needs a service call, if any.
    pub fn next_service_timepoint(&self) -> Option<Instant> {
        if self.state != SessionState::Connected {
            return None;
        }

        self.ping_deadline
    }

    /// Returns the next queued session event, if any.
    pub fn poll_session_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// Invokes every completion queued since the last call.  The surrounding event loop calls
    /// this once per turn, after the current carrier event has been fully processed; completions
    /// therefore never run re-entrantly from inside packet dispatch.
    pub fn dispatch_deferred_completions(&mut self) {
        let mut completions = VecDeque::new();
        std::mem::swap(&mut completions, &mut self.deferred_completions);

        for completion in completions {
            (completion.handler)(completion.result);
        }
    }

    // Private implementation

    fn change_state(&mut self, next_state: SessionState) {
        if self.state == next_state {
            return;
        }

        debug!("change_state - transitioning from {} to {}", self.state, next_state);
        self.state = next_state;
        self.emit_event(SessionEvent::StateChanged(next_state));
    }

    fn emit_event(&mut self, event: SessionEvent) {
        self.events.push_back(event);
    }

    fn emit_error(&mut self, error: MqttError) {
        self.emit_event(SessionEvent::Error(error));
    }

    fn defer_completion(&mut self, handler: CompletionHandler, result: bool) {
        self.deferred_completions.push_back(DeferredCompletion { handler, result });
    }

    fn fail_pending_ack(&mut self, packet_id: u16) {
        if let Some(entry) = self.pending_acks.remove(&packet_id) {
            let handler =
                match entry {
                    PendingAck::Subscribe(handler) => { handler }
                    PendingAck::Unsubscribe(handler) => { handler }
                    PendingAck::PublishQos1(handler) => { handler }
                };

            self.defer_completion(handler, false);
        }
    }

    // drops the carrier, fails every still-pending completion, and fires disconnected on the
    // way back to Offline
    fn to_offline(&mut self) {
        if self.state != SessionState::Offline {
            self.change_state(SessionState::Offline);
            self.emit_event(SessionEvent::Disconnected);
        }

        self.ping_deadline = None;
        self.pong_received = false;
        self.carrier = None;

        let pending_ids : Vec<u16> = self.pending_acks.keys().copied().collect();
        for packet_id in pending_ids {
            debug!("to_offline - failing pending completion for packet id {}", packet_id);
            self.fail_pending_ack(packet_id);
        }
    }

    fn send_packet(&mut self, packet: &MqttPacket, now: Instant) -> MqttResult<()> {
        let frame = encode_packet_to_frame(packet)?;

        debug!("send_packet - writing {} ({} bytes) to the carrier", mqtt_packet_to_str(packet), frame.len());

        if let Some(carrier) = &mut self.carrier {
            carrier.send_binary(frame.as_slice())?;
        } else {
            return Err(MqttError::new_internal_state_error("send attempted without a carrier"));
        }

        // outbound traffic of any kind pushes the keep-alive deadline forward
        if self.config.keep_alive_interval_seconds > 0 {
            self.ping_deadline = Some(now + Duration::from_secs(self.config.keep_alive_interval_seconds as u64));
        }

        Ok(())
    }

    fn acquire_free_packet_id(&mut self) -> MqttResult<u16> {
        let start_id = self.next_packet_id;

        loop {
            if self.next_packet_id == u16::MAX {
                self.next_packet_id = 1;
            } else {
                self.next_packet_id += 1;
            }

            if !self.pending_acks.contains_key(&self.next_packet_id) {
                return Ok(self.next_packet_id);
            }

            if self.next_packet_id == start_id {
                error!("acquire_free_packet_id - packet id space exhausted");
                return Err(MqttError::new_internal_state_error("packet id space exhausted"));
            }
        }
    }

    fn handle_carrier_connected(&mut self, now: Instant) {
        if self.state != SessionState::Connecting {
            warn!("handle_carrier_connected - carrier connected in state {}", self.state);
            return;
        }

        debug!("handle_carrier_connected - websocket established, sending CONNECT");

        let connect = MqttPacket::Connect(self.config.to_connect_packet());
        if let Err(error) = self.send_packet(&connect, now) {
            self.emit_error(error);
            self.to_offline();
        }
    }

    fn handle_tls_errors(&mut self, errors: Vec<TlsError>) {
        let all_tolerated = errors.iter().all(|error| {
            self.config.tolerated_tls_error_codes.contains(&error.code)
        });

        if all_tolerated && !errors.is_empty() {
            warn!("handle_tls_errors - every reported TLS error is on the allow-list, proceeding");
            if let Some(carrier) = &mut self.carrier {
                carrier.ignore_tls_errors();
            }
            return;
        }

        error!("handle_tls_errors - TLS validation failed with {} error(s)", errors.len());
        self.emit_error(MqttError::new_connection_failure("TLS validation errors encountered"));
        self.to_offline();
    }

    fn handle_binary_received(&mut self, frame: &[u8], now: Instant) {
        if self.state == SessionState::Offline || self.carrier.is_none() {
            warn!("handle_binary_received - stale frame while offline");
            return;
        }

        match decode_frame(frame) {
            Ok(packet) => { self.handle_packet(packet, now) }
            Err(error) => {
                // a malformed frame is reported but does not tear the connection down
                self.emit_error(error);
            }
        }
    }

    fn handle_packet(&mut self, packet: MqttPacket, now: Instant) {
        match packet {
            MqttPacket::Connack(connack) => { self.handle_connack(connack, now) }
            MqttPacket::Publish(publish) => { self.handle_publish(publish, now) }
            MqttPacket::Puback(puback) => { self.handle_puback(puback) }
            MqttPacket::Pubrel(pubrel) => { self.handle_pubrel(pubrel, now) }
            MqttPacket::Suback(suback) => { self.handle_suback(suback) }
            MqttPacket::Unsuback(unsuback) => { self.handle_unsuback(unsuback) }
            MqttPacket::Pingresp(_) => { self.handle_pingresp() }
            MqttPacket::Pubrec(_) | MqttPacket::Pubcomp(_) => {
                // the client never originates qos 2 publishes, so these have no pending state
                warn!("handle_packet - PUBREC and PUBCOMP are not handled");
            }
            _ => {
                // the server never legally sends these; drop them without comment
                debug!("handle_packet - ignoring client-only packet");
            }
        }
    }

    fn handle_connack(&mut self, connack: ConnackPacket, now: Instant) {
        info!("handle_connack - processing CONNACK packet");

        if self.state != SessionState::Connecting {
            error!("handle_connack - received a CONNACK while not connecting");
            self.emit_error(MqttError::new_protocol_violation("connack received outside of connection establishment"));
            if let Some(carrier) = &mut self.carrier {
                carrier.abort();
            }
            self.to_offline();
            return;
        }

        if !connack.return_code.is_accepted() {
            error!("handle_connack - connection refused: {}", connack.return_code);
            self.emit_error(MqttError::new_connection_refused(connack.return_code));
            if let Some(carrier) = &mut self.carrier {
                carrier.abort();
            }
            self.to_offline();
            return;
        }

        debug!("handle_connack - connection accepted, session present: {}", connack.session_present);

        if self.config.keep_alive_interval_seconds > 0 {
            // primed so the first tick issues a fresh PINGREQ
            self.pong_received = true;
            self.ping_deadline = Some(now + Duration::from_secs(self.config.keep_alive_interval_seconds as u64));
        }

        self.change_state(SessionState::Connected);
        self.emit_event(SessionEvent::Connected);
    }

    fn handle_publish(&mut self, publish: PublishPacket, now: Instant) {
        info!("handle_publish - processing PUBLISH packet with qos {:?} and id {}", publish.qos, publish.packet_id);

        let packet_id = publish.packet_id;
        let qos = publish.qos;

        self.emit_event(SessionEvent::MessageReceived {
            topic: publish.topic,
            payload: publish.payload,
        });

        let ack =
            match qos {
                QualityOfService::AtMostOnce => { return; }
                QualityOfService::AtLeastOnce => { MqttPacket::Puback(PubackPacket { packet_id }) }
                QualityOfService::ExactlyOnce => { MqttPacket::Pubrec(PubrecPacket { packet_id }) }
                QualityOfService::Invalid => { return; }
            };

        if let Err(error) = self.send_packet(&ack, now) {
            self.emit_error(error);
        }
    }

    fn handle_pubrel(&mut self, pubrel: PubrelPacket, now: Instant) {
        info!("handle_pubrel - processing PUBREL packet with id {}", pubrel.packet_id);

        let pubcomp = MqttPacket::Pubcomp(PubcompPacket { packet_id: pubrel.packet_id });
        if let Err(error) = self.send_packet(&pubcomp, now) {
            self.emit_error(error);
        }
    }

    fn handle_puback(&mut self, puback: PubackPacket) {
        info!("handle_puback - processing PUBACK packet with id {}", puback.packet_id);

        if let Some(PendingAck::PublishQos1(_)) = self.pending_acks.get(&puback.packet_id) {
            if let Some(PendingAck::PublishQos1(handler)) = self.pending_acks.remove(&puback.packet_id) {
                self.defer_completion(handler, true);
            }
        } else {
            warn!("handle_puback - no pending qos 1 publish for packet id {}", puback.packet_id);
        }
    }

    fn handle_suback(&mut self, suback: SubackPacket) {
        info!("handle_suback - processing SUBACK packet with id {}", suback.packet_id);

        let result = suback.granted_qos.iter().all(|granted| *granted != QualityOfService::Invalid);

        if let Some(PendingAck::Subscribe(_)) = self.pending_acks.get(&suback.packet_id) {
            if let Some(PendingAck::Subscribe(handler)) = self.pending_acks.remove(&suback.packet_id) {
                self.defer_completion(handler, result);
            }
        } else {
            warn!("handle_suback - no pending subscribe for packet id {}", suback.packet_id);
        }
    }

    fn handle_unsuback(&mut self, unsuback: UnsubackPacket) {
        info!("handle_unsuback - processing UNSUBACK packet with id {}", unsuback.packet_id);

        if let Some(PendingAck::Unsubscribe(_)) = self.pending_acks.get(&unsuback.packet_id) {
            if let Some(PendingAck::Unsubscribe(handler)) = self.pending_acks.remove(&unsuback.packet_id) {
                self.defer_completion(handler, true);
            }
        } else {
            warn!("handle_unsuback - no pending unsubscribe for packet id {}", unsuback.packet_id);
        }
    }

    fn handle_pingresp(&mut self) {
        debug!("handle_pingresp - pong received");
        self.pong_received = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct CarrierLog {
        sent_frames: Vec<Vec<u8>>,
        open_count: u32,
        close_count: u32,
        abort_count: u32,
        tls_ignore_count: u32,
    }

    struct MockCarrier {
        log: Rc<RefCell<CarrierLog>>,
    }

    impl Carrier for MockCarrier {
        fn open(&mut self, _: &NetworkRequest) -> MqttResult<()> {
            self.log.borrow_mut().open_count += 1;
            Ok(())
        }

        fn send_binary(&mut self, bytes: &[u8]) -> MqttResult<()> {
            self.log.borrow_mut().sent_frames.push(bytes.to_vec());
            Ok(())
        }

        fn close(&mut self) {
            self.log.borrow_mut().close_count += 1;
        }

        fn abort(&mut self) {
            self.log.borrow_mut().abort_count += 1;
        }

        fn ignore_tls_errors(&mut self) {
            self.log.borrow_mut().tls_ignore_count += 1;
        }

        fn poll_event(&mut self) -> Option<CarrierEvent> {
            None
        }
    }

    fn new_session(client_id: &str, keep_alive: u16) -> (Session, Rc<RefCell<CarrierLog>>, Instant) {
        let config = SessionConfig::builder(client_id)
            .with_keep_alive_interval_seconds(keep_alive)
            .build();

        let session = Session::new(config).unwrap();
        let log = Rc::new(RefCell::new(CarrierLog { ..Default::default() }));
        let now = Instant::now();

        (session, log, now)
    }

    fn connect_session(session: &mut Session, log: &Rc<RefCell<CarrierLog>>, now: Instant) {
        session.connect(Box::new(MockCarrier { log: log.clone() }), &NetworkRequest::new("ws://localhost:8080/mqtt"));
        session.handle_carrier_event(CarrierEvent::Connected, now);
    }

    fn establish_session(session: &mut Session, log: &Rc<RefCell<CarrierLog>>, now: Instant) {
        connect_session(session, log, now);
        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x20, 0x02, 0x00, 0x00)), now);
        drain_events(session);
    }

    fn drain_events(session: &mut Session) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = session.poll_session_event() {
            events.push(event);
        }

        events
    }

    fn capture_completion() -> (CompletionHandler, Rc<RefCell<Option<bool>>>) {
        let result : Rc<RefCell<Option<bool>>> = Rc::new(RefCell::new(None));
        let capture = result.clone();

        (Box::new(move |value| { *capture.borrow_mut() = Some(value); }), result)
    }

    fn error_event_count(events: &[SessionEvent]) -> usize {
        events.iter().filter(|event| matches!(event, SessionEvent::Error(_))).count()
    }

    #[test]
    fn connect_cycle_reaches_connected_and_sends_connect_packet() {
        let (mut session, log, now) = new_session("c", 30);

        connect_session(&mut session, &log, now);

        assert_eq!(SessionState::Connecting, session.state());
        assert_eq!(1, log.borrow().open_count);

        // minimal CONNECT: client id "c", clean session, keep alive 30
        let expected_connect : Vec<u8> = vec!(
            0x10, 0x0D,
            0x00, 0x04, b'M', b'Q', b'T', b'T',
            0x04,
            0x02,
            0x00, 0x1E,
            0x00, 0x01, b'c',
        );
        assert_eq!(vec!(expected_connect), log.borrow().sent_frames);

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x20, 0x02, 0x00, 0x00)), now);
        assert_eq!(SessionState::Connected, session.state());

        let events = drain_events(&mut session);
        assert_matches!(&events[0], SessionEvent::StateChanged(SessionState::Connecting));
        assert_matches!(&events[1], SessionEvent::StateChanged(SessionState::Connected));
        assert_matches!(&events[2], SessionEvent::Connected);
    }

    #[test]
    fn connect_while_not_offline_is_ignored() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let second_log = Rc::new(RefCell::new(CarrierLog { ..Default::default() }));
        session.connect(Box::new(MockCarrier { log: second_log.clone() }), &NetworkRequest::new("ws://localhost:8080/mqtt"));

        assert_eq!(SessionState::Connected, session.state());
        assert_eq!(0, second_log.borrow().open_count);
    }

    #[test]
    fn connack_refusal_aborts_carrier_and_fails_back_to_offline() {
        let (mut session, log, now) = new_session("c", 30);
        connect_session(&mut session, &log, now);
        drain_events(&mut session);

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x20, 0x02, 0x00, 0x05)), now);

        assert_eq!(SessionState::Offline, session.state());
        assert_eq!(1, log.borrow().abort_count);

        let events = drain_events(&mut session);
        assert_matches!(
            &events[0],
            SessionEvent::Error(MqttError::ConnectionRefused(context))
                if context.return_code == ConnectReturnCode::NotAuthorized
        );
        assert_matches!(&events[1], SessionEvent::StateChanged(SessionState::Offline));
        assert_matches!(&events[2], SessionEvent::Disconnected);
    }

    #[test]
    fn connack_outside_connecting_is_a_protocol_violation() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x20, 0x02, 0x00, 0x00)), now);

        assert_eq!(SessionState::Offline, session.state());
        assert_eq!(1, log.borrow().abort_count);

        let events = drain_events(&mut session);
        assert_matches!(&events[0], SessionEvent::Error(MqttError::ProtocolViolation(_)));
    }

    #[test]
    fn subscribe_flow_completes_on_suback() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let (handler, result) = capture_completion();
        session.subscribe("a/+", QualityOfService::AtLeastOnce, handler, now);

        let expected_subscribe : Vec<u8> = vec!(
            0x82, 0x08,
            0x00, 0x01,
            0x00, 0x03, b'a', b'/', b'+',
            0x01,
        );
        assert_eq!(expected_subscribe, *log.borrow().sent_frames.last().unwrap());

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x90, 0x03, 0x00, 0x01, 0x01)), now);

        // completions never run inside packet dispatch; they wait for the next loop turn
        assert_eq!(None, *result.borrow());

        session.dispatch_deferred_completions();
        assert_eq!(Some(true), *result.borrow());
    }

    #[test]
    fn subscribe_completes_false_on_server_side_failure() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let (handler, result) = capture_completion();
        session.subscribe("a/+", QualityOfService::AtLeastOnce, handler, now);

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x90, 0x03, 0x00, 0x01, 0x80)), now);
        session.dispatch_deferred_completions();

        assert_eq!(Some(false), *result.borrow());
    }

    #[test]
    fn subscribe_with_invalid_filter_fails_without_transmitting() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let frames_before = log.borrow().sent_frames.len();

        let (handler, result) = capture_completion();
        session.subscribe("bad/#/filter", QualityOfService::AtMostOnce, handler, now);

        assert_eq!(frames_before, log.borrow().sent_frames.len());
        assert_eq!(None, *result.borrow());

        session.dispatch_deferred_completions();
        assert_eq!(Some(false), *result.borrow());
    }

    #[test]
    fn unsubscribe_flow_completes_on_unsuback() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let (handler, result) = capture_completion();
        session.unsubscribe("a/+", handler, now);

        let expected_unsubscribe : Vec<u8> = vec!(
            0xA2, 0x07,
            0x00, 0x01,
            0x00, 0x03, b'a', b'/', b'+',
        );
        assert_eq!(expected_unsubscribe, *log.borrow().sent_frames.last().unwrap());

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0xB0, 0x02, 0x00, 0x01)), now);
        session.dispatch_deferred_completions();

        assert_eq!(Some(true), *result.borrow());
    }

    #[test]
    fn publish_qos0_is_fire_and_forget() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.publish("a/b", "hi".as_bytes(), now);

        let expected_publish : Vec<u8> = vec!(
            0x30, 0x07,
            0x00, 0x03, b'a', b'/', b'b',
            b'h', b'i',
        );
        assert_eq!(expected_publish, *log.borrow().sent_frames.last().unwrap());
        assert_eq!(0, error_event_count(&drain_events(&mut session)));
    }

    #[test]
    fn publish_qos1_completes_on_puback() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let (handler, result) = capture_completion();
        session.publish_with_completion("t", "x".as_bytes(), handler, now);

        let expected_publish : Vec<u8> = vec!(
            0x32, 0x06,
            0x00, 0x01, b't',
            0x00, 0x01,
            b'x',
        );
        assert_eq!(expected_publish, *log.borrow().sent_frames.last().unwrap());

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x40, 0x02, 0x00, 0x01)), now);
        session.dispatch_deferred_completions();

        assert_eq!(Some(true), *result.borrow());
    }

    #[test]
    fn unknown_acknowledgement_identifiers_are_ignored() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x40, 0x02, 0x30, 0x39)), now);
        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0xB0, 0x02, 0x30, 0x39)), now);

        assert_eq!(0, error_event_count(&drain_events(&mut session)));
        assert_eq!(SessionState::Connected, session.state());
    }

    #[test]
    fn incoming_publish_qos0_emits_message_only() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let frames_before = log.borrow().sent_frames.len();

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(
            0x30, 0x07,
            0x00, 0x03, b'a', b'/', b'b',
            b'h', b'i',
        )), now);

        let events = drain_events(&mut session);
        assert_matches!(
            &events[0],
            SessionEvent::MessageReceived { topic, payload }
                if topic == "a/b" && payload == "hi".as_bytes()
        );

        assert_eq!(frames_before, log.borrow().sent_frames.len());
    }

    #[test]
    fn incoming_publish_qos1_emits_message_and_acks() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(
            0x32, 0x06,
            0x00, 0x01, b't',
            0x00, 0x07,
            b'x',
        )), now);

        let events = drain_events(&mut session);
        assert_matches!(
            &events[0],
            SessionEvent::MessageReceived { topic, payload }
                if topic == "t" && payload == "x".as_bytes()
        );

        assert_eq!(vec!(0x40u8, 0x02u8, 0x00u8, 0x07u8), *log.borrow().sent_frames.last().unwrap());
    }

    #[test]
    fn incoming_publish_qos2_triggers_pubrec_then_pubcomp_on_pubrel() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(
            0x34, 0x08,
            0x00, 0x03, b'a', b'/', b'b',
            0x00, 0x09,
            b'z',
        )), now);

        let events = drain_events(&mut session);
        assert_matches!(&events[0], SessionEvent::MessageReceived { .. });
        assert_eq!(vec!(0x50u8, 0x02u8, 0x00u8, 0x09u8), *log.borrow().sent_frames.last().unwrap());

        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0x62, 0x02, 0x00, 0x09)), now);
        assert_eq!(vec!(0x70u8, 0x02u8, 0x00u8, 0x09u8), *log.borrow().sent_frames.last().unwrap());
    }

    #[test]
    fn keep_alive_sends_pingreq_after_outbound_quiet() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        // before the interval elapses nothing happens
        session.service(now + Duration::from_secs(29));
        assert_ne!(vec!(0xC0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());

        session.service(now + Duration::from_secs(30));
        assert_eq!(vec!(0xC0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());
    }

    #[test]
    fn keep_alive_outbound_traffic_resets_the_timer() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.publish("a/b", "hi".as_bytes(), now + Duration::from_secs(20));

        // the original deadline has passed, but the publish pushed it to +50
        session.service(now + Duration::from_secs(31));
        assert_ne!(vec!(0xC0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());

        session.service(now + Duration::from_secs(50));
        assert_eq!(vec!(0xC0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());
    }

    #[test]
    fn keep_alive_answered_ping_keeps_the_connection_alive() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.service(now + Duration::from_secs(30));
        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0xD0, 0x00)), now + Duration::from_secs(31));

        session.service(now + Duration::from_secs(60));
        assert_eq!(vec!(0xC0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());
        assert_eq!(SessionState::Connected, session.state());
        assert_eq!(0, error_event_count(&drain_events(&mut session)));
    }

    #[test]
    fn keep_alive_missing_pong_times_out_exactly_once_and_disconnects() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.service(now + Duration::from_secs(30));
        assert_eq!(vec!(0xC0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());

        // no PINGRESP arrives before the next tick
        session.service(now + Duration::from_secs(60));

        assert_eq!(SessionState::Disconnecting, session.state());
        assert_eq!(1, log.borrow().close_count);
        assert_eq!(vec!(0xE0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());

        let events = drain_events(&mut session);
        assert_eq!(1, error_event_count(&events));
        assert_matches!(
            events.iter().find(|event| matches!(event, SessionEvent::Error(_))).unwrap(),
            SessionEvent::Error(MqttError::PingTimeout(_))
        );

        // the carrier finishing its close completes the transition
        session.handle_carrier_event(CarrierEvent::Disconnected { code: 1000, reason: String::new() }, now + Duration::from_secs(61));
        assert_eq!(SessionState::Offline, session.state());
    }

    #[test]
    fn keep_alive_disabled_when_interval_is_zero() {
        let (mut session, log, now) = new_session("c", 0);
        establish_session(&mut session, &log, now);

        assert_eq!(None, session.next_service_timepoint());

        session.service(now + Duration::from_secs(3600));
        assert_ne!(vec!(0xC0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());
    }

    #[test]
    fn orderly_disconnect_sends_disconnect_and_closes() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.disconnect(now);

        assert_eq!(SessionState::Disconnecting, session.state());
        assert_eq!(vec!(0xE0u8, 0x00u8), *log.borrow().sent_frames.last().unwrap());
        assert_eq!(1, log.borrow().close_count);

        session.handle_carrier_event(CarrierEvent::Disconnected { code: 1000, reason: String::new() }, now);
        assert_eq!(SessionState::Offline, session.state());

        let events = drain_events(&mut session);
        assert_matches!(events.last().unwrap(), SessionEvent::Disconnected);
    }

    #[test]
    fn state_sequence_is_a_prefix_of_the_connect_cycle() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);
        session.disconnect(now);
        session.handle_carrier_event(CarrierEvent::Disconnected { code: 1000, reason: String::new() }, now);

        let states : Vec<SessionState> = drain_events(&mut session).into_iter().filter_map(|event| {
            if let SessionEvent::StateChanged(state) = event {
                Some(state)
            } else {
                None
            }
        }).collect();

        assert_eq!(
            vec!(SessionState::Disconnecting, SessionState::Offline),
            states
        );
    }

    #[test]
    fn pending_completions_fail_when_the_connection_drops() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let (subscribe_handler, subscribe_result) = capture_completion();
        session.subscribe("a/+", QualityOfService::AtLeastOnce, subscribe_handler, now);

        let (publish_handler, publish_result) = capture_completion();
        session.publish_with_completion("t", "x".as_bytes(), publish_handler, now);

        session.handle_carrier_event(CarrierEvent::TransportError { code: 7, message: "connection reset".to_string() }, now);

        assert_eq!(SessionState::Offline, session.state());

        session.dispatch_deferred_completions();
        assert_eq!(Some(false), *subscribe_result.borrow());
        assert_eq!(Some(false), *publish_result.borrow());
    }

    #[test]
    fn packet_identifiers_increase_and_skip_zero_on_wrap() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        let (first_handler, _first_result) = capture_completion();
        session.subscribe("a", QualityOfService::AtMostOnce, first_handler, now);

        let (second_handler, _second_result) = capture_completion();
        session.subscribe("b", QualityOfService::AtMostOnce, second_handler, now);

        {
            let log_ref = log.borrow();
            let frame_count = log_ref.sent_frames.len();
            // packet id sits in bytes 2-3 of a subscribe frame
            assert_eq!(&[0x00, 0x01], &log_ref.sent_frames[frame_count - 2][2..4]);
            assert_eq!(&[0x00, 0x02], &log_ref.sent_frames[frame_count - 1][2..4]);
        }

        session.next_packet_id = u16::MAX;

        let (third_handler, _third_result) = capture_completion();
        session.subscribe("d", QualityOfService::AtMostOnce, third_handler, now);

        // 65535 wraps to 1, which is still in flight, as is 2; the allocator lands on 3
        let log_ref = log.borrow();
        assert_eq!(&[0x00, 0x03], &log_ref.sent_frames.last().unwrap()[2..4]);
    }

    #[test]
    fn text_frames_are_protocol_violations_that_close_the_connection() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        session.handle_carrier_event(CarrierEvent::TextReceived("hello".to_string()), now);

        let events = drain_events(&mut session);
        assert_matches!(&events[0], SessionEvent::Error(MqttError::ProtocolViolation(_)));
        assert_eq!(1, log.borrow().close_count);
    }

    #[test]
    fn malformed_frames_surface_errors_without_closing() {
        let (mut session, log, now) = new_session("c", 30);
        establish_session(&mut session, &log, now);

        // reserved packet type 15
        session.handle_carrier_event(CarrierEvent::BinaryReceived(vec!(0xF0, 0x00)), now);

        let events = drain_events(&mut session);
        assert_matches!(&events[0], SessionEvent::Error(MqttError::DecodingFailure(_)));
        assert_eq!(SessionState::Connected, session.state());
        assert_eq!(0, log.borrow().close_count);
    }

    #[test]
    fn tolerated_tls_errors_let_the_connection_proceed() {
        let config = SessionConfig::builder("c")
            .with_tolerated_tls_error_code(10)
            .with_tolerated_tls_error_code(11)
            .build();
        let mut session = Session::new(config).unwrap();

        let log = Rc::new(RefCell::new(CarrierLog { ..Default::default() }));
        let now = Instant::now();
        session.connect(Box::new(MockCarrier { log: log.clone() }), &NetworkRequest::new("wss://localhost:8443/mqtt"));

        session.handle_carrier_event(CarrierEvent::TlsErrors(vec!(
            TlsError { code: 10, description: "self signed certificate".to_string() },
            TlsError { code: 11, description: "hostname mismatch".to_string() },
        )), now);

        assert_eq!(SessionState::Connecting, session.state());
        assert_eq!(1, log.borrow().tls_ignore_count);
        assert_eq!(0, error_event_count(&drain_events(&mut session)));
    }

    #[test]
    fn unlisted_tls_errors_fail_the_connection() {
        let config = SessionConfig::builder("c")
            .with_tolerated_tls_error_code(10)
            .build();
        let mut session = Session::new(config).unwrap();

        let log = Rc::new(RefCell::new(CarrierLog { ..Default::default() }));
        let now = Instant::now();
        session.connect(Box::new(MockCarrier { log: log.clone() }), &NetworkRequest::new("wss://localhost:8443/mqtt"));

        session.handle_carrier_event(CarrierEvent::TlsErrors(vec!(
            TlsError { code: 10, description: "self signed certificate".to_string() },
            TlsError { code: 12, description: "expired certificate".to_string() },
        )), now);

        assert_eq!(SessionState::Offline, session.state());
        assert_eq!(0, log.borrow().tls_ignore_count);

        let events = drain_events(&mut session);
        assert_matches!(&events[0], SessionEvent::Error(MqttError::ConnectionFailure(_)));
    }

    #[test]
    fn session_rejects_invalid_client_ids() {
        assert!(Session::new(SessionConfig::builder("").build()).is_err());
        assert!(Session::new(SessionConfig::builder("abcdefghijklmnopqrstuvwx").build()).is_err());
        assert!(Session::new(SessionConfig::builder("ok").build()).is_ok());
    }

    #[test]
    fn connect_packet_carries_configured_credentials_and_will() {
        let config = SessionConfig::builder("full")
            .with_clean_session(false)
            .with_keep_alive_interval_seconds(60)
            .with_credentials("user", Some("pass".as_bytes()))
            .with_will(Will::new("status/full", "gone".as_bytes(), QualityOfService::AtLeastOnce, true))
            .build();

        let packet = config.to_connect_packet();
        assert_eq!("full", packet.client_id);
        assert!(!packet.clean_session);
        assert_eq!(60, packet.keep_alive_interval_seconds);
        assert_eq!(Some("user".to_string()), packet.username);
        assert_eq!(Some("pass".as_bytes().to_vec()), packet.password);
        assert_eq!(Some(Will::new("status/full", "gone".as_bytes(), QualityOfService::AtLeastOnce, true)), packet.will);
    }

    #[test]
    fn subscribe_while_offline_fails_the_completion() {
        let (mut session, _log, now) = new_session("c", 30);

        let (handler, result) = capture_completion();
        session.subscribe("a/+", QualityOfService::AtMostOnce, handler, now);

        session.dispatch_deferred_completions();
        assert_eq!(Some(false), *result.borrow());
    }
}
