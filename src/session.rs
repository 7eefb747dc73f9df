//! EtherNet/IP session and connection lifecycle.
//!
//! A [`Session`] owns the transport and every protocol counter for one PLC.
//! Its state is an explicit sum type, so session handles and connection IDs
//! only exist in the states where they are valid:
//!
//! ```text
//! Disconnected --register()--> Registered --forward_open()--> Connected
//!      ^                           |                              |
//!      +---------- close() --------+---------- close() -----------+
//! ```
//!
//! Requests are strictly one at a time. Each request carries a fresh 8-byte
//! sender context; replies with a different context are late replies to an
//! earlier, timed-out request and are discarded.

use tracing::{debug, info, trace, warn};

use crate::cip::{parse_routed_response, service, MessageRouterResponse};
use crate::config::OriginatorIdentity;
use crate::connection::{
    generate_connection_serial, ForwardCloseRequest, ForwardOpenReply, ForwardOpenRequest,
};
use crate::cpf::CommonPacket;
use crate::encapsulation::{
    EncapsulationCommand, EncapsulationHeader, EncapsulationPacket, ENCAPSULATION_HEADER_SIZE,
};
use crate::error::{EipError, Result};
use crate::transport::Transport;

/// Maximum number of stale frames skipped while waiting for a reply.
pub const MAX_STALE_REPLIES: usize = 4;

/// Connection IDs negotiated by Forward Open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionIds {
    /// ID carried by requests (O→T).
    pub o_to_t: u32,
    /// ID carried by replies (T→O).
    pub t_to_o: u32,
    /// Connection serial number, needed by Forward Close.
    pub serial: u16,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No transport, no session.
    Disconnected,
    /// Register Session succeeded; unconnected messaging is available.
    Registered {
        /// Session handle assigned by the PLC.
        session_handle: u32,
    },
    /// Forward Open succeeded; connected messaging is available too.
    Connected {
        /// Session handle assigned by the PLC.
        session_handle: u32,
        /// Negotiated connection.
        connection: ConnectionIds,
    },
}

impl SessionStatus {
    /// Returns the session handle if a session is registered.
    pub fn session_handle(&self) -> Option<u32> {
        match *self {
            SessionStatus::Disconnected => None,
            SessionStatus::Registered { session_handle }
            | SessionStatus::Connected { session_handle, .. } => Some(session_handle),
        }
    }

    /// Returns the connection IDs if a connection is open.
    pub fn connection(&self) -> Option<ConnectionIds> {
        match *self {
            SessionStatus::Connected { connection, .. } => Some(connection),
            _ => None,
        }
    }
}

/// An EtherNet/IP session with one PLC.
pub struct Session<T: Transport> {
    transport: T,
    state: SessionStatus,
    originator: OriginatorIdentity,
    context_counter: u64,
    sequence: u16,
}

impl<T: Transport> Session<T> {
    /// Creates a disconnected session over `transport`.
    pub fn new(transport: T, originator: OriginatorIdentity) -> Self {
        Self {
            transport,
            state: SessionStatus::Disconnected,
            originator,
            context_counter: 0,
            sequence: 0,
        }
    }

    /// Returns the current state.
    pub fn status(&self) -> SessionStatus {
        self.state
    }

    /// Returns the originator identity.
    pub fn originator(&self) -> &OriginatorIdentity {
        &self.originator
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn next_context(&mut self) -> [u8; 8] {
        self.context_counter = self.context_counter.wrapping_add(1);
        self.context_counter.to_le_bytes()
    }

    /// Opens the transport and registers a session.
    ///
    /// On failure the transport is closed and the state stays
    /// `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns transport errors, `EipError::EncapsulationStatus` if the PLC
    /// refuses the registration, or `EipError::MalformedReply`.
    pub fn register(&mut self) -> Result<()> {
        if self.state != SessionStatus::Disconnected {
            return Err(EipError::invalid_parameter(
                "session",
                "session is already registered",
            ));
        }

        let result = self.try_register();
        if result.is_err() {
            self.transport.close();
        }
        result
    }

    fn try_register(&mut self) -> Result<()> {
        self.transport.open()?;

        let context = self.next_context();
        let request = EncapsulationPacket::register_session(context);
        let reply = self.exchange(&request, EncapsulationCommand::RegisterSession)?;

        let session_handle = reply.header.session_handle;
        if session_handle == 0 {
            return Err(EipError::malformed("Register Session reply has no session handle"));
        }

        debug!(
            session_handle = %format!("0x{:08X}", session_handle),
            "session registered"
        );
        self.state = SessionStatus::Registered { session_handle };
        Ok(())
    }

    /// Negotiates a connected session with Forward Open.
    ///
    /// # Errors
    ///
    /// Returns `EipError::NotConnected` unless the session is registered and
    /// not yet connected, `EipError::CipStatus` if the PLC rejects the
    /// connection, or `EipError::MalformedReply`.
    pub fn forward_open(&mut self) -> Result<()> {
        self.forward_open_with_serial(generate_connection_serial())
    }

    pub(crate) fn forward_open_with_serial(&mut self, serial: u16) -> Result<()> {
        let session_handle = match self.state {
            SessionStatus::Registered { session_handle } => session_handle,
            _ => return Err(EipError::NotConnected),
        };

        let proposed_t_to_o = 0x8000_0000 | (u32::from(serial) << 8) | 0x01;
        let request = ForwardOpenRequest::new(proposed_t_to_o, serial, self.originator);

        let data = self
            .send_unconnected(&request.to_bytes()?)?
            .into_data(service::FORWARD_OPEN)?;
        let reply = ForwardOpenReply::from_bytes(&data)?;
        reply.check_matches(&request)?;

        let connection = ConnectionIds {
            o_to_t: reply.o_to_t_connection_id,
            t_to_o: reply.t_to_o_connection_id,
            serial,
        };
        info!(
            o_to_t = %format!("0x{:08X}", connection.o_to_t),
            t_to_o = %format!("0x{:08X}", connection.t_to_o),
            serial = %format!("0x{:04X}", serial),
            rpi_us = reply.o_to_t_api_us,
            "Forward Open succeeded"
        );
        self.sequence = 0;
        self.state = SessionStatus::Connected {
            session_handle,
            connection,
        };
        Ok(())
    }

    /// Sends an encoded CIP request with Send RR Data and returns the reply,
    /// unwrapping an Unconnected Send reply if there is one.
    ///
    /// The reply status is not checked; use
    /// [`MessageRouterResponse::into_data`].
    ///
    /// # Errors
    ///
    /// Returns `EipError::NotConnected` without sending anything if no
    /// session is registered.
    pub fn send_unconnected(&mut self, cip: &[u8]) -> Result<MessageRouterResponse> {
        let session_handle = self.state.session_handle().ok_or(EipError::NotConnected)?;

        let context = self.next_context();
        let request = EncapsulationPacket::new(
            EncapsulationCommand::SendRRData,
            session_handle,
            context,
            CommonPacket::unconnected(cip).to_bytes(),
        )?;
        let reply = self.exchange(&request, EncapsulationCommand::SendRRData)?;

        let packet = CommonPacket::from_bytes(&reply.data)?;
        parse_routed_response(packet.unconnected_payload()?)
    }

    /// Sends an encoded CIP request over the Forward Open connection with
    /// Send Unit Data and returns the reply.
    ///
    /// # Errors
    ///
    /// Returns `EipError::NotConnected` without sending anything if no
    /// connection is open, and `EipError::MalformedReply` if the reply
    /// carries the wrong connection ID or sequence count.
    pub fn send_connected(&mut self, cip: &[u8]) -> Result<MessageRouterResponse> {
        let (session_handle, connection) = match self.state {
            SessionStatus::Connected {
                session_handle,
                connection,
            } => (session_handle, connection),
            _ => return Err(EipError::NotConnected),
        };

        self.sequence = self.sequence.wrapping_add(1);
        let sequence = self.sequence;
        let context = self.next_context();
        let request = EncapsulationPacket::new(
            EncapsulationCommand::SendUnitData,
            session_handle,
            context,
            CommonPacket::connected(connection.o_to_t, sequence, cip).to_bytes(),
        )?;
        let reply = self.exchange(&request, EncapsulationCommand::SendUnitData)?;

        let packet = CommonPacket::from_bytes(&reply.data)?;
        let (connection_id, reply_sequence, payload) = packet.connected_payload()?;
        if connection_id != connection.t_to_o {
            return Err(EipError::malformed(format!(
                "connected reply on connection 0x{:08X}, expected 0x{:08X}",
                connection_id, connection.t_to_o
            )));
        }
        if reply_sequence != sequence {
            return Err(EipError::malformed(format!(
                "connected reply sequence {} does not match request {}",
                reply_sequence, sequence
            )));
        }
        MessageRouterResponse::from_bytes(payload)
    }

    /// Releases the connection and the session, then closes the transport.
    ///
    /// Forward Close and Unregister Session are best-effort: failures are
    /// logged and the transport is closed regardless.
    pub fn close(&mut self) {
        if let Some(connection) = self.state.connection() {
            let request = ForwardCloseRequest::new(connection.serial, self.originator);
            match request
                .to_bytes()
                .and_then(|bytes| self.send_unconnected(&bytes))
                .and_then(|reply| reply.into_data(service::FORWARD_CLOSE))
            {
                Ok(_) => debug!(serial = connection.serial, "Forward Close succeeded"),
                Err(e) => warn!(error = %e, "Forward Close failed"),
            }
        }

        if let Some(session_handle) = self.state.session_handle() {
            let context = self.next_context();
            let request = EncapsulationPacket::unregister_session(session_handle, context);
            match self.transport.send(&request.to_bytes()) {
                Ok(()) => debug!(
                    session_handle = %format!("0x{:08X}", session_handle),
                    "session unregistered"
                ),
                Err(e) => warn!(error = %e, "Unregister Session failed"),
            }
        }

        self.transport.close();
        self.state = SessionStatus::Disconnected;
    }

    /// Sends one request frame and waits for the reply with the same sender
    /// context.
    fn exchange(
        &mut self,
        request: &EncapsulationPacket,
        command: EncapsulationCommand,
    ) -> Result<EncapsulationPacket> {
        let bytes = request.to_bytes();
        trace!(frame = %hex::encode_upper(&bytes), "sending");
        self.transport.send(&bytes)?;

        for _ in 0..=MAX_STALE_REPLIES {
            let frame = self.receive_frame()?;
            trace!(frame = %hex::encode_upper(&frame), "received");

            let header = EncapsulationHeader::from_bytes(&frame)?;
            if header.sender_context != request.header.sender_context {
                debug!(
                    command = %format!("0x{:04X}", header.command),
                    "discarding stale reply"
                );
                continue;
            }

            let reply = EncapsulationPacket::from_bytes(&frame)?;
            if reply.header.command != command.code() {
                return Err(EipError::malformed(format!(
                    "reply command 0x{:04X} does not match request 0x{:04X}",
                    reply.header.command,
                    command.code()
                )));
            }
            return Ok(reply);
        }

        Err(EipError::malformed(format!(
            "no reply with the request's sender context after {} stale frames",
            MAX_STALE_REPLIES
        )))
    }

    /// Reads one encapsulation frame: the fixed header, then the declared
    /// number of data bytes.
    ///
    /// A failure after the header leaves the stream mid-frame, so the
    /// transport is closed and the session drops to `Disconnected`.
    fn receive_frame(&mut self) -> Result<Vec<u8>> {
        let mut frame = self.transport.receive(ENCAPSULATION_HEADER_SIZE)?;
        if frame.len() != ENCAPSULATION_HEADER_SIZE {
            return Err(EipError::malformed(format!(
                "transport returned {} header bytes, expected {}",
                frame.len(),
                ENCAPSULATION_HEADER_SIZE
            )));
        }
        let length = usize::from(u16::from_le_bytes([frame[2], frame[3]]));
        if length > 0 {
            match self.transport.receive(length) {
                Ok(data) if data.len() == length => frame.extend(data),
                Ok(data) => {
                    self.abandon();
                    return Err(EipError::malformed(format!(
                        "transport returned {} data bytes, expected {}",
                        data.len(),
                        length
                    )));
                }
                Err(e) => {
                    warn!(error = %e, length, "frame body incomplete, closing transport");
                    self.abandon();
                    return Err(e);
                }
            }
        }
        Ok(frame)
    }

    fn abandon(&mut self) {
        self.transport.close();
        self.state = SessionStatus::Disconnected;
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("state", &self.state)
            .field("originator", &self.originator)
            .finish()
    }
}
