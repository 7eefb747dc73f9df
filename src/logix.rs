//! Client for ControlLogix and CompactLogix controllers (symbolic tags).
//!
//! Requests are sent unconnected with Send RR Data. With routing enabled
//! each request is wrapped in an Unconnected Send to backplane port 1 and the
//! configured slot; otherwise the bare request goes to the Message Router of
//! the device at the socket address.
//!
//! # Example
//!
//! ```no_run
//! use ab_eip::{ClientConfig, CipType, LogixClient, TypeRequest};
//! use std::net::Ipv4Addr;
//!
//! let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30))
//!     .with_slot(2)
//!     .with_routing(true);
//! let mut plc = LogixClient::new(config);
//! plc.connect()?;
//!
//! // Type taken from the controller's reply to a one-element read
//! plc.write("Setpoint", 72.5)?;
//! println!("Setpoint = {}", plc.read("Setpoint")?);
//!
//! // No read when the type is known
//! plc.write_as("Counts[3]", 12, TypeRequest::Explicit(CipType::Dint))?;
//!
//! plc.disconnect();
//! # Ok::<(), ab_eip::EipError>(())
//! ```

use tracing::debug;

use crate::cip::{service, unconnected_send, MessageRouterRequest, RoutePath};
use crate::config::ClientConfig;
use crate::error::{EipError, Result};
use crate::session::{Session, SessionStatus};
use crate::tag::{
    CipType, CipValue, NativeValue, ReadTagCommand, TagReadReply, TypeRequest, WriteTagCommand,
};
use crate::transport::{TcpTransport, Transport};

/// Symbolic tag client for Logix controllers.
pub struct LogixClient<T: Transport = TcpTransport> {
    session: Session<T>,
    route: RoutePath,
}

impl LogixClient<TcpTransport> {
    /// Creates a client that connects over TCP. Nothing is sent until
    /// [`connect`](LogixClient::connect).
    pub fn new(config: ClientConfig) -> Self {
        let transport = TcpTransport::new(config.plc_addr, config.timeout);
        Self::with_transport(transport, &config)
    }
}

impl<T: Transport> LogixClient<T> {
    /// Creates a client over a custom transport, taking the slot, routing
    /// flag and originator identity from `config`.
    pub fn with_transport(transport: T, config: &ClientConfig) -> Self {
        Self {
            session: Session::new(transport, config.originator),
            route: config.route(),
        }
    }

    /// Registers a session with the configured slot and routing flag.
    ///
    /// # Errors
    ///
    /// Returns the registration failure; the client stays disconnected.
    pub fn connect(&mut self) -> Result<()> {
        self.session.register()
    }

    /// Replaces the slot and routing flag, then registers a session.
    ///
    /// # Errors
    ///
    /// Returns the registration failure; the client stays disconnected.
    pub fn connect_to_slot(&mut self, slot: u8, use_routing: bool) -> Result<()> {
        self.route = RoutePath::for_slot(slot, use_routing);
        self.connect()
    }

    /// Returns the session state.
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Returns whether a session is registered.
    pub fn is_connected(&self) -> bool {
        self.session.status().session_handle().is_some()
    }

    /// Returns the route applied to each request.
    pub fn route(&self) -> RoutePath {
        self.route
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        self.session.transport()
    }

    /// Unregisters the session and closes the transport. Never fails; safe
    /// to call in any state.
    pub fn disconnect(&mut self) {
        self.session.close();
    }

    /// Reads one element of an atomic tag.
    ///
    /// # Errors
    ///
    /// Returns `EipError::NotConnected` before `connect`,
    /// `EipError::CipStatus` if the controller rejects the request, and
    /// `EipError::UnsupportedAddress` for structure tags.
    pub fn read(&mut self, tag_name: &str) -> Result<CipValue> {
        self.read_elements(tag_name, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| EipError::malformed("Read Tag reply holds no elements"))
    }

    /// Reads `count` consecutive elements starting at `tag_name`.
    ///
    /// # Errors
    ///
    /// As [`read`](LogixClient::read), plus `EipError::InvalidParameter` for
    /// a zero count.
    pub fn read_elements(&mut self, tag_name: &str, count: u16) -> Result<Vec<CipValue>> {
        Ok(self.read_reply(tag_name, count)?.values)
    }

    /// Returns the type the controller reports for `tag_name`.
    ///
    /// # Errors
    ///
    /// As [`read`](LogixClient::read).
    pub fn read_type(&mut self, tag_name: &str) -> Result<CipType> {
        Ok(self.read_reply(tag_name, 1)?.data_type)
    }

    /// Writes one element, detecting the tag's type with a one-element read.
    ///
    /// # Errors
    ///
    /// As [`write_as`](LogixClient::write_as).
    pub fn write(&mut self, tag_name: &str, value: impl Into<NativeValue>) -> Result<()> {
        self.write_as(tag_name, value, TypeRequest::AutoDetect)
    }

    /// Writes one element with the type chosen by `type_request`.
    ///
    /// # Errors
    ///
    /// Returns `EipError::ValueOutOfRange` if the value does not fit the
    /// chosen type; nothing is written in that case. A failed type-detection
    /// read is returned as is.
    pub fn write_as(
        &mut self,
        tag_name: &str,
        value: impl Into<NativeValue>,
        type_request: TypeRequest,
    ) -> Result<()> {
        let value = value.into();
        let data_type = match type_request {
            TypeRequest::Explicit(data_type) => data_type,
            TypeRequest::DefaultForKind => value.default_type(),
            TypeRequest::AutoDetect => {
                let detected = self.read_type(tag_name)?;
                debug!(tag = tag_name, data_type = %detected, "detected tag type");
                detected
            }
        };
        let value = CipValue::from_native(value, data_type)?;
        self.write_elements(tag_name, &[value])
    }

    /// Writes consecutive elements of one type starting at `tag_name`.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if `values` is empty or mixes
    /// types, and `EipError::CipStatus` if the controller rejects the write.
    pub fn write_elements(&mut self, tag_name: &str, values: &[CipValue]) -> Result<()> {
        let command = WriteTagCommand::new(tag_name, values.to_vec())?;
        self.send(command.to_request(), service::WRITE_TAG)
            .map(|_| ())
    }

    fn read_reply(&mut self, tag_name: &str, count: u16) -> Result<TagReadReply> {
        let command = ReadTagCommand::new(tag_name, count)?;
        let data = self.send(command.to_request(), service::READ_TAG)?;
        TagReadReply::from_bytes(&data, command.count())
    }

    fn send(&mut self, request: MessageRouterRequest, service: u8) -> Result<Vec<u8>> {
        let request = request.to_bytes()?;
        let message = match self.route {
            RoutePath::Direct => request,
            route => unconnected_send(&request, route)?,
        };
        self.session.send_unconnected(&message)?.into_data(service)
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for LogixClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogixClient")
            .field("session", &self.session)
            .field("route", &self.route)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OriginatorIdentity;
    use crate::cpf::CommonPacket;
    use crate::encapsulation::EncapsulationHeader;
    use crate::transport::mock::MockTransport;
    use std::net::Ipv4Addr;

    fn config(routing: bool) -> ClientConfig {
        ClientConfig::new(Ipv4Addr::LOCALHOST)
            .with_slot(3)
            .with_routing(routing)
            .with_originator(OriginatorIdentity::new(0x1009, 0x1234_5678))
    }

    fn frame(command: u16, context: u64, data: &[u8]) -> Vec<u8> {
        let header = EncapsulationHeader {
            command,
            length: data.len() as u16,
            session_handle: 0x42,
            status: 0,
            sender_context: context.to_le_bytes(),
            options: 0,
        };
        let mut frame = header.to_bytes().to_vec();
        frame.extend_from_slice(data);
        frame
    }

    fn rr_reply(context: u64, cip: &[u8]) -> Vec<u8> {
        frame(0x6F, context, &CommonPacket::unconnected(cip).to_bytes())
    }

    /// Registered client whose transport will answer with `replies`, the
    /// first one carrying context 2.
    fn connected_client(routing: bool, replies: &[&[u8]]) -> LogixClient<MockTransport> {
        let mut transport = MockTransport::new();
        transport.push_reply(frame(0x65, 1, &[1, 0, 0, 0]));
        for (context, cip) in (2..).zip(replies) {
            transport.push_reply(rr_reply(context, cip));
        }
        let mut client = LogixClient::with_transport(transport, &config(routing));
        client.connect().unwrap();
        client
    }

    fn cip_of(request: &[u8]) -> &[u8] {
        &request[40..]
    }

    #[test]
    fn test_read_before_connect_sends_nothing() {
        let mut client = LogixClient::with_transport(MockTransport::new(), &config(false));
        assert!(matches!(client.read("Speed"), Err(EipError::NotConnected)));
        assert!(matches!(client.write("Speed", 3), Err(EipError::NotConnected)));
        assert!(client.transport().sent.is_empty());
    }

    #[test]
    fn test_direct_read_is_not_wrapped() {
        let mut client = connected_client(false, &[&[0xCC, 0, 0, 0, 0xC4, 0x00, 0x2A, 0, 0, 0]]);

        assert_eq!(client.read("Speed").unwrap(), CipValue::Dint(42));
        let request = &client.transport().sent[1];
        assert_eq!(
            cip_of(request),
            &[0x4C, 0x04, 0x91, 0x05, b'S', b'p', b'e', b'e', b'd', 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_routed_write_uses_unconnected_send() {
        let mut client = connected_client(true, &[&[0xCD, 0, 0, 0]]);
        assert_eq!(client.route(), RoutePath::backplane(3));

        client
            .write_as("Count", 7, TypeRequest::Explicit(CipType::Int))
            .unwrap();
        let cip = cip_of(&client.transport().sent[1]);
        assert_eq!(&cip[..6], &[0x52, 0x02, 0x20, 0x06, 0x24, 0x01]);
        assert_eq!(&cip[cip.len() - 2..], &[0x01, 0x03]);
    }

    #[test]
    fn test_write_out_of_range_sends_nothing() {
        let mut client = connected_client(false, &[]);
        let err = client
            .write_as("Small", 300, TypeRequest::Explicit(CipType::Sint))
            .unwrap_err();
        assert!(matches!(err, EipError::ValueOutOfRange { .. }));
        assert_eq!(client.transport().sent.len(), 1);
    }

    #[test]
    fn test_default_for_kind_write() {
        let mut client = connected_client(false, &[&[0xCD, 0, 0, 0]]);

        client
            .write_as("Ratio", 0.25, TypeRequest::DefaultForKind)
            .unwrap();
        let cip = cip_of(&client.transport().sent[1]);
        assert_eq!(
            &cip[cip.len() - 8..],
            &[0xCA, 0x00, 0x01, 0x00, 0x00, 0x00, 0x80, 0x3E]
        );
    }

    #[test]
    fn test_auto_detect_read_failure_is_returned() {
        let mut client = connected_client(false, &[&[0xCC, 0, 0x04, 0x01, 0x00, 0x00]]);

        let err = client.write("Missing", 1).unwrap_err();
        assert!(matches!(
            err,
            EipError::CipStatus { service: 0x4C, general: 0x04, .. }
        ));
        assert_eq!(client.transport().sent.len(), 2);
    }

    #[test]
    fn test_connect_to_slot_replaces_route() {
        let mut transport = MockTransport::new();
        transport.push_reply(frame(0x65, 1, &[1, 0, 0, 0]));
        transport.push_reply(rr_reply(2, &[0xCD, 0, 0, 0]));
        let mut client = LogixClient::with_transport(transport, &config(false));
        assert_eq!(client.route(), RoutePath::Direct);

        client.connect_to_slot(5, true).unwrap();
        assert_eq!(client.route(), RoutePath::backplane(5));

        client
            .write_as("Count", 1, TypeRequest::Explicit(CipType::Int))
            .unwrap();
        let cip = cip_of(&client.transport().sent[1]);
        assert_eq!(cip[0], 0x52);
        assert_eq!(&cip[cip.len() - 2..], &[0x01, 0x05]);
    }

    #[test]
    fn test_overlong_tag_sends_nothing() {
        let mut client = connected_client(false, &[]);
        let member = "M".repeat(250);
        let tag = [member.as_str(); 3].join(".");

        assert!(matches!(
            client.read(&tag),
            Err(EipError::InvalidParameter { .. })
        ));
        assert_eq!(client.transport().sent.len(), 1);
    }
}
