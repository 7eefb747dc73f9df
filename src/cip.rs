//! CIP Message Router requests, responses, paths and Unconnected Send.
//!
//! # Request Structure
//!
//! | Component | Size | Description |
//! |-----------|------|-------------|
//! | Service | 1 byte | Service code |
//! | Path size | 1 byte | Request path length in 16-bit words |
//! | Path | var | Logical or symbolic segments, word aligned |
//! | Data | var | Service-specific data |
//!
//! # Response Structure
//!
//! | Component | Size | Description |
//! |-----------|------|-------------|
//! | Service | 1 byte | Request service code with bit 7 set |
//! | Reserved | 1 byte | Always 0x00 |
//! | General status | 1 byte | 0x00 = success |
//! | Extended size | 1 byte | Number of extended status words |
//! | Extended status | var | Extended status words |
//! | Data | var | Reply data (only meaningful on success) |

use crate::error::{EipError, Result};

/// Reply bit set on the service code of every CIP response.
pub const REPLY_FLAG: u8 = 0x80;

/// CIP service codes used by this crate.
pub mod service {
    /// Execute PCCC.
    pub const EXECUTE_PCCC: u8 = 0x4B;
    /// Read Tag.
    pub const READ_TAG: u8 = 0x4C;
    /// Write Tag.
    pub const WRITE_TAG: u8 = 0x4D;
    /// Forward Close.
    pub const FORWARD_CLOSE: u8 = 0x4E;
    /// Unconnected Send.
    pub const UNCONNECTED_SEND: u8 = 0x52;
    /// Forward Open.
    pub const FORWARD_OPEN: u8 = 0x54;
}

/// CIP object classes used by this crate.
pub mod class {
    /// Message Router.
    pub const MESSAGE_ROUTER: u16 = 0x02;
    /// Connection Manager.
    pub const CONNECTION_MANAGER: u16 = 0x06;
    /// PCCC object.
    pub const PCCC: u16 = 0x67;
}

/// Priority/tick time byte used for Unconnected Send (tick = 1024 ms).
pub const UNCONNECTED_SEND_TICK: u8 = 0x0A;
/// Timeout ticks used for Unconnected Send.
pub const UNCONNECTED_SEND_TIMEOUT_TICKS: u8 = 0x05;
/// Longest request path, in words, that the one-byte path size can carry.
pub const MAX_PATH_WORDS: usize = u8::MAX as usize;

/// Builder for a CIP EPATH.
///
/// Segments are appended in order; the path is always kept word aligned.
///
/// # Example
///
/// ```
/// use ab_eip::EPath;
///
/// let path = EPath::new().class(0x06).instance(0x01);
/// assert_eq!(path.as_bytes(), &[0x20, 0x06, 0x24, 0x01]);
/// assert_eq!(path.word_len().unwrap(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EPath {
    bytes: Vec<u8>,
}

impl EPath {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    fn logical(mut self, segment_type: u8, value: u32) -> Self {
        if let Ok(v) = u8::try_from(value) {
            self.bytes.extend_from_slice(&[segment_type, v]);
        } else if let Ok(v) = u16::try_from(value) {
            self.bytes.extend_from_slice(&[segment_type | 0x01, 0x00]);
            self.bytes.extend_from_slice(&v.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&[segment_type | 0x02, 0x00]);
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    /// Appends a logical class segment.
    pub fn class(self, class: u16) -> Self {
        self.logical(0x20, u32::from(class))
    }

    /// Appends a logical instance segment.
    pub fn instance(self, instance: u16) -> Self {
        self.logical(0x24, u32::from(instance))
    }

    /// Appends a logical attribute segment.
    pub fn attribute(self, attribute: u16) -> Self {
        self.logical(0x30, u32::from(attribute))
    }

    /// Appends a logical connection point segment.
    pub fn connection_point(self, point: u16) -> Self {
        self.logical(0x2C, u32::from(point))
    }

    /// Appends a logical member (array element) segment.
    pub fn element(self, index: u32) -> Self {
        self.logical(0x28, index)
    }

    /// Appends an ANSI extended symbolic segment, padded to a word boundary.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if the symbol is empty, not
    /// ASCII, or longer than 255 bytes.
    pub fn symbol(mut self, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(EipError::invalid_parameter(
                "tag",
                "symbol segment must not be empty",
            ));
        }
        if !name.is_ascii() {
            return Err(EipError::invalid_parameter("tag", "symbol must be ASCII"));
        }
        let len = u8::try_from(name.len())
            .map_err(|_| EipError::invalid_parameter("tag", "symbol exceeds 255 bytes"))?;

        self.bytes.push(0x91);
        self.bytes.push(len);
        self.bytes.extend_from_slice(name.as_bytes());
        if name.len() % 2 != 0 {
            self.bytes.push(0x00);
        }
        self.checked()
    }

    fn checked(self) -> Result<Self> {
        self.word_len()?;
        Ok(self)
    }

    /// Builds the path for a Logix tag name.
    ///
    /// Dotted members become successive symbolic segments and bracketed
    /// indices (`Tag[3]`, `Matrix[1,2]`) become element segments.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::EPath;
    ///
    /// let path = EPath::tag("Temperature").unwrap();
    /// assert_eq!(path.as_bytes()[0..2], [0x91, 11]);
    /// assert_eq!(path.word_len().unwrap(), 7);
    /// ```
    pub fn tag(tag_name: &str) -> Result<Self> {
        if tag_name.is_empty() {
            return Err(EipError::invalid_parameter(
                "tag",
                "tag name must not be empty",
            ));
        }

        let mut path = Self::new();
        for member in tag_name.split('.') {
            let (symbol, indices) = match member.find('[') {
                Some(open) => {
                    let close = member.rfind(']').filter(|&close| close == member.len() - 1);
                    let close = close.ok_or_else(|| {
                        EipError::invalid_parameter("tag", format!("unbalanced index in '{}'", member))
                    })?;
                    (&member[..open], Some(&member[open + 1..close]))
                }
                None => (member, None),
            };

            path = path.symbol(symbol)?;
            if let Some(indices) = indices {
                for index in indices.split(',') {
                    let index: u32 = index.trim().parse().map_err(|_| {
                        EipError::invalid_parameter(
                            "tag",
                            format!("invalid array index '{}' in '{}'", index, member),
                        )
                    })?;
                    path = path.element(index).checked()?;
                }
            }
        }
        Ok(path)
    }

    /// Returns the encoded path bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the path length in 16-bit words.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if the path is longer than
    /// [`MAX_PATH_WORDS`].
    pub fn word_len(&self) -> Result<u8> {
        let words = self.bytes.len() / 2;
        u8::try_from(words).map_err(|_| {
            EipError::invalid_parameter(
                "path",
                format!("path of {} words exceeds {} words", words, MAX_PATH_WORDS),
            )
        })
    }
}

/// A CIP Message Router request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRouterRequest {
    /// Service code.
    pub service: u8,
    /// Request path.
    pub path: EPath,
    /// Service-specific data.
    pub data: Vec<u8>,
}

impl MessageRouterRequest {
    /// Creates a new request.
    pub fn new(service: u8, path: EPath, data: Vec<u8>) -> Self {
        Self {
            service,
            path,
            data,
        }
    }

    /// Serializes the request to bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::{EPath, MessageRouterRequest};
    ///
    /// let request = MessageRouterRequest::new(
    ///     0x4B,
    ///     EPath::new().class(0x67).instance(0x01),
    ///     vec![0xAA],
    /// );
    /// assert_eq!(
    ///     request.to_bytes().unwrap(),
    ///     vec![0x4B, 0x02, 0x20, 0x67, 0x24, 0x01, 0xAA]
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if the path does not fit the
    /// one-byte path size.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let path = self.path.as_bytes();
        let mut bytes = Vec::with_capacity(2 + path.len() + self.data.len());
        bytes.push(self.service);
        bytes.push(self.path.word_len()?);
        bytes.extend_from_slice(path);
        bytes.extend_from_slice(&self.data);
        Ok(bytes)
    }
}

/// A parsed CIP Message Router response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRouterResponse {
    /// Reply service code (request service with bit 7 set).
    pub service: u8,
    /// General status (0x00 = success).
    pub general_status: u8,
    /// Extended status words.
    pub extended_status: Vec<u16>,
    /// Reply data.
    pub data: Vec<u8>,
}

impl MessageRouterResponse {
    /// Parses a response from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if the response is shorter than
    /// its fixed header or its declared extended status.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(EipError::malformed(format!(
                "CIP response too short: expected at least 4 bytes, got {}",
                data.len()
            )));
        }

        let service = data[0];
        if service & REPLY_FLAG == 0 {
            return Err(EipError::malformed(format!(
                "CIP service 0x{:02X} is not a reply",
                service
            )));
        }
        let general_status = data[2];
        let extended_words = usize::from(data[3]);
        let data_start = 4 + extended_words * 2;
        if data.len() < data_start {
            return Err(EipError::malformed(format!(
                "CIP response declares {} extended status words, {} bytes available",
                extended_words,
                data.len() - 4
            )));
        }

        let extended_status = data[4..data_start]
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .collect();

        Ok(Self {
            service,
            general_status,
            extended_status,
            data: data[data_start..].to_vec(),
        })
    }

    /// Returns the request service code this response answers.
    pub fn request_service(&self) -> u8 {
        self.service & !REPLY_FLAG
    }

    /// Returns whether the response indicates success.
    pub fn is_success(&self) -> bool {
        self.general_status == 0x00
    }

    /// Validates the response and returns an error if it indicates failure.
    ///
    /// # Errors
    ///
    /// Returns `EipError::CipStatus` carrying both the general and extended
    /// codes verbatim if the general status is non-zero.
    pub fn check_error(&self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(EipError::cip_status(
                self.request_service(),
                self.general_status,
                self.extended_status.clone(),
            ))
        }
    }

    /// Checks the status and the reply service code, then returns the reply
    /// data.
    ///
    /// # Errors
    ///
    /// Returns `EipError::CipStatus` on a failure status, or
    /// `EipError::MalformedReply` if the reply answers a different service.
    pub fn into_data(self, expected_service: u8) -> Result<Vec<u8>> {
        self.check_error()?;
        if self.request_service() != expected_service {
            return Err(EipError::malformed(format!(
                "reply service 0x{:02X} does not answer request 0x{:02X}",
                self.service, expected_service
            )));
        }
        Ok(self.data)
    }
}

/// Routing for requests that must cross a chassis backplane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutePath {
    /// Target is the device that owns the TCP connection.
    #[default]
    Direct,
    /// Route out of a port (backplane = 1) to the module in `slot`.
    Backplane {
        /// Port number on the communication module.
        port: u8,
        /// Slot number of the target module.
        slot: u8,
    },
}

/// Backplane port number on Logix chassis.
pub const BACKPLANE_PORT: u8 = 1;

/// Highest port number a one-byte port segment can carry.
pub const MAX_PORT: u8 = 14;

impl RoutePath {
    /// Creates a backplane route to the module in `slot`.
    pub fn backplane(slot: u8) -> Self {
        RoutePath::Backplane {
            port: BACKPLANE_PORT,
            slot,
        }
    }

    /// Creates a route out of `port` to the module at `slot`.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` unless `port` is 1..=14.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::RoutePath;
    ///
    /// assert_eq!(RoutePath::port(1, 4).unwrap(), RoutePath::backplane(4));
    /// assert!(RoutePath::port(16, 4).is_err());
    /// ```
    pub fn port(port: u8, slot: u8) -> Result<Self> {
        check_port(port)?;
        Ok(RoutePath::Backplane { port, slot })
    }

    /// Returns the backplane route to `slot` when `use_routing` is set, and
    /// [`RoutePath::Direct`] otherwise.
    pub fn for_slot(slot: u8, use_routing: bool) -> Self {
        if use_routing {
            RoutePath::backplane(slot)
        } else {
            RoutePath::Direct
        }
    }

    /// Encodes the route as a padded port segment.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::RoutePath;
    ///
    /// assert_eq!(RoutePath::Direct.encode().unwrap(), Vec::<u8>::new());
    /// assert_eq!(RoutePath::backplane(2).encode().unwrap(), vec![0x01, 0x02]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` for a port outside 1..=14.
    pub fn encode(self) -> Result<Vec<u8>> {
        match self {
            RoutePath::Direct => Ok(Vec::new()),
            RoutePath::Backplane { port, slot } => {
                check_port(port)?;
                Ok(vec![port, slot])
            }
        }
    }
}

fn check_port(port: u8) -> Result<()> {
    if (1..=MAX_PORT).contains(&port) {
        Ok(())
    } else {
        Err(EipError::invalid_parameter(
            "port",
            format!("port {} is outside 1..={}", port, MAX_PORT),
        ))
    }
}

/// Wraps an encoded CIP request in an Unconnected Send to the Connection
/// Manager, followed by the route path.
///
/// # Example
///
/// ```
/// use ab_eip::{unconnected_send, RoutePath};
///
/// let wrapped = unconnected_send(&[0x4C, 0x00, 0x01], RoutePath::backplane(0)).unwrap();
/// assert_eq!(wrapped[0], 0x52);
/// assert_eq!(&wrapped[wrapped.len() - 4..], &[0x01, 0x00, 0x01, 0x00]);
/// ```
///
/// # Errors
///
/// Returns `EipError::InvalidParameter` if the message is longer than
/// 65535 bytes or the route carries an invalid port.
pub fn unconnected_send(message: &[u8], route: RoutePath) -> Result<Vec<u8>> {
    let route_bytes = route.encode()?;
    let message_len = u16::try_from(message.len()).map_err(|_| {
        EipError::invalid_parameter(
            "message",
            format!("{} bytes exceed the Unconnected Send size field", message.len()),
        )
    })?;
    // one port segment at most
    let route_words = (route_bytes.len() / 2) as u8;

    let mut data = Vec::with_capacity(6 + message.len() + 1 + route_bytes.len());
    data.push(UNCONNECTED_SEND_TICK);
    data.push(UNCONNECTED_SEND_TIMEOUT_TICKS);
    data.extend_from_slice(&message_len.to_le_bytes());
    data.extend_from_slice(message);
    if message.len() % 2 != 0 {
        data.push(0x00);
    }
    data.push(route_words);
    data.push(0x00);
    data.extend_from_slice(&route_bytes);

    let path = EPath::new()
        .class(class::CONNECTION_MANAGER)
        .instance(0x01);
    MessageRouterRequest::new(service::UNCONNECTED_SEND, path, data).to_bytes()
}

/// Parses the reply to a request that may have been carried by an
/// Unconnected Send.
///
/// A successful route returns the embedded reply unchanged. A routing
/// failure comes back as an Unconnected Send reply (0xD2) with a non-zero
/// status, which surfaces as `EipError::CipStatus` for service 0x52.
pub fn parse_routed_response(data: &[u8]) -> Result<MessageRouterResponse> {
    let response = MessageRouterResponse::from_bytes(data)?;
    if response.request_service() != service::UNCONNECTED_SEND {
        return Ok(response);
    }

    response.check_error()?;
    MessageRouterResponse::from_bytes(&response.data)
}
