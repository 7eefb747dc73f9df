//! Client for SLC 500 and MicroLogix controllers (PCCC over CIP).
//!
//! # Overview
//!
//! `connect` registers a session and opens a Forward Open connection; every
//! read and write is then an Execute PCCC request sent with Send Unit Data.
//! Each operation issues one request, except bit writes, which read the
//! word, change the bit and write the word back.
//!
//! # Example
//!
//! ```no_run
//! use ab_eip::{ClientConfig, PcccAddress, SlcClient};
//! use std::net::Ipv4Addr;
//!
//! let mut plc = SlcClient::new(ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20)));
//! plc.connect()?;
//!
//! let n7_0: PcccAddress = "N7:0".parse()?;
//! plc.write(&n7_0, -50)?;
//! assert_eq!(plc.read(&n7_0)?.as_i32(), Some(-50));
//!
//! let b3_0_5: PcccAddress = "B3:0/5".parse()?;
//! plc.write(&b3_0_5, 1)?;
//!
//! plc.disconnect();
//! # Ok::<(), ab_eip::EipError>(())
//! ```
//!
//! # Bit writes
//!
//! The read-modify-write is not atomic: a PLC program or another client
//! writing the same word between the two requests can lose its change.

use tracing::debug;

use crate::cip::service;
use crate::config::ClientConfig;
use crate::error::{EipError, Result};
use crate::pccc::{
    encode_word, execute_pccc, PcccAddress, PcccReply, PcccValue, TypedReadCommand,
    TypedWriteCommand,
};
use crate::session::{Session, SessionStatus};
use crate::transport::{TcpTransport, Transport};
use crate::utils::{format_binary, set_bit};

/// PCCC client for SLC 500 / MicroLogix controllers.
pub struct SlcClient<T: Transport = TcpTransport> {
    session: Session<T>,
    tns: u16,
}

impl SlcClient<TcpTransport> {
    /// Creates a client that connects over TCP. Nothing is sent until
    /// [`connect`](SlcClient::connect).
    pub fn new(config: ClientConfig) -> Self {
        let transport = TcpTransport::new(config.plc_addr, config.timeout);
        Self::with_transport(transport, &config)
    }
}

impl<T: Transport> SlcClient<T> {
    /// Creates a client over a custom transport. Only the originator identity
    /// of `config` is used.
    pub fn with_transport(transport: T, config: &ClientConfig) -> Self {
        Self {
            session: Session::new(transport, config.originator),
            tns: 0,
        }
    }

    /// Registers a session and opens the PCCC connection.
    ///
    /// # Errors
    ///
    /// Returns the first handshake failure. The transport is closed and the
    /// client stays disconnected.
    pub fn connect(&mut self) -> Result<()> {
        self.session.register()?;
        if let Err(e) = self.session.forward_open() {
            self.session.close();
            return Err(e);
        }
        Ok(())
    }

    /// Returns the session state.
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Returns whether reads and writes can be issued.
    pub fn is_connected(&self) -> bool {
        self.session.status().connection().is_some()
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        self.session.transport()
    }

    /// Releases the connection and session and closes the transport. Never
    /// fails; safe to call in any state.
    pub fn disconnect(&mut self) {
        self.session.close();
    }

    /// Reads one element, or one bit if the address has a bit index.
    ///
    /// Integer elements decode as signed, Binary elements as unsigned, and a
    /// bit read yields [`PcccValue::Bit`].
    ///
    /// # Errors
    ///
    /// Returns `EipError::NotConnected` before `connect`, or any protocol
    /// error from the request.
    pub fn read(&mut self, address: &PcccAddress) -> Result<PcccValue> {
        let single = PcccAddress { count: 1, ..*address };
        self.read_elements(&single)?
            .into_iter()
            .next()
            .ok_or_else(|| EipError::malformed("read returned no elements"))
    }

    /// Reads `address.count` consecutive elements.
    ///
    /// # Errors
    ///
    /// Returns `EipError::NotConnected` before `connect`, or any protocol
    /// error from the request.
    pub fn read_elements(&mut self, address: &PcccAddress) -> Result<Vec<PcccValue>> {
        let data = self.read_raw(address)?;
        match address.bit {
            Some(bit) => Ok(vec![PcccValue::decode_bit(&data, bit)?]),
            None => PcccValue::decode(address.file_type, &data, address.count),
        }
    }

    /// Writes an Integer or Binary element, or a single bit.
    ///
    /// Integer elements accept -32768..=32767, Binary elements 0..=65535 and
    /// bits 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns `EipError::UnsupportedAddress` for Float, Timer and Counter
    /// files, `EipError::ValueOutOfRange` for values outside the element's
    /// range, and `EipError::NotConnected` before `connect`.
    pub fn write(&mut self, address: &PcccAddress, value: i32) -> Result<()> {
        if !address.file_type.supports_write() {
            return Err(EipError::unsupported(format!(
                "writing {} files is not supported",
                address.file_type
            )));
        }

        let word = match address.bit {
            None => encode_word(address.file_type, value)?,
            Some(bit) => {
                let state = match value {
                    0 => false,
                    1 => true,
                    _ => return Err(EipError::out_of_range(value, "BOOL (bit)")),
                };
                let word_address = address.word_address();
                let current = self.read_word(&word_address)?;
                let updated = set_bit(current, bit, state);
                debug!(
                    address = %address,
                    before = %format_binary(current),
                    after = %format_binary(updated),
                    "bit read-modify-write"
                );
                updated
            }
        };

        let tns = self.next_tns();
        let command = TypedWriteCommand::new(tns, &address.word_address(), word)?;
        self.execute(&command.to_bytes(), tns).map(|_| ())
    }

    fn read_word(&mut self, address: &PcccAddress) -> Result<u16> {
        let data = self.read_raw(address)?;
        match data.as_slice() {
            [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
            _ => Err(EipError::malformed(format!(
                "word read of {} returned {} bytes",
                address,
                data.len()
            ))),
        }
    }

    fn read_raw(&mut self, address: &PcccAddress) -> Result<Vec<u8>> {
        let target = match address.bit {
            Some(_) => address.word_address(),
            None => *address,
        };
        let tns = self.next_tns();
        let command = TypedReadCommand::new(tns, &target)?;
        self.execute(&command.to_bytes(), tns)
    }

    fn next_tns(&mut self) -> u16 {
        self.tns = match self.tns.wrapping_add(1) {
            0 => 1,
            tns => tns,
        };
        self.tns
    }

    fn execute(&mut self, pccc: &[u8], tns: u16) -> Result<Vec<u8>> {
        let request = execute_pccc(self.session.originator(), pccc).to_bytes()?;
        let data = self
            .session
            .send_connected(&request)?
            .into_data(service::EXECUTE_PCCC)?;
        PcccReply::from_bytes(&data)?.into_data(tns)
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for SlcClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlcClient")
            .field("session", &self.session)
            .field("tns", &self.tns)
            .finish()
    }
}
