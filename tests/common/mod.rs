//! In-memory PLC used by the integration tests.
//!
//! `SimPlc` implements [`Transport`] and answers the requests an SLC or Logix
//! client sends: Register/Unregister Session, Forward Open/Close, Execute
//! PCCC typed reads and writes against N7/B3 tables, and Read/Write Tag
//! against a typed tag table. Every request is recorded for inspection.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use ab_eip::{
    CipType, CipValue, CommonPacket, EipError, EncapsulationHeader, EncapsulationPacket, Result,
    Transport,
};

pub const SESSION_HANDLE: u32 = 0x0200_0017;
pub const O_TO_T_CONNECTION_ID: u32 = 0x1111_2222;

/// One decoded request, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Register,
    Unregister,
    ForwardOpen,
    ForwardClose,
    PcccRead { file_type: u8, element: u16, size: u8 },
    PcccWrite { file_type: u8, element: u16, word: u16 },
    ReadTag { tag: String, count: u16, slot: Option<u8> },
    WriteTag { tag: String, data_type: u16, slot: Option<u8> },
}

#[derive(Debug, Default)]
pub struct SimPlc {
    open: bool,
    outbox: VecDeque<u8>,
    pub fail_open: bool,
    pub reject_forward_open: bool,
    /// Status (general, extended words) returned for every tag service.
    pub tag_status: Option<(u8, Vec<u16>)>,
    pub integers: HashMap<u16, i16>,
    pub binary: HashMap<u16, u16>,
    pub tags: HashMap<String, CipValue>,
    pub requests: Vec<Request>,
    t_to_o_connection_id: u32,
}

impl SimPlc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, name: &str, value: CipValue) -> Self {
        self.tags.insert(name.to_string(), value);
        self
    }

    pub fn is_transport_open(&self) -> bool {
        self.open
    }

    pub fn count(&self, matches: impl Fn(&Request) -> bool) -> usize {
        self.requests.iter().filter(|r| matches(r)).count()
    }

    fn reply(&mut self, request: &EncapsulationHeader, data: Vec<u8>) {
        let header = EncapsulationHeader {
            command: request.command,
            length: data.len() as u16,
            session_handle: SESSION_HANDLE,
            status: 0,
            sender_context: request.sender_context,
            options: 0,
        };
        self.outbox.extend(header.to_bytes());
        self.outbox.extend(data);
    }

    fn handle_unconnected(&mut self, cip: &[u8]) -> Vec<u8> {
        if cip[0] == 0x52 {
            let (message, slot) = unwrap_unconnected_send(cip);
            return self.handle_message(&message, Some(slot));
        }
        self.handle_message(cip, None)
    }

    fn handle_message(&mut self, cip: &[u8], slot: Option<u8>) -> Vec<u8> {
        let service = cip[0];
        let path_len = usize::from(cip[1]) * 2;
        let path = &cip[2..2 + path_len];
        let data = &cip[2 + path_len..];

        match service {
            0x54 => self.forward_open(data),
            0x4E => {
                self.requests.push(Request::ForwardClose);
                let mut reply = vec![0xCE, 0, 0, 0];
                reply.extend_from_slice(&data[2..10]);
                reply.extend_from_slice(&[0, 0]);
                reply
            }
            0x4C => {
                let tag = symbol(path);
                let count = u16::from_le_bytes([data[0], data[1]]);
                self.requests.push(Request::ReadTag {
                    tag: tag.clone(),
                    count,
                    slot,
                });
                if let Some(status) = self.rejection(0xCC) {
                    return status;
                }
                match self.tags.get(&tag) {
                    Some(value) => {
                        let mut reply = vec![0xCC, 0, 0, 0];
                        reply.extend_from_slice(&value.data_type().code().to_le_bytes());
                        for _ in 0..count {
                            value.encode(&mut reply);
                        }
                        reply
                    }
                    None => vec![0xCC, 0, 0x04, 0x00],
                }
            }
            0x4D => {
                let tag = symbol(path);
                let data_type = u16::from_le_bytes([data[0], data[1]]);
                self.requests.push(Request::WriteTag {
                    tag: tag.clone(),
                    data_type,
                    slot,
                });
                if let Some(status) = self.rejection(0xCD) {
                    return status;
                }
                let existing = self.tags.get(&tag).map(CipValue::data_type);
                let Ok(ty) = CipType::try_from(data_type) else {
                    return vec![0xCD, 0, 0xFF, 0x01, 0x07, 0x21];
                };
                if existing.is_some_and(|e| e != ty) {
                    return vec![0xCD, 0, 0xFF, 0x01, 0x07, 0x21];
                }
                match CipValue::decode(ty, &data[4..4 + ty.size()]) {
                    Ok(value) => {
                        self.tags.insert(tag, value);
                        vec![0xCD, 0, 0, 0]
                    }
                    Err(_) => vec![0xCD, 0, 0x13, 0x00],
                }
            }
            other => vec![other | 0x80, 0, 0x08, 0x00],
        }
    }

    fn rejection(&self, reply_service: u8) -> Option<Vec<u8>> {
        let (general, extended) = self.tag_status.as_ref()?;
        let mut reply = vec![reply_service, 0, *general, extended.len() as u8];
        for word in extended {
            reply.extend_from_slice(&word.to_le_bytes());
        }
        Some(reply)
    }

    fn forward_open(&mut self, data: &[u8]) -> Vec<u8> {
        self.requests.push(Request::ForwardOpen);
        if self.reject_forward_open {
            return vec![0xD4, 0, 0x01, 0x01, 0x00, 0x01];
        }
        self.t_to_o_connection_id = u32::from_le_bytes([data[6], data[7], data[8], data[9]]);

        let mut reply = vec![0xD4, 0, 0, 0];
        reply.extend_from_slice(&O_TO_T_CONNECTION_ID.to_le_bytes());
        reply.extend_from_slice(&data[6..10]);
        // serial, vendor, originator serial echoed
        reply.extend_from_slice(&data[10..18]);
        reply.extend_from_slice(&500_000u32.to_le_bytes());
        reply.extend_from_slice(&500_000u32.to_le_bytes());
        reply.extend_from_slice(&[0, 0]);
        reply
    }

    fn handle_pccc(&mut self, cip: &[u8]) -> Vec<u8> {
        assert_eq!(cip[0], 0x4B, "connected request must be Execute PCCC");
        let path_len = usize::from(cip[1]) * 2;
        let data = &cip[2 + path_len..];
        let id_len = usize::from(data[0]);
        let requestor_id = &data[..id_len];
        let pccc = &data[id_len..];

        let tns = [pccc[2], pccc[3]];
        let function = pccc[4];
        let size = pccc[5];
        let file_type = pccc[7];
        let element = u16::from(pccc[8]);

        let mut reply = vec![0xCB, 0, 0, 0];
        reply.extend_from_slice(requestor_id);
        reply.extend_from_slice(&[pccc[0] | 0x40, 0x00]);
        reply.extend_from_slice(&tns);

        match function {
            0xA2 => {
                self.requests.push(Request::PcccRead {
                    file_type,
                    element,
                    size,
                });
                for i in 0..u16::from(size) / 2 {
                    let word = self.word(file_type, element + i);
                    reply.extend_from_slice(&word.to_le_bytes());
                }
            }
            0xAB => {
                let mask = u16::from_le_bytes([pccc[10], pccc[11]]);
                let word = u16::from_le_bytes([pccc[12], pccc[13]]);
                assert_eq!(mask, 0xFFFF);
                self.requests.push(Request::PcccWrite {
                    file_type,
                    element,
                    word,
                });
                match file_type {
                    0x89 => {
                        self.integers.insert(element, word as i16);
                    }
                    0x85 => {
                        self.binary.insert(element, word);
                    }
                    _ => reply[5 + id_len] = 0x10,
                }
            }
            _ => reply[5 + id_len] = 0x10,
        }
        reply
    }

    fn word(&self, file_type: u8, element: u16) -> u16 {
        match file_type {
            0x89 => self.integers.get(&element).copied().unwrap_or(0) as u16,
            0x85 => self.binary.get(&element).copied().unwrap_or(0),
            _ => 0,
        }
    }
}

impl Transport for SimPlc {
    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(EipError::Timeout);
        }
        self.open = true;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(EipError::NotConnected);
        }
        let packet = EncapsulationPacket::from_bytes(data)?;
        let header = packet.header;
        match header.command {
            0x65 => {
                self.requests.push(Request::Register);
                self.reply(&header, vec![0x01, 0x00, 0x00, 0x00]);
            }
            0x66 => self.requests.push(Request::Unregister),
            0x6F => {
                let cpf = CommonPacket::from_bytes(&packet.data)?;
                let reply = self.handle_unconnected(cpf.unconnected_payload()?);
                self.reply(&header, CommonPacket::unconnected(&reply).to_bytes());
            }
            0x70 => {
                let cpf = CommonPacket::from_bytes(&packet.data)?;
                let (connection_id, sequence, cip) = cpf.connected_payload()?;
                assert_eq!(connection_id, O_TO_T_CONNECTION_ID);
                let reply = self.handle_pccc(cip);
                let packet = CommonPacket::connected(self.t_to_o_connection_id, sequence, &reply);
                self.reply(&header, packet.to_bytes());
            }
            other => panic!("unexpected encapsulation command 0x{:04X}", other),
        }
        Ok(())
    }

    fn receive(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.outbox.len() < len {
            return Err(EipError::Timeout);
        }
        Ok(self.outbox.drain(..len).collect())
    }

    fn close(&mut self) {
        self.open = false;
        self.outbox.clear();
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Returns the embedded message and the backplane slot of an Unconnected
/// Send request.
fn unwrap_unconnected_send(cip: &[u8]) -> (Vec<u8>, u8) {
    let path_len = usize::from(cip[1]) * 2;
    let data = &cip[2 + path_len..];
    let size = usize::from(u16::from_le_bytes([data[2], data[3]]));
    let message = data[4..4 + size].to_vec();
    let mut pos = 4 + size + size % 2;
    let route_words = usize::from(data[pos]);
    pos += 2;
    let route = &data[pos..pos + route_words * 2];
    assert_eq!(route[0], 0x01, "route must leave through the backplane port");
    (message, route[1])
}

/// Decodes a request path made of one ANSI extended symbolic segment.
fn symbol(path: &[u8]) -> String {
    assert_eq!(path[0], 0x91, "tag path must start with a symbolic segment");
    let len = usize::from(path[1]);
    String::from_utf8_lossy(&path[2..2 + len]).into_owned()
}
