mod common;

use std::net::Ipv4Addr;

use ab_eip::{
    ClientConfig, EipError, FileType, OriginatorIdentity, PcccAddress, PcccValue, SessionStatus,
    SlcClient,
};
use common::{Request, SimPlc};

fn config() -> ClientConfig {
    ClientConfig::new(Ipv4Addr::LOCALHOST)
        .with_originator(OriginatorIdentity::new(0x1009, 0x0BAD_CAFE))
}

fn connected(plc: SimPlc) -> SlcClient<SimPlc> {
    let mut client = SlcClient::with_transport(plc, &config());
    client.connect().unwrap();
    client
}

fn address(text: &str) -> PcccAddress {
    text.parse().unwrap()
}

#[test]
fn test_connect_registers_then_opens_connection() {
    let client = connected(SimPlc::new());

    assert!(client.is_connected());
    assert!(matches!(client.status(), SessionStatus::Connected { .. }));
    assert_eq!(
        client.transport().requests,
        vec![Request::Register, Request::ForwardOpen]
    );
}

#[test]
fn test_integer_round_trip() {
    let mut client = connected(SimPlc::new());
    let n7_0 = address("N7:0");

    client.write(&n7_0, -50).unwrap();
    assert_eq!(client.read(&n7_0).unwrap(), PcccValue::Integer(-50));

    for value in [i16::MIN, -1, 0, 1, i16::MAX] {
        let n7_9 = address("N7:9");
        client.write(&n7_9, i32::from(value)).unwrap();
        assert_eq!(client.read(&n7_9).unwrap().as_i32(), Some(i32::from(value)));
    }
}

#[test]
fn test_bit_write_preserves_other_bits() {
    let mut plc = SimPlc::new();
    plc.binary.insert(0, 0b1000_0000_0000_0001);
    let mut client = connected(plc);

    client.write(&address("B3:0/5"), 1).unwrap();

    assert_eq!(client.read(&address("B3:0/5")).unwrap(), PcccValue::Bit(true));
    assert_eq!(
        client.read(&address("B3:0")).unwrap(),
        PcccValue::Binary(0b1000_0000_0010_0001)
    );

    client.write(&address("B3:0/15"), 0).unwrap();
    assert_eq!(
        client.read(&address("B3:0")).unwrap(),
        PcccValue::Binary(0b0000_0000_0010_0001)
    );
}

#[test]
fn test_bit_write_is_read_then_write() {
    let mut client = connected(SimPlc::new());
    client.write(&address("N7:4/3"), 1).unwrap();

    let requests = &client.transport().requests[2..];
    assert_eq!(
        requests,
        &[
            Request::PcccRead {
                file_type: 0x89,
                element: 4,
                size: 2
            },
            Request::PcccWrite {
                file_type: 0x89,
                element: 4,
                word: 0x0008
            },
        ]
    );
}

#[test]
fn test_bit_read_yields_bit_not_word() {
    let mut plc = SimPlc::new();
    plc.binary.insert(2, 0xFFFF);
    let mut client = connected(plc);

    assert_eq!(client.read(&address("B3:2/7")).unwrap(), PcccValue::Bit(true));
    assert_eq!(client.read(&address("B3:5/7")).unwrap(), PcccValue::Bit(false));
}

#[test]
fn test_read_multiple_elements() {
    let mut plc = SimPlc::new();
    plc.integers.extend([(10, 1), (11, -2), (12, 3)]);
    let mut client = connected(plc);

    let values = client
        .read_elements(&address("N7:10").with_count(3).unwrap())
        .unwrap();
    assert_eq!(
        values,
        vec![
            PcccValue::Integer(1),
            PcccValue::Integer(-2),
            PcccValue::Integer(3)
        ]
    );
}

#[test]
fn test_write_range_and_file_checks_send_nothing() {
    let mut client = connected(SimPlc::new());

    let err = client.write(&address("N7:0"), 40_000).unwrap_err();
    assert!(matches!(err, EipError::ValueOutOfRange { .. }));

    let err = client.write(&address("B3:0/1"), 2).unwrap_err();
    assert!(matches!(err, EipError::ValueOutOfRange { .. }));

    let float = PcccAddress::new(FileType::Float, 0);
    let err = client.write(&float, 1).unwrap_err();
    assert!(matches!(err, EipError::UnsupportedAddress { .. }));

    assert_eq!(client.transport().requests.len(), 2);
}

#[test]
fn test_oversized_read_sends_nothing() {
    let mut client = connected(SimPlc::new());

    let mut n7_0 = address("N7:0");
    n7_0.count = 200;
    let err = client.read_elements(&n7_0).unwrap_err();
    assert!(matches!(err, EipError::InvalidParameter { .. }));

    n7_0.count = 0;
    assert!(client.read_elements(&n7_0).is_err());
    assert_eq!(client.transport().requests.len(), 2);
}

#[test]
fn test_read_before_connect_sends_nothing() {
    let mut client = SlcClient::with_transport(SimPlc::new(), &config());

    assert!(matches!(
        client.read(&address("N7:0")),
        Err(EipError::NotConnected)
    ));
    assert!(matches!(
        client.write(&address("B3:0/5"), 1),
        Err(EipError::NotConnected)
    ));
    assert!(client.transport().requests.is_empty());
}

#[test]
fn test_rejected_forward_open_leaves_client_disconnected() {
    let mut plc = SimPlc::new();
    plc.reject_forward_open = true;
    let mut client = SlcClient::with_transport(plc, &config());

    let err = client.connect().unwrap_err();
    assert!(matches!(
        err,
        EipError::CipStatus {
            service: 0x54,
            general: 0x01,
            ..
        }
    ));
    assert_eq!(client.status(), SessionStatus::Disconnected);
    assert!(!client.transport().is_transport_open());

    client.disconnect();
    assert!(!client.transport().is_transport_open());
}

#[test]
fn test_disconnect_after_failed_open() {
    let mut plc = SimPlc::new();
    plc.fail_open = true;
    let mut client = SlcClient::with_transport(plc, &config());

    assert!(client.connect().unwrap_err().is_timeout());
    client.disconnect();
    assert!(!client.transport().is_transport_open());
    assert!(client.transport().requests.is_empty());
}

#[test]
fn test_disconnect_closes_connection_then_session() {
    let mut client = connected(SimPlc::new());
    client.disconnect();

    assert_eq!(
        client.transport().requests,
        vec![
            Request::Register,
            Request::ForwardOpen,
            Request::ForwardClose,
            Request::Unregister
        ]
    );
    assert!(!client.transport().is_transport_open());
    assert_eq!(client.status(), SessionStatus::Disconnected);
}
