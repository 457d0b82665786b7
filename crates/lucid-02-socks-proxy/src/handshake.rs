//! Byte-exact SOCKS5 wire encoding/decoding.
//!
//! These functions reproduce the literal byte sequences the spec
//! binds byte-for-byte: greeting, method selection, optional
//! username/password sub-negotiation, and the CONNECT request/reply.

use crate::errors::SocksError;

const VERSION: u8 = 0x05;
const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_USERNAME_PASSWORD: u8 = 0x02;
const METHOD_NO_ACCEPTABLE: u8 = 0xFF;
const CMD_CONNECT: u8 = 0x01;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const AUTH_VERSION: u8 = 0x01;
const AUTH_SUCCESS: u8 = 0x00;
const REPLY_SUCCESS: u8 = 0x00;

/// The CONNECT target address. `.onion` addresses and any other
/// domain name MUST use the domain-name form so the proxy resolves
/// them rather than the client.
#[derive(Debug, Clone)]
pub enum Address {
    Ipv4([u8; 4]),
    Domain(String),
}

/// Client greeting: version, method count, method bytes.
pub fn encode_greeting(offer_username_password: bool) -> Vec<u8> {
    if offer_username_password {
        vec![VERSION, 0x02, METHOD_NO_AUTH, METHOD_USERNAME_PASSWORD]
    } else {
        vec![VERSION, 0x01, METHOD_NO_AUTH]
    }
}

/// Server's method-selection reply: `05 <method>`. Returns the chosen
/// method byte.
pub fn decode_method_selection(bytes: &[u8]) -> Result<u8, SocksError> {
    if bytes.len() != 2 || bytes[0] != VERSION {
        return Err(SocksError::Protocol("malformed method selection reply".into()));
    }
    if bytes[1] == METHOD_NO_ACCEPTABLE {
        return Err(SocksError::AuthRejected);
    }
    Ok(bytes[1])
}

/// Username/password sub-negotiation request (RFC 1929).
pub fn encode_username_password(username: &[u8], password: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(3 + username.len() + password.len());
    out.push(AUTH_VERSION);
    out.push(username.len() as u8);
    out.extend_from_slice(username);
    out.push(password.len() as u8);
    out.extend_from_slice(password);
    out
}

/// Username/password sub-negotiation reply: `01 <status>`.
pub fn decode_auth_reply(bytes: &[u8]) -> Result<(), SocksError> {
    if bytes.len() != 2 {
        return Err(SocksError::Protocol("malformed auth reply".into()));
    }
    if bytes[1] != AUTH_SUCCESS {
        return Err(SocksError::AuthRejected);
    }
    Ok(())
}

/// CONNECT request: `05 01 00 <atyp> <addr> <port-be>`.
pub fn encode_connect_request(address: &Address, port: u16) -> Vec<u8> {
    let mut out = vec![VERSION, CMD_CONNECT, 0x00];
    match address {
        Address::Ipv4(octets) => {
            out.push(ATYP_IPV4);
            out.extend_from_slice(octets);
        }
        Address::Domain(name) => {
            out.push(ATYP_DOMAIN);
            out.push(name.len() as u8);
            out.extend_from_slice(name.as_bytes());
        }
    }
    out.extend_from_slice(&port.to_be_bytes());
    out
}

/// CONNECT reply: `05 <reply> 00 <atyp> <bound-addr> <bound-port>`.
/// Only the reply code is validated; the bound address is informational.
pub fn decode_connect_reply(bytes: &[u8]) -> Result<(), SocksError> {
    if bytes.len() < 4 || bytes[0] != VERSION {
        return Err(SocksError::Protocol("malformed connect reply".into()));
    }
    if bytes[1] != REPLY_SUCCESS {
        return Err(SocksError::Protocol(format!("connect rejected, reply code {}", bytes[1])));
    }
    Ok(())
}

/// Bytes a CONNECT reply occupies given its address type, so a reader
/// knows how much more to read after the 4-byte header.
pub fn connect_reply_tail_len(atyp: u8) -> usize {
    match atyp {
        ATYP_IPV4 => 4 + 2,
        ATYP_DOMAIN => 0, // length-prefixed; caller reads the length byte first
        _ => 16 + 2,      // IPv6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_3_greeting_matches_byte_for_byte() {
        assert_eq!(encode_greeting(false), vec![0x05, 0x01, 0x00]);
    }

    #[test]
    fn scenario_3_method_selection_reply_matches() {
        let selected = decode_method_selection(&[0x05, 0x00]).unwrap();
        assert_eq!(selected, METHOD_NO_AUTH);
    }

    #[test]
    fn scenario_3_connect_request_to_onion_matches_byte_for_byte() {
        let onion = "abc.xyz.onion".to_string();
        let request = encode_connect_request(&Address::Domain(onion.clone()), 80);

        let mut expected = vec![0x05, 0x01, 0x00, 0x03, onion.len() as u8];
        expected.extend_from_slice(onion.as_bytes());
        expected.extend_from_slice(&[0x00, 0x50]);

        assert_eq!(request, expected);
    }

    #[test]
    fn scenario_3_success_reply_matches_byte_for_byte() {
        let reply = [0x05, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(decode_connect_reply(&reply).is_ok());
    }

    #[test]
    fn no_acceptable_methods_is_auth_rejected() {
        let result = decode_method_selection(&[0x05, 0xFF]);
        assert!(matches!(result, Err(SocksError::AuthRejected)));
    }

    #[test]
    fn nonzero_reply_code_is_a_protocol_error() {
        let reply = [0x05, 0x01, 0x00, 0x01, 0, 0, 0, 0, 0, 0];
        assert!(decode_connect_reply(&reply).is_err());
    }
}
