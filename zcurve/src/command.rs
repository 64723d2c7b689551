/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
//! Serialization of the five CurveZMQ commands.
//!
//! This layer only checks shapes: ids, sizes and the HELLO version. Nothing here touches a key.
use crate::crypto::*;
use crate::proto::*;
use crate::result::FaultType;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hello {
    pub client_ephemeral_public: [u8; PUBLIC_KEY_SIZE],
    pub nonce: u64,
    /// Box of 64 zero bytes from C' to S.
    pub signature_box: [u8; HELLO_BOX_SIZE],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Welcome {
    pub nonce: [u8; LONG_NONCE_SIZE],
    /// Box of S' and the cookie from S to C'.
    pub sealed: [u8; WELCOME_BOX_SIZE],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Initiate {
    /// The cookie from WELCOME, echoed verbatim.
    pub cookie: [u8; COOKIE_SIZE],
    pub nonce: u64,
    /// Box of C, the vouch and the client metadata from C' to S'.
    pub sealed: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ready {
    pub nonce: u64,
    /// Box of the server metadata from S' to C'.
    pub sealed: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub nonce: u64,
    pub sealed: Vec<u8>,
}

/// One command of the CurveZMQ handshake or message stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Hello(Hello),
    Welcome(Welcome),
    Initiate(Initiate),
    Ready(Ready),
    Message(Message),
}

fn read_u64(b: &[u8]) -> u64 {
    let mut tmp = [0u8; SHORT_NONCE_SIZE];
    tmp.copy_from_slice(&b[..SHORT_NONCE_SIZE]);
    u64::from_be_bytes(tmp)
}

impl Command {
    /// Parse a command, checking its id and its size before reading anything else.
    pub fn decode(bytes: &[u8]) -> Result<Self, FaultType> {
        use FaultType::MalformedCommand;
        if bytes.len() < COMMAND_ID_SIZE {
            return Err(MalformedCommand);
        }
        let (id, body) = bytes.split_at(COMMAND_ID_SIZE);
        let mut tag = [0u8; COMMAND_ID_SIZE];
        tag.copy_from_slice(id);
        match tag {
            HELLO_ID => {
                if bytes.len() != HELLO_SIZE {
                    return Err(MalformedCommand);
                }
                if body[..HELLO_VERSION_SIZE] != CURVEZMQ_VERSION {
                    return Err(MalformedCommand);
                }
                let mut i = HELLO_VERSION_SIZE + HELLO_PADDING_SIZE;
                let mut client_ephemeral_public = [0u8; PUBLIC_KEY_SIZE];
                client_ephemeral_public.copy_from_slice(&body[i..i + PUBLIC_KEY_SIZE]);
                i += PUBLIC_KEY_SIZE;
                let nonce = read_u64(&body[i..]);
                i += SHORT_NONCE_SIZE;
                let mut signature_box = [0u8; HELLO_BOX_SIZE];
                signature_box.copy_from_slice(&body[i..]);
                Ok(Self::Hello(Hello { client_ephemeral_public, nonce, signature_box }))
            }
            WELCOME_ID => {
                if bytes.len() != WELCOME_SIZE {
                    return Err(MalformedCommand);
                }
                let mut nonce = [0u8; LONG_NONCE_SIZE];
                nonce.copy_from_slice(&body[..LONG_NONCE_SIZE]);
                let mut sealed = [0u8; WELCOME_BOX_SIZE];
                sealed.copy_from_slice(&body[LONG_NONCE_SIZE..]);
                Ok(Self::Welcome(Welcome { nonce, sealed }))
            }
            INITIATE_ID => {
                if bytes.len() < INITIATE_MIN_SIZE {
                    return Err(MalformedCommand);
                }
                let mut cookie = [0u8; COOKIE_SIZE];
                cookie.copy_from_slice(&body[..COOKIE_SIZE]);
                let nonce = read_u64(&body[COOKIE_SIZE..]);
                let sealed = body[COOKIE_SIZE + SHORT_NONCE_SIZE..].to_vec();
                Ok(Self::Initiate(Initiate { cookie, nonce, sealed }))
            }
            READY_ID | MESSAGE_ID => {
                // Both carry the same shape.
                if bytes.len() < READY_MIN_SIZE {
                    return Err(MalformedCommand);
                }
                let nonce = read_u64(body);
                let sealed = body[SHORT_NONCE_SIZE..].to_vec();
                if tag == READY_ID {
                    Ok(Self::Ready(Ready { nonce, sealed }))
                } else {
                    Ok(Self::Message(Message { nonce, sealed }))
                }
            }
            _ => Err(MalformedCommand),
        }
    }

    /// Serialize a command. For every value produced by `decode`, `decode(encode(c)) == c`.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Hello(h) => {
                let mut out = Vec::with_capacity(HELLO_SIZE);
                out.extend_from_slice(&HELLO_ID);
                out.extend_from_slice(&CURVEZMQ_VERSION);
                out.extend_from_slice(&[0u8; HELLO_PADDING_SIZE]);
                out.extend_from_slice(&h.client_ephemeral_public);
                out.extend_from_slice(&h.nonce.to_be_bytes());
                out.extend_from_slice(&h.signature_box);
                out
            }
            Self::Welcome(w) => {
                let mut out = Vec::with_capacity(WELCOME_SIZE);
                out.extend_from_slice(&WELCOME_ID);
                out.extend_from_slice(&w.nonce);
                out.extend_from_slice(&w.sealed);
                out
            }
            Self::Initiate(i) => {
                let mut out = Vec::with_capacity(COMMAND_ID_SIZE + COOKIE_SIZE + SHORT_NONCE_SIZE + i.sealed.len());
                out.extend_from_slice(&INITIATE_ID);
                out.extend_from_slice(&i.cookie);
                out.extend_from_slice(&i.nonce.to_be_bytes());
                out.extend_from_slice(&i.sealed);
                out
            }
            Self::Ready(Ready { nonce, sealed }) => short_command(&READY_ID, *nonce, sealed),
            Self::Message(Message { nonce, sealed }) => short_command(&MESSAGE_ID, *nonce, sealed),
        }
    }

    /// The command name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hello(_) => "HELLO",
            Self::Welcome(_) => "WELCOME",
            Self::Initiate(_) => "INITIATE",
            Self::Ready(_) => "READY",
            Self::Message(_) => "MESSAGE",
        }
    }
}

fn short_command(id: &[u8; COMMAND_ID_SIZE], nonce: u64, sealed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(COMMAND_ID_SIZE + SHORT_NONCE_SIZE + sealed.len());
    out.extend_from_slice(id);
    out.extend_from_slice(&nonce.to_be_bytes());
    out.extend_from_slice(sealed);
    out
}
