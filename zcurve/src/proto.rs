/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use crate::crypto::*;

/* Command constants */

pub(crate) const COMMAND_ID_SIZE: usize = 8;

pub(crate) const HELLO_ID: [u8; COMMAND_ID_SIZE] = *b"HELLO   ";
pub(crate) const WELCOME_ID: [u8; COMMAND_ID_SIZE] = *b"WELCOME ";
pub(crate) const INITIATE_ID: [u8; COMMAND_ID_SIZE] = *b"INITIATE";
pub(crate) const READY_ID: [u8; COMMAND_ID_SIZE] = *b"READY   ";
pub(crate) const MESSAGE_ID: [u8; COMMAND_ID_SIZE] = *b"MESSAGE ";

/// The only CurveZMQ version this engine speaks, as `[major, minor]`.
pub const CURVEZMQ_VERSION: [u8; 2] = [1, 0];

pub(crate) const SHORT_NONCE_SIZE: usize = 8;
pub(crate) const LONG_NONCE_SIZE: usize = 16;

/*
HELLO:
    [0..8]     "HELLO   "
    [8..10]    version
    [10..80]   anti-amplification padding
    [80..112]  client ephemeral public key C'
    [112..120] short nonce
    [120..200] Box[64 * 0x00](C'->S)
*/
pub(crate) const HELLO_VERSION_SIZE: usize = 2;
pub(crate) const HELLO_PADDING_SIZE: usize = 70;
pub(crate) const HELLO_SIGNATURE_SIZE: usize = 64;
pub(crate) const HELLO_BOX_SIZE: usize = HELLO_SIGNATURE_SIZE + BOX_MAC_SIZE;
/// Exact size of an encoded HELLO.
pub const HELLO_SIZE: usize =
    COMMAND_ID_SIZE + HELLO_VERSION_SIZE + HELLO_PADDING_SIZE + PUBLIC_KEY_SIZE + SHORT_NONCE_SIZE + HELLO_BOX_SIZE;

/*
Cookie:
    [0..16]    cookie nonce
    [16..96]   SecretBox[C' + s'](K)
*/
pub(crate) const COOKIE_PLAINTEXT_SIZE: usize = PUBLIC_KEY_SIZE + SECRET_KEY_SIZE;
pub(crate) const COOKIE_BOX_SIZE: usize = COOKIE_PLAINTEXT_SIZE + BOX_MAC_SIZE;
pub(crate) const COOKIE_SIZE: usize = LONG_NONCE_SIZE + COOKIE_BOX_SIZE;

/*
WELCOME:
    [0..8]     "WELCOME "
    [8..24]    long nonce
    [24..168]  Box[S' + cookie](S->C')
*/
pub(crate) const WELCOME_PLAINTEXT_SIZE: usize = PUBLIC_KEY_SIZE + COOKIE_SIZE;
pub(crate) const WELCOME_BOX_SIZE: usize = WELCOME_PLAINTEXT_SIZE + BOX_MAC_SIZE;
/// Exact size of an encoded WELCOME.
pub const WELCOME_SIZE: usize = COMMAND_ID_SIZE + LONG_NONCE_SIZE + WELCOME_BOX_SIZE;

/*
INITIATE:
    [0..8]     "INITIATE"
    [8..104]   cookie
    [104..112] short nonce
    [112..]    Box[C + vouch nonce + vouch + metadata](C'->S')
Vouch:
    Box[C'](C->S')
*/
pub(crate) const VOUCH_BOX_SIZE: usize = PUBLIC_KEY_SIZE + BOX_MAC_SIZE;
pub(crate) const INITIATE_PLAINTEXT_MIN_SIZE: usize = PUBLIC_KEY_SIZE + LONG_NONCE_SIZE + VOUCH_BOX_SIZE;
pub(crate) const INITIATE_BOX_MIN_SIZE: usize = INITIATE_PLAINTEXT_MIN_SIZE + BOX_MAC_SIZE;
/// Minimum size of an encoded INITIATE, one that carries no metadata.
pub const INITIATE_MIN_SIZE: usize = COMMAND_ID_SIZE + COOKIE_SIZE + SHORT_NONCE_SIZE + INITIATE_BOX_MIN_SIZE;

/*
READY:
    [0..8]     "READY   "
    [8..16]    short nonce
    [16..]     Box[metadata](S'->C')
MESSAGE:
    [0..8]     "MESSAGE "
    [8..16]    short nonce
    [16..]     Box[payload](S'->C') or (C'->S')
*/
/// Minimum size of an encoded READY, one that carries no metadata.
pub const READY_MIN_SIZE: usize = COMMAND_ID_SIZE + SHORT_NONCE_SIZE + BOX_MAC_SIZE;
/// Minimum size of an encoded MESSAGE, one that carries an empty payload.
pub const MESSAGE_MIN_SIZE: usize = COMMAND_ID_SIZE + SHORT_NONCE_SIZE + BOX_MAC_SIZE;

/* Nonce prefixes */

pub(crate) const NONCE_PREFIX_HELLO: &[u8; 16] = b"CurveZMQHELLO---";
pub(crate) const NONCE_PREFIX_INITIATE: &[u8; 16] = b"CurveZMQINITIATE";
pub(crate) const NONCE_PREFIX_READY: &[u8; 16] = b"CurveZMQREADY---";
pub(crate) const NONCE_PREFIX_MESSAGE_CLIENT: &[u8; 16] = b"CurveZMQMESSAGEC";
pub(crate) const NONCE_PREFIX_MESSAGE_SERVER: &[u8; 16] = b"CurveZMQMESSAGES";

pub(crate) const NONCE_PREFIX_WELCOME: &[u8; 8] = b"WELCOME-";
pub(crate) const NONCE_PREFIX_COOKIE: &[u8; 8] = b"COOKIE--";
pub(crate) const NONCE_PREFIX_VOUCH: &[u8; 8] = b"VOUCH---";

/* Metadata constants */

pub(crate) const METADATA_NAME_MAX_SIZE: usize = u8::MAX as usize;
pub(crate) const METADATA_VALUE_LEN_SIZE: usize = 4;
