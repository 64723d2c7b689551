/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use crate::crypto::PUBLIC_KEY_SIZE;
use crate::engine::Role;
use crate::metadata::Metadata;
use crate::result::ReceiveError;

/// Engine events that might be interesting to log or aggregate into metrics.
///
/// Nonce values are the short nonce counters carried on the wire.
#[allow(missing_docs)]
#[derive(Debug)]
pub enum LogEvent<'a> {
    /// `(nonce)`
    SentHello(u64),
    ReceivedRawHello,
    HelloIsAuthSentWelcome,
    ReceivedRawWelcome,
    /// `(nonce)`
    WelcomeIsAuthSentInitiate(u64),
    ReceivedRawInitiate,
    CookieKeyErased,
    /// `(client long-term public key, nonce)`
    InitiateIsAuthSentReady(&'a [u8; PUBLIC_KEY_SIZE], u64),
    ReceivedRawReady,
    ReadyIsAuth,
    /// `(local role, peer metadata)`
    Connected(Role, &'a Metadata),
    /// `(nonce, payload length)`
    SentMessage(u64, usize),
    /// `(nonce, payload length)`
    ReceivedMessage(u64, usize),
    Rejected(&'a ReceiveError),
    NonceSpaceExhausted,
}

/// Macro to turn off logging at compile time.
macro_rules! log {
    ($app:expr, $event:expr) => {
        #[cfg(feature = "logging")]
        $app.event_log($event);
    };
}
pub(crate) use log;
