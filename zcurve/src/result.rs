/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use thiserror::Error;

/// An error that can occur when attempting to create an engine.
#[derive(Error, Debug, PartialEq, Eq, Clone, Hash)]
pub enum OpenError {
    /// The crypto capability failed its self test. The engine refuses to exist rather than
    /// ever send cleartext.
    #[error("crypto capability is unavailable or failed its self test")]
    CapabilityUnavailable,

    /// The local metadata encodes to more than `Settings::max_metadata_size` bytes.
    #[error("local metadata is too large")]
    MetadataTooLarge,

    /// A local metadata property name is empty, longer than 255 bytes or contains characters
    /// outside of `[A-Za-z0-9.+_-]`.
    #[error("local metadata contains an invalid property name")]
    InvalidMetadata,
}

/// An error that can occur when attempting to encode a MESSAGE.
#[derive(Error, Debug, PartialEq, Eq, Clone, Hash)]
pub enum SendError {
    /// Attempt to send before the handshake has completed.
    /// This is a usage error on the part of the caller, not a protocol error.
    #[error("handshake has not completed")]
    SessionNotEstablished,

    /// The send nonce counter reached `Settings::max_send_nonce`.
    /// The connection will not send again and must be closed.
    #[error("send nonce space is exhausted")]
    ExhaustedNonceSpace,

    /// Payload is larger than `Settings::max_message_size`.
    #[error("payload is too large")]
    DataTooLarge,
}

/// A type of fault occurred because we received a bad command.
///
/// An unauthenticated attacker can intentionally trigger any of these, so it is best to
/// treat these as raw user input that needs to be sanitized.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FaultType {
    /// The command had an unknown id, the wrong size, an unsupported version or malformed
    /// metadata.
    #[error("malformed command")]
    MalformedCommand,

    /// A box failed to open, or the cookie or vouch did not contain the expected keys.
    /// The caller should tear the connection down.
    #[error("authentication failed")]
    FailedAuth,

    /// The command was well formed but is not expected in the current state.
    #[error("command out of sequence")]
    OutOfSequence,

    /// The short nonce of an authenticated command was not greater than the last one received
    /// from the peer.
    #[error("nonce was replayed")]
    ReplayedNonce,
}

/// An error that occurred while processing an incoming command.
///
/// In every case the engine is left in the state it was in before the call, except that a server
/// erases its cookie key on the first INITIATE it opens, whether or not that INITIATE is accepted.
#[derive(Error, Debug, PartialEq, Eq, Clone, Hash)]
pub enum ReceiveError {
    /// The remote peer sent us a bad command. Such commands have no effect on the engine
    /// but a user might want to log them for debugging or tracing.
    #[error("{error} ({file}:{line})")]
    ByzantineFault {
        /// The type of fault that has occurred. Be cautious if you choose to read this
        /// value, as an attacker has control over it.
        error: FaultType,
        /// The file of this implementation from which this error was generated.
        file: &'static str,
        /// The line number from which this error was generated. As such this number uniquely
        /// identifies each possible fault.
        line: u32,
    },

    /// A MESSAGE was passed to `decode` before the handshake completed.
    #[error("handshake has not completed")]
    SessionNotEstablished,

    /// The send nonce counter reached `Settings::max_send_nonce` while producing a handshake
    /// command. The connection must be closed.
    #[error("send nonce space is exhausted")]
    ExhaustedNonceSpace,

    /// The handshake step needs the local long-term key pair but none has been set with
    /// `keypair_new` or `keypair_load`.
    #[error("no long-term key pair has been set")]
    MissingKeyPair,

    /// The crypto capability returned a box of the wrong size.
    #[error("crypto capability produced malformed output")]
    CapabilityFailure,
}

impl ReceiveError {
    /// The fault type if this error was caused by the remote peer.
    pub fn fault(&self) -> Option<FaultType> {
        match self {
            Self::ByzantineFault { error, .. } => Some(*error),
            _ => None,
        }
    }
}

macro_rules! fault {
    ($name:expr) => {
        $crate::result::ReceiveError::ByzantineFault { file: file!(), line: line!(), error: $name }
    };
}
pub(crate) use fault;
