/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use rand_core::{CryptoRng, RngCore};

use crate::crypto::*;
pub use crate::metadata::Metadata;

/// A container for the dynamic settings of an engine.
///
/// Settings are passed explicitly to the engine when it is created; there is no process wide
/// configuration. Both peers may use different settings, but a peer will reject traffic that
/// exceeds its own limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// The largest encoded metadata block this engine will send or accept inside
    /// INITIATE or READY.
    pub max_metadata_size: usize,
    /// The largest MESSAGE payload this engine will encode or decode.
    pub max_message_size: usize,
    /// The send nonce counter value at which the engine stops sending.
    /// Once the counter reaches this value every send fails with `ExhaustedNonceSpace`
    /// and the connection must be closed. The counter never wraps.
    pub max_send_nonce: u64,
    /// Properties sent to the remote peer, by the client in INITIATE and by the server in READY.
    pub metadata: Metadata,
}

impl Settings {
    /// Default value for `max_metadata_size`.
    /// Sized so that a full INITIATE still fits in a single 1024 byte buffer.
    pub const MAX_METADATA_SIZE: usize = 900;
    /// Default value for `max_message_size`. The default is 1 MiB.
    pub const MAX_MESSAGE_SIZE: usize = 1 << 20;
    /// Default value for `max_send_nonce`.
    pub const MAX_SEND_NONCE: u64 = u64::MAX;

    /// Create an instance of Settings with all default values and no metadata.
    pub const fn new() -> Self {
        Self {
            max_metadata_size: Self::MAX_METADATA_SIZE,
            max_message_size: Self::MAX_MESSAGE_SIZE,
            max_send_nonce: Self::MAX_SEND_NONCE,
            metadata: Metadata::new(),
        }
    }

    /// Replace the local metadata, keeping every other setting.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}
impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// The cryptographic capability the engine is built against.
///
/// The engine never implements a primitive itself. Everything it needs from NaCl is expressed
/// through the associated types of this trait, so an engine cannot exist without a real
/// implementation of them. `crate::crypto_impl::DefaultCrypto` provides one.
pub trait CryptoLayer: Sized {
    /// The random number generator the engine should use for ephemeral keys, the cookie key and
    /// long nonces. It must be cryptographically secure. If engines run on several threads, each
    /// gets its own instance, but they may all draw from the same thread-safe source.
    type Rng: CryptoRng + RngCore;

    /// The implementation of `crypto_box` for the one-off handshake boxes.
    type PublicBox: CurveBox;
    /// The implementation of `crypto_box_beforenm`/`crypto_box_afternm` used from INITIATE on.
    type SharedBox: PrecomputedBox;
    /// The implementation of `crypto_secretbox` used to seal the server cookie.
    type CookieBox: SecretBox;

    /// Check that the capability actually encrypts and authenticates.
    ///
    /// This runs once when an engine is created. It must return false for anything that could
    /// send cleartext, produce boxes of the wrong shape or accept a forged box.
    fn self_test(rng: &mut Self::Rng) -> bool {
        let sample = [0x5au8; 32];
        let (a_public, a_secret) = Self::PublicBox::keypair(rng);
        let (b_public, b_secret) = Self::PublicBox::keypair(rng);
        if a_public == b_public {
            return false;
        }
        let mut nonce = [0u8; BOX_NONCE_SIZE];
        rng.fill_bytes(&mut nonce);

        let sealed = Self::PublicBox::seal(&b_public, &a_secret, &nonce, &sample);
        if sealed.len() != sample.len() + BOX_MAC_SIZE || secure_eq(&sealed[BOX_MAC_SIZE..], &sample) {
            return false;
        }
        if !Self::PublicBox::open(&a_public, &b_secret, &nonce, &sealed).map_or(false, |p| secure_eq(&p, &sample)) {
            return false;
        }

        let a_shared = Self::SharedBox::new(&b_public, &a_secret);
        let b_shared = Self::SharedBox::new(&a_public, &b_secret);
        let mut shared_sealed = a_shared.seal(&nonce, &sample);
        if shared_sealed != sealed {
            return false;
        }
        if !b_shared.open(&nonce, &shared_sealed).map_or(false, |p| secure_eq(&p, &sample)) {
            return false;
        }
        shared_sealed[BOX_MAC_SIZE] ^= 1;
        if b_shared.open(&nonce, &shared_sealed).is_some() {
            return false;
        }

        let mut key = zeroize::Zeroizing::new([0u8; SECRETBOX_KEY_SIZE]);
        rng.fill_bytes(key.as_mut());
        let mut secret_sealed = Self::CookieBox::seal(&key, &nonce, &sample);
        if secret_sealed.len() != sample.len() + BOX_MAC_SIZE || secure_eq(&secret_sealed[BOX_MAC_SIZE..], &sample) {
            return false;
        }
        if !Self::CookieBox::open(&key, &nonce, &secret_sealed).map_or(false, |p| secure_eq(&p, &sample)) {
            return false;
        }
        secret_sealed[0] ^= 1;
        Self::CookieBox::open(&key, &nonce, &secret_sealed).is_none()
    }
}

/// Trait to implement to observe an engine from the surrounding application.
///
/// The engine performs no I/O of its own, so the only thing it hands back to the application
/// outside of return values is a stream of events.
pub trait ApplicationLayer {
    /// Receives a stream of events that occur during an execution of the engine.
    /// These are provided for debugging, logging or metrics purposes, and must be used for
    /// nothing else. Do not base protocol-level decisions upon the events passed to this function.
    /// No event carries secret key material.
    #[cfg(feature = "logging")]
    #[allow(unused)]
    fn event_log(&mut self, event: crate::LogEvent<'_>) {}
}

impl ApplicationLayer for () {}
