/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use zeroize::Zeroizing;

use crate::application::CryptoLayer;
use crate::crypto::*;

/// A Curve25519 key pair. The secret half is wiped when the key pair is dropped.
pub struct KeyPair {
    public: [u8; PUBLIC_KEY_SIZE],
    secret: Zeroizing<[u8; SECRET_KEY_SIZE]>,
}

impl KeyPair {
    /// Generate a fresh key pair through the crypto capability.
    pub fn generate<C: CryptoLayer>(rng: &mut C::Rng) -> Self {
        let (public, secret) = C::PublicBox::keypair(rng);
        Self { public, secret }
    }

    /// Wrap raw key bytes, for instance ones loaded from disk.
    ///
    /// The bytes are not checked for consistency. A mismatched pair simply fails to
    /// authenticate with the remote peer.
    pub fn from_bytes(public: &[u8; PUBLIC_KEY_SIZE], secret: &[u8; SECRET_KEY_SIZE]) -> Self {
        Self { public: *public, secret: Zeroizing::new(*secret) }
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public
    }

    pub(crate) fn secret(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.secret
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self { public: self.public, secret: Zeroizing::new(*self.secret) }
    }
}

/// Never prints the secret half.
impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("public", &self.public).finish_non_exhaustive()
    }
}
