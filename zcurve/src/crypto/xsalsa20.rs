/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
/// The size in bytes of a NaCl `crypto_secretbox` key.
pub const SECRETBOX_KEY_SIZE: usize = 32;
/// The size in bytes of a NaCl `crypto_secretbox` nonce.
pub const SECRETBOX_NONCE_SIZE: usize = 24;

/// A trait for the NaCl `crypto_secretbox` construction (XSalsa20, Poly1305).
///
/// It is only used by a server to seal its cookie under a key that never leaves the server.
/// Like `CurveBox`, the authenticator comes first in the output.
pub trait SecretBox {
    /// Encrypt and authenticate `plaintext` under the symmetric `key`.
    fn seal(key: &[u8; SECRETBOX_KEY_SIZE], nonce: &[u8; SECRETBOX_NONCE_SIZE], plaintext: &[u8]) -> Vec<u8>;

    /// Verify and decrypt a secret box, returning `None` if it is not authentic.
    /// The authenticator must be checked in constant time.
    #[must_use]
    fn open(key: &[u8; SECRETBOX_KEY_SIZE], nonce: &[u8; SECRETBOX_NONCE_SIZE], ciphertext: &[u8]) -> Option<Vec<u8>>;
}
