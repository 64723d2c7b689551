/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

/// The size in bytes of a Curve25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;
/// The size in bytes of a Curve25519 secret key.
pub const SECRET_KEY_SIZE: usize = 32;
/// The size in bytes of a NaCl box nonce.
pub const BOX_NONCE_SIZE: usize = 24;
/// The size in bytes of the Poly1305 authenticator that is prepended to every box.
pub const BOX_MAC_SIZE: usize = 16;

/// A trait for the NaCl `crypto_box` construction (Curve25519, XSalsa20, Poly1305).
///
/// These are pure functions with no side effects. They are used for the one-off boxes of the
/// CurveZMQ handshake, where every box is sealed with a different pair of keys.
///
/// The output of `seal` must be laid out the NaCl way, with the 16 byte authenticator first and
/// the ciphertext after it, so its length is always `plaintext.len() + BOX_MAC_SIZE`.
pub trait CurveBox {
    /// Randomly generate a new Curve25519 key pair, returning `(public, secret)`.
    ///
    /// This function may use the provided RNG or its own, so long as the output is
    /// cryptographically random.
    fn keypair<Rng: RngCore + CryptoRng>(rng: &mut Rng) -> ([u8; PUBLIC_KEY_SIZE], Zeroizing<[u8; SECRET_KEY_SIZE]>);

    /// Encrypt and authenticate `plaintext` from the owner of `own_secret` to the owner of
    /// `their_public`.
    fn seal(
        their_public: &[u8; PUBLIC_KEY_SIZE],
        own_secret: &[u8; SECRET_KEY_SIZE],
        nonce: &[u8; BOX_NONCE_SIZE],
        plaintext: &[u8],
    ) -> Vec<u8>;

    /// Verify and decrypt a box produced by `seal`.
    ///
    /// Must return `None` if the authenticator does not match, and must check it in constant time.
    #[must_use]
    fn open(
        their_public: &[u8; PUBLIC_KEY_SIZE],
        own_secret: &[u8; SECRET_KEY_SIZE],
        nonce: &[u8; BOX_NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Option<Vec<u8>>;
}

/// A trait for the NaCl `crypto_box_beforenm`/`crypto_box_afternm` pair.
///
/// One instance is created per connection, as soon as both ephemeral keys are known, and it
/// handles every box exchanged after that point (INITIATE, READY and all MESSAGE traffic).
/// A box sealed with an instance created from `(their_public, own_secret)` must be identical to
/// one sealed by `CurveBox::seal` with the same keys and nonce.
///
/// Instances must securely delete their precomputed key when dropped.
pub trait PrecomputedBox: Sized + Send + Sync {
    /// Perform the key agreement between `their_public` and `own_secret` once.
    fn new(their_public: &[u8; PUBLIC_KEY_SIZE], own_secret: &[u8; SECRET_KEY_SIZE]) -> Self;

    /// Encrypt and authenticate `plaintext` under the precomputed key.
    fn seal(&self, nonce: &[u8; BOX_NONCE_SIZE], plaintext: &[u8]) -> Vec<u8>;

    /// Verify and decrypt a box under the precomputed key, returning `None` if it is not authentic.
    #[must_use]
    fn open(&self, nonce: &[u8; BOX_NONCE_SIZE], ciphertext: &[u8]) -> Option<Vec<u8>>;
}
