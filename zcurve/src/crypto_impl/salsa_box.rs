/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::crypto::*;

/// `crypto_box` from the `crypto_box` crate, which is wire compatible with NaCl and libsodium.
pub struct CrateSalsaBox;
impl CurveBox for CrateSalsaBox {
    fn keypair<Rng: RngCore + CryptoRng>(rng: &mut Rng) -> ([u8; PUBLIC_KEY_SIZE], Zeroizing<[u8; SECRET_KEY_SIZE]>) {
        let mut secret = Zeroizing::new([0u8; SECRET_KEY_SIZE]);
        rng.fill_bytes(secret.as_mut());
        let public = *SecretKey::from(*secret).public_key().as_bytes();
        (public, secret)
    }

    fn seal(
        their_public: &[u8; PUBLIC_KEY_SIZE],
        own_secret: &[u8; SECRET_KEY_SIZE],
        nonce: &[u8; BOX_NONCE_SIZE],
        plaintext: &[u8],
    ) -> Vec<u8> {
        CratePrecomputedBox::new(their_public, own_secret).seal(nonce, plaintext)
    }

    fn open(
        their_public: &[u8; PUBLIC_KEY_SIZE],
        own_secret: &[u8; SECRET_KEY_SIZE],
        nonce: &[u8; BOX_NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Option<Vec<u8>> {
        CratePrecomputedBox::new(their_public, own_secret).open(nonce, ciphertext)
    }
}

/// A `SalsaBox` holds the HSalsa20 output of the key agreement, which is exactly the NaCl
/// `crypto_box_beforenm` key. The underlying cipher wipes it on drop.
pub struct CratePrecomputedBox(SalsaBox);
impl PrecomputedBox for CratePrecomputedBox {
    fn new(their_public: &[u8; PUBLIC_KEY_SIZE], own_secret: &[u8; SECRET_KEY_SIZE]) -> Self {
        let secret = SecretKey::from(*own_secret);
        Self(SalsaBox::new(&PublicKey::from(*their_public), &secret))
    }

    fn seal(&self, nonce: &[u8; BOX_NONCE_SIZE], plaintext: &[u8]) -> Vec<u8> {
        // Encryption into a growable buffer cannot fail.
        self.0
            .encrypt(GenericArray::from_slice(nonce), plaintext)
            .expect("XSalsa20Poly1305 encryption into a Vec is infallible")
    }

    fn open(&self, nonce: &[u8; BOX_NONCE_SIZE], ciphertext: &[u8]) -> Option<Vec<u8>> {
        if ciphertext.len() < BOX_MAC_SIZE {
            return None;
        }
        self.0.decrypt(GenericArray::from_slice(nonce), ciphertext).ok()
    }
}
