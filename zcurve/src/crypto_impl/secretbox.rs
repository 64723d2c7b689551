/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use crypto_secretbox::aead::generic_array::GenericArray;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::XSalsa20Poly1305;

use crate::crypto::*;

/// `crypto_secretbox` from the `crypto_secretbox` crate.
pub struct CrateSecretBox;
impl SecretBox for CrateSecretBox {
    fn seal(key: &[u8; SECRETBOX_KEY_SIZE], nonce: &[u8; SECRETBOX_NONCE_SIZE], plaintext: &[u8]) -> Vec<u8> {
        XSalsa20Poly1305::new(GenericArray::from_slice(key))
            .encrypt(GenericArray::from_slice(nonce), plaintext)
            .expect("XSalsa20Poly1305 encryption into a Vec is infallible")
    }

    fn open(key: &[u8; SECRETBOX_KEY_SIZE], nonce: &[u8; SECRETBOX_NONCE_SIZE], ciphertext: &[u8]) -> Option<Vec<u8>> {
        if ciphertext.len() < BOX_MAC_SIZE {
            return None;
        }
        XSalsa20Poly1305::new(GenericArray::from_slice(key))
            .decrypt(GenericArray::from_slice(nonce), ciphertext)
            .ok()
    }
}
