/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
#[cfg(feature = "crypto_box")]
mod salsa_box;
#[cfg(feature = "crypto_box")]
pub use crypto_box;
#[cfg(feature = "crypto_box")]
pub use salsa_box::*;

#[cfg(feature = "crypto_secretbox")]
mod secretbox;
#[cfg(feature = "crypto_secretbox")]
pub use crypto_secretbox;
#[cfg(feature = "crypto_secretbox")]
pub use secretbox::*;

/// A `CryptoLayer` built entirely from the default crates.
#[cfg(feature = "default-crypto")]
pub struct DefaultCrypto;
#[cfg(feature = "default-crypto")]
impl crate::application::CryptoLayer for DefaultCrypto {
    type Rng = rand_core::OsRng;
    type PublicBox = CrateSalsaBox;
    type SharedBox = CratePrecomputedBox;
    type CookieBox = CrateSecretBox;
}
