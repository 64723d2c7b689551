/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
//#![warn(missing_docs, rust_2018_idioms)]
pub mod crypto;
pub mod crypto_impl;

mod engine;
mod keys;
mod log_event;
mod nonce;

pub mod application;
pub mod command;
pub mod metadata;
pub mod proto;
pub mod result;

pub use crate::engine::*;
pub use crate::keys::KeyPair;
pub use crate::log_event::*;
