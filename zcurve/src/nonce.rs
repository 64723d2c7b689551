/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use crate::crypto::BOX_NONCE_SIZE;
use crate::proto::*;

/// Create a 24 byte box nonce from a 16 byte prefix and a short nonce counter.
///
/// CurveZMQ carries the counter in network byte order.
pub(crate) fn short_nonce(prefix: &[u8; 16], counter: u64) -> [u8; BOX_NONCE_SIZE] {
    let mut ret = [0u8; BOX_NONCE_SIZE];
    ret[..16].copy_from_slice(prefix);
    ret[16..].copy_from_slice(&counter.to_be_bytes());
    ret
}

/// Create a 24 byte box nonce from an 8 byte prefix and 16 random bytes.
pub(crate) fn long_nonce(prefix: &[u8; 8], random: &[u8; LONG_NONCE_SIZE]) -> [u8; BOX_NONCE_SIZE] {
    let mut ret = [0u8; BOX_NONCE_SIZE];
    ret[..8].copy_from_slice(prefix);
    ret[8..].copy_from_slice(random);
    ret
}

/// The short nonce counter for everything this side sends.
///
/// One counter is shared across HELLO, INITIATE, READY and MESSAGE. Their prefixes differ, so a
/// given (key, prefix) pair still sees each value at most once.
pub(crate) struct SendCounter {
    next: u64,
    limit: u64,
}
impl SendCounter {
    pub(crate) fn new(limit: u64) -> Self {
        Self { next: 1, limit }
    }
    /// The value the next send will use.
    pub(crate) fn peek(&self) -> u64 {
        self.next
    }
    /// The value the next send will use, or `None` once the limit has been reached.
    /// Nothing is consumed until `advance` is called.
    pub(crate) fn available(&self) -> Option<u64> {
        (self.next < self.limit).then_some(self.next)
    }
    /// Consume the value last returned by `available`.
    pub(crate) fn advance(&mut self) {
        if self.next < self.limit {
            self.next += 1;
        }
    }
}

/// Tracks the last short nonce accepted from the remote peer.
///
/// CurveZMQ runs over a reliable, ordered transport, so every authenticated short nonce must be
/// strictly greater than the one before it. Only call `update` after the command authenticated.
pub(crate) struct RecvWindow {
    last: u64,
}
impl RecvWindow {
    pub(crate) fn new() -> Self {
        Self { last: 0 }
    }
    /// Check the window without mutating state.
    pub(crate) fn check(&self, counter: u64) -> bool {
        counter > self.last
    }
    /// Update the window, returning true if the nonce is still valid.
    pub(crate) fn update(&mut self, counter: u64) -> bool {
        if counter > self.last {
            self.last = counter;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nonce_layout() {
        let n = short_nonce(NONCE_PREFIX_MESSAGE_CLIENT, 0x0102_0304_0506_0708);
        assert_eq!(&n[..16], b"CurveZMQMESSAGEC");
        assert_eq!(&n[16..], &[1, 2, 3, 4, 5, 6, 7, 8]);

        let n = long_nonce(NONCE_PREFIX_VOUCH, &[0xee; LONG_NONCE_SIZE]);
        assert_eq!(&n[..8], b"VOUCH---");
        assert_eq!(&n[8..], &[0xee; LONG_NONCE_SIZE]);
    }

    #[test]
    fn send_counter_stops_at_limit() {
        let mut counter = SendCounter::new(4);
        assert_eq!(counter.peek(), 1);
        for expected in 1..4 {
            assert_eq!(counter.available(), Some(expected));
            counter.advance();
        }
        assert_eq!(counter.available(), None);
        counter.advance();
        assert_eq!(counter.available(), None);
        assert_eq!(counter.peek(), 4);
    }

    #[test]
    fn available_does_not_consume() {
        let mut counter = SendCounter::new(3);
        assert_eq!(counter.available(), Some(1));
        assert_eq!(counter.available(), Some(1));
        counter.advance();
        assert_eq!(counter.available(), Some(2));
        counter.advance();
        assert_eq!(counter.available(), None);
        counter.advance();
        assert_eq!(counter.peek(), 3);
    }

    #[test]
    fn send_counter_never_wraps() {
        let mut counter = SendCounter { next: u64::MAX - 1, limit: u64::MAX };
        assert_eq!(counter.available(), Some(u64::MAX - 1));
        counter.advance();
        assert_eq!(counter.available(), None);
        counter.advance();
        assert_eq!(counter.peek(), u64::MAX);
    }

    #[test]
    fn recv_window_is_strictly_increasing() {
        let mut window = RecvWindow::new();
        assert!(!window.check(0));
        assert!(window.check(1));
        assert!(window.update(1));
        assert!(!window.update(1));
        assert!(window.update(5));
        assert!(!window.check(4));
        assert!(window.check(6));
    }
}
