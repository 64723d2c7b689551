/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use std::mem;

use arrayvec::ArrayVec;
use rand_core::RngCore;
use zeroize::Zeroizing;

use crate::application::*;
use crate::command::*;
use crate::crypto::*;
use crate::keys::KeyPair;
use crate::log_event::log;
use crate::nonce::{long_nonce, short_nonce, RecvWindow, SendCounter};
use crate::proto::*;
use crate::result::{fault, FaultType, OpenError, ReceiveError, SendError};
#[cfg(feature = "logging")]
use crate::LogEvent::*;

/// Which side of the handshake an engine plays. Fixed when the engine is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

/// The externally visible handshake state. States only ever move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// A client that has not yet sent HELLO.
    Pending,
    /// A server waiting for HELLO.
    ExpectHello,
    /// A client that sent HELLO.
    ExpectWelcome,
    /// A server that sent WELCOME.
    ExpectInitiate,
    /// A client that sent INITIATE.
    ExpectReady,
    Connected,
}

pub(crate) struct ExpectWelcomeState {
    ephemeral: KeyPair,
}

pub(crate) struct ExpectInitiateState<C: CryptoLayer> {
    client_ephemeral: [u8; PUBLIC_KEY_SIZE],
    ephemeral: KeyPair,
    /// Erased the moment any INITIATE cookie is opened.
    cookie_key: Option<Zeroizing<[u8; SECRETBOX_KEY_SIZE]>>,
    shared: C::SharedBox,
}

/// Internal state machine. Each state owns exactly the secrets that are valid in it.
pub(crate) enum Automata<C: CryptoLayer> {
    Pending,
    ExpectHello,
    ExpectWelcome(Box<ExpectWelcomeState>),
    ExpectInitiate(Box<ExpectInitiateState<C>>),
    ExpectReady(Box<C::SharedBox>),
    Connected(Box<C::SharedBox>),
}

/// A CurveZMQ engine for one connection.
///
/// The engine performs no I/O. The caller feeds every inbound command to `execute` and sends
/// whatever it returns, until `is_connected` is true. After that `encode` and `decode` transform
/// MESSAGE traffic. All secret material is wiped when the engine is dropped.
pub struct Engine<C: CryptoLayer, App: ApplicationLayer = ()> {
    role: Role,
    settings: Settings,
    app: App,
    rng: C::Rng,
    long_term: Option<KeyPair>,
    peer_public: Option<[u8; PUBLIC_KEY_SIZE]>,
    send: SendCounter,
    recv: RecvWindow,
    local_metadata: Vec<u8>,
    peer_metadata: Option<Metadata>,
    beta: Automata<C>,
}

/// `b` must hold at least `N` bytes; every caller checks the length first.
fn to_array<const N: usize>(b: &[u8]) -> [u8; N] {
    debug_assert!(b.len() >= N);
    let mut ret = [0u8; N];
    ret.copy_from_slice(&b[..N]);
    ret
}

impl<C: CryptoLayer, App: ApplicationLayer> Engine<C, App> {
    fn new(app: App, mut rng: C::Rng, settings: Settings, role: Role) -> Result<Self, OpenError> {
        if !C::self_test(&mut rng) {
            return Err(OpenError::CapabilityUnavailable);
        }
        let local_metadata = settings.metadata.encode()?;
        if local_metadata.len() > settings.max_metadata_size {
            return Err(OpenError::MetadataTooLarge);
        }
        Ok(Self {
            role,
            send: SendCounter::new(settings.max_send_nonce),
            recv: RecvWindow::new(),
            settings,
            app,
            rng,
            long_term: None,
            peer_public: None,
            local_metadata,
            peer_metadata: None,
            beta: match role {
                Role::Client => Automata::Pending,
                Role::Server => Automata::ExpectHello,
            },
        })
    }

    /// Create a client engine that will connect to the server owning `server_public_key`.
    ///
    /// The client needs a long-term key pair of its own before it receives WELCOME; set one with
    /// `keypair_new` or `keypair_load`.
    ///
    /// * `app` - Receives the event log
    /// * `rng` - Source of every random byte this engine uses
    /// * `settings` - Limits and the local metadata
    /// * `server_public_key` - The server's long-term Curve25519 public key
    pub fn new_client(
        app: App,
        rng: C::Rng,
        settings: Settings,
        server_public_key: &[u8; PUBLIC_KEY_SIZE],
    ) -> Result<Self, OpenError> {
        let mut engine = Self::new(app, rng, settings, Role::Client)?;
        engine.peer_public = Some(*server_public_key);
        Ok(engine)
    }

    /// Create a server engine. The client's identity is learned from its INITIATE.
    ///
    /// A long-term key pair must be set before HELLO arrives.
    pub fn new_server(app: App, rng: C::Rng, settings: Settings) -> Result<Self, OpenError> {
        Self::new(app, rng, settings, Role::Server)
    }

    /// Generate and install a fresh long-term key pair, replacing any previous one.
    pub fn keypair_new(&mut self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.long_term.insert(KeyPair::generate::<C>(&mut self.rng)).public_key()
    }

    /// Install a long-term key pair from raw bytes.
    pub fn keypair_load(&mut self, public: &[u8; PUBLIC_KEY_SIZE], secret: &[u8; SECRET_KEY_SIZE]) {
        self.long_term = Some(KeyPair::from_bytes(public, secret));
    }

    pub fn keypair_public(&self) -> Option<&[u8; PUBLIC_KEY_SIZE]> {
        self.long_term.as_ref().map(KeyPair::public_key)
    }

    /// The remote peer's long-term public key.
    ///
    /// A client knows it from the start. A server learns it from a validated INITIATE.
    pub fn peer_public_key(&self) -> Option<&[u8; PUBLIC_KEY_SIZE]> {
        self.peer_public.as_ref()
    }

    /// The metadata sent by the remote peer, once its INITIATE or READY was accepted.
    pub fn peer_metadata(&self) -> Option<&Metadata> {
        self.peer_metadata.as_ref()
    }

    /// The server's current cookie key, or all zeros when there is none.
    ///
    /// The key only exists between sending WELCOME and receiving the first INITIATE.
    pub fn cookie_key(&self) -> Zeroizing<[u8; SECRETBOX_KEY_SIZE]> {
        match &self.beta {
            Automata::ExpectInitiate(state) => state
                .cookie_key
                .clone()
                .unwrap_or_else(|| Zeroizing::new([0u8; SECRETBOX_KEY_SIZE])),
            _ => Zeroizing::new([0u8; SECRETBOX_KEY_SIZE]),
        }
    }

    /// The short nonce counter value the next HELLO, INITIATE, READY or MESSAGE will carry.
    pub fn send_nonce(&self) -> u64 {
        self.send.peek()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> State {
        match &self.beta {
            Automata::Pending => State::Pending,
            Automata::ExpectHello => State::ExpectHello,
            Automata::ExpectWelcome(_) => State::ExpectWelcome,
            Automata::ExpectInitiate(_) => State::ExpectInitiate,
            Automata::ExpectReady(_) => State::ExpectReady,
            Automata::Connected(_) => State::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(&self.beta, Automata::Connected(_))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Advance the handshake by one step.
    ///
    /// A client starts the handshake with `execute(None)`, which returns HELLO. After that each
    /// inbound command is passed in and the returned command, if any, must be sent to the peer.
    /// `None` is a no-op in every other state.
    ///
    /// On error the engine is unchanged, except that a server always loses its cookie key once
    /// it has opened an INITIATE cookie.
    pub fn execute(&mut self, input: Option<&[u8]>) -> Result<Option<Vec<u8>>, ReceiveError> {
        let result = self.execute_inner(input);
        #[cfg(feature = "logging")]
        if let Err(e) = &result {
            self.app.event_log(Rejected(e));
        }
        result
    }

    fn execute_inner(&mut self, input: Option<&[u8]>) -> Result<Option<Vec<u8>>, ReceiveError> {
        use FaultType::*;
        let input = match input {
            Some(input) => input,
            None if matches!(self.beta, Automata::Pending) => return self.send_hello().map(Some),
            None => return Ok(None),
        };
        match Command::decode(input).map_err(|e| fault!(e))? {
            Command::Hello(hello) => {
                log!(self.app, ReceivedRawHello);
                self.on_hello(hello).map(Some)
            }
            Command::Welcome(welcome) => {
                log!(self.app, ReceivedRawWelcome);
                self.on_welcome(welcome).map(Some)
            }
            Command::Initiate(initiate) => {
                log!(self.app, ReceivedRawInitiate);
                self.on_initiate(initiate).map(Some)
            }
            Command::Ready(ready) => {
                log!(self.app, ReceivedRawReady);
                self.on_ready(ready).map(|_| None)
            }
            Command::Message(_) => Err(fault!(OutOfSequence)),
        }
    }

    /// The next send nonce, without consuming it. Call `self.send.advance()` once nothing else
    /// can fail.
    fn available_nonce(&mut self) -> Option<u64> {
        let n = self.send.available();
        if n.is_none() {
            log!(self.app, NonceSpaceExhausted);
        }
        n
    }

    /// Client, Pending -> ExpectWelcome.
    fn send_hello(&mut self) -> Result<Vec<u8>, ReceiveError> {
        let server_public = self.peer_public.ok_or(ReceiveError::MissingKeyPair)?;
        let ephemeral = KeyPair::generate::<C>(&mut self.rng);
        let n = self.available_nonce().ok_or(ReceiveError::ExhaustedNonceSpace)?;

        let sealed = C::PublicBox::seal(
            &server_public,
            ephemeral.secret(),
            &short_nonce(NONCE_PREFIX_HELLO, n),
            &[0u8; HELLO_SIGNATURE_SIZE],
        );
        if sealed.len() != HELLO_BOX_SIZE {
            return Err(ReceiveError::CapabilityFailure);
        }
        let hello = Command::Hello(Hello {
            client_ephemeral_public: *ephemeral.public_key(),
            nonce: n,
            signature_box: to_array(&sealed),
        });

        self.send.advance();
        self.beta = Automata::ExpectWelcome(Box::new(ExpectWelcomeState { ephemeral }));
        log!(self.app, SentHello(n));
        Ok(hello.encode())
    }

    /// Server, ExpectHello -> ExpectInitiate.
    fn on_hello(&mut self, hello: Hello) -> Result<Vec<u8>, ReceiveError> {
        use FaultType::*;
        if !matches!(self.beta, Automata::ExpectHello) {
            return Err(fault!(OutOfSequence));
        }
        let long_term = self.long_term.as_ref().ok_or(ReceiveError::MissingKeyPair)?;

        let signature = C::PublicBox::open(
            &hello.client_ephemeral_public,
            long_term.secret(),
            &short_nonce(NONCE_PREFIX_HELLO, hello.nonce),
            &hello.signature_box,
        )
        .ok_or_else(|| fault!(FailedAuth))?;
        if !secure_eq(&signature, &[0u8; HELLO_SIGNATURE_SIZE]) {
            return Err(fault!(FailedAuth));
        }
        if !self.recv.check(hello.nonce) {
            return Err(fault!(ReplayedNonce));
        }

        let ephemeral = KeyPair::generate::<C>(&mut self.rng);
        let mut cookie_key = Zeroizing::new([0u8; SECRETBOX_KEY_SIZE]);
        self.rng.fill_bytes(cookie_key.as_mut());

        // Cookie: C' + s' sealed under a key only this engine knows.
        let mut cookie_nonce = [0u8; LONG_NONCE_SIZE];
        self.rng.fill_bytes(&mut cookie_nonce);
        let mut cookie_plaintext = Zeroizing::new(ArrayVec::<u8, COOKIE_PLAINTEXT_SIZE>::new());
        cookie_plaintext.extend(hello.client_ephemeral_public);
        cookie_plaintext.extend(ephemeral.secret().iter().copied());
        let cookie_box = C::CookieBox::seal(
            &cookie_key,
            &long_nonce(NONCE_PREFIX_COOKIE, &cookie_nonce),
            &cookie_plaintext,
        );
        if cookie_box.len() != COOKIE_BOX_SIZE {
            return Err(ReceiveError::CapabilityFailure);
        }

        let mut welcome_plaintext = ArrayVec::<u8, WELCOME_PLAINTEXT_SIZE>::new();
        welcome_plaintext.extend(*ephemeral.public_key());
        welcome_plaintext.extend(cookie_nonce);
        welcome_plaintext.extend(cookie_box);
        let mut welcome_nonce = [0u8; LONG_NONCE_SIZE];
        self.rng.fill_bytes(&mut welcome_nonce);
        let sealed = C::PublicBox::seal(
            &hello.client_ephemeral_public,
            long_term.secret(),
            &long_nonce(NONCE_PREFIX_WELCOME, &welcome_nonce),
            &welcome_plaintext,
        );
        if sealed.len() != WELCOME_BOX_SIZE {
            return Err(ReceiveError::CapabilityFailure);
        }
        let welcome = Command::Welcome(Welcome { nonce: welcome_nonce, sealed: to_array(&sealed) });

        let shared = C::SharedBox::new(&hello.client_ephemeral_public, ephemeral.secret());
        self.recv.update(hello.nonce);
        self.beta = Automata::ExpectInitiate(Box::new(ExpectInitiateState {
            client_ephemeral: hello.client_ephemeral_public,
            ephemeral,
            cookie_key: Some(cookie_key),
            shared,
        }));
        log!(self.app, HelloIsAuthSentWelcome);
        Ok(welcome.encode())
    }

    /// Client, ExpectWelcome -> ExpectReady.
    fn on_welcome(&mut self, welcome: Welcome) -> Result<Vec<u8>, ReceiveError> {
        use FaultType::*;
        let state = match &self.beta {
            Automata::ExpectWelcome(state) => state,
            _ => return Err(fault!(OutOfSequence)),
        };
        let server_public = self.peer_public.ok_or(ReceiveError::MissingKeyPair)?;
        let long_term = self.long_term.as_ref().ok_or(ReceiveError::MissingKeyPair)?;

        let plaintext = C::PublicBox::open(
            &server_public,
            state.ephemeral.secret(),
            &long_nonce(NONCE_PREFIX_WELCOME, &welcome.nonce),
            &welcome.sealed,
        )
        .ok_or_else(|| fault!(FailedAuth))?;
        if plaintext.len() != WELCOME_PLAINTEXT_SIZE {
            return Err(ReceiveError::CapabilityFailure);
        }
        let server_ephemeral: [u8; PUBLIC_KEY_SIZE] = to_array(&plaintext);
        let cookie: [u8; COOKIE_SIZE] = to_array(&plaintext[PUBLIC_KEY_SIZE..]);

        // Vouch: C' sealed from C to S', proving the long-term key holder made this connection.
        let mut vouch_nonce = [0u8; LONG_NONCE_SIZE];
        self.rng.fill_bytes(&mut vouch_nonce);
        let vouch = C::PublicBox::seal(
            &server_ephemeral,
            long_term.secret(),
            &long_nonce(NONCE_PREFIX_VOUCH, &vouch_nonce),
            state.ephemeral.public_key(),
        );
        if vouch.len() != VOUCH_BOX_SIZE {
            return Err(ReceiveError::CapabilityFailure);
        }

        let mut initiate_plaintext = Vec::with_capacity(INITIATE_PLAINTEXT_MIN_SIZE + self.local_metadata.len());
        initiate_plaintext.extend_from_slice(long_term.public_key());
        initiate_plaintext.extend_from_slice(&vouch_nonce);
        initiate_plaintext.extend_from_slice(&vouch);
        initiate_plaintext.extend_from_slice(&self.local_metadata);

        let shared = C::SharedBox::new(&server_ephemeral, state.ephemeral.secret());
        let n = match self.send.available() {
            Some(n) => n,
            None => {
                log!(self.app, NonceSpaceExhausted);
                return Err(ReceiveError::ExhaustedNonceSpace);
            }
        };
        let sealed = shared.seal(&short_nonce(NONCE_PREFIX_INITIATE, n), &initiate_plaintext);
        if sealed.len() != initiate_plaintext.len() + BOX_MAC_SIZE {
            return Err(ReceiveError::CapabilityFailure);
        }
        let initiate = Command::Initiate(Initiate { cookie, nonce: n, sealed });

        self.send.advance();
        self.beta = Automata::ExpectReady(Box::new(shared));
        log!(self.app, WelcomeIsAuthSentInitiate(n));
        Ok(initiate.encode())
    }

    /// Server, ExpectInitiate -> Connected.
    fn on_initiate(&mut self, initiate: Initiate) -> Result<Vec<u8>, ReceiveError> {
        use FaultType::*;
        let state = match &mut self.beta {
            Automata::ExpectInitiate(state) => state,
            // The cookie key died with the first INITIATE, so nothing here can authenticate.
            Automata::Connected(_) if self.role == Role::Server => return Err(fault!(FailedAuth)),
            _ => return Err(fault!(OutOfSequence)),
        };
        if initiate.sealed.len() - INITIATE_BOX_MIN_SIZE > self.settings.max_metadata_size {
            return Err(fault!(MalformedCommand));
        }

        // The cookie key is gone after this point whatever happens next.
        let cookie_key = state.cookie_key.take().ok_or_else(|| fault!(FailedAuth))?;
        let cookie = C::CookieBox::open(
            &cookie_key,
            &long_nonce(NONCE_PREFIX_COOKIE, &to_array(&initiate.cookie)),
            &initiate.cookie[LONG_NONCE_SIZE..],
        );
        drop(cookie_key);
        log!(self.app, CookieKeyErased);
        let cookie = Zeroizing::new(cookie.ok_or_else(|| fault!(FailedAuth))?);
        if cookie.len() != COOKIE_PLAINTEXT_SIZE
            || !secure_eq(&cookie[..PUBLIC_KEY_SIZE], &state.client_ephemeral)
            || !secure_eq(&cookie[PUBLIC_KEY_SIZE..], state.ephemeral.secret())
        {
            return Err(fault!(FailedAuth));
        }

        let plaintext = state
            .shared
            .open(&short_nonce(NONCE_PREFIX_INITIATE, initiate.nonce), &initiate.sealed)
            .ok_or_else(|| fault!(FailedAuth))?;
        if plaintext.len() < INITIATE_PLAINTEXT_MIN_SIZE {
            return Err(ReceiveError::CapabilityFailure);
        }
        if !self.recv.check(initiate.nonce) {
            return Err(fault!(ReplayedNonce));
        }

        let mut i = 0;
        let client_public: [u8; PUBLIC_KEY_SIZE] = to_array(&plaintext);
        i += PUBLIC_KEY_SIZE;
        let vouch_nonce: [u8; LONG_NONCE_SIZE] = to_array(&plaintext[i..]);
        i += LONG_NONCE_SIZE;
        let j = i + VOUCH_BOX_SIZE;
        let vouch = C::PublicBox::open(
            &client_public,
            state.ephemeral.secret(),
            &long_nonce(NONCE_PREFIX_VOUCH, &vouch_nonce),
            &plaintext[i..j],
        )
        .ok_or_else(|| fault!(FailedAuth))?;
        if !secure_eq(&vouch, &state.client_ephemeral) {
            return Err(fault!(FailedAuth));
        }
        let metadata = Metadata::decode(&plaintext[j..]).map_err(|e| fault!(e))?;

        let n = match self.send.available() {
            Some(n) => n,
            None => {
                log!(self.app, NonceSpaceExhausted);
                return Err(ReceiveError::ExhaustedNonceSpace);
            }
        };
        let sealed = state.shared.seal(&short_nonce(NONCE_PREFIX_READY, n), &self.local_metadata);
        if sealed.len() != self.local_metadata.len() + BOX_MAC_SIZE {
            return Err(ReceiveError::CapabilityFailure);
        }
        let ready = Command::Ready(Ready { nonce: n, sealed });

        self.send.advance();
        self.recv.update(initiate.nonce);
        self.peer_public = Some(client_public);
        log!(self.app, InitiateIsAuthSentReady(&client_public, n));
        if let Automata::ExpectInitiate(state) = mem::replace(&mut self.beta, Automata::Pending) {
            self.beta = Automata::Connected(Box::new(state.shared));
        }
        self.connected(metadata);
        Ok(ready.encode())
    }

    /// Client, ExpectReady -> Connected.
    fn on_ready(&mut self, ready: Ready) -> Result<(), ReceiveError> {
        use FaultType::*;
        let shared = match &self.beta {
            Automata::ExpectReady(shared) => shared,
            _ => return Err(fault!(OutOfSequence)),
        };
        if ready.sealed.len() - BOX_MAC_SIZE > self.settings.max_metadata_size {
            return Err(fault!(MalformedCommand));
        }
        let plaintext = shared
            .open(&short_nonce(NONCE_PREFIX_READY, ready.nonce), &ready.sealed)
            .ok_or_else(|| fault!(FailedAuth))?;
        if !self.recv.check(ready.nonce) {
            return Err(fault!(ReplayedNonce));
        }
        let metadata = Metadata::decode(&plaintext).map_err(|e| fault!(e))?;

        self.recv.update(ready.nonce);
        log!(self.app, ReadyIsAuth);
        if let Automata::ExpectReady(shared) = mem::replace(&mut self.beta, Automata::Pending) {
            self.beta = Automata::Connected(shared);
        }
        self.connected(metadata);
        Ok(())
    }

    fn connected(&mut self, metadata: Metadata) {
        let _metadata = self.peer_metadata.insert(metadata);
        log!(self.app, Connected(self.role, _metadata));
    }

    /// Encrypt one payload into a MESSAGE command for the remote peer.
    pub fn encode(&mut self, payload: &[u8]) -> Result<Vec<u8>, SendError> {
        if !self.is_connected() {
            return Err(SendError::SessionNotEstablished);
        }
        if payload.len() > self.settings.max_message_size {
            return Err(SendError::DataTooLarge);
        }
        let n = self.available_nonce().ok_or(SendError::ExhaustedNonceSpace)?;
        let Automata::Connected(shared) = &self.beta else {
            return Err(SendError::SessionNotEstablished);
        };
        self.send.advance();
        let prefix = match self.role {
            Role::Client => NONCE_PREFIX_MESSAGE_CLIENT,
            Role::Server => NONCE_PREFIX_MESSAGE_SERVER,
        };
        let sealed = shared.seal(&short_nonce(prefix, n), payload);
        log!(self.app, SentMessage(n, payload.len()));
        Ok(Command::Message(Message { nonce: n, sealed }).encode())
    }

    /// Authenticate and decrypt one MESSAGE command from the remote peer, returning its payload.
    pub fn decode(&mut self, frame: &[u8]) -> Result<Vec<u8>, ReceiveError> {
        let result = self.decode_inner(frame);
        #[cfg(feature = "logging")]
        if let Err(e) = &result {
            self.app.event_log(Rejected(e));
        }
        result
    }

    fn decode_inner(&mut self, frame: &[u8]) -> Result<Vec<u8>, ReceiveError> {
        use FaultType::*;
        let Automata::Connected(shared) = &self.beta else {
            return Err(ReceiveError::SessionNotEstablished);
        };
        let message = match Command::decode(frame).map_err(|e| fault!(e))? {
            Command::Message(message) => message,
            _ => return Err(fault!(MalformedCommand)),
        };
        if message.sealed.len() - BOX_MAC_SIZE > self.settings.max_message_size {
            return Err(fault!(MalformedCommand));
        }
        let prefix = match self.role {
            Role::Client => NONCE_PREFIX_MESSAGE_SERVER,
            Role::Server => NONCE_PREFIX_MESSAGE_CLIENT,
        };
        let payload = shared
            .open(&short_nonce(prefix, message.nonce), &message.sealed)
            .ok_or_else(|| fault!(FailedAuth))?;
        if !self.recv.update(message.nonce) {
            return Err(fault!(ReplayedNonce));
        }
        log!(self.app, ReceivedMessage(message.nonce, payload.len()));
        Ok(payload)
    }
}
