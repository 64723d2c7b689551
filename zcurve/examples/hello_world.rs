/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * (c) ZeroTier, Inc.
 * https://www.zerotier.com/
 */
use std::sync::mpsc;
use std::thread;

use rand_core::OsRng;
use zeroize::Zeroizing;

use zcurve::application::{ApplicationLayer, Metadata, Settings};
use zcurve::crypto::CurveBox;
use zcurve::crypto_impl::{CrateSalsaBox, DefaultCrypto};
use zcurve::Engine;

struct TestApplication {
    name: &'static str,
}

impl ApplicationLayer for TestApplication {
    #[cfg(feature = "logging")]
    fn event_log(&mut self, event: zcurve::LogEvent<'_>) {
        println!(">[{}] {:?}", self.name, event);
    }
}

type TestEngine = Engine<DefaultCrypto, TestApplication>;

fn client_main(server_public: [u8; 32], out: mpsc::Sender<Vec<u8>>, input: mpsc::Receiver<Vec<u8>>) -> Vec<u8> {
    let settings = Settings::new().with_metadata(Metadata::new().with("Socket-Type", "DEALER"));
    let mut client = TestEngine::new_client(TestApplication { name: "client" }, OsRng, settings, &server_public).unwrap();
    client.keypair_new();

    let hello = client.execute(None).unwrap().unwrap();
    out.send(hello).unwrap();
    while !client.is_connected() {
        let command = input.recv().unwrap();
        if let Some(reply) = client.execute(Some(&command)).unwrap() {
            out.send(reply).unwrap();
        }
    }
    println!("[client] connected, server is a {:?}", client.peer_metadata().unwrap().get_str("Socket-Type"));

    out.send(client.encode(b"Hello, World").unwrap()).unwrap();
    client.decode(&input.recv().unwrap()).unwrap()
}

fn server_main(
    server_keys: ([u8; 32], Zeroizing<[u8; 32]>),
    out: mpsc::Sender<Vec<u8>>,
    input: mpsc::Receiver<Vec<u8>>,
) -> Vec<u8> {
    let settings = Settings::new().with_metadata(Metadata::new().with("Socket-Type", "ROUTER"));
    let mut server = TestEngine::new_server(TestApplication { name: "server" }, OsRng, settings).unwrap();
    server.keypair_load(&server_keys.0, &server_keys.1);

    while !server.is_connected() {
        let command = input.recv().unwrap();
        if let Some(reply) = server.execute(Some(&command)).unwrap() {
            out.send(reply).unwrap();
        }
    }
    println!("[server] connected to {:02x?}", &server.peer_public_key().unwrap()[..8]);

    let received = server.decode(&input.recv().unwrap()).unwrap();
    out.send(server.encode(b"Hello, World").unwrap()).unwrap();
    received
}

fn core() -> (Vec<u8>, Vec<u8>) {
    // Raw key bytes, as they would come out of a key file.
    let server_keys = CrateSalsaBox::keypair(&mut OsRng);
    let server_public = server_keys.0;

    let (client_out, server_in) = mpsc::channel::<Vec<u8>>();
    let (server_out, client_in) = mpsc::channel::<Vec<u8>>();

    thread::scope(|ts| {
        let server = ts.spawn(move || server_main(server_keys, server_out, server_in));
        let client = ts.spawn(move || client_main(server_public, client_out, client_in));
        (client.join().unwrap(), server.join().unwrap())
    })
}

fn main() {
    let (client_received, server_received) = core();
    println!("[client] received {:?}", String::from_utf8_lossy(&client_received));
    println!("[server] received {:?}", String::from_utf8_lossy(&server_received));
}

#[test]
fn hello_world() {
    let (client_received, server_received) = core();
    assert_eq!(client_received, b"Hello, World");
    assert_eq!(server_received, b"Hello, World");
}
