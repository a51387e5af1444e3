//! Demo client: several concurrent submitters, each with its own ack reader.
//!
//! Run with `cargo run --example submit_client` against a running
//! `submit_server` (optionally set `FRAMEWIRE_ADDR`, default `127.0.0.1:8888`).

use std::env;
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

use framewire::transport::spawn_receiver;
use framewire::{CancellationToken, Connection, ConnectionConfig, DEFAULT_PORT, Packet, PacketId, Submit};
use uuid::Uuid;

const CLIENTS: usize = 5;
const SUBMITS_PER_CLIENT: u64 = 10;

fn main() {
    let addr = env::var("FRAMEWIRE_ADDR").unwrap_or_else(|_| format!("127.0.0.1:{DEFAULT_PORT}"));

    let clients: Vec<_> = (1..=CLIENTS)
        .map(|client| {
            let addr = addr.clone();
            thread::spawn(move || {
                if let Err(err) = start_client(client, &addr) {
                    println!("[client {client}]: error: {err}");
                }
            })
        })
        .collect();

    for client in clients {
        let _ = client.join();
    }
}

fn start_client(client: usize, addr: &str) -> framewire::Result<()> {
    let config = ConnectionConfig::default().with_read_timeout(Some(Duration::from_secs(1)));
    let mut conn = Connection::connect(addr, &config)?;
    println!("[client {client}]: dial ok");

    let receiver = spawn_receiver(conn.reader()?, CancellationToken::new(), move |packet| {
        match packet {
            Packet::SubmitAck(ack) => {
                println!(
                    "[client {client}]: the result of submit ack[{}] is {}",
                    ack.id, ack.result
                );
                ControlFlow::Continue(())
            }
            other => {
                println!("[client {client}]: unexpected {} packet", other.command());
                ControlFlow::Break(())
            }
        }
    })?;

    for seq in 1..=SUBMITS_PER_CLIENT {
        let payload = Uuid::new_v4().simple().to_string();
        let submit = Packet::Submit(Submit::new(PacketId::from_sequence(seq), payload.into_bytes()));
        let frame_len = conn.send(&submit)?;

        if let Some(submit) = submit.as_submit() {
            println!(
                "[client {client}]: send submit id = {}, payload = {}, frame length = {frame_len}",
                submit.id,
                String::from_utf8_lossy(&submit.payload)
            );
        }
        thread::sleep(Duration::from_secs(1));
    }

    let report = receiver.shutdown()?;
    println!(
        "[client {client}]: exit ok ({} acks, {} idle deadlines)",
        report.packets, report.timeouts
    );
    conn.close()
}
