//! Demo server: acknowledges every submit it receives.
//!
//! Run with `cargo run --example submit_server` (optionally set
//! `FRAMEWIRE_ADDR`, default `0.0.0.0:8888`).

use std::env;
use std::net::TcpListener;
use std::thread;

use framewire::{Connection, ConnectionConfig, DEFAULT_PORT, Packet, SubmitAck, SubmitPool};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = env::var("FRAMEWIRE_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{DEFAULT_PORT}"));
    let listener = TcpListener::bind(&addr)?;
    let config = ConnectionConfig::default();
    let pool = SubmitPool::default();
    println!("framewire submit server listening on {addr}");

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                println!("accept error: {err}");
                break;
            }
        };
        match Connection::with_pool(stream, &config, pool.clone()) {
            Ok(conn) => {
                thread::spawn(move || handle_conn(conn));
            }
            Err(err) => println!("connection setup error: {err}"),
        }
    }

    Ok(())
}

fn handle_conn(mut conn: Connection) {
    let peer = conn.peer_addr();
    println!("[{peer}] connected");

    loop {
        let packet = match conn.poll() {
            Ok(Some(packet)) => packet,
            // Read deadline expired; nothing to do between frames.
            Ok(None) => continue,
            Err(err) if err.is_disconnect() => {
                println!("[{peer}] disconnected");
                return;
            }
            Err(err) => {
                println!("[{peer}] read error: {err}");
                return;
            }
        };

        let submit = match packet {
            Packet::Submit(submit) => submit,
            other => {
                println!("[{peer}] ignoring {} packet", other.command());
                continue;
            }
        };

        println!(
            "[{peer}] recv submit id = {}, payload = {}",
            submit.id,
            String::from_utf8_lossy(&submit.payload)
        );
        let ack = SubmitAck::new(submit.id, 0);
        conn.registry().pool().release(submit);

        if let Err(err) = conn.send(&Packet::SubmitAck(ack)) {
            println!("[{peer}] write error: {err}");
            return;
        }
    }
}
