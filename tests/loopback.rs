use std::net::TcpListener;
use std::ops::ControlFlow;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use framewire::transport::spawn_receiver;
use framewire::{
    CancellationToken, Connection, ConnectionConfig, Packet, PacketId, Submit, SubmitAck,
    SubmitPool,
};

const SUBMITS_PER_CLIENT: u64 = 10;

fn config() -> ConnectionConfig {
    ConnectionConfig::default().with_read_timeout(Some(Duration::from_millis(50)))
}

/// Acknowledge every submit until the peer disconnects; returns the number handled.
fn serve(mut conn: Connection) -> u64 {
    let mut handled = 0;
    loop {
        match conn.poll() {
            Ok(Some(Packet::Submit(submit))) => {
                let ack = SubmitAck::new(submit.id, 0);
                conn.registry().pool().release(submit);
                conn.send(&Packet::SubmitAck(ack)).unwrap();
                handled += 1;
            }
            Ok(Some(other)) => panic!("unexpected packet: {other:?}"),
            Ok(None) => {}
            Err(err) if err.is_disconnect() => return handled,
            Err(err) => panic!("server error: {err}"),
        }
    }
}

fn spawn_server(clients: usize, pool: SubmitPool) -> (std::net::SocketAddr, thread::JoinHandle<u64>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let workers: Vec<_> = (0..clients)
            .map(|_| {
                let (stream, _) = listener.accept().unwrap();
                let conn = Connection::with_pool(stream, &config(), pool.clone()).unwrap();
                thread::spawn(move || serve(conn))
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).sum()
    });
    (addr, handle)
}

fn run_client(addr: std::net::SocketAddr, client: u64) -> Vec<SubmitAck> {
    let mut conn = Connection::connect(addr, &config()).unwrap();
    let (tx, rx) = mpsc::channel();
    let receiver = spawn_receiver(conn.reader().unwrap(), CancellationToken::new(), move |packet| {
        match packet {
            Packet::SubmitAck(ack) => {
                tx.send(ack).unwrap();
                ControlFlow::Continue(())
            }
            _ => ControlFlow::Break(()),
        }
    })
    .unwrap();

    for seq in 1..=SUBMITS_PER_CLIENT {
        let payload = format!("client-{client}-payload-{seq}");
        conn.send(&Packet::Submit(Submit::new(
            PacketId::from_sequence(seq),
            payload.into_bytes(),
        )))
        .unwrap();
    }

    let mut acks = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while acks.len() < SUBMITS_PER_CLIENT as usize && Instant::now() < deadline {
        if let Ok(ack) = rx.recv_timeout(Duration::from_millis(100)) {
            acks.push(ack);
        }
    }

    let report = receiver.shutdown().unwrap();
    assert_eq!(report.packets, SUBMITS_PER_CLIENT);
    conn.close().unwrap();
    acks
}

#[test]
fn submits_are_acknowledged_in_order() {
    let (addr, server) = spawn_server(1, SubmitPool::new(8));

    let acks = run_client(addr, 1);
    let ids: Vec<_> = acks.iter().map(|ack| ack.id).collect();
    let expected: Vec<_> = (1..=SUBMITS_PER_CLIENT).map(PacketId::from_sequence).collect();
    assert_eq!(ids, expected);
    assert!(acks.iter().all(|ack| ack.result == 0));

    assert_eq!(server.join().unwrap(), SUBMITS_PER_CLIENT);
}

#[test]
fn concurrent_clients_share_one_pool() {
    const CLIENTS: usize = 5;
    let pool = SubmitPool::new(4);
    let (addr, server) = spawn_server(CLIENTS, pool.clone());

    let clients: Vec<_> = (1..=CLIENTS as u64)
        .map(|client| thread::spawn(move || run_client(addr, client)))
        .collect();
    for client in clients {
        assert_eq!(client.join().unwrap().len(), SUBMITS_PER_CLIENT as usize);
    }

    assert_eq!(server.join().unwrap(), SUBMITS_PER_CLIENT * CLIENTS as u64);
    assert!(pool.idle() <= pool.max_idle());
}

#[test]
fn shutdown_returns_within_a_few_read_deadlines() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || listener.accept().unwrap());

    let conn = Connection::connect(addr, &config()).unwrap();
    let _peer = server.join().unwrap();
    let receiver = spawn_receiver(conn.reader().unwrap(), CancellationToken::new(), |_| {
        ControlFlow::Continue(())
    })
    .unwrap();

    thread::sleep(Duration::from_millis(120));
    let started = Instant::now();
    let report = receiver.shutdown().unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(report.timeouts >= 1);
    assert_eq!(report.packets, 0);
    conn.close().unwrap();
}
