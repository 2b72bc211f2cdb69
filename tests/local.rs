//! Local (single-node) end-to-end scenarios.

use std::sync::mpsc;
use std::time::Duration;

use glia::{Error, ErrorCode, Node};

#[test]
fn local_ping_pong() {
    let node = Node::create(0, 16).unwrap();
    let (result_tx, result_rx) = mpsc::channel();

    let p2 = node
        .spawn(|handle| {
            let ping = handle.receive(10.0)?;
            handle.send(ping.source_nid, ping.source_pid, 1, b"Pong!")
        })
        .unwrap();

    node.spawn(move |handle| {
        handle.send(0, p2, 1, b"Ping!")?;
        let pong = handle.receive(10.0)?;
        result_tx.send(pong.bytes).unwrap();
        Ok(())
    })
    .unwrap();

    let observed = result_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(observed, b"Pong!");
    node.release();
}

#[test]
fn supervision_on_error() {
    let node = Node::create(0, 16).unwrap();
    let (done_tx, done_rx) = mpsc::channel();

    let supervisor = node
        .spawn(move |handle| {
            let msg = handle.receive(20.0)?;
            let info = msg.as_exit_info().expect("exit message payload");
            done_tx.send(info).unwrap();
            Ok(())
        })
        .unwrap();

    node.spawn(move |handle| {
        handle.link(0, supervisor);
        Err(Error::generic("worker failed on purpose"))
    })
    .unwrap();

    let info = done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(info.nid, 0);
    assert_eq!(info.error, ErrorCode::Generic);
    node.release();
}

#[test]
fn mailbox_fifo_under_contention() {
    const SENDERS: u32 = 4;
    const MESSAGES: u32 = 1000;

    let node = Node::create(0, 16).unwrap();
    let (done_tx, done_rx) = mpsc::channel();

    let receiver = node
        .spawn(move |handle| {
            let mut next = vec![0u32; SENDERS as usize];
            let mut received = 0u32;
            while received < SENDERS * MESSAGES {
                let msg = handle.receive(10.0)?;
                let sender_idx = msg.source_pid as usize;
                let value = u32::from_le_bytes(msg.bytes[..4].try_into().unwrap());
                assert_eq!(value, next[sender_idx], "out-of-order message from sender {sender_idx}");
                next[sender_idx] += 1;
                received += 1;
            }
            done_tx.send(()).unwrap();
            Ok(())
        })
        .unwrap();

    for _ in 0..SENDERS {
        node.spawn(move |handle| {
            for i in 0..MESSAGES {
                handle.send(0, receiver, 1, &i.to_le_bytes())?;
            }
            Ok(())
        })
        .unwrap();
    }

    done_rx.recv_timeout(Duration::from_secs(10)).unwrap();
    node.release();
}

#[test]
fn receive_zero_timeout_on_empty_mailbox_is_immediate() {
    let node = Node::create(0, 4).unwrap();
    let (done_tx, done_rx) = mpsc::channel();
    node.spawn(move |handle| {
        let start = std::time::Instant::now();
        let result = handle.receive(0.0);
        done_tx.send((result.is_err(), start.elapsed())).unwrap();
        Ok(())
    })
    .unwrap();

    let (timed_out, elapsed) = done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(timed_out);
    assert!(elapsed < Duration::from_millis(200));
    node.release();
}

#[test]
fn spawning_beyond_capacity_is_no_slots() {
    let node = Node::create(0, 1).unwrap();
    node.spawn(|handle| {
        let _ = handle.receive(5.0);
        Ok(())
    })
    .unwrap();

    let err = node.spawn(|_| Ok(())).unwrap_err();
    assert!(matches!(err, Error::NoSlots));
    node.release();
}

#[test]
fn panicking_body_surfaces_as_generic_exit() {
    let node = Node::create(0, 8).unwrap();
    let (done_tx, done_rx) = mpsc::channel();

    let supervisor = node
        .spawn(move |handle| {
            let msg = handle.receive(5.0)?;
            let info = msg.as_exit_info().unwrap();
            done_tx.send(info.error).unwrap();
            Ok(())
        })
        .unwrap();

    node.spawn(move |handle| {
        handle.link(0, supervisor);
        panic!("process body panicked on purpose");
    })
    .unwrap();

    let error = done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(error, ErrorCode::Generic);
    node.release();
}
