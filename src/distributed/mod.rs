//! Splices a remote node into the local address space over TCP (§4.6).
//!
//! A connection is a triad of processes — sender, receiver, connection
//! supervisor — spawned and linked the way `distributer.c` wires up
//! `actor_distributer_connect_to_node`/`_listen`. `Node::connect_to_node`
//! and `Node::listen` (in [`handshake`]) are the only entry points;
//! everything else here runs as ordinary processes once a triad exists.

mod handshake;
mod receiver;
mod sender;
mod supervisor;
mod wire;
