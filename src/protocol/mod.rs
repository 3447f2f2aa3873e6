// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Message bus - wire shapes, binary datagrams and transports

mod messages;
mod datagram;
mod transport;

pub use messages::*;
pub use datagram::*;
pub use transport::*;
