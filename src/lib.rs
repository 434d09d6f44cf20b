//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The route table core of a Babel (RFC 8966) distance-vector routing
//! daemon: the set of known routes to destination prefixes learned from
//! neighbours, the at-most-one-installed selection policy with hysteresis
//! and source-stickiness, the feasibility condition that prevents routing
//! loops, and the triggered-update/seqno-request feedback loop that keeps
//! all of it converging.
//!
//! Everything outside of that core — hello/IHU link estimation, wire-format
//! parsing, kernel netlink plumbing, CLI/YANG configuration — is modelled as
//! a collaborator trait ([`kernel::KernelFib`], [`message::MessageIo`],
//! [`xroute::XrouteTable`], [`request::RequestTable`], [`filter::InputFilter`])
//! injected into [`Rib`], the facade tying every component together.

pub mod address;
pub mod config;
pub mod debug;
pub mod error;
pub mod feasibility;
pub mod filter;
pub mod installer;
pub mod kernel;
pub mod maintenance;
pub mod message;
pub mod metric;
pub mod neighbor;
pub mod request;
pub mod rib;
pub mod route;
pub mod selector;
pub mod source;
pub mod update;
pub mod xroute;

pub use crate::address::{Address, Clock, Prefix, SystemClock};
pub use crate::config::Config;
pub use crate::error::{Error, KernelError};
pub use crate::filter::InputFilter;
pub use crate::kernel::{KernelFib, KernelOp, KernelRoute};
pub use crate::message::MessageIo;
pub use crate::metric::Metric;
pub use crate::neighbor::{Neighbour, NeighbourHandle, NeighbourTable};
pub use crate::request::RequestTable;
pub use crate::rib::Rib;
pub use crate::route::{Route, RouteHandle, RouteStore};
pub use crate::source::{Source, SourceHandle, SourceTable};
pub use crate::xroute::XrouteTable;
