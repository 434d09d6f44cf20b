//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

use crate::address::Prefix;

// Route table core errors. These are reject reasons (spec §7): the update is
// always dropped, never propagated upward as a panic or aborted process.
#[derive(Debug)]
pub enum Error {
    MartianPrefix(Prefix),
    FilterRejected(Prefix),
    UnknownRetraction(Prefix),
    SourceAllocationFailed(Prefix),
    RouteTableFull(Prefix),
}

// Kernel FIB adapter errors (spec §6/§7).
#[derive(Debug)]
pub enum KernelError {
    /// `errno == EEXIST` on an ADD: not actually an error, the FIB already
    /// has the entry we wanted.
    Exists,
    /// Any other kernel failure, carrying the platform `errno`-ish value.
    Other(i32),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::MartianPrefix(prefix) => {
                warn!(%prefix, "{}", self);
            }
            Error::FilterRejected(prefix) => {
                warn!(%prefix, "{}", self);
            }
            Error::UnknownRetraction(prefix) => {
                warn!(%prefix, "{}", self);
            }
            Error::SourceAllocationFailed(prefix) => {
                warn!(%prefix, "{}", self);
            }
            Error::RouteTableFull(prefix) => {
                warn!(%prefix, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MartianPrefix(..) => {
                write!(f, "rejecting martian prefix")
            }
            Error::FilterRejected(..) => {
                write!(f, "update rejected by input filter")
            }
            Error::UnknownRetraction(..) => {
                write!(f, "retraction for a prefix we never saw")
            }
            Error::SourceAllocationFailed(..) => {
                write!(f, "failed to allocate source table entry")
            }
            Error::RouteTableFull(..) => {
                write!(f, "route table full, ignoring update")
            }
        }
    }
}

impl std::error::Error for Error {}

// ===== impl KernelError =====

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::Exists => write!(f, "entry already exists"),
            KernelError::Other(errno) => {
                write!(f, "kernel route operation failed (errno {errno})")
            }
        }
    }
}

impl std::error::Error for KernelError {}
