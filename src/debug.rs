//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::debug;

use crate::address::Prefix;
use crate::metric::Metric;

// Route table core debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    RouteCreate(&'a Prefix, &'a Metric),
    RouteRefresh(&'a Prefix, &'a Metric),
    RouteInstall(&'a Prefix, &'a Metric),
    RouteUninstall(&'a Prefix),
    RouteFlush(&'a Prefix),
    RouteUnfeasible(&'a Prefix, &'a Metric, &'a Metric),
    RouteTimeout(&'a Prefix),
    RouteGcTimeout(&'a Prefix),
    TriggeredUpdate(&'a Prefix, bool),
    SeqnoRequest(&'a Prefix),
}

// ===== impl Debug =====

impl<'a> Debug<'a> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::RouteCreate(prefix, metric) => {
                debug!(%prefix, %metric, "{}", self);
            }
            Debug::RouteRefresh(prefix, metric) => {
                debug!(%prefix, %metric, "{}", self);
            }
            Debug::RouteInstall(prefix, metric) => {
                debug!(%prefix, %metric, "{}", self);
            }
            Debug::RouteUninstall(prefix) => {
                debug!(%prefix, "{}", self);
            }
            Debug::RouteFlush(prefix) => {
                debug!(%prefix, "{}", self);
            }
            Debug::RouteUnfeasible(prefix, ours, theirs) => {
                debug!(%prefix, our_metric = %ours, their_refmetric = %theirs, "{}", self);
            }
            Debug::RouteTimeout(prefix) => {
                debug!(%prefix, "{}", self);
            }
            Debug::RouteGcTimeout(prefix) => {
                debug!(%prefix, "{}", self);
            }
            Debug::TriggeredUpdate(prefix, urgent) => {
                debug!(%prefix, %urgent, "{}", self);
            }
            Debug::SeqnoRequest(prefix) => {
                debug!(%prefix, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::RouteCreate(..) => write!(f, "route created"),
            Debug::RouteRefresh(..) => write!(f, "route refreshed"),
            Debug::RouteInstall(..) => write!(f, "route installed"),
            Debug::RouteUninstall(..) => write!(f, "route uninstalled"),
            Debug::RouteFlush(..) => write!(f, "route flushed"),
            Debug::RouteUnfeasible(..) => {
                write!(f, "unfeasible update for installed route")
            }
            Debug::RouteTimeout(..) => write!(f, "route timed out"),
            Debug::RouteGcTimeout(..) => write!(f, "route garbage-collected"),
            Debug::TriggeredUpdate(..) => write!(f, "triggered update"),
            Debug::SeqnoRequest(..) => write!(f, "seqno request sent"),
        }
    }
}
