// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! patze-daemon: the control plane process. HTTP ingest/snapshot/SSE/command
//! surfaces, the Bridge Lifecycle Manager, and scheduled-task persistence
//! (§2, §4).

pub mod bridge_registry;
pub mod env;
pub mod http;
pub mod lifecycle;
pub mod state;
