// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! On-disk persistence for the Bridge Command Queue and Task store (§4.11,
//! §6.4). Every store in this crate follows the same atomic write protocol:
//! write to `<path>.tmp`, optionally back up the previous file to
//! `<path>.bak`, then rename the tmp file into place.

pub mod atomic;
pub mod command_store;
pub mod task_snapshot_store;
pub mod task_store;

pub use atomic::StorageError;
pub use command_store::CommandStore;
pub use task_snapshot_store::TaskSnapshotStore;
pub use task_store::TaskStore;
