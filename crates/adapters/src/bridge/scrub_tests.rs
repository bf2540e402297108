// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn scrubs_token_assignment() {
    assert_eq!(scrub("starting TOKEN=abc123 now"), "starting TOKEN=*** now");
}

#[test]
fn scrubs_password_and_control_plane_token() {
    let input = "PASSWORD=hunter2 CONTROL_PLANE_TOKEN=xyz";
    assert_eq!(scrub(input), "PASSWORD=*** CONTROL_PLANE_TOKEN=***");
}

#[test]
fn scrubs_bearer_header() {
    assert_eq!(scrub("Authorization: Bearer abc.def.ghi"), "Authorization: Bearer ***");
}

#[test]
fn leaves_unrelated_text_untouched() {
    assert_eq!(scrub("patze-bridge v1.2.3 started ok"), "patze-bridge v1.2.3 started ok");
}

#[test]
fn ring_buffer_evicts_oldest_past_capacity() {
    let mut buf = LogRingBuffer::new(2);
    buf.push("one");
    buf.push("two");
    buf.push("three");
    assert_eq!(buf.lines().collect::<Vec<_>>(), vec!["two", "three"]);
}

#[test]
fn ring_buffer_scrubs_before_storing() {
    let mut buf = LogRingBuffer::new(10);
    buf.push("TOKEN=secret");
    assert_eq!(buf.lines().collect::<Vec<_>>(), vec!["TOKEN=***"]);
}
