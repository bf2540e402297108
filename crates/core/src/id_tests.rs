// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

crate::define_string_id! {
    /// Test opaque ID type for macro verification.
    pub struct TestStringId;
}

#[test]
fn define_id_hash_map_lookup() {
    let mut map = HashMap::new();
    map.insert(TestId::from_string("tst-k"), 42);
    assert_eq!(map.get("tst-k"), Some(&42));
}

#[test]
fn define_id_new_has_prefix() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn define_id_display_roundtrips_through_string() {
    let id = TestId::from_string("tst-abc");
    assert_eq!(id.to_string(), "tst-abc");
    assert_eq!(TestId::from(id.to_string()).as_str(), "tst-abc");
}

#[test]
fn short_fn_on_str() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}

#[test]
fn define_string_id_hash_map_lookup() {
    let mut map = HashMap::new();
    map.insert(TestStringId::new("m1"), "online");
    assert_eq!(map.get("m1"), Some(&"online"));
}

#[test]
fn define_string_id_preserves_arbitrary_strings() {
    let id = TestStringId::new("anything-the-bridge-sends-42");
    assert_eq!(id.as_str(), "anything-the-bridge-sends-42");
    assert_eq!(id.to_string(), "anything-the-bridge-sends-42");
}
