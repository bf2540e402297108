// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret scrubbing for captured remote stdout/stderr before it enters a
//! bridge's ring buffer (§4.8).

const PATTERNS: &[&str] = &["TOKEN=", "PASSWORD=", "CONTROL_PLANE_TOKEN=", "Bearer "];

/// Replace the value half of each `KEY=value` (or `Bearer <token>`) match
/// with `***`, scanning line by line so a secret never straddles a token
/// boundary built from multiple lines.
pub fn scrub(text: &str) -> String {
    text.lines().map(scrub_line).collect::<Vec<_>>().join("\n")
}

fn scrub_line(line: &str) -> String {
    let mut out = line.to_string();
    for pattern in PATTERNS {
        out = scrub_pattern(&out, pattern);
    }
    out
}

fn scrub_pattern(line: &str, pattern: &str) -> String {
    let mut result = String::new();
    let mut rest = line;
    while let Some(idx) = rest.find(pattern) {
        let (before, after_marker) = rest.split_at(idx);
        result.push_str(before);
        result.push_str(pattern);
        let value_start = &after_marker[pattern.len()..];
        let value_len = value_start.find(char::is_whitespace).unwrap_or(value_start.len());
        result.push_str("***");
        rest = &value_start[value_len..];
    }
    result.push_str(rest);
    result
}

/// Bounded ring buffer for a bridge's captured output (§4.8: "≤200 lines").
#[derive(Debug, Clone, Default)]
pub struct LogRingBuffer {
    lines: std::collections::VecDeque<String>,
    capacity: usize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { lines: std::collections::VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, raw: &str) {
        for line in scrub(raw).lines() {
            if self.lines.len() >= self.capacity {
                self.lines.pop_front();
            }
            self.lines.push_back(line.to_string());
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "scrub_tests.rs"]
mod tests;
