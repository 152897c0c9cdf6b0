// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn strips_code_fences() {
    let softened = soften_prompt("here is code:\n```rust\nfn main() {}\n```");
    assert!(!softened.contains("```"));
}

#[test]
fn replaces_flagged_vocabulary_case_insensitively() {
    let softened = soften_prompt("Kill the process and destroy the cache");
    assert!(!softened.to_lowercase().contains("kill"));
    assert!(!softened.to_lowercase().contains("destroy"));
    assert!(softened.contains("end"));
    assert!(softened.contains("remove"));
}

#[test]
fn softening_is_idempotent() {
    let once = soften_prompt("attack the exploit");
    let twice = soften_prompt(&once);
    assert_eq!(once, twice);
}

#[test]
fn leaves_unrelated_text_untouched() {
    let input = "please summarize this document";
    assert_eq!(soften_prompt(input), input);
}
