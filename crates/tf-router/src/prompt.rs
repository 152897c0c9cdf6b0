// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt-softening transform, applied once as a last resort before the
//! top-tier retry on a persistent content-safety rejection (spec §4.3
//! step 6).

const VOCABULARY: &[(&str, &str)] = &[
    ("kill", "end"),
    ("destroy", "remove"),
    ("attack", "address"),
    ("exploit", "make use of"),
    ("hack", "work around"),
];

/// Strip code fences and replace vocabulary a safety filter is likely to
/// flag. Idempotent: softening twice produces the same result as once.
pub fn soften_prompt(prompt: &str) -> String {
    let mut softened = prompt.replace("```", "");
    for (harsh, soft) in VOCABULARY {
        softened = replace_case_insensitive(&softened, harsh, soft);
    }
    softened
}

fn replace_case_insensitive(haystack: &str, needle: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(haystack.len());
    let lower_haystack = haystack.to_lowercase();
    let lower_needle = needle.to_lowercase();
    let mut rest = haystack;
    let mut lower_rest = lower_haystack.as_str();
    while let Some(pos) = lower_rest.find(&lower_needle) {
        result.push_str(&rest[..pos]);
        result.push_str(replacement);
        rest = &rest[pos + needle.len()..];
        lower_rest = &lower_rest[pos + needle.len()..];
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
