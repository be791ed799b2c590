// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Display names for state slugs.
//!
//! Tables store the folder slug verbatim (`andaman-&-nicobar-islands`). The
//! geography dataset used for maps names states differently, so presentation
//! goes through this versioned mapping.

/// Bumped whenever [`OVERRIDES`] changes.
pub const STATE_NAME_MAPPING_VERSION: u32 = 2;

/// Slugs whose display name does not follow the title-case rule.
const OVERRIDES: &[(&str, &str)] = &[
    ("andaman-&-nicobar-islands", "Andaman and Nicobar"),
    (
        "dadara-&-nagar-havelli-&-daman-&-diu",
        "Dadra and Nagar Haveli and Daman and Diu",
    ),
    ("jammu-&-kashmir", "Jammu and Kashmir"),
    ("delhi", "Delhi"),
    ("odisha", "Odisha"),
    ("pondicherry", "Puducherry"),
];

/// Geography name for a state slug.
pub fn display_name(slug: &str) -> String {
    OVERRIDES
        .iter()
        .find(|(from, _)| *from == slug)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| title_case(&slug.replace('-', " ")))
}

// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            start = false;
        } else {
            out.push(ch);
            start = true;
        }
    }
    out
}
