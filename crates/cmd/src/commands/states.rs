// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use pulse::geo::STATE_NAME_MAPPING_VERSION;

/// Print stored state slugs next to their geography names.
pub fn states_command(store: &Path, out: &mut impl Write) -> Result<()> {
    let states = pulse::query::states(store)?;
    if states.is_empty() {
        writeln!(out, "No results found.")?;
        return Ok(());
    }
    writeln!(out, "# state names v{STATE_NAME_MAPPING_VERSION}")?;
    for state in states {
        writeln!(out, "{:<40} {}", state.slug, state.display)?;
    }
    Ok(())
}
