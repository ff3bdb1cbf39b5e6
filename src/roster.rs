//! Roster import from CSV.
//!
//! Expected columns: `name` and an optional `seed` (1 = strongest). Rows are
//! ordered by seed with unseeded players last in file order, which is the
//! order seeding and group creation work from.

use std::collections::HashSet;
use std::io::Read;

use serde::Deserialize;

use crate::models::{PlayerId, Tournament, TournamentError};

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    #[serde(default)]
    seed: Option<u32>,
}

/// Parse a roster and return player names in seeding order.
pub fn read_roster<R: Read>(reader: R) -> Result<Vec<String>, TournamentError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let row = record.map_err(|e| TournamentError::InvalidRoster(format!("row {}: {e}", line + 1)))?;
        if row.name.is_empty() {
            continue;
        }
        rows.push(row);
    }

    let mut seen = HashSet::new();
    for row in &rows {
        if !seen.insert(row.name.to_lowercase()) {
            return Err(TournamentError::InvalidRoster(format!(
                "duplicate player name '{}'",
                row.name
            )));
        }
    }

    rows.sort_by_key(|row| row.seed.unwrap_or(u32::MAX));
    Ok(rows.into_iter().map(|row| row.name).collect())
}

/// Read a roster and add every player to `tournament` (Setup only).
///
/// Nothing is added if any row is rejected.
pub fn import_roster<R: Read>(
    tournament: &mut Tournament,
    reader: R,
) -> Result<Vec<PlayerId>, TournamentError> {
    let names = read_roster(reader)?;
    if let Some(taken) = names.iter().find(|name| {
        tournament
            .players
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name))
    }) {
        return Err(TournamentError::InvalidRoster(format!(
            "player '{taken}' is already registered"
        )));
    }
    let mut added = Vec::with_capacity(names.len());
    for name in names {
        added.push(tournament.add_player(name)?);
    }
    log::info!(
        "Imported {} players into tournament {}",
        added.len(),
        tournament.id
    );
    Ok(added)
}
