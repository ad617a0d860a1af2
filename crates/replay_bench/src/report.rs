//! Per-match CSV tables: final counts, research times and the population
//! series. Every table has a header row; missing cells are written as `0`.

use anyhow::{Context, Result};
use replay_core::{Building, MatchAnalysis, Technology, Unit};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use strum::IntoEnumIterator;

pub const UNITS_FILE: &str = "units.csv";
pub const TECHNOLOGIES_FILE: &str = "technologies.csv";
pub const POPULATION_FILE: &str = "population.csv";

/// Final unit and building counts, one row per player.
pub fn write_units<W: Write>(writer: W, analysis: &MatchAnalysis) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["player".to_string()];
    header.extend(Unit::iter().map(|unit| unit.name().to_string()));
    header.extend(Building::iter().map(|building| building.name().to_string()));
    csv.write_record(&header)?;

    for player in analysis.players() {
        let mut row = vec![player.id().to_string()];
        row.extend(player.units().iter().map(|(_, count)| count.to_string()));
        row.extend(player.buildings().iter().map(|(_, count)| count.to_string()));
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Research completion time in seconds per technology, `0` if never researched.
pub fn write_technologies<W: Write>(writer: W, analysis: &MatchAnalysis) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["player".to_string()];
    header.extend(Technology::iter().map(|tech| tech.name().to_string()));
    csv.write_record(&header)?;

    for player in analysis.players() {
        let mut row = vec![player.id().to_string()];
        row.extend(Technology::iter().map(|tech| {
            player
                .technologies()
                .get(tech)
                .map_or_else(|| "0".to_string(), |seconds| format!("{seconds:.1}"))
        }));
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Economic and military unit totals at every sampled timestamp.
pub fn write_population<W: Write>(writer: W, analysis: &MatchAnalysis) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["timestamp".to_string()];
    for player in analysis.players() {
        header.push(format!("player{}_economic", player.id()));
        header.push(format!("player{}_military", player.id()));
    }
    csv.write_record(&header)?;

    let timestamps: BTreeSet<u32> = analysis
        .players()
        .flat_map(|player| player.snapshots().keys().copied())
        .collect();
    for timestamp in timestamps {
        let mut row = vec![timestamp.to_string()];
        for player in analysis.players() {
            let (economic, military) = player
                .snapshots()
                .get(&timestamp)
                .map_or((0, 0), |s| (s.units.economic, s.units.military));
            row.push(economic.to_string());
            row.push(military.to_string());
        }
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write all three tables into `dir`.
pub fn write_match_reports(dir: &Path, analysis: &MatchAnalysis) -> Result<()> {
    let open = |name: &str| {
        let path = dir.join(name);
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))
    };
    write_units(open(UNITS_FILE)?, analysis).context("writing units table")?;
    write_technologies(open(TECHNOLOGIES_FILE)?, analysis).context("writing technologies table")?;
    write_population(open(POPULATION_FILE)?, analysis).context("writing population table")?;
    Ok(())
}
