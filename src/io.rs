use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::config::{GenerationMode, ProfileColumns};
use crate::generator::GenerationSummary;
use crate::profile::{FlightProfile, ProfileSample};
use crate::signal::OutputSeries;
use crate::TurbulenceError;

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, TurbulenceError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| TurbulenceError::InvalidProfile(format!("missing column `{name}`")))
}

fn parse_cell(
    record: &StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<f64, TurbulenceError> {
    let raw = record.get(index).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| {
        TurbulenceError::InvalidProfile(format!(
            "row {row}: cannot parse `{raw}` in column `{name}`"
        ))
    })
}

/// Read timestamp, airspeed and altitude columns by header name.
pub fn read_profile_csv(
    path: &Path,
    columns: &ProfileColumns,
) -> Result<FlightProfile, TurbulenceError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let t_idx = column_index(&headers, &columns.timestamp)?;
    let v_idx = column_index(&headers, &columns.airspeed)?;
    let h_idx = column_index(&headers, &columns.altitude)?;

    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        samples.push(ProfileSample {
            timestamp: parse_cell(&record, t_idx, &columns.timestamp, row + 1)?,
            airspeed: parse_cell(&record, v_idx, &columns.airspeed, row + 1)?,
            altitude: parse_cell(&record, h_idx, &columns.altitude, row + 1)?,
        });
    }

    FlightProfile::new(samples)
}

/// Write `timestamp,turbulence,u,v,w,p,q,r` rows.
pub fn write_series_csv(path: &Path, series: &OutputSeries) -> Result<(), TurbulenceError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    for row in &series.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_json(path: &Path, summary: &GenerationSummary) -> Result<(), TurbulenceError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

/// Flight identifier of an input profile: its file stem.
pub fn flight_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "flight".to_string())
}

pub fn output_path(output_dir: &Path, flight_id: &str, mode: GenerationMode) -> PathBuf {
    let suffix = match mode {
        GenerationMode::Turbulence => "turbwind",
        GenerationMode::Calm => "calmwind",
    };
    output_dir.join(format!("{flight_id}_{suffix}.csv"))
}

pub fn summary_path(output_dir: &Path, flight_id: &str) -> PathBuf {
    output_dir.join(format!("{flight_id}_summary.json"))
}

/// Expand files and directories into a sorted list of profile files.
/// Directories contribute their `*.csv` entries.
pub fn list_profiles(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, TurbulenceError> {
    let mut profiles = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
                .collect();
            found.sort();
            profiles.extend(found);
        } else {
            profiles.push(input.clone());
        }
    }
    Ok(profiles)
}

pub fn ensure_output_dir(output_dir: &Path) -> Result<(), TurbulenceError> {
    fs::create_dir_all(output_dir)?;
    Ok(())
}
