//! Output artifacts: CSV and JSON files plus a plain-text table for the terminal.

use log::info;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::data::ScheduleEntry;
use crate::error::ExportError;

const TABLE_HEADERS: [&str; 6] = ["Day", "Start Time", "End Time", "Room", "Subject", "Faculty"];

pub fn save_schedule_csv(schedule: &[ScheduleEntry], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    if schedule.is_empty() {
        writer.write_record([
            "day",
            "start_time",
            "end_time",
            "room",
            "subject_code",
            "subject_name",
            "faculty",
        ])?;
    }
    for entry in schedule {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_schedule_json(schedule: &[ScheduleEntry], path: &Path) -> Result<(), ExportError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, schedule)?;
    Ok(())
}

/// File-name form of a timetable name: anything outside `[A-Za-z0-9 ._-]`
/// becomes `_`, so path separators never reach the file system.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes `timetable_<name>.csv` and `timetable_<name>.json` under `dir`.
pub fn save_timetable(
    dir: &Path,
    name: &str,
    schedule: &[ScheduleEntry],
) -> Result<(PathBuf, PathBuf), ExportError> {
    fs::create_dir_all(dir)?;
    let stem = file_stem(name);
    let csv_path = dir.join(format!("timetable_{stem}.csv"));
    let json_path = dir.join(format!("timetable_{stem}.json"));
    save_schedule_csv(schedule, &csv_path)?;
    save_schedule_json(schedule, &json_path)?;
    info!(
        "Saved timetable {} -> {}, {}",
        name,
        csv_path.display(),
        json_path.display()
    );
    Ok((csv_path, json_path))
}

/// Renders a schedule as an aligned text grid.
pub fn render_table(schedule: &[ScheduleEntry]) -> String {
    let rows: Vec<[&str; 6]> = schedule
        .iter()
        .map(|e| {
            [
                e.day.as_str(),
                e.start_time.as_str(),
                e.end_time.as_str(),
                e.room.as_str(),
                e.subject_name.as_str(),
                e.faculty.as_str(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{separator}+");
    let line = |cells: &[&str; 6]| {
        let body = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!(" {cell:<width$} "))
            .collect::<Vec<_>>()
            .join("|");
        format!("|{body}|")
    };

    let mut out = vec![separator.clone(), line(&TABLE_HEADERS), separator.clone()];
    out.extend(rows.iter().map(line));
    out.push(separator);
    out.join("\n")
}
