mod args;
mod channels;
mod decode;
mod error;
mod header;
mod plot;
mod spectra;
mod table;
mod utils;

use std::path::Path;

use clap::Parser;
use rayon::prelude::*;

use crate::decode::SAMPLING_RATE_HZ;
use crate::error::TransformError;
use crate::table::STATIONS;
use crate::utils::DynError;

fn main() -> Result<(), DynError> {
    let args = args::Args::parse();
    match args.command {
        args::Command::Transform { input, output } => run_transform(&input, &output),
        args::Command::Graph { table, out_dir } => run_graph(&table, &out_dir),
    }
}

fn run_transform(input: &Path, output: &Path) -> Result<(), DynError> {
    let scan = header::scan_calibration_offsets(input)?;
    let Some(header_line) = scan.header_line else {
        return Err(TransformError::MissingCalibration.into());
    };
    let offsets_hex = scan
        .offsets
        .iter()
        .map(|offset| format!("{offset:04X}"))
        .collect::<Vec<_>>()
        .join(",");
    println!(
        "[info] Calibration offsets {} (header at line {})",
        offsets_hex,
        header_line + 1
    );

    let stats = decode::process_and_append(input, &scan.offsets, output)?;
    println!(
        "[info] Appended {} samples in {} batches to {}",
        stats.samples,
        stats.batches,
        output.display()
    );
    if stats.skipped_lines > 0 {
        println!(
            "[warn] Skipped {} malformed data lines",
            stats.skipped_lines
        );
    }
    Ok(())
}

fn run_graph(table: &Path, out_dir: &Path) -> Result<(), DynError> {
    let name = table
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or("Table path has no usable file name")?;
    let label = channels::date_hour_label(name).ok_or_else(|| {
        format!("File name `{name}` does not contain a YYYY-MM-DDTHH timestamp token")
    })?;

    let loaded = channels::load_channel_signals(table)?;
    std::fs::create_dir_all(out_dir)?;

    // Each station's signal is independent; render them concurrently.
    let results: Vec<Result<(), DynError>> = STATIONS
        .par_iter()
        .enumerate()
        .map(|(index, station)| {
            graph_station(
                station,
                &loaded.signals[index],
                loaded.coerced_cells[index],
                &label,
                out_dir,
            )
        })
        .collect();
    for result in results {
        result?;
    }
    Ok(())
}

fn graph_station(
    station: &str,
    signal: &[f64],
    coerced_cells: u64,
    label: &str,
    out_dir: &Path,
) -> Result<(), DynError> {
    if coerced_cells > 0 {
        println!("[warn] {station}: coerced {coerced_cells} non-numeric cells to 0");
    }

    let spectrum = spectra::amplitude_spectrum(signal, SAMPLING_RATE_HZ)?;
    if spectrum.frequencies.is_empty() {
        println!("[warn] {station}: signal too short for analysis, skipping plots");
        return Ok(());
    }
    if let Some((peak_freq, peak_amp)) = spectrum.peak() {
        println!(
            "[info] {station}: spectrum peak {peak_freq:.1} Hz (amplitude {peak_amp:.1})"
        );
    }
    let station_upper = station.to_uppercase();
    plot::plot_amplitude_spectrum(
        &spectrum,
        &format!("Frequency and Amplitude - {station_upper}"),
        &out_dir.join(format!("{label}_{station}_frequency.png")),
    )?;

    let spectrogram = spectra::spectrogram(signal, SAMPLING_RATE_HZ)?;
    if spectrogram.times.is_empty() {
        println!("[warn] {station}: signal shorter than one segment, skipping spectrogram");
        return Ok(());
    }
    plot::plot_spectrogram(
        &spectrogram,
        &format!("Spectrogram - {station_upper}"),
        &out_dir.join(format!("{label}_{station}_spectrogram.png")),
    )?;
    Ok(())
}
