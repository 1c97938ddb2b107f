use std::path::Path;

use plotters::prelude::*;

use crate::spectra::{SpectralResult, SpectrogramResult};
use crate::utils::DynError;

const PLOT_FONT_SCALE: f64 = 1.2;
const PLOT_SIZE: (u32, u32) = (1280, 720);

/// Spectrogram time columns are max-pooled down to at most this many drawn
/// cells so hour-long recordings stay renderable.
const MAX_TIME_CELLS: usize = 1024;

fn scaled_font_size(base: i32) -> i32 {
    ((base as f64) * PLOT_FONT_SCALE).round() as i32
}

fn scaled_area_size(base: i32) -> i32 {
    ((base as f64) * PLOT_FONT_SCALE).round() as i32
}

// Polynomial approximation of the matplotlib viridis colormap.
fn viridis(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let r = (0.267 + t * (0.329 + t * (1.451 + t * (-1.808 + t * 0.758)))).clamp(0.0, 1.0);
    let g = (0.004 + t * (1.513 + t * (-0.838 + t * (0.731 - t * 0.466)))).clamp(0.0, 1.0);
    let b = (0.329 + t * (1.442 + t * (-2.642 + t * (1.963 - t * 0.440)))).clamp(0.0, 1.0);
    RGBColor((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

pub fn plot_amplitude_spectrum(
    spectrum: &SpectralResult,
    title: &str,
    filename: &Path,
) -> Result<(), DynError> {
    if spectrum.frequencies.is_empty() {
        return Err("No data points to plot".into());
    }
    if spectrum.frequencies.len() != spectrum.amplitudes.len() {
        return Err("Frequency vector length does not match amplitude length".into());
    }

    let root = BitMapBackend::new(filename, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = *spectrum
        .frequencies
        .last()
        .ok_or("Failed to determine maximum frequency")?;
    let x_max = if x_max > 0.0 { x_max } else { 1.0 };
    let y_max = spectrum
        .amplitudes
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let y_max = if y_max.is_finite() && y_max > 0.0 {
        y_max * 1.05
    } else {
        1.0
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", scaled_font_size(32)).into_font())
        .margin(10)
        .x_label_area_size(scaled_area_size(40))
        .y_label_area_size(scaled_area_size(60))
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Frequency (Hz)")
        .y_desc("Amplitude")
        .label_style(("sans-serif", scaled_font_size(20)).into_font())
        .axis_desc_style(("sans-serif", scaled_font_size(24)).into_font())
        .light_line_style(WHITE.mix(0.0))
        .draw()?;

    chart.draw_series(LineSeries::new(
        spectrum
            .frequencies
            .iter()
            .zip(spectrum.amplitudes.iter())
            .map(|(x, y)| (*x, *y)),
        &BLUE,
    ))?;

    root.present()?;
    println!("[plot] Wrote {}", filename.display());
    Ok(())
}

pub fn plot_spectrogram(
    spectrogram: &SpectrogramResult,
    title: &str,
    filename: &Path,
) -> Result<(), DynError> {
    if spectrogram.times.is_empty() || spectrogram.frequencies.is_empty() {
        return Err("No data points to plot".into());
    }

    let bins = spectrogram.frequencies.len();
    let time_cells = spectrogram.times.len().min(MAX_TIME_CELLS);
    let rows_per_cell = (spectrogram.times.len() + time_cells - 1) / time_cells;

    // Max-pool time columns so the drawn cell count stays bounded.
    let mut pooled: Vec<Vec<f64>> = Vec::with_capacity(time_cells);
    for cell in 0..time_cells {
        let start = cell * rows_per_cell;
        let end = ((cell + 1) * rows_per_cell).min(spectrogram.power_db.len());
        if start >= end {
            break;
        }
        let mut column = vec![f64::NEG_INFINITY; bins];
        for row in &spectrogram.power_db[start..end] {
            for (pooled_db, &db) in column.iter_mut().zip(row.iter()) {
                if db > *pooled_db {
                    *pooled_db = db;
                }
            }
        }
        pooled.push(column);
    }

    let mut min_db = f64::INFINITY;
    let mut max_db = f64::NEG_INFINITY;
    for column in &pooled {
        for &db in column {
            if db.is_finite() {
                min_db = min_db.min(db);
                max_db = max_db.max(db);
            }
        }
    }
    let db_range = if min_db.is_finite() && max_db > min_db {
        max_db - min_db
    } else {
        1.0
    };
    if !min_db.is_finite() {
        min_db = 0.0;
    }

    let t_min = spectrogram.times[0];
    let t_max = *spectrogram
        .times
        .last()
        .ok_or("Failed to determine maximum time")?;
    let span = if t_max > t_min { t_max - t_min } else { 1.0 };
    let cell_dt = span / pooled.len() as f64;
    let bin_df = if bins > 1 {
        spectrogram.frequencies[1] - spectrogram.frequencies[0]
    } else {
        1.0
    };
    let f_max = *spectrogram
        .frequencies
        .last()
        .ok_or("Failed to determine maximum frequency")?
        + bin_df;

    let root = BitMapBackend::new(filename, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", scaled_font_size(32)).into_font())
        .margin(10)
        .x_label_area_size(scaled_area_size(40))
        .y_label_area_size(scaled_area_size(60))
        .build_cartesian_2d(t_min..(t_min + span), 0.0..f_max)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Time (sec)")
        .y_desc("Frequency (Hz)")
        .label_style(("sans-serif", scaled_font_size(20)).into_font())
        .axis_desc_style(("sans-serif", scaled_font_size(24)).into_font())
        .draw()?;

    let mut cells = Vec::with_capacity(pooled.len() * bins);
    for (cell, column) in pooled.iter().enumerate() {
        let x0 = t_min + cell as f64 * cell_dt;
        let x1 = x0 + cell_dt;
        for (bin, &db) in column.iter().enumerate() {
            let shade = if db.is_finite() {
                (db - min_db) / db_range
            } else {
                0.0
            };
            let y0 = spectrogram.frequencies[bin];
            cells.push(Rectangle::new(
                [(x0, y0), (x1, y0 + bin_df)],
                viridis(shade).filled(),
            ));
        }
    }
    chart.draw_series(cells)?;

    root.present()?;
    println!("[plot] Wrote {}", filename.display());
    Ok(())
}
