//! Result output formatting and waveform input.

use crate::OutputFormat;
use anyhow::{Context, Result};
use lib_types::{Epoch, FreqLimits, Spectrum, Units, Waveform};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for `path`, or stdout when absent.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

/// Write a spectrum and its units.
pub fn write_spectrum<W: Write>(mut w: W, spectrum: &Spectrum, units: Units, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            spectrum.write_amplitude_text(&mut w)?;
        }
        OutputFormat::Csv => {
            writeln!(w, "frequency,amplitude,phase")?;
            for (i, value) in spectrum.values.iter().enumerate() {
                writeln!(w, "{},{},{}", spectrum.frequency(i), value.norm(), value.arg())?;
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "units": units,
                "delfreq": spectrum.delfreq,
                "frequency": spectrum.frequencies(),
                "amplitude": spectrum.amplitudes(),
                "phase": spectrum.phases(),
            });
            writeln!(w, "{}", serde_json::to_string_pretty(&json)?)?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Write a waveform.
pub fn write_waveform<W: Write>(mut w: W, waveform: &Waveform, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for v in &waveform.samples {
                writeln!(w, "{:.6e}", v)?;
            }
        }
        OutputFormat::Csv => {
            writeln!(w, "time,value")?;
            let dt = waveform.dt().0;
            for (i, v) in waveform.samples.iter().enumerate() {
                writeln!(w, "{},{}", waveform.start.0 + i as f64 * dt, v)?;
            }
        }
        OutputFormat::Json => {
            writeln!(w, "{}", serde_json::to_string_pretty(waveform)?)?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Write taper limits, optionally followed by narrow sub-bands.
pub fn write_limits<W: Write>(mut w: W, limits: &FreqLimits, bands: &[FreqLimits], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(w, "Frequency Limits")?;
            writeln!(w, "================")?;
            writeln!(w, "Low cut:   {:.6} Hz", limits.low_cut)?;
            writeln!(w, "Low pass:  {:.6} Hz", limits.low_pass)?;
            writeln!(w, "High pass: {:.6} Hz", limits.high_pass)?;
            writeln!(w, "High cut:  {:.6} Hz", limits.high_cut)?;
            if !bands.is_empty() {
                writeln!(w)?;
                writeln!(w, "Sub-bands:")?;
                for (i, band) in bands.iter().enumerate() {
                    writeln!(w, "  {:>3}: {:.6} - {:.6} Hz", i, band.low_pass, band.high_pass)?;
                }
            }
        }
        OutputFormat::Csv => {
            writeln!(w, "band,low_cut,low_pass,high_pass,high_cut")?;
            for (label, l) in std::iter::once(("full".to_string(), limits))
                .chain(bands.iter().enumerate().map(|(i, b)| (i.to_string(), b)))
            {
                writeln!(w, "{},{},{},{},{}", label, l.low_cut, l.low_pass, l.high_pass, l.high_cut)?;
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "limits": limits,
                "bands": bands,
            });
            writeln!(w, "{}", serde_json::to_string_pretty(&json)?)?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Read a waveform from a text file.
///
/// Each non-empty line holds a sample in its last comma- or
/// whitespace-separated column. Lines starting with `#` and a non-numeric
/// header line are skipped.
pub fn read_waveform(path: &Path, sample_rate: f64, start: Epoch) -> Result<Waveform> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read waveform file: {:?}", path))?;

    let mut samples = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let field = line
            .rsplit(|c: char| c == ',' || c.is_whitespace())
            .find(|f| !f.is_empty())
            .unwrap_or(line);
        match field.parse::<f64>() {
            Ok(v) => samples.push(v),
            Err(_) if samples.is_empty() => {
                tracing::debug!("Skipping header line {}: {}", index + 1, line);
            }
            Err(e) => anyhow::bail!("Invalid sample at line {}: {:?} ({})", index + 1, field, e),
        }
    }

    if samples.is_empty() {
        anyhow::bail!("No samples in waveform file: {:?}", path);
    }
    Ok(Waveform::new(samples, sample_rate, start, Units::Counts))
}
