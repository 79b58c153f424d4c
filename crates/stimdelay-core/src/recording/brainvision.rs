//! BrainVision vendor format loading
//!
//! Reads the BrainVision EEG exchange format: an INI-style `.vhdr` text
//! header describing channel layout and sampling, next to a raw binary
//! `.eeg` payload. Supported payloads are `INT_16` and `IEEE_FLOAT_32`,
//! little-endian, in `MULTIPLEXED` or `VECTORIZED` orientation. Per-channel
//! resolutions are applied on load so the buffer carries physical units.

use super::{LoadError, Recording};
use std::fs;
use std::path::Path;

/// Layout of the binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    /// Sample-major: ch1 s1, ch2 s1, ..., ch1 s2, ...
    Multiplexed,
    /// Channel-major: all of ch1, then all of ch2, ...
    Vectorized,
}

/// Sample encoding of the binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryFormat {
    Int16,
    Float32,
}

#[derive(Debug)]
struct Header {
    data_file: String,
    n_channels: usize,
    /// Sampling interval in microseconds
    sampling_interval: f64,
    orientation: Orientation,
    format: BinaryFormat,
    /// Channel name and resolution (scaling factor), in order
    channels: Vec<(String, f64)>,
}

/// Read a BrainVision recording given the path to its `.vhdr` header
///
/// The data file named in the header is resolved relative to the header's
/// directory. The recording's first-sample offset is 0.
pub fn read_brainvision<P: AsRef<Path>>(path: P) -> Result<Recording, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let header = parse_header(&text)?;

    let data_path = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&header.data_file);
    let payload = fs::read(&data_path)?;

    let values = decode_payload(&payload, header.format)?;
    if values.len() % header.n_channels != 0 {
        return Err(LoadError::Malformed(format!(
            "payload of {} values does not divide into {} channels",
            values.len(),
            header.n_channels
        )));
    }
    let n_samples = values.len() / header.n_channels;

    let mut data = vec![Vec::with_capacity(n_samples); header.n_channels];
    match header.orientation {
        Orientation::Multiplexed => {
            for (i, value) in values.iter().enumerate() {
                let ch = i % header.n_channels;
                data[ch].push(value * header.channels[ch].1);
            }
        }
        Orientation::Vectorized => {
            for (ch, row) in data.iter_mut().enumerate() {
                let start = ch * n_samples;
                row.extend(
                    values[start..start + n_samples]
                        .iter()
                        .map(|v| v * header.channels[ch].1),
                );
            }
        }
    }

    let sfreq = 1e6 / header.sampling_interval;
    let ch_names = header.channels.into_iter().map(|(name, _)| name).collect();

    tracing::info!(
        sfreq,
        n_samples,
        path = %path.display(),
        "BrainVision recording loaded"
    );
    Ok(Recording::new(sfreq, 0, ch_names, data))
}

fn parse_header(text: &str) -> Result<Header, LoadError> {
    let mut section = String::new();
    let mut data_file = None;
    let mut n_channels = None;
    let mut sampling_interval = None;
    let mut orientation = Orientation::Multiplexed;
    let mut format = None;
    let mut channels: Vec<(usize, String, f64)> = Vec::new();

    for line in text.lines() {
        let line = line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].to_string();
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match section.as_str() {
            "Common Infos" => match key {
                "DataFile" => data_file = Some(value.to_string()),
                "NumberOfChannels" => {
                    n_channels = Some(value.parse::<usize>().map_err(|_| {
                        LoadError::Malformed(format!("bad NumberOfChannels: {value}"))
                    })?);
                }
                "SamplingInterval" => {
                    sampling_interval = Some(value.parse::<f64>().map_err(|_| {
                        LoadError::Malformed(format!("bad SamplingInterval: {value}"))
                    })?);
                }
                "DataOrientation" => {
                    orientation = match value.to_ascii_uppercase().as_str() {
                        "MULTIPLEXED" => Orientation::Multiplexed,
                        "VECTORIZED" => Orientation::Vectorized,
                        other => {
                            return Err(LoadError::UnsupportedFormat(format!(
                                "data orientation {other}"
                            )))
                        }
                    };
                }
                "DataFormat" => {
                    if !value.eq_ignore_ascii_case("BINARY") {
                        return Err(LoadError::UnsupportedFormat(format!(
                            "data format {value}"
                        )));
                    }
                }
                _ => {}
            },
            "Binary Infos" => {
                if key == "BinaryFormat" {
                    format = Some(match value.to_ascii_uppercase().as_str() {
                        "INT_16" => BinaryFormat::Int16,
                        "IEEE_FLOAT_32" => BinaryFormat::Float32,
                        other => {
                            return Err(LoadError::UnsupportedFormat(format!(
                                "binary format {other}"
                            )))
                        }
                    });
                }
            }
            "Channel Infos" => {
                if let Some(number) = key.strip_prefix("Ch") {
                    let index: usize = number.parse().map_err(|_| {
                        LoadError::Malformed(format!("bad channel key: {key}"))
                    })?;
                    // Ch<N>=<Name>,<Reference>,<Resolution>,<Unit>
                    let mut fields = value.split(',');
                    let name = fields.next().unwrap_or("").to_string();
                    let _reference = fields.next();
                    let resolution = match fields.next().map(str::trim) {
                        None | Some("") => 1.0,
                        Some(res) => res.parse::<f64>().map_err(|_| {
                            LoadError::Malformed(format!("bad resolution for {key}: {res}"))
                        })?,
                    };
                    channels.push((index, name, resolution));
                }
            }
            _ => {}
        }
    }

    let data_file = data_file.ok_or_else(|| LoadError::MissingEntry("DataFile".into()))?;
    let n_channels = n_channels.ok_or_else(|| LoadError::MissingEntry("NumberOfChannels".into()))?;
    let sampling_interval =
        sampling_interval.ok_or_else(|| LoadError::MissingEntry("SamplingInterval".into()))?;
    let format = format.ok_or_else(|| LoadError::MissingEntry("BinaryFormat".into()))?;

    if sampling_interval <= 0.0 {
        return Err(LoadError::Malformed(format!(
            "non-positive sampling interval: {sampling_interval}"
        )));
    }
    if channels.len() != n_channels {
        return Err(LoadError::Malformed(format!(
            "header names {} channels but lists {}",
            n_channels,
            channels.len()
        )));
    }

    channels.sort_by_key(|(index, _, _)| *index);
    Ok(Header {
        data_file,
        n_channels,
        sampling_interval,
        orientation,
        format,
        channels: channels
            .into_iter()
            .map(|(_, name, res)| (name, res))
            .collect(),
    })
}

fn decode_payload(payload: &[u8], format: BinaryFormat) -> Result<Vec<f64>, LoadError> {
    match format {
        BinaryFormat::Int16 => {
            if payload.len() % 2 != 0 {
                return Err(LoadError::Malformed("odd INT_16 payload length".into()));
            }
            Ok(payload
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as f64)
                .collect())
        }
        BinaryFormat::Float32 => {
            if payload.len() % 4 != 0 {
                return Err(LoadError::Malformed(
                    "IEEE_FLOAT_32 payload length not a multiple of 4".into(),
                ));
            }
            Ok(payload
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect())
        }
    }
}
