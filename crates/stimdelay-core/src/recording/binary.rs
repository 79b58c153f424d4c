//! Generic binary recording container
//!
//! A minimal self-describing container for multi-channel recordings, used by
//! tooling and tests when no vendor format is involved.
//!
//! ## File Format
//!
//! All integers and floats are little-endian:
//!
//! ```text
//! magic       4 bytes  "SDRC"
//! version     u16      currently 1
//! n_channels  u32
//! n_samples   u64
//! sfreq       f64      Hz
//! first_samp  u64
//! channels    n_channels x { name_len: u16, name: UTF-8 bytes }
//! payload     n_channels x n_samples x f64, channel-major
//! ```

use super::{LoadError, Recording};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Container magic bytes
const MAGIC: [u8; 4] = *b"SDRC";

/// Current container version
const VERSION: u16 = 1;

/// Read a recording from a stimdelay binary container
pub fn read_recording<P: AsRef<Path>>(path: P) -> Result<Recording, LoadError> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(LoadError::BadMagic);
    }

    let version = read_u16(&mut reader)?;
    if version != VERSION {
        return Err(LoadError::UnsupportedVersion(version));
    }

    let n_channels = read_u32(&mut reader)? as usize;
    let n_samples = read_u64(&mut reader)? as usize;
    let sfreq = read_f64(&mut reader)?;
    let first_samp = read_u64(&mut reader)? as usize;

    if sfreq <= 0.0 || !sfreq.is_finite() {
        return Err(LoadError::Malformed(format!("invalid sample rate {sfreq}")));
    }

    let mut ch_names = Vec::with_capacity(n_channels);
    for _ in 0..n_channels {
        let len = read_u16(&mut reader)? as usize;
        let mut name = vec![0u8; len];
        reader.read_exact(&mut name)?;
        let name = String::from_utf8(name)
            .map_err(|_| LoadError::Malformed("channel name is not UTF-8".into()))?;
        ch_names.push(name);
    }

    let mut data = Vec::with_capacity(n_channels);
    for _ in 0..n_channels {
        let mut row = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            row.push(read_f64(&mut reader)?);
        }
        data.push(row);
    }

    Ok(Recording::new(sfreq, first_samp, ch_names, data))
}

/// Write a recording as a stimdelay binary container
pub fn write_recording<P: AsRef<Path>>(path: P, raw: &Recording) -> Result<(), LoadError> {
    let mut writer = BufWriter::new(File::create(path)?);

    writer.write_all(&MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&(raw.n_channels() as u32).to_le_bytes())?;
    writer.write_all(&(raw.n_samples() as u64).to_le_bytes())?;
    writer.write_all(&raw.sfreq().to_le_bytes())?;
    writer.write_all(&(raw.first_samp() as u64).to_le_bytes())?;

    for name in raw.ch_names() {
        writer.write_all(&(name.len() as u16).to_le_bytes())?;
        writer.write_all(name.as_bytes())?;
    }

    for idx in 0..raw.n_channels() {
        for value in raw.channel(idx) {
            writer.write_all(&value.to_le_bytes())?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn read_u16<R: Read>(reader: &mut R) -> Result<u16, LoadError> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, LoadError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64, LoadError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> Result<f64, LoadError> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}
