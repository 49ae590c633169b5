// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion file reading and writing.
//!
//! Binary layout: the magic bytes `MOTN`, a little-endian `u32` format
//! version, then a bincode-encoded sequence of motions. A RON text form of
//! the same data is available for hand-authoring and debugging.
//!
//! Everything read back is validated before it is returned.

use crate::error::{MotionError, Result};
use crate::motion::Motion;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Leading bytes of every motion file
pub const MAGIC: [u8; 4] = *b"MOTN";

/// Format version written by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Write a set of motions
pub fn write_motions<W: Write>(mut writer: W, motions: &[Motion]) -> Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    bincode::serialize_into(&mut writer, motions)?;
    writer.flush()?;
    Ok(())
}

/// Read and validate a set of motions
pub fn read_motions<R: Read>(mut reader: R) -> Result<Vec<Motion>> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(MotionError::BadMagic(magic));
    }

    let mut version = [0u8; 4];
    reader.read_exact(&mut version)?;
    let version = u32::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(MotionError::UnsupportedVersion(version));
    }

    let motions: Vec<Motion> = bincode::deserialize_from(&mut reader)?;
    for motion in &motions {
        motion.validate()?;
    }
    Ok(motions)
}

/// Write a single motion
pub fn write_motion<W: Write>(writer: W, motion: &Motion) -> Result<()> {
    write_motions(writer, std::slice::from_ref(motion))
}

/// Read the first motion of a file
pub fn read_motion<R: Read>(reader: R) -> Result<Motion> {
    read_motions(reader)?
        .into_iter()
        .next()
        .ok_or(MotionError::EmptyMotionFile)
}

/// Serialize a motion to pretty RON
pub fn to_ron_string(motion: &Motion) -> Result<String> {
    let pretty = ron::ser::PrettyConfig::default().struct_names(true);
    Ok(ron::ser::to_string_pretty(motion, pretty)?)
}

/// Parse and validate a motion from RON
pub fn from_ron_str(content: &str) -> Result<Motion> {
    let motion: Motion = ron::from_str(content)?;
    motion.validate()?;
    Ok(motion)
}

/// Load every motion stored in a binary motion file
pub fn load_motion_file(path: &Path) -> Result<Vec<Motion>> {
    let file = File::open(path)?;
    let motions = read_motions(BufReader::new(file))?;
    tracing::debug!("Loaded {} motion(s) from {:?}", motions.len(), path);
    Ok(motions)
}

/// Save motions to a binary motion file
pub fn save_motion_file(path: &Path, motions: &[Motion]) -> Result<()> {
    let file = File::create(path)?;
    write_motions(BufWriter::new(file), motions)?;
    tracing::debug!("Saved {} motion(s) to {:?}", motions.len(), path);
    Ok(())
}
