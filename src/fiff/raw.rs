//! Raw FIF recordings: measurement info plus calibrated, preloaded data.
//!
//! # Algorithm
//! 1. Load the tag directory (embedded dir tag, else a sequential scan).
//! 2. Build the block tree.
//! 3. Read channel info and sampling rate from `FIFFB_MEAS_INFO`.
//! 4. Walk `FIFFB_RAW_DATA` (or `FIFFB_CONTINUOUS_DATA`) for data buffers
//!    and skips, and read every buffer.
//!
//! # Calibration
//! ```text
//! data[ch, t] = raw_value[t, ch] × chs[ch].cal × chs[ch].range
//! ```
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use anyhow::{anyhow, bail, ensure, Context, Result};
use ndarray::{s, Array2};

use super::constants::*;
use super::tag::{FifReader, TagHeader};
use super::tree::{read_tree, Node};
use crate::recording::Recording;

/// Channel info, parsed from a `FIFFT_CH_INFO_STRUCT` tag.
///
/// On-disk layout (big-endian, 96 bytes):
/// ```text
///  4  scanno       i32
///  4  logno        i32
///  4  kind         i32
///  4  range        f32
///  4  cal          f32
///  4  coil_type    i32
/// 48  loc          12 × f32
///  4  unit         i32
///  4  unit_mul     i32
/// 16  ch_name      16 × u8 (null-padded Latin-1)
/// ```
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub kind: i32,
    pub range: f32,
    pub cal: f32,
    /// Position + orientation: `[x, y, z, …]` in metres.
    pub loc: [f32; 12],
    pub name: String,
}

impl ChannelInfo {
    pub const SIZE: usize = 96;

    /// `cal × range`.
    #[inline]
    pub fn calibration(&self) -> f64 {
        self.cal as f64 * self.range as f64
    }

    /// Sensor position (first three `loc` entries).
    pub fn position(&self) -> [f64; 3] {
        [self.loc[0] as f64, self.loc[1] as f64, self.loc[2] as f64]
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        ensure!(raw.len() >= Self::SIZE, "ch_info payload too short: {} bytes (need 96)", raw.len());
        let word = |off: usize| [raw[off], raw[off + 1], raw[off + 2], raw[off + 3]];
        let mut loc = [0f32; 12];
        for (i, v) in loc.iter_mut().enumerate() {
            *v = f32::from_be_bytes(word(24 + 4 * i));
        }
        let name_bytes = &raw[80..96];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(16);
        Ok(Self {
            kind: i32::from_be_bytes(word(8)),
            range: f32::from_be_bytes(word(12)),
            cal: f32::from_be_bytes(word(16)),
            loc,
            name: name_bytes[..end].iter().map(|&b| b as char).collect(),
        })
    }
}

/// Measurement metadata from `FIFFB_MEAS_INFO`.
#[derive(Debug, Clone)]
pub struct MeasInfo {
    pub sfreq: f64,
    pub chs: Vec<ChannelInfo>,
    pub bads: Vec<String>,
}

/// A FIF recording with all buffers loaded.
#[derive(Debug, Clone)]
pub struct RawFif {
    pub info: MeasInfo,
    /// First sample index in acquisition time.
    pub first_samp: u64,
    /// Calibrated data `[n_chan, n_times]`.
    pub data: Array2<f64>,
}

impl RawFif {
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    pub fn ch_names(&self) -> Vec<String> {
        self.info.chs.iter().map(|c| c.name.clone()).collect()
    }

    /// Convert to a [`Recording`], attaching sensor positions when every
    /// channel has a finite one and at least one is non-zero.
    pub fn into_recording(self) -> crate::error::Result<Recording> {
        let positions = Array2::from_shape_fn((self.info.chs.len(), 3), |(c, k)| {
            self.info.chs[c].position()[k]
        });
        let usable = positions.iter().all(|v| v.is_finite()) && positions.iter().any(|&v| v != 0.0);
        let ch_names = self.ch_names();
        let rec = Recording::new(self.data, self.info.sfreq, ch_names, Vec::new())?;
        if usable {
            rec.with_positions(positions)
        } else {
            Ok(rec)
        }
    }
}

/// Read and preload a raw FIF file.
pub fn read_raw_fif<P: AsRef<Path>>(path: P) -> Result<RawFif> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = FifReader::new(BufReader::new(file));

    let directory = reader.directory()?;
    let tree = read_tree(&mut reader, &directory)?;
    let meas = tree.find_block(FIFFB_MEAS).ok_or_else(|| anyhow!("FIFFB_MEAS block not found"))?;
    let info = read_meas_info(&mut reader, meas)?;
    let raw_node = meas
        .find_block(FIFFB_RAW_DATA)
        .or_else(|| meas.find_block(FIFFB_CONTINUOUS_DATA))
        .ok_or_else(|| anyhow!("no raw-data block in FIF file"))?;
    let (first_samp, data) = read_raw_buffers(&mut reader, raw_node, &info)?;

    tracing::debug!(
        path = %path.display(),
        n_chan = info.chs.len(),
        n_times = data.ncols(),
        sfreq = info.sfreq,
        "read FIF"
    );
    Ok(RawFif { info, first_samp, data })
}

fn read_meas_info<R: Read + Seek>(reader: &mut FifReader<R>, meas: &Node) -> Result<MeasInfo> {
    let node = meas
        .find_block(FIFFB_MEAS_INFO)
        .ok_or_else(|| anyhow!("FIFFB_MEAS_INFO block not found"))?;

    let mut n_chan = None;
    let mut sfreq = None;
    let mut chs = Vec::new();
    let mut bads = Vec::new();
    for ent in &node.entries {
        match ent.kind {
            FIFF_NCHAN => n_chan = Some(reader.read_i32(ent)?.max(0) as usize),
            FIFF_SFREQ => sfreq = Some(reader.read_f32(ent)? as f64),
            FIFF_CH_INFO => chs.push(ChannelInfo::from_bytes(&reader.payload(ent)?)?),
            FIFF_BAD_CHS => {
                bads = reader
                    .read_string(ent)?
                    .split(':')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => {}
        }
    }
    let n_chan = n_chan.ok_or_else(|| anyhow!("FIFF_NCHAN not found"))?;
    let sfreq = sfreq.ok_or_else(|| anyhow!("FIFF_SFREQ not found"))?;
    ensure!(chs.len() == n_chan, "expected {n_chan} ch_info structs, got {}", chs.len());
    Ok(MeasInfo { sfreq, chs, bads })
}

/// Collect `(tag, n_samp)` buffers, with skips as zero-filled gaps, then read them.
fn read_raw_buffers<R: Read + Seek>(
    reader: &mut FifReader<R>,
    node: &Node,
    info: &MeasInfo,
) -> Result<(u64, Array2<f64>)> {
    let n_chan = info.chs.len();
    ensure!(n_chan > 0, "FIF file has no channels");
    let mut first_samp = match node.find_tag(FIFF_FIRST_SAMPLE) {
        Some(t) => reader.read_i32(t)?.max(0) as u64,
        None => 0,
    };

    let mut buffers: Vec<(Option<TagHeader>, usize)> = Vec::new();
    let mut pending_skip = 0usize;
    let mut seen_buffer = false;
    for ent in &node.entries {
        match ent.kind {
            FIFF_DATA_SKIP => pending_skip += reader.read_i32(ent)?.max(0) as usize,
            FIFF_DATA_BUFFER => {
                let bps = bytes_per_sample(ent.ftype)
                    .ok_or_else(|| anyhow!("unsupported buffer type {}", ent.ftype))?;
                let n_samp = ent.size.max(0) as usize / (bps * n_chan);
                if pending_skip > 0 {
                    // A skip before the first buffer shifts first_samp; later ones are gaps.
                    if seen_buffer {
                        buffers.push((None, n_samp * pending_skip));
                    } else {
                        first_samp += (n_samp * pending_skip) as u64;
                    }
                    pending_skip = 0;
                }
                buffers.push((Some(*ent), n_samp));
                seen_buffer = true;
            }
            _ => {}
        }
    }
    if !seen_buffer {
        bail!("no FIFF_DATA_BUFFER tags found in raw-data block");
    }

    let cals: Vec<f64> = info.chs.iter().map(ChannelInfo::calibration).collect();
    let n_times: usize = buffers.iter().map(|b| b.1).sum();
    let mut data = Array2::<f64>::zeros((n_chan, n_times));
    let mut offset = 0;
    for (tag, n_samp) in buffers {
        if let Some(tag) = tag {
            let block = read_buffer(reader, &tag, n_samp, &cals)?;
            data.slice_mut(s![.., offset..offset + n_samp]).assign(&block);
        }
        offset += n_samp;
    }
    Ok((first_samp, data))
}

/// One buffer as `[n_chan, n_samp]`; the file stores `[n_samp, n_chan]`.
fn read_buffer<R: Read + Seek>(
    reader: &mut FifReader<R>,
    tag: &TagHeader,
    n_samp: usize,
    cals: &[f64],
) -> Result<Array2<f64>> {
    let n_chan = cals.len();
    let raw = reader.payload(tag)?;
    let decode: fn(&[u8]) -> f64 = match tag.ftype {
        FIFFT_FLOAT => |b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
        FIFFT_INT => |b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
        FIFFT_DOUBLE => |b| f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        FIFFT_SHORT | FIFFT_DAU_PACK16 => |b| i16::from_be_bytes([b[0], b[1]]) as f64,
        other => bail!("unsupported buffer type {other}"),
    };
    let bps = bytes_per_sample(tag.ftype).unwrap_or(4);
    let mut out = Array2::<f64>::zeros((n_chan, n_samp));
    for (i, chunk) in raw.chunks_exact(bps).take(n_chan * n_samp).enumerate() {
        let (t, c) = (i / n_chan, i % n_chan);
        out[[c, t]] = decode(chunk) * cals[c];
    }
    Ok(out)
}
