//! Minimal reader/writer for the uncompressed NASA CDF v3 single-file format.
//!
//! Covers the record types an instrument L2 file of this shape actually uses:
//! CDR → GDR → zVDR chain → VXR → VVR. Control fields are big-endian per the
//! format; variable data is decoded according to the CDR encoding. Compressed
//! files, compressed variables, sparse records, and TT2000 time stamps are
//! rejected with typed errors instead of being misread.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use ndarray::{ArrayD, IxDyn};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Format constants
// ---------------------------------------------------------------------------

/// First magic word of a CDF v3 file.
const MAGIC_V3: [u8; 4] = [0xCD, 0xF3, 0x00, 0x01];
/// Second magic word: uncompressed file.
const MAGIC_UNCOMPRESSED: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];
/// Second magic word: whole-file compression.
const MAGIC_COMPRESSED: [u8; 4] = [0xCC, 0xCC, 0x00, 0x01];

// Record type codes.
const REC_CDR: i32 = 1;
const REC_GDR: i32 = 2;
const REC_VXR: i32 = 6;
const REC_VVR: i32 = 7;
const REC_ZVDR: i32 = 8;
const REC_CVVR: i32 = 13;

// Data type codes.
const CDF_INT1: i32 = 1;
const CDF_INT2: i32 = 2;
const CDF_INT4: i32 = 4;
const CDF_INT8: i32 = 8;
const CDF_UINT1: i32 = 11;
const CDF_UINT2: i32 = 12;
const CDF_UINT4: i32 = 14;
const CDF_REAL4: i32 = 21;
const CDF_REAL8: i32 = 22;
/// Milliseconds since 0000-01-01T00:00:00.000, stored as a float64.
pub const CDF_EPOCH: i32 = 31;
const CDF_TIME_TT2000: i32 = 33;
const CDF_BYTE: i32 = 41;
const CDF_FLOAT: i32 = 44;
pub const CDF_DOUBLE: i32 = 45;

// Encoding codes from the CDR, grouped by byte order.
const BIG_ENDIAN_ENCODINGS: [i32; 8] = [1, 2, 5, 7, 9, 11, 12, 18];
const LITTLE_ENDIAN_ENCODINGS: [i32; 5] = [4, 6, 13, 16, 17];
const ENCODING_NETWORK: i32 = 1;

/// Milliseconds between 0000-01-01 and 1970-01-01 (proleptic Gregorian).
const CDF_EPOCH_UNIX_OFFSET_MS: f64 = 62_167_219_200_000.0;

const VDR_NAME_LEN: usize = 256;
const CDR_COPYRIGHT_LEN: usize = 256;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub type Result<T> = std::result::Result<T, FileFormatError>;

/// Container-level failure: the file is not a CDF this reader can parse, or a
/// required variable is absent. Unrecovered by the pipeline; the render cycle
/// that triggered the load aborts.
#[derive(Error, Debug)]
pub enum FileFormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a CDF v3 file: bad magic bytes {got:02x?}")]
    InvalidMagic { got: Vec<u8> },

    #[error("whole-file compressed CDF is not supported")]
    CompressedFile,

    #[error("variable '{0}' uses a compressed storage record")]
    CompressedVariable(String),

    #[error("unsupported CDF version {version}.{release}")]
    UnsupportedVersion { version: i32, release: i32 },

    #[error("unknown data encoding code {0}")]
    UnsupportedEncoding(i32),

    #[error("variable '{name}' has unsupported data type code {data_type}")]
    UnsupportedDataType { name: String, data_type: i32 },

    #[error("unsupported CDF feature: {0}")]
    Unsupported(String),

    #[error("expected record type {expected} at offset {offset}, found {got}")]
    UnexpectedRecordType { expected: i32, got: i32, offset: u64 },

    #[error("variable '{0}' not found in file")]
    VariableNotFound(String),

    #[error("variable '{name}': storage holds {got} values, expected {expected}")]
    RecordCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("variable '{name}': {detail}")]
    ShapeMismatch { name: String, detail: String },

    #[error("epoch value {value} at record {index} is not a representable timestamp")]
    InvalidEpoch { index: usize, value: f64 },
}

// ---------------------------------------------------------------------------
// Epoch conversion
// ---------------------------------------------------------------------------

/// Convert a CDF_EPOCH value (ms since year 0) to a UTC timestamp.
/// Returns `None` for values outside chrono's representable range.
pub fn epoch_to_datetime(epoch_ms: f64) -> Option<DateTime<Utc>> {
    if !epoch_ms.is_finite() {
        return None;
    }
    let unix_ms = (epoch_ms - CDF_EPOCH_UNIX_OFFSET_MS).round();
    if unix_ms < i64::MIN as f64 || unix_ms > i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(unix_ms as i64).single()
}

/// Inverse of [`epoch_to_datetime`], used by the writer.
pub fn datetime_to_epoch(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 + CDF_EPOCH_UNIX_OFFSET_MS
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct VarEntry {
    name: String,
    data_type: i32,
    /// Last record number written, -1 when no records exist.
    max_rec: i32,
    record_variant: bool,
    /// Physical (varying) dimension sizes.
    dims: Vec<usize>,
    vxr_head: u64,
}

/// Random-access CDF reader over any seekable source.
#[derive(Debug)]
pub struct CdfReader<R> {
    source: R,
    data_little_endian: bool,
    vars: Vec<VarEntry>,
}

impl CdfReader<std::io::BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(std::io::BufReader::new(file))
    }
}

impl CdfReader<Cursor<Vec<u8>>> {
    /// Parse an in-memory file, e.g. an uploaded byte buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> CdfReader<R> {
    pub fn new(mut source: R) -> Result<Self> {
        let mut magic = [0u8; 8];
        source.read_exact(&mut magic)?;
        if magic[0..4] != MAGIC_V3 {
            return Err(FileFormatError::InvalidMagic {
                got: magic.to_vec(),
            });
        }
        if magic[4..8] == MAGIC_COMPRESSED {
            return Err(FileFormatError::CompressedFile);
        }
        if magic[4..8] != MAGIC_UNCOMPRESSED {
            return Err(FileFormatError::InvalidMagic {
                got: magic.to_vec(),
            });
        }

        let (gdr_offset, data_little_endian) = Self::read_cdr(&mut source)?;
        let vars = Self::read_gdr_and_vdrs(&mut source, gdr_offset)?;

        Ok(Self {
            source,
            data_little_endian,
            vars,
        })
    }

    /// Names of all zVariables, in file order.
    pub fn variable_names(&self) -> Vec<&str> {
        self.vars.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.vars.iter().any(|v| v.name == name)
    }

    /// Read a variable's full contents as an `f64` array.
    ///
    /// Record-variant variables come back with shape `[n_records, dims...]`,
    /// non-record-variant variables with shape `[dims...]`.
    pub fn varget(&mut self, name: &str) -> Result<ArrayD<f64>> {
        let var = self
            .vars
            .iter()
            .find(|v| v.name == name)
            .cloned()
            .ok_or_else(|| FileFormatError::VariableNotFound(name.to_string()))?;

        let elem_size = data_type_size(&var)?;
        let rec_len: usize = var.dims.iter().product::<usize>().max(1);

        let n_records = if var.record_variant {
            (var.max_rec + 1).max(0) as usize
        } else {
            if var.max_rec < 0 {
                return Err(FileFormatError::RecordCountMismatch {
                    name: var.name.clone(),
                    expected: 1,
                    got: 0,
                });
            }
            1
        };
        let expected = n_records * rec_len;

        let mut values: Vec<f64> = Vec::with_capacity(expected);
        let mut vxr_offset = var.vxr_head;
        while vxr_offset != 0 {
            vxr_offset = self.read_vxr(&var, vxr_offset, rec_len, elem_size, &mut values)?;
        }

        if values.len() != expected {
            return Err(FileFormatError::RecordCountMismatch {
                name: var.name.clone(),
                expected,
                got: values.len(),
            });
        }

        let shape: Vec<usize> = if var.record_variant {
            std::iter::once(n_records).chain(var.dims.iter().copied()).collect()
        } else {
            var.dims.clone()
        };
        ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| {
            FileFormatError::ShapeMismatch {
                name: var.name.clone(),
                detail: e.to_string(),
            }
        })
    }

    // -- record parsing --

    /// Returns (GDR offset, data-is-little-endian).
    fn read_cdr(source: &mut R) -> Result<(u64, bool)> {
        source.seek(SeekFrom::Start(8))?;
        let _size = read_i64(source)?;
        let rec_type = read_i32(source)?;
        if rec_type != REC_CDR {
            return Err(FileFormatError::UnexpectedRecordType {
                expected: REC_CDR,
                got: rec_type,
                offset: 8,
            });
        }
        let gdr_offset = read_i64(source)? as u64;
        let version = read_i32(source)?;
        let release = read_i32(source)?;
        if version != 3 {
            return Err(FileFormatError::UnsupportedVersion { version, release });
        }
        let encoding = read_i32(source)?;
        let _flags = read_i32(source)?;

        let little = if LITTLE_ENDIAN_ENCODINGS.contains(&encoding) {
            true
        } else if BIG_ENDIAN_ENCODINGS.contains(&encoding) {
            false
        } else {
            return Err(FileFormatError::UnsupportedEncoding(encoding));
        };
        Ok((gdr_offset, little))
    }

    fn read_gdr_and_vdrs(source: &mut R, gdr_offset: u64) -> Result<Vec<VarEntry>> {
        source.seek(SeekFrom::Start(gdr_offset))?;
        let _size = read_i64(source)?;
        let rec_type = read_i32(source)?;
        if rec_type != REC_GDR {
            return Err(FileFormatError::UnexpectedRecordType {
                expected: REC_GDR,
                got: rec_type,
                offset: gdr_offset,
            });
        }
        let _r_vdr_head = read_i64(source)?;
        let z_vdr_head = read_i64(source)? as u64;
        let _adr_head = read_i64(source)?;
        let _eof = read_i64(source)?;
        let n_r_vars = read_i32(source)?;
        if n_r_vars > 0 {
            return Err(FileFormatError::Unsupported(
                "rVariables (only zVariables are handled)".to_string(),
            ));
        }

        let mut vars = Vec::new();
        let mut offset = z_vdr_head;
        while offset != 0 {
            let (entry, next) = Self::read_zvdr(source, offset)?;
            vars.push(entry);
            offset = next;
        }
        Ok(vars)
    }

    fn read_zvdr(source: &mut R, offset: u64) -> Result<(VarEntry, u64)> {
        source.seek(SeekFrom::Start(offset))?;
        let _size = read_i64(source)?;
        let rec_type = read_i32(source)?;
        if rec_type != REC_ZVDR {
            return Err(FileFormatError::UnexpectedRecordType {
                expected: REC_ZVDR,
                got: rec_type,
                offset,
            });
        }
        let vdr_next = read_i64(source)? as u64;
        let data_type = read_i32(source)?;
        let max_rec = read_i32(source)?;
        let vxr_head = read_i64(source)? as u64;
        let _vxr_tail = read_i64(source)?;
        let flags = read_i32(source)?;
        let s_records = read_i32(source)?;
        let _rfu_b = read_i32(source)?;
        let _rfu_c = read_i32(source)?;
        let _rfu_f = read_i32(source)?;
        let _num_elems = read_i32(source)?;
        let _num = read_i32(source)?;
        let cpr_offset = read_i64(source)?;
        let _blocking_factor = read_i32(source)?;

        let mut name_buf = [0u8; VDR_NAME_LEN];
        source.read_exact(&mut name_buf)?;
        let name_end = name_buf.iter().position(|&b| b == 0).unwrap_or(VDR_NAME_LEN);
        let name = String::from_utf8_lossy(&name_buf[..name_end]).into_owned();

        if s_records != 0 {
            return Err(FileFormatError::Unsupported(format!(
                "sparse records on variable '{name}'"
            )));
        }
        if cpr_offset > 0 {
            return Err(FileFormatError::CompressedVariable(name));
        }

        let z_num_dims = read_i32(source)?.max(0) as usize;
        let mut dim_sizes = Vec::with_capacity(z_num_dims);
        for _ in 0..z_num_dims {
            dim_sizes.push(read_i32(source)?.max(0) as usize);
        }
        // Dimensions flagged NOVARY are not physically stored.
        let mut dims = Vec::with_capacity(z_num_dims);
        for &size in &dim_sizes {
            let varys = read_i32(source)?;
            if varys != 0 {
                dims.push(size);
            }
        }

        Ok((
            VarEntry {
                name,
                data_type,
                max_rec,
                record_variant: flags & 0x01 != 0,
                dims,
                vxr_head,
            },
            vdr_next,
        ))
    }

    /// Read one VXR, append its referenced VVR payloads, return the next VXR
    /// offset (0 terminates the chain).
    fn read_vxr(
        &mut self,
        var: &VarEntry,
        offset: u64,
        rec_len: usize,
        elem_size: usize,
        values: &mut Vec<f64>,
    ) -> Result<u64> {
        self.source.seek(SeekFrom::Start(offset))?;
        let _size = read_i64(&mut self.source)?;
        let rec_type = read_i32(&mut self.source)?;
        if rec_type != REC_VXR {
            return Err(FileFormatError::UnexpectedRecordType {
                expected: REC_VXR,
                got: rec_type,
                offset,
            });
        }
        let vxr_next = read_i64(&mut self.source)? as u64;
        let n_entries = read_i32(&mut self.source)?.max(0) as usize;
        let n_used = (read_i32(&mut self.source)?.max(0) as usize).min(n_entries);

        let mut first = Vec::with_capacity(n_entries);
        for _ in 0..n_entries {
            first.push(read_i32(&mut self.source)?);
        }
        let mut last = Vec::with_capacity(n_entries);
        for _ in 0..n_entries {
            last.push(read_i32(&mut self.source)?);
        }
        let mut offsets = Vec::with_capacity(n_entries);
        for _ in 0..n_entries {
            offsets.push(read_i64(&mut self.source)? as u64);
        }

        for i in 0..n_used {
            let n_recs = (last[i] - first[i] + 1).max(0) as usize;
            self.read_vvr(var, offsets[i], n_recs * rec_len, elem_size, values)?;
        }
        Ok(vxr_next)
    }

    fn read_vvr(
        &mut self,
        var: &VarEntry,
        offset: u64,
        n_values: usize,
        elem_size: usize,
        values: &mut Vec<f64>,
    ) -> Result<()> {
        self.source.seek(SeekFrom::Start(offset))?;
        let size = read_i64(&mut self.source)?;
        let rec_type = read_i32(&mut self.source)?;
        if rec_type == REC_CVVR {
            return Err(FileFormatError::CompressedVariable(var.name.clone()));
        }
        if rec_type != REC_VVR {
            return Err(FileFormatError::UnexpectedRecordType {
                expected: REC_VVR,
                got: rec_type,
                offset,
            });
        }

        let n_bytes = n_values * elem_size;
        let available = (size - 12).max(0) as usize;
        if available < n_bytes {
            return Err(FileFormatError::RecordCountMismatch {
                name: var.name.clone(),
                expected: n_values,
                got: available / elem_size.max(1),
            });
        }
        let mut buf = vec![0u8; n_bytes];
        self.source.read_exact(&mut buf)?;
        decode_values(&buf, var, elem_size, self.data_little_endian, values);
        Ok(())
    }
}

/// Element size in bytes for a variable's data type.
fn data_type_size(var: &VarEntry) -> Result<usize> {
    match var.data_type {
        CDF_INT1 | CDF_UINT1 | CDF_BYTE => Ok(1),
        CDF_INT2 | CDF_UINT2 => Ok(2),
        CDF_INT4 | CDF_UINT4 | CDF_REAL4 | CDF_FLOAT => Ok(4),
        CDF_INT8 | CDF_REAL8 | CDF_DOUBLE | CDF_EPOCH => Ok(8),
        CDF_TIME_TT2000 => Err(FileFormatError::Unsupported(format!(
            "TT2000 time stamps on variable '{}'",
            var.name
        ))),
        other => Err(FileFormatError::UnsupportedDataType {
            name: var.name.clone(),
            data_type: other,
        }),
    }
}

/// Decode raw element bytes into f64 values, honoring the file's encoding.
fn decode_values(buf: &[u8], var: &VarEntry, elem_size: usize, little: bool, out: &mut Vec<f64>) {
    for chunk in buf.chunks_exact(elem_size) {
        let v = match var.data_type {
            CDF_INT1 | CDF_BYTE => chunk[0] as i8 as f64,
            CDF_UINT1 => chunk[0] as f64,
            CDF_INT2 => {
                let raw: [u8; 2] = chunk.try_into().unwrap();
                (if little { i16::from_le_bytes(raw) } else { i16::from_be_bytes(raw) }) as f64
            }
            CDF_UINT2 => {
                let raw: [u8; 2] = chunk.try_into().unwrap();
                (if little { u16::from_le_bytes(raw) } else { u16::from_be_bytes(raw) }) as f64
            }
            CDF_INT4 => {
                let raw: [u8; 4] = chunk.try_into().unwrap();
                (if little { i32::from_le_bytes(raw) } else { i32::from_be_bytes(raw) }) as f64
            }
            CDF_UINT4 => {
                let raw: [u8; 4] = chunk.try_into().unwrap();
                (if little { u32::from_le_bytes(raw) } else { u32::from_be_bytes(raw) }) as f64
            }
            CDF_INT8 => {
                let raw: [u8; 8] = chunk.try_into().unwrap();
                (if little { i64::from_le_bytes(raw) } else { i64::from_be_bytes(raw) }) as f64
            }
            CDF_REAL4 | CDF_FLOAT => {
                let raw: [u8; 4] = chunk.try_into().unwrap();
                (if little { f32::from_le_bytes(raw) } else { f32::from_be_bytes(raw) }) as f64
            }
            // CDF_REAL8 | CDF_DOUBLE | CDF_EPOCH
            _ => {
                let raw: [u8; 8] = chunk.try_into().unwrap();
                if little { f64::from_le_bytes(raw) } else { f64::from_be_bytes(raw) }
            }
        };
        out.push(v);
    }
}

fn read_i32<R: Read>(source: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    source.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_i64<R: Read>(source: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    source.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

struct BuilderVar {
    name: String,
    data_type: i32,
    dims: Vec<usize>,
    record_variant: bool,
    n_records: usize,
    values: Vec<f64>,
}

/// Assembles an uncompressed, network-encoded CDF v3 file from f64 variables.
/// One VXR and one VVR per variable; enough for the sample generator and the
/// test fixtures this repo needs.
#[derive(Default)]
pub struct CdfBuilder {
    vars: Vec<BuilderVar>,
}

impl CdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record-variant CDF_EPOCH variable, one value per record.
    pub fn epoch(mut self, name: &str, epochs: &[f64]) -> Self {
        self.vars.push(BuilderVar {
            name: name.to_string(),
            data_type: CDF_EPOCH,
            dims: Vec::new(),
            record_variant: true,
            n_records: epochs.len(),
            values: epochs.to_vec(),
        });
        self
    }

    /// Record-variant scalar series (CDF_DOUBLE, one value per record).
    pub fn series(mut self, name: &str, values: &[f64]) -> Self {
        self.vars.push(BuilderVar {
            name: name.to_string(),
            data_type: CDF_DOUBLE,
            dims: Vec::new(),
            record_variant: true,
            n_records: values.len(),
            values: values.to_vec(),
        });
        self
    }

    /// Record-variant channel-resolved series: `n_records` records of
    /// `n_channels` doubles each, row-major.
    pub fn channels(mut self, name: &str, n_records: usize, n_channels: usize, values: &[f64]) -> Self {
        assert_eq!(values.len(), n_records * n_channels);
        self.vars.push(BuilderVar {
            name: name.to_string(),
            data_type: CDF_DOUBLE,
            dims: vec![n_channels],
            record_variant: true,
            n_records,
            values: values.to_vec(),
        });
        self
    }

    /// Non-record-variant 1-D variable (fixed axis, e.g. channel centers).
    pub fn fixed(mut self, name: &str, values: &[f64]) -> Self {
        self.vars.push(BuilderVar {
            name: name.to_string(),
            data_type: CDF_DOUBLE,
            dims: vec![values.len()],
            record_variant: false,
            n_records: 1,
            values: values.to_vec(),
        });
        self
    }

    pub fn write_to<P: AsRef<Path>>(self, path: P) -> Result<()> {
        std::fs::write(path, self.build())?;
        Ok(())
    }

    /// Serialize to an in-memory file image.
    pub fn build(self) -> Vec<u8> {
        const CDR_SIZE: u64 = 312;
        const GDR_SIZE: u64 = 84;
        const VXR_SIZE: u64 = 44;

        let cdr_offset: u64 = 8;
        let gdr_offset: u64 = cdr_offset + CDR_SIZE;

        // Lay out each variable's zVDR + VXR + VVR block.
        let mut zvdr_offsets = Vec::with_capacity(self.vars.len());
        let mut vxr_offsets = Vec::with_capacity(self.vars.len());
        let mut vvr_offsets = Vec::with_capacity(self.vars.len());
        let mut cursor = gdr_offset + GDR_SIZE;
        for var in &self.vars {
            let zvdr_size = 344 + 8 * var.dims.len() as u64;
            let vvr_size = 12 + 8 * var.values.len() as u64;
            zvdr_offsets.push(cursor);
            vxr_offsets.push(cursor + zvdr_size);
            vvr_offsets.push(cursor + zvdr_size + VXR_SIZE);
            cursor += zvdr_size + VXR_SIZE + vvr_size;
        }
        let eof = cursor;

        let mut out = Vec::with_capacity(eof as usize);
        out.extend_from_slice(&MAGIC_V3);
        out.extend_from_slice(&MAGIC_UNCOMPRESSED);

        // CDR
        push_i64(&mut out, CDR_SIZE as i64);
        push_i32(&mut out, REC_CDR);
        push_i64(&mut out, gdr_offset as i64);
        push_i32(&mut out, 3); // version
        push_i32(&mut out, 9); // release
        push_i32(&mut out, ENCODING_NETWORK);
        push_i32(&mut out, 0x03); // row-major, single-file
        push_i32(&mut out, 0); // rfuA
        push_i32(&mut out, 0); // rfuB
        push_i32(&mut out, 0); // increment
        push_i32(&mut out, 0); // identifier
        push_i32(&mut out, -1); // rfuE
        push_text(&mut out, "Common Data Format (CDF)", CDR_COPYRIGHT_LEN);

        // GDR
        push_i64(&mut out, GDR_SIZE as i64);
        push_i32(&mut out, REC_GDR);
        push_i64(&mut out, 0); // rVDRhead
        push_i64(&mut out, zvdr_offsets.first().copied().unwrap_or(0) as i64);
        push_i64(&mut out, 0); // ADRhead
        push_i64(&mut out, eof as i64);
        push_i32(&mut out, 0); // NrVars
        push_i32(&mut out, 0); // NumAttr
        push_i32(&mut out, -1); // rMaxRec
        push_i32(&mut out, 0); // rNumDims
        push_i32(&mut out, self.vars.len() as i32);
        push_i64(&mut out, 0); // UIRhead
        push_i32(&mut out, 0); // rfuC
        push_i32(&mut out, -1); // LeapSecondLastUpdated
        push_i32(&mut out, -1); // rfuE

        for (i, var) in self.vars.iter().enumerate() {
            let zvdr_size = 344 + 8 * var.dims.len() as u64;
            let next = zvdr_offsets.get(i + 1).copied().unwrap_or(0);

            // zVDR
            push_i64(&mut out, zvdr_size as i64);
            push_i32(&mut out, REC_ZVDR);
            push_i64(&mut out, next as i64);
            push_i32(&mut out, var.data_type);
            push_i32(&mut out, var.n_records as i32 - 1);
            push_i64(&mut out, vxr_offsets[i] as i64);
            push_i64(&mut out, vxr_offsets[i] as i64);
            push_i32(&mut out, if var.record_variant { 0x01 } else { 0x00 });
            push_i32(&mut out, 0); // SRecords
            push_i32(&mut out, 0); // rfuB
            push_i32(&mut out, -1); // rfuC
            push_i32(&mut out, -1); // rfuF
            push_i32(&mut out, 1); // NumElems
            push_i32(&mut out, i as i32);
            push_i64(&mut out, -1); // CPRorSPRoffset
            push_i32(&mut out, 0); // BlockingFactor
            push_text(&mut out, &var.name, VDR_NAME_LEN);
            push_i32(&mut out, var.dims.len() as i32);
            for &d in &var.dims {
                push_i32(&mut out, d as i32);
            }
            for _ in &var.dims {
                push_i32(&mut out, -1); // VARY
            }

            // VXR
            push_i64(&mut out, VXR_SIZE as i64);
            push_i32(&mut out, REC_VXR);
            push_i64(&mut out, 0); // VXRnext
            push_i32(&mut out, 1); // Nentries
            push_i32(&mut out, 1); // NusedEntries
            push_i32(&mut out, 0); // First
            push_i32(&mut out, var.n_records as i32 - 1); // Last
            push_i64(&mut out, vvr_offsets[i] as i64);

            // VVR
            push_i64(&mut out, 12 + 8 * var.values.len() as i64);
            push_i32(&mut out, REC_VVR);
            for &v in &var.values {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }

        out
    }
}

fn push_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_i64(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_text(out: &mut Vec<u8>, text: &str, width: usize) {
    let bytes = text.as_bytes();
    let n = bytes.len().min(width);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + (width - n), 0);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_bytes() -> Vec<u8> {
        CdfBuilder::new()
            .epoch("epoch", &[62167219200000.0, 62167219201000.0])
            .series("flux", &[5.0, 15.0])
            .channels("flux2d", 2, 2, &[2.0, 4.0, 6.0, 10.0])
            .fixed("energy", &[100.0, 200.0, 400.0])
            .build()
    }

    #[test]
    fn round_trip_preserves_shapes_and_values() {
        let mut cdf = CdfReader::from_bytes(sample_bytes()).unwrap();
        assert_eq!(cdf.variable_names(), vec!["epoch", "flux", "flux2d", "energy"]);
        assert!(cdf.has_variable("flux"));
        assert!(!cdf.has_variable("flux_uncer"));

        let epoch = cdf.varget("epoch").unwrap();
        assert_eq!(epoch.shape(), &[2]);
        assert_relative_eq!(epoch[[0]], 62167219200000.0);

        let flux = cdf.varget("flux").unwrap();
        assert_eq!(flux.shape(), &[2]);
        assert_relative_eq!(flux[[1]], 15.0);

        let flux2d = cdf.varget("flux2d").unwrap();
        assert_eq!(flux2d.shape(), &[2, 2]);
        assert_relative_eq!(flux2d[[1, 1]], 10.0);

        let energy = cdf.varget("energy").unwrap();
        assert_eq!(energy.shape(), &[3]);
        assert_relative_eq!(energy[[2]], 400.0);
    }

    #[test]
    fn missing_variable_is_a_typed_error() {
        let mut cdf = CdfReader::from_bytes(sample_bytes()).unwrap();
        let err = cdf.varget("flux_uncer").unwrap_err();
        assert!(matches!(err, FileFormatError::VariableNotFound(ref n) if n == "flux_uncer"));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let err = CdfReader::from_bytes(vec![0u8; 64]).unwrap_err();
        assert!(matches!(err, FileFormatError::InvalidMagic { .. }));
    }

    #[test]
    fn compressed_file_is_rejected() {
        let mut bytes = sample_bytes();
        bytes[4..8].copy_from_slice(&MAGIC_COMPRESSED);
        let err = CdfReader::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, FileFormatError::CompressedFile));
    }

    #[test]
    fn epoch_zero_of_unix_era() {
        let t = epoch_to_datetime(62167219200000.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn epoch_conversion_round_trips() {
        let t = Utc.with_ymd_and_hms(2025, 5, 27, 6, 30, 15).unwrap();
        let e = datetime_to_epoch(t);
        assert_eq!(epoch_to_datetime(e).unwrap(), t);
        // 2000-01-01 is a documented reference value for the encoding.
        let y2k = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_relative_eq!(datetime_to_epoch(y2k), 63113904000000.0);
    }

    #[test]
    fn non_finite_epochs_yield_none() {
        assert!(epoch_to_datetime(f64::NAN).is_none());
        assert!(epoch_to_datetime(f64::INFINITY).is_none());
    }
}
