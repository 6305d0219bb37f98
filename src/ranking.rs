use crate::error::GameError;
use chrono::{Local, TimeZone};
use std::{
    cmp::Ordering,
    fs::{self, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

/// On-disk size of one record: i64 time, i32 stage, 101-byte name, 7 bytes pad.
pub(crate) const RECORD_SIZE: usize = 120;
pub(crate) const NAME_FIELD: usize = 101;
pub(crate) const MAX_NAME_BYTES: usize = NAME_FIELD - 1;
pub(crate) const MAX_RECORDS: usize = 100;

const STAGE_OFFSET: usize = 8;
const NAME_OFFSET: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) timestamp: i64,
    pub(crate) stage: i32,
    pub(crate) name: String,
}

impl Record {
    pub(crate) fn new(timestamp: i64, stage: i32, name: &str) -> Self {
        Self {
            timestamp,
            stage,
            name: clamp_name(name).to_string(),
        }
    }

    pub(crate) fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[..STAGE_OFFSET].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[STAGE_OFFSET..NAME_OFFSET].copy_from_slice(&self.stage.to_le_bytes());
        let name = clamp_name(&self.name).as_bytes();
        buf[NAME_OFFSET..NAME_OFFSET + name.len()].copy_from_slice(name);
        buf
    }

    pub(crate) fn decode(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&buf[..STAGE_OFFSET]);
        let mut stage = [0u8; 4];
        stage.copy_from_slice(&buf[STAGE_OFFSET..NAME_OFFSET]);

        let field = &buf[NAME_OFFSET..NAME_OFFSET + NAME_FIELD];
        let end = field.iter().position(|&b| b == 0).unwrap_or(MAX_NAME_BYTES);
        Self {
            timestamp: i64::from_le_bytes(ts),
            stage: i32::from_le_bytes(stage),
            name: String::from_utf8_lossy(&field[..end]).into_owned(),
        }
    }
}

/// Longest prefix that fits the name field without splitting a character.
fn clamp_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_BYTES {
        return name;
    }
    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Display order: lowest stage first, newer records first within a stage.
pub(crate) fn compare_records(a: &Record, b: &Record) -> Ordering {
    a.stage
        .cmp(&b.stage)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

pub(crate) fn sort_for_display(records: &mut [Record]) {
    records.sort_by(compare_records);
}

/// Reads up to `MAX_RECORDS` whole records. A partial trailing record ends
/// the read quietly.
pub(crate) fn read_records<R: Read>(mut reader: R) -> io::Result<Vec<Record>> {
    let mut out = Vec::new();
    let mut buf = [0u8; RECORD_SIZE];
    while out.len() < MAX_RECORDS {
        let n = fill(&mut reader, &mut buf)?;
        if n < RECORD_SIZE {
            if n > 0 {
                log::warn!("ignoring {n} trailing bytes of a partial ranking record");
            }
            break;
        }
        out.push(Record::decode(&buf));
    }
    Ok(out)
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut got = 0;
    while got < buf.len() {
        match reader.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(got)
}

/// Where finished runs end up.
pub(crate) trait RecordSink {
    fn append(&mut self, record: &Record) -> Result<(), GameError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RankedRow {
    pub(crate) rank: usize,
    pub(crate) when: String,
    pub(crate) stage: i32,
    pub(crate) name: String,
}

/// Append-only log of finished runs.
pub(crate) struct RankingStore {
    path: PathBuf,
}

impl RankingStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn load_all(&self) -> Result<Vec<Record>, GameError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no ranking log at {} yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(GameError::resource(&self.path, e)),
        };
        let records =
            read_records(io::BufReader::new(file)).map_err(|e| GameError::resource(&self.path, e))?;
        log::info!("loaded {} ranking records", records.len());
        Ok(records)
    }

    pub(crate) fn report(&self) -> Result<Vec<RankedRow>, GameError> {
        let mut records = self.load_all()?;
        sort_for_display(&mut records);
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(i, r)| RankedRow {
                rank: i + 1,
                when: format_timestamp(r.timestamp),
                stage: r.stage,
                name: r.name,
            })
            .collect())
    }
}

impl RecordSink for RankingStore {
    fn append(&mut self, record: &Record) -> Result<(), GameError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| GameError::resource(dir, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| GameError::resource(&self.path, e))?;
        file.write_all(&record.encode())
            .map_err(|e| GameError::resource(&self.path, e))?;
        log::info!(
            "recorded stage {} for {:?} in {}",
            record.stage,
            record.name,
            self.path().display()
        );
        Ok(())
    }
}

pub(crate) fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "????-??-?? ??:??:??".to_string(),
    }
}
