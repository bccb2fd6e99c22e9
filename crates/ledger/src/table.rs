//! The shared status table and its CSV wire format.
//!
//! The table is one small CSV object living in the store next to the data it
//! tracks. Producers and consumers each read the whole thing, mutate their
//! rows, and write the whole thing back; the format has to stay readable by
//! whatever else inspects the bucket, so it is exactly two columns with a
//! fixed header. The parser is tolerant of artifacts other writers leave
//! behind (quoted fields, float-formatted integers), the writer always emits
//! the canonical form.

use crate::error::Error;

pub const STATUS_HEADER: &str = "filename,olive_process_timestamp";

/// One tracked file. A row exists from the moment the file is uploaded;
/// `processed_at` stays empty until the engine has produced results, then
/// holds the completion time as epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub filename: String,
    pub processed_at: Option<i64>,
}

impl JobRecord {
    pub fn pending(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            processed_at: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }
}

/// Ordered set of job records, unique by filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    records: Vec<JobRecord>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    pub fn get(&self, filename: &str) -> Option<&JobRecord> {
        self.records.iter().find(|r| r.filename == filename)
    }

    pub fn processed_at(&self, filename: &str) -> Option<i64> {
        self.get(filename).and_then(|r| r.processed_at)
    }

    /// Rows whose file has not been processed yet, in table order.
    pub fn pending(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter().filter(|r| !r.is_processed())
    }

    /// Appends a record unless its filename is already tracked. Returns
    /// whether the record was added, so callers re-applying a mutation after
    /// a save conflict stay idempotent.
    pub fn insert(&mut self, record: JobRecord) -> bool {
        if self.contains(&record.filename) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Sets the processed timestamp of an existing row. A missing row is an
    /// error, never an insert: a file nobody uploaded must not appear
    /// processed.
    pub fn mark_processed(&mut self, filename: &str, at: i64) -> Result<(), Error> {
        match self.records.iter_mut().find(|r| r.filename == filename) {
            Some(record) => {
                record.processed_at = Some(at);
                Ok(())
            }
            None => Err(Error::KeyMissing {
                filename: filename.to_string(),
            }),
        }
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from(STATUS_HEADER);
        out.push('\n');
        for record in &self.records {
            out.push_str(&csv_field(&record.filename));
            out.push(',');
            if let Some(at) = record.processed_at {
                out.push_str(&at.to_string());
            }
            out.push('\n');
        }
        out
    }

    pub fn from_csv(text: &str) -> Result<Self, Error> {
        let mut lines = text.lines().enumerate();

        let (_, header) = lines.next().ok_or(Error::MalformedTable {
            line: 1,
            reason: "empty table, missing header".to_string(),
        })?;
        if header.trim_end_matches('\r').trim() != STATUS_HEADER {
            return Err(Error::MalformedTable {
                line: 1,
                reason: format!("unexpected header {header:?}"),
            });
        }

        let mut table = StatusTable::new();
        for (idx, raw) in lines {
            let line_no = idx + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let (filename, timestamp) = split_row(line).ok_or_else(|| Error::MalformedTable {
                line: line_no,
                reason: "expected two comma-separated fields".to_string(),
            })?;
            let processed_at = parse_timestamp(&timestamp).map_err(|reason| {
                Error::MalformedTable {
                    line: line_no,
                    reason,
                }
            })?;

            if !table.insert(JobRecord {
                filename: filename.clone(),
                processed_at,
            }) {
                return Err(Error::MalformedTable {
                    line: line_no,
                    reason: format!("duplicate filename {filename:?}"),
                });
            }
        }
        Ok(table)
    }
}

// Keys are single-line by construction, so quoting only has to cover commas
// and quotes; the line-oriented parser above could not read an embedded
// newline back.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn split_row(line: &str) -> Option<(String, String)> {
    let Some(rest) = line.strip_prefix('"') else {
        return line
            .split_once(',')
            .map(|(name, ts)| (name.to_string(), ts.to_string()));
    };

    // Quoted filename; doubled quotes unescape to one.
    let mut field = String::new();
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        if c != '"' {
            field.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => field.push('"'),
            Some(',') => return Some((field, chars.as_str().to_string())),
            None => return Some((field, String::new())),
            Some(_) => return None,
        }
    }
    None
}

/// An empty field is a pending row. Timestamps are written as integers, but
/// float-formatted values (`1659822520.0`) parse too: the python producer
/// that shares this table stores the column as floats once any row is null.
fn parse_timestamp(raw: &str) -> Result<Option<i64>, String> {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(Some(n));
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Some(f as i64)),
        _ => Err(format!("unparseable timestamp {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(rows: &[(&str, Option<i64>)]) -> StatusTable {
        let mut table = StatusTable::new();
        for (name, ts) in rows {
            table.insert(JobRecord {
                filename: name.to_string(),
                processed_at: *ts,
            });
        }
        table
    }

    #[test]
    fn serializes_pending_and_processed_rows() {
        let table = table_with(&[("a.wav", None), ("b.flac", Some(1659822520))]);
        assert_eq!(
            table.to_csv(),
            "filename,olive_process_timestamp\na.wav,\nb.flac,1659822520\n"
        );
    }

    #[test]
    fn parses_what_it_writes() {
        let table = table_with(&[
            ("meeting.wav", None),
            ("call,with,commas.wav", Some(17)),
            ("say \"cheese\".wav", Some(9)),
            ("interview.mp3", Some(1659822520)),
        ]);
        let reparsed = StatusTable::from_csv(&table.to_csv()).unwrap();
        assert_eq!(reparsed, table);
    }

    #[test]
    fn parses_float_formatted_timestamps() {
        let csv = "filename,olive_process_timestamp\na.wav,1659822520.0\n";
        let table = StatusTable::from_csv(csv).unwrap();
        assert_eq!(table.processed_at("a.wav"), Some(1659822520));
    }

    #[test]
    fn parses_quoted_filenames() {
        let csv = "filename,olive_process_timestamp\n\"two, part.wav\",5\n";
        let table = StatusTable::from_csv(csv).unwrap();
        assert_eq!(table.processed_at("two, part.wav"), Some(5));
    }

    #[test]
    fn tolerates_crlf_and_trailing_blank_lines() {
        let csv = "filename,olive_process_timestamp\r\na.wav,\r\n\r\n";
        let table = StatusTable::from_csv(csv).unwrap();
        assert_eq!(table.len(), 1);
        assert!(!table.records()[0].is_processed());
    }

    #[test]
    fn rejects_wrong_header() {
        let err = StatusTable::from_csv("name,when\na.wav,\n").unwrap_err();
        assert!(matches!(err, Error::MalformedTable { line: 1, .. }));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(StatusTable::from_csv("").is_err());
    }

    #[test]
    fn rejects_duplicate_filenames() {
        let csv = "filename,olive_process_timestamp\na.wav,\na.wav,3\n";
        let err = StatusTable::from_csv(csv).unwrap_err();
        assert!(matches!(err, Error::MalformedTable { line: 3, .. }));
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let csv = "filename,olive_process_timestamp\na.wav,soon\n";
        assert!(StatusTable::from_csv(csv).is_err());
    }

    #[test]
    fn insert_is_idempotent_per_filename() {
        let mut table = StatusTable::new();
        assert!(table.insert(JobRecord::pending("a.wav")));
        assert!(!table.insert(JobRecord::pending("a.wav")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn mark_processed_sets_epoch_seconds() {
        let mut table = table_with(&[("a.wav", None)]);
        table.mark_processed("a.wav", 1700000000).unwrap();
        assert_eq!(table.processed_at("a.wav"), Some(1700000000));
        assert!(table.get("a.wav").unwrap().is_processed());
    }

    #[test]
    fn mark_processed_on_missing_row_is_an_error() {
        let mut table = table_with(&[("a.wav", None)]);
        let err = table.mark_processed("ghost.wav", 1).unwrap_err();
        assert!(err.is_key_missing());
        // The table is untouched.
        assert_eq!(table.len(), 1);
        assert!(!table.get("a.wav").unwrap().is_processed());
    }

    #[test]
    fn pending_filters_processed_rows() {
        let table = table_with(&[("a.wav", None), ("b.wav", Some(9)), ("c.wav", None)]);
        let pending: Vec<&str> = table.pending().map(|r| r.filename.as_str()).collect();
        assert_eq!(pending, vec!["a.wav", "c.wav"]);
    }
}
