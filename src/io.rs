//! Light-curve readers.
//!
//! Two input formats are accepted:
//!
//! - CSV with `time,brightness` columns and an optional third `flag` column
//!   (`good`, `clipped`, `bad`, or `0`/`1` where `1` marks a bad sample).
//!   The first data line is taken as a header when its first field does not
//!   start like a number. Blank lines and lines starting with `#` are ignored.
//!   Any other unparsable line is an error.
//! - JSON: an array of `{"time": .., "brightness": .., "flag": ..}` objects,
//!   `flag` optional.

use crate::core::{QualityFlag, Sample, Series};
use crate::error::{Result, TransitError};
use std::io::BufRead;

/// Read a light curve from CSV.
pub fn read_csv<R: BufRead>(reader: R) -> Result<Series> {
    let mut samples = Vec::new();
    let mut first = true;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| TransitError::Parse(format!("line {}: {}", line_no, e)))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if std::mem::take(&mut first) && is_header(parts[0]) {
            continue;
        }
        if parts.len() < 2 {
            return Err(TransitError::Parse(format!(
                "line {}: expected at least 2 columns, got {}",
                line_no,
                parts.len()
            )));
        }

        let time = parse_number(parts[0], "time", line_no)?;
        let brightness = parse_number(parts[1], "brightness", line_no)?;
        let flag = match parts.get(2) {
            Some(field) => parse_flag(field, line_no)?,
            None => QualityFlag::Good,
        };
        samples.push(Sample::new(time, brightness).with_flag(flag));
    }

    Series::new(samples)
}

/// Parse a light curve from a JSON array of samples.
pub fn series_from_json(json: &str) -> Result<Series> {
    let samples: Vec<Sample> =
        serde_json::from_str(json).map_err(|e| TransitError::Parse(e.to_string()))?;
    Series::new(samples)
}

fn is_header(field: &str) -> bool {
    !field.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
}

fn parse_number(field: &str, column: &str, line_no: usize) -> Result<f64> {
    field.parse().map_err(|_| {
        TransitError::Parse(format!("line {}: invalid {} '{}'", line_no, column, field))
    })
}

fn parse_flag(field: &str, line_no: usize) -> Result<QualityFlag> {
    match field.to_ascii_lowercase().as_str() {
        "" | "0" | "good" => Ok(QualityFlag::Good),
        "1" | "bad" => Ok(QualityFlag::Bad),
        "clipped" => Ok(QualityFlag::Clipped),
        other => Err(TransitError::Parse(format!(
            "line {}: unknown quality flag '{}'",
            line_no, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_csv_with_header_and_flags() {
        let csv = "time,brightness,flag\n\
                   0.00,1.001,good\n\
                   # comment\n\
                   \n\
                   0.05,0.998\n\
                   0.10,0.500,1\n";
        let series = read_csv(Cursor::new(csv)).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.samples()[0].brightness, 1.001);
        assert_eq!(series.samples()[1].flag, QualityFlag::Good);
        assert_eq!(series.samples()[2].flag, QualityFlag::Bad);
        assert_eq!(series.usable_count(), 2);
    }

    #[test]
    fn reads_headerless_csv_out_of_order() {
        let series = read_csv(Cursor::new("0.2,1.0\n0.1,0.99\n")).unwrap();
        assert_eq!(series.times(), vec![0.1, 0.2]);
    }

    #[test]
    fn reports_bad_csv_lines() {
        let err = read_csv(Cursor::new("time,brightness\n0.0,abc\n")).unwrap_err();
        assert_eq!(
            err,
            TransitError::Parse("line 2: invalid brightness 'abc'".to_string())
        );

        let err = read_csv(Cursor::new("0.0\n")).unwrap_err();
        assert!(matches!(err, TransitError::Parse(_)));

        let err = read_csv(Cursor::new("0.0,1.0,maybe\n")).unwrap_err();
        assert!(matches!(err, TransitError::Parse(_)));
    }

    #[test]
    fn only_first_line_may_be_header() {
        let err = read_csv(Cursor::new("time,brightness\n1.0x,0.99\n")).unwrap_err();
        assert_eq!(
            err,
            TransitError::Parse("line 2: invalid time '1.0x'".to_string())
        );

        let err = read_csv(Cursor::new("1.0x,0.99\n1.1,0.98\n")).unwrap_err();
        assert!(matches!(err, TransitError::Parse(_)));

        let err = read_csv(Cursor::new("time,brightness\nday,flux\n0.0,1.0\n")).unwrap_err();
        assert_eq!(
            err,
            TransitError::Parse("line 2: invalid time 'day'".to_string())
        );

        let series = read_csv(Cursor::new("# exported\ntime,brightness\n0.0,1.0\n")).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn reads_json_samples() {
        let json = r#"[
            {"time": 0.0, "brightness": 1.0},
            {"time": 0.05, "brightness": 0.97, "flag": "bad"}
        ]"#;
        let series = series_from_json(json).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.samples()[1].flag, QualityFlag::Bad);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            series_from_json("{\"time\": 1}"),
            Err(TransitError::Parse(_))
        ));
    }
}
