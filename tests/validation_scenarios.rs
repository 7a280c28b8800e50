//! End-to-end scenarios: load a CID from rows, drive a data file through
//! `validator::Reader`/`Writer`, and check the outcomes.

use std::io::Write;

use cutcheck::cid::{build_cid_from_rows, Cid};
use cutcheck::error::ErrorKind;
use cutcheck::registry::Registry;
use cutcheck::validator::{OnError, Reader, Writer};

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

fn cid_from(rows: &[Vec<String>]) -> Cid {
    let registry = Registry::with_builtins();
    build_cid_from_rows(rows, "test.cid", &registry).unwrap()
}

fn data_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

/// S1: an integer field with a numeric range rejects out-of-range and
/// non-numeric values, and empty is not allowed by default.
#[test]
fn integer_field_with_range() {
    let cid = cid_from(&[row(&["d", "format", "delimited"]), row(&["f", "amount", "", "", "", "Integer", "0...99"])]);
    let file = data_file("0\n50\n99\n-1\n100\nabc\n\n");
    let reader = Reader::new(&cid, file.path(), OnError::Yield, None).unwrap();
    let results: Vec<_> = reader.collect();

    assert!(results[0].as_ref().unwrap() == &vec!["0".to_string()]);
    assert!(results[1].as_ref().unwrap() == &vec!["50".to_string()]);
    assert!(results[2].as_ref().unwrap() == &vec!["99".to_string()]);
    for bad in &results[3..7] {
        let error = bad.as_ref().unwrap_err();
        assert_eq!(error.kind, ErrorKind::FieldValue);
    }
}

/// S2: `IsUnique` across two fields reports the duplicate row and points
/// back at the first occurrence.
#[test]
fn is_unique_across_two_fields() {
    let cid = cid_from(&[
        row(&["d", "format", "delimited"]),
        row(&["f", "branch", "", "", "", "Integer", ""]),
        row(&["f", "customer", "", "", "", "Integer", ""]),
        row(&["c", "u", "IsUnique", "branch, customer"]),
    ]);
    let file = data_file("38000,23\n38000,59\n38000,23\n");
    let reader = Reader::new(&cid, file.path(), OnError::Yield, None).unwrap();
    let results: Vec<_> = reader.collect();

    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    let error = results[2].as_ref().unwrap_err();
    assert_eq!(error.kind, ErrorKind::Check);
    assert!(error.see_also_location.is_some());
}

/// S3: a `DistinctCount` check only fails at `check_at_end`, not mid-pass.
#[test]
fn distinct_count_check_at_end() {
    let cid = cid_from(&[
        row(&["d", "format", "delimited"]),
        row(&["f", "branch", "", "", "", "Integer", ""]),
        row(&["c", "few branches", "DistinctCount", "branch < 3"]),
    ]);
    let file = data_file("38000\n38001\n");
    let mut reader = Reader::new(&cid, file.path(), OnError::Raise, None).unwrap();
    for result in reader.by_ref() {
        result.unwrap();
    }
    assert!(reader.close().is_ok());

    let file = data_file("38000\n38001\n38002\n");
    let mut reader = Reader::new(&cid, file.path(), OnError::Raise, None).unwrap();
    for result in reader.by_ref() {
        result.unwrap();
    }
    let error = reader.close().unwrap_err();
    assert_eq!(error.kind, ErrorKind::Check);
    assert!(error.message.contains("distinct count is 3"));
}

/// S4: the fixed format's `any` line delimiter accepts `\n`, `\r\n`, and a
/// trailing `\r`, and a short final record names the missing field.
#[test]
fn fixed_format_with_any_line_delimiter() {
    let cid = cid_from(&[
        row(&["d", "format", "fixed"]),
        row(&["f", "name", "", "", "4", "Text", ""]),
        row(&["f", "size", "", "", "3", "Integer", ""]),
    ]);
    let file = data_file("hugo172\nsepp163\r\nmary167\r");
    let reader = Reader::new(&cid, file.path(), OnError::Raise, None).unwrap();
    let rows: Vec<_> = reader.collect::<cutcheck::error::Result<Vec<_>>>().unwrap();
    assert_eq!(rows, vec![vec!["hugo", "172"], vec!["sepp", "163"], vec!["mary", "167"]]);

    let file = data_file("john");
    let mut reader = Reader::new(&cid, file.path(), OnError::Raise, None).unwrap();
    let error = reader.next().unwrap().unwrap_err();
    assert_eq!(error.kind, ErrorKind::DataFormat);
}

/// S6: the on-error policy governs whether a bad row raises, is dropped,
/// or is yielded in place.
#[test]
fn on_error_policies() {
    let cid = cid_from(&[row(&["d", "format", "delimited"]), row(&["f", "digit", "", "", "", "Integer", "0...9"])]);

    let file = data_file("1\nabc\n3\n");
    let reader = Reader::new(&cid, file.path(), OnError::Yield, None).unwrap();
    let results: Vec<_> = reader.collect();
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());

    let file = data_file("1\nabc\n3\n");
    let reader = Reader::new(&cid, file.path(), OnError::Continue, None).unwrap();
    let rows: Vec<_> = reader.collect::<cutcheck::error::Result<Vec<_>>>().unwrap();
    assert_eq!(rows, vec![vec!["1"], vec!["3"]]);

    let file = data_file("1\nabc\n3\n");
    let mut reader = Reader::new(&cid, file.path(), OnError::Raise, None).unwrap();
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().unwrap().is_err());
}

/// Read-then-write round trip for a delimited format with explicit
/// settings: the writer reproduces the same rows it validated.
#[test]
fn read_then_write_round_trip() {
    let cid = cid_from(&[
        row(&["d", "format", "delimited"]),
        row(&["f", "branch", "", "", "", "Integer", ""]),
        row(&["f", "customer", "", "", "", "Integer", ""]),
    ]);
    let input = data_file("38000,23\n38100,45\n");
    let reader = Reader::new(&cid, input.path(), OnError::Raise, None).unwrap();
    let rows: Vec<_> = reader.collect::<cutcheck::error::Result<Vec<_>>>().unwrap();

    let output = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    let mut writer = Writer::new(&cid, output.path()).unwrap();
    for row in &rows {
        writer.write_row(row).unwrap();
    }
    writer.close().unwrap();

    let written = std::fs::read_to_string(output.path()).unwrap();
    assert_eq!(written, "38000,23\n38100,45\n");
}
