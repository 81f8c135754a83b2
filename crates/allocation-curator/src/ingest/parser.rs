use std::collections::BTreeMap;
use std::io::Read;

/// One CSV row keyed by header, cells trimmed.
pub(crate) type RawRow = BTreeMap<String, String>;

/// Reads header-keyed rows, failing once more than `max_rows` data rows are seen.
pub(crate) fn parse_rows<R: Read>(
    reader: R,
    max_rows: usize,
) -> Result<Vec<RawRow>, super::ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for record in csv_reader.deserialize::<RawRow>() {
        let row = record?;
        if row.values().all(|cell| cell.is_empty()) {
            continue;
        }
        if rows.len() == max_rows {
            return Err(super::ImportError::TooManyRows { limit: max_rows });
        }
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ImportError;
    use std::io::Cursor;

    #[test]
    fn cells_are_trimmed_and_blank_rows_skipped() {
        let rows = parse_rows(
            Cursor::new("ClientID , ClientName\n C1 ,  Acme Corp \n , \n\nC2,Globex\n"),
            10,
        )
        .expect("parse");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ClientID"], "C1");
        assert_eq!(rows[0]["ClientName"], "Acme Corp");
        assert_eq!(rows[1]["ClientName"], "Globex");
    }

    #[test]
    fn quoted_commas_stay_in_one_cell() {
        let rows = parse_rows(
            Cursor::new("WorkerID,Skills\nW1,\"rust, sql\"\n"),
            10,
        )
        .expect("parse");
        assert_eq!(rows[0]["Skills"], "rust, sql");
    }

    #[test]
    fn row_limit_is_enforced() {
        let err = parse_rows(Cursor::new("TaskID\nT1\nT2\nT3\n"), 2).expect_err("limit");
        assert!(matches!(err, ImportError::TooManyRows { limit: 2 }));
    }

    #[test]
    fn ragged_rows_are_csv_errors() {
        let err = parse_rows(Cursor::new("TaskID,TaskName\nT1,Setup,extra\n"), 10)
            .expect_err("ragged row");
        assert!(matches!(err, ImportError::Csv(_)));
    }
}
