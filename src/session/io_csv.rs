// Primitives for reading CSV ballot sheets.

use std::fs::File;

use crate::session::{
    io_common::{follows_cell, make_location},
    *,
};

pub fn read_csv_ballots(path: String, cfs: &FileSource) -> BColResult<Vec<ParsedBallot>> {
    let location = make_location(&path);

    let name_idx = cfs.name_column_index()?;
    let position_idx = cfs.position_column_index()?;
    let follows_idx = cfs.follows_column_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(&path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_csv_ballots: lineno: {:?} line: {:?}", lineno, line);
        // Blank lines at the end of a sheet are common.
        if line.iter().all(|s| s.trim().is_empty()) {
            continue;
        }
        let voter = line
            .get(name_idx)
            .context(CsvLineToShortSnafu { lineno })?
            .trim()
            .to_string();
        let position = line
            .get(position_idx)
            .context(CsvLineToShortSnafu { lineno })?
            .to_string();
        // The follows column is often left out when nobody follows.
        let follows = line.get(follows_idx).and_then(follows_cell);

        res.push(ParsedBallot {
            location: location(lineno),
            voter,
            position,
            follows,
        });
    }
    Ok(res)
}

fn get_records(
    path: &str,
    cfs: &FileSource,
) -> BColResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    // first_row is 0-based: skip the header lines.
    for _ in 0..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_path(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn reads_default_layout() {
        let path = test_path("csv_ballot_sheet/csv_ballot_sheet_ballots.csv");
        let cfs = FileSource::for_path("csv", &path, None);
        let ballots = read_csv_ballots(path, &cfs).unwrap();
        assert_eq!(ballots.len(), 5);
        assert_eq!(ballots[0].voter, "Helena Prado");
        assert_eq!(ballots[0].follows, None);
        assert_eq!(ballots[0].location, "csv_ballot_sheet_ballots.csv:2");
        assert_eq!(ballots[1].position, "ACOMPANHA");
        assert_eq!(ballots[1].follows, Some("Helena Prado".to_string()));
    }

    #[test]
    fn missing_file() {
        let path = test_path("does_not_exist.csv");
        let cfs = FileSource::for_path("csv", &path, None);
        let res = read_csv_ballots(path, &cfs).map_err(|e| *e);
        assert!(matches!(res, Err(SessionError::CsvOpen { .. })));
    }
}
