use calamine::DataType;

use crate::session::{
    io_common::{follows_cell, make_location},
    *,
};

/// Reads a ballot sheet from an Excel workbook. Same layout as the CSV sheets.
pub fn read_excel_ballots(path: String, cfs: &FileSource) -> BColResult<Vec<ParsedBallot>> {
    let location = make_location(&path);

    let name_idx = cfs.name_column_index()?;
    let position_idx = cfs.position_column_index()?;
    let follows_idx = cfs.follows_column_index()?;
    let first_row = cfs.first_vote_row_index()?;

    let wrange = get_range(&path, cfs)?;
    let header = wrange.rows().next().context(EmptyExcelSnafu {})?;
    debug!("read_excel_ballots: header: {:?}", header);

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in wrange.rows().enumerate().skip(first_row) {
        let lineno = idx + 1;
        debug!("read_excel_ballots: lineno: {:?} row: {:?}", lineno, row);
        if row.iter().all(|c| matches!(c, DataType::Empty)) {
            continue;
        }
        let voter =
            cell_text(row.get(name_idx), lineno)?.context(ExcelMissingCellSnafu { lineno })?;
        let position =
            cell_text(row.get(position_idx), lineno)?.context(ExcelMissingCellSnafu { lineno })?;
        let follows = cell_text(row.get(follows_idx), lineno)?.and_then(|s| follows_cell(&s));
        res.push(ParsedBallot {
            location: location(lineno),
            voter: voter.trim().to_string(),
            position,
            follows,
        });
    }
    Ok(res)
}

// Names and labels are text. Anything else in these columns is a mistake in the sheet.
fn cell_text(cell: Option<&DataType>, lineno: usize) -> BColResult<Option<String>> {
    match cell {
        None | Some(DataType::Empty) => Ok(None),
        Some(DataType::String(s)) => Ok(Some(s.clone())),
        Some(x) => Err(Box::new(SessionError::ExcelWrongCellType {
            lineno: lineno as u64,
            content: format!("{:?}", x),
        })),
    }
}

fn get_range(path: &str, cfs: &FileSource) -> BColResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_excel_ballots: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> =
        open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => Err(Box::new(SessionError::EmptyExcel {})),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_ballots: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => Err(Box::new(SessionError::AmbiguousWorksheet {})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook() -> String {
        format!(
            "{}/tests/data/xlsx_ballot_sheet/xlsx_ballot_sheet_ballots.xlsx",
            env!("CARGO_MANIFEST_DIR")
        )
    }

    fn read_worksheet(name: Option<&str>) -> Result<Vec<ParsedBallot>, SessionError> {
        let path = workbook();
        let cfs = FileSource::for_path("xlsx", &path, name.map(|s| s.to_string()));
        read_excel_ballots(path, &cfs).map_err(|e| *e)
    }

    #[test]
    fn reads_worksheet_by_name() {
        let ballots = read_worksheet(Some("Round 1")).unwrap();
        // The blank fourth row is skipped.
        assert_eq!(ballots.len(), 5);
        assert_eq!(ballots[0].voter, "Helena Prado");
        assert_eq!(ballots[0].position, "NEGADO");
        assert_eq!(ballots[0].follows, None);
        assert_eq!(ballots[0].location, "xlsx_ballot_sheet_ballots.xlsx:2");
        assert_eq!(ballots[1].follows, Some("Helena Prado".to_string()));
        assert_eq!(ballots[2].voter, "Rui Alves");
        assert_eq!(ballots[2].location, "xlsx_ballot_sheet_ballots.xlsx:5");
    }

    #[test]
    fn worksheet_name_needed_with_several_worksheets() {
        assert!(matches!(
            read_worksheet(None),
            Err(SessionError::AmbiguousWorksheet {})
        ));
        assert!(matches!(
            read_worksheet(Some("Round 9")),
            Err(SessionError::MissingWorksheet { .. })
        ));
    }

    #[test]
    fn missing_position_gives_the_line() {
        assert!(matches!(
            read_worksheet(Some("Incomplete")),
            Err(SessionError::ExcelMissingCell { lineno: 3 })
        ));
    }

    #[test]
    fn cells() {
        assert_eq!(cell_text(None, 1).unwrap(), None);
        assert_eq!(cell_text(Some(&DataType::Empty), 1).unwrap(), None);
        assert_eq!(
            cell_text(Some(&DataType::String("NEGADO".to_string())), 1).unwrap(),
            Some("NEGADO".to_string())
        );
        let res = cell_text(Some(&DataType::Float(1.0)), 4).map_err(|e| *e);
        assert!(matches!(
            res,
            Err(SessionError::ExcelWrongCellType { lineno: 4, .. })
        ));
    }
}
