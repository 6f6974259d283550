use crate::session::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(rename = "caseNumber")]
    pub case_number: String,
    #[serde(rename = "sessionDate")]
    pub session_date: Option<String>,
    #[serde(rename = "chamber")]
    pub chamber: Option<String>,
    #[serde(rename = "round")]
    pub round: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "caseNumber")]
    pub case_number: String,
    pub date: Option<String>,
    pub chamber: Option<String>,
    pub round: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: Option<String>,
    pub name: String,
    pub role: String,
    #[serde(rename = "promotedToReviewer")]
    pub promoted_to_reviewer: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PresidingEntry {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotEntry {
    pub voter: String,
    pub position: String,
    pub follows: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "nameColumnIndex")]
    _name_column_index: Option<JSValue>,
    #[serde(rename = "positionColumnIndex")]
    _position_column_index: Option<JSValue>,
    #[serde(rename = "followsColumnIndex")]
    _follows_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    /// A source with the default layout.
    pub fn for_path(provider: &str, file_path: &str, excel_worksheet_name: Option<String>) -> Self {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            _first_vote_row_index: None,
            _name_column_index: None,
            _position_column_index: None,
            _follows_column_index: None,
            excel_worksheet_name,
        }
    }

    // All the indices are 1-based in the configuration and 0-based here.

    pub fn first_vote_row_index(&self) -> BColResult<usize> {
        read_index(&self._first_vote_row_index, 2)
    }

    pub fn name_column_index(&self) -> BColResult<usize> {
        read_index(&self._name_column_index, 1)
    }

    pub fn position_column_index(&self) -> BColResult<usize> {
        read_index(&self._position_column_index, 2)
    }

    pub fn follows_column_index(&self) -> BColResult<usize> {
        read_index(&self._follows_column_index, 3)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub session: SessionSettings,
    pub roster: Vec<RosterEntry>,
    pub presiding: Option<PresidingEntry>,
    pub ballots: Option<Vec<BallotEntry>>,
    #[serde(rename = "ballotSources")]
    pub ballot_sources: Option<Vec<FileSource>>,
    #[serde(rename = "tieBreak")]
    pub tie_break: Option<String>,
}

pub fn read_config(path: &str) -> BColResult<SessionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SessionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> BColResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

fn read_index(x: &Option<JSValue>, default: usize) -> BColResult<usize> {
    let idx = match x {
        None => default,
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingIndexSnafu {
                content: n.to_string(),
            })?,
        // Excel-style columns: A, B, ..., Z, AA, ...
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => s
            .to_ascii_uppercase()
            .chars()
            .try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c as usize - 'A' as usize + 1)
            })
            .context(ParsingIndexSnafu { content: s.clone() })?,
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingIndexSnafu {
            content: s.clone(),
        })?,
        Some(js) => {
            return Err(Box::new(SessionError::ParsingIndex {
                content: js.to_string(),
            }))
        }
    };
    ensure!(
        idx >= 1,
        ParsingIndexSnafu {
            content: idx.to_string()
        }
    );
    Ok(idx - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indices() {
        assert_eq!(read_index(&None, 2).unwrap(), 1);
        assert_eq!(read_index(&Some(json!(3)), 1).unwrap(), 2);
        assert_eq!(read_index(&Some(json!("4")), 1).unwrap(), 3);
        assert_eq!(read_index(&Some(json!("c")), 1).unwrap(), 2);
        assert_eq!(read_index(&Some(json!("AA")), 1).unwrap(), 26);
        assert!(read_index(&Some(json!(0)), 1).is_err());
        assert!(read_index(&Some(json!(true)), 1).is_err());
        // Too many letters for a column.
        assert!(matches!(
            read_index(&Some(json!("ZZZZZZZZZZZZZZ")), 1).map_err(|e| *e),
            Err(SessionError::ParsingIndex { .. })
        ));
    }

    #[test]
    fn minimal_config() {
        let js = r#"{
            "session": {"caseNumber": "123"},
            "roster": [{"name": "Ana", "role": "RELATOR"}]
        }"#;
        let config: SessionConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.session.case_number, "123");
        assert_eq!(config.roster[0].promoted_to_reviewer, None);
        assert_eq!(config.ballots, None);
        assert_eq!(config.tie_break, None);
    }
}
