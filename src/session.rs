use log::{debug, info, warn};

use collegiate_voting::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::session::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not understand the index {content}"))]
    ParsingIndex { content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file is empty"))]
    EmptyExcel {},
    #[snafu(display("Worksheet {name} not found"))]
    MissingWorksheet { name: String },
    #[snafu(display("The workbook has several worksheets, the worksheet name must be provided"))]
    AmbiguousWorksheet {},
    #[snafu(display("Line {lineno} has no name or no position"))]
    ExcelMissingCell { lineno: usize },
    #[snafu(display("Wrong cell type at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a line of the CSV file"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineToShort { lineno: usize },
    #[snafu(display("{place}: {source}"))]
    ParsingLabel { source: UnknownLabel, place: String },
    #[snafu(display("Ballot provider {provider} is not supported (csv or xlsx)"))]
    UnknownProvider { provider: String },
    #[snafu(display("The session file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Invalid session: {source}"))]
    Voting { source: VotingErrors },
    #[snafu(display("Difference detected between computed summary and reference summary"))]
    ReferenceMismatch {},
}

type ColResult<T> = Result<T, SessionError>;
type BColResult<T> = Result<T, Box<SessionError>>;

/// A ballot, as parsed by the readers.
/// This is before parsing the labels and checking against the roster.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    // Where the ballot comes from, for error messages.
    pub location: String,
    pub voter: String,
    pub position: String,
    pub follows: Option<String>,
}

fn build_roster(config: &SessionConfig) -> BColResult<Roster> {
    let mut voters: Vec<Voter> = Vec::new();
    for entry in config.roster.iter() {
        let role: Role = entry.role.parse().context(ParsingLabelSnafu {
            place: format!("roster entry {}", entry.name),
        })?;
        voters.push(Voter::new(entry.id.as_deref(), &entry.name, role));
    }
    let presiding = config
        .presiding
        .as_ref()
        .map(|p| Voter::new(p.id.as_deref(), &p.name, Role::CouncilMember));
    let promoted: Vec<&str> = config
        .roster
        .iter()
        .filter(|entry| entry.promoted_to_reviewer.unwrap_or(false))
        .map(|entry| entry.name.as_str())
        .collect();
    if !promoted.is_empty() {
        info!("Seating {:?} with the reviewers", promoted);
    }
    let roster =
        Roster::with_promotions(voters, presiding, &promoted).context(VotingSnafu {})?;
    Ok(roster)
}

fn validate_ballots(parsed_ballots: &[ParsedBallot]) -> ColResult<Vec<Ballot>> {
    let mut res: Vec<Ballot> = Vec::new();
    for pb in parsed_ballots.iter() {
        let choice = BallotChoice::parse(&pb.position, pb.follows.as_deref()).context(
            ParsingLabelSnafu {
                place: pb.location.clone(),
            },
        )?;
        debug!("Ballot {}: {} -> {}", pb.location, pb.voter, choice);
        res.push(Ballot::new(&pb.voter, choice));
    }
    Ok(res)
}

fn read_ballot_sheet(path: String, cfs: &FileSource) -> BColResult<Vec<ParsedBallot>> {
    info!("Attempting to read ballot file {:?}", path);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_ballots(path, cfs),
        "xlsx" | "excel" => io_excel::read_excel_ballots(path, cfs),
        x => Err(Box::new(SessionError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

fn gather_ballots(config: &SessionConfig, root_p: &Path, args: &Args) -> BColResult<Vec<Ballot>> {
    let mut parsed: Vec<ParsedBallot> = config
        .ballots
        .iter()
        .flatten()
        .enumerate()
        .map(|(idx, b)| ParsedBallot {
            location: format!("ballot #{}", idx + 1),
            voter: b.voter.clone(),
            position: b.position.clone(),
            follows: b.follows.clone(),
        })
        .collect();

    // The input passed on the command line replaces the sources of the session file.
    let sources: Vec<(String, FileSource)> = if let Some(input) = args.input.clone() {
        let provider = args.input_type.clone().unwrap_or_else(|| "csv".to_string());
        let cfs = FileSource::for_path(&provider, &input, args.excel_worksheet_name.clone());
        vec![(input, cfs)]
    } else {
        config
            .ballot_sources
            .iter()
            .flatten()
            .map(|cfs| {
                let p: PathBuf = [root_p, Path::new(&cfs.file_path)].iter().collect();
                (p.display().to_string(), cfs.clone())
            })
            .collect()
    };
    for (path, cfs) in sources {
        let mut file_ballots = read_ballot_sheet(path, &cfs)?;
        parsed.append(&mut file_ballots);
    }

    Ok(validate_ballots(&parsed)?)
}

fn ballots_to_json(result: &SessionResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for rb in result.resolved_ballots.iter() {
        let mut js: JSMap<String, JSValue> = JSMap::new();
        js.insert("voter".to_string(), json!(rb.voter));
        js.insert("role".to_string(), json!(rb.role.to_string()));
        js.insert("position".to_string(), json!(rb.position.to_string()));
        if let Some(followed) = &rb.follows {
            js.insert("follows".to_string(), json!(followed));
        }
        l.push(JSValue::Object(js));
    }
    l
}

fn labels(outcomes: &[Outcome]) -> Vec<String> {
    outcomes.iter().map(|o| o.to_string()).collect()
}

fn build_summary_js(config: &SessionConfig, result: &SessionResult) -> JSValue {
    let c = OutputConfig {
        case_number: config.session.case_number.clone(),
        date: config.session.session_date.clone(),
        chamber: config.session.chamber.clone(),
        round: config.session.round.unwrap_or(1),
    };
    let (status, tie_break, tied, missing) = match &result.verdict {
        Verdict::Decided { tie_break, .. } => {
            ("decided", tie_break.map(|o| o.to_string()), vec![], vec![])
        }
        Verdict::UnresolvedTie { tied } => ("unresolvedTie", None, labels(tied), vec![]),
        Verdict::IncompleteRoster { missing } => {
            ("incompleteRoster", None, vec![], missing.clone())
        }
    };
    let t = result.tally;
    json!({
        "config": c,
        "results": {
            "status": status,
            "decision": result.decision().map(|o| o.to_string()),
            "isTie": result.is_tie,
            "tieBreak": tie_break,
            "tied": tied,
            "missing": missing,
            "tally": {
                "approved": t.approved,
                "denied": t.denied,
                "partial": t.partial,
                "abstain": t.abstain,
                "absent": t.absent,
                "barred": t.barred,
            },
            "ballots": ballots_to_json(result),
        }
    })
}

fn write_summary(pretty_js: &str, out: &Option<String>) -> BColResult<()> {
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            info!("Writing summary to {}", path);
            fs::write(path, pretty_js).context(WritingSummarySnafu { path })?;
        }
    }
    Ok(())
}

pub fn run_session(args: &Args) -> BColResult<()> {
    let config_p = Path::new(args.config.as_str());
    let config = read_config(&args.config)?;
    info!("config: {:?}", config);

    let roster = build_roster(&config)?;
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let ballots = gather_ballots(&config, root_p, args)?;
    info!("Collected {} ballots", ballots.len());

    let tie_break_label = args.tie_break.clone().or_else(|| config.tie_break.clone());
    let tie_break: Option<Outcome> = match tie_break_label {
        Some(label) => Some(label.parse().context(ParsingLabelSnafu {
            place: "tie-break",
        })?),
        None => None,
    };

    let result = evaluate_session(&roster, &ballots, tie_break).context(VotingSnafu {})?;
    info!("result: {:?}", result);
    if let Verdict::UnresolvedTie { tied } = &result.verdict {
        warn!(
            "The session is tied between {:?}: the presiding ballot is required",
            tied
        );
    }

    // Assemble the final json
    let result_js = build_summary_js(&config, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(&pretty_js_stats, &args.out)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return Err(Box::new(SessionError::ReferenceMismatch {}));
        }
    }

    Ok(())
}

#[cfg(test)]
fn run_session_test(test_name: &str, tie_break: Option<&str>) -> BColResult<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let test_dir = option_env!("COLVOTE_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    info!("Running test {}", test_name);
    let args = Args {
        config: format!("{}/{}/{}_session.json", test_dir, test_name, test_name),
        reference: Some(format!(
            "{}/{}/{}_expected_summary.json",
            test_dir, test_name, test_name
        )),
        out: None,
        input: None,
        input_type: None,
        excel_worksheet_name: None,
        tie_break: tie_break.map(|s| s.to_string()),
        verbose: false,
    };
    run_session(&args)
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    if let Err(e) = run_session_test(test_name, None) {
        panic!("Test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_chain() {
        test_wrapper("follow_chain");
    }

    #[test]
    fn presiding_tie_break() {
        test_wrapper("presiding_tie_break");
    }

    #[test]
    fn three_way_tie() {
        test_wrapper("three_way_tie");
    }

    #[test]
    fn csv_ballot_sheet() {
        test_wrapper("csv_ballot_sheet");
    }

    #[test]
    fn xlsx_ballot_sheet() {
        test_wrapper("xlsx_ballot_sheet");
    }

    #[test]
    fn incomplete_roster() {
        test_wrapper("incomplete_roster");
    }

    #[test]
    fn tie_break_from_command_line() {
        // Same ballots as three_way_tie, with a different expected summary.
        let res = run_session_test("three_way_tie", Some("PARCIAL"));
        assert!(matches!(
            res.map_err(|e| *e),
            Err(SessionError::ReferenceMismatch {})
        ));
    }

    #[test]
    fn follow_cycle() {
        let res = run_session_test("follow_cycle", None);
        match res.map_err(|e| *e) {
            Err(SessionError::Voting {
                source: VotingErrors::CycleDetected(path),
            }) => {
                assert_eq!(path, vec!["Rui Alves", "Sofia Reis", "Rui Alves"]);
            }
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn labels_are_checked() {
        let parsed = vec![ParsedBallot {
            location: "ballots.csv:2".to_string(),
            voter: "Ana".to_string(),
            position: "MAYBE".to_string(),
            follows: None,
        }];
        match validate_ballots(&parsed) {
            Err(e @ SessionError::ParsingLabel { .. }) => {
                assert_eq!(e.to_string(), "ballots.csv:2: unknown label \"MAYBE\"");
            }
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn unknown_role_names_the_roster_entry() {
        let js = r#"{
            "session": {"caseNumber": "123"},
            "roster": [{"name": "Ana", "role": "JUDGE"}]
        }"#;
        let config: SessionConfig = serde_json::from_str(js).unwrap();
        match build_roster(&config).map_err(|e| *e) {
            Err(SessionError::ParsingLabel { place, .. }) => {
                assert_eq!(place, "roster entry Ana");
            }
            x => panic!("unexpected result: {:?}", x),
        }
    }
}
