use clap::Parser;

/// Resolves the votes of a collegiate judgment session.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON description of the session: roster, presiding voter, ballots.
    /// See the manual of the collegiate_voting crate for the format.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference summary in JSON format. If provided, colvote will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the session will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A ballot sheet. Setting this option replaces the ballot
    /// sources listed in the session file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the ballot sheet: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (APPROVED, DENIED or PARTIAL) The ballot of the presiding voter. Overrides the
    /// value of the session file.
    #[clap(short, long, value_parser)]
    pub tie_break: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
