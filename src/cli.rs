use thiserror::Error;

pub const USAGE: &str = "\
Usage: regex-cst [--format sexp|json|tree] [--check] [PATTERN | -]

Parses a regular expression body and prints its syntax tree.
Without PATTERN, or with `-`, the pattern is read from stdin.

  --format FORMAT   sexp (default), json or tree
  --check           print invalid constructs to stderr and exit 1 if any
  -h, --help        show this message
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Sexp,
    Json,
    Tree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Argument(String),
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub format: Format,
    pub check: bool,
    pub help: bool,
    pub source: Source,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown output format `{0}`, expected sexp, json or tree")]
    UnknownFormat(String),
    #[error("`{0}` needs a value")]
    MissingValue(&'static str),
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("unexpected argument `{0}`, only one pattern is accepted")]
    ExtraArgument(String),
}

impl Options {
    /// Read options from the arguments after the program name.
    pub fn from_args<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Options {
            format: Format::Sexp,
            check: false,
            help: false,
            source: Source::Stdin,
        };
        let mut pattern: Option<String> = None;
        let mut args = args.into_iter();
        let mut only_positional = false;
        while let Some(arg) = args.next() {
            if only_positional || arg == "-" || !arg.starts_with('-') {
                if pattern.is_some() {
                    return Err(CliError::ExtraArgument(arg));
                }
                pattern = Some(arg);
                continue;
            }
            match arg.as_str() {
                "--" => only_positional = true,
                "--check" => options.check = true,
                "-h" | "--help" => options.help = true,
                "--format" => {
                    let value = args.next().ok_or(CliError::MissingValue("--format"))?;
                    options.format = parse_format(&value)?;
                }
                other => match other.strip_prefix("--format=") {
                    Some(value) => options.format = parse_format(value)?,
                    None => return Err(CliError::UnknownOption(other.to_string())),
                },
            }
        }
        options.source = match pattern {
            Some(p) if p != "-" => Source::Argument(p),
            _ => Source::Stdin,
        };
        Ok(options)
    }
}

fn parse_format(value: &str) -> Result<Format, CliError> {
    match value {
        "sexp" => Ok(Format::Sexp),
        "json" => Ok(Format::Json),
        "tree" => Ok(Format::Tree),
        other => Err(CliError::UnknownFormat(other.to_string())),
    }
}

/// Drop the single line ending a shell pipe leaves behind.
pub fn trim_line_ending(input: &str) -> &str {
    input
        .strip_suffix("\r\n")
        .or_else(|| input.strip_suffix('\n'))
        .unwrap_or(input)
}
