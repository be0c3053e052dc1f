use std::env;
use std::io::{self, Read, Write};
use std::process;

use anyhow::{Context, Result};
use regex_cst::SyntaxTree;

mod cli;

use cli::{Format, Options, Source};

// Usage: regex-cst [--format sexp|json|tree] [--check] [PATTERN | -]
fn main() -> Result<()> {
    let options = Options::from_args(env::args().skip(1))?;
    if options.help {
        print!("{}", cli::USAGE);
        return Ok(());
    }

    let pattern = match options.source {
        Source::Argument(pattern) => pattern,
        Source::Stdin => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read pattern from stdin")?;
            cli::trim_line_ending(&input).to_string()
        }
    };

    let tree = SyntaxTree::parse(&pattern);
    let mut stdout = io::stdout().lock();
    match options.format {
        Format::Sexp => writeln!(stdout, "{}", tree.to_sexp())?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut stdout, tree.root())
                .context("failed to write json")?;
            writeln!(stdout)?;
        }
        Format::Tree => write!(stdout, "{tree}")?,
    }
    stdout.flush()?;

    if options.check {
        let diagnostics = tree.diagnostics();
        for diagnostic in &diagnostics {
            eprintln!("{diagnostic}");
        }
        if !diagnostics.is_empty() {
            process::exit(1)
        }
    }
    Ok(())
}
