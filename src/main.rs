use std::{env, path::PathBuf, process};

use anyhow::{Context, Result};
use result_report::{logger, report::write_report, ReportConfig};

const USAGE: &str = "usage: result-report <result-database>

Renders the result object database at <result-database> as a static HTML page
written next to it (<result-database>.html).

environment:
  REPORT_OUTPUT          write the page here instead
  REPORT_TITLE           page heading
  REPORT_LOG_LIMIT       render at most this many log records
  REPORT_HIGHCHARTS_SRC  script url of the charting library
  LOG_LEVEL              trace, debug, info, warn or error";

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Render(PathBuf),
    // Missing or extra arguments.
    Usage,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Command {
    let args: Vec<String> = args.into_iter().collect();
    match args.as_slice() {
        [flag] if flag == "-h" || flag == "--help" => Command::Help,
        [path] => Command::Render(PathBuf::from(path)),
        _ => Command::Usage,
    }
}

fn main() -> Result<()> {
    let db_path = match parse_args(env::args().skip(1)) {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Render(path) => path,
        Command::Usage => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    logger::init().context("installing logger")?;
    let config = ReportConfig::from_env().context("reading report configuration")?;
    let output = write_report(&db_path, &config)
        .with_context(|| format!("rendering report for {}", db_path.display()))?;
    println!("{}", output.display());
    Ok(())
}
