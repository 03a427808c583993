//! know-it-all - Command-line record-store editor
//!
//! Examples:
//! - know-it-all -+ milk                         add an item
//! - know-it-all -@ milk -k price -v 1.2 -t float set a typed value
//! - know-it-all -@ milk -k price -p             pop a key
//! - know-it-all -r                              print every item
//! - know-it-all -s milk                         search
//! - know-it-all -? k                            help for one parameter

use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use know_it_all::{dispatch, Config, ParsedArgs, Session};

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = match ParsedArgs::parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => {
            println!("{:#} [1]", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            println!("{:#} [1]", e);
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut session = Session::new(&args, config, stdout.lock());

    match dispatch::run(&mut session) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = session.report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}
