// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::error::Error;
use std::fs;
use std::path::Path;

use clap::{arg, Arg, ArgMatches, Command};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
//
use brseq::util::{FromHexString, ToHexString};
use brseq::{convert, decode_binary, format_text, parse_text};

fn main() -> Result<(), Box<dyn Error>> {
    // Parse command-line arguments
    let matches = Command::new("brseq")
        .about("BSEQ sequence container tool")
        .version("0.2.1")
        .subcommand_required(true)
        .arg(arg!(--verbose "Show verbose output"))
        .subcommand(
            Command::new("assemble")
                .about("Assemble a textual listing into a container, printed as hex")
                .arg(Arg::new("target").required(true))
                .visible_alias("a"),
        )
        .subcommand(
            Command::new("disassemble")
                .about("Disassemble a container file (or raw hex string) into a listing")
                .arg(Arg::new("code").short('c').long("code"))
                .arg(Arg::new("target").required(true))
                .visible_alias("d"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between .brseq and .rseq by file extension")
                .arg(Arg::new("file").required(true))
                .visible_alias("c"),
        )
        .get_matches();
    // Extract top-level flags
    let verbose = matches.is_present("verbose");
    // Initialise logging
    if verbose {
        init_logging(LevelFilter::Debug);
    }
    // Dispatch on outcome
    let ok = match matches.subcommand() {
        Some(("assemble", args)) => assemble(args),
        Some(("disassemble", args)) => disassemble(args),
        Some(("convert", args)) => convert_file(args),
        _ => unreachable!(),
    }?;
    // Determine appropriate exit code
    let exitcode = if ok { 0 } else { 1 };
    // Done
    std::process::exit(exitcode);
}

/// Assemble a given listing file.
fn assemble(args: &ArgMatches) -> Result<bool, Box<dyn Error>> {
    let target = args.get_one::<String>("target").unwrap();
    // Read the listing file
    let input = fs::read_to_string(target)?;
    // Parse listing into a sequence file
    let file = parse_text(&input)?;
    // Translate the file into bytes
    let bytes = file.to_bytes()?;
    // Print the final hex string
    println!("{}", bytes.to_hex_string());
    //
    Ok(true)
}

/// Disassemble a given container.
fn disassemble(args: &ArgMatches) -> Result<bool, Box<dyn Error>> {
    // Determine disassembly target
    let target = args.get_one::<String>("target").unwrap();
    // Decide whether the container was provided directly, or via a
    // file.
    let bytes = if args.contains_id("code") {
        // Provided directly as hex
        target.as_str().from_hex_string()?
    } else {
        // Read container bytes from file
        fs::read(target)?
    };
    // Decode the container
    let file = decode_binary(&bytes)?;
    // Print the listing
    print!("{}", format_text(&file));
    //
    Ok(true)
}

/// Convert a file to its counterpart representation.
fn convert_file(args: &ArgMatches) -> Result<bool, Box<dyn Error>> {
    let file = args.get_one::<String>("file").unwrap();
    let target = convert(Path::new(file))?;
    println!("{}", target.display());
    //
    Ok(true)
}

/// Initialise logging using a suitable pattern.
pub fn init_logging(level: LevelFilter) {
    let encoder = PatternEncoder::new("[{l}] {m}{n}");
    //
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(encoder))
        .build();
    //
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .unwrap();
    //
    let _handle = log4rs::init_config(config).unwrap();
}
