use std::{
    fs,
    io::{self, Read},
};

use anyhow::Context;
use clap::{crate_version, App, Arg, ArgMatches};
use log::error;

use kaleidoscope_frontend::{
    driver::{self, Driver, Options},
    parser::{Parser, DEFAULT_MAX_DEPTH},
};

/// standard input as a character stream, one byte per character like getchar
fn stdin_chars() -> impl Iterator<Item = char> {
    io::stdin().bytes().map_while(|byte| match byte {
        Ok(byte) => Some(char::from(byte)),
        Err(e) => {
            error!("failed to read standard input: {}", e);
            None
        }
    })
}

fn run<I: Iterator<Item = char>>(input: I, matches: &ArgMatches) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let stderr = io::stderr();

    if matches.is_present("tokens") {
        driver::print_tokens(input, stdout.lock())?;
        return Ok(());
    }

    let max_depth = matches
        .value_of("max-depth")
        .map(str::parse::<usize>)
        .transpose()
        .context("--max-depth must be a non-negative integer")?
        .unwrap_or(DEFAULT_MAX_DEPTH);

    let options = Options {
        prompt: !matches.is_present("no-prompt"),
        dump_ast: matches.is_present("dump-ast"),
    };

    let parser = Parser::new(input).with_max_depth(max_depth);
    Driver::new(parser, stdout.lock(), stderr.lock(), options).run()?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = App::new("kaleidoscope")
        .version(crate_version!())
        .about("parses kaleidoscope source into abstract syntax trees")
        .arg(
            Arg::with_name("FILE")
                .help("source file to parse instead of standard input")
                .index(1),
        )
        .arg(
            Arg::with_name("max-depth")
                .long("max-depth")
                .value_name("N")
                .takes_value(true)
                .help("how deeply parentheses and call arguments may nest"),
        )
        .arg(
            Arg::with_name("dump-ast")
                .long("dump-ast")
                .help("print the tree of every parsed item"),
        )
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("print the token stream instead of parsing"),
        )
        .arg(
            Arg::with_name("no-prompt")
                .long("no-prompt")
                .help("don't print the ready> prompt"),
        )
        .get_matches();

    match matches.value_of("FILE") {
        Some(path) => {
            let source =
                fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
            run(source.chars(), &matches)
        }
        None => run(stdin_chars(), &matches),
    }
}
