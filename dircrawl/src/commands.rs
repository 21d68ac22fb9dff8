use crate::CLAP_STYLING;
use clap::{arg, command};
use dircrawl_core::crawl::{DEFAULT_OUTPUT_ROOT, DEFAULT_START_URL};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("dircrawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("dircrawl")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-v --"verbose" "Increase log detail (-v debug, -vv trace)")
                .action(clap::ArgAction::Count)
                .global(true),
        )
        .arg(
            arg!(-q --"quiet" "Only log warnings and hide the progress spinner")
                .required(false)
                .global(true)
                .conflicts_with("verbose"),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Walk a directory's category tree and write each leaf category's listings \
                into a matching folder.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The directory page to start from")
                        .default_value(DEFAULT_START_URL),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Root folder for the mirrored category tree")
                        .default_value(DEFAULT_OUTPUT_ROOT),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Artifact format written for each leaf")
                        .value_parser(["csv", "json", "xlsx", "all"])
                        .default_value("all"),
                )
                .arg(
                    arg!(-p --"profile" <PATH>)
                        .required(false)
                        .help("JSON file overriding the default site selectors")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"wait-ms" <MILLIS>)
                        .required(false)
                        .help("How long to wait for listings to appear on a page")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5000"),
                )
                .arg(
                    arg!(--"delay-ms" <MILLIS>)
                        .required(false)
                        .help("Pause between consecutive result pages")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("1000"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"retries" <COUNT>)
                        .required(false)
                        .help("Retries for timeouts, connection failures and 5xx/429 answers")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("2"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Deepest category level to descend into")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("16"),
                )
                .arg(
                    arg!(--"max-pages" <PAGES>)
                        .required(false)
                        .help("Most result pages to read from a single leaf category")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("500"),
                ),
        )
}
