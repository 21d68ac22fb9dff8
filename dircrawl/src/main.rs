use dircrawl::commands::command_argument_builder;
use dircrawl::handlers::{handle_crawl, init_tracing, log_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = command_argument_builder().get_matches();
    let quiet = matches.get_flag("quiet");
    init_tracing(log_level(matches.get_count("verbose"), quiet));

    match matches.subcommand() {
        Some(("crawl", sub_matches)) => handle_crawl(sub_matches, quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
