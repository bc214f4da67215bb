use clap::Parser;
use quizshell::core::config::{self, CliOverrides};
use quizshell::core::document::Document;
use quizshell::core::state::App;
use quizshell::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::io;

#[derive(Parser)]
#[command(name = "quizshell", about = "Module router and lifecycle shell for the quiz app")]
struct Args {
    /// Serve module bundles from this URL instead of the built-in ones
    #[arg(long)]
    base_url: Option<String>,

    /// Resume the session with this id
    #[arg(long)]
    session: Option<String>,

    /// Keep the handoff context in memory only
    #[arg(long)]
    memory: bool,

    /// Fragment to open first
    #[arg(long, default_value = "#/")]
    route: String,

    /// Navigate to each fragment in turn without a terminal UI, printing
    /// the mounted markup after each
    #[arg(long, num_args = 1..)]
    print: Vec<String>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to quizshell.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("quizshell.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().map_err(io::Error::other)?;
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url,
            session_id: args.session,
            memory: args.memory,
        },
    );
    log::info!("quizshell starting up: {:?}", resolved.base_url);

    let app = App::from_config(&resolved).map_err(io::Error::other)?;
    app.preload().await;

    if !args.print.is_empty() {
        print_pages(&app, &args.print).await;
        return Ok(());
    }

    tui::run(app, &args.route).await
}

async fn print_pages(app: &App, fragments: &[String]) {
    for fragment in fragments {
        match app.lifecycle.navigate_path(fragment).await {
            Ok(outcome) => log::info!("{fragment}: {outcome:?}"),
            Err(e) => log::warn!("{fragment}: {e}"),
        }
        println!("== {fragment}");
        println!("{}", app.document.mount_html());
    }
    app.lifecycle.teardown().await;
}
