use std::process::ExitCode;
use clean_news::{
    cli::args::parse_args,
    cli::response::Outcome,
    cli::run::run,
    logging::init_logging,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();

    let outcome = match parse_args(std::env::args_os()) {
        Ok(url) => run(url.as_deref()).await,
        Err(outcome) => outcome,
    };

    emit(outcome)
}

fn emit(outcome: Outcome) -> ExitCode {
    println!("{}", outcome.line);
    ExitCode::from(outcome.exit_code)
}
