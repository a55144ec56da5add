use clap::Parser;
use std::{io, process::ExitCode};
use syncsketch_dump::{
    core::is_missing_credential, prelude::*, run, utils::report_error, Args, Config,
    SyncSketchClient, WalkOptions,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match dump(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_missing_credential(&err) => {
            println!("{}", err);
            ExitCode::FAILURE
        }
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn dump(args: &Args) -> AnyhowResult<()> {
    let cfg = Config::load(&args.config)?;
    let opts = WalkOptions {
        stop_after: args.stop_after,
        strict: args.strict,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(
        &cfg,
        opts,
        |var| std::env::var(var).ok(),
        SyncSketchClient::new,
        &mut out,
    )?;

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,syncsketch_dump=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
