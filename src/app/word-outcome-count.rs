use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use wordoutcome::standalone::engine::run_job;
use wordoutcome::standalone::{Args, Job};

const EXIT_USAGE: u8 = 1;
const EXIT_JOB_FAILED: u8 = 2;

fn parse_args() -> Result<Job, ExitCode> {
    match Args::try_parse() {
        Ok(args) => Ok(Job::from(args)),
        Err(err) => {
            let _ = err.print();
            match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Err(ExitCode::SUCCESS),
                _ => Err(ExitCode::from(EXIT_USAGE)),
            }
        }
    }
}

fn main() -> ExitCode {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    let job = match parse_args() {
        Ok(job) => job,
        Err(code) => return code,
    };

    match run_job(&job) {
        Ok(summary) => {
            log::info!("Output committed to {}", summary.job.output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Job failed: {:#}", err);
            ExitCode::from(EXIT_JOB_FAILED)
        }
    }
}
