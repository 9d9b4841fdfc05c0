//! `cohort` command-line launcher.
//!
//! ```bash
//! cohort run                      # reference scenario, participant 1 crashes at 5
//! cohort run                      # second run recovers and completes
//! cohort inspect                  # show every participant's checkpoint
//! cohort reset                    # delete all checkpoints
//! RUST_LOG=debug cohort run --no-fault --group-size 8
//! ```
//!
//! `run` exits with status 1 when the group is rejected at startup or when
//! any participant ended with the injected fault.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cohort::{
    CheckpointStatus, Cohort, CohortBuilder, CohortError, FaultTrigger, GroupConfig,
    ParticipantId, DEFAULT_CHECKPOINT_DIR,
};

#[derive(Parser)]
#[command(
    name = "cohort",
    version,
    about = "Coordinated checkpointing with rollback recovery"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the group; resumes from existing checkpoints.
    Run {
        #[command(flatten)]
        group: GroupArgs,
        /// Participant that crashes.
        #[arg(long, default_value_t = 1)]
        fault_participant: u32,
        /// Iteration at which it crashes.
        #[arg(long, default_value_t = 5)]
        fault_iteration: u64,
        /// Disable the injected crash.
        #[arg(long, default_value_t = false)]
        no_fault: bool,
        /// Pause after every iteration, in milliseconds.
        #[arg(long, default_value_t = 0)]
        step_delay_ms: u64,
    },
    /// Print every participant's current checkpoint.
    Inspect {
        #[command(flatten)]
        group: GroupArgs,
    },
    /// Delete every participant's checkpoint.
    Reset {
        #[command(flatten)]
        group: GroupArgs,
    },
}

#[derive(Args)]
struct GroupArgs {
    /// Number of participants.
    #[arg(long, default_value_t = 3)]
    group_size: u32,
    /// Smallest accepted group.
    #[arg(long, default_value_t = 3)]
    min_group_size: u32,
    /// Length of every data vector.
    #[arg(long, default_value_t = 5)]
    data_len: usize,
    /// Checkpoint every N iterations.
    #[arg(long, default_value_t = 3)]
    interval: u64,
    /// Final iteration.
    #[arg(long, default_value_t = 10)]
    max_iterations: u64,
    /// Directory holding the checkpoint files.
    #[arg(long, env = "COHORT_CHECKPOINT_DIR", default_value = DEFAULT_CHECKPOINT_DIR)]
    checkpoint_dir: PathBuf,
}

impl GroupArgs {
    fn builder(&self) -> CohortBuilder {
        Cohort::builder()
            .group(GroupConfig {
                group_size: self.group_size,
                min_group_size: self.min_group_size,
                data_len: self.data_len,
                checkpoint_interval: self.interval,
                max_iterations: self.max_iterations,
                fault: None,
                step_delay: Duration::ZERO,
            })
            .checkpoint_dir(self.checkpoint_dir.clone())
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            group,
            fault_participant,
            fault_iteration,
            no_fault,
            step_delay_ms,
        } => {
            let mut builder = group
                .builder()
                .step_delay(Duration::from_millis(step_delay_ms));
            if !no_fault {
                builder = builder.fault(FaultTrigger::new(
                    ParticipantId(fault_participant),
                    fault_iteration,
                ));
            }
            run(builder)
        }
        Commands::Inspect { group } => inspect(group.builder()),
        Commands::Reset { group } => reset(group.builder()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(builder: CohortBuilder) -> Result<ExitCode, CohortError> {
    let report = builder.build()?.run()?;

    for summary in report.summaries() {
        println!(
            "participant {}: {:?} from {:?} at {}, ended at {}, checkpoints {:?}, failed saves {}",
            summary.participant,
            summary.termination,
            summary.start,
            summary.resumed_from,
            summary.final_iteration,
            summary.checkpoints,
            summary.failed_checkpoints.len()
        );
    }

    if report.any_faulted() {
        println!("faulted participants: {:?}; run again to recover", report.faulted());
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn inspect(builder: CohortBuilder) -> Result<ExitCode, CohortError> {
    let cohort = builder.build()?;
    println!("checkpoint dir: {}", cohort.config().checkpoint_dir.display());
    for (participant, status) in cohort.inspect() {
        match status {
            CheckpointStatus::Missing => println!("participant {participant}: no checkpoint"),
            CheckpointStatus::Valid(record) => println!(
                "participant {participant}: iteration {} data {:?}",
                record.iteration, record.data
            ),
            CheckpointStatus::Unusable(reason) => {
                println!("participant {participant}: unusable checkpoint ({reason})");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn reset(builder: CohortBuilder) -> Result<ExitCode, CohortError> {
    let removed = builder.build()?.reset()?;
    println!("removed {removed} checkpoint(s)");
    Ok(ExitCode::SUCCESS)
}
