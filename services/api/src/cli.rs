use crate::demo::{run_evaluation, run_simulation, EvaluateArgs, SimulateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use event_waitlist::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Event Waitlist",
    about = "Run and explore capacity-limited submissions with an overflow waitlist",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Feed sequential arrivals through an in-memory waitlist and print each outcome
    Simulate(SimulateArgs),
    /// Print limit, notice and classification decisions for a given pool state
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Simulate(args) => run_simulation(args),
        Command::Evaluate(args) => run_evaluation(args),
    }
}
