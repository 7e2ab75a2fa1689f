use crate::infra::in_memory_service;
use clap::Args;
use event_waitlist::error::AppError;
use event_waitlist::waitlist::evaluation::policy;
use event_waitlist::waitlist::{
    ClassificationMode, PoolCounts, ResourceId, ServiceError, SubmissionRequest, WaitlistSettings,
};

const DEMO_RESOURCE: &str = "demo-event";

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// Nominal capacity limit of the resource
    #[arg(long, default_value_t = 10)]
    pub(crate) capacity: u64,
    /// Waitlist threshold carved out of the capacity
    #[arg(long, default_value_t = 3)]
    pub(crate) threshold: u64,
    /// Number of sequential submissions to attempt
    #[arg(long, default_value_t = 15)]
    pub(crate) arrivals: u32,
    /// Run with the waitlist switched off
    #[arg(long)]
    pub(crate) disabled: bool,
    /// Print the evaluator's debug trace for every submission
    #[arg(long)]
    pub(crate) debug: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Nominal capacity limit of the resource
    #[arg(long)]
    pub(crate) capacity: u64,
    /// Waitlist threshold carved out of the capacity
    #[arg(long)]
    pub(crate) threshold: u64,
    /// Submissions currently on the waitlist
    #[arg(long, default_value_t = 0)]
    pub(crate) waitlisted: u64,
    /// Submissions currently accepted
    #[arg(long, default_value_t = 0)]
    pub(crate) not_waitlisted: u64,
}

pub(crate) fn run_simulation(args: SimulateArgs) -> Result<(), AppError> {
    let mut settings = WaitlistSettings::new(args.capacity, args.threshold)
        .with_mode(ClassificationMode::Serialized)
        .with_debug(args.debug);
    if args.disabled {
        settings = settings.disabled();
    }

    println!(
        "Waitlist simulation: capacity {}, threshold {}, waitlist {}",
        args.capacity,
        args.threshold,
        if args.disabled { "off" } else { "on" }
    );

    let service = in_memory_service(settings, &[]);
    for arrival in 1..=args.arrivals {
        match service.submit(SubmissionRequest::for_resource(DEMO_RESOURCE)) {
            Ok(receipt) => {
                println!(
                    "  #{arrival:<3} {:<10} effective limit {}",
                    receipt.submission.pool.unwrap_or("unscoped"),
                    receipt.effective_limit
                );
                for line in receipt.trace.lines() {
                    println!("       {line}");
                }
            }
            Err(ServiceError::LimitReached { limit, .. }) => {
                println!("  #{arrival:<3} rejected   limit {limit} reached");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let summary = service.summary(&ResourceId(DEMO_RESOURCE.to_string()))?;
    println!(
        "\nFinal pools: {} accepted, {} waitlisted, effective limit {}",
        summary.counts.not_waitlisted, summary.counts.waitlisted, summary.effective_limit
    );
    Ok(())
}

pub(crate) fn run_evaluation(args: EvaluateArgs) -> Result<(), AppError> {
    for line in evaluation_report(&args) {
        println!("{line}");
    }
    Ok(())
}

fn evaluation_report(args: &EvaluateArgs) -> Vec<String> {
    let counts = PoolCounts::new(args.waitlisted, args.not_waitlisted);
    let cutoff = args.capacity.saturating_sub(args.threshold);

    vec![
        format!(
            "Pools: {} waitlisted, {} accepted (capacity {}, threshold {})",
            counts.waitlisted, counts.not_waitlisted, args.capacity, args.threshold
        ),
        format!(
            "Effective limit: {}",
            policy::expanded_limit(args.capacity, args.threshold, counts)
        ),
        format!(
            "Waitlist notice visible: {}",
            policy::notice_visible(args.capacity, args.threshold, counts)
        ),
        format!(
            "Confirmation replaced by notice: {}",
            policy::confirmation_overridden(args.capacity, args.threshold, counts)
        ),
        format!(
            "Next arrival waitlisted: {} (accepted cutoff {})",
            policy::commits_to_waitlist(
                args.capacity,
                args.threshold,
                counts.not_waitlisted.saturating_add(1)
            ),
            cutoff
        ),
    ]
}
