use console::style;
use yt_batch::{ActionOutcome, RunReport};

pub fn print_report(report: &RunReport) {
    println!();
    for (action, outcome) in &report.outcomes {
        match outcome {
            ActionOutcome::Completed(summary) => println!(
                "  {:<10} {} ok, {} failed, {} skipped of {}{}",
                style(action).cyan().bold(),
                style(summary.succeeded).green(),
                style(summary.failed).red(),
                summary.skipped,
                summary.total,
                if summary.stopped { " (stopped)" } else { "" }
            ),
            ActionOutcome::Aborted(reason) => println!(
                "  {:<10} {} {}",
                style(action).cyan().bold(),
                style("not run:").red(),
                reason
            ),
        }
    }

    let stats = &report.stats;
    println!();
    println!("{}", style("Statistics").bold().underlined());
    println!("  Likes:         {}", stats.likes);
    println!("  Comments:      {}", stats.comments);
    println!("  Subscriptions: {}", stats.subscriptions);
    println!("  Errors:        {}", stats.errors);
    println!("  Total actions: {}", style(stats.total_success()).green().bold());
}
