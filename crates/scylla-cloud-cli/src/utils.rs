use colored::Colorize;
use scylla_cloud::{ActionType, ApplyResult, Plan};
use std::io::{BufRead, Write};
use tokio_util::sync::CancellationToken;

/// Token cancelled on Ctrl-C
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping after the current request...".yellow());
            cancel.cancel();
        }
    });
    token
}

/// Ask for an explicit "yes"
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} {} ", prompt.bold(), "[yes/no]".dimmed());
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

pub fn print_plan(plan: &Plan) {
    println!();
    for action in &plan.actions {
        let line = match action.action_type {
            ActionType::Create => format!("  + {}", action.description).green(),
            ActionType::Replace => format!("  ± {}", action.description).yellow(),
            ActionType::Update => format!("  ~ {}", action.description).yellow(),
            ActionType::Delete => format!("  - {}", action.description).red(),
            ActionType::NoOp => format!("    {}", action.description).dimmed(),
        };
        println!("{}", line);
    }
    println!();
    println!("{} {}", "Plan:".bold(), plan.summary());
}

pub fn print_result(result: &ApplyResult) {
    println!();
    for ok in &result.succeeded {
        println!("  {} {}", "✓".green(), ok.message);
    }
    for failed in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failed.action_id,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!();
    println!(
        "{} {} succeeded, {} failed in {:.1}s",
        "Result:".bold(),
        result.succeeded.len(),
        result.failed.len(),
        result.duration_ms as f64 / 1000.0
    );
}
