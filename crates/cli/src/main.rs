//! Goal Kit CLI - goal-driven project scaffolding and task automation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use goalkit_automation::{
    check_plan, submit_plan, AnalyticsReporter, AutomationEngine, CommandExecutor, ResourcePool,
    RunConfig,
};
use goalkit_core::TaskPlan;
use goalkit_project::{init_project, ProjectContext};
use goalkit_tools::{InstantExecutor, ShellExecutor};

#[derive(Parser)]
#[command(name = "goalkit")]
#[command(about = "Goal-driven project scaffolding and task automation", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new project in a directory
    Init {
        /// Project name
        name: String,
        /// Target directory
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Project description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Check a plan file without running anything
    Validate {
        /// Path to a plan JSON file
        plan: PathBuf,
    },
    /// Submit a plan and drive it to completion
    Run {
        /// Path to a plan JSON file
        plan: PathBuf,
        /// Schedule only, skip actual command execution
        #[arg(long)]
        dry_run: bool,
        /// Stop after this many scheduler ticks
        #[arg(long)]
        max_ticks: Option<usize>,
        /// Wall-clock timeout per task, in seconds
        #[arg(long)]
        task_timeout: Option<u64>,
    },
    /// Show project configuration and resource capacities
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Commands::Init {
            name,
            path,
            description,
        } => {
            let ctx = init_project(&path, &name, &description).await?;
            println!("Initialized project '{name}' at {}", ctx.root().display());
            println!("  {}/project.json", ctx.data_dir().display());
            println!("  {}/", ctx.goals_dir().display());
            println!("  VISION.md");
        }
        Commands::Validate { plan } => {
            let plan = load_plan(&plan).await?;
            let problems = check_plan(&plan);
            if problems.is_empty() {
                println!("Plan OK ({} tasks)", plan.tasks.len());
            } else {
                println!("Plan has {} problem(s):", problems.len());
                for problem in &problems {
                    println!("  - {problem}");
                }
                anyhow::bail!("plan validation failed");
            }
        }
        Commands::Run {
            plan,
            dry_run,
            max_ticks,
            task_timeout,
        } => {
            let ctx = ProjectContext::discover(std::env::current_dir()?).await?;
            let plan = load_plan(&plan).await?;

            let pool = ResourcePool::new(
                ctx.config()
                    .resources
                    .iter()
                    .map(|(kind, amount)| (kind.clone(), amount)),
            )?;
            let engine = AutomationEngine::new(pool);
            submit_plan(&engine, &plan).await?;

            let executor: Arc<dyn CommandExecutor> = if dry_run {
                Arc::new(InstantExecutor)
            } else {
                let mut shell = ShellExecutor::new();
                if let Some(secs) = task_timeout {
                    shell = shell.with_timeout(Duration::from_secs(secs));
                }
                Arc::new(shell)
            };

            let summary = engine.run(executor, RunConfig { max_ticks }).await;
            println!(
                "Run finished in {} tick(s): {} completed, {} failed, {} cancelled, {} unfinished",
                summary.ticks,
                summary.completed,
                summary.failed,
                summary.cancelled,
                summary.unfinished,
            );
            if summary.stalled {
                println!("warning: run stalled before finishing every task");
            }
            println!();
            let reporter = AnalyticsReporter::new(engine.snapshot().await);
            print!("{}", reporter.generate_report());

            if summary.failed > 0 || summary.stalled {
                anyhow::bail!("run did not complete cleanly");
            }
        }
        Commands::Status => {
            let ctx = ProjectContext::discover(std::env::current_dir()?).await?;
            let config = ctx.config();
            println!("Project: {}", config.name);
            if !config.description.is_empty() {
                println!("  {}", config.description);
            }
            println!("  Root:    {}", ctx.root().display());
            println!("  Created: {}", config.created_at);
            println!("Resource capacities:");
            for (kind, amount) in config.resources.iter() {
                println!("  {:<10} {amount:.1}", format!("{kind}:"));
            }
        }
    }

    Ok(())
}

async fn load_plan(path: &PathBuf) -> Result<TaskPlan> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading plan {}", path.display()))?;
    let plan: TaskPlan =
        serde_json::from_str(&raw).with_context(|| format!("parsing plan {}", path.display()))?;
    Ok(plan)
}
