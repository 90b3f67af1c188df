use crate::app::report::{render_models, render_round};
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use roundtable::Config;
use roundtable::debate::{DebateOrchestrator, DebateSession, Round};
use roundtable::llm::{ChatProvider, OpenRouterProvider};
use roundtable::{Role, RoleService, RunRoleRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn build_service(config: &Config) -> Result<Arc<RoleService>> {
    let provider: Arc<dyn ChatProvider> = Arc::new(OpenRouterProvider::from_config(config));
    Ok(Arc::new(RoleService::from_config(config, provider)?))
}

/// Cancel `cancel` on the first Ctrl-C.
fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight calls");
            cancel.cancel();
        }
    })
}

struct RoleArgs {
    role: String,
    prompt: String,
    model: Option<String>,
    fallback: bool,
    no_fallback: bool,
    system: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

async fn run_role(config: &Config, args: RoleArgs) -> Result<()> {
    let role = Role::parse(&args.role)?;
    let service = build_service(config)?;

    let mut request = RunRoleRequest::new(role, args.prompt);
    if let Some(model) = args.model {
        request = request.with_model(model);
    }
    if args.fallback {
        request = request.with_allow_fallback(true);
    } else if args.no_fallback {
        request = request.with_allow_fallback(false);
    }
    if let Some(system) = args.system {
        request = request.with_system_prompt(system);
    }
    if let Some(temperature) = args.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = args.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());
    let outcome = service.run_role_with_cancel(request, &cancel).await;
    watcher.abort();
    let invocation = outcome?;

    println!("{}", invocation.content);
    info!(
        model = invocation.model_used.as_str(),
        attempted = ?invocation.attempted,
        total_tokens = invocation.usage.total_tokens,
        "Role finished"
    );
    Ok(())
}

async fn drive_debate(
    orchestrator: &mut DebateOrchestrator,
    addendum: Option<String>,
    skip_round2: bool,
) -> Result<()> {
    orchestrator.run_round(Round::One).await?;
    println!("{}\n", render_round(orchestrator.session(), Round::One));

    if let Some(addendum) = addendum {
        orchestrator.set_addendum_draft(addendum)?;
    }
    if skip_round2 {
        orchestrator.skip_round_two()?;
    } else {
        orchestrator.run_round(Round::Two).await?;
        println!("{}\n", render_round(orchestrator.session(), Round::Two));
    }

    let summary = orchestrator.generate_summary().await?;
    println!("== Summary ({}) ==\n{}", summary.source, summary.text);
    Ok(())
}

fn write_session(session: &DebateSession, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write session to {}", path.display()))?;
    info!(path = %path.display(), "Session written");
    Ok(())
}

async fn run_debate(
    config: &Config,
    prompt: String,
    addendum: Option<String>,
    skip_round2: bool,
    no_refine: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let service = build_service(config)?;
    if let Err(error) = service.invoker().warmup().await {
        warn!(%error, "Provider warmup failed");
    }
    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());

    let started = if no_refine {
        Ok(DebateOrchestrator::from_final_prompt(service, &prompt)
            .with_cancellation(cancel.clone()))
    } else {
        DebateOrchestrator::start_with_cancel(service, &prompt, None, cancel.clone()).await
    };
    let mut orchestrator = match started {
        Ok(orchestrator) => orchestrator,
        Err(error) => {
            watcher.abort();
            return Err(error.into());
        }
    };
    println!("== Question ==\n{}\n", orchestrator.session().final_prompt);

    let outcome = drive_debate(&mut orchestrator, addendum, skip_round2).await;
    watcher.abort();

    // Partial sessions are still written so interrupted runs keep their results.
    if let Some(path) = output {
        write_session(orchestrator.session(), &path)?;
    }
    let usage = orchestrator.session().usage;
    info!(
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        phase = %orchestrator.phase(),
        "Debate finished"
    );
    outcome
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Role {
            role,
            prompt,
            model,
            fallback,
            no_fallback,
            system,
            temperature,
            max_tokens,
        } => {
            run_role(
                &config,
                RoleArgs {
                    role,
                    prompt,
                    model,
                    fallback,
                    no_fallback,
                    system,
                    temperature,
                    max_tokens,
                },
            )
            .await
        }

        Commands::Debate {
            prompt,
            addendum,
            skip_round2,
            no_refine,
            output,
        } => run_debate(&config, prompt, addendum, skip_round2, no_refine, output).await,

        Commands::Models => {
            println!("{}", render_models(&config)?);
            Ok(())
        }
    }
}
