use anyhow::Result;
use roundtable::Config;
use roundtable::debate::{DebateSession, Participant, Round};
use roundtable::roles::{ModelResolver, Role, TokenPolicy};

pub fn render_models(config: &Config) -> Result<String> {
    let resolver = ModelResolver::from_config(config)?;
    let tokens = TokenPolicy::from_config(config)?;

    let mut lines = vec![
        format!("Config:   {}", config.config_path.display()),
        format!("Endpoint: {}", config.base_url),
        format!("Token cap: {}", tokens.cap()),
        String::new(),
        "Pool (fallback order):".to_string(),
    ];
    lines.extend(
        resolver
            .pool()
            .iter()
            .enumerate()
            .map(|(i, model)| format!("  {}. {model}", i + 1)),
    );
    lines.push(String::new());
    lines.push("Roles:".to_string());
    for role in Role::ALL {
        let model = resolver.resolve(role, None, None)?;
        lines.push(format!(
            "  {:<11} {model}  (max_tokens {})",
            role.to_string(),
            tokens.effective_max_tokens(role, None)
        ));
    }
    Ok(lines.join("\n"))
}

pub fn render_round(session: &DebateSession, round: Round) -> String {
    let mut lines = vec![format!("== {} ==", capitalized(round))];
    for participant in Participant::ALL {
        let Some(result) = session.results.latest(round, participant) else {
            continue;
        };
        lines.push(String::new());
        lines.push(format!("[{participant}] {}", result.model));
        if let Some(error) = &result.error {
            lines.push(format!("  failed: {error}"));
        } else if let Some(output) = result.output.structured() {
            lines.extend(output.new_perspectives.iter().map(|p| format!("  + {p}")));
            lines.extend(output.counterpoints.iter().map(|c| format!("  - {c}")));
        } else {
            lines.push("  (unstructured reply)".to_string());
            lines.extend(result.raw.lines().map(|l| format!("  {l}")));
        }
    }
    lines.join("\n")
}

fn capitalized(round: Round) -> String {
    format!("Round {}", round.number())
}
