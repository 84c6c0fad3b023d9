use std::io::BufRead;

use clap::Subcommand;
use lifelog_core::storage::credentials;

use super::CliResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a token in the OS keyring
    Set {
        /// Token name (notion_token, google_token, github_token)
        name: String,
        /// Token value; read from stdin when omitted
        #[arg(long)]
        token: Option<String>,
    },
    /// Remove a stored token
    Clear {
        /// Token name
        name: String,
    },
    /// Show which tokens are available
    Status,
}

fn check_name(name: &str) -> CliResult {
    if credentials::KNOWN.contains(&name) {
        Ok(())
    } else {
        Err(format!(
            "Unknown token: {name}. Valid tokens: {}",
            credentials::KNOWN.join(", ")
        )
        .into())
    }
}

pub fn run(action: AuthAction) -> CliResult {
    match action {
        AuthAction::Set { name, token } => {
            check_name(&name)?;
            let token = match token {
                Some(token) => token,
                None => {
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line.trim().to_string()
                }
            };
            if token.is_empty() {
                return Err("empty token".into());
            }
            credentials::set(&name, &token)?;
            println!("{name} stored");
        }
        AuthAction::Clear { name } => {
            check_name(&name)?;
            credentials::delete(&name)?;
            println!("{name} removed");
        }
        AuthAction::Status => {
            for name in credentials::KNOWN {
                let state = match credentials::get(name) {
                    Ok(Some(_)) => "set".to_string(),
                    Ok(None) => "missing".to_string(),
                    Err(e) => format!("unavailable ({e})"),
                };
                println!("{name}: {state}");
            }
        }
    }
    Ok(())
}
