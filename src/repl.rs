//! Interactive shell.

use crate::commands::{format_response, is_reported, parse_inline_query, run_file, OutputFormat};
use colored::Colorize;
use rri_client::Client;
use rri_protocol::Query;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::PathBuf;

const HELP_TEXT: &str = r#"
Available commands:
  help                          Show this help

  login <user> <password>       Log in
  logout                        Log out, keep the connection

  check <domain>                Check domain availability
  info <domain>                 Show domain data
  delete <domain>               Delete a domain
  restore <domain>              Restore a deleted domain
  transit <domain> [disconnect] Transit a domain to the registry

  raw <key: value; key: value>  Send an arbitrary query
  file <path>                   Run a query document

  quit, exit                    Exit the shell
"#;

/// A parsed shell line.
#[derive(Debug, PartialEq)]
enum ReplCommand {
    Help,
    Quit,
    Login { user: String, password: String },
    Logout,
    Query(Query),
    File(PathBuf),
    Usage(&'static str),
    Unknown(String),
}

pub async fn run(client: &Client, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "RRI client".bold().cyan());
    println!("Connected to {}", client.config().addr);

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = home::home_dir()
        .map(|h| h.join(".rri_client_history"))
        .unwrap_or_else(|| PathBuf::from(".rri_client_history"));
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", "rri>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let command = parse_command(line);
                if !has_secret(&command) {
                    let _ = rl.add_history_entry(line);
                }

                match execute(client, command, format).await {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break,
                    Err(e) if is_reported(e.as_ref()) => println!(),
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }

                // fatal errors drop the session inside the client
                if client.is_closed() {
                    println!("{}", "Connection lost.".red());
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);

    Ok(())
}

fn parse_command(line: &str) -> ReplCommand {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match cmd.to_lowercase().as_str() {
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,

        "login" => match args.as_slice() {
            [user, password] => ReplCommand::Login {
                user: user.to_string(),
                password: password.to_string(),
            },
            _ => ReplCommand::Usage("Usage: login <user> <password>"),
        },

        "logout" => ReplCommand::Logout,

        "check" | "info" | "delete" | "restore" => match args.as_slice() {
            [domain] => ReplCommand::Query(match cmd.to_lowercase().as_str() {
                "check" => Query::check_domain(domain),
                "info" => Query::info_domain(domain),
                "delete" => Query::delete_domain(domain),
                _ => Query::restore_domain(domain),
            }),
            _ => ReplCommand::Usage("Usage: check|info|delete|restore <domain>"),
        },

        "transit" => match args.as_slice() {
            [domain] => ReplCommand::Query(Query::transit_domain(domain, false)),
            [domain, "disconnect"] => ReplCommand::Query(Query::transit_domain(domain, true)),
            _ => ReplCommand::Usage("Usage: transit <domain> [disconnect]"),
        },

        "raw" => match parse_inline_query(rest) {
            Ok(query) => ReplCommand::Query(query),
            Err(_) => ReplCommand::Usage("Usage: raw <key: value; key: value; ...>"),
        },

        "file" => match args.as_slice() {
            [path] => ReplCommand::File(PathBuf::from(path)),
            _ => ReplCommand::Usage("Usage: file <path>"),
        },

        other => ReplCommand::Unknown(other.to_string()),
    }
}

/// Lines carrying a password never reach the history file.
fn has_secret(command: &ReplCommand) -> bool {
    match command {
        ReplCommand::Login { .. } => true,
        ReplCommand::Query(query) => query.get("password").is_some(),
        _ => false,
    }
}

async fn execute(
    client: &Client,
    command: ReplCommand,
    format: OutputFormat,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    match command {
        ReplCommand::Help => Ok(Some(HELP_TEXT.to_string())),
        ReplCommand::Quit => Ok(None),

        ReplCommand::Login { user, password } => {
            client.login(&user, &password).await?;
            Ok(Some(format!("{} as {}", "Logged in".green(), user.cyan())))
        }

        ReplCommand::Logout => {
            client.logout().await?;
            Ok(Some("Logged out".green().to_string()))
        }

        ReplCommand::Query(query) => {
            let response = client.send_query(&query).await?;
            Ok(Some(format_response(&response, format)))
        }

        ReplCommand::File(path) => {
            run_file(client, &path, format).await?;
            Ok(Some("Done".green().to_string()))
        }

        ReplCommand::Usage(usage) => Ok(Some(usage.to_string())),

        ReplCommand::Unknown(cmd) => Ok(Some(format!(
            "Unknown command: {}. Type 'help' for help.",
            cmd
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command("help"), ReplCommand::Help);
        assert_eq!(parse_command("EXIT"), ReplCommand::Quit);
        assert_eq!(parse_command("logout"), ReplCommand::Logout);
        assert_eq!(
            parse_command("frobnicate"),
            ReplCommand::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            parse_command("login DENIC-1000011-RRI secret"),
            ReplCommand::Login {
                user: "DENIC-1000011-RRI".to_string(),
                password: "secret".to_string()
            }
        );
        assert!(matches!(parse_command("login onlyuser"), ReplCommand::Usage(_)));
    }

    #[test]
    fn test_parse_domain_queries() {
        assert_eq!(
            parse_command("check denic.de"),
            ReplCommand::Query(Query::check_domain("denic.de"))
        );
        assert_eq!(
            parse_command("restore denic.de"),
            ReplCommand::Query(Query::restore_domain("denic.de"))
        );
        assert_eq!(
            parse_command("transit denic.de disconnect"),
            ReplCommand::Query(Query::transit_domain("denic.de", true))
        );
        assert!(matches!(parse_command("info"), ReplCommand::Usage(_)));
    }

    #[test]
    fn test_parse_raw() {
        let expected = Query::empty()
            .with_field("version", "3.0")
            .with_field("action", "CHECK")
            .with_field("domain", "denic.de");
        assert_eq!(
            parse_command("raw version: 3.0; action: CHECK; domain: denic.de"),
            ReplCommand::Query(expected)
        );
        assert!(matches!(parse_command("raw"), ReplCommand::Usage(_)));
    }

    #[test]
    fn test_secrets_stay_out_of_history() {
        assert!(has_secret(&parse_command("login DENIC-1000011-RRI secret")));
        assert!(has_secret(&parse_command(
            "raw version: 3.0; action: LOGIN; user: u; password: secret"
        )));
        assert!(has_secret(&parse_command("raw action: LOGIN; PASSWORD=secret")));
        assert!(!has_secret(&parse_command("check denic.de")));
        assert!(!has_secret(&parse_command("raw action: CHECK; domain: denic.de")));
    }

    #[test]
    fn test_parse_file() {
        assert_eq!(
            parse_command("file batch.rri"),
            ReplCommand::File(PathBuf::from("batch.rri"))
        );
    }
}
