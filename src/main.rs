use anyhow::Result;
use std::sync::Arc;

use geomind_ai::Mode;
use geomind_core::{AppError, Config, Coordinates};
use geomind_ui::{render_message, App, ChatSession, SubmitOutcome, USER_MARKER_LABEL};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

const HELP: &str = "\
Type a message to chat, or one of:
  /mode search|chat     switch between Maps & Search and Pro Chat
  /pan <lat> <lng>      move the map
  /locate               enable location
  /weather              refresh the weather now
  /suggest <n>          send suggestion number n
  /help                 show this help
  /quit                 exit";

enum Command {
    Say(String),
    Mode(Mode),
    Pan(Coordinates),
    Locate,
    Weather,
    Suggest(usize),
    Help,
    Quit,
    Invalid(&'static str),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let command = match parts.next().unwrap_or_default() {
        "mode" => match parts.next().map(str::parse::<Mode>) {
            Some(Ok(mode)) => Command::Mode(mode),
            _ => Command::Invalid("usage: /mode search|chat"),
        },
        "pan" => {
            let lat = parts.next().and_then(|s| s.parse::<f64>().ok());
            let lng = parts.next().and_then(|s| s.parse::<f64>().ok());
            match (lat, lng) {
                (Some(lat), Some(lng)) if Coordinates::new(lat, lng).is_valid() => {
                    Command::Pan(Coordinates::new(lat, lng))
                }
                _ => Command::Invalid("usage: /pan <lat> <lng>"),
            }
        }
        "locate" => Command::Locate,
        "weather" => Command::Weather,
        "suggest" => match parts.next().and_then(|s| s.parse::<usize>().ok()) {
            Some(n) if n > 0 => Command::Suggest(n),
            _ => Command::Invalid("usage: /suggest <n>"),
        },
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Invalid("unknown command, try /help"),
    };
    Some(command)
}

fn print_shortcuts(chat: &ChatSession) {
    for (i, action) in chat.shortcuts().iter().enumerate() {
        println!("  {}. {}", i + 1, action.label);
    }
}

fn print_header(app: &App) {
    let mode = app.state().mode();
    println!("{} | {}", mode.label(), mode.caption());
    println!("{}", app.map().status_line());
    if let Some(marker) = app.map().marker() {
        println!("  {}: {}", USER_MARKER_LABEL, marker);
    }
    if app.needs_location() {
        println!("  Location unknown, /locate to enable it");
    }
}

/// Print every new transcript entry as it lands.
fn spawn_transcript_printer(mut rx: watch::Receiver<geomind_ui::ChatState>) {
    tokio::spawn(async move {
        let mut printed = rx.borrow_and_update().messages.len();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            for message in state.messages.iter().skip(printed) {
                if !message.is_user() {
                    println!("{}\n", render_message(message));
                }
            }
            printed = state.messages.len();
            if state.loading {
                println!("Thinking...");
            }
        }
    });
}

/// Print the weather line whenever it settles.
fn spawn_weather_printer(app: &App) {
    let mut rx = app.weather().subscribe();
    let focus = app.state().subscribe_focus();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = *rx.borrow_and_update();
            if state.loading {
                continue;
            }
            let view = geomind_ui::WeatherView::from_state(*focus.borrow(), &state);
            if let Some(line) = view.summary() {
                println!("Weather: {}", line);
            }
        }
    });
}

fn submit(chat: &Arc<ChatSession>, text: String) {
    let chat = Arc::clone(chat);
    tokio::spawn(async move {
        if chat.submit(&text).await == SubmitOutcome::Busy {
            println!("Still waiting for the last reply.");
        }
    });
}

async fn run(app: &mut App) -> Result<()> {
    app.start();
    spawn_transcript_printer(app.chat().subscribe());
    spawn_weather_printer(app);

    app.locate().await;
    print_header(app);
    println!("\nTry one of these, or /help:");
    print_shortcuts(app.chat());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            continue;
        };
        match command {
            Command::Say(text) => submit(app.chat(), text),
            Command::Mode(mode) => {
                if app.state().set_mode(mode) {
                    println!("{} | {}", mode.label(), mode.caption());
                }
            }
            Command::Pan(coords) => {
                app.map().pan_to(coords);
                println!("{}", app.map().status_line());
            }
            Command::Locate => {
                app.locate().await;
                print_header(app);
            }
            Command::Weather => app.refresh_weather(),
            Command::Suggest(n) => match app.chat().shortcuts().get(n - 1) {
                Some(action) => {
                    println!("You > {}", action.prompt);
                    submit(app.chat(), action.prompt.to_string());
                }
                None => print_shortcuts(app.chat()),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Invalid(usage) => println!("{}", usage),
        }
    }

    app.shutdown();
    Ok(())
}

/// Log a start-up failure and exit with its user-facing message.
fn exit_on_startup_error(err: anyhow::Error) -> ! {
    tracing::error!("Startup failed: {:#}", err);
    eprintln!("{}", AppError::from_anyhow(err).user_message());
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    geomind_core::init()?;

    let (config, _validation) =
        Config::load_validated().unwrap_or_else(|e| exit_on_startup_error(e));
    let mut app = App::new(config).unwrap_or_else(|e| exit_on_startup_error(e));

    tracing::info!("GeoMind started");
    run(&mut app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert!(matches!(parse_command("  coffee near me "), Some(Command::Say(s)) if s == "coffee near me"));
        assert!(parse_command("   ").is_none());
    }

    #[test]
    fn test_commands() {
        assert!(matches!(parse_command("/mode chat"), Some(Command::Mode(Mode::DeepChat))));
        assert!(matches!(
            parse_command("/pan 48.85 2.35"),
            Some(Command::Pan(c)) if c == Coordinates::new(48.85, 2.35)
        ));
        assert!(matches!(parse_command("/suggest 2"), Some(Command::Suggest(2))));
        assert!(matches!(parse_command("/quit"), Some(Command::Quit)));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(matches!(parse_command("/pan 95 0"), Some(Command::Invalid(_))));
        assert!(matches!(parse_command("/suggest 0"), Some(Command::Invalid(_))));
        assert!(matches!(parse_command("/mode poetry"), Some(Command::Invalid(_))));
        assert!(matches!(parse_command("/frobnicate"), Some(Command::Invalid(_))));
    }
}
