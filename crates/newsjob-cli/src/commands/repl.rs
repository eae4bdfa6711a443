//! Interactive shell for one actor's job session.
//!
//! Chat commands (`/getequip cam`, ...), work controls (`shoulder`, `onair`,
//! ...) and location actions (`clockin`, `rent`, ...) go through the command
//! use case. World verbs (`goto`, `enter`, `hurt`, ...) script the simulated
//! world so the session has something to react to.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use newsjob_application::{CommandOutcome, CommandUseCase, SessionRegistry, SessionTicker};
use newsjob_core::command::{JobAction, WorkControl};
use newsjob_core::world::Severity;
use newsjob_core::{ActorId, JobConfig};
use newsjob_infrastructure::{SimulatedWorld, WorldEvent};
use newsjob_telemetry::{LogFormat, SessionLogEvent};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;

const ACTOR: ActorId = ActorId(1);
const WORLD_POLL: Duration = Duration::from_millis(100);

const CHAT_COMMANDS: [&str; 4] = ["/getequip", "/storeequip", "/uploadreport", "/equiphelp"];
const WORLD_VERBS: [&str; 9] = [
    "goto", "enter", "leave", "observers", "hurt", "balance", "look", "status", "help",
];

/// Where `goto` can send the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Headquarters,
    RentalPickup,
    RentalReturn,
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
enum ReplInput {
    Quit,
    Help,
    Status,
    Control(WorkControl),
    Action(JobAction),
    Look(f32, f32),
    Goto(Destination),
    EnterVan,
    LeaveVehicle,
    Observers(bool),
    Hurt(i32),
    Balance(Option<i64>),
    /// Anything else is handed to the chat command parser.
    Chat(String),
}

fn parse_input(line: &str) -> Result<ReplInput, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty input".to_string());
    };
    let arg = words.next();

    if let Ok(control) = verb.parse::<WorkControl>() {
        return Ok(ReplInput::Control(control));
    }
    if let Ok(action) = verb.parse::<JobAction>() {
        return Ok(ReplInput::Action(action));
    }

    match verb.to_ascii_lowercase().as_str() {
        "quit" | "exit" => Ok(ReplInput::Quit),
        "help" => Ok(ReplInput::Help),
        "status" => Ok(ReplInput::Status),
        "enter" => Ok(ReplInput::EnterVan),
        "leave" => Ok(ReplInput::LeaveVehicle),
        "goto" => match arg {
            Some("hq") => Ok(ReplInput::Goto(Destination::Headquarters)),
            Some("pickup") => Ok(ReplInput::Goto(Destination::RentalPickup)),
            Some("return") => Ok(ReplInput::Goto(Destination::RentalReturn)),
            _ => Err("usage: goto hq|pickup|return".to_string()),
        },
        "observers" => match arg {
            Some("on") => Ok(ReplInput::Observers(true)),
            Some("off") => Ok(ReplInput::Observers(false)),
            _ => Err("usage: observers on|off".to_string()),
        },
        "hurt" => arg
            .and_then(|amount| amount.parse().ok())
            .map(ReplInput::Hurt)
            .ok_or_else(|| "usage: hurt <amount>".to_string()),
        "balance" => match arg {
            None => Ok(ReplInput::Balance(None)),
            Some(amount) => amount
                .parse()
                .map(|amount| ReplInput::Balance(Some(amount)))
                .map_err(|_| "usage: balance [amount]".to_string()),
        },
        "look" => {
            let dy = words.next();
            match (arg.map(str::parse::<f32>), dy.map(str::parse::<f32>)) {
                (Some(Ok(dx)), Some(Ok(dy))) => Ok(ReplInput::Look(dx, dy)),
                _ => Err("usage: look <dx> <dy>".to_string()),
            }
        }
        _ => Ok(ReplInput::Chat(line.to_string())),
    }
}

/// rustyline helper completing chat commands, controls and world verbs.
#[derive(Clone)]
struct ReplHelper {
    words: Vec<String>,
}

impl ReplHelper {
    fn new() -> Self {
        let mut words: Vec<String> = CHAT_COMMANDS.iter().map(|c| c.to_string()).collect();
        words.extend(WorkControl::all().iter().map(|c| c.name().to_string()));
        words.extend(
            ["clockin", "clockout", "rent", "return", "quit"]
                .iter()
                .map(|w| w.to_string()),
        );
        words.extend(WORLD_VERBS.iter().map(|w| w.to_string()));
        Self { words }
    }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if line.is_empty() || line.contains(' ') {
            return Ok((0, vec![]));
        }

        let candidates = self
            .words
            .iter()
            .filter(|word| word.starts_with(line))
            .map(|word| Pair {
                display: word.clone(),
                replacement: word.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() || line.contains(' ') {
            return None;
        }
        self.words
            .iter()
            .find(|word| word.starts_with(line) && word.len() > line.len())
            .map(|word| word[line.len()..].to_string())
    }
}

impl Validator for ReplHelper {}

fn print_help() {
    println!("{}", "Chat commands:".bright_yellow());
    for command in CHAT_COMMANDS {
        println!("  {command}");
    }
    println!("{}", "Work controls:".bright_yellow());
    let controls: Vec<&str> = WorkControl::all().iter().map(|c| c.name()).collect();
    println!("  {}", controls.join(", "));
    println!("{}", "Actions:".bright_yellow());
    println!("  clockin, clockout, rent, return");
    println!("{}", "World:".bright_yellow());
    println!("  goto hq|pickup|return, enter, leave, observers on|off, hurt <n>, balance [n]");
    println!("  look <dx> <dy>, status, quit");
}

fn print_outcome(outcome: &CommandOutcome) {
    let line = match outcome {
        CommandOutcome::EquipmentTaken { kind } => format!("took the {kind}").green(),
        CommandOutcome::EquipmentStored => "equipment stored".green(),
        CommandOutcome::StorageBusy => "already at the storage".bright_black(),
        CommandOutcome::Uploaded { receipt } => format!(
            "uploaded {} minutes, paid ${}",
            receipt.minutes, receipt.amount
        )
        .bright_green(),
        CommandOutcome::HelpShown => "help shown".green(),
        CommandOutcome::ControlApplied { control } => control.name().green(),
        CommandOutcome::ClockedIn => "clocked in".green(),
        CommandOutcome::ClockedOut => "clocked out".green(),
        CommandOutcome::VehicleIssued { vehicle } => {
            format!("van #{} is waiting in the lot", vehicle.0).green()
        }
        CommandOutcome::VehicleReturned { outcome } => format!("van returned: {outcome:?}").green(),
        CommandOutcome::Rejected { error } => format!("rejected: {error}").red(),
    };
    println!("{line}");
}

fn print_log_event(event: &SessionLogEvent, format: LogFormat) {
    let line = event.render(format);
    match event.level.as_str() {
        "WARN" | "ERROR" => println!("{}", line.yellow()),
        _ => println!("{}", line.bright_black()),
    }
}

/// Prints what the world shows the player.
fn print_world_event(event: &WorldEvent) {
    match event {
        WorldEvent::Notified { notification, .. } => {
            let line = format!("» {}", notification.message);
            let line = match notification.severity {
                Severity::Success => line.bright_green(),
                Severity::Warning => line.yellow(),
                Severity::Error => line.red(),
                Severity::Info => line.bright_blue(),
            };
            println!("{line}");
        }
        WorldEvent::Paid(request) => {
            println!(
                "{}",
                format!("» ${} {}", request.amount, request.source.label()).bright_green()
            );
        }
        WorldEvent::Deducted(request) => {
            println!("{}", format!("» -${}", request.amount).yellow());
        }
        _ => {}
    }
}

struct Repl {
    world: Arc<SimulatedWorld>,
    usecase: Arc<CommandUseCase>,
}

impl Repl {
    async fn handle(&self, input: ReplInput) {
        let world = &self.world;
        match input {
            ReplInput::Quit => {}
            ReplInput::Help => print_help(),
            ReplInput::Status => {
                let handle = self.usecase.registry().get_or_create(ACTOR).await;
                let status = handle.status().await;
                match serde_json::to_string_pretty(&status) {
                    Ok(rendered) => println!("{}", rendered.bright_black()),
                    Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                }
                println!("{}", format!("balance: ${}", world.balance(ACTOR)).bright_black());
            }
            ReplInput::Goto(destination) => {
                match destination {
                    Destination::Headquarters => world.place_at_headquarters(ACTOR),
                    Destination::RentalPickup => world.place_at_rental_pickup(ACTOR),
                    Destination::RentalReturn => world.place_at_rental_return(ACTOR),
                }
                println!("{}", format!("moved to {destination:?}").bright_black());
            }
            ReplInput::EnterVan => {
                let handle = self.usecase.registry().get_or_create(ACTOR).await;
                match handle.status().await.rental.vehicle() {
                    Some(vehicle) => {
                        world.enter_vehicle(ACTOR, vehicle, true);
                        println!("{}", format!("driving van #{}", vehicle.0).bright_black());
                    }
                    None => println!("{}", "no van rented".yellow()),
                }
            }
            ReplInput::LeaveVehicle => {
                world.leave_vehicle(ACTOR);
                println!("{}", "on foot".bright_black());
            }
            ReplInput::Observers(present) => world.set_observers(ACTOR, present),
            ReplInput::Hurt(amount) => world.damage(ACTOR, amount),
            ReplInput::Balance(Some(amount)) => world.set_balance(ACTOR, amount),
            ReplInput::Balance(None) => println!("${}", world.balance(ACTOR)),
            ReplInput::Look(dx, dy) => {
                let handle = self.usecase.registry().get_or_create(ACTOR).await;
                if let Err(err) = handle.look(dx, dy).await {
                    println!("{}", format!("rejected: {err}").red());
                }
            }
            ReplInput::Control(control) => {
                print_outcome(&self.usecase.control(ACTOR, control).await);
            }
            ReplInput::Action(action) => {
                print_outcome(&self.usecase.action(ACTOR, action).await);
            }
            ReplInput::Chat(line) => {
                print_outcome(&self.usecase.execute_line(ACTOR, &line).await);
            }
        }
    }
}

pub async fn run(
    config: JobConfig,
    mut log_events: mpsc::UnboundedReceiver<SessionLogEvent>,
    log_format: LogFormat,
) -> Result<()> {
    let config = Arc::new(config);
    let world = Arc::new(SimulatedWorld::new(config.clone()));
    let registry = Arc::new(SessionRegistry::new(config, world.clone()));
    let ticker = SessionTicker::spawn_default(registry.clone());
    let repl = Arc::new(Repl {
        world: world.clone(),
        usecase: Arc::new(CommandUseCase::new(registry.clone())),
    });

    let world_printer = tokio::spawn({
        let cancel = ticker.cancel_token();
        async move {
            let mut interval = tokio::time::interval(WORLD_POLL);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        for event in world.drain_events() {
                            print_world_event(&event);
                        }
                    }
                }
            }
        }
    });
    let log_printer = tokio::spawn(async move {
        while let Some(event) = log_events.recv().await {
            print_log_event(&event, log_format);
        }
    });

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ReplHelper::new()));

    println!("{}", "=== NEWSJOB REPL ===".bright_magenta().bold());
    println!(
        "{}",
        "You start at headquarters. Type 'clockin' to start a shift, 'help' for commands, or 'quit' to exit."
            .bright_black()
    );
    println!();
    repl.world.place_at_headquarters(ACTOR);
    repl.world.set_balance(ACTOR, 2_000);

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match parse_input(trimmed) {
                    Ok(ReplInput::Quit) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    // Storage access and uploads take a while; keep the prompt free.
                    Ok(input) => {
                        let repl = repl.clone();
                        tokio::spawn(async move { repl.handle(input).await });
                    }
                    Err(usage) => println!("{}", usage.yellow()),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    registry.clear().await;
    ticker.shutdown().await;
    let _ = world_printer.await;
    log_printer.abort();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_controls_actions_and_world_verbs() {
        assert_eq!(
            parse_input("onair").unwrap(),
            ReplInput::Control(WorkControl::ToggleOnAir)
        );
        assert_eq!(
            parse_input("rent").unwrap(),
            ReplInput::Action(JobAction::RentVehicle)
        );
        assert_eq!(
            parse_input("goto pickup").unwrap(),
            ReplInput::Goto(Destination::RentalPickup)
        );
        assert_eq!(parse_input("hurt 30").unwrap(), ReplInput::Hurt(30));
        assert_eq!(parse_input("look 1.5 -2").unwrap(), ReplInput::Look(1.5, -2.0));
        assert_eq!(parse_input("balance").unwrap(), ReplInput::Balance(None));
    }

    #[test]
    fn test_chat_lines_pass_through() {
        assert_eq!(
            parse_input("/getequip cam").unwrap(),
            ReplInput::Chat("/getequip cam".to_string())
        );
        assert_eq!(
            parse_input("dance").unwrap(),
            ReplInput::Chat("dance".to_string())
        );
    }

    #[test]
    fn test_world_verb_usage_errors() {
        assert!(parse_input("goto moon").is_err());
        assert!(parse_input("observers").is_err());
        assert!(parse_input("look 1").is_err());
    }
}
