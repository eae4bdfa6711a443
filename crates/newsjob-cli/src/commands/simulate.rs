//! Scripted shift against the simulated world.
//!
//! The session is driven on a virtual clock, so a two minute broadcast plays
//! out instantly. Every step that the session rejects is printed and the
//! script carries on, the way a player would try the next thing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;
use newsjob_core::error::UserFacing;
use newsjob_core::session::{EquipmentKind, PayoutReceipt};
use newsjob_core::world::{Severity, VehicleHandle};
use newsjob_core::{ActorId, JobConfig, JobSession};
use newsjob_infrastructure::{SimulatedWorld, WorldEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;

const ACTOR: ActorId = ActorId(1);
const STARTING_BALANCE: i64 = 2_000;

struct Shift {
    world: Arc<SimulatedWorld>,
    session: JobSession,
    now: Instant,
    frame: Duration,
}

impl Shift {
    fn new(config: JobConfig, seed: u64) -> Self {
        let config = Arc::new(config);
        let frame = config.timing.frame_interval();
        let world = Arc::new(SimulatedWorld::new(config.clone()));
        let session = JobSession::new(ACTOR, config, world.clone())
            .with_rng(StdRng::seed_from_u64(seed));
        Self {
            world,
            session,
            now: Instant::now(),
            frame,
        }
    }

    /// Ticks the session frame by frame until `duration` has passed.
    fn advance(&mut self, duration: Duration) {
        let until = self.now + duration;
        while self.now < until {
            self.now += self.frame;
            if let Some(cause) = self.session.tick(self.now) {
                println!("  {}", format!("interrupted: {cause}").yellow());
            }
        }
    }

    fn advance_to(&mut self, at: Instant) {
        if at > self.now {
            self.advance(at - self.now);
        }
    }

    /// Prints the outcome of a step and shows rejections to the player.
    fn step<T, E: UserFacing>(&mut self, label: &str, result: Result<T, E>) -> Option<T> {
        let value = match result {
            Ok(value) => {
                println!("{} {}", "✓".green(), label);
                Some(value)
            }
            Err(err) => {
                println!("{} {}", "✗".red(), label);
                self.session.report(&err);
                None
            }
        };
        self.print_events();
        value
    }

    fn print_events(&self) {
        for event in self.world.drain_events() {
            match event {
                WorldEvent::Notified { notification, .. } => {
                    let line = format!("  [{}]", notification.message);
                    let line = match notification.severity {
                        Severity::Success => line.bright_green(),
                        Severity::Warning => line.yellow(),
                        Severity::Error => line.red(),
                        Severity::Info => line.bright_blue(),
                    };
                    println!("{line}");
                }
                WorldEvent::Deducted(request) => {
                    println!("  {}", format!("- ${} deposit", request.amount).bright_black());
                }
                WorldEvent::Paid(request) => {
                    println!(
                        "  {}",
                        format!("+ ${} {}", request.amount, request.source.label()).bright_black()
                    );
                }
                WorldEvent::VehicleIssued { vehicle, spec } => {
                    println!(
                        "  {}",
                        format!("vehicle #{} ({}) issued", vehicle.0, spec.model).bright_black()
                    );
                }
                WorldEvent::VehicleRemoved { vehicle } => {
                    println!("  {}", format!("vehicle #{} removed", vehicle.0).bright_black());
                }
                WorldEvent::Cue { .. }
                | WorldEvent::PropSpawned { .. }
                | WorldEvent::PropDeleted { .. } => {}
            }
        }
    }

    fn rent(&mut self) -> Option<VehicleHandle> {
        self.world.place_at_rental_pickup(ACTOR);
        let result = self.session.request_rental();
        let vehicle = self.step("rent a news van", result)?;

        // Drive off and park, then stand at the rear doors.
        self.world.enter_vehicle(ACTOR, vehicle, true);
        self.advance(Duration::from_secs(1));
        self.world.leave_vehicle(ACTOR);
        self.advance(Duration::from_secs(1));
        Some(vehicle)
    }

    fn broadcast(&mut self, seconds: u64) {
        let result = self.session.acquire(EquipmentKind::Camera, self.now);
        if self.step("take the camera out of storage", result).is_none() {
            return;
        }
        self.advance(self.session.config().timing.storage_access());

        let result = self.session.toggle_shoulder(self.now);
        self.step("shoulder the camera", result);
        self.advance(Duration::from_millis(400));

        let result = self.session.toggle_on_air(self.now);
        self.step("go on air", result);
        self.advance(Duration::from_millis(600));

        self.world.set_observers(ACTOR, true);
        self.advance(Duration::from_secs(seconds));
        self.world.set_observers(ACTOR, false);
        let work_time = self.session.work_time();
        println!(
            "  {}",
            format!(
                "recorded {}m {}s",
                work_time.minutes, work_time.seconds
            )
            .bright_black()
        );

        let result = self.session.store(None, self.now);
        self.step("put the camera back", result);
    }

    fn upload(&mut self, vehicle: VehicleHandle) -> Option<PayoutReceipt> {
        self.world.enter_vehicle(ACTOR, vehicle, true);
        self.advance(self.frame);

        let result = self.session.begin_upload(self.now);
        let ticket = self.step("start the upload", result)?;
        println!(
            "  {}",
            format!("transfer takes {:.1}s", ticket.delay.as_secs_f32()).bright_black()
        );
        self.advance_to(ticket.ready_at);

        let result = self.session.complete_upload(ticket, self.now);
        self.step("finish the upload", result)
    }
}

pub fn run(config: JobConfig, seconds: u64, seed: u64, json: bool) -> Result<()> {
    let mut shift = Shift::new(config, seed);
    shift.world.set_balance(ACTOR, STARTING_BALANCE);

    println!("{}", "=== Simulated shift ===".bright_magenta().bold());

    shift.world.place_at_headquarters(ACTOR);
    let result = shift.session.clock_in(shift.now);
    shift.step("clock in at headquarters", result);

    let vehicle = shift.rent();
    shift.broadcast(seconds);
    let receipt = vehicle.and_then(|vehicle| shift.upload(vehicle));

    shift.world.place_at_rental_return(ACTOR);
    let result = shift.session.request_return();
    if let Some(outcome) = shift.step("return the van", result) {
        println!("  {}", format!("{outcome:?}").bright_black());
    }

    shift.world.leave_vehicle(ACTOR);
    shift.world.place_at_headquarters(ACTOR);
    shift.advance(shift.frame);
    let result = shift.session.clock_out(shift.now);
    shift.step("clock out", result);

    println!();
    if json {
        let rendered =
            serde_json::to_string_pretty(&receipt).context("Failed to render receipt")?;
        println!("{rendered}");
    } else {
        match &receipt {
            Some(receipt) => println!(
                "{}",
                format!(
                    "Receipt {}: {} minutes, ${}",
                    receipt.receipt_id, receipt.minutes, receipt.amount
                )
                .bright_green()
                .bold()
            ),
            None => println!("{}", "No report was paid this shift.".yellow()),
        }
    }
    println!(
        "Balance: ${} (started with ${})",
        shift.world.balance(ACTOR),
        STARTING_BALANCE
    );

    Ok(())
}
