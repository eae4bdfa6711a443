use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::UploadError;
use crate::world::{Notification, PaymentRequest, PaymentSource};

use super::model::{JobSession, WorkTime};

/// An upload waiting out its transfer delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    pub minutes: u32,
    pub delay: Duration,
    pub ready_at: Instant,
}

/// What a finished upload paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReceipt {
    pub receipt_id: Uuid,
    pub minutes: u32,
    /// Zero when the drawn pay was not positive and no payment was requested.
    pub amount: u32,
    pub paid_at: DateTime<Utc>,
}

impl JobSession {
    /// Starts uploading the recorded work time from inside a work vehicle.
    pub fn begin_upload(&mut self, now: Instant) -> Result<UploadTicket, UploadError> {
        if self.upload_in_flight {
            return Err(UploadError::AlreadyUploading);
        }
        if !self.is_employed() {
            return Err(UploadError::NotEmployed);
        }
        let snapshot = self.world.snapshot(self.actor);
        let in_work_vehicle = snapshot
            .current_vehicle
            .is_some_and(|vehicle| self.world.is_work_vehicle(vehicle));
        if !in_work_vehicle {
            return Err(UploadError::WrongVehicle);
        }
        if self.work_time.is_empty() {
            return Err(UploadError::NothingToUpload);
        }

        let minutes = self.work_time.minutes;
        let delay = self.transfer_delay(minutes);
        self.upload_in_flight = true;
        self.notify(Notification::info("Uploading your footage back to HQ."));
        debug!(session_id = %self.id, minutes, ?delay, "Upload started");

        Ok(UploadTicket {
            minutes,
            delay,
            ready_at: now + delay,
        })
    }

    /// Pays out an upload whose ticket is due and resets the accumulator.
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        _now: Instant,
    ) -> Result<PayoutReceipt, UploadError> {
        // Clock-out or teardown while the transfer ran cancels it.
        if !self.upload_in_flight {
            return Err(UploadError::Cancelled);
        }

        let amount = self.draw_pay(ticket.minutes);
        let paid_at = Utc::now();
        if amount > 0 {
            self.world.request_payment(PaymentRequest::direct_deposit(
                self.actor,
                amount,
                PaymentSource::JobSubmission,
                paid_at,
            ));
            self.notify(Notification::success(format!(
                "HQ received your footage and paid you {amount}."
            )));
        } else {
            self.notify(Notification::info(
                "HQ received your footage but could not use any of it.",
            ));
        }

        self.work_time = WorkTime::default();
        self.upload_in_flight = false;

        let receipt = PayoutReceipt {
            receipt_id: Uuid::new_v4(),
            minutes: ticket.minutes,
            amount,
            paid_at,
        };
        info!(
            session_id = %self.id,
            actor = %self.actor,
            receipt_id = %receipt.receipt_id,
            minutes = receipt.minutes,
            amount,
            "Upload paid"
        );
        Ok(receipt)
    }

    /// Runs a whole upload without waiting out the transfer delay.
    pub fn upload(&mut self, now: Instant) -> Result<PayoutReceipt, UploadError> {
        let ticket = self.begin_upload(now)?;
        self.complete_upload(ticket, ticket.ready_at)
    }

    /// `minutes ..= minutes + extra` seconds plus up to `jitter` milliseconds.
    fn transfer_delay(&mut self, minutes: u32) -> Duration {
        let timing = &self.config.timing;
        let seconds = self
            .rng
            .gen_range(minutes..=minutes + timing.upload_extra_seconds);
        let jitter = self.rng.gen_range(0..=timing.upload_jitter_ms);
        Duration::from_secs(u64::from(seconds)) + Duration::from_millis(jitter)
    }

    /// Gaussian pay around half the hourly rate per recorded minute.
    fn draw_pay(&mut self, minutes: u32) -> u32 {
        let economy = &self.config.economy;
        let mean = f64::from(minutes) * (f64::from(economy.hourly_rate) / 2.0);
        let pay = (mean + economy.payout_stddev * standard_normal(&mut self.rng)).round();
        if pay > 0.0 { pay as u32 } else { 0 }
    }
}

/// Box-Muller transform over two uniform draws.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen_range(0.0..1.0);
    let u2 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::session::test_support::{employed_session, seated_in_work_vehicle};

    #[test]
    fn test_upload_outside_work_vehicle_fails() {
        let (_world, mut session) = employed_session();
        session.work_time.minutes = 3;

        assert_eq!(
            session.upload(Instant::now()),
            Err(UploadError::WrongVehicle)
        );
        assert_eq!(session.work_time().minutes, 3);
    }

    #[test]
    fn test_upload_with_nothing_recorded_fails() {
        let (world, mut session) = employed_session();
        seated_in_work_vehicle(&world);
        session.work_time.seconds = 42;

        assert_eq!(
            session.upload(Instant::now()),
            Err(UploadError::NothingToUpload)
        );
        assert_eq!(session.work_time().seconds, 42);
        assert!(!session.upload_in_flight());
        assert!(world.state().payments.is_empty());
    }

    #[test]
    fn test_upload_pays_and_resets() {
        let (world, session) = employed_session();
        let mut session = session.with_rng(StdRng::seed_from_u64(7));
        seated_in_work_vehicle(&world);
        session.work_time = WorkTime {
            minutes: 4,
            seconds: 30,
        };

        let receipt = session.upload(Instant::now()).unwrap();

        assert_eq!(receipt.minutes, 4);
        // mean 500, stddev 3
        assert!((480..=520).contains(&receipt.amount));
        assert_eq!(session.work_time(), WorkTime::default());
        assert!(!session.upload_in_flight());

        let state = world.state();
        assert_eq!(state.payments.len(), 1);
        assert_eq!(state.payments[0].amount, receipt.amount);
        assert_eq!(state.payments[0].source, PaymentSource::JobSubmission);
        assert!(
            state.payments[0]
                .event_data
                .starts_with("PAYMENT|NEWSJOBSUBMISSION|SUCCESS|TS1=")
        );
    }

    #[test]
    fn test_second_upload_while_in_flight_is_rejected() {
        let (world, mut session) = employed_session();
        seated_in_work_vehicle(&world);
        session.work_time.minutes = 2;
        let now = Instant::now();

        let ticket = session.begin_upload(now).unwrap();
        assert!(ticket.delay >= Duration::from_secs(2));
        assert!(ticket.delay <= Duration::from_millis(12_500));

        assert_eq!(session.begin_upload(now), Err(UploadError::AlreadyUploading));
        assert_eq!(session.work_time().minutes, 2);

        session.complete_upload(ticket, ticket.ready_at).unwrap();
        assert_eq!(world.state().payments.len(), 1);
    }

    #[test]
    fn test_non_positive_pay_emits_nothing() {
        let (world, session) = employed_session();
        let mut session = session.with_rng(StdRng::seed_from_u64(11));
        seated_in_work_vehicle(&world);
        let mut config = session.config().clone();
        config.economy.hourly_rate = 0;
        session.config = std::sync::Arc::new(config);

        let mut unpaid = 0;
        for _ in 0..20 {
            session.work_time.minutes = 1;
            let receipt = session.upload(Instant::now()).unwrap();
            if receipt.amount == 0 {
                unpaid += 1;
                assert_eq!(session.work_time(), WorkTime::default());
            }
        }

        assert!(unpaid > 0);
        assert_eq!(world.state().payments.len(), 20 - unpaid);
    }

    #[test]
    fn test_standard_normal_is_centred_and_finite() {
        let mut rng = StdRng::seed_from_u64(5);
        let draws: Vec<f64> = (0..4_000).map(|_| standard_normal(&mut rng)).collect();

        assert!(draws.iter().all(|d| d.is_finite()));
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.1, "mean {mean}");
    }

    #[test]
    fn test_teardown_cancels_pending_upload() {
        let (world, mut session) = employed_session();
        seated_in_work_vehicle(&world);
        session.work_time.minutes = 1;
        let now = Instant::now();

        let ticket = session.begin_upload(now).unwrap();
        session.teardown();

        assert_eq!(
            session.complete_upload(ticket, ticket.ready_at),
            Err(UploadError::Cancelled)
        );
        assert!(world.state().payments.is_empty());
    }
}
