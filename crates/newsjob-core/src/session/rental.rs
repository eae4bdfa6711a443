use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RentalError;
use crate::geometry::SpawnSlot;
use crate::world::{
    DeductionRequest, Notification, PaymentRequest, PaymentSource, RentalVehicleSpec,
    VehicleHandle,
};

use super::model::JobSession;

/// Rental vehicle lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RentalState {
    #[default]
    NoVehicle,
    DepositPending { slot: SpawnSlot },
    VehicleIssued { vehicle: VehicleHandle },
    ReturnPending { vehicle: VehicleHandle },
}

impl RentalState {
    pub fn vehicle(&self) -> Option<VehicleHandle> {
        match self {
            Self::VehicleIssued { vehicle } | Self::ReturnPending { vehicle } => Some(*vehicle),
            Self::NoVehicle | Self::DepositPending { .. } => None,
        }
    }
}

/// Equipment taken out of storage since the current rental was issued and
/// not put back. Dropped equipment stays outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EquipmentLedger {
    outstanding: u32,
}

impl EquipmentLedger {
    pub fn outstanding(&self) -> u32 {
        self.outstanding
    }

    pub(crate) fn taken(&mut self) {
        self.outstanding += 1;
    }

    pub(crate) fn stored(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    pub(crate) fn reset(&mut self) {
        self.outstanding = 0;
    }
}

/// Result of handing the rental vehicle back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundOutcome {
    Refunded { amount: u32 },
    Forfeited { outstanding: u32 },
}

impl JobSession {
    /// Takes the deposit and issues a vehicle at the nearest free slot.
    pub fn request_rental(&mut self) -> Result<VehicleHandle, RentalError> {
        if !self.is_employed() {
            return Err(RentalError::NotEmployed);
        }
        if self.rental != RentalState::NoVehicle {
            return Err(RentalError::AlreadyRented);
        }
        if !self.is_near(&self.config.places.rental_pickup) {
            return Err(RentalError::NotAtPickup);
        }

        let snapshot = self.world.snapshot(self.actor);
        let deposit = self.config.economy.deposit_amount;
        if snapshot.balance < i64::from(deposit) {
            return Err(RentalError::InsufficientFunds {
                required: deposit,
                available: snapshot.balance,
            });
        }

        // Other actors share the slots, so availability is scanned per request.
        let slot = self
            .config
            .rental_slots
            .iter()
            .filter(|slot| !self.world.slot_occupied(slot))
            .min_by(|a, b| {
                let da = a.position.distance_squared(&snapshot.position);
                let db = b.position.distance_squared(&snapshot.position);
                da.total_cmp(&db)
            })
            .copied()
            .ok_or(RentalError::NoSlotAvailable)?;

        self.rental = RentalState::DepositPending { slot };
        self.world.request_deduction(DeductionRequest {
            actor: self.actor,
            method: snapshot.payment_method,
            amount: deposit,
        });

        let spec = RentalVehicleSpec {
            renter: self.actor,
            model: self.config.vehicle.model.clone(),
            livery: self.config.vehicle.livery,
            plate_prefix: self.config.vehicle.plate_prefix,
            slot,
            fuel: self.config.vehicle.fuel,
            purchasable: false,
            locked: false,
            engine_running: false,
            persistent: true,
        };

        let Some(vehicle) = self.world.spawn_rental(&spec) else {
            warn!(
                session_id = %self.id,
                actor = %self.actor,
                "Rental vehicle failed to spawn, returning deposit"
            );
            self.world.request_payment(PaymentRequest::direct_deposit(
                self.actor,
                deposit,
                PaymentSource::DepositReturn,
                Utc::now(),
            ));
            self.rental = RentalState::NoVehicle;
            return Err(RentalError::VehicleSpawnFailed);
        };

        self.world.register_work_vehicle(vehicle);
        self.rental = RentalState::VehicleIssued { vehicle };
        self.ledger.reset();

        info!(
            session_id = %self.id,
            actor = %self.actor,
            vehicle = vehicle.0,
            deposit,
            "Rental vehicle issued"
        );
        self.notify(Notification::success(format!(
            "You paid a {deposit} deposit. Your work vehicle is parked outside."
        )));
        Ok(vehicle)
    }

    /// Hands the rented vehicle back and settles the deposit.
    pub fn request_return(&mut self) -> Result<RefundOutcome, RentalError> {
        if !self.is_employed() {
            return Err(RentalError::NotEmployed);
        }
        let RentalState::VehicleIssued { vehicle } = self.rental else {
            return Err(RentalError::NoRental);
        };

        if !self.world.vehicle_exists(vehicle) {
            warn!(
                session_id = %self.id,
                actor = %self.actor,
                vehicle = vehicle.0,
                "Rented vehicle no longer exists, deposit forfeited"
            );
            self.rental = RentalState::NoVehicle;
            self.forget_vehicle(vehicle);
            return Err(RentalError::NoRental);
        }
        if !self.is_near(&self.config.places.rental_return) {
            return Err(RentalError::NotAtReturnPoint);
        }

        let snapshot = self.world.snapshot(self.actor);
        if snapshot.current_vehicle != Some(vehicle) || !snapshot.is_driving {
            return Err(RentalError::NotDriver);
        }

        self.rental = RentalState::ReturnPending { vehicle };
        self.world.order_driver_out(self.actor, vehicle);
        self.evict_passengers(vehicle);

        let outstanding = self.ledger.outstanding();
        let outcome = if outstanding == 0 {
            let amount = self.config.economy.deposit_amount;
            self.world.request_payment(PaymentRequest::direct_deposit(
                self.actor,
                amount,
                PaymentSource::DepositReturn,
                Utc::now(),
            ));
            self.notify(Notification::success(format!(
                "Thanks for bringing everything back. Your {amount} deposit was returned."
            )));
            RefundOutcome::Refunded { amount }
        } else {
            self.notify(Notification::warning(
                "Equipment is missing from the vehicle. Your deposit was not returned.",
            ));
            RefundOutcome::Forfeited { outstanding }
        };

        self.world.remove_vehicle(vehicle);
        self.forget_vehicle(vehicle);
        self.rental = RentalState::NoVehicle;
        self.ledger.reset();

        info!(
            session_id = %self.id,
            actor = %self.actor,
            vehicle = vehicle.0,
            ?outcome,
            "Rental vehicle returned"
        );
        Ok(outcome)
    }

    fn evict_passengers(&self, vehicle: VehicleHandle) {
        let mut attempts = 0;
        while self.world.passenger_count(vehicle) > 0 {
            if attempts >= self.config.max_eviction_attempts {
                warn!(
                    session_id = %self.id,
                    vehicle = vehicle.0,
                    attempts,
                    "Passengers still inside after eviction attempts"
                );
                return;
            }
            self.world.order_passengers_out(vehicle);
            attempts += 1;
        }
        debug!(vehicle = vehicle.0, attempts, "Vehicle cleared for return");
    }

    fn forget_vehicle(&mut self, vehicle: VehicleHandle) {
        if self.last_work_vehicle == Some(vehicle) {
            self.last_work_vehicle = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::{FakeWorld, employed_session};
    use crate::world::PaymentMethod;

    fn at_pickup(world: &FakeWorld, balance: i64) {
        world.update(|state| {
            state.snapshot.position = world.config.places.rental_pickup.position;
            state.snapshot.balance = balance;
        });
    }

    #[test]
    fn test_rental_with_insufficient_funds_changes_nothing() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 499);

        let err = session.request_rental().unwrap_err();

        assert_eq!(
            err,
            RentalError::InsufficientFunds {
                required: 500,
                available: 499
            }
        );
        assert_eq!(session.rental(), &RentalState::NoVehicle);
        assert!(world.state().deductions.is_empty());
        assert!(world.state().spawned_vehicles.is_empty());
    }

    #[test]
    fn test_rental_picks_nearest_free_slot() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 1_000);
        let slots = world.config.rental_slots.clone();
        // Slot 2 is closest to the pickup desk, slot 3 is next.
        world.update(|state| state.occupied_slots.push(slots[2]));

        let vehicle = session.request_rental().unwrap();

        let state = world.state();
        assert_eq!(state.spawned_vehicles.len(), 1);
        assert_eq!(state.spawned_vehicles[0].slot, slots[3]);
        assert!(!state.spawned_vehicles[0].purchasable);
        assert!(!state.spawned_vehicles[0].engine_running);
        assert!(state.work_vehicles.contains(&vehicle));
        assert_eq!(
            state.deductions,
            vec![DeductionRequest {
                actor: session.actor(),
                method: PaymentMethod::Debit,
                amount: 500,
            }]
        );
        assert_eq!(session.rental(), &RentalState::VehicleIssued { vehicle });
    }

    #[test]
    fn test_rental_without_free_slot_takes_no_deposit() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 1_000);
        let slots = world.config.rental_slots.clone();
        world.update(|state| state.occupied_slots = slots);

        assert_eq!(session.request_rental(), Err(RentalError::NoSlotAvailable));
        assert!(world.state().deductions.is_empty());
        assert_eq!(session.rental(), &RentalState::NoVehicle);
    }

    #[test]
    fn test_failed_spawn_returns_deposit() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 1_000);
        world.update(|state| state.fail_vehicle_spawn = true);

        assert_eq!(
            session.request_rental(),
            Err(RentalError::VehicleSpawnFailed)
        );

        let state = world.state();
        assert_eq!(state.deductions.len(), 1);
        assert_eq!(state.payments.len(), 1);
        assert_eq!(state.payments[0].source, PaymentSource::DepositReturn);
        assert_eq!(state.payments[0].amount, 500);
        assert_eq!(session.rental(), &RentalState::NoVehicle);
    }

    #[test]
    fn test_second_rental_is_rejected() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 1_000);
        session.request_rental().unwrap();

        assert_eq!(session.request_rental(), Err(RentalError::AlreadyRented));
        assert_eq!(world.state().deductions.len(), 1);
    }

    #[test]
    fn test_return_requires_driver_at_return_point() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 1_000);
        let vehicle = session.request_rental().unwrap();

        assert_eq!(session.request_return(), Err(RentalError::NotAtReturnPoint));

        world.update(|state| {
            state.snapshot.position = world.config.places.rental_return.position;
        });
        assert_eq!(session.request_return(), Err(RentalError::NotDriver));

        world.enter_vehicle(vehicle, false);
        assert_eq!(session.request_return(), Err(RentalError::NotDriver));
        assert_eq!(session.rental(), &RentalState::VehicleIssued { vehicle });
    }

    #[test]
    fn test_return_evicts_passengers_and_refunds() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 1_000);
        let vehicle = session.request_rental().unwrap();
        world.update(|state| {
            state.snapshot.position = world.config.places.rental_return.position;
            state.passengers.insert(vehicle, 3);
        });
        world.enter_vehicle(vehicle, true);

        let outcome = session.request_return().unwrap();

        assert_eq!(outcome, RefundOutcome::Refunded { amount: 500 });
        let state = world.state();
        assert_eq!(state.passenger_orders, 3);
        assert_eq!(state.driver_out_orders, vec![vehicle]);
        assert_eq!(state.removed_vehicles, vec![vehicle]);
        assert_eq!(state.payments.len(), 1);
        assert_eq!(state.payments[0].source, PaymentSource::DepositReturn);
        assert_eq!(session.rental(), &RentalState::NoVehicle);
    }

    #[test]
    fn test_eviction_gives_up_after_bounded_attempts() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 1_000);
        let vehicle = session.request_rental().unwrap();
        world.update(|state| {
            state.snapshot.position = world.config.places.rental_return.position;
            state.passengers.insert(vehicle, 1_000);
        });
        world.enter_vehicle(vehicle, true);

        session.request_return().unwrap();

        assert_eq!(
            world.state().passenger_orders,
            world.config.max_eviction_attempts as usize
        );
        assert_eq!(session.rental(), &RentalState::NoVehicle);
    }

    #[test]
    fn test_vanished_vehicle_is_forgotten() {
        let (world, mut session) = employed_session();
        at_pickup(&world, 1_000);
        let vehicle = session.request_rental().unwrap();
        world.update(|state| {
            state.vehicles.remove(&vehicle);
        });

        assert_eq!(session.request_return(), Err(RentalError::NoRental));
        assert_eq!(session.rental(), &RentalState::NoVehicle);
        assert!(world.state().payments.is_empty());
    }
}
