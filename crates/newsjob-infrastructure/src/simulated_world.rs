//! In-memory world for the simulator, the REPL and application tests.
//!
//! Holds one [`ActorSnapshot`] per actor plus every prop and vehicle the
//! sessions create. Money actually moves: deductions lower the actor's
//! balance and payments raise it. Every collaborator call that a player
//! would notice is appended to an event log that callers drain.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use newsjob_core::geometry::{SpawnSlot, Vec3};
use newsjob_core::session::{AttachPose, EquipmentKind};
use newsjob_core::world::{
    ActorId, ActorLookup, ActorSnapshot, DeductionRequest, Economy, Notification, PaymentRequest,
    PresentationCue, Presenter, PropHandle, PropWorld, Proximity, RentalVehicleSpec,
    VehicleHandle, VehicleWorld,
};
use newsjob_core::JobConfig;
use serde::Serialize;
use tracing::{debug, trace};

/// Something observable that happened in the simulated world.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    Notified {
        actor: ActorId,
        notification: Notification,
    },
    Cue {
        actor: ActorId,
        cue: PresentationCue,
    },
    Deducted(DeductionRequest),
    Paid(PaymentRequest),
    VehicleIssued {
        vehicle: VehicleHandle,
        spec: RentalVehicleSpec,
    },
    VehicleRemoved {
        vehicle: VehicleHandle,
    },
    PropSpawned {
        prop: PropHandle,
        kind: EquipmentKind,
    },
    PropDeleted {
        prop: PropHandle,
    },
}

#[derive(Debug, Clone)]
struct SimProp {
    kind: EquipmentKind,
    holder: Option<ActorId>,
    pose: Option<AttachPose>,
}

#[derive(Debug, Clone, Default)]
struct SimVehicle {
    slot: Option<SpawnSlot>,
    work_vehicle: bool,
    storage_open: bool,
    passengers: usize,
}

#[derive(Debug, Default)]
struct WorldState {
    actors: HashMap<ActorId, ActorSnapshot>,
    props: HashMap<PropHandle, SimProp>,
    vehicles: HashMap<VehicleHandle, SimVehicle>,
    blocked_slots: Vec<SpawnSlot>,
    events: Vec<WorldEvent>,
    next_handle: u32,
}

impl WorldState {
    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn actor(&mut self, actor: ActorId) -> &mut ActorSnapshot {
        self.actors.entry(actor).or_default()
    }
}

/// A scriptable implementation of every collaborator trait.
pub struct SimulatedWorld {
    config: Arc<JobConfig>,
    state: Mutex<WorldState>,
}

impl SimulatedWorld {
    pub fn new(config: Arc<JobConfig>) -> Self {
        Self {
            config,
            state: Mutex::new(WorldState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        // A panicking test thread must not wedge every other caller.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    /// Edits the actor's snapshot in place.
    pub fn update_actor(&self, actor: ActorId, f: impl FnOnce(&mut ActorSnapshot)) {
        f(self.state().actor(actor));
    }

    pub fn actor_snapshot(&self, actor: ActorId) -> ActorSnapshot {
        self.state().actor(actor).clone()
    }

    pub fn move_to(&self, actor: ActorId, position: Vec3) {
        self.update_actor(actor, |snapshot| snapshot.position = position);
    }

    pub fn place_at_headquarters(&self, actor: ActorId) {
        self.move_to(actor, self.config.places.headquarters.position);
    }

    pub fn place_at_rental_pickup(&self, actor: ActorId) {
        self.move_to(actor, self.config.places.rental_pickup.position);
    }

    pub fn place_at_rental_return(&self, actor: ActorId) {
        self.move_to(actor, self.config.places.rental_return.position);
    }

    pub fn set_balance(&self, actor: ActorId, balance: i64) {
        self.update_actor(actor, |snapshot| snapshot.balance = balance);
    }

    pub fn balance(&self, actor: ActorId) -> i64 {
        self.state().actor(actor).balance
    }

    pub fn set_observers(&self, actor: ActorId, present: bool) {
        self.update_actor(actor, |snapshot| snapshot.observers_nearby = present);
    }

    pub fn damage(&self, actor: ActorId, amount: i32) {
        self.update_actor(actor, |snapshot| snapshot.health -= amount);
    }

    /// A parked work vehicle with its rear doors open.
    pub fn add_work_vehicle(&self) -> VehicleHandle {
        let mut state = self.state();
        let vehicle = VehicleHandle(state.next_handle());
        state.vehicles.insert(
            vehicle,
            SimVehicle {
                work_vehicle: true,
                storage_open: true,
                ..SimVehicle::default()
            },
        );
        vehicle
    }

    pub fn set_storage_open(&self, vehicle: VehicleHandle, open: bool) {
        if let Some(sim) = self.state().vehicles.get_mut(&vehicle) {
            sim.storage_open = open;
        }
    }

    pub fn add_passengers(&self, vehicle: VehicleHandle, count: usize) {
        if let Some(sim) = self.state().vehicles.get_mut(&vehicle) {
            sim.passengers += count;
        }
    }

    pub fn enter_vehicle(&self, actor: ActorId, vehicle: VehicleHandle, driving: bool) {
        self.update_actor(actor, |snapshot| {
            snapshot.current_vehicle = Some(vehicle);
            snapshot.is_driving = driving;
        });
    }

    pub fn leave_vehicle(&self, actor: ActorId) {
        self.update_actor(actor, |snapshot| {
            if let Some(vehicle) = snapshot.current_vehicle.take() {
                snapshot.last_vehicle = Some(vehicle);
            }
            snapshot.is_driving = false;
        });
    }

    /// Puts the actor on foot behind a fresh work vehicle they just left.
    pub fn stand_at_work_vehicle_storage(&self, actor: ActorId) -> VehicleHandle {
        let vehicle = self.add_work_vehicle();
        self.enter_vehicle(actor, vehicle, true);
        self.leave_vehicle(actor);
        vehicle
    }

    /// Marks a rental slot as taken by someone else.
    pub fn block_slot(&self, slot: SpawnSlot) {
        self.state().blocked_slots.push(slot);
    }

    /// Removes a prop behind the session's back.
    pub fn vanish_prop(&self, prop: PropHandle) {
        self.state().props.remove(&prop);
    }

    /// Props currently attached to the actor.
    pub fn held_props(&self, actor: ActorId) -> Vec<(PropHandle, EquipmentKind)> {
        self.state()
            .props
            .iter()
            .filter(|(_, prop)| prop.holder == Some(actor) && prop.pose.is_some())
            .map(|(handle, prop)| (*handle, prop.kind))
            .collect()
    }

    pub fn vehicle_count(&self) -> usize {
        self.state().vehicles.len()
    }

    /// Takes every event recorded since the last drain.
    pub fn drain_events(&self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.state().events)
    }

    /// Payments recorded since the last drain.
    pub fn payments(&self) -> Vec<PaymentRequest> {
        self.state()
            .events
            .iter()
            .filter_map(|event| match event {
                WorldEvent::Paid(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ActorLookup for SimulatedWorld {
    fn snapshot(&self, actor: ActorId) -> ActorSnapshot {
        self.state().actor(actor).clone()
    }
}

impl Proximity for SimulatedWorld {
    fn is_near(&self, actor: ActorId, point: Vec3, radius: f32) -> bool {
        self.state().actor(actor).position.distance_squared(&point) <= radius * radius
    }
}

impl PropWorld for SimulatedWorld {
    fn spawn_prop(
        &self,
        actor: ActorId,
        kind: EquipmentKind,
        _pose: &AttachPose,
    ) -> Option<PropHandle> {
        let mut state = self.state();
        let prop = PropHandle(state.next_handle());
        state.props.insert(
            prop,
            SimProp {
                kind,
                holder: Some(actor),
                pose: None,
            },
        );
        state.events.push(WorldEvent::PropSpawned { prop, kind });
        trace!(prop = prop.0, %kind, "Prop spawned");
        Some(prop)
    }

    fn attach(&self, actor: ActorId, prop: PropHandle, pose: &AttachPose) {
        if let Some(sim) = self.state().props.get_mut(&prop) {
            sim.holder = Some(actor);
            sim.pose = Some(*pose);
        }
    }

    fn detach(&self, prop: PropHandle) {
        if let Some(sim) = self.state().props.get_mut(&prop) {
            sim.holder = None;
            sim.pose = None;
        }
    }

    fn delete(&self, prop: PropHandle) {
        let mut state = self.state();
        if state.props.remove(&prop).is_some() {
            state.events.push(WorldEvent::PropDeleted { prop });
        }
    }

    fn exists(&self, prop: PropHandle) -> bool {
        self.state().props.contains_key(&prop)
    }
}

impl VehicleWorld for SimulatedWorld {
    fn slot_occupied(&self, slot: &SpawnSlot) -> bool {
        let state = self.state();
        state.blocked_slots.contains(slot)
            || state
                .vehicles
                .values()
                .any(|vehicle| vehicle.slot.as_ref() == Some(slot))
    }

    fn spawn_rental(&self, spec: &RentalVehicleSpec) -> Option<VehicleHandle> {
        let mut state = self.state();
        let vehicle = VehicleHandle(state.next_handle());
        state.vehicles.insert(
            vehicle,
            SimVehicle {
                slot: Some(spec.slot),
                // The session registers it as a work vehicle itself.
                work_vehicle: false,
                storage_open: true,
                passengers: 0,
            },
        );
        state.events.push(WorldEvent::VehicleIssued {
            vehicle,
            spec: spec.clone(),
        });
        debug!(vehicle = vehicle.0, model = %spec.model, "Rental vehicle spawned");
        Some(vehicle)
    }

    fn vehicle_exists(&self, vehicle: VehicleHandle) -> bool {
        self.state().vehicles.contains_key(&vehicle)
    }

    fn is_work_vehicle(&self, vehicle: VehicleHandle) -> bool {
        self.state()
            .vehicles
            .get(&vehicle)
            .is_some_and(|sim| sim.work_vehicle)
    }

    fn register_work_vehicle(&self, vehicle: VehicleHandle) {
        if let Some(sim) = self.state().vehicles.get_mut(&vehicle) {
            sim.work_vehicle = true;
        }
    }

    fn storage_open(&self, vehicle: VehicleHandle) -> bool {
        self.state()
            .vehicles
            .get(&vehicle)
            .is_some_and(|sim| sim.storage_open)
    }

    fn within_storage_reach(&self, actor: ActorId, _vehicle: VehicleHandle) -> bool {
        self.state().actor(actor).current_vehicle.is_none()
    }

    fn passenger_count(&self, vehicle: VehicleHandle) -> usize {
        self.state()
            .vehicles
            .get(&vehicle)
            .map_or(0, |sim| sim.passengers)
    }

    fn order_driver_out(&self, actor: ActorId, vehicle: VehicleHandle) {
        self.update_actor(actor, |snapshot| {
            if snapshot.current_vehicle == Some(vehicle) {
                snapshot.current_vehicle = None;
                snapshot.is_driving = false;
                snapshot.last_vehicle = Some(vehicle);
            }
        });
    }

    fn order_passengers_out(&self, vehicle: VehicleHandle) {
        if let Some(sim) = self.state().vehicles.get_mut(&vehicle) {
            sim.passengers = 0;
        }
    }

    fn remove_vehicle(&self, vehicle: VehicleHandle) {
        let mut state = self.state();
        if state.vehicles.remove(&vehicle).is_some() {
            state.events.push(WorldEvent::VehicleRemoved { vehicle });
        }
    }
}

impl Economy for SimulatedWorld {
    fn request_deduction(&self, request: DeductionRequest) {
        let mut state = self.state();
        state.actor(request.actor).balance -= i64::from(request.amount);
        state.events.push(WorldEvent::Deducted(request));
    }

    fn request_payment(&self, request: PaymentRequest) {
        let mut state = self.state();
        state.actor(request.actor).balance += i64::from(request.amount);
        state.events.push(WorldEvent::Paid(request));
    }
}

impl Presenter for SimulatedWorld {
    fn notify(&self, actor: ActorId, notification: Notification) {
        self.state()
            .events
            .push(WorldEvent::Notified { actor, notification });
    }

    fn cue(&self, actor: ActorId, cue: PresentationCue) {
        self.state().events.push(WorldEvent::Cue { actor, cue });
    }
}
