//! In-memory collaborator world for session unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::JobConfig;
use crate::geometry::{SpawnSlot, Vec3};
use crate::world::{
    ActorId, ActorLookup, ActorSnapshot, DeductionRequest, Economy, Notification, PaymentRequest,
    PresentationCue, Presenter, PropHandle, PropWorld, Proximity, RentalVehicleSpec,
    VehicleHandle, VehicleWorld,
};

use super::model::JobSession;
use super::pose::{AttachPose, EquipmentKind};

pub const ACTOR: ActorId = ActorId(1);

#[derive(Debug, Clone, PartialEq)]
pub struct PropRecord {
    pub kind: EquipmentKind,
    pub attached: Option<AttachPose>,
    pub deleted: bool,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub snapshot: ActorSnapshot,
    pub props: HashMap<PropHandle, PropRecord>,
    pub fail_prop_spawn: bool,

    pub vehicles: HashSet<VehicleHandle>,
    pub work_vehicles: HashSet<VehicleHandle>,
    pub storage_open: HashSet<VehicleHandle>,
    pub out_of_reach: bool,
    pub occupied_slots: Vec<SpawnSlot>,
    pub vehicle_slots: HashMap<VehicleHandle, SpawnSlot>,
    pub fail_vehicle_spawn: bool,
    pub spawned_vehicles: Vec<RentalVehicleSpec>,
    pub removed_vehicles: Vec<VehicleHandle>,
    pub passengers: HashMap<VehicleHandle, usize>,
    pub passenger_orders: usize,
    pub driver_out_orders: Vec<VehicleHandle>,

    pub deductions: Vec<DeductionRequest>,
    pub payments: Vec<PaymentRequest>,
    pub notifications: Vec<Notification>,
    pub cues: Vec<PresentationCue>,

    next_handle: u32,
}

impl FakeState {
    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Records every collaborator call behind a mutex.
pub struct FakeWorld {
    pub config: Arc<JobConfig>,
    state: Mutex<FakeState>,
}

impl FakeWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(JobConfig::default()),
            state: Mutex::new(FakeState::default()),
        })
    }

    pub fn session(self: &Arc<Self>) -> JobSession {
        JobSession::new(ACTOR, self.config.clone(), self.clone())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state());
    }

    pub fn has_cue(&self, cue: PresentationCue) -> bool {
        self.state().cues.contains(&cue)
    }

    pub fn clear_cues(&self) {
        self.state().cues.clear();
    }

    pub fn has_notification(&self, fragment: &str) -> bool {
        self.state()
            .notifications
            .iter()
            .any(|n| n.message.contains(fragment))
    }

    /// A parked work vehicle with open storage in reach.
    pub fn add_work_vehicle(&self) -> VehicleHandle {
        let mut state = self.state();
        let vehicle = VehicleHandle(state.next_handle());
        state.vehicles.insert(vehicle);
        state.work_vehicles.insert(vehicle);
        state.storage_open.insert(vehicle);
        vehicle
    }

    pub fn enter_vehicle(&self, vehicle: VehicleHandle, driving: bool) {
        self.update(|state| {
            state.snapshot.current_vehicle = Some(vehicle);
            state.snapshot.is_driving = driving;
        });
    }

    pub fn leave_vehicle(&self) {
        self.update(|state| {
            if let Some(vehicle) = state.snapshot.current_vehicle.take() {
                state.snapshot.last_vehicle = Some(vehicle);
            }
            state.snapshot.is_driving = false;
        });
    }

    pub fn vanish_prop(&self, prop: PropHandle) {
        self.update(|state| {
            state.props.remove(&prop);
        });
    }
}

impl ActorLookup for FakeWorld {
    fn snapshot(&self, _actor: ActorId) -> ActorSnapshot {
        self.state().snapshot.clone()
    }
}

impl Proximity for FakeWorld {
    fn is_near(&self, _actor: ActorId, point: Vec3, radius: f32) -> bool {
        self.state().snapshot.position.distance_squared(&point) <= radius * radius
    }
}

impl PropWorld for FakeWorld {
    fn spawn_prop(
        &self,
        _actor: ActorId,
        kind: EquipmentKind,
        _pose: &AttachPose,
    ) -> Option<PropHandle> {
        let mut state = self.state();
        if state.fail_prop_spawn {
            return None;
        }
        let prop = PropHandle(state.next_handle());
        state.props.insert(
            prop,
            PropRecord {
                kind,
                attached: None,
                deleted: false,
            },
        );
        Some(prop)
    }

    fn attach(&self, _actor: ActorId, prop: PropHandle, pose: &AttachPose) {
        if let Some(record) = self.state().props.get_mut(&prop) {
            record.attached = Some(*pose);
        }
    }

    fn detach(&self, prop: PropHandle) {
        if let Some(record) = self.state().props.get_mut(&prop) {
            record.attached = None;
        }
    }

    fn delete(&self, prop: PropHandle) {
        if let Some(record) = self.state().props.get_mut(&prop) {
            record.attached = None;
            record.deleted = true;
        }
    }

    fn exists(&self, prop: PropHandle) -> bool {
        self.state()
            .props
            .get(&prop)
            .is_some_and(|record| !record.deleted)
    }
}

impl VehicleWorld for FakeWorld {
    fn slot_occupied(&self, slot: &SpawnSlot) -> bool {
        self.state().occupied_slots.contains(slot)
    }

    fn spawn_rental(&self, spec: &RentalVehicleSpec) -> Option<VehicleHandle> {
        let mut state = self.state();
        if state.fail_vehicle_spawn {
            return None;
        }
        let vehicle = VehicleHandle(state.next_handle());
        state.vehicles.insert(vehicle);
        state.storage_open.insert(vehicle);
        state.occupied_slots.push(spec.slot);
        state.vehicle_slots.insert(vehicle, spec.slot);
        state.spawned_vehicles.push(spec.clone());
        Some(vehicle)
    }

    fn vehicle_exists(&self, vehicle: VehicleHandle) -> bool {
        self.state().vehicles.contains(&vehicle)
    }

    fn is_work_vehicle(&self, vehicle: VehicleHandle) -> bool {
        self.state().work_vehicles.contains(&vehicle)
    }

    fn register_work_vehicle(&self, vehicle: VehicleHandle) {
        self.state().work_vehicles.insert(vehicle);
    }

    fn storage_open(&self, vehicle: VehicleHandle) -> bool {
        self.state().storage_open.contains(&vehicle)
    }

    fn within_storage_reach(&self, _actor: ActorId, _vehicle: VehicleHandle) -> bool {
        !self.state().out_of_reach
    }

    fn passenger_count(&self, vehicle: VehicleHandle) -> usize {
        self.state().passengers.get(&vehicle).copied().unwrap_or(0)
    }

    fn order_driver_out(&self, _actor: ActorId, vehicle: VehicleHandle) {
        let mut state = self.state();
        state.driver_out_orders.push(vehicle);
        if state.snapshot.current_vehicle == Some(vehicle) {
            state.snapshot.current_vehicle = None;
            state.snapshot.is_driving = false;
            state.snapshot.last_vehicle = Some(vehicle);
        }
    }

    fn order_passengers_out(&self, vehicle: VehicleHandle) {
        let mut state = self.state();
        state.passenger_orders += 1;
        // One passenger obeys per order.
        if let Some(count) = state.passengers.get_mut(&vehicle) {
            *count = count.saturating_sub(1);
        }
    }

    fn remove_vehicle(&self, vehicle: VehicleHandle) {
        let mut state = self.state();
        state.vehicles.remove(&vehicle);
        state.removed_vehicles.push(vehicle);
        if let Some(slot) = state.vehicle_slots.remove(&vehicle) {
            state.occupied_slots.retain(|occupied| *occupied != slot);
        }
    }
}

impl Economy for FakeWorld {
    fn request_deduction(&self, request: DeductionRequest) {
        self.state().deductions.push(request);
    }

    fn request_payment(&self, request: PaymentRequest) {
        self.state().payments.push(request);
    }
}

impl Presenter for FakeWorld {
    fn notify(&self, _actor: ActorId, notification: Notification) {
        self.state().notifications.push(notification);
    }

    fn cue(&self, _actor: ActorId, cue: PresentationCue) {
        self.state().cues.push(cue);
    }
}

/// A fake world and a session clocked in at headquarters.
pub fn employed_session() -> (Arc<FakeWorld>, JobSession) {
    let world = FakeWorld::new();
    world.update(|state| {
        state.snapshot.position = world.config.places.headquarters.position;
    });
    let mut session = world.session();
    session.clock_in(Instant::now()).unwrap();
    (world, session)
}

/// Puts the actor on foot at the open storage of a work vehicle they just left.
pub fn at_storage(world: &FakeWorld, session: &mut JobSession, _now: Instant) -> VehicleHandle {
    let vehicle = world.add_work_vehicle();
    world.update(|state| {
        state.snapshot.current_vehicle = None;
        state.snapshot.is_driving = false;
        state.snapshot.last_vehicle = Some(vehicle);
    });
    session.last_work_vehicle = Some(vehicle);
    vehicle
}

/// Gives the actor `kind` taken from a work vehicle's storage.
pub fn holding(
    world: &FakeWorld,
    session: &mut JobSession,
    kind: EquipmentKind,
    now: Instant,
) -> VehicleHandle {
    let vehicle = at_storage(world, session, now);
    session.acquire(kind, now).unwrap();
    vehicle
}

/// Seats the actor in the driver's seat of a fresh work vehicle.
pub fn seated_in_work_vehicle(world: &FakeWorld) -> VehicleHandle {
    let vehicle = world.add_work_vehicle();
    world.enter_vehicle(vehicle, true);
    vehicle
}

/// Ticks `count` times, `step` apart, starting one step after `start`.
pub fn run_ticks(session: &mut JobSession, start: Instant, count: u32, step: Duration) -> Instant {
    let mut now = start;
    for _ in 0..count {
        now += step;
        session.tick(now);
    }
    now
}
