//! Owner of every note instance running in one process.
//!
//! # Responsibility
//! - Spawn instances (restored, or new on request) through a surface factory.
//! - Drive the cooperative dispatch step for all of them.
//!
//! # Invariants
//! - Torn-down instances are dropped on the next `step`.
//! - Nothing here blocks or spawns threads.

use crate::config::AppConfig;
use crate::context::NoteContext;
use crate::external::surface::NoteSurface;
use crate::model::note::NoteId;
use crate::repo::note_store::StoreResult;
use crate::service::instance::{ActionOutcome, Collaborators, NoteInstanceController};
use log::{debug, info};

/// Builds the live widget and collaborators for each new instance.
pub trait SurfaceFactory {
    type Surface: NoteSurface;

    fn create_surface(&mut self) -> Self::Surface;

    fn collaborators(&mut self, config: &AppConfig) -> Collaborators {
        Collaborators::from_config(config)
    }
}

pub struct NoteHost<F: SurfaceFactory> {
    ctx: NoteContext,
    factory: F,
    instances: Vec<NoteInstanceController<F::Surface>>,
}

impl<F: SurfaceFactory> NoteHost<F> {
    pub fn new(ctx: NoteContext, factory: F) -> Self {
        Self {
            ctx,
            factory,
            instances: Vec::new(),
        }
    }

    pub fn context(&self) -> &NoteContext {
        &self.ctx
    }

    /// Starts one instance bound to `bound`, or to a new note when `None`.
    pub fn spawn(&mut self, bound: Option<NoteId>) -> &mut NoteInstanceController<F::Surface> {
        let surface = self.factory.create_surface();
        let collaborators = self.factory.collaborators(self.ctx.config());
        let instance =
            NoteInstanceController::initialize(self.ctx.clone(), surface, collaborators, bound);
        self.instances.push(instance);
        let index = self.instances.len() - 1;
        &mut self.instances[index]
    }

    /// Starts an instance for every stored note. Returns how many started.
    pub fn restore_all(&mut self) -> StoreResult<usize> {
        let ids: Vec<NoteId> = self
            .ctx
            .store()
            .list_all()?
            .into_iter()
            .map(|note| note.id)
            .collect();
        for id in &ids {
            self.spawn(Some(*id));
        }
        info!(
            "event=host_restore module=service status=ok count={}",
            ids.len()
        );
        Ok(ids.len())
    }

    /// Acts on an instance action result; spawns a sibling when requested.
    pub fn handle(&mut self, outcome: ActionOutcome) -> Option<NoteId> {
        match outcome {
            ActionOutcome::SpawnRequested => self.spawn(None).note_id(),
            ActionOutcome::Done | ActionOutcome::Cancelled => None,
        }
    }

    pub fn instances(&self) -> &[NoteInstanceController<F::Surface>] {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut [NoteInstanceController<F::Surface>] {
        &mut self.instances
    }

    /// First live instance bound to `id`.
    pub fn instance_mut(&mut self, id: NoteId) -> Option<&mut NoteInstanceController<F::Surface>> {
        self.instances
            .iter_mut()
            .find(|instance| instance.note_id() == Some(id))
    }

    /// One dispatch step: relay external changes, pump every instance, collect
    /// exited editors, drop torn-down ones. Returns the number of events handled.
    pub fn step(&mut self) -> StoreResult<usize> {
        let relayed = self.ctx.poll_external_changes()?;
        let handled: usize = self
            .instances
            .iter_mut()
            .map(NoteInstanceController::pump_events)
            .sum();

        let reaped: usize = self
            .instances
            .iter()
            .map(NoteInstanceController::reap_editors)
            .sum();

        let before = self.instances.len();
        self.instances.retain(|instance| !instance.is_torn_down());
        let dropped = before - self.instances.len();
        if handled > 0 || dropped > 0 || reaped > 0 {
            debug!(
                "event=host_step module=service status=ok relayed={} handled={handled} dropped={dropped} reaped={reaped}",
                relayed.len()
            );
        }
        Ok(handled)
    }
}
