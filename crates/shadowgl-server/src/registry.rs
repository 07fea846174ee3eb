//! Process-wide context registry and the lifecycle state machine.
//!
//! Records live in an arena of generation-checked slots. While a record is current on a worker,
//! its [`ShadowState`] is checked out into that worker's [`Current`]; the registry keeps only the
//! identity, the `active` flag and the pending-destruction flags. A record is therefore never
//! reaped while a worker is using it: reaping an active record is deferred by setting a destroy
//! flag, and settled the moment the worker lets go.

use bitflags::bitflags;
use tracing::{debug, warn};

use shadowgl_types::{Context, Display, Surface};

use crate::error::RegistryError;
use crate::shadow::ShadowState;
use crate::sync::{lock, Mutex};

bitflags! {
    /// Pending destruction recorded against a record while it was active.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct DestroyFlags: u8 {
        const DISPLAY = 1 << 0;
        const CONTEXT = 1 << 1;
        const DRAW = 1 << 2;
        const READ = 1 << 3;
    }
}

impl DestroyFlags {
    /// Flags that remove the whole record once it is inactive. Surface flags only clear the
    /// surface field: the context outlives its surfaces.
    const REAPING: Self = Self::DISPLAY.union(Self::CONTEXT);
}

/// Generation-checked index of a registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle {
    index: u32,
    generation: u32,
}

impl ContextHandle {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Point-in-time copy of one record, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub handle: ContextHandle,
    pub display: Display,
    pub context: Context,
    pub draw: Surface,
    pub read: Surface,
    pub active: bool,
    pub destroy: DestroyFlags,
}

/// A worker's current context: the record's identity plus its checked-out shadow state.
///
/// Owned by exactly one worker; hand it back with [`ContextRegistry::make_current`] or
/// [`ContextRegistry::release`].
#[derive(Debug)]
pub struct Current {
    handle: ContextHandle,
    pub display: Display,
    pub context: Context,
    pub draw: Surface,
    pub read: Surface,
    shadow: Box<ShadowState>,
}

impl Current {
    pub fn handle(&self) -> ContextHandle {
        self.handle
    }

    pub fn shadow(&self) -> &ShadowState {
        &self.shadow
    }

    pub fn shadow_mut(&mut self) -> &mut ShadowState {
        &mut self.shadow
    }

    pub fn matches(&self, display: Display, draw: Surface, read: Surface, context: Context) -> bool {
        self.display == display && self.draw == draw && self.read == read && self.context == context
    }
}

#[derive(Debug)]
struct ContextRecord {
    display: Display,
    context: Context,
    drawable: Surface,
    readable: Surface,
    active: bool,
    destroy: DestroyFlags,
    /// `None` while checked out by the worker the record is current on.
    shadow: Option<Box<ShadowState>>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    record: Option<ContextRecord>,
}

#[derive(Debug, Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    count: usize,
    initialized: bool,
}

impl Arena {
    fn record_mut(&mut self, handle: ContextHandle) -> Result<&mut ContextRecord, RegistryError> {
        let stale = RegistryError::StaleHandle {
            index: handle.index,
            generation: handle.generation,
        };
        let slot = self.slots.get_mut(handle.index as usize).ok_or(stale)?;
        if slot.generation != handle.generation {
            return Err(stale);
        }
        slot.record.as_mut().ok_or(stale)
    }

    fn handles(&self) -> Vec<ContextHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.record.is_some())
            .map(|(index, slot)| ContextHandle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    fn find(&self, mut pred: impl FnMut(&ContextRecord) -> bool) -> Option<ContextHandle> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            let record = slot.record.as_ref()?;
            pred(record).then_some(ContextHandle {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    fn insert(&mut self, record: ContextRecord) -> ContextHandle {
        self.count += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            return ContextHandle {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        ContextHandle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn reap(&mut self, handle: ContextHandle) {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return;
        };
        if slot.generation != handle.generation {
            return;
        }
        if let Some(record) = slot.record.take() {
            debug!(
                display = record.display.raw(),
                context = record.context.raw(),
                destroy = ?record.destroy,
                "reaping context record"
            );
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(handle.index);
            self.count -= 1;
        }
    }

    /// Applies pending destruction to an inactive record.
    fn settle(&mut self, handle: ContextHandle) {
        let Ok(record) = self.record_mut(handle) else {
            return;
        };
        if record.active {
            return;
        }
        if record.destroy.intersects(DestroyFlags::REAPING) {
            self.reap(handle);
            return;
        }
        if record.destroy.contains(DestroyFlags::READ) {
            record.readable = Surface::NONE;
        }
        if record.destroy.contains(DestroyFlags::DRAW) {
            record.drawable = Surface::NONE;
        }
        record.destroy.remove(DestroyFlags::READ | DestroyFlags::DRAW);
    }

    /// Returns the checked-out shadow to its record, marks it inactive and settles it.
    fn deactivate(&mut self, current: Current) {
        let Current { handle, shadow, .. } = current;
        match self.record_mut(handle) {
            Ok(record) => {
                record.active = false;
                record.shadow = Some(shadow);
            }
            Err(err) => {
                warn!(error = %err, "current context vanished from the registry");
                return;
            }
        }
        self.settle(handle);
    }

    /// Exact match on all four handles, inactive and not pending a display teardown.
    fn match_existing(
        &self,
        display: Display,
        draw: Surface,
        read: Surface,
        context: Context,
    ) -> Option<ContextHandle> {
        self.find(|r| {
            r.display == display
                && r.context == context
                && r.drawable == draw
                && r.readable == read
                && !r.active
                && !r.destroy.contains(DestroyFlags::DISPLAY)
        })
    }

    fn find_or_create(
        &mut self,
        display: Display,
        draw: Surface,
        read: Surface,
        context: Context,
    ) -> Result<Current, RegistryError> {
        let handle = match self.find(|r| r.display == display && r.context == context) {
            Some(handle) => handle,
            None => {
                let dpy = display.raw();
                debug!(display = dpy, context = context.raw(), "creating context record");
                self.insert(ContextRecord {
                    display,
                    context,
                    drawable: draw,
                    readable: read,
                    active: false,
                    destroy: DestroyFlags::empty(),
                    shadow: Some(ShadowState::new()),
                })
            }
        };
        self.activate(handle, draw, read)
    }

    fn activate(&mut self, handle: ContextHandle, draw: Surface, read: Surface) -> Result<Current, RegistryError> {
        let record = self.record_mut(handle)?;
        let busy = RegistryError::ContextBusy {
            display: record.display.raw(),
            context: record.context.raw(),
        };
        if record.active {
            return Err(busy);
        }
        let shadow = record.shadow.take().ok_or(busy)?;
        record.active = true;
        record.drawable = draw;
        record.readable = read;
        Ok(Current {
            handle,
            display: record.display,
            context: record.context,
            draw,
            read,
            shadow,
        })
    }

    fn snapshot(&self, handle: ContextHandle) -> Option<ContextSnapshot> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let r = slot.record.as_ref()?;
        Some(ContextSnapshot {
            handle,
            display: r.display,
            context: r.context,
            draw: r.drawable,
            read: r.readable,
            active: r.active,
            destroy: r.destroy,
        })
    }
}

/// The set of live context records shared by every worker.
///
/// All topology changes happen under one mutex. None of the operations call into the driver:
/// callers make the driver call first and only report successful transitions here.
pub struct ContextRegistry {
    inner: Mutex<Arena>,
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Arena::default()),
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        lock(&self.inner).count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.inner).initialized
    }

    pub fn snapshot(&self, handle: ContextHandle) -> Option<ContextSnapshot> {
        lock(&self.inner).snapshot(handle)
    }

    /// Every live record, in slot order.
    pub fn records(&self) -> Vec<ContextSnapshot> {
        let arena = lock(&self.inner);
        arena
            .handles()
            .into_iter()
            .filter_map(|h| arena.snapshot(h))
            .collect()
    }

    /// Activates the record for `(display, context)`, creating it if needed, with the given
    /// surfaces. Fails if another worker has that record current.
    pub fn find_or_create(
        &self,
        display: Display,
        draw: Surface,
        read: Surface,
        context: Context,
    ) -> Result<Current, RegistryError> {
        lock(&self.inner).find_or_create(display, draw, read, context)
    }

    /// Handle of an inactive record matching all four handles exactly, if one exists and its
    /// display isn't pending termination.
    pub fn match_existing(
        &self,
        display: Display,
        draw: Surface,
        read: Surface,
        context: Context,
    ) -> Option<ContextHandle> {
        lock(&self.inner).match_existing(display, draw, read, context)
    }

    /// Records a successful driver make-current on the calling worker.
    ///
    /// The worker's previous record (if any) is deactivated and settled first. A `NONE` display or
    /// context leaves the worker with no current record. On error `current` is left untouched.
    pub fn make_current(
        &self,
        display: Display,
        draw: Surface,
        read: Surface,
        context: Context,
        current: &mut Option<Current>,
    ) -> Result<(), RegistryError> {
        let mut arena = lock(&self.inner);
        let switching_to_none = display.is_none() || context.is_none();

        if !switching_to_none {
            let own = current.as_ref().map(Current::handle);
            let busy = arena.find(|r| r.display == display && r.context == context && r.active);
            if let Some(busy) = busy.filter(|h| Some(*h) != own) {
                let err = RegistryError::ContextBusy {
                    display: display.raw(),
                    context: context.raw(),
                };
                warn!(error = %err, slot = busy.index, "refusing make-current");
                return Err(err);
            }
        }

        if let Some(previous) = current.take() {
            arena.deactivate(previous);
        }
        if switching_to_none {
            return Ok(());
        }

        let next = match arena.match_existing(display, draw, read, context) {
            Some(handle) => arena.activate(handle, draw, read)?,
            None => arena.find_or_create(display, draw, read, context)?,
        };
        *current = Some(next);
        Ok(())
    }

    /// Deactivates `current` and settles any destruction that was deferred while it was active.
    pub fn release(&self, current: Current) {
        lock(&self.inner).deactivate(current);
    }

    /// Marks the registry initialized and cancels pending terminate-driven reaps for `display`.
    pub fn initialize(&self, display: Display) {
        let mut arena = lock(&self.inner);
        arena.initialized = true;
        for slot in &mut arena.slots {
            if let Some(record) = slot.record.as_mut().filter(|r| r.display == display) {
                record.destroy.remove(DestroyFlags::DISPLAY);
            }
        }
    }

    /// Reaps every inactive record on `display` and flags the caller's own record, if it is on
    /// `display`, for reaping on release. Records current on other workers are left alone.
    /// Returns how many records were reaped immediately.
    pub fn terminate(&self, display: Display, caller: Option<&Current>) -> usize {
        let own = caller.map(Current::handle);
        self.mark(|handle, r| {
            (r.display == display && (!r.active || own == Some(handle))).then_some(DestroyFlags::DISPLAY)
        })
    }

    /// Reaps the inactive record for `(display, context)`, or flags it if it's active.
    pub fn destroy_context(&self, display: Display, context: Context) -> usize {
        self.mark(|_, r| (r.display == display && r.context == context).then_some(DestroyFlags::CONTEXT))
    }

    /// Flags records using `surface` as draw and/or read surface. Inactive records drop the
    /// surface immediately; the record itself survives.
    pub fn destroy_surface(&self, display: Display, surface: Surface) {
        self.mark(|_, r| {
            if r.display != display {
                return None;
            }
            let mut flags = DestroyFlags::empty();
            flags.set(DestroyFlags::DRAW, r.drawable == surface);
            flags.set(DestroyFlags::READ, r.readable == surface);
            (!flags.is_empty()).then_some(flags)
        });
    }

    /// Drops every record, active or not.
    pub fn teardown(&self) -> usize {
        let mut arena = lock(&self.inner);
        let reaped = arena.count;
        for handle in arena.handles() {
            arena.reap(handle);
        }
        arena.initialized = false;
        reaped
    }

    fn mark(&self, mut flags_for: impl FnMut(ContextHandle, &ContextRecord) -> Option<DestroyFlags>) -> usize {
        let mut arena = lock(&self.inner);
        let before = arena.count;
        for handle in arena.handles() {
            let Ok(record) = arena.record_mut(handle) else {
                continue;
            };
            if let Some(flags) = flags_for(handle, record) {
                record.destroy.insert(flags);
                arena.settle(handle);
            }
        }
        before - arena.count
    }
}


#[cfg(all(test, feature = "loom"))]
mod loom_tests {
    use super::*;
    use loom::sync::Arc;
    use loom::thread;

    #[test]
    fn at_most_one_worker_holds_a_context() {
        loom::model(|| {
            let registry = Arc::new(ContextRegistry::new());
            let workers: Vec<_> = (0..2)
                .map(|i| {
                    let registry = registry.clone();
                    thread::spawn(move || {
                        let mut current = None;
                        let surface = Surface(10 + i);
                        let won = registry
                            .make_current(Display(1), surface, surface, Context(100), &mut current)
                            .is_ok();
                        if let Some(current) = current {
                            let active = registry
                                .records()
                                .iter()
                                .filter(|r| r.context == Context(100) && r.active)
                                .count();
                            assert_eq!(active, 1);
                            registry.release(current);
                        }
                        won
                    })
                })
                .collect();
            let wins = workers
                .into_iter()
                .map(|w| w.join().expect("worker panicked"))
                .filter(|won| *won)
                .count();
            assert!(wins >= 1);
            assert_eq!(registry.len(), 1);
        });
    }
}
