// logdyn-viewer - app/renderer.rs
//
// Renderer: owns every registered display surface and fans each record out
// to all of them. Each surface may carry a host mount (a DOM element in the
// browser) that is synchronised after every change.
//
// A failure on one surface is logged and never stops delivery to the others.

use crate::core::model::LogRecord;
use crate::core::surface::DisplaySurface;
use crate::util::constants::MAX_SURFACES;
use crate::util::error::RenderError;
use std::cell::RefCell;
use std::rc::Rc;

// =============================================================================
// Seams
// =============================================================================

/// Anything that accepts normalised records for display.
///
/// The transport holds its renderer through this trait so that it can run
/// with no renderer at all.
pub trait RecordSink {
    /// Display `record`. Returns the number of surfaces that accepted it.
    fn append(&mut self, record: &LogRecord) -> Result<usize, RenderError>;
}

/// Shared renderer handle: the browser host keeps one reference for page
/// calls and hands another to the transport.
impl<T: RecordSink> RecordSink for Rc<RefCell<T>> {
    fn append(&mut self, record: &LogRecord) -> Result<usize, RenderError> {
        let mut inner = self.try_borrow_mut().map_err(|_| RenderError::Busy)?;
        inner.append(record)
    }
}

/// Host-side view of a surface.
pub trait SurfaceMount {
    /// Bring the view in line with the surface model.
    fn sync(&mut self, surface: &DisplaySurface) -> Result<(), RenderError>;

    /// A fragment was appended at `index`. Defaults to a full sync.
    fn appended(&mut self, surface: &DisplaySurface, index: usize) -> Result<(), RenderError> {
        let _ = index;
        self.sync(surface)
    }

    /// Scroll the view to the newest fragment.
    fn scroll_to_latest(&mut self, surface: &DisplaySurface) -> Result<(), RenderError>;
}

// =============================================================================
// Renderer
// =============================================================================

struct SurfaceSlot {
    surface: DisplaySurface,
    mount: Option<Box<dyn SurfaceMount>>,
}

impl SurfaceSlot {
    /// Run `update` against the mount, detaching the surface if the view is
    /// gone.
    fn with_mount<F>(&mut self, update: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut dyn SurfaceMount, &DisplaySurface) -> Result<(), RenderError>,
    {
        let Some(mount) = self.mount.as_mut() else {
            return Ok(());
        };
        match update(&mut **mount, &self.surface) {
            Err(RenderError::SurfaceDetached { name }) => {
                self.surface.detach();
                Err(RenderError::SurfaceDetached { name })
            }
            other => other,
        }
    }

    fn sync(&mut self) -> Result<(), RenderError> {
        self.with_mount(|mount, surface| mount.sync(surface))
    }
}

/// Manages the set of display surfaces.
#[derive(Default)]
pub struct Renderer {
    slots: Vec<SurfaceSlot>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a renderer with one unmounted surface per name.
    pub fn with_surfaces<I, S>(names: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut renderer = Self::new();
        for name in names {
            renderer.add_surface(name)?;
        }
        Ok(renderer)
    }

    /// Register a surface with no host view.
    pub fn add_surface(&mut self, name: impl Into<String>) -> Result<(), RenderError> {
        self.register(DisplaySurface::new(name), None)
    }

    /// Register a surface backed by a host view.
    pub fn add_mounted_surface(
        &mut self,
        name: impl Into<String>,
        mount: Box<dyn SurfaceMount>,
    ) -> Result<(), RenderError> {
        self.register(DisplaySurface::new(name), Some(mount))
    }

    fn register(
        &mut self,
        surface: DisplaySurface,
        mount: Option<Box<dyn SurfaceMount>>,
    ) -> Result<(), RenderError> {
        if self.slot(surface.name()).is_some() {
            return Err(RenderError::DuplicateSurface {
                name: surface.name().to_string(),
            });
        }
        if self.slots.len() >= MAX_SURFACES {
            return Err(RenderError::TooManySurfaces { max: MAX_SURFACES });
        }
        tracing::debug!(surface = %surface.name(), mounted = mount.is_some(), "Surface registered");
        let mut slot = SurfaceSlot { surface, mount };
        slot.sync()?;
        self.slots.push(slot);
        Ok(())
    }

    /// Look up a surface by name.
    pub fn surface(&self, name: &str) -> Option<&DisplaySurface> {
        self.slot(name).map(|slot| &slot.surface)
    }

    /// Every surface in registration order.
    pub fn surfaces(&self) -> impl Iterator<Item = &DisplaySurface> {
        self.slots.iter().map(|slot| &slot.surface)
    }

    pub fn surface_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, name: &str) -> Option<&SurfaceSlot> {
        self.slots.iter().find(|slot| slot.surface.name() == name)
    }

    /// Apply `change` to one surface and sync its view.
    fn update<F>(&mut self, name: &str, change: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut DisplaySurface),
    {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.surface.name() == name)
            .ok_or_else(|| RenderError::UnknownSurface {
                name: name.to_string(),
            })?;
        change(&mut slot.surface);
        slot.sync()
    }

    /// Hide (`hidden = true`) or show every fragment of `level` on one
    /// surface.
    pub fn toggle_level_visible(
        &mut self,
        surface: &str,
        level: &str,
        hidden: bool,
    ) -> Result<(), RenderError> {
        tracing::debug!(surface, level, hidden, "Toggling level visibility");
        self.update(surface, |s| s.toggle_level_visible(level, hidden))
    }

    /// Re-filter one surface. An empty pattern removes the filter.
    pub fn filter(&mut self, surface: &str, pattern: &str) -> Result<(), RenderError> {
        self.update(surface, |s| s.filter(pattern))?;
        if let Some(s) = self.surface(surface) {
            tracing::debug!(
                surface,
                pattern,
                shown = s.displayed().count(),
                total = s.len(),
                "Filter applied"
            );
        }
        Ok(())
    }

    /// Remove every fragment from one surface.
    pub fn clear(&mut self, surface: &str) -> Result<(), RenderError> {
        tracing::debug!(surface, "Clearing surface");
        self.update(surface, DisplaySurface::clear)
    }

    /// Pointer entered or left a surface.
    pub fn set_hover(&mut self, surface: &str, hovered: bool) -> Result<(), RenderError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.surface.name() == surface)
            .ok_or_else(|| RenderError::UnknownSurface {
                name: surface.to_string(),
            })?;
        slot.surface.set_hovered(hovered);
        Ok(())
    }

    /// Mark a surface as removed from its view.
    pub fn detach(&mut self, surface: &str) -> Result<(), RenderError> {
        tracing::info!(surface, "Detaching surface");
        self.update(surface, DisplaySurface::detach)
    }
}

impl RecordSink for Renderer {
    /// Append to every surface. Succeeds when at least one surface took the
    /// record (or none are registered); otherwise returns the first failure.
    fn append(&mut self, record: &LogRecord) -> Result<usize, RenderError> {
        let mut accepted = 0;
        let mut first_error = None;

        for slot in &mut self.slots {
            match append_to_slot(slot, record) {
                Ok(()) => accepted += 1,
                Err(e) => {
                    tracing::warn!(surface = %slot.surface.name(), error = %e, "Record not rendered");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if accepted == 0 => Err(e),
            _ => Ok(accepted),
        }
    }
}

fn append_to_slot(slot: &mut SurfaceSlot, record: &LogRecord) -> Result<(), RenderError> {
    let outcome = slot.surface.append(record)?;
    slot.with_mount(|mount, surface| {
        mount.appended(surface, outcome.index)?;
        if outcome.auto_scrolled {
            mount.scroll_to_latest(surface)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(level: &str, message: &str) -> LogRecord {
        LogRecord {
            level: level.to_string(),
            message: message.to_string(),
            timestamp: 1_500_000_000_000,
            session_id: None,
        }
    }

    /// Mount that counts calls and can be told its view is gone.
    struct CountingMount {
        name: String,
        syncs: Rc<RefCell<usize>>,
        scrolls: Rc<RefCell<usize>>,
        gone: Rc<RefCell<bool>>,
    }

    impl SurfaceMount for CountingMount {
        fn sync(&mut self, _surface: &DisplaySurface) -> Result<(), RenderError> {
            if *self.gone.borrow() {
                return Err(RenderError::SurfaceDetached {
                    name: self.name.clone(),
                });
            }
            *self.syncs.borrow_mut() += 1;
            Ok(())
        }

        fn scroll_to_latest(&mut self, _surface: &DisplaySurface) -> Result<(), RenderError> {
            *self.scrolls.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_append_reaches_every_surface() {
        let mut renderer = Renderer::with_surfaces(["a", "b"]).unwrap();
        assert_eq!(renderer.append(&make_record("INFO", "x")).unwrap(), 2);
        assert!(renderer.surfaces().all(|s| s.len() == 1));
    }

    #[test]
    fn test_duplicate_and_unknown_surfaces() {
        let mut renderer = Renderer::with_surfaces(["a"]).unwrap();
        assert_eq!(
            renderer.add_surface("a"),
            Err(RenderError::DuplicateSurface {
                name: "a".to_string()
            })
        );
        assert_eq!(
            renderer.clear("nope"),
            Err(RenderError::UnknownSurface {
                name: "nope".to_string()
            })
        );
    }

    #[test]
    fn test_surface_limit() {
        let names: Vec<String> = (0..MAX_SURFACES).map(|i| format!("s{i}")).collect();
        let mut renderer = Renderer::with_surfaces(names).unwrap();
        assert_eq!(
            renderer.add_surface("extra"),
            Err(RenderError::TooManySurfaces { max: MAX_SURFACES })
        );
    }

    #[test]
    fn test_detached_surface_does_not_block_others() {
        let mut renderer = Renderer::with_surfaces(["gone", "live"]).unwrap();
        renderer.detach("gone").unwrap();
        assert_eq!(renderer.append(&make_record("INFO", "x")).unwrap(), 1);
        assert_eq!(renderer.surface("live").unwrap().len(), 1);
        assert!(renderer.surface("gone").unwrap().is_empty());
    }

    #[test]
    fn test_all_surfaces_failing_returns_first_error() {
        let mut renderer = Renderer::with_surfaces(["only"]).unwrap();
        renderer.detach("only").unwrap();
        let err = renderer.append(&make_record("INFO", "x")).unwrap_err();
        assert_eq!(
            err,
            RenderError::SurfaceDetached {
                name: "only".to_string()
            }
        );
    }

    #[test]
    fn test_mount_synced_and_scrolled_unless_hovered() {
        let syncs = Rc::new(RefCell::new(0));
        let scrolls = Rc::new(RefCell::new(0));
        let mount = CountingMount {
            name: "m".to_string(),
            syncs: Rc::clone(&syncs),
            scrolls: Rc::clone(&scrolls),
            gone: Rc::new(RefCell::new(false)),
        };
        let mut renderer = Renderer::new();
        renderer.add_mounted_surface("m", Box::new(mount)).unwrap();
        assert_eq!(*syncs.borrow(), 1);

        renderer.append(&make_record("INFO", "a")).unwrap();
        renderer.set_hover("m", true).unwrap();
        renderer.append(&make_record("INFO", "b")).unwrap();

        assert_eq!(*syncs.borrow(), 3);
        assert_eq!(*scrolls.borrow(), 1);
    }

    #[test]
    fn test_vanished_mount_detaches_surface() {
        let gone = Rc::new(RefCell::new(false));
        let mount = CountingMount {
            name: "m".to_string(),
            syncs: Rc::new(RefCell::new(0)),
            scrolls: Rc::new(RefCell::new(0)),
            gone: Rc::clone(&gone),
        };
        let mut renderer = Renderer::new();
        renderer.add_mounted_surface("m", Box::new(mount)).unwrap();
        renderer.add_surface("plain").unwrap();

        *gone.borrow_mut() = true;
        assert_eq!(renderer.append(&make_record("INFO", "a")).unwrap(), 1);
        assert!(renderer.surface("m").unwrap().is_detached());
    }

    #[test]
    fn test_shared_handle_reports_busy() {
        let shared = Rc::new(RefCell::new(Renderer::with_surfaces(["a"]).unwrap()));
        let mut handle = Rc::clone(&shared);
        let _guard = shared.borrow();
        assert_eq!(
            handle.append(&make_record("INFO", "x")),
            Err(RenderError::Busy)
        );
    }

    #[test]
    fn test_surface_operations_route_by_name() {
        let mut renderer = Renderer::with_surfaces(["a", "b"]).unwrap();
        renderer.append(&make_record("WARN", "disk")).unwrap();
        renderer.filter("a", "nomatch").unwrap();
        renderer.toggle_level_visible("b", "warn", true).unwrap();

        assert_eq!(renderer.surface("a").unwrap().active_pattern(), Some("nomatch"));
        assert!(renderer.surface("b").unwrap().active_pattern().is_none());
        assert!(renderer.surface("b").unwrap().is_level_hidden("WARN"));
        assert!(!renderer.surface("a").unwrap().is_level_hidden("WARN"));

        renderer.clear("a").unwrap();
        assert!(renderer.surface("a").unwrap().is_empty());
        assert_eq!(renderer.surface("b").unwrap().len(), 1);
    }
}
