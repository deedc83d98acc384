//! Trace subjects: read-only views over a scenario's trace slice that turn
//! expectations into located [`AssertionFailure`]s.

use std::cell::OnceCell;

use flicker_types::{
    ComponentMatcher, Display, LayersTrace, LayersTraceEntry, Rect, Region, Timestamp, WmDisplay,
    WmTrace, WmTraceEntry,
};

use crate::lifecycle::{LayersTraceLifecycle, WindowsTraceLifecycle};
use crate::reader::TraceReader;
use crate::result::AssertionFailure;

type Check = Result<(), AssertionFailure>;

/// Subject over the layers trace of one scenario.
#[derive(Debug, Clone, Copy)]
pub struct LayersTraceSubject<'a> {
    trace: &'a LayersTrace,
}

impl<'a> LayersTraceSubject<'a> {
    pub const fn new(trace: &'a LayersTrace) -> Self {
        Self { trace }
    }

    pub fn len(&self) -> usize {
        self.trace.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<LayerTraceEntrySubject<'a>> {
        self.trace
            .entries()
            .get(index)
            .map(|entry| LayerTraceEntrySubject { entry, index })
    }

    pub fn first(&self) -> Result<LayerTraceEntrySubject<'a>, AssertionFailure> {
        self.entry(0)
            .ok_or_else(|| AssertionFailure::new("Layers trace is empty"))
    }

    pub fn last(&self) -> Result<LayerTraceEntrySubject<'a>, AssertionFailure> {
        self.len()
            .checked_sub(1)
            .and_then(|i| self.entry(i))
            .ok_or_else(|| AssertionFailure::new("Layers trace is empty"))
    }

    pub fn entries(self) -> impl Iterator<Item = LayerTraceEntrySubject<'a>> + 'a {
        self.trace
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| LayerTraceEntrySubject { entry, index })
    }
}

/// Subject over one layers trace entry.
#[derive(Debug, Clone, Copy)]
pub struct LayerTraceEntrySubject<'a> {
    pub entry: &'a LayersTraceEntry,
    pub index: usize,
}

impl<'a> LayerTraceEntrySubject<'a> {
    pub fn fail(&self, message: impl Into<String>) -> AssertionFailure {
        AssertionFailure::at(self.entry.timestamp, self.index, message)
    }

    pub fn timestamp(&self) -> Timestamp {
        self.entry.timestamp
    }

    pub fn displays(&self) -> &'a [Display] {
        &self.entry.displays
    }

    /// Visible region of `component`, or of every visible layer when
    /// `component` is `None`.
    pub fn visible_region(&self, component: Option<&ComponentMatcher>) -> RegionSubject {
        let entry = self.entry;
        let mut region = Region::new();
        for layer in entry
            .visible_layers()
            .filter(|l| component.is_none_or(|c| c.matches_layer(entry, l)))
        {
            region.union(&layer.visible_region);
        }
        RegionSubject {
            region,
            description: component.map_or_else(
                || "Visible layers".to_owned(),
                |c| format!("Visible region of {c}"),
            ),
            timestamp: entry.timestamp,
            index: self.index,
        }
    }

    pub fn is_visible(&self, component: &ComponentMatcher) -> Check {
        let entry = self.entry;
        if entry
            .visible_layers()
            .any(|l| component.matches_layer(entry, l))
        {
            Ok(())
        } else {
            Err(self.fail(format!("{component} is not visible")))
        }
    }

    pub fn is_invisible(&self, component: &ComponentMatcher) -> Check {
        let entry = self.entry;
        match entry
            .visible_layers()
            .find(|l| component.matches_layer(entry, l))
        {
            None => Ok(()),
            Some(layer) => Err(self.fail(format!(
                "{component} is visible (layer {} {})",
                layer.id, layer.name
            ))),
        }
    }
}

/// A region under test, carrying where it was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSubject {
    pub region: Region,
    description: String,
    timestamp: Timestamp,
    index: usize,
}

impl RegionSubject {
    /// Every pixel of `target` lies inside the region.
    pub fn covers_at_least(&self, target: &Rect) -> Check {
        if self.region.covers(target) {
            return Ok(());
        }
        Err(AssertionFailure::at(
            self.timestamp,
            self.index,
            format!(
                "{} does not cover at least {target}; uncovered: {}",
                self.description,
                self.region.uncovered(target)
            ),
        ))
    }
}

/// Subject over the window manager trace of one scenario.
#[derive(Debug, Clone, Copy)]
pub struct WmTraceSubject<'a> {
    trace: &'a WmTrace,
}

impl<'a> WmTraceSubject<'a> {
    pub const fn new(trace: &'a WmTrace) -> Self {
        Self { trace }
    }

    pub fn len(&self) -> usize {
        self.trace.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.entries().is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<WmEntrySubject<'a>> {
        self.trace
            .entries()
            .get(index)
            .map(|entry| WmEntrySubject { entry, index })
    }

    pub fn first(&self) -> Result<WmEntrySubject<'a>, AssertionFailure> {
        self.entry(0)
            .ok_or_else(|| AssertionFailure::new("Window manager trace is empty"))
    }

    pub fn last(&self) -> Result<WmEntrySubject<'a>, AssertionFailure> {
        self.len()
            .checked_sub(1)
            .and_then(|i| self.entry(i))
            .ok_or_else(|| AssertionFailure::new("Window manager trace is empty"))
    }

    pub fn entries(self) -> impl Iterator<Item = WmEntrySubject<'a>> + 'a {
        self.trace
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| WmEntrySubject { entry, index })
    }
}

/// Subject over one window manager trace entry.
#[derive(Debug, Clone, Copy)]
pub struct WmEntrySubject<'a> {
    pub entry: &'a WmTraceEntry,
    pub index: usize,
}

impl WmEntrySubject<'_> {
    pub fn fail(&self, message: impl Into<String>) -> AssertionFailure {
        AssertionFailure::at(self.entry.timestamp, self.index, message)
    }

    pub fn displays(&self) -> &[WmDisplay] {
        &self.entry.displays
    }

    pub fn is_visible(&self, component: &ComponentMatcher) -> Check {
        if self
            .entry
            .visible_windows()
            .any(|w| component.matches_window(w))
        {
            Ok(())
        } else {
            Err(self.fail(format!("{component} window is not visible")))
        }
    }

    pub fn is_invisible(&self, component: &ComponentMatcher) -> Check {
        match self
            .entry
            .visible_windows()
            .find(|w| component.matches_window(w))
        {
            None => Ok(()),
            Some(window) => Err(self.fail(format!(
                "{component} window is visible ({} {})",
                window.id, window.name
            ))),
        }
    }

    /// The top-most visible app window belongs to `component`.
    pub fn is_app_window_on_top(&self, component: &ComponentMatcher) -> Check {
        match self.entry.top_visible_app_window() {
            Some(top) if component.matches_window(top) => Ok(()),
            Some(top) => Err(self.fail(format!(
                "{component} is not on top; top app window is {}",
                top.name
            ))),
            None => Err(self.fail(format!("{component} is not on top; no visible app window"))),
        }
    }

    pub fn is_app_window_not_on_top(&self, component: &ComponentMatcher) -> Check {
        match self.entry.top_visible_app_window() {
            Some(top) if component.matches_window(top) => {
                Err(self.fail(format!("{component} is on top ({})", top.name)))
            }
            _ => Ok(()),
        }
    }

    /// On top and holding focus.
    pub fn is_top_window(&self, component: &ComponentMatcher) -> Check {
        self.is_app_window_on_top(component)?;
        let focused = self.entry.focused_app.as_deref();
        let top_name = self
            .entry
            .top_visible_app_window()
            .map(|w| w.name.as_str());
        if focused.is_some() && focused == top_name {
            Ok(())
        } else {
            Err(self.fail(format!(
                "{component} is on top but not focused; focused app is {}",
                focused.unwrap_or("none")
            )))
        }
    }

    /// Union of the frames of the visible windows of `component`.
    pub fn visible_region(&self, component: &ComponentMatcher) -> RegionSubject {
        RegionSubject {
            region: Region::from_rects(
                self.entry
                    .visible_windows()
                    .filter(|w| component.matches_window(w))
                    .map(|w| w.frame),
            ),
            description: format!("Window frames of {component}"),
            timestamp: self.entry.timestamp,
            index: self.index,
        }
    }
}

/// All subjects of one scenario, with lifecycle trackers built on first use.
#[derive(Debug)]
pub struct TraceSubjects<'a> {
    layers: Option<&'a LayersTrace>,
    wm: Option<&'a WmTrace>,
    layers_lifecycle: OnceCell<LayersTraceLifecycle>,
    windows_lifecycle: OnceCell<WindowsTraceLifecycle>,
}

impl<'a> TraceSubjects<'a> {
    pub fn from_reader(reader: &'a dyn TraceReader) -> Self {
        Self {
            layers: reader.read_layers_trace(),
            wm: reader.read_wm_trace(),
            layers_lifecycle: OnceCell::new(),
            windows_lifecycle: OnceCell::new(),
        }
    }

    pub fn layers(&self) -> Result<LayersTraceSubject<'a>, AssertionFailure> {
        self.layers
            .map(LayersTraceSubject::new)
            .ok_or_else(|| AssertionFailure::new("Missing layers trace"))
    }

    pub fn wm(&self) -> Result<WmTraceSubject<'a>, AssertionFailure> {
        self.wm
            .map(WmTraceSubject::new)
            .ok_or_else(|| AssertionFailure::new("Missing window manager trace"))
    }

    pub fn layers_lifecycle(&self) -> Result<&LayersTraceLifecycle, AssertionFailure> {
        let trace = self
            .layers
            .ok_or_else(|| AssertionFailure::new("Missing layers trace"))?;
        Ok(self
            .layers_lifecycle
            .get_or_init(|| LayersTraceLifecycle::from_layers_trace(trace)))
    }

    pub fn windows_lifecycle(&self) -> Result<&WindowsTraceLifecycle, AssertionFailure> {
        let trace = self
            .wm
            .ok_or_else(|| AssertionFailure::new("Missing window manager trace"))?;
        Ok(self
            .windows_lifecycle
            .get_or_init(|| WindowsTraceLifecycle::from_wm_trace(trace)))
    }
}
