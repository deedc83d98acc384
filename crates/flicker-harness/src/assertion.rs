//! Assertions: named predicates over a scenario instance.
//!
//! The catalogue is a closed set. Single-entry checks are lifted to the first
//! entry, the last entry or every entry of the slice; "becomes" assertions
//! check a from/to state switch; consecutive-entry assertions reason over
//! element lifecycles.

use flicker_types::{ComponentMatcher, Timestamp};
use tracing::debug;

use crate::component::ComponentTemplate;
use crate::result::{AssertionFailure, AssertionResult};
use crate::scenario::ScenarioInstance;
use crate::subject::{LayerTraceEntrySubject, TraceSubjects, WmEntrySubject};

type Outcome = Result<(), AssertionFailure>;

/// A predicate on one trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    /// Visible layers cover the layer stack space of every display.
    EntireScreenCovered,
    LayerIsVisible(ComponentTemplate),
    LayerIsInvisible(ComponentTemplate),
    WindowIsVisible(ComponentTemplate),
    WindowIsInvisible(ComponentTemplate),
    /// Top-most visible app window, and focused.
    WindowIsTopWindow(ComponentTemplate),
    /// Top-most visible app window.
    WindowOnTop(ComponentTemplate),
    WindowNotOnTop(ComponentTemplate),
    LayerCoversFullScreen(ComponentTemplate),
    WindowCoversFullScreen(ComponentTemplate),
}

/// Which trace an assertion reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Layers,
    Windows,
}

impl Check {
    pub const fn component(self) -> Option<ComponentTemplate> {
        match self {
            Self::EntireScreenCovered => None,
            Self::LayerIsVisible(c)
            | Self::LayerIsInvisible(c)
            | Self::WindowIsVisible(c)
            | Self::WindowIsInvisible(c)
            | Self::WindowIsTopWindow(c)
            | Self::WindowOnTop(c)
            | Self::WindowNotOnTop(c)
            | Self::LayerCoversFullScreen(c)
            | Self::WindowCoversFullScreen(c) => Some(c),
        }
    }

    pub const fn kind(self) -> ElementKind {
        match self {
            Self::EntireScreenCovered
            | Self::LayerIsVisible(_)
            | Self::LayerIsInvisible(_)
            | Self::LayerCoversFullScreen(_) => ElementKind::Layers,
            _ => ElementKind::Windows,
        }
    }

    /// Name without scope or component label.
    fn stem(self) -> String {
        let (layer_prefix, window_prefix) = match self.component() {
            Some(c) if c.is_app() => ("App", "App"),
            Some(_) => ("", "NonApp"),
            None => ("", ""),
        };
        match self {
            Self::EntireScreenCovered => "EntireScreenCovered".to_owned(),
            Self::LayerIsVisible(_) => format!("{layer_prefix}LayerIsVisible"),
            Self::LayerIsInvisible(_) => format!("{layer_prefix}LayerIsInvisible"),
            Self::LayerCoversFullScreen(_) => format!("{layer_prefix}LayerCoversFullScreen"),
            Self::WindowIsVisible(_) => format!("{window_prefix}WindowIsVisible"),
            Self::WindowIsInvisible(_) => format!("{window_prefix}WindowIsInvisible"),
            Self::WindowIsTopWindow(_) => format!("{window_prefix}WindowIsTopWindow"),
            Self::WindowOnTop(_) => format!("{window_prefix}WindowOnTop"),
            Self::WindowNotOnTop(_) => format!("{window_prefix}WindowNotOnTop"),
            Self::WindowCoversFullScreen(_) => format!("{window_prefix}WindowCoversFullScreen"),
        }
    }

    fn on_layers(self, entry: &LayerTraceEntrySubject<'_>, component: &ComponentMatcher) -> Outcome {
        match self {
            Self::EntireScreenCovered => {
                let displays = entry.displays();
                if displays.is_empty() {
                    return Err(entry.fail("No displays found"));
                }
                let visible = entry.visible_region(None);
                displays
                    .iter()
                    .try_for_each(|d| visible.covers_at_least(&d.layer_stack_space))
            }
            Self::LayerIsVisible(_) => entry.is_visible(component),
            Self::LayerIsInvisible(_) => entry.is_invisible(component),
            Self::LayerCoversFullScreen(_) => {
                let display = entry
                    .entry
                    .anchor_display()
                    .ok_or_else(|| entry.fail("No displays found"))?;
                entry
                    .visible_region(Some(component))
                    .covers_at_least(&display.layer_stack_space)
            }
            _ => Err(entry.fail(format!("{} does not apply to layers", self.stem()))),
        }
    }

    fn on_windows(self, entry: &WmEntrySubject<'_>, component: &ComponentMatcher) -> Outcome {
        match self {
            Self::WindowIsVisible(_) => entry.is_visible(component),
            Self::WindowIsInvisible(_) => entry.is_invisible(component),
            Self::WindowIsTopWindow(_) => entry.is_top_window(component),
            Self::WindowOnTop(_) => entry.is_app_window_on_top(component),
            Self::WindowNotOnTop(_) => entry.is_app_window_not_on_top(component),
            Self::WindowCoversFullScreen(_) => {
                let display = entry
                    .displays()
                    .first()
                    .ok_or_else(|| entry.fail("No displays found"))?;
                entry.visible_region(component).covers_at_least(&display.bounds)
            }
            _ => Err(entry.fail(format!("{} does not apply to windows", self.stem()))),
        }
    }

    fn resolve(self, scenario: &ScenarioInstance) -> Result<ComponentMatcher, AssertionFailure> {
        self.component()
            .map_or_else(|| Ok(ComponentMatcher::default()), |c| c.resolve(scenario))
    }
}

/// State switches checked by "becomes" assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BecomesTarget {
    LayerVisible,
    LayerInvisible,
    WindowVisible,
    WindowInvisible,
    WindowTopWindow,
}

impl BecomesTarget {
    /// The state holding before the switch and the one holding after.
    pub const fn phases(self, component: ComponentTemplate) -> (Check, Check) {
        match self {
            Self::LayerVisible => (
                Check::LayerIsInvisible(component),
                Check::LayerIsVisible(component),
            ),
            Self::LayerInvisible => (
                Check::LayerIsVisible(component),
                Check::LayerIsInvisible(component),
            ),
            Self::WindowVisible => (
                Check::WindowIsInvisible(component),
                Check::WindowIsVisible(component),
            ),
            Self::WindowInvisible => (
                Check::WindowIsVisible(component),
                Check::WindowIsInvisible(component),
            ),
            Self::WindowTopWindow => (
                Check::WindowNotOnTop(component),
                Check::WindowOnTop(component),
            ),
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::LayerVisible => "LayerBecomesVisible",
            Self::LayerInvisible => "LayerBecomesInvisible",
            Self::WindowVisible => "WindowBecomesVisible",
            Self::WindowInvisible => "WindowBecomesInvisible",
            Self::WindowTopWindow => "WindowBecomesTopWindow",
        }
    }
}

/// One named assertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Assertion {
    AtStart(Check),
    AtEnd(Check),
    Always(Check),
    Becomes {
        target: BecomesTarget,
        component: ComponentTemplate,
    },
    /// No element is visible for exactly one entry, except elements whose
    /// name contains one of `ignore`.
    ShownMoreThanOneConsecutiveEntry {
        kind: ElementKind,
        ignore: Vec<String>,
    },
}

impl Assertion {
    pub const fn becomes(target: BecomesTarget, component: ComponentTemplate) -> Self {
        Self::Becomes { target, component }
    }

    pub const fn consecutive(kind: ElementKind) -> Self {
        Self::ShownMoreThanOneConsecutiveEntry {
            kind,
            ignore: Vec::new(),
        }
    }

    /// Replace the ignore list of a consecutive-entry assertion. Other
    /// assertions are returned unchanged.
    #[must_use]
    pub fn with_consecutive_ignore(self, ignore: &[String]) -> Self {
        match self {
            Self::ShownMoreThanOneConsecutiveEntry { kind, .. } => {
                Self::ShownMoreThanOneConsecutiveEntry {
                    kind,
                    ignore: ignore.to_vec(),
                }
            }
            other => other,
        }
    }

    /// Stable name, e.g. `AppLayerBecomesVisible(OPENING_APP)`.
    pub fn name(&self) -> String {
        let (stem, component) = match self {
            Self::AtStart(check) => (format!("{}AtStart", check.stem()), check.component()),
            Self::AtEnd(check) => (format!("{}AtEnd", check.stem()), check.component()),
            Self::Always(check) => (format!("{}Always", check.stem()), check.component()),
            Self::Becomes { target, component } => {
                let prefix = match (component.is_app(), target) {
                    (true, _) => "App",
                    (false, BecomesTarget::LayerVisible | BecomesTarget::LayerInvisible) => "",
                    (false, _) => "NonApp",
                };
                (format!("{prefix}{}", target.suffix()), Some(*component))
            }
            Self::ShownMoreThanOneConsecutiveEntry { kind, .. } => {
                let elements = match kind {
                    ElementKind::Layers => "Layers",
                    ElementKind::Windows => "Windows",
                };
                (format!("Visible{elements}ShownMoreThanOneConsecutiveEntry"), None)
            }
        };
        match component {
            Some(c) => format!("{stem}({c})"),
            None => stem,
        }
    }

    /// Evaluate against one scenario. Never panics and never returns an
    /// error: every problem becomes a failed result.
    pub fn evaluate(
        &self,
        scenario: &ScenarioInstance,
        subjects: &TraceSubjects<'_>,
    ) -> AssertionResult {
        let name = self.name();
        let outcome = self.check(scenario, subjects);
        debug!(
            target: "flicker.assert",
            assertion = %name,
            scenario = %scenario.id,
            passed = outcome.is_ok(),
            "evaluated assertion"
        );
        AssertionResult::from_outcome(name, scenario.id, outcome)
    }

    fn check(&self, scenario: &ScenarioInstance, subjects: &TraceSubjects<'_>) -> Outcome {
        match self {
            Self::AtStart(check) => {
                let component = check.resolve(scenario)?;
                let entries = Entries::load(check.kind(), subjects)?;
                entries.check(0, *check, &component)
            }
            Self::AtEnd(check) => {
                let component = check.resolve(scenario)?;
                let entries = Entries::load(check.kind(), subjects)?;
                entries.check(entries.len() - 1, *check, &component)
            }
            Self::Always(check) => {
                let component = check.resolve(scenario)?;
                let entries = Entries::load(check.kind(), subjects)?;
                (0..entries.len()).try_for_each(|i| entries.check(i, *check, &component))
            }
            Self::Becomes { target, component } => {
                let (from, to) = target.phases(*component);
                let matcher = component.resolve(scenario)?;
                let entries = Entries::load(from.kind(), subjects)?;
                becomes(&entries, from, to, &matcher)
            }
            Self::ShownMoreThanOneConsecutiveEntry { kind, ignore } => {
                consecutive(*kind, ignore, subjects)
            }
        }
    }
}

/// The entries of the trace a check reads; never empty.
enum Entries<'a> {
    Layers(Vec<LayerTraceEntrySubject<'a>>),
    Windows(Vec<WmEntrySubject<'a>>),
}

impl<'a> Entries<'a> {
    fn load(kind: ElementKind, subjects: &TraceSubjects<'a>) -> Result<Self, AssertionFailure> {
        let entries = match kind {
            ElementKind::Layers => {
                let trace = subjects.layers()?;
                trace.first()?;
                Self::Layers(trace.entries().collect())
            }
            ElementKind::Windows => {
                let trace = subjects.wm()?;
                trace.first()?;
                Self::Windows(trace.entries().collect())
            }
        };
        Ok(entries)
    }

    fn len(&self) -> usize {
        match self {
            Self::Layers(e) => e.len(),
            Self::Windows(e) => e.len(),
        }
    }

    fn timestamp(&self, index: usize) -> Option<Timestamp> {
        match self {
            Self::Layers(e) => e.get(index).map(|s| s.entry.timestamp),
            Self::Windows(e) => e.get(index).map(|s| s.entry.timestamp),
        }
    }

    fn check(&self, index: usize, check: Check, component: &ComponentMatcher) -> Outcome {
        let missing = || AssertionFailure::new(format!("No trace entry at index {index}"));
        match self {
            Self::Layers(e) => check.on_layers(e.get(index).ok_or_else(missing)?, component),
            Self::Windows(e) => check.on_windows(e.get(index).ok_or_else(missing)?, component),
        }
    }
}

/// `from` holds at the first entry, then `to` holds from the first entry
/// where `from` stops holding up to the end of the slice.
fn becomes(entries: &Entries<'_>, from: Check, to: Check, component: &ComponentMatcher) -> Outcome {
    entries.check(0, from, component)?;
    let len = entries.len();
    let Some(switch) = (1..len).find(|&i| entries.check(i, from, component).is_err()) else {
        let last = len - 1;
        entries.check(last, to, component)?;
        let message = format!("{} never changed state", component.label);
        return Err(match entries.timestamp(last) {
            Some(ts) => AssertionFailure::at(ts, last, message),
            None => AssertionFailure::new(message),
        });
    };
    (switch..len).try_for_each(|i| entries.check(i, to, component))
}

fn consecutive(kind: ElementKind, ignore: &[String], subjects: &TraceSubjects<'_>) -> Outcome {
    let (flickers, noun) = match kind {
        ElementKind::Layers => (
            subjects.layers_lifecycle()?.single_entry_flickers(ignore),
            "Layer",
        ),
        ElementKind::Windows => (
            subjects.windows_lifecycle()?.single_entry_flickers(ignore),
            "Window",
        ),
    };
    let Some(first) = flickers.first() else {
        return Ok(());
    };
    let message = format!(
        "{noun} {} (id {}) was visible for a single entry{}",
        first.name,
        first.id,
        if flickers.len() > 1 {
            format!("; {} more single-entry elements", flickers.len() - 1)
        } else {
            String::new()
        }
    );
    let timestamp = match kind {
        ElementKind::Layers => subjects
            .layers()?
            .entry(first.entry_index)
            .map(|e| e.entry.timestamp),
        ElementKind::Windows => subjects
            .wm()?
            .entry(first.entry_index)
            .map(|e| e.entry.timestamp),
    };
    Err(match timestamp {
        Some(ts) => AssertionFailure::at(ts, first.entry_index, message),
        None => AssertionFailure::new(message),
    })
}
