//! Components assertions are written against.
//!
//! System UI components are recognised by name. The apps taking part in a
//! transition are only known once a scenario is extracted, so they resolve
//! from the scenario's transition changes.

use std::fmt;

use flicker_types::{ComponentMatcher, TransitionChange};

use crate::result::AssertionFailure;
use crate::scenario::ScenarioInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentTemplate {
    NavBar,
    StatusBar,
    Launcher,
    OpeningApp,
    ClosingApp,
}

/// Component constants used by the standard templates.
pub mod components {
    use super::ComponentTemplate;

    pub const NAV_BAR: ComponentTemplate = ComponentTemplate::NavBar;
    pub const STATUS_BAR: ComponentTemplate = ComponentTemplate::StatusBar;
    pub const LAUNCHER: ComponentTemplate = ComponentTemplate::Launcher;
    pub const OPENING_APP: ComponentTemplate = ComponentTemplate::OpeningApp;
    pub const CLOSING_APP: ComponentTemplate = ComponentTemplate::ClosingApp;
}

pub const NAV_BAR_NAME: &str = "NavigationBar0";
pub const STATUS_BAR_NAME: &str = "StatusBar";
pub const LAUNCHER_PACKAGE: &str = "com.google.android.apps.nexuslauncher";

impl ComponentTemplate {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NavBar => "NAV_BAR",
            Self::StatusBar => "STATUS_BAR",
            Self::Launcher => "LAUNCHER",
            Self::OpeningApp => "OPENING_APP",
            Self::ClosingApp => "CLOSING_APP",
        }
    }

    /// Whether the component is an application rather than system UI.
    pub const fn is_app(self) -> bool {
        !matches!(self, Self::NavBar | Self::StatusBar)
    }

    /// Concrete matcher for this component within `scenario`.
    pub fn resolve(self, scenario: &ScenarioInstance) -> Result<ComponentMatcher, AssertionFailure> {
        match self {
            Self::NavBar => Ok(ComponentMatcher::named(self.label(), NAV_BAR_NAME)),
            Self::StatusBar => Ok(ComponentMatcher::named(self.label(), STATUS_BAR_NAME)),
            Self::Launcher => Ok(ComponentMatcher::named(self.label(), LAUNCHER_PACKAGE)),
            Self::OpeningApp => self.from_changes(scenario, "opening", |t| {
                t.opening_changes().collect()
            }),
            Self::ClosingApp => self.from_changes(scenario, "closing", |t| {
                t.closing_changes().collect()
            }),
        }
    }

    fn from_changes(
        self,
        scenario: &ScenarioInstance,
        role: &str,
        select: impl Fn(&flicker_types::Transition) -> Vec<&TransitionChange>,
    ) -> Result<ComponentMatcher, AssertionFailure> {
        let transition = scenario.associated_transition.as_ref().ok_or_else(|| {
            AssertionFailure::new(format!(
                "Cannot resolve {self}: scenario {} has no associated transition",
                scenario.id
            ))
        })?;
        let changes = select(transition);
        if changes.is_empty() {
            return Err(AssertionFailure::new(format!(
                "Cannot resolve {self}: transition {} has no {role} changes",
                transition.id
            )));
        }
        Ok(ComponentMatcher::with_ids(
            self.label(),
            changes.iter().map(|c| c.layer_id),
            changes.iter().map(|c| c.window_id),
        ))
    }
}

impl fmt::Display for ComponentTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
