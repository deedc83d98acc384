//! Assertion template catalog.
//!
//! Templates are plain lists composed by concatenation. Composition keeps
//! duplicates: an assertion listed by two constituent groups runs twice.

use std::collections::BTreeMap;

use flicker_error::{FlickerError, Result};
use tracing::warn;

use crate::assertion::{Assertion, BecomesTarget, Check, ElementKind};
use crate::component::components::{CLOSING_APP, LAUNCHER, NAV_BAR, OPENING_APP, STATUS_BAR};
use crate::scenario::ScenarioType;

pub fn common_assertions() -> Vec<Assertion> {
    vec![
        Assertion::AtStart(Check::EntireScreenCovered),
        Assertion::AtEnd(Check::EntireScreenCovered),
        Assertion::Always(Check::EntireScreenCovered),
        Assertion::consecutive(ElementKind::Windows),
        Assertion::consecutive(ElementKind::Layers),
    ]
}

pub fn nav_bar_assertions() -> Vec<Assertion> {
    vec![
        Assertion::AtStart(Check::LayerIsVisible(NAV_BAR)),
        Assertion::AtEnd(Check::LayerIsVisible(NAV_BAR)),
        Assertion::Always(Check::WindowIsVisible(NAV_BAR)),
    ]
}

pub fn status_bar_assertions() -> Vec<Assertion> {
    vec![
        Assertion::Always(Check::WindowIsVisible(STATUS_BAR)),
        Assertion::Always(Check::LayerIsVisible(STATUS_BAR)),
    ]
}

pub fn app_launch_assertions() -> Vec<Assertion> {
    let mut list = common_assertions();
    list.extend([
        Assertion::AtStart(Check::LayerIsInvisible(OPENING_APP)),
        Assertion::AtEnd(Check::LayerIsVisible(OPENING_APP)),
        Assertion::becomes(BecomesTarget::LayerVisible, OPENING_APP),
        Assertion::becomes(BecomesTarget::WindowVisible, OPENING_APP),
        Assertion::becomes(BecomesTarget::WindowTopWindow, OPENING_APP),
    ]);
    list
}

pub fn app_close_assertions() -> Vec<Assertion> {
    let mut list = common_assertions();
    list.extend([
        Assertion::AtStart(Check::LayerIsVisible(CLOSING_APP)),
        Assertion::AtEnd(Check::LayerIsInvisible(CLOSING_APP)),
        Assertion::AtStart(Check::WindowIsVisible(CLOSING_APP)),
        Assertion::AtEnd(Check::WindowIsInvisible(CLOSING_APP)),
        Assertion::becomes(BecomesTarget::LayerInvisible, CLOSING_APP),
        Assertion::becomes(BecomesTarget::WindowInvisible, CLOSING_APP),
        Assertion::AtStart(Check::WindowIsTopWindow(CLOSING_APP)),
    ]);
    list
}

pub fn app_launch_from_home_assertions() -> Vec<Assertion> {
    let mut list = app_launch_assertions();
    list.extend([
        Assertion::AtStart(Check::LayerIsVisible(LAUNCHER)),
        Assertion::AtEnd(Check::LayerIsInvisible(LAUNCHER)),
    ]);
    list
}

pub fn app_close_to_home_assertions() -> Vec<Assertion> {
    let mut list = app_close_assertions();
    list.extend([
        Assertion::AtStart(Check::LayerIsInvisible(LAUNCHER)),
        Assertion::AtEnd(Check::LayerIsVisible(LAUNCHER)),
        Assertion::AtStart(Check::WindowIsInvisible(LAUNCHER)),
        Assertion::AtEnd(Check::WindowIsVisible(LAUNCHER)),
        Assertion::becomes(BecomesTarget::WindowTopWindow, LAUNCHER),
    ]);
    list
}

/// Nothing specific to notification launches yet; the common group is
/// listed twice since the launch group already carries it.
pub fn app_launch_from_notification_assertions() -> Vec<Assertion> {
    let mut list = common_assertions();
    list.extend(app_launch_assertions());
    list
}

pub fn launcher_quick_switch_assertions() -> Vec<Assertion> {
    let mut list = common_assertions();
    list.extend(app_launch_assertions());
    list.extend(app_close_assertions());
    list.extend([
        Assertion::AtStart(Check::WindowCoversFullScreen(CLOSING_APP)),
        Assertion::AtStart(Check::LayerCoversFullScreen(CLOSING_APP)),
        Assertion::AtEnd(Check::WindowCoversFullScreen(OPENING_APP)),
        Assertion::AtEnd(Check::LayerCoversFullScreen(OPENING_APP)),
        Assertion::AtStart(Check::WindowOnTop(CLOSING_APP)),
        Assertion::AtEnd(Check::WindowOnTop(OPENING_APP)),
        Assertion::becomes(BecomesTarget::WindowInvisible, CLOSING_APP),
        Assertion::becomes(BecomesTarget::LayerInvisible, CLOSING_APP),
        Assertion::becomes(BecomesTarget::WindowVisible, OPENING_APP),
        Assertion::becomes(BecomesTarget::LayerVisible, OPENING_APP),
    ]);
    list
}

/// A named, ordered assertion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionTemplate {
    pub name: &'static str,
    pub assertions: Vec<Assertion>,
}

impl AssertionTemplate {
    /// Standard template for a scenario type.
    pub fn standard(scenario_type: ScenarioType) -> Self {
        let (name, assertions) = match scenario_type {
            ScenarioType::AppLaunch => ("APP_LAUNCH", app_launch_assertions()),
            ScenarioType::AppClose => ("APP_CLOSE", app_close_assertions()),
            ScenarioType::AppLaunchFromHome => {
                ("APP_LAUNCH_FROM_HOME", app_launch_from_home_assertions())
            }
            ScenarioType::AppCloseToHome => ("APP_CLOSE_TO_HOME", app_close_to_home_assertions()),
            ScenarioType::AppLaunchFromNotification => (
                "APP_LAUNCH_FROM_NOTIFICATION",
                app_launch_from_notification_assertions(),
            ),
            ScenarioType::LauncherQuickSwitch => {
                ("LAUNCHER_QUICK_SWITCH", launcher_quick_switch_assertions())
            }
        };
        Self { name, assertions }
    }

    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }
}

/// Scenario type to template lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCatalog {
    templates: BTreeMap<ScenarioType, AssertionTemplate>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every scenario type mapped to its standard template.
    pub fn standard() -> Self {
        Self::build(false, &[])
    }

    /// Standard templates, optionally extended with the navigation and
    /// status bar groups, with `consecutive_ignore` applied to the
    /// consecutive-entry assertions.
    pub fn build(include_system_ui: bool, consecutive_ignore: &[String]) -> Self {
        let mut catalog = Self::new();
        for scenario_type in ScenarioType::ALL {
            let mut template = AssertionTemplate::standard(scenario_type);
            if include_system_ui {
                template.assertions.extend(nav_bar_assertions());
                template.assertions.extend(status_bar_assertions());
            }
            template.assertions = template
                .assertions
                .into_iter()
                .map(|a| a.with_consecutive_ignore(consecutive_ignore))
                .collect();
            catalog = catalog.with_template(scenario_type, template);
        }
        catalog
    }

    #[must_use]
    pub fn with_template(mut self, scenario_type: ScenarioType, template: AssertionTemplate) -> Self {
        self.templates.insert(scenario_type, template);
        self
    }

    pub fn get(&self, scenario_type: ScenarioType) -> Result<&AssertionTemplate> {
        self.templates.get(&scenario_type).ok_or_else(|| {
            warn!(
                target: "flicker.assert",
                scenario_type = %scenario_type,
                "no assertion template registered"
            );
            FlickerError::NoTemplateForScenario {
                scenario_type: scenario_type.to_string(),
            }
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
