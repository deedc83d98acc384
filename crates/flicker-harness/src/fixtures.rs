//! Deterministic synthetic traces for tests.
//!
//! Every timestamp produced here carries all three clocks, derived from one
//! nanosecond value so that ordering agrees on every clock.
//!
//! [`LaunchFixture`] models an app launched from the home screen:
//!
//! | t (ns) | vsync | launcher | app   | notes                            |
//! |--------|-------|----------|-------|----------------------------------|
//! | 100    | 1     | shown    | -     | marker starts                    |
//! | 200    | 2     | shown    | -     | start transaction applied        |
//! | 300    | 3     | shown    | shown | app on top and focused           |
//! | 400    | 4     | hidden   | shown | marker ends                      |
//! | 500    | 5     | hidden   | shown | finish transaction applied       |

use flicker_types::{
    ComponentMatcher, CujEntry, CujTrace, CujType, Display, Layer, LayersTrace, LayersTraceEntry,
    Rect, Region, Rotation, Timestamp, TransactionsTrace, TransactionsTraceEntry, TransitMode,
    Transition, TransitionChange, TransitionType, TransitionsTrace, Transform, WindowState,
    WmDisplay, WmTrace, WmTraceEntry,
};

use crate::reader::InMemoryReader;
use crate::scenario::{ScenarioId, ScenarioInstance, ScenarioType};

/// Offset of the wall clock from the elapsed clock in fixture timestamps.
pub const UNIX_OFFSET_NANOS: i64 = 1_700_000_000_000_000_000;

pub const SCREEN: Rect = Rect::from_size(1080, 2400);

/// A timestamp with every clock derived from `nanos`.
pub const fn full_ts(nanos: i64) -> Timestamp {
    Timestamp::new(nanos, nanos, nanos + UNIX_OFFSET_NANOS)
}

pub fn display(width: i32, height: i32) -> Display {
    Display {
        id: 0,
        name: "Built-in Screen".to_owned(),
        is_virtual: false,
        layer_stack_space: Rect::from_size(width, height),
        transform: Transform::IDENTITY,
    }
}

/// A visible layer drawing `region`.
pub fn layer(id: i32, parent_id: Option<i32>, name: &str, region: Rect) -> Layer {
    Layer {
        id,
        parent_id,
        name: name.to_owned(),
        is_visible: true,
        visible_region: Region::from_rect(region),
    }
}

pub fn hidden_layer(id: i32, parent_id: Option<i32>, name: &str) -> Layer {
    Layer {
        id,
        parent_id,
        name: name.to_owned(),
        is_visible: false,
        visible_region: Region::new(),
    }
}

pub fn layers_entry(
    nanos: i64,
    vsync_id: i64,
    displays: Vec<Display>,
    layers: Vec<Layer>,
) -> LayersTraceEntry {
    LayersTraceEntry {
        timestamp: full_ts(nanos),
        vsync_id,
        displays,
        layers,
    }
}

pub fn window(id: i32, name: &str, layer_id: i32, is_visible: bool, is_app_window: bool) -> WindowState {
    WindowState {
        id,
        name: name.to_owned(),
        layer_id,
        is_visible,
        is_app_window,
        frame: SCREEN,
    }
}

pub fn wm_entry(nanos: i64, windows: Vec<WindowState>, focused_app: Option<&str>) -> WmTraceEntry {
    WmTraceEntry {
        timestamp: full_ts(nanos),
        windows,
        displays: vec![WmDisplay {
            id: 0,
            bounds: SCREEN,
        }],
        focused_app: focused_app.map(str::to_owned),
    }
}

/// Entries every `step` ns in `[start, end]`, each with one full-screen
/// wallpaper layer. Vsync ids count from zero.
pub fn uniform_layers_trace(start: i64, end: i64, step: usize) -> LayersTrace {
    LayersTrace::new(
        (start..=end)
            .step_by(step)
            .zip(0..)
            .map(|(nanos, vsync)| {
                layers_entry(
                    nanos,
                    vsync,
                    vec![display(SCREEN.width(), SCREEN.height())],
                    vec![layer(1, None, "Wallpaper#1", SCREEN)],
                )
            })
            .collect(),
    )
}

/// Window manager entries every `step` ns in `[start, end]`.
pub fn uniform_wm_trace(start: i64, end: i64, step: usize) -> WmTrace {
    WmTrace::new(
        (start..=end)
            .step_by(step)
            .map(|nanos| {
                wm_entry(
                    nanos,
                    vec![window(1, "Wallpaper", 1, true, false)],
                    None,
                )
            })
            .collect(),
    )
}

pub const fn marker(cuj: CujType, start: i64, end: i64, canceled: bool) -> CujEntry {
    CujEntry {
        cuj,
        start_timestamp: full_ts(start),
        end_timestamp: full_ts(end),
        canceled,
    }
}

/// An open transition sent at `send` and finished by transaction
/// `finish_transaction_id`.
pub fn open_transition(id: i32, send: i64, finish_transaction_id: u64) -> Transition {
    Transition {
        id,
        transition_type: TransitionType::Open,
        send_time: full_ts(send),
        finish_time: full_ts(send + 100),
        start_transaction_id: 0,
        finish_transaction_id,
        changes: Vec::new(),
        aborted: false,
    }
}

/// An app launched from the home screen.
#[derive(Debug, Clone, Default)]
pub struct LaunchFixture {
    single_frame_flicker: bool,
    without_transition: bool,
}

impl LaunchFixture {
    pub const MARKER_START: i64 = 100;
    pub const MARKER_END: i64 = 400;
    pub const FINISH_APPLIED: i64 = 500;

    pub const LAUNCHER_LAYER: i32 = 10;
    pub const LAUNCHER_WINDOW: i32 = 100;
    pub const APP_TASK_LAYER: i32 = 20;
    pub const APP_ACTIVITY_LAYER: i32 = 21;
    pub const APP_WINDOW: i32 = 200;
    pub const NAV_BAR_LAYER: i32 = 30;
    pub const STATUS_BAR_LAYER: i32 = 40;
    pub const FLICKER_LAYER: i32 = 55;

    pub const LAUNCHER_NAME: &'static str =
        "com.google.android.apps.nexuslauncher/com.android.launcher3.uioverrides.QuickstepLauncher";
    pub const APP_NAME: &'static str = "com.example.app/.MainActivity";
    pub const FLICKER_LAYER_NAME: &'static str = "TransientOverlay";

    const TRANSITION_ID: i32 = 1;
    const START_TRANSACTION: u64 = 1001;
    const FINISH_TRANSACTION: u64 = 1002;

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer that is visible for the middle entry only.
    #[must_use]
    pub fn with_single_frame_flicker(mut self) -> Self {
        self.single_frame_flicker = true;
        self
    }

    /// Drop the transitions and transactions traces.
    #[must_use]
    pub fn without_transition(mut self) -> Self {
        self.without_transition = true;
        self
    }

    /// Matcher for the launched app, as resolved from the transition.
    pub fn app_component() -> ComponentMatcher {
        ComponentMatcher::with_ids("OPENING_APP", [Self::APP_TASK_LAYER], [Self::APP_WINDOW])
    }

    pub fn marker() -> CujEntry {
        marker(
            CujType::LauncherAppLaunchFromIcon,
            Self::MARKER_START,
            Self::MARKER_END,
            false,
        )
    }

    pub fn transition() -> Transition {
        Transition {
            id: Self::TRANSITION_ID,
            transition_type: TransitionType::Open,
            send_time: full_ts(150),
            finish_time: full_ts(450),
            start_transaction_id: Self::START_TRANSACTION,
            finish_transaction_id: Self::FINISH_TRANSACTION,
            changes: vec![
                TransitionChange {
                    mode: TransitMode::Open,
                    layer_id: Self::APP_TASK_LAYER,
                    window_id: Self::APP_WINDOW,
                },
                TransitionChange {
                    mode: TransitMode::ToBack,
                    layer_id: Self::LAUNCHER_LAYER,
                    window_id: Self::LAUNCHER_WINDOW,
                },
            ],
            aborted: false,
        }
    }

    pub fn layers_trace(&self) -> LayersTrace {
        let nav_bar = Rect::new(0, 2280, 1080, 2400);
        let status_bar = Rect::new(0, 0, 1080, 100);
        let launcher_name = format!("{}#{}", Self::LAUNCHER_NAME, Self::LAUNCHER_LAYER);
        let app_name = format!("{}#{}", Self::APP_NAME, Self::APP_ACTIVITY_LAYER);
        let flicker_name = format!("{}#{}", Self::FLICKER_LAYER_NAME, Self::FLICKER_LAYER);

        let entries = (1..=5)
            .map(|vsync: i64| {
                let mut layers = vec![
                    layer(Self::NAV_BAR_LAYER, None, "NavigationBar0#30", nav_bar),
                    layer(Self::STATUS_BAR_LAYER, None, "StatusBar#40", status_bar),
                ];
                if vsync <= 3 {
                    layers.push(layer(Self::LAUNCHER_LAYER, None, &launcher_name, SCREEN));
                } else {
                    layers.push(hidden_layer(Self::LAUNCHER_LAYER, None, &launcher_name));
                }
                if vsync >= 3 {
                    layers.push(layer(
                        Self::APP_TASK_LAYER,
                        None,
                        "Task=42#20",
                        Rect::EMPTY,
                    ));
                    layers.push(layer(
                        Self::APP_ACTIVITY_LAYER,
                        Some(Self::APP_TASK_LAYER),
                        &app_name,
                        SCREEN,
                    ));
                }
                if self.single_frame_flicker && vsync == 3 {
                    layers.push(layer(
                        Self::FLICKER_LAYER,
                        None,
                        &flicker_name,
                        Rect::from_size(100, 100),
                    ));
                }
                layers_entry(
                    vsync * 100,
                    vsync,
                    vec![display(SCREEN.width(), SCREEN.height())],
                    layers,
                )
            })
            .collect();
        LayersTrace::new(entries)
    }

    pub fn wm_trace(&self) -> WmTrace {
        let entries = (1..=5)
            .map(|step: i64| {
                let mut windows = vec![
                    window(300, "NavigationBar0", Self::NAV_BAR_LAYER, true, false),
                    window(400, "StatusBar", Self::STATUS_BAR_LAYER, true, false),
                ];
                if step >= 3 {
                    windows.push(window(
                        Self::APP_WINDOW,
                        Self::APP_NAME,
                        Self::APP_ACTIVITY_LAYER,
                        true,
                        true,
                    ));
                }
                windows.push(window(
                    Self::LAUNCHER_WINDOW,
                    Self::LAUNCHER_NAME,
                    Self::LAUNCHER_LAYER,
                    step <= 3,
                    true,
                ));
                let focused = if step >= 3 {
                    Self::APP_NAME
                } else {
                    Self::LAUNCHER_NAME
                };
                wm_entry(step * 100, windows, Some(focused))
            })
            .collect();
        WmTrace::new(entries)
    }

    pub fn transactions_trace() -> TransactionsTrace {
        TransactionsTrace::new(vec![
            TransactionsTraceEntry {
                timestamp: full_ts(200),
                vsync_id: 2,
                transaction_ids: vec![Self::START_TRANSACTION],
            },
            TransactionsTraceEntry {
                timestamp: full_ts(Self::FINISH_APPLIED),
                vsync_id: 5,
                transaction_ids: vec![Self::FINISH_TRANSACTION],
            },
        ])
    }

    /// Reader over the whole run.
    pub fn reader(&self) -> InMemoryReader {
        let reader = InMemoryReader::new()
            .with_layers_trace(self.layers_trace())
            .with_wm_trace(self.wm_trace())
            .with_cuj_trace(CujTrace::new(vec![Self::marker()]));
        if self.without_transition {
            reader
        } else {
            reader
                .with_transitions_trace(TransitionsTrace::new(vec![Self::transition()]))
                .with_transactions_trace(Self::transactions_trace())
        }
    }

    /// The scenario extraction yields for this run.
    pub fn scenario(&self) -> ScenarioInstance {
        let start = full_ts(Self::MARKER_START);
        let (end, transition) = if self.without_transition {
            (full_ts(Self::MARKER_END), None)
        } else {
            (full_ts(Self::FINISH_APPLIED), Some(Self::transition()))
        };
        ScenarioInstance {
            id: ScenarioId {
                scenario_type: ScenarioType::AppLaunchFromHome,
                ordinal: 0,
            },
            start_timestamp: start,
            end_timestamp: end,
            start_rotation: Rotation::Rotation0,
            end_rotation: Rotation::Rotation0,
            associated_cuj: Self::marker(),
            associated_transition: transition,
            reader: Box::new(self.reader().sliced(&start, &end)),
        }
    }
}
