//! Scenario extraction: carving reconciled scenario windows out of a run.
//!
//! A scenario starts where its CUJ marker starts. Its end is the later of
//! the marker end and the moment the compositor actually applied the
//! transition's finish transaction, since the marker is emitted before the
//! final frame lands on screen.

use flicker_error::{FlickerError, Result};
use flicker_types::{
    CujEntry, CujType, LayersTrace, Rotation, Timestamp, WmTrace, trace_kind,
};
use tracing::{debug, error, info};

use crate::reader::TraceReader;
use crate::scenario::{ScenarioId, ScenarioInstance, ScenarioType};
use crate::transition_matcher::TransitionMatcher;

/// Produces scenario instances from a reader.
pub trait ScenarioExtractor {
    fn extract(&self, reader: &dyn TraceReader) -> Result<Vec<ScenarioInstance>>;
}

/// Extracts one scenario instance per non-cancelled marker with a given tag.
#[derive(Debug)]
pub struct TaggedScenarioExtractor {
    target_tag: CujType,
    scenario_type: ScenarioType,
    transition_matcher: Box<dyn TransitionMatcher>,
}

impl TaggedScenarioExtractor {
    pub fn new(
        target_tag: CujType,
        scenario_type: ScenarioType,
        transition_matcher: Box<dyn TransitionMatcher>,
    ) -> Self {
        Self {
            target_tag,
            scenario_type,
            transition_matcher,
        }
    }

    pub const fn target_tag(&self) -> CujType {
        self.target_tag
    }

    pub const fn scenario_type(&self) -> ScenarioType {
        self.scenario_type
    }

    /// Extract with per-marker results.
    ///
    /// The outer error covers reader-wide problems (a required trace is
    /// absent). Each inner result covers one qualifying marker, in trace
    /// order, so a malformed marker does not hide its siblings.
    pub fn extract_each(
        &self,
        reader: &dyn TraceReader,
    ) -> Result<Vec<Result<ScenarioInstance>>> {
        let wm_trace = reader.read_wm_trace();
        let layers_trace = reader
            .read_layers_trace()
            .ok_or(FlickerError::missing_trace(trace_kind::LAYERS))?;
        let cuj_trace = reader
            .read_cuj_trace()
            .ok_or(FlickerError::missing_trace(trace_kind::CUJ))?;

        let targets: Vec<&CujEntry> = cuj_trace
            .entries()
            .iter()
            .filter(|e| e.cuj == self.target_tag)
            .filter(|e| !e.canceled)
            .collect();

        if targets.is_empty() {
            debug!(
                target: "flicker.extract",
                cuj = %self.target_tag,
                "no qualifying markers"
            );
            return Ok(Vec::new());
        }

        let results: Vec<Result<ScenarioInstance>> = targets
            .into_iter()
            .enumerate()
            .map(|(ordinal, cuj_entry)| {
                self.extract_entry(ordinal, cuj_entry, reader, wm_trace, layers_trace)
                    .inspect_err(|err| {
                        error!(
                            target: "flicker.extract",
                            cuj = %self.target_tag,
                            ordinal,
                            error = %err,
                            "scenario extraction failed"
                        );
                    })
            })
            .collect();

        info!(
            target: "flicker.extract",
            cuj = %self.target_tag,
            scenario_type = %self.scenario_type,
            extracted = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "extraction complete"
        );
        Ok(results)
    }

    fn extract_entry(
        &self,
        ordinal: usize,
        cuj_entry: &CujEntry,
        reader: &dyn TraceReader,
        wm_trace: Option<&WmTrace>,
        layers_trace: &LayersTrace,
    ) -> Result<ScenarioInstance> {
        let associated_transition = self.transition_matcher.get_transition(cuj_entry, reader);

        if !(cuj_entry.start_timestamp.has_all_timestamps()
            && cuj_entry.end_timestamp.has_all_timestamps())
        {
            return Err(FlickerError::IncompleteMarkerTimestamps {
                cuj: cuj_entry.cuj.to_string(),
                start: cuj_entry.start_timestamp.to_string(),
                end: cuj_entry.end_timestamp.to_string(),
            });
        }

        let reference = match &associated_transition {
            Some(transition) => {
                let transactions = reader
                    .read_transactions_trace()
                    .ok_or(FlickerError::missing_trace(trace_kind::TRANSACTIONS))?;
                let finish = transition.finish_transaction(transactions).ok_or(
                    FlickerError::FinishTransactionNotFound {
                        transition_id: transition.id,
                        transaction_id: transition.finish_transaction_id,
                    },
                )?;
                let applied = layers_trace
                    .entry_for_transaction(&finish)
                    .ok_or(FlickerError::NoLayersEntryForTransaction {
                        transaction_id: finish.id,
                        vsync_id: finish.applied_vsync_id,
                    })?
                    .timestamp;
                finish_reference(wm_trace, applied)
            }
            None => Timestamp::min(),
        };

        let start_timestamp = cuj_entry.start_timestamp;
        let end_timestamp = cuj_entry.end_timestamp.max_fieldwise(reference);

        if !start_timestamp.is_at_or_before_on_all_clocks(&end_timestamp) {
            return Err(FlickerError::InvertedScenarioWindow {
                cuj: cuj_entry.cuj.to_string(),
                start: start_timestamp.to_string(),
                end: end_timestamp.to_string(),
            });
        }

        let start_rotation = anchor_rotation(layers_trace, &start_timestamp)?;
        let end_rotation = anchor_rotation(layers_trace, &end_timestamp)?;

        debug!(
            target: "flicker.extract",
            cuj = %cuj_entry.cuj,
            ordinal,
            transition_id = associated_transition.as_ref().map(|t| t.id),
            start = %start_timestamp,
            end = %end_timestamp,
            "reconciled scenario window"
        );

        Ok(ScenarioInstance {
            id: ScenarioId {
                scenario_type: self.scenario_type,
                ordinal,
            },
            start_timestamp,
            end_timestamp,
            start_rotation,
            end_rotation,
            associated_cuj: cuj_entry.clone(),
            associated_transition,
            reader: reader.slice(&start_timestamp, &end_timestamp),
        })
    }
}

impl ScenarioExtractor for TaggedScenarioExtractor {
    /// Fails on the first marker that cannot be reconciled.
    fn extract(&self, reader: &dyn TraceReader) -> Result<Vec<ScenarioInstance>> {
        self.extract_each(reader)?.into_iter().collect()
    }
}

/// Reference instant for the end of a transition whose finish transaction
/// was applied at `applied`.
///
/// The elapsed clock follows the window manager, which settles after the
/// compositor; the other clocks follow the applied transaction. Without a
/// window manager entry at or after `applied`, the applied elapsed value
/// stands.
fn finish_reference(wm_trace: Option<&WmTrace>, applied: Timestamp) -> Timestamp {
    let wm_elapsed = wm_trace
        .and_then(|t| t.first_entry_at_or_after(&applied))
        .and_then(|e| e.timestamp.elapsed_nanos);
    Timestamp {
        elapsed_nanos: wm_elapsed.or(applied.elapsed_nanos),
        ..applied
    }
}

/// Rotation of the first physical display with content at `at`.
///
/// When `at` precedes the first layers entry, the first entry stands in for
/// the state at `at`.
fn anchor_rotation(layers_trace: &LayersTrace, at: &Timestamp) -> Result<Rotation> {
    let entry = layers_trace
        .entry_at(at)
        .or_else(|| layers_trace.entries().first())
        .ok_or_else(|| FlickerError::NoEntryAt {
            trace: trace_kind::LAYERS,
            at: at.to_string(),
        })?;
    entry
        .anchor_display()
        .map(|d| d.transform.rotation())
        .ok_or_else(|| FlickerError::NoPhysicalDisplay { at: at.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, full_ts};
    use crate::reader::InMemoryReader;
    use crate::transition_matcher::{NoTransitionMatcher, TransitionTypeMatcher};
    use flicker_types::{
        CujTrace, Display, LayersTraceEntry, Rect, Transform, TransitionType, TransitionsTrace,
    };

    fn extractor(tag: CujType) -> TaggedScenarioExtractor {
        TaggedScenarioExtractor::new(tag, ScenarioType::AppLaunchFromHome, Box::new(NoTransitionMatcher))
    }

    fn plain_reader(markers: Vec<CujEntry>) -> InMemoryReader {
        InMemoryReader::new()
            .with_layers_trace(fixtures::uniform_layers_trace(0, 1_000, 10))
            .with_cuj_trace(CujTrace::new(markers))
    }

    #[test]
    fn missing_layers_trace_is_fatal() {
        let reader = InMemoryReader::new().with_cuj_trace(CujTrace::default());
        let err = extractor(CujType::LauncherQuickSwitch)
            .extract(&reader)
            .expect_err("layers trace is required");
        assert!(matches!(err, FlickerError::MissingTrace { trace } if trace == trace_kind::LAYERS));
    }

    #[test]
    fn missing_cuj_trace_is_fatal() {
        let reader =
            InMemoryReader::new().with_layers_trace(fixtures::uniform_layers_trace(0, 100, 10));
        let err = extractor(CujType::LauncherQuickSwitch)
            .extract(&reader)
            .expect_err("cuj trace is required");
        assert!(matches!(err, FlickerError::MissingTrace { trace } if trace == trace_kind::CUJ));
    }

    #[test]
    fn transitionless_marker_keeps_marker_end() {
        let reader = plain_reader(vec![fixtures::marker(
            CujType::LauncherAppLaunchFromIcon,
            100,
            200,
            false,
        )]);
        let scenarios = extractor(CujType::LauncherAppLaunchFromIcon)
            .extract(&reader)
            .expect("extraction succeeds");
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].start_timestamp, full_ts(100));
        assert_eq!(scenarios[0].end_timestamp.elapsed_nanos, Some(200));
        assert!(scenarios[0].associated_transition.is_none());
    }

    #[test]
    fn cancelled_and_foreign_markers_are_skipped() {
        let reader = plain_reader(vec![
            fixtures::marker(CujType::LauncherAppLaunchFromIcon, 100, 200, true),
            fixtures::marker(CujType::LauncherQuickSwitch, 300, 400, false),
        ]);
        let scenarios = extractor(CujType::LauncherAppLaunchFromIcon)
            .extract(&reader)
            .expect("extraction succeeds");
        assert!(scenarios.is_empty());
    }

    #[test]
    fn incomplete_marker_timestamps_fail() {
        let mut marker = fixtures::marker(CujType::LauncherAppLaunchFromIcon, 100, 200, false);
        marker.end_timestamp.unix_nanos = None;
        let err = extractor(CujType::LauncherAppLaunchFromIcon)
            .extract(&plain_reader(vec![marker]))
            .expect_err("incomplete timestamps");
        assert!(matches!(err, FlickerError::IncompleteMarkerTimestamps { .. }));
    }

    #[test]
    fn per_marker_failures_do_not_hide_siblings() {
        let mut broken = fixtures::marker(CujType::LauncherAppLaunchFromIcon, 100, 200, false);
        broken.start_timestamp.elapsed_nanos = None;
        let good = fixtures::marker(CujType::LauncherAppLaunchFromIcon, 300, 400, false);
        let results = extractor(CujType::LauncherAppLaunchFromIcon)
            .extract_each(&plain_reader(vec![broken, good]))
            .expect("reader-wide checks pass");
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        let second = results[1].as_ref().expect("second marker extracts");
        assert_eq!(second.id.ordinal, 1);
    }

    #[test]
    fn no_physical_display_is_fatal() {
        let entries = vec![LayersTraceEntry {
            timestamp: full_ts(0),
            vsync_id: 0,
            displays: vec![Display {
                id: 1,
                name: "virtual".into(),
                is_virtual: true,
                layer_stack_space: Rect::from_size(100, 100),
                transform: Transform::IDENTITY,
            }],
            layers: Vec::new(),
        }];
        let reader = InMemoryReader::new()
            .with_layers_trace(LayersTrace::new(entries))
            .with_cuj_trace(CujTrace::new(vec![fixtures::marker(
                CujType::LauncherAppLaunchFromIcon,
                10,
                20,
                false,
            )]));
        let err = extractor(CujType::LauncherAppLaunchFromIcon)
            .extract(&reader)
            .expect_err("no anchor display");
        assert!(matches!(err, FlickerError::NoPhysicalDisplay { .. }));
    }

    #[test]
    fn transition_extends_end_to_applied_finish() {
        let reader = fixtures::LaunchFixture::new().reader();
        let scenarios = TaggedScenarioExtractor::new(
            CujType::LauncherAppLaunchFromIcon,
            ScenarioType::AppLaunchFromHome,
            Box::new(TransitionTypeMatcher::new([TransitionType::Open])),
        )
        .extract(&reader)
        .expect("extraction succeeds");
        assert_eq!(scenarios.len(), 1);
        let scenario = &scenarios[0];
        assert!(scenario.associated_transition.is_some());
        assert_eq!(scenario.end_timestamp, full_ts(fixtures::LaunchFixture::FINISH_APPLIED));
    }

    fn launch_reader_with_wm(wm_trace: Option<WmTrace>) -> InMemoryReader {
        let fixture = fixtures::LaunchFixture::new();
        let reader = InMemoryReader::new()
            .with_layers_trace(fixture.layers_trace())
            .with_cuj_trace(CujTrace::new(vec![fixtures::LaunchFixture::marker()]))
            .with_transitions_trace(TransitionsTrace::new(vec![
                fixtures::LaunchFixture::transition(),
            ]))
            .with_transactions_trace(fixtures::LaunchFixture::transactions_trace());
        match wm_trace {
            Some(trace) => reader.with_wm_trace(trace),
            None => reader,
        }
    }

    fn extract_launch(reader: &InMemoryReader) -> ScenarioInstance {
        let mut scenarios = TaggedScenarioExtractor::new(
            CujType::LauncherAppLaunchFromIcon,
            ScenarioType::AppLaunchFromHome,
            Box::new(TransitionTypeMatcher::new([TransitionType::Open])),
        )
        .extract(reader)
        .expect("extraction succeeds");
        assert_eq!(scenarios.len(), 1);
        scenarios.remove(0)
    }

    #[test]
    fn applied_finish_bounds_end_without_wm_trace() {
        let scenario = extract_launch(&launch_reader_with_wm(None));
        assert_eq!(
            scenario.end_timestamp,
            full_ts(fixtures::LaunchFixture::FINISH_APPLIED)
        );
        let layers = scenario
            .reader()
            .read_layers_trace()
            .expect("layers trace kept");
        assert_eq!(
            layers.entries().last().map(|e| e.timestamp),
            Some(full_ts(fixtures::LaunchFixture::FINISH_APPLIED))
        );
    }

    #[test]
    fn applied_finish_bounds_end_when_wm_trace_stops_early() {
        let early = WmTrace::new(
            fixtures::LaunchFixture::new()
                .wm_trace()
                .entries()
                .iter()
                .filter(|e| {
                    e.timestamp.elapsed_nanos < Some(fixtures::LaunchFixture::FINISH_APPLIED)
                })
                .cloned()
                .collect(),
        );
        let scenario = extract_launch(&launch_reader_with_wm(Some(early)));
        assert_eq!(
            scenario.end_timestamp,
            full_ts(fixtures::LaunchFixture::FINISH_APPLIED)
        );
    }

    #[test]
    fn wm_entry_after_finish_extends_elapsed_only() {
        let late = WmTrace::new(vec![fixtures::wm_entry(650, Vec::new(), None)]);
        let scenario = extract_launch(&launch_reader_with_wm(Some(late)));
        assert_eq!(scenario.end_timestamp.elapsed_nanos, Some(650));
        assert_eq!(
            scenario.end_timestamp.system_uptime_nanos,
            Some(fixtures::LaunchFixture::FINISH_APPLIED)
        );
    }

    #[test]
    fn transitionless_marker_ignores_wm_trace() {
        let reader = plain_reader(vec![fixtures::marker(
            CujType::LauncherAppLaunchFromIcon,
            100,
            200,
            false,
        )])
        .with_wm_trace(fixtures::uniform_wm_trace(300, 1_000, 10));
        let scenarios = extractor(CujType::LauncherAppLaunchFromIcon)
            .extract(&reader)
            .expect("extraction succeeds");
        assert_eq!(scenarios[0].end_timestamp, full_ts(200));
    }

    #[test]
    fn transition_without_transactions_trace_is_fatal() {
        let reader = InMemoryReader::new()
            .with_layers_trace(fixtures::uniform_layers_trace(0, 1_000, 10))
            .with_cuj_trace(CujTrace::new(vec![fixtures::marker(
                CujType::LauncherAppLaunchFromIcon,
                100,
                200,
                false,
            )]))
            .with_transitions_trace(TransitionsTrace::new(vec![fixtures::open_transition(
                1, 150, 77,
            )]));
        let err = TaggedScenarioExtractor::new(
            CujType::LauncherAppLaunchFromIcon,
            ScenarioType::AppLaunchFromHome,
            Box::new(TransitionTypeMatcher::new([TransitionType::Open])),
        )
        .extract(&reader)
        .expect_err("transactions trace required");
        assert!(
            matches!(err, FlickerError::MissingTrace { trace } if trace == trace_kind::TRANSACTIONS)
        );
    }

    #[test]
    fn unresolvable_finish_transaction_is_fatal() {
        let reader = InMemoryReader::new()
            .with_layers_trace(fixtures::uniform_layers_trace(0, 1_000, 10))
            .with_cuj_trace(CujTrace::new(vec![fixtures::marker(
                CujType::LauncherAppLaunchFromIcon,
                100,
                200,
                false,
            )]))
            .with_transitions_trace(TransitionsTrace::new(vec![fixtures::open_transition(
                1, 150, 77,
            )]))
            .with_transactions_trace(flicker_types::TransactionsTrace::default());
        let err = TaggedScenarioExtractor::new(
            CujType::LauncherAppLaunchFromIcon,
            ScenarioType::AppLaunchFromHome,
            Box::new(TransitionTypeMatcher::new([TransitionType::Open])),
        )
        .extract(&reader)
        .expect_err("finish transaction missing");
        assert!(matches!(
            err,
            FlickerError::FinishTransactionNotFound {
                transition_id: 1,
                transaction_id: 77
            }
        ));
    }
}
