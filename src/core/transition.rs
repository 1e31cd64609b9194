//! Preload, swap and fade cycle for the visible background.
//!
//! The controller never touches the screen itself. Each event returns the
//! effects the application has to run (start a preload, arm a timer, persist
//! the fallback settings); their results come back as further events.

use std::time::Duration;

use super::background::{BackgroundSettings, ImageSource};

/// Attempts made for one settings value before falling back to the default image.
pub const MAX_ATTEMPTS: u8 = 3;
/// Pause between a finished preload and the visible swap.
pub const SWAP_DELAY: Duration = Duration::from_millis(300);
/// Pause before re-attempting a failed preload.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
/// Length of the opacity animation after a swap.
pub const FADE_DURATION: Duration = Duration::from_millis(700);
/// How long the fallback notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_secs(4);

/// One preload attempt, carrying everything needed to retry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub settings: BackgroundSettings,
    pub target: ImageSource,
    pub forced: bool,
    pub attempt: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading(LoadRequest),
    Swapping(LoadRequest),
    FadingIn { progress: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    FellBackToDefault,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Apply { settings: BackgroundSettings, forced: bool },
    Preloaded { request: LoadRequest, ok: bool },
    SwapDue(LoadRequest),
    RetryDue(LoadRequest),
    FadeStep(Duration),
    DismissNotice(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Preload(LoadRequest),
    ScheduleSwap(LoadRequest, Duration),
    ScheduleRetry(LoadRequest, Duration),
    /// Replace the stored settings with the default mode.
    FallBackToDefault,
    StartFade,
    ScheduleNoticeDismiss(u64, Duration),
}

#[derive(Debug, Clone)]
pub struct Transition {
    displayed: ImageSource,
    phase: Phase,
    generation: u64,
    notice: Option<(u64, Notice)>,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            displayed: ImageSource::Default,
            phase: Phase::Idle,
            generation: 0,
            notice: None,
        }
    }
}

impl Transition {
    pub fn displayed(&self) -> &ImageSource {
        &self.displayed
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading(_) | Phase::Swapping(_))
    }

    /// Opacity of the visible image, 0.0 to 1.0.
    ///
    /// The previous image stays fully visible while the next one preloads.
    pub fn opacity(&self) -> f32 {
        match self.phase {
            Phase::FadingIn { progress } => progress,
            Phase::Idle | Phase::Loading(_) | Phase::Swapping(_) => 1.0,
        }
    }

    pub fn is_fading(&self) -> bool {
        matches!(self.phase, Phase::FadingIn { .. })
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.map(|(_, n)| n)
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Apply { settings, forced } => self.apply(settings, forced),

            Event::Preloaded { request, ok } => {
                if !self.is_current(&request) {
                    log::debug!("Dropping stale preload result for {}", request.target.describe());
                    return Vec::new();
                }
                if ok {
                    self.phase = Phase::Swapping(request.clone());
                    vec![Effect::ScheduleSwap(request, SWAP_DELAY)]
                } else {
                    self.fail(request)
                }
            }

            Event::SwapDue(request) => {
                if !self.is_current(&request) {
                    return Vec::new();
                }
                log::info!("Background switched to {}", request.target.describe());
                self.displayed = request.target;
                self.phase = Phase::FadingIn { progress: 0.0 };
                vec![Effect::StartFade]
            }

            Event::RetryDue(request) => {
                if !self.is_current(&request) {
                    return Vec::new();
                }
                self.phase = Phase::Loading(request.clone());
                vec![Effect::Preload(request)]
            }

            Event::FadeStep(elapsed) => {
                if let Phase::FadingIn { .. } = self.phase {
                    let progress = elapsed.as_secs_f32() / FADE_DURATION.as_secs_f32();
                    self.phase = if progress >= 1.0 {
                        Phase::Idle
                    } else {
                        Phase::FadingIn { progress }
                    };
                }
                Vec::new()
            }

            Event::DismissNotice(id) => {
                if self.notice.is_some_and(|(current, _)| current == id) {
                    self.notice = None;
                }
                Vec::new()
            }
        }
    }

    fn apply(&mut self, settings: BackgroundSettings, forced: bool) -> Vec<Effect> {
        let target = settings.source();
        if target == self.displayed && !forced {
            // Also supersedes any preload still in flight for an older selection.
            if self.is_loading() {
                self.generation += 1;
                self.phase = Phase::Idle;
            }
            return Vec::new();
        }

        self.generation += 1;
        let request = LoadRequest {
            generation: self.generation,
            settings,
            target,
            forced,
            attempt: 1,
        };
        log::debug!(
            "Preloading {} (generation {}, forced: {})",
            request.target.describe(),
            request.generation,
            forced
        );
        self.phase = Phase::Loading(request.clone());
        vec![Effect::Preload(request)]
    }

    fn fail(&mut self, request: LoadRequest) -> Vec<Effect> {
        if request.attempt < MAX_ATTEMPTS {
            log::warn!(
                "Failed to load {} (attempt {}/{}), retrying",
                request.target.describe(),
                request.attempt,
                MAX_ATTEMPTS
            );
            let retry = LoadRequest {
                attempt: request.attempt + 1,
                ..request
            };
            self.phase = Phase::Loading(retry.clone());
            return vec![Effect::ScheduleRetry(retry, RETRY_DELAY)];
        }

        log::error!(
            "Failed to load {} after {} attempts, falling back to default",
            request.target.describe(),
            MAX_ATTEMPTS
        );
        self.generation += 1;
        self.displayed = ImageSource::Default;
        self.phase = Phase::FadingIn { progress: 0.0 };
        self.notice = Some((self.generation, Notice::FellBackToDefault));
        vec![
            Effect::FallBackToDefault,
            Effect::StartFade,
            Effect::ScheduleNoticeDismiss(self.generation, NOTICE_DURATION),
        ]
    }

    fn is_current(&self, request: &LoadRequest) -> bool {
        request.generation == self.generation
    }
}

/// Whether `effects` arm the swap for `generation`.
///
/// A decoded image may only be kept for display when this holds; results of
/// superseded requests produce no swap and must be discarded.
pub fn swap_scheduled_for(effects: &[Effect], generation: u64) -> bool {
    effects
        .iter()
        .any(|effect| matches!(effect, Effect::ScheduleSwap(r, _) if r.generation == generation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::background::BackgroundMode;

    fn remote(url: &str) -> BackgroundSettings {
        BackgroundSettings {
            mode: BackgroundMode::DailyRemote,
            image_reference: Some(url.to_string()),
            last_refreshed_at: None,
        }
    }

    fn apply(t: &mut Transition, settings: BackgroundSettings) -> Vec<Effect> {
        t.handle(Event::Apply { settings, forced: false })
    }

    fn only_preload(effects: Vec<Effect>) -> LoadRequest {
        match effects.as_slice() {
            [Effect::Preload(req)] => req.clone(),
            other => panic!("expected a single preload, got {:?}", other),
        }
    }

    /// Drive a request through success up to the visible swap.
    fn succeed(t: &mut Transition, request: LoadRequest) {
        let effects = t.handle(Event::Preloaded { request: request.clone(), ok: true });
        assert_eq!(effects, vec![Effect::ScheduleSwap(request.clone(), SWAP_DELAY)]);
        assert_eq!(t.handle(Event::SwapDue(request)), vec![Effect::StartFade]);
    }

    #[test]
    fn successful_load_swaps_then_fades() {
        let mut t = Transition::default();
        let req = only_preload(apply(&mut t, remote("a")));
        assert_eq!(req.attempt, 1);
        assert!(t.is_loading());
        assert_eq!(t.displayed(), &ImageSource::Default);
        assert_eq!(t.opacity(), 1.0);

        t.handle(Event::Preloaded { request: req.clone(), ok: true });
        // Not visible until the swap fires.
        assert_eq!(t.displayed(), &ImageSource::Default);

        t.handle(Event::SwapDue(req));
        assert_eq!(t.displayed(), &ImageSource::Remote("a".into()));
        assert_eq!(t.opacity(), 0.0);

        t.handle(Event::FadeStep(Duration::from_millis(350)));
        assert!((t.opacity() - 0.5).abs() < 0.01);
        t.handle(Event::FadeStep(FADE_DURATION));
        assert_eq!(&t.phase, &Phase::Idle);
        assert_eq!(t.opacity(), 1.0);
    }

    #[test]
    fn unchanged_target_is_a_no_op_unless_forced() {
        let mut t = Transition::default();
        assert!(apply(&mut t, BackgroundSettings::default()).is_empty());

        let req = only_preload(apply(&mut t, remote("a")));
        succeed(&mut t, req);

        assert!(apply(&mut t, remote("a")).is_empty());
        let forced = only_preload(t.handle(Event::Apply { settings: remote("a"), forced: true }));
        assert!(forced.forced);
    }

    #[test]
    fn three_failures_fall_back_exactly_once() {
        let mut t = Transition::default();
        let mut req = only_preload(apply(&mut t, remote("broken")));
        let mut fallbacks = 0;
        let mut preloads = 1;

        loop {
            let effects = t.handle(Event::Preloaded { request: req.clone(), ok: false });
            if effects.contains(&Effect::FallBackToDefault) {
                fallbacks += 1;
                break;
            }
            let retry = match effects.as_slice() {
                [Effect::ScheduleRetry(r, d)] => {
                    assert_eq!(*d, RETRY_DELAY);
                    r.clone()
                }
                other => panic!("expected retry, got {:?}", other),
            };
            assert_eq!(retry.settings, req.settings);
            req = only_preload(t.handle(Event::RetryDue(retry)));
            preloads += 1;
        }

        assert_eq!(fallbacks, 1);
        assert_eq!(preloads, MAX_ATTEMPTS);
        assert_eq!(t.displayed(), &ImageSource::Default);
        assert_eq!(t.notice(), Some(Notice::FellBackToDefault));

        // A late result for the abandoned request changes nothing.
        assert!(t.handle(Event::Preloaded { request: req, ok: false }).is_empty());
    }

    #[test]
    fn notice_is_dismissed_by_its_own_timer() {
        let mut t = Transition::default();
        let mut req = only_preload(apply(&mut t, remote("broken")));
        let mut dismiss = None;
        for _ in 0..MAX_ATTEMPTS {
            for effect in t.handle(Event::Preloaded { request: req.clone(), ok: false }) {
                match effect {
                    Effect::ScheduleRetry(r, _) => req = only_preload(t.handle(Event::RetryDue(r))),
                    Effect::ScheduleNoticeDismiss(id, _) => dismiss = Some(id),
                    _ => {}
                }
            }
        }
        let id = dismiss.unwrap();
        t.handle(Event::DismissNotice(id + 1));
        assert!(t.notice().is_some());
        t.handle(Event::DismissNotice(id));
        assert!(t.notice().is_none());
    }

    #[test]
    fn newer_selection_wins_over_pending_retry() {
        let mut t = Transition::default();
        let first = only_preload(apply(&mut t, remote("slow")));
        let retry = match t.handle(Event::Preloaded { request: first, ok: false }).as_slice() {
            [Effect::ScheduleRetry(r, _)] => r.clone(),
            other => panic!("expected retry, got {:?}", other),
        };

        let custom = BackgroundSettings::custom("data:image/png;base64,AAAA".into());
        let second = only_preload(apply(&mut t, custom.clone()));

        // The retry timer of the old selection fires afterwards and is ignored.
        assert!(t.handle(Event::RetryDue(retry.clone())).is_empty());
        assert!(t.handle(Event::Preloaded { request: retry, ok: true }).is_empty());

        succeed(&mut t, second);
        assert_eq!(t.displayed(), &custom.source());
    }

    #[test]
    fn late_result_of_superseded_load_is_not_kept_for_swap() {
        let mut t = Transition::default();
        let slow = only_preload(apply(&mut t, remote("slow")));
        let custom = BackgroundSettings::custom("data:image/png;base64,AAAA".into());
        let fast = only_preload(apply(&mut t, custom.clone()));

        // Mirrors the view layer: only the image whose swap is armed is kept.
        let mut kept = None;
        let effects = t.handle(Event::Preloaded { request: fast.clone(), ok: true });
        if swap_scheduled_for(&effects, fast.generation) {
            kept = Some(fast.generation);
        }

        // The slow image decodes inside the swap delay.
        let effects = t.handle(Event::Preloaded { request: slow.clone(), ok: true });
        assert!(!swap_scheduled_for(&effects, slow.generation));
        if swap_scheduled_for(&effects, slow.generation) {
            kept = Some(slow.generation);
        }

        assert_eq!(kept, Some(fast.generation));
        assert_eq!(t.handle(Event::SwapDue(fast)), vec![Effect::StartFade]);
        assert_eq!(t.displayed(), &custom.source());
    }

    #[test]
    fn switching_back_to_displayed_cancels_pending_load() {
        let mut t = Transition::default();
        let pending = only_preload(apply(&mut t, remote("a")));
        assert!(apply(&mut t, BackgroundSettings::default()).is_empty());
        assert!(!t.is_loading());
        assert!(t.handle(Event::Preloaded { request: pending, ok: true }).is_empty());
        assert_eq!(t.displayed(), &ImageSource::Default);
    }

    #[test]
    fn any_switch_sequence_settles_on_last_selection() {
        let selections = [
            remote("a"),
            BackgroundSettings::default(),
            BackgroundSettings::custom("data:image/png;base64,AAAA".into()),
            remote("b"),
        ];
        let mut t = Transition::default();
        let mut pending = Vec::new();
        for settings in &selections {
            for effect in apply(&mut t, settings.clone()) {
                if let Effect::Preload(req) = effect {
                    pending.push(req);
                }
            }
        }
        // Results arrive in arbitrary order after all selections were made.
        pending.reverse();
        for req in pending {
            for effect in t.handle(Event::Preloaded { request: req, ok: true }) {
                if let Effect::ScheduleSwap(r, _) = effect {
                    t.handle(Event::SwapDue(r));
                }
            }
        }
        assert_eq!(t.displayed(), &selections.last().unwrap().source());
    }
}
