use serde::Deserialize;
use std::time::{Duration, Instant};

pub const MIN_INTERVAL_SECS: u32 = 5;
pub const MAX_INTERVAL_SECS: u32 = 3600;
pub const DEFAULT_INTERVAL_SECS: u32 = 60;

const PLACEHOLDER: &str = ":D 一言获取中...";

pub fn interval_in_range(secs: u32) -> bool {
    (MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&secs)
}

pub fn clamp_interval(secs: u32) -> u32 {
    secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
}

/// Body returned by the quote endpoint; extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Quote {
    #[serde(rename = "hitokoto")]
    pub text: String,
    #[serde(rename = "from", default)]
    pub attribution: String,
}

#[derive(Debug, Clone)]
pub struct QuoteState {
    pub text: String,
    pub attribution: String,
    pub loading: bool,
}

impl Default for QuoteState {
    fn default() -> Self {
        Self {
            text: PLACEHOLDER.to_string(),
            attribution: String::new(),
            loading: false,
        }
    }
}

impl QuoteState {
    /// Apply a fetch result; failures keep the current quote.
    pub fn finish(&mut self, result: Option<Quote>) {
        self.loading = false;
        if let Some(quote) = result {
            self.text = quote.text;
            self.attribution = quote.attribution;
        }
    }
}

/// Schedules quote fetches on a fixed period.
#[derive(Debug, Clone)]
pub struct QuoteTicker {
    interval_secs: u32,
    next_due: Option<Instant>,
}

impl QuoteTicker {
    pub fn new(interval_secs: u32) -> Self {
        Self {
            interval_secs: clamp_interval(interval_secs),
            next_due: None,
        }
    }

    pub fn interval_secs(&self) -> u32 {
        self.interval_secs
    }

    fn period(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_secs))
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arm the timer. The caller fetches immediately.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period());
    }

    /// Whether a fetch is due at `now`; if so the next one is scheduled.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.period());
                true
            }
            _ => false,
        }
    }

    /// Change the period and restart the countdown from `now`.
    ///
    /// Values outside the accepted range are rejected and the old period is kept.
    pub fn set_interval(&mut self, secs: u32, now: Instant) -> bool {
        if !interval_in_range(secs) {
            return false;
        }
        self.interval_secs = secs;
        if self.next_due.is_some() {
            self.next_due = Some(now + self.period());
        }
        true
    }

    /// Clear the pending fetch; `poll` stays false until `start` is called again.
    pub fn stop(&mut self) {
        self.next_due = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_after_one_period() {
        let start = Instant::now();
        let mut ticker = QuoteTicker::new(60);
        ticker.start(start);
        assert!(!ticker.poll(start + Duration::from_secs(59)));
        assert!(ticker.poll(start + Duration::from_secs(60)));
        assert_eq!(ticker.next_due, Some(start + Duration::from_secs(120)));
    }

    #[test]
    fn interval_change_reschedules_from_now() {
        let start = Instant::now();
        let mut ticker = QuoteTicker::new(60);
        ticker.start(start);

        let change = start + Duration::from_secs(30);
        assert!(ticker.set_interval(10, change));
        // No immediate fetch.
        assert!(!ticker.poll(change));
        assert!(!ticker.poll(change + Duration::from_secs(9)));
        assert!(ticker.poll(change + Duration::from_secs(10)));
    }

    #[test]
    fn out_of_range_interval_is_rejected() {
        let start = Instant::now();
        let mut ticker = QuoteTicker::new(60);
        ticker.start(start);
        assert!(!ticker.set_interval(4, start));
        assert!(!ticker.set_interval(3601, start));
        assert_eq!(ticker.interval_secs(), 60);
        assert_eq!(ticker.next_due, Some(start + Duration::from_secs(60)));
        assert!(ticker.set_interval(5, start));
        assert!(ticker.set_interval(3600, start));
    }

    #[test]
    fn stopped_ticker_never_fires() {
        let start = Instant::now();
        let mut ticker = QuoteTicker::new(5);
        ticker.start(start);
        ticker.stop();
        assert!(!ticker.is_running());
        assert!(!ticker.poll(start + Duration::from_secs(3600)));
    }

    #[test]
    fn failed_fetch_keeps_stale_quote() {
        let mut state = QuoteState::default();
        state.loading = true;
        state.finish(Some(Quote {
            text: "知行合一".into(),
            attribution: "传习录".into(),
        }));
        state.loading = true;
        state.finish(None);
        assert!(!state.loading);
        assert_eq!(state.text, "知行合一");
        assert_eq!(state.attribution, "传习录");
    }

    #[test]
    fn parses_endpoint_body() {
        let body = r#"{"id":1,"hitokoto":"学而不思则罔","type":"k","from":"论语","from_who":null,"creator":"x","creator_uid":1,"reviewer":0,"uuid":"u","created_at":"1"}"#;
        let quote: Quote = serde_json::from_str(body).unwrap();
        assert_eq!(quote.text, "学而不思则罔");
        assert_eq!(quote.attribution, "论语");
    }
}
