use chrono::{DateTime, Local, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Minimum spacing between two automatic daily-image refresh attempts.
pub const AUTO_REFRESH_COOLDOWN: Duration = Duration::from_secs(60);

/// Daily reset minute: the remote image is refreshed once when the clock enters it.
const RESET_MINUTE_START: (u32, u32) = (0, 10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundMode {
    #[default]
    Default,
    DailyRemote,
    Custom,
}

impl BackgroundMode {
    pub const ALL: &'static [BackgroundMode] = &[
        BackgroundMode::Default,
        BackgroundMode::DailyRemote,
        BackgroundMode::Custom,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackgroundSettings {
    pub mode: BackgroundMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refreshed_at: Option<DateTime<Local>>,
}

impl BackgroundSettings {
    pub fn custom(data_url: String) -> Self {
        Self {
            mode: BackgroundMode::Custom,
            image_reference: Some(data_url),
            last_refreshed_at: None,
        }
    }

    /// Every non-default mode must carry an image reference.
    pub fn is_valid(&self) -> bool {
        match self.mode {
            BackgroundMode::Default => true,
            BackgroundMode::DailyRemote | BackgroundMode::Custom => self
                .image_reference
                .as_deref()
                .is_some_and(|r| !r.is_empty()),
        }
    }

    pub fn source(&self) -> ImageSource {
        match (self.mode, self.image_reference.as_deref()) {
            (BackgroundMode::DailyRemote, Some(url)) => ImageSource::Remote(url.to_string()),
            (BackgroundMode::Custom, Some(data)) => ImageSource::Embedded(data.to_string()),
            _ => ImageSource::Default,
        }
    }
}

/// Logical identity of a displayable image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub enum ImageSource {
    #[default]
    Default,
    Remote(String),
    Embedded(String),
}

impl ImageSource {
    /// Short description for logs; data URLs can be megabytes long.
    pub fn describe(&self) -> String {
        match self {
            Self::Default => "built-in default".to_string(),
            Self::Remote(url) => url.clone(),
            Self::Embedded(data) => format!("embedded image ({} bytes)", data.len()),
        }
    }
}

/// Outcome of a mode selection: the new settings plus whether the reload is forced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub settings: BackgroundSettings,
    pub forced: bool,
}

/// Compute new background settings for a mode selection.
///
/// Returns `None` when `Custom` is selected but no custom image exists yet; the
/// caller must run the upload step first.
pub fn resolve(
    mode: BackgroundMode,
    prior: &BackgroundSettings,
    force_refresh: bool,
    now: DateTime<Local>,
    daily_url: &str,
) -> Option<Resolved> {
    match mode {
        BackgroundMode::Default => Some(Resolved {
            settings: BackgroundSettings::default(),
            forced: false,
        }),
        BackgroundMode::DailyRemote => {
            let url = if force_refresh {
                cache_busted(daily_url, now)
            } else {
                daily_url.to_string()
            };
            Some(Resolved {
                settings: BackgroundSettings {
                    mode: BackgroundMode::DailyRemote,
                    image_reference: Some(url),
                    last_refreshed_at: Some(now),
                },
                forced: force_refresh,
            })
        }
        BackgroundMode::Custom => match (prior.mode, &prior.image_reference) {
            (BackgroundMode::Custom, Some(data)) if !data.is_empty() => Some(Resolved {
                settings: BackgroundSettings::custom(data.clone()),
                forced: false,
            }),
            _ => None,
        },
    }
}

fn cache_busted(url: &str, now: DateTime<Local>) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, sep, now.timestamp_millis())
}

/// Whether the daily remote image is due for an automatic refresh.
pub fn should_refresh(last_refreshed_at: Option<DateTime<Local>>, now: DateTime<Local>) -> bool {
    let Some(last) = last_refreshed_at else {
        return true;
    };

    if last.date_naive() != now.date_naive() {
        return true;
    }

    let (h, m) = RESET_MINUTE_START;
    let reset = NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
    let reset_end = reset + TimeDelta::minutes(1);
    let in_window = now.time() >= reset && now.time() < reset_end;

    in_window && last.time() < reset
}

/// Rate limiter for automatic refresh attempts.
#[derive(Debug, Default)]
pub struct AutoRefreshGate {
    last_attempt: Option<Instant>,
}

impl AutoRefreshGate {
    /// Record an attempt at `now` if the cooldown has elapsed since the previous one.
    pub fn try_begin(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < AUTO_REFRESH_COOLDOWN {
                return false;
            }
        }
        self.last_attempt = Some(now);
        true
    }
}
