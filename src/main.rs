use cosmic::app::Settings;
use cosmic::cosmic_config::CosmicConfigEntry;
use cosmic::iced::Limits;

mod application;
mod components;
mod localize;
mod message;
mod pages;

use studyboard::config;

use application::{Board, Flags};
use config::{BoardConfig, CONFIG_VERSION};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cosmic_cfg = cosmic::cosmic_config::Config::new(application::APP_ID, CONFIG_VERSION)
        .map_err(|e| format!("failed to open config: {:?}", e))?;
    let config = BoardConfig::get_entry(&cosmic_cfg).unwrap_or_else(|(errs, cfg)| {
        for e in errs {
            eprintln!("studyboard: config entry error: {:?}", e);
        }
        cfg
    });

    // Set up logging to the systemd user journal (`journalctl --user -t studyboard -f`).
    // Wrapper filters: our targets at info/debug (per config), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                let target = metadata.target();
                if target.starts_with("studyboard")
                    || target.starts_with("application")
                    || target.starts_with("pages")
                    || target.starts_with("components")
                {
                    let max = if studyboard::debug_logging() {
                        log::LevelFilter::Debug
                    } else {
                        log::LevelFilter::Info
                    };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        studyboard::set_debug_logging(config.debug_logging);

        let journal = systemd_journal_logger::JournalLog::new()?
            .with_syslog_identifier("studyboard".to_string());
        log::set_boxed_logger(Box::new(FilteredJournal { inner: journal }))?;
        // Global max must be Debug so our debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }

    localize::localize();

    let settings = Settings::default().size_limits(Limits::NONE.min_width(640.0).min_height(480.0));

    let flags = Flags { config, cosmic_config: cosmic_cfg };
    cosmic::app::run::<Board>(settings, flags)?;

    Ok(())
}
