use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::{pr_debug, pr_err, pr_info, pr_warn};

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let module_path = record.module_path().unwrap_or_default();
        match record.level() {
            Level::Error => {
                pr_err!("[ERROR] [{}] {}", module_path, record.args());
            }
            Level::Warn => {
                pr_warn!("[ WARN] [{}] {}", module_path, record.args());
            }
            Level::Info => {
                pr_info!("[ INFO] [{}] {}", module_path, record.args());
            }
            Level::Debug => {
                pr_debug!("[DEBUG] [{}] {}", module_path, record.args());
            }
            Level::Trace => {
                pr_debug!("[TRACE] [{}] {}", module_path, record.args());
            }
        };
    }
    fn flush(&self) {}
}

fn level_from_env(value: Option<&str>) -> LevelFilter {
    match value {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Routes the `log` facade to the kernel console.
///
/// The level comes from the `LOG` variable at build time. Calling this more
/// than once leaves the first logger in place.
pub fn init_logger() {
    if log::set_logger(&SimpleLogger).is_err() {
        return;
    }
    log::set_max_level(level_from_env(option_env!("LOG")));
    pr_info!("Init logger {:?}", option_env!("LOG"));
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use spin::Mutex;

    use super::*;
    use crate::print::{set_console, Console, KernLevel};

    struct Capture(Mutex<Vec<(KernLevel, String)>>);

    impl Console for Capture {
        fn write_line(&self, level: KernLevel, line: &str) {
            self.0.lock().push((level, line.into()));
        }
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    #[test]
    fn env_level_parsing() {
        assert_eq!(level_from_env(Some("DEBUG")), LevelFilter::Debug);
        assert_eq!(level_from_env(Some("ERROR")), LevelFilter::Error);
        assert_eq!(level_from_env(Some("bogus")), LevelFilter::Info);
        assert_eq!(level_from_env(None), LevelFilter::Info);
    }

    #[test]
    fn records_reach_console_with_level() {
        set_console(&CAPTURE);
        init_logger();
        init_logger();
        log::set_max_level(LevelFilter::Info);
        log::error!("could not create device {}", 7);
        let lines = CAPTURE.0.lock();
        let (level, line) = lines
            .iter()
            .find(|(_, line)| line.contains("could not create device 7"))
            .expect("error record not captured");
        assert_eq!(*level, KernLevel::Err);
        assert!(line.starts_with("[ERROR] ["));
    }
}
