//! 浏览器环境下的辅助工具：控制台日志与当前时间。

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;
use web_sys::console;
use web_sys::js_sys::Date;

use crate::game::Millis;

/// 把 `log` 记录转发到浏览器控制台。
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&message),
            Level::Warn => console::warn_1(&message),
            Level::Info => console::info_1(&message),
            Level::Debug | Level::Trace => console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

/// 安装控制台日志，重复调用只会调整日志级别。
pub fn init_logging(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_err() {
        log::debug!(target: "utils", "console logger already installed");
    }
    log::set_max_level(level);
}

pub fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

pub fn now_ms() -> Millis {
    Date::now() as Millis
}
