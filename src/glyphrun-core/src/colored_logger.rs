//! Colored logging
//!
//! A tracing formatter that prefixes each event with the component it came
//! from, so engine-side progress stands apart from the front end. Everything
//! goes to stderr; stdout is reserved for recognized text.

use owo_colors::{OwoColorize, Style};
use std::fmt;
use std::io;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{
    format::{Writer, FormatEvent, FormatFields},
    FmtContext,
};
use tracing_subscriber::registry::LookupSpan;

/// Component identifier for prefixing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Main,
    Engine,
}

impl Component {
    /// Component an event target belongs to
    pub fn for_target(target: &str) -> Self {
        if target.starts_with("glyphrun_engine") {
            Component::Engine
        } else {
            Component::Main
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Main => "MAIN",
            Component::Engine => "ENGINE",
        }
    }

    pub fn color_style(&self) -> Style {
        match self {
            Component::Main => Style::new().cyan().bold(),
            Component::Engine => Style::new().magenta().bold(),
        }
    }
}

/// Width of the bracketed component tag, so messages line up.
const TAG_WIDTH: usize = "[ENGINE]".len();

fn level_style(level: Level) -> Style {
    match level {
        Level::ERROR => Style::new().red().bold(),
        Level::WARN => Style::new().yellow().bold(),
        Level::INFO => Style::new().green().bold(),
        Level::DEBUG => Style::new().blue().bold(),
        Level::TRACE => Style::new().dimmed(),
    }
}

/// Module below the crate root, e.g. `chain` for `glyphrun_engine::chain`
fn submodule(target: &str) -> Option<&str> {
    target.split_once("::").map(|(_, rest)| rest)
}

/// Formatter with component prefixes and colors
pub struct ColoredFormatter;

impl<S, N> FormatEvent<S, N> for ColoredFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let component = Component::for_target(metadata.target());
        let level = *metadata.level();

        let tag = format!("[{}]", component.as_str());
        write!(
            writer,
            "{} {:<width$} {:<5} ",
            chrono::Local::now().format("%H:%M:%S%.3f").dimmed(),
            tag.style(component.color_style()),
            level.as_str().style(level_style(level)),
            width = TAG_WIDTH,
        )?;

        if let Some(module) = submodule(metadata.target()) {
            write!(writer, "{} ", format!("{}:", module).dimmed())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the colored subscriber. `RUST_LOG` still applies on top.
pub fn init_logger(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(ColoredFormatter)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_from_target() {
        assert_eq!(Component::for_target("glyphrun_engine::chain"), Component::Engine);
        assert_eq!(Component::for_target("glyphrun_engine"), Component::Engine);
        assert_eq!(Component::for_target("glyphrun"), Component::Main);
        assert_eq!(Component::for_target("glyphrun_core::decode"), Component::Main);
    }

    #[test]
    fn test_submodule_is_shown_below_crate_root() {
        assert_eq!(submodule("glyphrun_engine::chain"), Some("chain"));
        assert_eq!(submodule("glyphrun_core::config"), Some("config"));
        assert_eq!(submodule("glyphrun"), None);
    }

    #[test]
    fn test_tag_width_fits_every_component() {
        for component in [Component::Main, Component::Engine] {
            assert!(component.as_str().len() + 2 <= TAG_WIDTH);
        }
    }
}
