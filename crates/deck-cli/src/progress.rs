//! Terminal progress display for engine phases.

use std::cell::RefCell;

use deck_core::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{msg:24} [{bar:30.cyan/blue}] {pos}/{len}";
const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg} ({pos})";

/// A single progress bar that follows the engine from phase to phase.
///
/// A `total` of zero means the amount of work is not known yet and a spinner
/// is drawn instead of a bar.
pub struct TerminalProgress {
    bar: ProgressBar,
    label: RefCell<String>,
}

impl TerminalProgress {
    /// Draws to stderr; hidden entirely when `enabled` is false.
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::no_length()
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            label: RefCell::new(String::new()),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for TerminalProgress {
    fn report(&self, label: &str, current: usize, total: usize) {
        let mut last = self.label.borrow_mut();
        if *last != label {
            self.bar.set_style(style_for(total));
            self.bar.set_message(label.to_string());
            self.bar.reset();
            *last = label.to_string();
        }

        if total > 0 {
            self.bar.set_length(total as u64);
        }
        self.bar.set_position(current as u64);
    }
}

fn style_for(total: usize) -> ProgressStyle {
    let template = if total == 0 {
        SPINNER_TEMPLATE
    } else {
        BAR_TEMPLATE
    };
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}
