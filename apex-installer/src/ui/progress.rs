//! Console rendering of the install event stream.

use super::style::{self, emoji};
use apex_workflow::InstallEvent;
use indicatif::{ProgressBar, ProgressStyle};

pub enum Renderer {
    /// Progress bar with log lines printed above it.
    Bar(ProgressBar),
    /// One line per event, for pipes and scripts.
    Plain,
}

impl Renderer {
    pub fn new(interactive: bool) -> Self {
        if !interactive {
            return Renderer::Plain;
        }
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .map(|s| s.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Renderer::Bar(bar)
    }

    pub fn render(&self, event: &InstallEvent) {
        match self {
            Renderer::Bar(bar) => match event {
                InstallEvent::Log(line) => bar.println(line),
                InstallEvent::StepStarted { index, name } => {
                    bar.set_message(format!("[{:02}] {}", index, name))
                }
                InstallEvent::Progress(pct) => bar.set_position(u64::from(*pct)),
                InstallEvent::Completed => {
                    bar.finish_with_message(style::with(emoji::SUCCESS, "Installation complete"))
                }
                InstallEvent::Failed { step_index, detail } => bar.abandon_with_message(
                    style::with(emoji::ERROR, &format!("Step {} failed: {}", step_index, detail)),
                ),
            },
            Renderer::Plain => println!("{}", plain_line(event)),
        }
    }
}

/// Text printed for `event` in plain mode.
pub fn plain_line(event: &InstallEvent) -> String {
    match event {
        InstallEvent::Log(line) => line.clone(),
        InstallEvent::StepStarted { index, name } => format!("[{:02}] {}", index, name),
        InstallEvent::Progress(pct) => format!("Progress: {}%", pct),
        InstallEvent::Completed => style::with(emoji::SUCCESS, "Installation complete"),
        InstallEvent::Failed { step_index, detail } => style::with(
            emoji::ERROR,
            &format!("Step {} failed: {}", step_index, detail),
        ),
    }
}
