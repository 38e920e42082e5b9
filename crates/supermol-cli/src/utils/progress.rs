use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use supermol::engine::progress::{Progress, ProgressCallback};

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Renders engine progress events on a single reusable indicatif bar:
/// phases draw a spinner, counted tasks switch to a bar, and status text
/// replaces the message in place.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: ProgressBar,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.set_style(spinner_style());
        bar.finish_and_clear();
        Self { bar }
    }

    /// Hands out the engine-facing callback. `ProgressBar` is internally
    /// reference-counted and thread-safe, so the callback may be driven from
    /// worker threads.
    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let bar = self.bar.clone();

        Box::new(move |event: Progress| match event {
            Progress::PhaseStart { name } => {
                bar.reset();
                bar.set_length(0);
                bar.set_style(spinner_style());
                bar.enable_steady_tick(SPINNER_TICK);
                bar.set_message(name);
            }
            Progress::PhaseFinish => {
                bar.disable_steady_tick();
                bar.finish_with_message("done");
            }
            Progress::TaskStart { total_steps } => {
                bar.disable_steady_tick();
                bar.reset();
                bar.set_style(bar_style());
                bar.set_length(total_steps);
            }
            Progress::TaskIncrement => bar.inc(1),
            Progress::TaskFinish => {
                if let Some(len) = bar.length() {
                    bar.set_position(len);
                }
                bar.finish();
            }
            Progress::StatusUpdate { text } => bar.set_message(text),
            Progress::Message(msg) => {
                if bar.is_finished() {
                    bar.set_message(msg);
                } else {
                    bar.println(msg);
                }
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {wide_msg}").expect("invalid spinner template")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<24} {bar:32.green/black} {pos}/{len} [{elapsed_precise}]")
        .expect("invalid bar template")
        .progress_chars("=> ")
}
