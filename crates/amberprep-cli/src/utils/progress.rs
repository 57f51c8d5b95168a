use amberprep::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct SpinnerState {
    pb: ProgressBar,
    phase: &'static str,
}

#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<SpinnerState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner()
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.disable_steady_tick();
        pb.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(SpinnerState { pb, phase: "" })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut guard) = state.lock() else {
                warn!("Progress spinner mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    guard.phase = name;
                    guard.pb.reset();
                    guard.pb.set_style(Self::spinner_style());
                    guard
                        .pb
                        .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    guard.pb.set_message(name.to_string());
                }
                Progress::PhaseFinish => {
                    guard.pb.disable_steady_tick();
                    guard.pb.finish_with_message(format!("✓ {}", guard.phase));
                }
                Progress::ToolStart { tool } => {
                    let message = format!("{}: running {}", guard.phase, tool);
                    guard.pb.set_message(message);
                }
                Progress::ToolFinish => {
                    let phase = guard.phase.to_string();
                    guard.pb.set_message(phase);
                }
                Progress::Message(msg) => {
                    if guard.pb.is_finished() {
                        guard.pb.set_message(msg);
                    } else {
                        guard.pb.println(format!("  {}", msg));
                    }
                }
            }
        })
    }

    /// Hides the spinner while `f` talks to the terminal.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        match self.state.lock() {
            Ok(guard) => guard.pb.suspend(f),
            Err(_) => f(),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::new();
        let state = handler.state.lock().unwrap();
        assert!(state.pb.is_finished());
        assert_eq!(state.phase, "");
    }

    #[test]
    fn callback_tracks_phase_and_tool() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Resolving" });
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.pb.message(), "Resolving");
            assert!(!state.pb.is_finished());
        }

        callback(Progress::ToolStart {
            tool: "antechamber",
        });
        assert_eq!(
            handler.state.lock().unwrap().pb.message(),
            "Resolving: running antechamber"
        );

        callback(Progress::ToolFinish);
        assert_eq!(handler.state.lock().unwrap().pb.message(), "Resolving");

        callback(Progress::PhaseFinish);
        {
            let state = handler.state.lock().unwrap();
            assert!(state.pb.is_finished());
            assert_eq!(state.pb.message(), "✓ Resolving");
        }
    }

    #[test]
    fn suspend_returns_closure_result() {
        let handler = CliProgressHandler::new();
        assert_eq!(handler.suspend(|| 42), 42);
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Building topology",
            });
            callback(Progress::Message("tleap finished".to_string()));
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let state = handler.state.lock().unwrap();
        assert!(state.pb.is_finished());
        assert_eq!(state.pb.message(), "✓ Building topology");
    }
}
