//! UI Actor - Single-threaded event processing
//!
//! The registry reports progress from the main thread through a
//! [`TerminalLogger`](super::TerminalLogger); every event lands here, on one
//! thread that owns stdout, so lines never interleave.

use crossterm::style::Stylize;
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use tarn_schema::{Activity, PackageName};

/// Lifecycle outcomes worth a line of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Downloaded,
    Installed,
    Updated,
    Removed,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Downloaded => "downloaded",
            Self::Installed => "installed",
            Self::Updated => "updated",
            Self::Removed => "removed",
        }
    }
}

/// Events that can be sent to the UI actor
#[derive(Debug)]
pub enum UiEvent {
    /// A long-running step started
    Started { name: PackageName, activity: Activity },
    /// A step finished, or a package was found in that state on registration
    Finished { name: PackageName, outcome: Outcome },
    /// Print info message
    Info(String),
    /// Print error message
    Error(String),
    /// Print the detail of the previous error
    Detail(String),
    /// Synchronize UI state (wait for all pending renders)
    Sync(mpsc::Sender<()>),
    /// Shutdown the actor
    Shutdown,
}

/// Handle to the UI actor thread
#[derive(Debug)]
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    handle: Option<thread::JoinHandle<()>>,
}

impl UiActor {
    /// Spawn a new UI actor thread
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            run_event_loop(receiver);
        });

        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// Get a cloneable sender for this actor
    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }

    /// Block until every event sent so far has been rendered.
    pub fn sync(&self) {
        let (tx, rx) = mpsc::channel();
        if self.sender.send(UiEvent::Sync(tx)).is_ok() {
            let _ = rx.recv();
        }
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        // Ignore errors if already shut down
        let _ = self.sender.send(UiEvent::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// What the actor has seen so far.
#[derive(Debug, Default)]
struct UiState {
    active: Option<(PackageName, Activity)>,
    outcomes: BTreeMap<Outcome, Vec<PackageName>>,
    errors: usize,
}

impl UiState {
    fn summary(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(outcome, _)| **outcome != Outcome::Downloaded)
            .map(|(outcome, names)| {
                let count = names.len();
                format!(
                    "{count} package{} {}",
                    if count == 1 { "" } else { "s" },
                    outcome.as_str()
                )
            })
            .collect()
    }
}

/// Main event loop for the UI actor
///
/// This runs in a dedicated thread and processes all UI events sequentially.
fn run_event_loop(receiver: mpsc::Receiver<UiEvent>) {
    let mut state = UiState::default();

    loop {
        match receiver.recv() {
            Ok(UiEvent::Started { name, activity }) => {
                println!("  {} {} {}", "→".dark_grey(), activity.as_str().dark_grey(), name.as_str().bold());
                state.active = Some((name, activity));
            }
            Ok(UiEvent::Finished { name, outcome }) => {
                // Only outcomes of a step we saw start; the rest is existing state.
                if state.active.as_ref().is_some_and(|(active, _)| *active == name) {
                    if outcome != Outcome::Downloaded {
                        println!("  {} {} {}", "✓".green(), name.as_str().bold(), outcome.as_str().green());
                    }
                    state.active = None;
                    state.outcomes.entry(outcome).or_default().push(name);
                }
            }
            Ok(UiEvent::Info(msg)) => {
                println!("  {} {}", "ℹ".blue(), msg);
            }
            Ok(UiEvent::Error(msg)) => {
                state.errors += 1;
                match state.active.take() {
                    Some((name, activity)) => println!(
                        "  {} {} {} failed: {}",
                        "✗".red(),
                        activity.as_str(),
                        name.as_str().bold(),
                        msg.red()
                    ),
                    None => println!("  {} {}", "✗".red(), msg.red()),
                }
            }
            Ok(UiEvent::Detail(msg)) => {
                for line in msg.lines().filter(|l| !l.trim().is_empty()) {
                    println!("      {}", line.dark_grey());
                }
            }
            Ok(UiEvent::Sync(tx)) => {
                // All previous events are processed because of sequential mpsc
                let _ = tx.send(());
            }
            Ok(UiEvent::Shutdown) | Err(mpsc::RecvError) => {
                break;
            }
        }
    }

    let summary = state.summary();
    if !summary.is_empty() || state.errors > 0 {
        println!();
    }
    for line in summary {
        println!("  {}", line.green().bold());
    }
    if state.errors > 0 {
        let plural = if state.errors == 1 { "" } else { "s" };
        println!("  {}", format!("{} error{plural}", state.errors).red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_outcomes() {
        let mut state = UiState::default();
        state
            .outcomes
            .entry(Outcome::Installed)
            .or_default()
            .extend([PackageName::new("clhep"), PackageName::new("geant4")]);
        state
            .outcomes
            .entry(Outcome::Downloaded)
            .or_default()
            .push(PackageName::new("clhep"));
        state
            .outcomes
            .entry(Outcome::Removed)
            .or_default()
            .push(PackageName::new("root"));

        assert_eq!(state.summary(), vec!["2 packages installed", "1 package removed"]);
    }

    #[test]
    fn test_actor_sync_and_shutdown() {
        let actor = UiActor::spawn();
        let sender = actor.sender();

        sender.send(UiEvent::Info("test".to_string())).unwrap();
        sender
            .send(UiEvent::Finished {
                name: PackageName::new("root"),
                outcome: Outcome::Installed,
            })
            .unwrap();
        actor.sync();

        // Actor joins its thread when dropped
        drop(actor);
        assert!(sender.send(UiEvent::Info("late".to_string())).is_err());
    }
}
