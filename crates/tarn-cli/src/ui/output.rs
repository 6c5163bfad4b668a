//! Terminal logger.
//!
//! Implements the core [`Logger`] by turning every notification into a
//! [`UiEvent`] for the actor thread. Each notification is also recorded
//! through [`TracingLogger`], which the run log picks up.

use super::actor::{Outcome, UiEvent};
use std::sync::mpsc;
use tarn_core::{Logger, TracingLogger};
use tarn_schema::{Activity, PackageName};

/// A cloneable logger that forwards registry events to the UI actor.
#[derive(Debug, Clone)]
pub struct TerminalLogger {
    sender: mpsc::Sender<UiEvent>,
}

impl TerminalLogger {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: UiEvent) {
        // The actor outlives every logger; a closed channel only happens on shutdown.
        let _ = self.sender.send(event);
    }

    fn finished(&self, name: &PackageName, outcome: Outcome) {
        self.send(UiEvent::Finished {
            name: name.clone(),
            outcome,
        });
    }
}

impl Logger for TerminalLogger {
    fn package_registered(&self, name: &PackageName) {
        TracingLogger.package_registered(name);
    }

    fn package_downloaded(&self, name: &PackageName) {
        TracingLogger.package_downloaded(name);
        self.finished(name, Outcome::Downloaded);
    }

    fn package_installed(&self, name: &PackageName) {
        TracingLogger.package_installed(name);
        self.finished(name, Outcome::Installed);
    }

    fn package_removed(&self, name: &PackageName) {
        TracingLogger.package_removed(name);
        self.finished(name, Outcome::Removed);
    }

    fn package_updated(&self, name: &PackageName) {
        TracingLogger.package_updated(name);
        self.finished(name, Outcome::Updated);
    }

    fn set_state(&self, activity: Activity, name: &PackageName) {
        TracingLogger.set_state(activity, name);
        self.send(UiEvent::Started {
            name: name.clone(),
            activity,
        });
    }

    fn info(&self, msg: &str) {
        TracingLogger.info(msg);
        self.send(UiEvent::Info(msg.to_string()));
    }

    fn error(&self, msg: &str) {
        TracingLogger.error(msg);
        self.send(UiEvent::Error(msg.to_string()));
    }

    fn detail(&self, msg: &str) {
        TracingLogger.detail(msg);
        self.send(UiEvent::Detail(msg.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_forwarded_in_order() {
        let (tx, rx) = mpsc::channel();
        let logger = TerminalLogger::new(tx);
        let name = PackageName::new("geant4");

        logger.package_registered(&name);
        logger.set_state(Activity::Installing, &name);
        logger.package_installed(&name);
        logger.error("make failed");
        logger.detail("exit status 2");
        drop(logger);

        let events: Vec<UiEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0],
            UiEvent::Started { activity: Activity::Installing, .. }
        ));
        assert!(matches!(
            &events[1],
            UiEvent::Finished { outcome: Outcome::Installed, .. }
        ));
        assert!(matches!(&events[2], UiEvent::Error(msg) if msg == "make failed"));
        assert!(matches!(&events[3], UiEvent::Detail(_)));
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        TerminalLogger::new(tx).info("nobody listening");
    }
}
