//! In-process event bus between the campaign worker and the presentation layer.

use std::sync::mpsc::{channel, Receiver, Sender};

use crate::progress::event::ProgressEnvelope;
use crate::progress::reporter::{ProgressReporter, ReportError};

#[derive(Clone)]
pub struct ProgressBus {
    sender: Sender<ProgressEnvelope>,
}

impl ProgressBus {
    pub fn new_pair() -> (Self, Receiver<ProgressEnvelope>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, envelope: ProgressEnvelope) -> Result<(), ReportError> {
        self.sender
            .send(envelope)
            .map_err(|_| ReportError::Disconnected)
    }
}

impl ProgressReporter for ProgressBus {
    fn report(&self, envelope: &ProgressEnvelope) -> Result<(), ReportError> {
        self.emit(envelope.clone())
    }
}
