//! Generic `ActuatorSink` trait for the motor driver.
//!
//! The sink is the only way motor commands leave the control core, and the
//! controller in `subsume-runtime` holds the sole handle to it: one
//! arbitrated [`Action`] per cycle, never two writers.

use subsume_types::{Action, ControlError};

/// The abstract motor driver accepting high-level [`Action`] commands.
///
/// Implementations translate the closed action set into whatever pulse or
/// GPIO sequencing the physical drive needs; that translation is out of
/// core scope.
pub trait ActuatorSink: Send {
    /// Stable identifier for this drive, e.g. `"zumo_drive"`.
    fn id(&self) -> &str;

    /// Apply one motor command.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::ActuatorFault`] if the command cannot be
    /// applied.  The controller treats this as fatal: continued operation
    /// without confirmed actuator control is unsafe.
    fn apply(&mut self, action: &Action) -> Result<(), ControlError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use subsume_types::Speed;

    /// Minimal in-process sink used only for tests.
    struct MockDrive {
        id: String,
        last: Option<Action>,
    }

    impl ActuatorSink for MockDrive {
        fn id(&self) -> &str {
            &self.id
        }

        fn apply(&mut self, action: &Action) -> Result<(), ControlError> {
            self.last = Some(*action);
            Ok(())
        }
    }

    #[test]
    fn mock_drive_records_last_action() {
        let mut drive = MockDrive {
            id: "test_drive".to_string(),
            last: None,
        };
        assert_eq!(drive.id(), "test_drive");

        drive.apply(&Action::Forward(Speed::new(0.3))).unwrap();
        assert_eq!(drive.last, Some(Action::Forward(Speed::new(0.3))));

        drive.apply(&Action::Stop).unwrap();
        assert_eq!(drive.last, Some(Action::Stop));
    }
}
