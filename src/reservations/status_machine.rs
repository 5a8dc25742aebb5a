use crate::reservations::ReservationStatus;

/// Service for managing reservation status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Confirmed → Cancelled, Completed
    /// - Cancelled and Completed are terminal
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: ReservationStatus, to: ReservationStatus) -> bool {
        if from == to {
            return true;
        }

        matches!(
            (from, to),
            (ReservationStatus::Confirmed, ReservationStatus::Cancelled)
                | (ReservationStatus::Confirmed, ReservationStatus::Completed)
        )
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: ReservationStatus, to: ReservationStatus) -> Result<ReservationStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}
