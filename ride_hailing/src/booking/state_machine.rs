//! Booking transition table.
//!
//! Every status change of a booking is validated here and nowhere else.

use super::{
    errors::{BookingError, BookingResult},
    models::{ActorRole, BookingStatus},
};

use ActorRole::{Admin, Driver, Rider};
use BookingStatus::{Accepted, Cancelled, Completed, Pending, Started};

/// `(from, to, roles allowed to request it)`
const TRANSITIONS: &[(BookingStatus, BookingStatus, &[ActorRole])] = &[
    (Pending, Accepted, &[Driver]),
    (Pending, Cancelled, &[Rider, Driver, Admin]),
    (Accepted, Started, &[Driver]),
    (Accepted, Cancelled, &[Rider, Driver, Admin]),
    (Started, Completed, &[Driver]),
];

/// Roles allowed to move a booking from `from` to `to`, if the edge exists
pub fn allowed_roles(from: BookingStatus, to: BookingStatus) -> Option<&'static [ActorRole]> {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, roles)| *roles)
}

/// Validate a requested transition
///
/// # Errors
///
/// * `BookingError::InvalidTransition` - No such edge, or the role may not take it
pub fn check_transition(
    from: BookingStatus,
    to: BookingStatus,
    role: ActorRole,
) -> BookingResult<()> {
    match allowed_roles(from, to) {
        Some(roles) if roles.contains(&role) => Ok(()),
        _ => Err(BookingError::InvalidTransition { from, to, role }),
    }
}

/// Statuses reachable in one step from `from`
pub fn next_statuses(from: BookingStatus) -> impl Iterator<Item = BookingStatus> {
    TRANSITIONS
        .iter()
        .filter(move |(f, _, _)| *f == from)
        .map(|(_, t, _)| *t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [BookingStatus; 5] = [Pending, Accepted, Started, Completed, Cancelled];
    const ALL_ROLES: [ActorRole; 3] = [Rider, Driver, Admin];

    #[test]
    fn test_driver_lifecycle() {
        assert!(check_transition(Pending, Accepted, Driver).is_ok());
        assert!(check_transition(Accepted, Started, Driver).is_ok());
        assert!(check_transition(Started, Completed, Driver).is_ok());
    }

    #[test]
    fn test_anyone_cancels_before_start() {
        for role in ALL_ROLES {
            assert!(check_transition(Pending, Cancelled, role).is_ok());
            assert!(check_transition(Accepted, Cancelled, role).is_ok());
        }
    }

    #[test]
    fn test_started_cannot_be_cancelled() {
        for role in ALL_ROLES {
            let err = check_transition(Started, Cancelled, role).unwrap_err();
            assert!(matches!(
                err,
                BookingError::InvalidTransition {
                    from: Started,
                    to: Cancelled,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_riders_and_admins_cannot_drive() {
        for role in [Rider, Admin] {
            assert!(check_transition(Pending, Accepted, role).is_err());
            assert!(check_transition(Accepted, Started, role).is_err());
            assert!(check_transition(Started, Completed, role).is_err());
        }
    }

    #[test]
    fn test_exactly_the_table_is_allowed() {
        let mut allowed = 0;
        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                for role in ALL_ROLES {
                    if check_transition(from, to, role).is_ok() {
                        allowed += 1;
                    }
                }
            }
        }
        // 1 + 3 + 1 + 3 + 1
        assert_eq!(allowed, 9);
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for status in ALL_STATUSES {
            assert_eq!(status.is_terminal(), next_statuses(status).next().is_none());
        }
    }
}
