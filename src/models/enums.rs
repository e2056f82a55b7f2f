use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no-show",
});

impl AppointmentStatus {
    /// Position in the lifecycle. Transitions only move to a higher ordinal.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Scheduled => 0,
            Self::Confirmed => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
            Self::NoShow => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }
}

str_enum!(LabResultStatus {
    Normal => "normal",
    Abnormal => "abnormal",
    Critical => "critical",
    Pending => "pending",
});

str_enum!(MedicationStatus {
    Active => "active",
    Discontinued => "discontinued",
    Completed => "completed",
    OnHold => "on_hold",
});

str_enum!(SenderType {
    Patient => "patient",
    Provider => "provider",
});

str_enum!(MessagePriority {
    Low => "low",
    Normal => "normal",
    High => "high",
    Urgent => "urgent",
});

str_enum!(AlertSeverity {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn appointment_status_round_trip() {
        for (variant, s) in [
            (AppointmentStatus::Scheduled, "scheduled"),
            (AppointmentStatus::Confirmed, "confirmed"),
            (AppointmentStatus::Completed, "completed"),
            (AppointmentStatus::Cancelled, "cancelled"),
            (AppointmentStatus::NoShow, "no-show"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AppointmentStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn appointment_status_ordering() {
        assert!(AppointmentStatus::Scheduled.ordinal() < AppointmentStatus::Confirmed.ordinal());
        assert!(AppointmentStatus::Confirmed.ordinal() < AppointmentStatus::Completed.ordinal());
        assert!(!AppointmentStatus::Scheduled.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(AppointmentStatus::NoShow.is_terminal());
    }

    #[test]
    fn lab_result_status_round_trip() {
        for (variant, s) in [
            (LabResultStatus::Normal, "normal"),
            (LabResultStatus::Abnormal, "abnormal"),
            (LabResultStatus::Critical, "critical"),
            (LabResultStatus::Pending, "pending"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(LabResultStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn medication_status_round_trip() {
        for (variant, s) in [
            (MedicationStatus::Active, "active"),
            (MedicationStatus::Discontinued, "discontinued"),
            (MedicationStatus::Completed, "completed"),
            (MedicationStatus::OnHold, "on_hold"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(MedicationStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn sender_type_round_trip() {
        assert_eq!(SenderType::Patient.as_str(), "patient");
        assert_eq!(SenderType::Provider.as_str(), "provider");
        assert_eq!(SenderType::from_str("provider").unwrap(), SenderType::Provider);
    }

    #[test]
    fn alert_severity_round_trip() {
        for (variant, s) in [
            (AlertSeverity::Info, "info"),
            (AlertSeverity::Warning, "warning"),
            (AlertSeverity::Critical, "critical"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AlertSeverity::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(AppointmentStatus::from_str("rescheduled").is_err());
        assert!(MedicationStatus::from_str("paused").is_err());
        assert!(SenderType::from_str("").is_err());
        assert!(AlertSeverity::from_str("fatal").is_err());
    }
}
