// Error types shared by both controller families

/// Failures reported by a CAN device implementation.
///
/// The transport is not part of this crate; these are surfaced unchanged to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BusError {
    #[error("Timeout waiting for response from device {id}")]
    Timeout { id: u8 },

    #[error("Device {id} not found on the CAN bus")]
    DeviceNotFound { id: u8 },

    #[error("Device {id} rejected the request: {reason}")]
    Rejected { id: u8, reason: String },
}

pub type BusResult<T> = std::result::Result<T, BusError>;

/// Errors raised by smart motors and followers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotorError {
    #[error("Gear {gear} is not configured for motor {motor}")]
    UnknownGear { motor: String, gear: u32 },

    #[error("Gear {gear} is configured more than once for motor {motor}")]
    DuplicateGear { motor: String, gear: u32 },

    #[error("Motor {motor} has a feedback device but no encoder CPR")]
    MissingEncoderCpr { motor: String },

    #[error("Motor {motor} has no encoder to convert {what}")]
    NoEncoder { motor: String, what: &'static str },

    #[error("Follower on port {port} is already bound to master {master}")]
    FollowerAlreadyBound { port: u8, master: u8 },

    #[error("Follower on port {port} cannot follow a {master} master")]
    IncompatibleFollower { port: u8, master: &'static str },

    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
}

pub type Result<T> = std::result::Result<T, MotorError>;
