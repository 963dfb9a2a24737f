//! The stable `Knnnn` error-code taxonomy (spec §7). Each kind maps to
//! exactly one HTTP status and one code; unknown errors fall back to
//! `K0000`/500 rather than leaking an unmapped variant to the client.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InternalServerError,
    Timeout,
    InvalidArgument,
    Unauthorized,
    MissingCookie,
    UserNotFound,
    AlreadyLoggingIn,
    InvalidServiceId,
    SettingNotFound,
    ServiceNotFound,
    Unknown,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InternalServerError => "K0001",
            ErrorKind::Timeout => "K0002",
            ErrorKind::InvalidArgument => "K0003",
            ErrorKind::Unauthorized => "K0004",
            ErrorKind::MissingCookie => "K0005",
            ErrorKind::UserNotFound => "K0006",
            ErrorKind::AlreadyLoggingIn => "K0203",
            ErrorKind::InvalidServiceId => "K0007",
            ErrorKind::SettingNotFound => "K0008",
            ErrorKind::ServiceNotFound => "K0009",
            ErrorKind::Unknown => "K0000",
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::InternalServerError => 500,
            ErrorKind::Timeout => 408,
            ErrorKind::InvalidArgument => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::MissingCookie => 400,
            ErrorKind::UserNotFound => 404,
            ErrorKind::AlreadyLoggingIn => 409,
            ErrorKind::InvalidServiceId => 400,
            ErrorKind::SettingNotFound => 404,
            ErrorKind::ServiceNotFound => 404,
            ErrorKind::Unknown => 500,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::InternalServerError => "internal server error",
            ErrorKind::Timeout => "request timed out",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::MissingCookie => "required cookie missing",
            ErrorKind::UserNotFound => "user not found",
            ErrorKind::AlreadyLoggingIn => "a login is already in progress",
            ErrorKind::InvalidServiceId => "invalid service id",
            ErrorKind::SettingNotFound => "setting not found",
            ErrorKind::ServiceNotFound => "service not found",
            ErrorKind::Unknown => "unknown error",
        }
    }
}
