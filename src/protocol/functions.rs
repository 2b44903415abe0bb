//! Function identifiers understood by the getter/setter endpoints.
//!
//! The firmware selects the configuration domain of a call by a small
//! integer sent in the `fun` field. Getter and setter codes are separate
//! namespaces: the same number means different things on each endpoint.

use std::fmt;

/// Known getter functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum GetFunction {
    GlobalSettings = 1,
    CmSystemInfo = 2,
    MultiLang = 3,
    DefaultValue = 6,
    LangSetList = 21,
    PingResult = 126,
    TracerouteResult = 128,
    WirelessBasic = 300,
}

/// Known setter functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SetFunction {
    Language = 4,
    FactoryReset = 7,
    Reboot = 8,
    Login = 15,
    Logout = 16,
    InstallDone = 20,
    RemoteAccess = 113,
    PingTest = 126,
    Traceroute = 127,
    DiagnosticsCancel = 128,
    MtuSize = 135,
}

impl GetFunction {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl SetFunction {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// A position in the getter function space.
///
/// Covers both the symbolic [`GetFunction`] codes and raw integers that
/// have no known name, which is what the function scanner probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub u32);

impl FunctionId {
    pub fn code(self) -> u32 {
        self.0
    }

    /// Next position in the dense identifier space, `None` past the end.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<GetFunction> for FunctionId {
    fn from(f: GetFunction) -> Self {
        Self(f.code())
    }
}

impl From<u32> for FunctionId {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
