//! RISC-V Privilege Modes.

/// Privilege mode levels.
///
/// Machine mode is the highest privilege level; the `Ord` derive follows the
/// numeric encoding, so `privilege <= Supervisor` tests "can this trap be
/// delegated".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrivilegeMode {
    /// User mode (U), encoding 0.
    User = 0,

    /// Supervisor mode (S), encoding 1.
    Supervisor = 1,

    /// Machine mode (M), encoding 3.
    Machine = 3,
}

impl PrivilegeMode {
    /// Converts the numeric encoding to a mode.
    ///
    /// Invalid encodings (the reserved value 2) resolve to `Machine`.
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => PrivilegeMode::User,
            1 => PrivilegeMode::Supervisor,
            _ => PrivilegeMode::Machine,
        }
    }

    /// Returns the numeric encoding of the mode (0, 1, or 3).
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns the conventional single-letter tag used in trace output.
    pub fn tag(&self) -> char {
        match self {
            PrivilegeMode::User => 'U',
            PrivilegeMode::Supervisor => 'S',
            PrivilegeMode::Machine => 'M',
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrivilegeMode::User => "User",
            PrivilegeMode::Supervisor => "Supervisor",
            PrivilegeMode::Machine => "Machine",
        };
        write!(f, "{}", name)
    }
}
