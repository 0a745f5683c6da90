//! Access-control descriptor types.

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Sections of a security descriptor to read or write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessControlSections(u8);

impl AccessControlSections {
    pub const NONE: Self = Self(0);
    /// System access-control list (auditing).
    pub const AUDIT: Self = Self(1);
    /// Discretionary access-control list.
    pub const ACCESS: Self = Self(1 << 1);
    pub const OWNER: Self = Self(1 << 2);
    pub const GROUP: Self = Self(1 << 3);
    pub const ALL: Self = Self(Self::AUDIT.0 | Self::ACCESS.0 | Self::OWNER.0 | Self::GROUP.0);

    /// Raw bit value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if the audit section is requested.
    #[must_use]
    pub const fn includes_audit(self) -> bool {
        self.contains(Self::AUDIT)
    }
}

impl BitOr for AccessControlSections {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessControlSections {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Opaque access-control descriptor.
///
/// The provider never inspects the descriptor. It only binds it into a
/// remote variable or hands it back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDescriptor {
    /// Descriptor in SDDL form.
    pub sddl: String,
    /// Sections the descriptor was read with.
    #[serde(default)]
    pub sections: AccessControlSections,
}

impl SecurityDescriptor {
    /// Create a descriptor from its SDDL form.
    #[must_use]
    pub fn new(sddl: impl Into<String>, sections: AccessControlSections) -> Self {
        Self {
            sddl: sddl.into(),
            sections,
        }
    }
}
