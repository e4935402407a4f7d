//! Role-based permission policy.
//!
//! One table answers every "may this role do that" question instead of
//! scattering role-string comparisons across entry points. The engine does
//! not call it itself; callers check before invoking an operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BillingError;

/// Organization member role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    /// Assigned when a profile carries no role.
    #[default]
    Accountant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Accountant => "accountant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "accountant" => Ok(Self::Accountant),
            other => Err(BillingError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewDashboard,
    ViewUsers,
    ManageUsers,
    ManageClients,
    ManageProducts,
    ViewInvoices,
    CreateInvoice,
    EditInvoice,
    DeleteInvoice,
    RecordPayment,
    ViewPayments,
    ViewReports,
    ManageSettings,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Self::ViewDashboard,
        Self::ViewUsers,
        Self::ManageUsers,
        Self::ManageClients,
        Self::ManageProducts,
        Self::ViewInvoices,
        Self::CreateInvoice,
        Self::EditInvoice,
        Self::DeleteInvoice,
        Self::RecordPayment,
        Self::ViewPayments,
        Self::ViewReports,
        Self::ManageSettings,
    ];
}

/// Whether `role` may perform `action`.
pub fn can_perform(role: Role, action: Action) -> bool {
    use Action::*;
    match role {
        Role::SuperAdmin => true,
        // Admins see the user list but cannot change it
        Role::Admin => !matches!(action, ManageUsers | ManageSettings),
        Role::Accountant => matches!(
            action,
            ViewDashboard
                | ViewInvoices
                | CreateInvoice
                | EditInvoice
                | RecordPayment
                | ViewPayments
                | ViewReports
        ),
    }
}
