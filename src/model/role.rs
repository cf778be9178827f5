#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    /// HR and admins act as reviewers: they may list and decide any request.
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }

    /// Administrative deletion is admin-only.
    pub fn can_administer(&self) -> bool {
        *self == Role::Admin
    }
}
