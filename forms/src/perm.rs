use std::{fmt, str::FromStr, sync::Arc};

/// Read/write access to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Perms {
    read: bool,
    write: bool,
}

impl Perms {
    pub const NONE: Self = Self {
        read: false,
        write: false,
    };
    pub const READ: Self = Self {
        read: true,
        write: false,
    };
    pub const RW: Self = Self {
        read: true,
        write: true,
    };

    pub fn new(read: bool, write: bool) -> Self {
        Self { read, write }
    }

    pub fn readable(&self) -> bool {
        self.read
    }

    pub fn writable(&self) -> bool {
        self.write
    }

    pub fn intersect(self, other: Self) -> Self {
        Self {
            read: self.read && other.read,
            write: self.write && other.write,
        }
    }
}

impl Default for Perms {
    fn default() -> Self {
        Self::RW
    }
}

impl FromStr for Perms {
    type Err = String;

    /// Parses `"rw"`, `"r"`, `"w"` or `""`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut perms = Self::NONE;
        for c in s.chars() {
            match c {
                'r' => perms.read = true,
                'w' => perms.write = true,
                _ => return Err(format!("Unknown permission '{c}' in '{s}'")),
            }
        }
        Ok(perms)
    }
}

impl fmt::Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            write!(f, "r")?;
        }
        if self.write {
            write!(f, "w")?;
        }
        Ok(())
    }
}

type PermFn = dyn Fn(&str) -> Perms + Send + Sync;

/// Permissions a field offers on its own; the effective permissions are
/// always narrowed by the parent's.
#[derive(Clone, Default)]
pub enum FieldPerm {
    #[default]
    Inherit,
    Fixed(Perms),
    /// Decided per input name at accept/render time.
    Dynamic(Arc<PermFn>),
}

impl FieldPerm {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&str) -> Perms + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    pub fn available(&self, input_name: &str) -> Perms {
        match self {
            Self::Inherit => Perms::RW,
            Self::Fixed(perms) => *perms,
            Self::Dynamic(f) => f(input_name),
        }
    }

    pub fn resolve(&self, input_name: &str, parent: Perms) -> Perms {
        self.available(input_name).intersect(parent)
    }
}

impl fmt::Debug for FieldPerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => write!(f, "Inherit"),
            Self::Fixed(perms) => write!(f, "Fixed({perms})"),
            Self::Dynamic(_) => write!(f, "Dynamic"),
        }
    }
}

impl From<Perms> for FieldPerm {
    fn from(perms: Perms) -> Self {
        Self::Fixed(perms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!("rw".parse::<Perms>().unwrap(), Perms::RW);
        assert_eq!("r".parse::<Perms>().unwrap(), Perms::READ);
        assert_eq!("".parse::<Perms>().unwrap(), Perms::NONE);
        assert!("rx".parse::<Perms>().is_err());
        assert_eq!(Perms::new(false, true).to_string(), "w");
    }

    #[test]
    fn resolve_narrows_by_parent() {
        assert_eq!(FieldPerm::Inherit.resolve("a", Perms::READ), Perms::READ);
        assert_eq!(
            FieldPerm::Fixed(Perms::READ).resolve("a", Perms::RW),
            Perms::READ
        );
        assert_eq!(
            FieldPerm::Fixed(Perms::RW).resolve("a", Perms::NONE),
            Perms::NONE
        );
    }

    #[test]
    fn dynamic_sees_input_name() {
        let perm = FieldPerm::dynamic(|name| match name.starts_with("admin.") {
            true => Perms::NONE,
            false => Perms::RW,
        });
        assert!(!perm.resolve("admin.notes", Perms::RW).readable());
        assert!(perm.resolve("title", Perms::RW).writable());
    }
}
