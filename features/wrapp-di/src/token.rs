use std::{
    any::TypeId,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::atomic::{self, AtomicU64},
};

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(0);

/// Key under which a provider is registered in the container
///
/// There are three flavours:
/// - [`InjectionToken::of`] keys a provider by a Rust type
/// - [`InjectionToken::named`] keys it by a string, two tokens with the same name are equal
/// - [`InjectionToken::symbol`] creates a token which is unique for the whole process,
///   even if another symbol carries the same description
#[derive(Clone, Copy)]
pub struct InjectionToken {
    description: &'static str,
    key: TokenKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum TokenKey {
    Type(TypeId),
    Name(&'static str),
    Symbol(u64),
}

impl InjectionToken {
    /// Token identifying a provider by the type it supplies
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            description: std::any::type_name::<T>(),
            key: TokenKey::Type(TypeId::of::<T>()),
        }
    }

    /// Token identifying a provider by name
    pub const fn named(name: &'static str) -> Self {
        Self {
            description: name,
            key: TokenKey::Name(name),
        }
    }

    /// Creates a new token no other token will ever be equal to
    ///
    /// The description is only used for display purposes.
    pub fn symbol(description: &'static str) -> Self {
        let id = NEXT_SYMBOL.fetch_add(1, atomic::Ordering::Relaxed);
        Self {
            description,
            key: TokenKey::Symbol(id),
        }
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self.key, TokenKey::Symbol(_))
    }
}

impl PartialEq for InjectionToken {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for InjectionToken {}

impl Hash for InjectionToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for InjectionToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for InjectionToken {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for InjectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            TokenKey::Symbol(_) => write!(f, "Symbol({})", self.description),
            TokenKey::Type(_) | TokenKey::Name(_) => f.write_str(self.description),
        }
    }
}

impl fmt::Debug for InjectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InjectionToken")
            .field(&format_args!("{self}"))
            .finish()
    }
}
