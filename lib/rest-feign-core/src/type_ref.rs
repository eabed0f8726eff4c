//! Type identity and module namespaces.
//!
//! Rust has no runtime type enumeration, so declarations carry their own identity: the
//! [`TypeId`] of a concrete type plus the fully qualified name of what was declared.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reference to a type: its [`TypeId`] and fully qualified name.
///
/// Equality and hashing only consider the [`TypeId`].
#[derive(Debug, Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
}

impl TypeRef {
    /// Reference to `T`, named after [`std::any::type_name`].
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Reference to `T` under an explicit name.
    ///
    /// Generated clients use the declared trait's path, while the identity is the proxy type
    /// implementing that trait.
    #[must_use]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
        }
    }

    /// Type identity.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name, e.g. `inventory::clients::InventoryApi`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the name.
    #[must_use]
    pub fn simple_name(&self) -> &'static str {
        let name = strip_generics(self.name);
        name.rsplit_once("::").map_or(name, |(_, last)| last)
    }

    /// Module containing the type.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        let name = strip_generics(self.name);
        Namespace::new(name.rsplit_once("::").map_or("", |(module, _)| module))
    }
}

fn strip_generics(name: &str) -> &str {
    name.split_once('<').map_or(name, |(base, _)| base)
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A module path such as `inventory::clients`.
///
/// A namespace contains its own items and the items of every nested module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Creates a namespace from a `::` separated module path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self(path.trim_matches(':').to_string())
    }

    /// Module path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the item at `path` lives in this namespace or below.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        if self.0.is_empty() {
            return true;
        }
        path.strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with("::"))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod clients {
        pub struct Stock;
    }

    #[test]
    fn type_ref_names() {
        let stock = TypeRef::of::<clients::Stock>();
        assert!(stock.name().ends_with("type_ref::tests::clients::Stock"));
        assert_eq!(stock.simple_name(), "Stock");
        assert!(stock.namespace().as_str().ends_with("type_ref::tests::clients"));

        let named = TypeRef::named::<clients::Stock>("inventory::api::StockApi");
        assert_eq!(named, stock);
        assert_eq!(named.simple_name(), "StockApi");
        assert_eq!(named.namespace(), Namespace::new("inventory::api"));
    }

    #[test]
    fn generic_names_use_base_path() {
        let vec = TypeRef::of::<Vec<clients::Stock>>();
        assert_eq!(vec.simple_name(), "Vec");
        assert_eq!(vec.namespace(), Namespace::new("alloc::vec"));
        assert_ne!(vec, TypeRef::of::<clients::Stock>());
    }

    #[test]
    fn namespace_contains_nested_modules() {
        let ns = Namespace::new("inventory::clients");
        assert!(ns.contains("inventory::clients::StockApi"));
        assert!(ns.contains("inventory::clients::v2::StockApi"));
        assert!(!ns.contains("inventory::clients_old::StockApi"));
        assert!(!ns.contains("inventory::StockApi"));
        assert!(Namespace::new("").contains("anything::At::All"));
        assert_eq!(Namespace::default(), Namespace::new(""));
        assert_eq!(Namespace::new("::a::b::"), Namespace::new("a::b"));
    }
}
