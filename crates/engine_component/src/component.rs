//! Core [`Component`] trait, type identity, and component type lists.
//!
//! Every value stored in a pool or tag slot must implement [`Component`]. The
//! trait requires serde support so that snapshot archives can encode values
//! in whatever physical format they choose.
//!
//! ## Type Identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! FNV-1a 64-bit. It is deterministic across builds and languages, which lets
//! snapshot stage headers name a type without relying on `std::any::TypeId`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A unique identifier for a component type, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] from a component's string name.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

impl std::fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// The core component trait.
///
/// `Clone` is required because in-memory archives keep their own copy of
/// every value a snapshot emits.
///
/// # Examples
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use engine_component::Component;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Clone + Send + Sync + 'static + Serialize + DeserializeOwned {
    /// A human-readable, stable name for this component type.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}

macro_rules! primitive_components {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Component for $ty {
                fn type_name() -> &'static str {
                    stringify!($ty)
                }
            }
        )*
    };
}

primitive_components!(bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String);

/// Callback invoked once per type of a [`ComponentSet`], in declaration order.
pub trait TypeVisitor {
    /// Error type that aborts the visit.
    type Error;

    /// Visit component type `T`.
    fn visit<T: Component>(&mut self) -> Result<(), Self::Error>;
}

/// An ordered list of component types: a single [`Component`] or a tuple of
/// up to eight of them.
///
/// Snapshot stages take a `ComponentSet` so that `component::<(A, B)>()`
/// processes `A` then `B`.
pub trait ComponentSet {
    /// Visit every type of the set in order, stopping at the first error.
    fn visit_types<V: TypeVisitor>(visitor: &mut V) -> Result<(), V::Error>;
}

impl<T: Component> ComponentSet for T {
    fn visit_types<V: TypeVisitor>(visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit::<T>()
    }
}

macro_rules! tuple_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn visit_types<V: TypeVisitor>(visitor: &mut V) -> Result<(), V::Error> {
                $(visitor.visit::<$name>()?;)+
                Ok(())
            }
        }
    };
}

tuple_component_set!(A);
tuple_component_set!(A, B);
tuple_component_set!(A, B, C);
tuple_component_set!(A, B, C, D);
tuple_component_set!(A, B, C, D, E);
tuple_component_set!(A, B, C, D, E, F);
tuple_component_set!(A, B, C, D, E, F, G);
tuple_component_set!(A, B, C, D, E, F, G, H);
