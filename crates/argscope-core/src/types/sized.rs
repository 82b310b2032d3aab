//! Semantic argument types handed to the code generator.

use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar shape of a value as far as the probe code generator cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizedKind
{
    /// Two's complement integer of the given bit width.
    SignedInt(u64),
    /// Unsigned integer (including booleans and enumerations) of the given bit width.
    UnsignedInt(u64),
    /// Pointer to the nested type. `void *` nests [`SizedKind::Unsupported`].
    Pointer(Box<SizedType>),
    /// Floating point, aggregates, arrays, functions and anything else.
    Unsupported,
}

/// Compact type descriptor with function-argument bookkeeping.
///
/// Built fresh for every query and never mutated once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedType
{
    pub kind: SizedKind,
    /// Set when the value is a formal parameter of the probed function.
    pub is_funcarg: bool,
    /// 0-based position among all formal parameters, in declaration order.
    pub funcarg_idx: usize,
}

impl SizedType
{
    fn from_kind(kind: SizedKind) -> Self
    {
        Self {
            kind,
            is_funcarg: false,
            funcarg_idx: 0,
        }
    }

    #[must_use]
    pub fn signed(bits: u64) -> Self
    {
        Self::from_kind(SizedKind::SignedInt(bits))
    }

    #[must_use]
    pub fn unsigned(bits: u64) -> Self
    {
        Self::from_kind(SizedKind::UnsignedInt(bits))
    }

    #[must_use]
    pub fn pointer(inner: SizedType) -> Self
    {
        Self::from_kind(SizedKind::Pointer(Box::new(inner)))
    }

    #[must_use]
    pub fn unsupported() -> Self
    {
        Self::from_kind(SizedKind::Unsupported)
    }

    /// Tag this type as the formal parameter at position `index`.
    #[must_use]
    pub fn into_funcarg(mut self, index: usize) -> Self
    {
        self.is_funcarg = true;
        self.funcarg_idx = index;
        self
    }

    pub fn is_integer(&self) -> bool
    {
        matches!(self.kind, SizedKind::SignedInt(_) | SizedKind::UnsignedInt(_))
    }

    pub fn is_pointer(&self) -> bool
    {
        matches!(self.kind, SizedKind::Pointer(_))
    }

    pub fn is_unsupported(&self) -> bool
    {
        self.kind == SizedKind::Unsupported
    }

    /// Bit width of an integer type, `None` for everything else.
    pub fn bits(&self) -> Option<u64>
    {
        match self.kind {
            SizedKind::SignedInt(bits) | SizedKind::UnsignedInt(bits) => Some(bits),
            _ => None,
        }
    }

    /// The pointee of a pointer type.
    pub fn pointee(&self) -> Option<&SizedType>
    {
        match &self.kind {
            SizedKind::Pointer(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for SizedType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.kind {
            SizedKind::SignedInt(bits) => write!(f, "int{bits}"),
            SizedKind::UnsignedInt(bits) => write!(f, "uint{bits}"),
            SizedKind::Pointer(inner) => write!(f, "{inner} *"),
            SizedKind::Unsupported => write!(f, "none"),
        }
    }
}

/// Resolved arguments of one function, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeArgs
{
    args: BTreeMap<String, SizedType>,
}

impl ProbeArgs
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Insert an argument unless the name is already taken.
    ///
    /// Returns `false` and keeps the existing entry on a duplicate name.
    pub fn insert(&mut self, name: String, ty: SizedType) -> bool
    {
        match self.args.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(ty);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&SizedType>
    {
        self.args.get(name)
    }

    pub fn contains(&self, name: &str) -> bool
    {
        self.args.contains_key(name)
    }

    pub fn len(&self) -> usize
    {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.args.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SizedType)>
    {
        self.args.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    /// Entries sorted by argument index, i.e. declaration order.
    pub fn in_declaration_order(&self) -> Vec<(&str, &SizedType)>
    {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_key(|(_, ty)| ty.funcarg_idx);
        entries
    }
}

impl<'a> IntoIterator for &'a ProbeArgs
{
    type Item = (&'a String, &'a SizedType);
    type IntoIter = btree_map::Iter<'a, String, SizedType>;

    fn into_iter(self) -> Self::IntoIter
    {
        self.args.iter()
    }
}
