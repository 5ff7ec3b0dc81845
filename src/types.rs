use std::fmt;

use crate::util::intern::{Interned, Interner, Symbol};

/// A canonical type handle. Structurally identical types (same kind, same
/// sub-structure, same annotations) always intern to the same handle, so type
/// equality is handle equality.
pub type TypeId = Interned<TypeData>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeData {
    pub kind: TypeKind,
    pub annotations: Annotations,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Nil,
    Boolean,
    Integer,
    Character,
    Void,
    Pointer(TypeId),
    Slice(TypeId),
    Array { size: u64, element: TypeId },
    Tuple(Box<[TypeId]>),
    Function { ret: TypeId, args: Box<[TypeId]> },
    TypeVariable(Symbol),
}

/// Qualifiers attached to a type.
///
/// Annotations never take part in overload resolution or type equality
/// checks; see [`TypeInterner::unqualified`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Annotations {
    /// The value is a compile-time literal (or an aggregate of literals).
    pub literal: bool,
}

impl Annotations {
    pub const NONE: Annotations = Annotations { literal: false };
    pub const LITERAL: Annotations = Annotations { literal: true };

    pub fn is_empty(self) -> bool {
        self == Annotations::NONE
    }
}

pub struct TypeInterner {
    interner: Interner<TypeData>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        TypeInterner::with_capacity(64)
    }
}

impl TypeInterner {
    pub fn with_capacity(capacity: usize) -> TypeInterner {
        TypeInterner {
            interner: Interner::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.interner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interner.is_empty()
    }

    pub fn get(&self, ty: TypeId) -> &TypeData {
        self.interner.get(ty)
    }

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.get(ty).kind
    }

    pub fn intern(&mut self, kind: TypeKind, annotations: Annotations) -> TypeId {
        self.interner.intern(&TypeData { kind, annotations })
    }

    pub fn nil(&mut self) -> TypeId {
        self.intern(TypeKind::Nil, Annotations::NONE)
    }

    pub fn boolean(&mut self) -> TypeId {
        self.intern(TypeKind::Boolean, Annotations::NONE)
    }

    pub fn integer(&mut self) -> TypeId {
        self.intern(TypeKind::Integer, Annotations::NONE)
    }

    pub fn character(&mut self) -> TypeId {
        self.intern(TypeKind::Character, Annotations::NONE)
    }

    pub fn void(&mut self) -> TypeId {
        self.intern(TypeKind::Void, Annotations::NONE)
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Pointer(pointee), Annotations::NONE)
    }

    pub fn slice(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Slice(pointee), Annotations::NONE)
    }

    pub fn array(&mut self, size: u64, element: TypeId) -> TypeId {
        self.intern(TypeKind::Array { size, element }, Annotations::NONE)
    }

    pub fn tuple(&mut self, elements: &[TypeId]) -> TypeId {
        self.intern(TypeKind::Tuple(elements.into()), Annotations::NONE)
    }

    pub fn function(&mut self, ret: TypeId, args: &[TypeId]) -> TypeId {
        let kind = TypeKind::Function {
            ret,
            args: args.into(),
        };
        self.intern(kind, Annotations::NONE)
    }

    pub fn type_variable(&mut self, name: Symbol) -> TypeId {
        self.intern(TypeKind::TypeVariable(name), Annotations::NONE)
    }

    /// Returns the same type with the provided annotations.
    pub fn annotated(&mut self, ty: TypeId, annotations: Annotations) -> TypeId {
        let data = self.get(ty);
        if data.annotations == annotations {
            return ty;
        }
        let kind = data.kind.clone();
        self.intern(kind, annotations)
    }

    /// Strips the top-level annotations of a type. Sub-types are interned
    /// unqualified by every constructor, so this yields the purely structural
    /// type.
    pub fn unqualified(&mut self, ty: TypeId) -> TypeId {
        self.annotated(ty, Annotations::NONE)
    }

    /// Structural equality, ignoring annotations.
    pub fn same(&mut self, a: TypeId, b: TypeId) -> bool {
        a == b || self.unqualified(a) == self.unqualified(b)
    }

    pub fn is_literal(&self, ty: TypeId) -> bool {
        self.get(ty).annotations.literal
    }

    /// Whether values of this type do not fit a single register and are
    /// handled through their address.
    pub fn is_aggregate(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Array { .. } | TypeKind::Tuple(_) | TypeKind::Slice(_)
        )
    }

    /// Whether a pointer to an array may be passed where a slice of the same
    /// element type is expected.
    pub fn coerces_to_slice(&self, from: TypeId, to: TypeId) -> bool {
        let (&TypeKind::Pointer(pointee), &TypeKind::Slice(element)) = (self.kind(from), self.kind(to))
        else {
            return false;
        };
        matches!(*self.kind(pointee), TypeKind::Array { element: e, .. } if e == element)
    }

    pub fn display<'a>(&'a self, ty: TypeId, strings: &'a Interner<str>) -> DisplayType<'a> {
        DisplayType {
            types: self,
            strings,
            ty,
        }
    }
}

pub struct DisplayType<'a> {
    types: &'a TypeInterner,
    strings: &'a Interner<str>,
    ty: TypeId,
}

impl DisplayType<'_> {
    fn with(&self, ty: TypeId) -> Self {
        DisplayType { ty, ..*self }
    }
}

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.types.kind(self.ty) {
            TypeKind::Nil => f.write_str("Nil"),
            TypeKind::Boolean => f.write_str("Boolean"),
            TypeKind::Integer => f.write_str("Integer"),
            TypeKind::Character => f.write_str("Character"),
            TypeKind::Void => f.write_str("Void"),
            TypeKind::Pointer(pointee) => {
                if matches!(self.types.kind(*pointee), TypeKind::Function { .. }) {
                    write!(f, "*({})", self.with(*pointee))
                } else {
                    write!(f, "*{}", self.with(*pointee))
                }
            }
            TypeKind::Slice(pointee) => write!(f, "*[]{}", self.with(*pointee)),
            TypeKind::Array { size, element } => write!(f, "[{}; {size}]", self.with(*element)),
            TypeKind::Tuple(elements) => {
                f.write_str("(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.with(*element))?;
                }
                f.write_str(")")
            }
            TypeKind::Function { ret, args } => {
                f.write_str("(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.with(*arg))?;
                }
                write!(f, ") -> {}", self.with(*ret))
            }
            TypeKind::TypeVariable(name) => write!(f, "'{}", self.strings.get(*name)),
        }
    }
}
