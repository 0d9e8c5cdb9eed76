//! The cost of one implicit conversion sequence, and its ordering.
//!
//! A [`Cost`] is created fresh per conversion attempt and accumulates the
//! outcome as the stages run: the rank, the per-level qualification
//! adjustments, the inheritance distance traversed, and the user-defined
//! conversion chosen (if any). Competing candidates are ranked with
//! [`Cost::compare_to`]; "no conversion exists" is the [`Rank::NoMatch`]
//! value, never an error.

use std::cmp::Ordering;

use cxxconv_types::{ClassId, TypeId};
use smallvec::SmallVec;

/// Discrete conversion goodness, best to worst. The ordering is the derived
/// one, with one exception handled in [`Cost::compare_to`]: a pointer-to-bool
/// conversion sits in the same family as `Conversion` but loses direct ties
/// against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Identity,
    LvalueTransformation,
    Promotion,
    Conversion,
    ConversionPtrBool,
    UserDefined,
    Ellipsis,
    NoMatch,
}

impl Rank {
    /// Rank used for the primary comparison. Pointer-to-bool collapses into
    /// the conversion family; the tie against plain `Conversion` is broken
    /// separately.
    fn family(self) -> Rank {
        match self {
            Rank::ConversionPtrBool => Rank::Conversion,
            other => other,
        }
    }
}

/// The constructor or conversion operator a user-defined conversion chose,
/// identified by its position in the owning class's candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDefinedConversion {
    Constructor { class: ClassId, index: usize },
    Operator { class: ClassId, index: usize },
}

/// Const/volatile additions at one indirection level, decoded from the
/// packed adjustment word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualificationStep {
    pub const_added: bool,
    pub volatile_added: bool,
}

#[derive(Debug, Clone)]
pub struct Cost {
    /// Source type, possibly rewritten mid-computation (array decay,
    /// pointer-to-void synthesis, derived-to-base pointer adjustment).
    pub source: TypeId,
    pub target: TypeId,
    rank: Rank,
    /// Packed 2-bit groups, one per indirection level walked by the
    /// qualification conversion. The innermost (leaf) level occupies the
    /// lowest bits; each enclosing pointer level the next group up.
    qualification_adjustment: u32,
    inheritance_distance: u32,
    user_defined: Option<UserDefinedConversion>,
    ambiguous_udc: bool,
    deferred_udc: bool,
}

impl Cost {
    pub fn new(source: TypeId, target: TypeId, rank: Rank) -> Cost {
        Cost {
            source,
            target,
            rank,
            qualification_adjustment: 0,
            inheritance_distance: 0,
            user_defined: None,
            ambiguous_udc: false,
            deferred_udc: false,
        }
    }

    pub fn no_match(source: TypeId, target: TypeId) -> Cost {
        Cost::new(source, target, Rank::NoMatch)
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn set_rank(&mut self, rank: Rank) {
        self.rank = rank;
    }

    /// Whether this cost represents a viable conversion at all.
    pub fn converts(&self) -> bool {
        self.rank != Rank::NoMatch
    }

    pub fn inheritance_distance(&self) -> u32 {
        self.inheritance_distance
    }

    pub fn set_inheritance_distance(&mut self, distance: u32) {
        self.inheritance_distance = distance;
    }

    pub fn qualification_adjustment(&self) -> u32 {
        self.qualification_adjustment
    }

    pub fn set_qualification_adjustment(&mut self, packed: u32) {
        self.qualification_adjustment = packed;
    }

    pub fn user_defined(&self) -> Option<UserDefinedConversion> {
        self.user_defined
    }

    pub fn set_user_defined(&mut self, udc: UserDefinedConversion) {
        self.user_defined = Some(udc);
    }

    /// Set when two user-defined conversion candidates tied exactly; an
    /// ambiguous result is never a usable winner.
    pub fn is_ambiguous_udc(&self) -> bool {
        self.ambiguous_udc
    }

    pub fn set_ambiguous_udc(&mut self, ambiguous: bool) {
        self.ambiguous_udc = ambiguous;
    }

    /// Set on the placeholder returned when user-defined conversion
    /// evaluation was deliberately postponed to break recursive overload
    /// resolution.
    pub fn is_deferred_udc(&self) -> bool {
        self.deferred_udc
    }

    pub fn set_deferred_udc(&mut self, deferred: bool) {
        self.deferred_udc = deferred;
    }

    /// Decode the packed adjustment word, innermost level first. Levels
    /// beyond the last entry gained nothing. Used by callers that want
    /// human-readable diagnostics of where const/volatile was added.
    pub fn qualification_steps(&self) -> SmallVec<[QualificationStep; 8]> {
        let mut steps = SmallVec::new();
        let mut packed = self.qualification_adjustment;
        while packed != 0 {
            steps.push(QualificationStep {
                const_added: packed & 0b01 != 0,
                volatile_added: packed & 0b10 != 0,
            });
            packed >>= 2;
        }
        steps
    }

    /// The rank family used for comparison. A cost that went through a
    /// user-defined conversion keeps the rank of its second standard
    /// conversion step but competes as user-defined.
    fn effective_family(&self) -> Rank {
        if self.user_defined.is_some() || self.deferred_udc {
            Rank::UserDefined
        } else {
            self.rank.family()
        }
    }

    /// Rank this cost against a competitor: `Less` means `self` is the
    /// better conversion. Equal ranks fall through to inheritance distance,
    /// then to the qualification-adjustment subset rule (needing strictly
    /// fewer additions wins; incomparable sets tie).
    pub fn compare_to(&self, other: &Cost) -> Ordering {
        let family = self.effective_family().cmp(&other.effective_family());
        if family != Ordering::Equal {
            return family;
        }

        if self.effective_family() == Rank::UserDefined {
            // A deferred placeholder is indistinguishable from any resolved
            // user-defined conversion.
            if self.deferred_udc || other.deferred_udc {
                return Ordering::Equal;
            }
        }

        // Within the conversion family, plain conversion beats pointer-to-bool.
        match (self.rank, other.rank) {
            (Rank::Conversion, Rank::ConversionPtrBool) => return Ordering::Less,
            (Rank::ConversionPtrBool, Rank::Conversion) => return Ordering::Greater,
            _ => {}
        }

        let distance = self.inheritance_distance.cmp(&other.inheritance_distance);
        if distance != Ordering::Equal {
            return distance;
        }

        let diff = self.qualification_adjustment ^ other.qualification_adjustment;
        if diff != 0 {
            if self.qualification_adjustment & diff == 0 {
                return Ordering::Less;
            }
            if other.qualification_adjustment & diff == 0 {
                return Ordering::Greater;
            }
        }
        Ordering::Equal
    }
}
