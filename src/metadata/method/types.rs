//! Method attribute and semantics flags.
//!
//! The flag values follow the ECMA-335 `MethodAttributes` and `MethodSemanticsAttributes`
//! encodings, so raw values coming from a binary reader can be converted with
//! `from_bits_truncate`.
//!
//! # Key Types
//! - [`MethodAttributes`]: Modifiers of a method definition
//! - [`MethodSemantics`]: The accessor role of a method (getter, setter, adder, remover)

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Method modifiers
    pub struct MethodAttributes: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// Runtime should check name encoding
        const RT_SPECIAL_NAME = 0x1000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// The role a method plays for a property or event
    pub struct MethodSemantics: u32 {
        /// Property setter
        const SETTER = 0x0001;
        /// Property getter
        const GETTER = 0x0002;
        /// Other property or event method
        const OTHER = 0x0004;
        /// Event add accessor
        const ADDER = 0x0008;
        /// Event remove accessor
        const REMOVER = 0x0010;
        /// Event raise method
        const FIRE = 0x0020;
    }
}
