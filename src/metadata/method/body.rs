//! Method bodies and decoded instructions.
//!
//! Bodies are handed over by the module reader already decoded: every instruction
//! carries its byte offset, its mnemonic and an [`Operand`] whose metadata tokens have
//! been replaced by the references they point to.

use std::fmt;

use crate::metadata::{method::MethodRefRc, typesystem::TypeRefRc};

/// A reference to a field, as found in `ldfld` / `stfld` style instructions
#[derive(Debug, Clone)]
pub struct FieldRef {
    /// Type declaring the field
    pub declaring_type: TypeRefRc,
    /// Name of the field
    pub name: String,
    /// Type of the field
    pub field_type: TypeRefRc,
}

/// The operand of a decoded instruction
#[derive(Debug, Clone)]
pub enum Operand {
    /// No operand
    None,
    /// A type token (`newarr`, `castclass`, `box`, `ldtoken`, ...)
    Type(TypeRefRc),
    /// A method token (`call`, `callvirt`, `newobj`, `ldftn`, ...)
    Method(MethodRefRc),
    /// A field token
    Field(FieldRef),
    /// Index of a local variable
    Local(u16),
    /// Index of a method argument
    Argument(u16),
    /// Absolute branch target offset
    Target(u32),
    /// Branch targets of a `switch`
    Switch(Vec<u32>),
    /// Integer immediate
    Int(i64),
    /// Floating point immediate
    Float(f64),
    /// String literal (`ldstr`)
    String(String),
}

impl Operand {
    /// Encoded size of the operand in bytes, `None` if a switch table does not fit in `u32`
    pub fn size(&self) -> Option<u32> {
        match self {
            Operand::None => Some(0),
            Operand::Local(_) | Operand::Argument(_) => Some(2),
            Operand::Float(_) | Operand::Int(_) => Some(8),
            Operand::Switch(targets) => u32::try_from(targets.len())
                .ok()?
                .checked_mul(4)?
                .checked_add(4),
            Operand::Type(_)
            | Operand::Method(_)
            | Operand::Field(_)
            | Operand::Target(_)
            | Operand::String(_) => Some(4),
        }
    }

    /// Offset of the instruction following one with this operand at `offset`
    pub fn next_offset(&self, offset: u32) -> Option<u32> {
        offset.checked_add(1)?.checked_add(self.size()?)
    }
}

/// A single decoded instruction
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Byte offset from the start of the method body
    pub offset: u32,
    /// Instruction mnemonic, e.g. `newobj`
    pub mnemonic: String,
    /// The decoded operand
    pub operand: Operand,
}

impl Instruction {
    /// Create a new instruction
    ///
    /// ## Arguments
    /// * 'offset'   - Byte offset in the method body
    /// * 'mnemonic' - The instruction mnemonic
    /// * 'operand'  - The decoded operand
    pub fn new(offset: u32, mnemonic: impl Into<String>, operand: Operand) -> Self {
        Instruction {
            offset,
            mnemonic: mnemonic.into(),
            operand,
        }
    }

    /// Only type and method operands lead to further types
    pub fn is_explorable(&self) -> bool {
        matches!(self.operand, Operand::Type(_) | Operand::Method(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.mnemonic)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Type(ty) => write!(f, " {}", ty.full_name()),
            Operand::Method(method) => write!(f, " {}", method.full_name()),
            Operand::Field(field) => write!(
                f,
                " {} {}::{}",
                field.field_type.full_name(),
                field.declaring_type.full_name(),
                field.name
            ),
            Operand::Local(index) | Operand::Argument(index) => write!(f, " {index}"),
            Operand::Target(target) => write!(f, " IL_{target:04x}"),
            Operand::Switch(targets) => {
                let rendered = targets
                    .iter()
                    .map(|target| format!("IL_{target:04x}"))
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, " ({rendered})")
            }
            Operand::Int(value) => write!(f, " {value}"),
            Operand::Float(value) => write!(f, " {value}"),
            Operand::String(value) => write!(f, " {value:?}"),
        }
    }
}

/// The decoded body of a method
#[derive(Debug, Clone, Default)]
pub struct MethodBody {
    /// Instructions in offset order
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    /// Create a body from already decoded instructions
    pub fn new(instructions: Vec<Instruction>) -> Self {
        MethodBody { instructions }
    }

    /// Build a body from mnemonic / operand pairs, assigning offsets from operand sizes.
    ///
    /// Offsets saturate at `u32::MAX`.
    pub fn from_operations<I, S>(operations: I) -> Self
    where
        I: IntoIterator<Item = (S, Operand)>,
        S: Into<String>,
    {
        let mut offset = 0;
        let instructions = operations
            .into_iter()
            .map(|(mnemonic, operand)| {
                let next = operand.next_offset(offset).unwrap_or(u32::MAX);
                let instruction = Instruction::new(offset, mnemonic, operand);
                offset = next;
                instruction
            })
            .collect();

        MethodBody { instructions }
    }

    /// Instructions that carry a type or method operand
    pub fn explorable(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.is_explorable())
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if the body holds no instructions
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
