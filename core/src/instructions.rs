//! Instruction set
//!
//! The opcode byte dispatches by mask first: the high bit selects a
//! background-polygon draw and bit 6 a sprite-polygon draw, with the
//! low opcode bits folded into the instruction payload. Everything else
//! maps raw values 0..=26 to the named instructions below.
//!
//! Parsing consumes the instruction's full operand bytes and validates
//! every closed operand set up front; the executor only deals in typed
//! values. Counts that depend on runtime state (resource tables,
//! program length) are checked at execution.

use vesper_assets::GamePart;

use crate::error::MachineError;
use crate::video::{BufferSelector, Color, Point};
use crate::vm::{Program, ProgramAddress, RegisterId, THREAD_COUNT, ThreadId};

/// What the scheduler does with the current thread after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep executing within this tic.
    Continue,
    /// Save the program counter and hand the tic to the next thread.
    Yield,
    /// Clear the program counter; the thread stops until reactivated.
    Deactivate,
}

/// Comparison operator of `JumpConditional`; the named register is
/// always the left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Comparison {
    fn from_raw(raw: u8) -> Result<Self, MachineError> {
        match raw & 0x07 {
            0 => Ok(Comparison::Equal),
            1 => Ok(Comparison::NotEqual),
            2 => Ok(Comparison::Greater),
            3 => Ok(Comparison::GreaterOrEqual),
            4 => Ok(Comparison::Less),
            5 => Ok(Comparison::LessOrEqual),
            _ => Err(MachineError::InvalidJumpComparison(raw)),
        }
    }

    pub fn evaluate(self, left: i16, right: i16) -> bool {
        match self {
            Comparison::Equal => left == right,
            Comparison::NotEqual => left != right,
            Comparison::Greater => left > right,
            Comparison::GreaterOrEqual => left >= right,
            Comparison::Less => left < right,
            Comparison::LessOrEqual => left <= right,
        }
    }
}

/// Right operand of a conditional jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Constant(i16),
    Register(RegisterId),
}

/// Staged state change applied to a thread range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOperation {
    Resume,
    Pause,
    Deactivate,
}

impl ThreadOperation {
    fn from_raw(raw: u8) -> Result<Self, MachineError> {
        match raw {
            0 => Ok(ThreadOperation::Resume),
            1 => Ok(ThreadOperation::Pause),
            2 => Ok(ThreadOperation::Deactivate),
            _ => Err(MachineError::InvalidThreadOperation(raw)),
        }
    }
}

/// Source of a buffer copy: a plain selector, or a specific buffer
/// combined with the scroll register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySource {
    Selector(BufferSelector),
    Scrolled(u8),
}

impl CopySource {
    fn from_raw(raw: u8) -> Result<Self, MachineError> {
        if let Some(selector) = BufferSelector::from_raw(raw) {
            return Ok(CopySource::Selector(selector));
        }
        // Flag bits ride on top of a direct buffer index: 0x80 requests
        // the scrolled copy, 0x40 is accepted and ignored.
        let buffer = raw & 0x3F;
        if buffer > 3 {
            return Err(MachineError::InvalidBufferId(raw));
        }
        if raw & 0x80 != 0 {
            Ok(CopySource::Scrolled(buffer))
        } else {
            Ok(CopySource::Selector(BufferSelector::Specific(buffer)))
        }
    }
}

/// Where a sprite-polygon draw reads a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    Constant(i16),
    Register(RegisterId),
}

/// Where a sprite-polygon draw reads its scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSource {
    Default,
    Constant(u8),
    Register(RegisterId),
}

/// Which polygon blob a sprite draw addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonBank {
    Polygons,
    Animations,
}

/// Decoded argument of `ControlResources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    /// Argument 0: stop audio and drop individually loaded resources.
    UnloadAll,
    /// Load one resource by ID.
    Load(u16),
    /// Switch to another game part at the end of the tic.
    SwitchPart(GamePart),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    SetRegister { destination: RegisterId, value: i16 },
    CopyRegister { destination: RegisterId, source: RegisterId },
    RegisterAdd { destination: RegisterId, source: RegisterId },
    RegisterAddConstant { destination: RegisterId, value: i16 },
    Call { address: ProgramAddress },
    Return,
    Yield,
    Jump { address: ProgramAddress },
    ActivateThread { thread: ThreadId, address: ProgramAddress },
    JumpIfNotZero { register: RegisterId, address: ProgramAddress },
    JumpConditional {
        comparison: Comparison,
        register: RegisterId,
        operand: Operand,
        address: ProgramAddress,
    },
    SelectPalette { palette: u8 },
    ControlThreads { start: ThreadId, end: ThreadId, operation: ThreadOperation },
    SelectVideoBuffer { buffer: BufferSelector },
    FillVideoBuffer { buffer: BufferSelector, color: Color },
    CopyVideoBuffer { source: CopySource, destination: BufferSelector },
    RenderVideoBuffer { buffer: BufferSelector },
    Kill,
    DrawString { string: u16, x: u8, y: u8, color: Color },
    RegisterSubtract { destination: RegisterId, source: RegisterId },
    RegisterAnd { destination: RegisterId, value: u16 },
    RegisterOr { destination: RegisterId, value: u16 },
    RegisterShiftLeft { destination: RegisterId, shift: u8 },
    RegisterShiftRight { destination: RegisterId, shift: u8 },
    ControlSound { resource: u16, frequency: u8, volume: u8, channel: u8 },
    ControlResources { action: ResourceAction },
    ControlMusic { resource: u16, delay: u16, position: u8 },
    DrawBackgroundPolygon { address: u16, point: Point },
    DrawSpritePolygon {
        address: u16,
        x: CoordinateSource,
        y: CoordinateSource,
        scale: ScaleSource,
        bank: PolygonBank,
    },
}

impl Instruction {
    /// Parse one instruction at the program counter.
    pub fn parse(program: &mut Program) -> Result<Instruction, MachineError> {
        let opcode = program.read_u8()?;
        if opcode & 0x80 != 0 {
            return Self::parse_background_polygon(opcode, program);
        }
        if opcode & 0x40 != 0 {
            return Self::parse_sprite_polygon(opcode, program);
        }

        match opcode {
            0x00 => Ok(Instruction::SetRegister {
                destination: program.read_u8()?,
                value: program.read_i16()?,
            }),
            0x01 => Ok(Instruction::CopyRegister {
                destination: program.read_u8()?,
                source: program.read_u8()?,
            }),
            0x02 => Ok(Instruction::RegisterAdd {
                destination: program.read_u8()?,
                source: program.read_u8()?,
            }),
            0x03 => Ok(Instruction::RegisterAddConstant {
                destination: program.read_u8()?,
                value: program.read_i16()?,
            }),
            0x04 => Ok(Instruction::Call { address: program.read_u16()? }),
            0x05 => Ok(Instruction::Return),
            0x06 => Ok(Instruction::Yield),
            0x07 => Ok(Instruction::Jump { address: program.read_u16()? }),
            0x08 => Ok(Instruction::ActivateThread {
                thread: parse_thread_id(program.read_u8()?)?,
                address: program.read_u16()?,
            }),
            0x09 => Ok(Instruction::JumpIfNotZero {
                register: program.read_u8()?,
                address: program.read_u16()?,
            }),
            0x0A => {
                let raw = program.read_u8()?;
                let comparison = Comparison::from_raw(raw)?;
                let register = program.read_u8()?;
                let operand = if raw & 0x80 != 0 {
                    Operand::Register(program.read_u8()?)
                } else if raw & 0x40 != 0 {
                    Operand::Constant(program.read_i16()?)
                } else {
                    Operand::Constant(program.read_u8()? as i16)
                };
                Ok(Instruction::JumpConditional {
                    comparison,
                    register,
                    operand,
                    address: program.read_u16()?,
                })
            }
            0x0B => {
                let palette = program.read_u8()?;
                // The second byte is vestigial; the retail data always
                // carries 0xFF there.
                program.read_u8()?;
                if palette as usize >= crate::video::PALETTE_COUNT {
                    return Err(MachineError::InvalidPaletteId(palette));
                }
                Ok(Instruction::SelectPalette { palette })
            }
            0x0C => {
                let start = parse_thread_id(program.read_u8()?)?;
                let end = parse_thread_id(program.read_u8()?)?;
                let operation = ThreadOperation::from_raw(program.read_u8()?)?;
                if start > end {
                    return Err(MachineError::InvalidThreadRange { start, end });
                }
                Ok(Instruction::ControlThreads { start, end, operation })
            }
            0x0D => Ok(Instruction::SelectVideoBuffer {
                buffer: parse_buffer(program.read_u8()?)?,
            }),
            0x0E => Ok(Instruction::FillVideoBuffer {
                buffer: parse_buffer(program.read_u8()?)?,
                color: parse_color(program.read_u8()?)?,
            }),
            0x0F => Ok(Instruction::CopyVideoBuffer {
                source: CopySource::from_raw(program.read_u8()?)?,
                destination: parse_buffer(program.read_u8()?)?,
            }),
            0x10 => Ok(Instruction::RenderVideoBuffer {
                buffer: parse_buffer(program.read_u8()?)?,
            }),
            0x11 => Ok(Instruction::Kill),
            0x12 => Ok(Instruction::DrawString {
                string: program.read_u16()?,
                x: program.read_u8()?,
                y: program.read_u8()?,
                color: parse_color(program.read_u8()?)?,
            }),
            0x13 => Ok(Instruction::RegisterSubtract {
                destination: program.read_u8()?,
                source: program.read_u8()?,
            }),
            0x14 => Ok(Instruction::RegisterAnd {
                destination: program.read_u8()?,
                value: program.read_u16()?,
            }),
            0x15 => Ok(Instruction::RegisterOr {
                destination: program.read_u8()?,
                value: program.read_u16()?,
            }),
            0x16 => Ok(Instruction::RegisterShiftLeft {
                destination: program.read_u8()?,
                shift: (program.read_u16()? & 0x0F) as u8,
            }),
            0x17 => Ok(Instruction::RegisterShiftRight {
                destination: program.read_u8()?,
                shift: (program.read_u16()? & 0x0F) as u8,
            }),
            0x18 => {
                let resource = program.read_u16()?;
                let frequency = program.read_u8()?;
                if frequency >= 40 {
                    return Err(MachineError::InvalidFrequencyId(frequency));
                }
                let volume = program.read_u8()?.min(63);
                let channel = program.read_u8()?;
                if channel >= 4 {
                    return Err(MachineError::InvalidChannelId(channel));
                }
                Ok(Instruction::ControlSound { resource, frequency, volume, channel })
            }
            0x19 => {
                let value = program.read_u16()?;
                let action = match value {
                    0 => ResourceAction::UnloadAll,
                    v if v >= vesper_assets::FIRST_GAME_PART_VALUE => {
                        ResourceAction::SwitchPart(GamePart::from_raw(v)?)
                    }
                    v => ResourceAction::Load(v),
                };
                Ok(Instruction::ControlResources { action })
            }
            0x1A => Ok(Instruction::ControlMusic {
                resource: program.read_u16()?,
                delay: program.read_u16()?,
                position: program.read_u8()?,
            }),
            _ => Err(MachineError::InvalidOpcode(opcode)),
        }
    }

    /// `1xxxxxxx`: the seven low opcode bits are the high half of the
    /// pre-shifted polygon address; X and Y are byte constants, with
    /// overshoot below the last row folded back into X.
    fn parse_background_polygon(
        opcode: u8,
        program: &mut Program,
    ) -> Result<Instruction, MachineError> {
        let address =
            (((opcode & 0x7F) as u16) << 8 | program.read_u8()? as u16).wrapping_mul(2);
        let mut x = program.read_u8()? as i16;
        let mut y = program.read_u8()? as i16;
        let overshoot = y - 199;
        if overshoot > 0 {
            y = 199;
            x += overshoot;
        }
        Ok(Instruction::DrawBackgroundPolygon { address, point: Point { x, y } })
    }

    /// `01xxxxxx`: the low six opcode bits choose the X, Y and scale
    /// sources and the polygon bank.
    fn parse_sprite_polygon(opcode: u8, program: &mut Program) -> Result<Instruction, MachineError> {
        let address = program.read_u16()?.wrapping_mul(2);

        let x = match opcode & 0x30 {
            0x00 => CoordinateSource::Constant(program.read_i16()?),
            0x10 => CoordinateSource::Register(program.read_u8()?),
            0x20 => CoordinateSource::Constant(program.read_u8()? as i16),
            _ => CoordinateSource::Constant(program.read_u8()? as i16 + 0x100),
        };
        let y = match opcode & 0x0C {
            0x00 => CoordinateSource::Constant(program.read_i16()?),
            0x04 => CoordinateSource::Register(program.read_u8()?),
            _ => CoordinateSource::Constant(program.read_u8()? as i16),
        };
        let (scale, bank) = match opcode & 0x03 {
            0x00 => (ScaleSource::Default, PolygonBank::Polygons),
            0x01 => (ScaleSource::Register(program.read_u8()?), PolygonBank::Polygons),
            0x02 => (ScaleSource::Constant(program.read_u8()?), PolygonBank::Polygons),
            _ => (ScaleSource::Default, PolygonBank::Animations),
        };

        Ok(Instruction::DrawSpritePolygon { address, x, y, scale, bank })
    }
}

fn parse_thread_id(raw: u8) -> Result<ThreadId, MachineError> {
    if raw as usize >= THREAD_COUNT {
        return Err(MachineError::InvalidThreadId(raw));
    }
    Ok(raw)
}

fn parse_buffer(raw: u8) -> Result<BufferSelector, MachineError> {
    BufferSelector::from_raw(raw).ok_or(MachineError::InvalidBufferId(raw))
}

fn parse_color(raw: u8) -> Result<Color, MachineError> {
    if raw > 0x0F {
        return Err(MachineError::InvalidColorId(raw));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> Result<Instruction, MachineError> {
        Instruction::parse(&mut Program::new(bytes.to_vec().into()))
    }

    #[test]
    fn test_add_constant_reads_signed_value() {
        assert_eq!(
            parse(&[0x03, 0x10, 0xB6, 0x2B]).unwrap(),
            Instruction::RegisterAddConstant { destination: 0x10, value: -18901 }
        );
    }

    #[test]
    fn test_undefined_opcodes_are_rejected() {
        for opcode in 0x1B..=0x3F {
            assert!(
                matches!(parse(&[opcode, 0, 0, 0, 0, 0]), Err(MachineError::InvalidOpcode(o)) if o == opcode),
                "opcode {opcode:#04X}"
            );
        }
    }

    #[test]
    fn test_high_bit_dispatches_background_polygon() {
        let instruction = parse(&[0xFF, 0x17, 10, 20]).unwrap();
        assert_eq!(
            instruction,
            Instruction::DrawBackgroundPolygon {
                address: 0x7F17u16.wrapping_mul(2),
                point: Point { x: 10, y: 20 },
            }
        );
    }

    #[test]
    fn test_background_polygon_folds_bottom_overshoot_into_x() {
        let instruction = parse(&[0x80, 0x00, 10, 209]).unwrap();
        assert_eq!(
            instruction,
            Instruction::DrawBackgroundPolygon { address: 0, point: Point { x: 20, y: 199 } }
        );
    }

    #[test]
    fn test_sprite_polygon_bit_fields() {
        // 0x7F: x = byte + 0x100, y = byte, default scale, animations.
        assert_eq!(
            parse(&[0x7F, 0x00, 0x21, 7, 9]).unwrap(),
            Instruction::DrawSpritePolygon {
                address: 0x42,
                x: CoordinateSource::Constant(0x107),
                y: CoordinateSource::Constant(9),
                scale: ScaleSource::Default,
                bank: PolygonBank::Animations,
            }
        );
        // 0x55: x and y from registers, scale from a register.
        assert_eq!(
            parse(&[0x55, 0x00, 0x01, 0x20, 0x21, 0x22]).unwrap(),
            Instruction::DrawSpritePolygon {
                address: 2,
                x: CoordinateSource::Register(0x20),
                y: CoordinateSource::Register(0x21),
                scale: ScaleSource::Register(0x22),
                bank: PolygonBank::Polygons,
            }
        );
        // 0x40: full-word constants, default scale, part polygons.
        assert_eq!(
            parse(&[0x40, 0x12, 0x34, 0xFF, 0x9C, 0x00, 0x64]).unwrap(),
            Instruction::DrawSpritePolygon {
                address: 0x1234u16.wrapping_mul(2),
                x: CoordinateSource::Constant(-100),
                y: CoordinateSource::Constant(100),
                scale: ScaleSource::Default,
                bank: PolygonBank::Polygons,
            }
        );
    }

    #[test]
    fn test_control_threads_parses_range_and_operation() {
        assert_eq!(
            parse(&[0x0C, 62, 63, 0x02]).unwrap(),
            Instruction::ControlThreads {
                start: 62,
                end: 63,
                operation: ThreadOperation::Deactivate,
            }
        );
    }

    #[test]
    fn test_control_threads_rejects_reversed_range() {
        assert!(matches!(
            parse(&[0x0C, 10, 9, 0x00]),
            Err(MachineError::InvalidThreadRange { start: 10, end: 9 })
        ));
    }

    #[test]
    fn test_control_threads_rejects_bad_ids_and_operations() {
        assert!(matches!(parse(&[0x0C, 64, 65, 0x00]), Err(MachineError::InvalidThreadId(64))));
        assert!(matches!(
            parse(&[0x0C, 0, 1, 0x03]),
            Err(MachineError::InvalidThreadOperation(3))
        ));
    }

    #[test]
    fn test_conditional_jump_operand_forms() {
        // Bit 7: right operand from a register.
        assert_eq!(
            parse(&[0x0A, 0x81, 0x05, 0x06, 0x01, 0x00]).unwrap(),
            Instruction::JumpConditional {
                comparison: Comparison::NotEqual,
                register: 0x05,
                operand: Operand::Register(0x06),
                address: 0x100,
            }
        );
        // Bit 6: signed word constant.
        assert_eq!(
            parse(&[0x0A, 0x44, 0x05, 0xFF, 0xFE, 0x01, 0x00]).unwrap(),
            Instruction::JumpConditional {
                comparison: Comparison::Less,
                register: 0x05,
                operand: Operand::Constant(-2),
                address: 0x100,
            }
        );
        // Neither: unsigned byte constant.
        assert_eq!(
            parse(&[0x0A, 0x03, 0x05, 0xFE, 0x01, 0x00]).unwrap(),
            Instruction::JumpConditional {
                comparison: Comparison::GreaterOrEqual,
                register: 0x05,
                operand: Operand::Constant(0xFE),
                address: 0x100,
            }
        );
    }

    #[test]
    fn test_conditional_jump_rejects_unknown_comparisons() {
        for raw in [0x06u8, 0x07, 0x47, 0x86] {
            assert!(
                matches!(
                    parse(&[0x0A, raw, 0, 0, 0, 0, 0]),
                    Err(MachineError::InvalidJumpComparison(r)) if r == raw
                ),
                "raw {raw:#04X}"
            );
        }
    }

    #[test]
    fn test_video_operand_validation() {
        assert!(matches!(parse(&[0x0D, 0x04]), Err(MachineError::InvalidBufferId(0x04))));
        assert!(matches!(parse(&[0x0E, 0xFF, 0x10]), Err(MachineError::InvalidColorId(0x10))));
        assert!(matches!(parse(&[0x0B, 0x20, 0xFF]), Err(MachineError::InvalidPaletteId(0x20))));
        assert!(matches!(
            parse(&[0x12, 0x01, 0x94, 4, 4, 0x10]),
            Err(MachineError::InvalidColorId(0x10))
        ));
    }

    #[test]
    fn test_copy_source_flag_bits() {
        assert_eq!(
            parse(&[0x0F, 0x83, 0xFF]).unwrap(),
            Instruction::CopyVideoBuffer {
                source: CopySource::Scrolled(3),
                destination: BufferSelector::Back,
            }
        );
        assert_eq!(
            parse(&[0x0F, 0x41, 0x00]).unwrap(),
            Instruction::CopyVideoBuffer {
                source: CopySource::Selector(BufferSelector::Specific(1)),
                destination: BufferSelector::Specific(0),
            }
        );
        assert_eq!(
            parse(&[0x0F, 0xFE, 0x01]).unwrap(),
            Instruction::CopyVideoBuffer {
                source: CopySource::Selector(BufferSelector::Front),
                destination: BufferSelector::Specific(1),
            }
        );
    }

    #[test]
    fn test_sound_operand_validation() {
        assert!(matches!(
            parse(&[0x18, 0x00, 0x30, 40, 50, 0]),
            Err(MachineError::InvalidFrequencyId(40))
        ));
        assert!(matches!(
            parse(&[0x18, 0x00, 0x30, 0, 50, 4]),
            Err(MachineError::InvalidChannelId(4))
        ));
        // Volume clamps to the mixer's 6-bit range instead of failing.
        assert_eq!(
            parse(&[0x18, 0x00, 0x30, 5, 200, 2]).unwrap(),
            Instruction::ControlSound { resource: 0x30, frequency: 5, volume: 63, channel: 2 }
        );
    }

    #[test]
    fn test_resource_actions() {
        assert_eq!(
            parse(&[0x19, 0x00, 0x00]).unwrap(),
            Instruction::ControlResources { action: ResourceAction::UnloadAll }
        );
        assert_eq!(
            parse(&[0x19, 0x00, 0x12]).unwrap(),
            Instruction::ControlResources { action: ResourceAction::Load(0x12) }
        );
        assert_eq!(
            parse(&[0x19, 0x3E, 0x85]).unwrap(),
            Instruction::ControlResources {
                action: ResourceAction::SwitchPart(GamePart::ArenaCinematic)
            }
        );
        assert!(matches!(
            parse(&[0x19, 0x3E, 0x89]),
            Err(MachineError::Resource(vesper_assets::ResourceError::InvalidGamePart(0x3E89)))
        ));
    }

    #[test]
    fn test_shift_amounts_mask_to_four_bits() {
        assert_eq!(
            parse(&[0x16, 0x07, 0x00, 0x13]).unwrap(),
            Instruction::RegisterShiftLeft { destination: 0x07, shift: 3 }
        );
    }
}
