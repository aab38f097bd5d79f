//! Instruction execution
//!
//! The executor matches on the parsed instruction and applies its
//! effects to registers, threads, video and the host. Register
//! arithmetic wraps modulo 2^16 with two's-complement semantics.

use std::time::Duration;

use vesper_assets::{IndividualResource, ResourceType};

use crate::error::MachineError;
use crate::host::{FrameView, Host};
use crate::instructions::{
    CoordinateSource, CopySource, Flow, Instruction, Operand, PolygonBank, ResourceAction,
    ScaleSource, ThreadOperation,
};
use crate::machine::{FREQUENCY_TABLE, Machine};
use crate::video::{DEFAULT_SCALE, Point};
use crate::vm::{ProgramError, named};

impl<H: Host> Machine<H> {
    pub(crate) fn execute(&mut self, instruction: Instruction) -> Result<Flow, MachineError> {
        use Instruction::*;

        match instruction {
            SetRegister { destination, value } => {
                self.registers.set_signed(destination, value);
            }
            CopyRegister { destination, source } => {
                self.registers.set_signed(destination, self.registers.signed(source));
            }
            RegisterAdd { destination, source } => {
                let value = self
                    .registers
                    .signed(destination)
                    .wrapping_add(self.registers.signed(source));
                self.registers.set_signed(destination, value);
            }
            RegisterAddConstant { destination, value } => {
                let value = self.registers.signed(destination).wrapping_add(value);
                self.registers.set_signed(destination, value);
            }
            RegisterSubtract { destination, source } => {
                let value = self
                    .registers
                    .signed(destination)
                    .wrapping_sub(self.registers.signed(source));
                self.registers.set_signed(destination, value);
            }
            RegisterAnd { destination, value } => {
                self.registers
                    .set_unsigned(destination, self.registers.unsigned(destination) & value);
            }
            RegisterOr { destination, value } => {
                self.registers
                    .set_unsigned(destination, self.registers.unsigned(destination) | value);
            }
            RegisterShiftLeft { destination, shift } => {
                self.registers
                    .set_unsigned(destination, self.registers.unsigned(destination) << shift);
            }
            RegisterShiftRight { destination, shift } => {
                self.registers
                    .set_unsigned(destination, self.registers.unsigned(destination) >> shift);
            }

            Call { address } => {
                self.stack.push(self.program.counter())?;
                self.program.jump(address)?;
            }
            Return => {
                let address = self.stack.pop()?;
                self.program.jump(address)?;
            }
            Jump { address } => {
                self.program.jump(address)?;
            }
            JumpIfNotZero { register, address } => {
                let value = self.registers.signed(register).wrapping_sub(1);
                self.registers.set_signed(register, value);
                if value != 0 {
                    self.program.jump(address)?;
                }
            }
            JumpConditional { comparison, register, operand, address } => {
                let left = self.registers.signed(register);
                let right = match operand {
                    Operand::Constant(value) => value,
                    Operand::Register(id) => self.registers.signed(id),
                };
                if comparison.evaluate(left, right) {
                    self.program.jump(address)?;
                }
            }
            Yield => return Ok(Flow::Yield),
            Kill => return Ok(Flow::Deactivate),

            ActivateThread { thread, address } => {
                if !self.program.contains(address) {
                    return Err(ProgramError::InvalidAddress(address).into());
                }
                self.threads[thread as usize].schedule_jump(address);
            }
            ControlThreads { start, end, operation } => {
                for id in start..=end {
                    let thread = &mut self.threads[id as usize];
                    match operation {
                        ThreadOperation::Resume => thread.schedule_pause(false),
                        ThreadOperation::Pause => thread.schedule_pause(true),
                        ThreadOperation::Deactivate => thread.schedule_deactivation(),
                    }
                }
            }

            SelectPalette { palette } => {
                self.video.stage_palette(palette);
            }
            SelectVideoBuffer { buffer } => {
                self.video.select_target(buffer);
            }
            FillVideoBuffer { buffer, color } => {
                let index = self.video.fill_buffer(buffer, color);
                self.notify_if_front(index);
            }
            CopyVideoBuffer { source, destination } => {
                let (source_index, scroll) = match source {
                    CopySource::Selector(selector) => (self.video.resolve(selector), 0),
                    CopySource::Scrolled(buffer) => (
                        buffer as usize,
                        self.registers.signed(named::SCROLL_Y_POSITION),
                    ),
                };
                let destination = self.video.resolve(destination);
                let index = self.video.copy_buffer(source_index, destination, scroll);
                self.notify_if_front(index);
            }
            RenderVideoBuffer { buffer } => {
                // Output-only register, zeroed before every present;
                // kept verbatim from the original interpreter.
                self.registers.set_unsigned(named::RENDER_UNKNOWN, 0);
                self.video.apply_staged_palette(&self.part.palettes)?;

                let shown = self.video.present(buffer);
                let delay =
                    Duration::from_millis(20 * self.registers.unsigned(named::FRAME_DURATION) as u64);
                let frame = FrameView { video: &self.video, buffer: shown };
                self.host.buffer_ready(frame, delay);
                return Ok(Flow::Yield);
            }
            DrawString { string, x, y, color } => {
                self.video.draw_string(string, x, y, color);
            }

            DrawBackgroundPolygon { address, point } => {
                self.video
                    .draw_polygons(&self.part.polygons, address, point, DEFAULT_SCALE)?;
            }
            DrawSpritePolygon { address, x, y, scale, bank } => {
                let point = Point {
                    x: self.resolve_coordinate(x),
                    y: self.resolve_coordinate(y),
                };
                let scale = match scale {
                    ScaleSource::Default => DEFAULT_SCALE,
                    ScaleSource::Constant(value) => value as u16,
                    ScaleSource::Register(id) => self.registers.unsigned(id),
                };
                let data = match bank {
                    PolygonBank::Polygons => &self.part.polygons,
                    PolygonBank::Animations => self
                        .part
                        .animations
                        .as_ref()
                        .ok_or(MachineError::NoAnimationPolygons)?,
                };
                self.video.draw_polygons(data, address, point, scale)?;
            }

            ControlSound { resource, frequency, volume, channel } => {
                let data = self
                    .memory
                    .location(resource, ResourceType::SoundOrEmpty)?
                    .ok_or(MachineError::ResourceNotLoaded(resource))?;
                if volume == 0 {
                    // A zero volume stops the channel even when a
                    // resource is named; kept verbatim.
                    self.host.stop_channel(channel);
                } else {
                    self.host
                        .play_sound(data, FREQUENCY_TABLE[frequency as usize], volume, channel);
                }
            }
            ControlMusic { resource, delay, position } => {
                if resource != 0 {
                    let data = self
                        .memory
                        .location(resource, ResourceType::Music)?
                        .ok_or(MachineError::ResourceNotLoaded(resource))?;
                    self.host.play_music(data, delay, position);
                } else if delay != 0 {
                    self.host.set_music_delay(delay);
                } else {
                    self.host.stop_music();
                }
            }
            ControlResources { action } => match action {
                ResourceAction::UnloadAll => {
                    self.host.stop_music();
                    for channel in 0..4 {
                        self.host.stop_channel(channel);
                    }
                    self.memory.unload_all_individual();
                }
                ResourceAction::Load(id) => {
                    let blitted_bitmap = match self.memory.load_individual(id)? {
                        IndividualResource::AudioResident => false,
                        IndividualResource::TemporaryBitmap(bitmap) => {
                            // The scratch region is reused by the next
                            // bitmap load, so it goes straight to the
                            // background buffer.
                            self.video.buffer_mut(0).load_planar_bitmap(bitmap);
                            true
                        }
                    };
                    if blitted_bitmap {
                        self.notify_if_front(0);
                    }
                }
                ResourceAction::SwitchPart(part) => {
                    self.scheduled_part = Some(part);
                }
            },
        }

        Ok(Flow::Continue)
    }

    fn resolve_coordinate(&self, source: CoordinateSource) -> i16 {
        match source {
            CoordinateSource::Constant(value) => value,
            CoordinateSource::Register(id) => self.registers.signed(id),
        }
    }

    /// Tell the host when a draw bypassed the present path but touched
    /// the buffer it is currently showing.
    fn notify_if_front(&mut self, index: usize) {
        if self.video.front() == index {
            let frame = FrameView { video: &self.video, buffer: index };
            self.host.buffer_changed(frame);
        }
    }
}
