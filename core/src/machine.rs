//! Machine facade
//!
//! Owns every subsystem — memory manager, program, registers, threads,
//! video, host — and runs the cooperative scheduler: one tic sweeps the
//! 64 threads in ID order, each executing until it yields, renders or
//! dies. Staged thread transitions and game-part switches are applied
//! strictly between tics.

mod exec;

use std::path::Path;

use log::{debug, trace};

use vesper_assets::{GameDirectory, GamePart, MemoryManager, PartBlobs, ResourceSource};

use crate::error::MachineError;
use crate::host::Host;
use crate::input::InputSnapshot;
use crate::instructions::{Flow, Instruction};
use crate::video::{BufferSelector, Rgb, Video};
use crate::vm::{CallStack, Program, Registers, THREAD_COUNT, Thread, ThreadId, named};

/// Mixer frequencies in Hz addressed by the sound frequency ID.
pub(crate) const FREQUENCY_TABLE: [u16; 40] = [
    0x0CFF, 0x0DC3, 0x0E91, 0x0F6F, 0x1056, 0x114E, 0x1259, 0x136C,
    0x149F, 0x15D9, 0x1726, 0x1888, 0x19FD, 0x1B86, 0x1D21, 0x1EDE,
    0x20AB, 0x229C, 0x24B3, 0x26EE, 0x293E, 0x2BB5, 0x2E55, 0x3124,
    0x3417, 0x373B, 0x3A8B, 0x3E0F, 0x41C5, 0x45BE, 0x49E1, 0x4E53,
    0x5301, 0x57FA, 0x5D40, 0x62D2, 0x68B2, 0x6EF2, 0x7583, 0x7C70,
];

pub struct Machine<H: Host> {
    pub(crate) host: H,
    pub(crate) memory: MemoryManager,
    pub(crate) part: PartBlobs,
    pub(crate) current_part: GamePart,
    pub(crate) scheduled_part: Option<GamePart>,
    pub(crate) program: Program,
    pub(crate) stack: CallStack,
    pub(crate) registers: Registers,
    pub(crate) threads: [Thread; THREAD_COUNT],
    pub(crate) video: Video,
    pub(crate) current_thread: ThreadId,
}

impl<H: Host> Machine<H> {
    /// Build a machine over a resource source and boot the given part.
    pub fn new(
        source: Box<dyn ResourceSource>,
        host: H,
        initial_part: GamePart,
    ) -> Result<Self, MachineError> {
        let mut memory = MemoryManager::new(source);
        let part = memory.load_game_part(initial_part)?;
        let program = Program::new(part.bytecode.clone());

        let mut registers = Registers::new();
        // Start-up values the original program expects to find.
        registers.set_unsigned(0x54, 0x81);
        registers.set_signed(named::RANDOM_SEED, rand::random());
        registers.set_unsigned(0xBC, 0x10);
        registers.set_unsigned(0xC6, 0x80);
        registers.set_signed(0xF2, 4000);
        registers.set_signed(0xDC, 33);

        let mut machine = Machine {
            host,
            memory,
            part,
            current_part: initial_part,
            scheduled_part: None,
            program,
            stack: CallStack::new(),
            registers,
            threads: [Thread::default(); THREAD_COUNT],
            video: Video::new(),
            current_thread: 0,
        };
        machine.boot_part();
        Ok(machine)
    }

    /// Open a game directory and boot.
    pub fn from_game_directory(
        path: impl AsRef<Path>,
        host: H,
        initial_part: GamePart,
    ) -> Result<Self, MachineError> {
        let directory = GameDirectory::open(path.as_ref())?;
        Self::new(Box::new(directory), host, initial_part)
    }

    /// Run one tic: apply input, sweep every runnable thread, then
    /// commit staged thread transitions and any scheduled part switch.
    pub fn run_tic(&mut self, input: &InputSnapshot) -> Result<(), MachineError> {
        self.apply_input(input);

        for id in 0..THREAD_COUNT {
            let Some(pc) = self.threads[id].pc else {
                continue;
            };
            if self.threads[id].paused {
                continue;
            }
            self.current_thread = id as ThreadId;
            self.program.jump(pc)?;
            self.run_thread()?;
        }

        self.finish_tic()
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn video(&self) -> &Video {
        &self.video
    }

    pub fn current_part(&self) -> GamePart {
        self.current_part
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Paint a buffer into a 320x200 surface through the active
    /// palette. Does nothing before the first palette selection.
    pub fn render_buffer_to_surface(
        &self,
        raw_buffer: u8,
        surface: &mut [Rgb],
    ) -> Result<(), MachineError> {
        let selector = BufferSelector::from_raw(raw_buffer)
            .ok_or(MachineError::InvalidBufferId(raw_buffer))?;
        self.video.render_to_surface(self.video.resolve(selector), surface);
        Ok(())
    }

    fn run_thread(&mut self) -> Result<(), MachineError> {
        loop {
            trace!(
                "thread {:02} @ {:#06X}",
                self.current_thread,
                self.program.counter()
            );
            let instruction = Instruction::parse(&mut self.program)?;
            match self.execute(instruction)? {
                Flow::Continue => {}
                Flow::Yield => {
                    self.threads[self.current_thread as usize].pc = Some(self.program.counter());
                    return Ok(());
                }
                Flow::Deactivate => {
                    self.threads[self.current_thread as usize].pc = None;
                    return Ok(());
                }
            }
        }
    }

    fn finish_tic(&mut self) -> Result<(), MachineError> {
        for thread in &mut self.threads {
            thread.commit_scheduled();
        }
        if let Some(part) = self.scheduled_part.take() {
            self.load_part(part)?;
        }
        Ok(())
    }

    pub(crate) fn load_part(&mut self, part: GamePart) -> Result<(), MachineError> {
        debug!("switching to game part {part:?}");
        self.part = self.memory.load_game_part(part)?;
        self.current_part = part;
        self.program = Program::new(self.part.bytecode.clone());
        self.boot_part();
        Ok(())
    }

    /// Reset execution state for a freshly loaded part: thread 0 at
    /// address 0, everything else inactive, empty stack.
    fn boot_part(&mut self) {
        self.stack.clear();
        for thread in &mut self.threads {
            thread.reset();
        }
        self.threads[0].pc = Some(0);
        self.registers.set_unsigned(0xE4, 0x14);
    }

    /// Turn the input snapshot into the registers the program polls.
    fn apply_input(&mut self, input: &InputSnapshot) {
        let mask = input.movement_mask().bits() as i16;
        let left_right = if input.right {
            1
        } else if input.left {
            -1
        } else {
            0
        };
        let up_down = if input.down {
            1
        } else if input.up {
            -1
        } else {
            0
        };
        let action = input.action as i16;

        self.registers.set_signed(named::HERO_LEFT_RIGHT, left_right);
        self.registers.set_signed(named::HERO_JUMP_UP_DOWN, up_down);
        self.registers.set_signed(named::HERO_UP_DOWN, up_down);
        self.registers.set_signed(named::HERO_MOVEMENT_MASK, mask);
        self.registers.set_signed(named::HERO_ACTION, action);
        self.registers
            .set_signed(named::HERO_ACTION_MOVEMENT_MASK, mask | (action << 7));
        self.registers.set_signed(
            named::LAST_PRESSED_CHARACTER,
            input.last_pressed_character.unwrap_or(0) as i16,
        );

        if input.show_password_screen
            && !matches!(
                self.current_part,
                GamePart::CopyProtection | GamePart::PasswordEntry
            )
        {
            self.scheduled_part = Some(GamePart::PasswordEntry);
        }
    }
}
