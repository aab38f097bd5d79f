//! Cooperative threads
//!
//! Each thread is a program counter plus a pause flag. State changes
//! requested by the bytecode (activate, pause, resume, deactivate) are
//! staged on the thread and committed between tics, so a thread always
//! finishes the tic it started under the state it started with.

use super::program::ProgramAddress;

/// Index of a thread.
pub type ThreadId = u8;

pub const THREAD_COUNT: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thread {
    /// Where the thread resumes next tic; `None` means inactive.
    pub pc: Option<ProgramAddress>,
    pub paused: bool,
    /// Staged PC change: `Some(None)` deactivates, `Some(Some(a))`
    /// activates at `a`.
    pub scheduled_pc: Option<Option<ProgramAddress>>,
    /// Staged pause-state change.
    pub scheduled_pause: Option<bool>,
}

impl Thread {
    /// Runs this tic: has a PC and is not paused.
    pub fn is_runnable(&self) -> bool {
        self.pc.is_some() && !self.paused
    }

    pub fn schedule_jump(&mut self, address: ProgramAddress) {
        self.scheduled_pc = Some(Some(address));
    }

    pub fn schedule_deactivation(&mut self) {
        self.scheduled_pc = Some(None);
    }

    pub fn schedule_pause(&mut self, paused: bool) {
        self.scheduled_pause = Some(paused);
    }

    /// Apply and clear staged transitions: pause state first, then PC.
    pub fn commit_scheduled(&mut self) {
        if let Some(paused) = self.scheduled_pause.take() {
            self.paused = paused;
        }
        if let Some(pc) = self.scheduled_pc.take() {
            self.pc = pc;
        }
    }

    /// Back to power-on state, dropping anything staged.
    pub fn reset(&mut self) {
        *self = Thread::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_transitions_apply_only_on_commit() {
        let mut thread = Thread { pc: Some(0x100), ..Thread::default() };
        thread.schedule_pause(true);
        thread.schedule_jump(0x200);
        assert_eq!(thread.pc, Some(0x100));
        assert!(!thread.paused);

        thread.commit_scheduled();
        assert_eq!(thread.pc, Some(0x200));
        assert!(thread.paused);
        // Staging is consumed by the commit.
        assert_eq!(thread.scheduled_pc, None);
        assert_eq!(thread.scheduled_pause, None);
    }

    #[test]
    fn test_scheduled_deactivation_clears_the_pc() {
        let mut thread = Thread { pc: Some(0x100), ..Thread::default() };
        thread.schedule_deactivation();
        thread.commit_scheduled();
        assert_eq!(thread.pc, None);
    }

    #[test]
    fn test_commit_without_staging_changes_nothing() {
        let mut thread = Thread { pc: Some(0x42), paused: true, ..Thread::default() };
        thread.commit_scheduled();
        assert_eq!(thread.pc, Some(0x42));
        assert!(thread.paused);
    }

    #[test]
    fn test_paused_threads_are_not_runnable() {
        let mut thread = Thread { pc: Some(0), ..Thread::default() };
        assert!(thread.is_runnable());
        thread.paused = true;
        assert!(!thread.is_runnable());
        thread.paused = false;
        thread.pc = None;
        assert!(!thread.is_runnable());
    }
}
