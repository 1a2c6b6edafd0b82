use crate::error::PlayerError;
use crate::framebuffer::Framebuffer;

pub use crate::framebuffer::{BUFFER_SIZE, HEIGHT, WIDTH};

/// The monochrome panel, from first command to deep sleep.
///
/// Implementations own the transport-level protocol, including the busy
/// synchronisation after every refresh. Any transport failure leaves the
/// physical device in unknown state; only a fresh `init` can recover it.
pub trait Panel {
    fn init(&mut self) -> Result<(), PlayerError>;

    /// Transmit one frame and block until the refresh completes.
    fn display(&mut self, frame: &Framebuffer) -> Result<(), PlayerError>;

    /// Blank the panel to white.
    fn clear(&mut self) -> Result<(), PlayerError>;

    /// Power down. Irreversible without a full `init`.
    fn sleep(&mut self) -> Result<(), PlayerError>;
}
