//! Last-value-wins buffer for pointer input awaiting the next frame

use crate::state::{Control, DetailLevel, Representation, SortMode};

/// Independent coalescing lanes: a datum hover never overwrites a control
/// hover that arrived in the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameChannel {
    Datum,
    Control(Control),
}

/// Pointer-driven value waiting for the next animation frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Hover(Option<String>),
    SortPreview(Option<SortMode>),
    RepresentationPreview(Option<Representation>),
    DetailPreview(Option<DetailLevel>),
    /// Window brush position, start and end
    Window(i32, i32),
    /// Focus year scrub position
    FocusYear(i32),
}

impl FrameInput {
    pub fn channel(&self) -> FrameChannel {
        match self {
            FrameInput::Hover(_) => FrameChannel::Datum,
            FrameInput::SortPreview(_) => FrameChannel::Control(Control::SortMode),
            FrameInput::RepresentationPreview(_) => FrameChannel::Control(Control::Representation),
            FrameInput::DetailPreview(_) => FrameChannel::Control(Control::DetailLevel),
            FrameInput::Window(..) => FrameChannel::Control(Control::Window),
            FrameInput::FocusYear(_) => FrameChannel::Control(Control::FocusYear),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FrameBuffer {
    pending: Vec<FrameInput>,
}

impl FrameBuffer {
    /// Store `input`, replacing anything pending on the same channel. Lanes
    /// keep their first-arrival order.
    pub fn push(&mut self, input: FrameInput) {
        let channel = input.channel();
        match self.pending.iter_mut().find(|p| p.channel() == channel) {
            Some(slot) => *slot = input,
            None => self.pending.push(input),
        }
    }

    pub fn latest(&self, channel: FrameChannel) -> Option<&FrameInput> {
        self.pending.iter().find(|p| p.channel() == channel)
    }

    pub fn discard(&mut self, channel: FrameChannel) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.channel() != channel);
        before != self.pending.len()
    }

    pub fn take(&mut self) -> Vec<FrameInput> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
