use std::collections::VecDeque;

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::{
    backend::{AudioChannel, AudioEngine},
    channel::{Channel, ChannelCategory, ChannelId},
};

/// A growth-only pool of sound channels.
///
/// Channels live in an arena and are addressed by slot index. Each slot is at all times either
/// in the free list or in the in-use set, never both. Slots are never destroyed, only parked.
pub struct SoundPool<C: AudioChannel> {
    slots: Vec<Channel<C>>,
    free: VecDeque<usize>,
    in_use: IndexSet<usize>,
}

impl<C: AudioChannel> SoundPool<C> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            in_use: IndexSet::new(),
        }
    }

    fn create<E>(&mut self, engine: &mut E) -> usize
    where
        E: AudioEngine<Channel = C>,
    {
        let index = self.slots.len();
        let id = ChannelId::Sound(index);
        debug!("Creating sound channel {}", id);

        let backend = engine.create_channel(ChannelCategory::Sound, &id.to_string());
        self.slots.push(Channel::new(id, backend));
        index
    }

    /// Creates `count` channels up-front and parks them in the free list.
    pub(crate) fn prewarm<E>(&mut self, engine: &mut E, count: usize)
    where
        E: AudioEngine<Channel = C>,
    {
        for _ in 0..count {
            let index = self.create(engine);
            self.slots[index].set_active(false);
            self.free.push_back(index);
        }
    }

    /// Lends a channel, reusing a parked one if possible.
    ///
    /// Never fails: when the free list is empty a new channel is created and handed out directly.
    pub(crate) fn acquire<E>(&mut self, engine: &mut E) -> ChannelId
    where
        E: AudioEngine<Channel = C>,
    {
        let index = match self.free.pop_front() {
            Some(index) => {
                self.slots[index].set_active(true);
                index
            }
            None => self.create(engine),
        };

        self.in_use.insert(index);
        ChannelId::Sound(index)
    }

    /// Stops the channel and returns it to the free list.
    ///
    /// Releasing a channel that is already free does nothing. Returns whether the channel was moved.
    pub(crate) fn release(&mut self, index: usize) -> bool {
        if self.free.contains(&index) {
            trace!("Sound channel sound-{} is already free", index);
            return false;
        }
        let Some(channel) = self.slots.get_mut(index) else {
            return false;
        };

        debug!("Recycling sound channel {}", channel.id());
        channel.stop();
        channel.set_active(false);
        self.in_use.shift_remove(&index);
        self.free.push_back(index);
        true
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Channel<C>> {
        self.slots.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Channel<C>> {
        self.slots.get_mut(index)
    }

    /// Stops every channel currently lent out, without taking it back.
    pub(crate) fn stop_in_use(&mut self) {
        for &index in &self.in_use {
            self.slots[index].stop();
        }
    }

    pub fn in_use(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.in_use.iter().map(|&i| ChannelId::Sound(i))
    }

    pub fn free(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.free.iter().map(|&i| ChannelId::Sound(i))
    }

    pub fn is_free(&self, index: usize) -> bool {
        self.free.contains(&index)
    }

    pub fn is_in_use(&self, index: usize) -> bool {
        self.in_use.contains(&index)
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    /// Total number of channels ever created.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
